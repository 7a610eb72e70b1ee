//! Errors surfaced to callers. Field reads never error; only caller-supplied
//! filter criteria and typed-object conversion can fail.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("too many filter criteria: {count} (maximum allowed: {max})")]
    TooManyCriteria { count: usize, max: usize },
    #[error("filter path cannot be empty")]
    EmptyPath,
    #[error("filter path contains invalid pattern '{pattern}': {path:?}")]
    InvalidPathPattern { path: String, pattern: String },
    #[error("filter path too deep: {path:?} has depth {depth} (maximum allowed: {max})")]
    PathTooDeep { path: String, depth: usize, max: usize },
    #[error("filter value too large: {size} bytes (maximum allowed: {max})")]
    ValueTooLarge { size: usize, max: usize },
    #[error("encoding object: {0}")]
    Encode(#[from] serde_json::Error),
}

impl Error {
    /// True for rejections of caller-supplied input (as opposed to internal failures).
    pub fn is_validation(&self) -> bool {
        !matches!(self, Error::Encode(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
