//! kslim output: shape raw record lists for a consumer with a bounded input budget.
//!
//! The [`Processor`] runs three passes in a fixed order:
//! - secret redaction ([`redact`])
//! - verbose-field removal ([`slim`])
//! - truncation to the effective item limit and response byte budget ([`truncate`])
//!
//! Summary mode ([`summary`]) is the alternative for result sets too large to return
//! item by item. Per-kind status extraction lives in [`status`].

#![forbid(unsafe_code)]

pub mod convert;
pub mod processor;
pub mod redact;
pub mod response;
pub mod slim;
pub mod status;
pub mod summary;
pub mod truncate;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use convert::{to_record, to_records};
pub use processor::{quick_process, quick_process_single, ProcessingStats, Processor};
pub use redact::{SecretMasker, REDACTED_VALUE};
pub use slim::Slimmer;
pub use status::{extract_status, StatusTable};
pub use summary::{ResourceSummary, SummaryOptions};

/// Emitted whenever records were cut from a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TruncationWarning {
    pub shown: usize,
    pub total: usize,
    pub message: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub suggest_summary: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggest_filters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingMetadata {
    pub processed_at: DateTime<Utc>,
    pub original_count: usize,
    pub final_count: usize,
    pub truncated: bool,
    pub slim_applied: bool,
    pub secrets_masked: bool,
    /// Estimated serialized bytes saved by all passes.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub bytes_reduced: u64,
}

impl ProcessingMetadata {
    fn started(at: DateTime<Utc>, original_count: usize) -> Self {
        Self {
            processed_at: at,
            original_count,
            final_count: 0,
            truncated: false,
            slim_applied: false,
            secrets_masked: false,
            bytes_reduced: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub items: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<TruncationWarning>,
    pub metadata: ProcessingMetadata,
}

impl ProcessingResult {
    pub fn is_truncated(&self) -> bool {
        self.metadata.truncated
    }

    /// Tool-response envelope: `items` plus `_truncated`/`_warnings` markers.
    pub fn into_response(self) -> Value {
        response::format_result_with_metadata(self.items, &self.metadata, &self.warnings)
    }
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}
