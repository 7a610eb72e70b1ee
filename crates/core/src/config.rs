//! Output processing configuration.
//!
//! Every numeric limit has a default (used when the value is <= 0) and an absolute
//! ceiling that caps any override. The ceilings bound response size no matter what a
//! caller or operator asks for and are never relaxed by configuration.

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_MAX_ITEMS: usize = 100;
pub const ABSOLUTE_MAX_ITEMS: usize = 1000;
pub const DEFAULT_MAX_CLUSTERS: usize = 20;
pub const ABSOLUTE_MAX_CLUSTERS: usize = 100;
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 512 * 1024;
pub const ABSOLUTE_MAX_RESPONSE_BYTES: usize = 2 * 1024 * 1024;
pub const DEFAULT_SUMMARY_THRESHOLD: usize = 500;

/// Fields that rarely help diagnose a resource but inflate every response.
pub const DEFAULT_EXCLUDED_FIELDS: &[&str] = &[
    "metadata.managedFields",
    // duplicates the whole manifest
    "metadata.annotations.kubectl.kubernetes.io/last-applied-configuration",
    "metadata.annotations.deployment.kubernetes.io/revision",
    "status.conditions[*].lastTransitionTime",
    "status.conditions[*].lastProbeTime",
    "status.conditions[*].lastHeartbeatTime",
    "metadata.ownerReferences",
    "metadata.finalizers",
    "metadata.generation",
    "metadata.resourceVersion",
    "metadata.uid",
    "metadata.selfLink",
];

pub fn default_excluded_fields() -> Vec<String> {
    DEFAULT_EXCLUDED_FIELDS.iter().map(|s| s.to_string()).collect()
}

/// Default/ceiling pair for one bounded quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub default: usize,
    pub ceiling: usize,
}

pub const ITEM_BOUNDS: Bounds = Bounds { default: DEFAULT_MAX_ITEMS, ceiling: ABSOLUTE_MAX_ITEMS };
pub const CLUSTER_BOUNDS: Bounds = Bounds { default: DEFAULT_MAX_CLUSTERS, ceiling: ABSOLUTE_MAX_CLUSTERS };
pub const RESPONSE_BYTE_BOUNDS: Bounds =
    Bounds { default: DEFAULT_MAX_RESPONSE_BYTES, ceiling: ABSOLUTE_MAX_RESPONSE_BYTES };

impl Bounds {
    /// `v <= 0` selects the default; anything above the ceiling is capped.
    pub fn clamp(&self, v: i64) -> usize {
        if v <= 0 {
            self.default.min(self.ceiling)
        } else {
            (v as u64).min(self.ceiling as u64) as usize
        }
    }

    /// Smallest of the requested value, the configured value and the ceiling,
    /// each non-positive input replaced by the default. There is no unlimited mode.
    pub fn effective(&self, requested: i64, configured: i64) -> usize {
        self.clamp(requested).min(self.clamp(configured))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputConfig {
    pub max_items: i64,
    pub max_clusters: i64,
    pub max_response_bytes: i64,
    /// Drop `excluded_fields` from every record.
    pub slim_output: bool,
    /// Replace Secret payloads with a redaction marker. Should rarely be disabled.
    pub mask_secrets: bool,
    /// Item count above which summary mode is suggested.
    pub summary_threshold: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub excluded_fields: Vec<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS as i64,
            max_clusters: DEFAULT_MAX_CLUSTERS as i64,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES as i64,
            slim_output: true,
            mask_secrets: true,
            summary_threshold: DEFAULT_SUMMARY_THRESHOLD as i64,
            excluded_fields: default_excluded_fields(),
        }
    }
}

impl OutputConfig {
    /// Defaults overlaid with `KSLIM_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        let int = |key: &str| -> Option<i64> {
            let raw = get(key)?;
            match raw.trim().parse::<i64>() {
                Ok(v) => Some(v),
                Err(_) => { warn!(var = key, value = %raw, "ignoring non-integer setting"); None }
            }
        };
        let flag = |key: &str| -> Option<bool> {
            let raw = get(key)?;
            match raw.trim() {
                "1" => Some(true),
                "0" => Some(false),
                v if v.eq_ignore_ascii_case("true") => Some(true),
                v if v.eq_ignore_ascii_case("false") => Some(false),
                _ => { warn!(var = key, value = %raw, "ignoring non-boolean setting"); None }
            }
        };
        if let Some(v) = int("KSLIM_MAX_ITEMS") { cfg.max_items = v; }
        if let Some(v) = int("KSLIM_MAX_CLUSTERS") { cfg.max_clusters = v; }
        if let Some(v) = int("KSLIM_MAX_RESPONSE_BYTES") { cfg.max_response_bytes = v; }
        if let Some(v) = int("KSLIM_SUMMARY_THRESHOLD") { cfg.summary_threshold = v; }
        if let Some(v) = flag("KSLIM_SLIM_OUTPUT") { cfg.slim_output = v; }
        if let Some(v) = flag("KSLIM_MASK_SECRETS") { cfg.mask_secrets = v; }
        if let Some(list) = get("KSLIM_EXCLUDED_FIELDS") {
            cfg.excluded_fields = list.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect();
        }
        cfg
    }

    /// Copy with defaults filled in and absolute ceilings applied.
    pub fn validated(&self) -> Self {
        let mut v = self.clone();
        v.max_items = self.item_limit() as i64;
        v.max_clusters = self.cluster_limit() as i64;
        v.max_response_bytes = self.response_byte_limit() as i64;
        if v.summary_threshold <= 0 {
            v.summary_threshold = DEFAULT_SUMMARY_THRESHOLD as i64;
        }
        if v.slim_output && v.excluded_fields.is_empty() {
            v.excluded_fields = default_excluded_fields();
        }
        v
    }

    pub fn item_limit(&self) -> usize {
        ITEM_BOUNDS.clamp(self.max_items)
    }

    pub fn cluster_limit(&self) -> usize {
        CLUSTER_BOUNDS.clamp(self.max_clusters)
    }

    pub fn response_byte_limit(&self) -> usize {
        RESPONSE_BYTE_BOUNDS.clamp(self.max_response_bytes)
    }

    pub fn summary_threshold(&self) -> usize {
        if self.summary_threshold <= 0 { DEFAULT_SUMMARY_THRESHOLD } else { self.summary_threshold as usize }
    }
}
