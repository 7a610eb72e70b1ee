//! Verbose-field removal ("slimming").
//!
//! Paths use the [`FieldPath`] syntax, so `status.conditions[*].lastProbeTime` strips
//! the timestamp from every condition while keeping the conditions themselves.

use kslim_core::config::DEFAULT_EXCLUDED_FIELDS;
use kslim_core::FieldPath;
use once_cell::sync::Lazy;
use serde_json::Value;
use tracing::trace;

static DEFAULT_PATHS: Lazy<Vec<FieldPath>> = Lazy::new(|| DEFAULT_EXCLUDED_FIELDS.iter().map(|p| FieldPath::parse(p)).collect());

/// Pre-parsed removal list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slimmer {
    paths: Vec<FieldPath>,
}

impl Default for Slimmer {
    fn default() -> Self {
        Self { paths: DEFAULT_PATHS.clone() }
    }
}

impl Slimmer {
    /// An empty list selects the default list.
    pub fn new<S: AsRef<str>>(fields: &[S]) -> Self {
        if fields.is_empty() {
            return Self::default();
        }
        Self { paths: fields.iter().map(|f| FieldPath::parse(f.as_ref())).collect() }
    }

    pub fn paths(&self) -> &[FieldPath] {
        &self.paths
    }

    pub fn slim(&self, record: &Value) -> Value {
        let mut out = record.clone();
        self.slim_in_place(&mut out);
        out
    }

    pub fn slim_all(&self, records: &[Value]) -> Vec<Value> {
        records.iter().map(|r| self.slim(r)).collect()
    }

    /// Remove every listed path, in list order. Returns the number of fields removed.
    pub fn slim_in_place(&self, record: &mut Value) -> usize {
        let removed: usize = self.paths.iter().map(|p| p.remove_from(record)).sum();
        if removed > 0 {
            trace!(removed, "slimmed record");
        }
        removed
    }
}

pub fn slim_resource<S: AsRef<str>>(record: &Value, excluded_fields: &[S]) -> Value {
    Slimmer::new(excluded_fields).slim(record)
}

pub fn slim_resources<S: AsRef<str>>(records: &[Value], excluded_fields: &[S]) -> Vec<Value> {
    Slimmer::new(excluded_fields).slim_all(records)
}

/// Rough serialized size of a value. Numbers count as 10 bytes regardless of width.
pub fn estimate_value_size(v: &Value) -> u64 {
    match v {
        Value::Null => 4,
        Value::Bool(_) => 5,
        Value::String(s) => s.len() as u64 + 2,
        Value::Number(_) => 10,
        // key + quotes + colon
        Value::Object(m) => 2 + m.iter().map(|(k, v)| k.len() as u64 + 3 + estimate_value_size(v)).sum::<u64>(),
        // element + comma
        Value::Array(a) => 2 + a.iter().map(|v| estimate_value_size(v) + 1).sum::<u64>(),
    }
}

/// Estimated bytes that removing `path` from `record` would save. Wildcards sum over elements.
pub fn estimate_field_size(record: &Value, path: &str) -> u64 {
    let path = FieldPath::parse(path);
    path.select(record).into_iter().filter(|v| !v.is_null()).map(estimate_value_size).sum()
}
