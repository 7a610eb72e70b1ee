//! Per-kind status extraction for summaries.
//!
//! Lookup is by lowercased `kind`. Kinds without an entry fall back to `status.phase`.

use std::fmt;

use kslim_core::{array_at, int_at, kind_of, object_at, str_at};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use serde_json::Value;

pub const UNKNOWN: &str = "Unknown";

pub type StatusFn = fn(&Value) -> String;

static BUILTIN: Lazy<StatusTable> = Lazy::new(StatusTable::builtin);

#[derive(Clone)]
pub struct StatusTable {
    by_kind: FxHashMap<String, StatusFn>,
    fallback: StatusFn,
}

impl fmt::Debug for StatusTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&str> = self.by_kind.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("StatusTable").field("kinds", &kinds).finish_non_exhaustive()
    }
}

impl Default for StatusTable {
    fn default() -> Self {
        BUILTIN.clone()
    }
}

impl StatusTable {
    fn builtin() -> Self {
        let mut t = Self::empty(phase_status);
        t.insert("pod", pod_status);
        for kind in ["deployment", "replicaset", "statefulset"] {
            t.insert(kind, workload_status);
        }
        t.insert("daemonset", daemonset_status);
        t.insert("node", node_status);
        t.insert("job", job_status);
        t.insert("persistentvolumeclaim", phase_status);
        t.insert("pvc", phase_status);
        t
    }

    /// Table with no per-kind entries.
    pub fn empty(fallback: StatusFn) -> Self {
        Self { by_kind: FxHashMap::default(), fallback }
    }

    /// Register (or replace) the extractor for `kind`, matched case-insensitively.
    pub fn insert(&mut self, kind: &str, f: StatusFn) -> Option<StatusFn> {
        self.by_kind.insert(kind.to_ascii_lowercase(), f)
    }

    pub fn with(mut self, kind: &str, f: StatusFn) -> Self {
        self.insert(kind, f);
        self
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.by_kind.contains_key(&kind.to_ascii_lowercase())
    }

    pub fn extract(&self, record: &Value) -> String {
        let kind = kind_of(record).to_ascii_lowercase();
        let f = self.by_kind.get(&kind).copied().unwrap_or(self.fallback);
        f(record)
    }
}

/// Status of `record` using the built-in table.
pub fn extract_status(record: &Value) -> String {
    BUILTIN.extract(record)
}

pub fn builtin_status_table() -> &'static StatusTable {
    &BUILTIN
}

/// `status.phase`, `"Unknown"` when absent.
pub fn pod_status(record: &Value) -> String {
    match str_at(record, &["status", "phase"]) {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

/// Deployments, ReplicaSets, StatefulSets: `spec.replicas` against ready/available replicas.
pub fn workload_status(record: &Value) -> String {
    if object_at(record, &["status"]).is_none() {
        return UNKNOWN.to_string();
    }
    let desired = int_at(record, &["spec", "replicas"]).unwrap_or(0);
    let ready = int_at(record, &["status", "readyReplicas"]).unwrap_or(0);
    let available = int_at(record, &["status", "availableReplicas"]).unwrap_or(0);
    replica_status(desired, ready, available).to_string()
}

/// DaemonSets count scheduled pods instead of replicas.
pub fn daemonset_status(record: &Value) -> String {
    if object_at(record, &["status"]).is_none() {
        return UNKNOWN.to_string();
    }
    let desired = int_at(record, &["status", "desiredNumberScheduled"]).unwrap_or(0);
    let ready = int_at(record, &["status", "numberReady"]).unwrap_or(0);
    let available = int_at(record, &["status", "numberAvailable"]).unwrap_or(0);
    replica_status(desired, ready, available).to_string()
}

fn replica_status(desired: i64, ready: i64, available: i64) -> &'static str {
    if desired == 0 {
        "Scaled to Zero"
    } else if ready >= desired && available >= desired {
        "Ready"
    } else if ready > 0 && ready < desired {
        "Partially Ready"
    } else {
        "Not Ready"
    }
}

fn condition<'a>(record: &'a Value, ty: &str) -> Option<&'a Value> {
    array_at(record, &["status", "conditions"])?
        .iter()
        .find(|c| c.get("type").and_then(Value::as_str) == Some(ty))
}

fn condition_true(c: &Value) -> bool {
    c.get("status").and_then(Value::as_str) == Some("True")
}

/// The `Ready` condition: `Ready`, `NotReady`, or `Unknown` when absent.
pub fn node_status(record: &Value) -> String {
    match condition(record, "Ready") {
        Some(c) if condition_true(c) => "Ready",
        Some(_) => "NotReady",
        None => UNKNOWN,
    }
    .to_string()
}

/// Terminal conditions win over counters; no terminal signal means still running.
pub fn job_status(record: &Value) -> String {
    if object_at(record, &["status"]).is_none() {
        return UNKNOWN.to_string();
    }
    let terminal = array_at(record, &["status", "conditions"])
        .into_iter()
        .flatten()
        .filter(|c| condition_true(c))
        .find_map(|c| match c.get("type").and_then(Value::as_str) {
            Some("Complete") => Some("Succeeded"),
            Some("Failed") => Some("Failed"),
            _ => None,
        });
    if let Some(s) = terminal {
        return s.to_string();
    }
    if int_at(record, &["status", "succeeded"]).unwrap_or(0) > 0 {
        "Succeeded".to_string()
    } else if int_at(record, &["status", "failed"]).unwrap_or(0) > 0 {
        "Failed".to_string()
    } else {
        "Running".to_string()
    }
}

/// `status.phase`, empty when absent.
pub fn phase_status(record: &Value) -> String {
    str_at(record, &["status", "phase"]).unwrap_or("").to_string()
}
