//! Summary mode: counts instead of full objects.

use std::collections::BTreeMap;

use kslim_core::config::DEFAULT_SUMMARY_THRESHOLD;
use kslim_core::{kind_of, qualified_name, str_at, FieldPath};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::status::{builtin_status_table, StatusTable};

pub const DEFAULT_SAMPLE_SIZE: usize = 10;
pub const DEFAULT_CLUSTER_FIELD: &str = "metadata.labels.cluster";

/// Key -> count, ordered by key.
pub type Counts = BTreeMap<String, usize>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SummaryOptions {
    pub max_sample_size: usize,
    pub include_by_status: bool,
    /// Only useful for multi-cluster results.
    pub include_by_cluster: bool,
    pub include_by_namespace: bool,
    pub include_by_kind: bool,
    pub cluster_field: String,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            max_sample_size: DEFAULT_SAMPLE_SIZE,
            include_by_status: true,
            include_by_cluster: false,
            include_by_namespace: true,
            include_by_kind: false,
            cluster_field: DEFAULT_CLUSTER_FIELD.to_string(),
        }
    }
}

impl SummaryOptions {
    /// Cluster grouping on, namespace grouping off. An empty field keeps the default.
    pub fn fleet(cluster_field: &str) -> Self {
        let mut o = Self { include_by_cluster: true, include_by_namespace: false, ..Self::default() };
        if !cluster_field.is_empty() {
            o.cluster_field = cluster_field.to_string();
        }
        o
    }
}

/// Groupings that were disabled or found nothing are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSummary {
    pub total: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_status: Option<Counts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_cluster: Option<Counts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_namespace: Option<Counts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_kind: Option<Counts>,
    pub sample: Vec<String>,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountEntry {
    pub key: String,
    pub count: usize,
}

pub fn summarize(records: &[Value], opts: &SummaryOptions) -> ResourceSummary {
    summarize_with(records, opts, builtin_status_table())
}

pub fn summarize_with(records: &[Value], opts: &SummaryOptions, statuses: &StatusTable) -> ResourceSummary {
    let cluster_path = FieldPath::parse(&opts.cluster_field);
    let mut by_status = Counts::new();
    let mut by_cluster = Counts::new();
    let mut by_namespace = Counts::new();
    let mut by_kind = Counts::new();
    let mut sample = Vec::with_capacity(opts.max_sample_size.min(records.len()));

    for r in records {
        if sample.len() < opts.max_sample_size {
            let name = qualified_name(r);
            if !name.is_empty() {
                sample.push(name);
            }
        }
        if opts.include_by_status {
            bump(&mut by_status, &statuses.extract(r));
        }
        if opts.include_by_cluster {
            if let Some(c) = cluster_path.evaluate(r).and_then(Value::as_str) {
                bump(&mut by_cluster, c);
            }
        }
        if opts.include_by_namespace {
            if let Some(ns) = str_at(r, &["metadata", "namespace"]) {
                bump(&mut by_namespace, ns);
            }
        }
        if opts.include_by_kind {
            bump(&mut by_kind, kind_of(r));
        }
    }

    let summary = ResourceSummary {
        total: records.len(),
        by_status: non_empty(by_status),
        by_cluster: non_empty(by_cluster),
        by_namespace: non_empty(by_namespace),
        by_kind: non_empty(by_kind),
        sample,
        has_more: records.len() > opts.max_sample_size,
    };
    debug!(total = summary.total, sample = summary.sample.len(), "summarized records");
    summary
}

/// Summary for fleet-wide queries, grouped by cluster.
pub fn fleet_summary(records: &[Value], cluster_field: &str) -> ResourceSummary {
    summarize(records, &SummaryOptions::fleet(cluster_field))
}

/// True when `count` is large enough that summary mode should be offered.
pub fn should_use_summary(count: usize, threshold: i64) -> bool {
    let threshold = if threshold <= 0 { DEFAULT_SUMMARY_THRESHOLD } else { threshold as usize };
    count > threshold
}

/// Highest counts first, ties by key. `n == 0` returns every entry.
pub fn top_counts(counts: &Counts, n: usize) -> Vec<CountEntry> {
    let mut entries: Vec<CountEntry> = counts.iter().map(|(k, c)| CountEntry { key: k.clone(), count: *c }).collect();
    // stable: BTreeMap order breaks ties
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    if n > 0 {
        entries.truncate(n);
    }
    entries
}

fn bump(counts: &mut Counts, key: &str) {
    if key.is_empty() {
        return;
    }
    match counts.get_mut(key) {
        Some(c) => *c += 1,
        None => {
            counts.insert(key.to_string(), 1);
        }
    }
}

fn non_empty(c: Counts) -> Option<Counts> {
    if c.is_empty() { None } else { Some(c) }
}
