//! Size-bounded truncation with actionable warnings.
//!
//! Truncation always keeps a stable prefix. Every limit is clamped to an absolute
//! ceiling; there is no way to ask for an unbounded response.

use kslim_core::config::{Bounds, CLUSTER_BOUNDS, DEFAULT_MAX_ITEMS, ITEM_BOUNDS};
use serde_json::Value;

use crate::slim::estimate_value_size;
use crate::TruncationWarning;

/// Result sets above this size get a summary-mode suggestion.
pub const SUGGEST_SUMMARY_ABOVE: usize = DEFAULT_MAX_ITEMS * 5;

const RECORD_FILTER_HINTS: &[&str] = &[
    "Use labelSelector to filter by labels (e.g., app=nginx)",
    "Use namespace to limit to a specific namespace",
    "Use summary=true to get counts instead of full objects",
];

const GENERIC_FILTER_HINTS: &[&str] =
    &["Use more specific filters to narrow results", "Use summary=true for counts instead of full objects"];

const CLUSTER_FILTER_HINTS: &[&str] = &[
    "Use organization to filter by namespace/org",
    "Use provider to filter by infrastructure provider",
    "Use status to filter by cluster phase",
];

pub fn effective_limit(requested: i64, configured: i64) -> usize {
    ITEM_BOUNDS.effective(requested, configured)
}

pub fn effective_cluster_limit(requested: i64, configured: i64) -> usize {
    CLUSTER_BOUNDS.effective(requested, configured)
}

/// Cut `items` to `max` (clamped by `bounds`). Returns `(shown, total)` when anything was dropped.
fn cut<T>(items: &mut Vec<T>, bounds: Bounds, max: i64) -> Option<(usize, usize)> {
    let limit = bounds.clamp(max);
    let total = items.len();
    if total <= limit {
        return None;
    }
    items.truncate(limit);
    Some((limit, total))
}

fn hints(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Truncate records to `max_items` (default when <= 0, capped at the ceiling).
pub fn truncate_response<T>(mut items: Vec<T>, max_items: i64) -> (Vec<T>, Option<TruncationWarning>) {
    let Some((shown, total)) = cut(&mut items, ITEM_BOUNDS, max_items) else { return (items, None) };
    let mut warning = TruncationWarning {
        shown,
        total,
        message: format!(
            "Output truncated. Showing {} of {} items. Refine your query with namespace, label, or field filters for complete results.",
            shown, total
        ),
        suggest_summary: false,
        suggest_filters: Vec::new(),
    };
    if total > SUGGEST_SUMMARY_ABOVE {
        warning.suggest_summary = true;
        warning.suggest_filters = hints(RECORD_FILTER_HINTS);
    }
    (items, Some(warning))
}

/// Truncate to the effective limit of a per-request and a configured limit.
pub fn truncate<T>(items: Vec<T>, requested: i64, configured: i64) -> (Vec<T>, Option<TruncationWarning>) {
    truncate_response(items, effective_limit(requested, configured) as i64)
}

/// Like [`truncate_response`] but worded for lists that are not cluster resources.
pub fn truncate_generic<T>(mut items: Vec<T>, max_items: i64) -> (Vec<T>, Option<TruncationWarning>) {
    let Some((shown, total)) = cut(&mut items, ITEM_BOUNDS, max_items) else { return (items, None) };
    let mut warning = TruncationWarning {
        shown,
        total,
        message: format!(
            "Output truncated. Showing {} of {} items. Refine your query with filters for complete results.",
            shown, total
        ),
        suggest_summary: false,
        suggest_filters: Vec::new(),
    };
    if total > SUGGEST_SUMMARY_ABOVE {
        warning.suggest_summary = true;
        warning.suggest_filters = hints(GENERIC_FILTER_HINTS);
    }
    (items, Some(warning))
}

/// Truncate a fleet-wide cluster list (default 20, ceiling 100).
pub fn truncate_clusters<T>(mut clusters: Vec<T>, max_clusters: i64) -> (Vec<T>, Option<TruncationWarning>) {
    let Some((shown, total)) = cut(&mut clusters, CLUSTER_BOUNDS, max_clusters) else { return (clusters, None) };
    let warning = TruncationWarning {
        shown,
        total,
        message: format!(
            "Cluster results truncated. Showing {} of {} clusters. Use organization or provider filters to narrow results.",
            shown, total
        ),
        suggest_summary: false,
        suggest_filters: hints(CLUSTER_FILTER_HINTS),
    };
    (clusters, Some(warning))
}

/// Estimated size of `items` serialized as a JSON array.
pub fn estimate_list_size(items: &[Value]) -> u64 {
    2 + items.iter().map(|v| estimate_value_size(v) + 1).sum::<u64>()
}

/// Drop trailing records while the estimated serialized size exceeds `max_bytes`.
///
/// At least one record is always kept so an oversized single object is still visible.
/// `total` is the pre-truncation count reported in the warning.
pub fn fit_byte_budget(mut items: Vec<Value>, max_bytes: usize, total: usize) -> (Vec<Value>, Option<TruncationWarning>) {
    let max = max_bytes as u64;
    let mut size = estimate_list_size(&items);
    if size <= max || items.len() <= 1 {
        return (items, None);
    }
    while size > max && items.len() > 1 {
        if let Some(last) = items.pop() {
            size -= estimate_value_size(&last) + 1;
        }
    }
    let shown = items.len();
    let warning = TruncationWarning {
        shown,
        total,
        message: format!(
            "Output truncated to fit the {} byte response limit. Showing {} of {} items. Refine your query with namespace, label, or field filters for complete results.",
            max_bytes, shown, total
        ),
        suggest_summary: true,
        suggest_filters: hints(RECORD_FILTER_HINTS),
    };
    (items, Some(warning))
}
