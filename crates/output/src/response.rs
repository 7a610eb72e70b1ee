//! Tool-response envelopes.
//!
//! Keys starting with `_` are processing annotations, not resource data.

use kslim_core::Fields;
use serde_json::{json, Value};

use crate::summary::{top_counts, ResourceSummary};
use crate::{ProcessingMetadata, TruncationWarning};

pub const SUMMARY_HINT: &str = "Use summary=false or add filters to see full resource details";
/// Namespaces listed in a summary envelope before the rest are cut.
pub const SUMMARY_TOP_NAMESPACES: usize = 10;

fn messages(warnings: &[TruncationWarning]) -> Value {
    Value::Array(warnings.iter().map(|w| Value::String(w.message.clone())).collect())
}

/// `{"items": ...}` plus `_truncated`, `_originalCount`, `_returnedCount` when cut and
/// `_warnings` when there are any.
pub fn format_result_with_metadata(items: Vec<Value>, metadata: &ProcessingMetadata, warnings: &[TruncationWarning]) -> Value {
    let mut out = Fields::new();
    out.insert("items".into(), Value::Array(items));
    if metadata.truncated {
        out.insert("_truncated".into(), json!(true));
        out.insert("_originalCount".into(), json!(metadata.original_count));
        out.insert("_returnedCount".into(), json!(metadata.final_count));
    }
    if !warnings.is_empty() {
        out.insert("_warnings".into(), messages(warnings));
    }
    Value::Object(out)
}

/// Mark an existing response object as truncated. No-op without warnings.
pub fn append_warnings(result: &mut Fields, warnings: &[TruncationWarning]) {
    if warnings.is_empty() {
        return;
    }
    result.insert("_warnings".into(), messages(warnings));
    result.insert("_truncated".into(), json!(true));
}

/// Summary-mode envelope for `resource_type` (e.g. `Pod` gives `kind: PodSummary`).
/// Namespace counts are limited to the top ten. Cluster and kind counts appear only
/// when those groupings were requested.
pub fn summary_response(resource_type: &str, summary: &ResourceSummary) -> Value {
    let mut out = Fields::new();
    out.insert("kind".into(), json!(format!("{}Summary", resource_type)));
    out.insert("total".into(), json!(summary.total));
    out.insert("sample".into(), json!(summary.sample));
    out.insert("hasMore".into(), json!(summary.has_more));
    out.insert("_isSummaryMode".into(), json!(true));
    out.insert("_hint".into(), json!(SUMMARY_HINT));
    if let Some(by_status) = &summary.by_status {
        out.insert("byStatus".into(), json!(by_status));
    }
    if let Some(by_ns) = &summary.by_namespace {
        if by_ns.len() > SUMMARY_TOP_NAMESPACES {
            let top: Fields =
                top_counts(by_ns, SUMMARY_TOP_NAMESPACES).into_iter().map(|e| (e.key, json!(e.count))).collect();
            out.insert("byNamespace".into(), Value::Object(top));
            out.insert("_namespacesTruncated".into(), json!(true));
        } else {
            out.insert("byNamespace".into(), json!(by_ns));
        }
    }
    if let Some(by_cluster) = &summary.by_cluster {
        out.insert("byCluster".into(), json!(by_cluster));
    }
    if let Some(by_kind) = &summary.by_kind {
        out.insert("byKind".into(), json!(by_kind));
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::{summarize, Counts, SummaryOptions};
    use chrono::Utc;

    fn warning(msg: &str) -> TruncationWarning {
        TruncationWarning { shown: 1, total: 2, message: msg.into(), suggest_summary: false, suggest_filters: vec![] }
    }

    fn metadata(truncated: bool) -> ProcessingMetadata {
        ProcessingMetadata {
            processed_at: Utc::now(),
            original_count: 2,
            final_count: 1,
            truncated,
            slim_applied: true,
            secrets_masked: true,
            bytes_reduced: 0,
        }
    }

    #[test]
    fn envelope_marks_truncation() {
        let v = format_result_with_metadata(vec![json!({"a": 1})], &metadata(true), &[warning("cut")]);
        assert_eq!(v, json!({
            "items": [{"a": 1}],
            "_truncated": true,
            "_originalCount": 2,
            "_returnedCount": 1,
            "_warnings": ["cut"]
        }));
        let v = format_result_with_metadata(vec![], &metadata(false), &[]);
        assert_eq!(v, json!({"items": []}));
    }

    #[test]
    fn append_is_noop_without_warnings() {
        let mut m = Fields::new();
        m.insert("x".into(), json!(1));
        append_warnings(&mut m, &[]);
        assert_eq!(m.len(), 1);
        append_warnings(&mut m, &[warning("a"), warning("b")]);
        assert_eq!(m["_warnings"], json!(["a", "b"]));
        assert_eq!(m["_truncated"], json!(true));
    }

    #[test]
    fn summary_envelope_limits_namespaces() {
        let by_ns: Counts = (0..12).map(|i| (format!("ns{:02}", i), i + 1)).collect();
        let s = ResourceSummary {
            total: 78,
            by_status: Some(Counts::from([("Running".into(), 78)])),
            by_namespace: Some(by_ns),
            sample: vec!["ns00/a".into()],
            has_more: true,
            ..Default::default()
        };
        let v = summary_response("Pod", &s);
        assert_eq!(v["kind"], json!("PodSummary"));
        assert_eq!(v["_isSummaryMode"], json!(true));
        assert_eq!(v["_hint"], json!(SUMMARY_HINT));
        assert_eq!(v["_namespacesTruncated"], json!(true));
        let ns = v["byNamespace"].as_object().unwrap();
        assert_eq!(ns.len(), 10);
        assert!(ns.get("ns00").is_none() && ns.get("ns01").is_none());
        assert_eq!(ns["ns11"], json!(12));
        assert!(v.get("byCluster").is_none());
    }

    #[test]
    fn summary_envelope_keeps_cluster_and_kind_groupings() {
        let records = vec![
            json!({"kind": "Pod", "metadata": {"name": "a", "namespace": "x", "labels": {"cluster": "c1"}}, "status": {"phase": "Running"}}),
            json!({"kind": "Node", "metadata": {"name": "n", "labels": {"cluster": "c2"}}}),
        ];
        let opts = SummaryOptions { include_by_cluster: true, include_by_kind: true, ..SummaryOptions::default() };
        let v = summary_response("Resource", &summarize(&records, &opts));
        assert_eq!(v["byCluster"], json!({"c1": 1, "c2": 1}));
        assert_eq!(v["byKind"], json!({"Pod": 1, "Node": 1}));
        assert_eq!(v["kind"], json!("ResourceSummary"));
        assert_eq!(v["total"], json!(2));
    }

    #[test]
    fn summary_envelope_small() {
        let s = ResourceSummary { total: 1, sample: vec!["a".into()], ..Default::default() };
        let v = summary_response("Node", &s);
        assert!(v.get("byNamespace").is_none());
        assert!(v.get("byStatus").is_none());
        assert!(v.get("_namespacesTruncated").is_none());
        assert!(v.get("byCluster").is_none() && v.get("byKind").is_none());
        assert_eq!(v["hasMore"], json!(false));
    }
}
