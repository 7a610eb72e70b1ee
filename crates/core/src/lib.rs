//! kslim core types: records, field paths, output config and errors.
//!
//! A record is a raw Kubernetes object as returned by the API server, kept as an
//! untyped `serde_json::Value`. Reads go through the accessors below, which return
//! `None` for missing keys and mismatched types instead of failing.

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod path;

use serde_json::{Map, Value};

pub use config::{Bounds, OutputConfig};
pub use error::{Error, Result};
pub use path::{FieldPath, Segment, ARRAY_WILDCARD};

/// One resource instance (expected to be a JSON object, tolerated otherwise).
pub type Record = Value;

/// Object body of a record.
pub type Fields = Map<String, Value>;

pub mod prelude {
    pub use super::{Error, Fields, FieldPath, OutputConfig, Record, Result, Segment};
    pub use super::{array_at, int_at, kind_of, object_at, str_at, value_at};
}

/// Walk plain keys from `v`; `None` as soon as a key is missing or a non-object is hit.
pub fn value_at<'a>(v: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let mut cur = v;
    for k in keys {
        cur = cur.as_object()?.get(*k)?;
    }
    Some(cur)
}

pub fn str_at<'a>(v: &'a Value, keys: &[&str]) -> Option<&'a str> {
    value_at(v, keys).and_then(|v| v.as_str())
}

pub fn object_at<'a>(v: &'a Value, keys: &[&str]) -> Option<&'a Fields> {
    value_at(v, keys).and_then(|v| v.as_object())
}

pub fn array_at<'a>(v: &'a Value, keys: &[&str]) -> Option<&'a Vec<Value>> {
    value_at(v, keys).and_then(|v| v.as_array())
}

/// Integer read that accepts any JSON number; floats are truncated toward zero.
pub fn int_at(v: &Value, keys: &[&str]) -> Option<i64> {
    let n = value_at(v, keys)?;
    n.as_i64()
        .or_else(|| n.as_u64().map(|u| u.min(i64::MAX as u64) as i64))
        .or_else(|| n.as_f64().map(|f| f as i64))
}

/// `kind` of a record, empty when absent.
pub fn kind_of(v: &Value) -> &str {
    str_at(v, &["kind"]).unwrap_or("")
}

/// `namespace/name`, or bare `name` for cluster-scoped objects. Empty when the record has no metadata.
pub fn qualified_name(v: &Value) -> String {
    if object_at(v, &["metadata"]).is_none() {
        return String::new();
    }
    let name = str_at(v, &["metadata", "name"]).unwrap_or("");
    match str_at(v, &["metadata", "namespace"]) {
        Some(ns) if !ns.is_empty() => format!("{}/{}", ns, name),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accessors_treat_mismatch_as_absent() {
        let v = json!({"spec": {"replicas": 3, "name": "x"}, "status": "oops"});
        assert_eq!(int_at(&v, &["spec", "replicas"]), Some(3));
        assert_eq!(str_at(&v, &["spec", "replicas"]), None);
        assert_eq!(int_at(&v, &["status", "readyReplicas"]), None);
        assert!(object_at(&v, &["status"]).is_none());
        assert!(array_at(&v, &["spec"]).is_none());
    }

    #[test]
    fn int_at_truncates_floats() {
        let v = json!({"a": 2.9, "b": -1});
        assert_eq!(int_at(&v, &["a"]), Some(2));
        assert_eq!(int_at(&v, &["b"]), Some(-1));
    }

    #[test]
    fn qualified_name_variants() {
        assert_eq!(qualified_name(&json!({"metadata": {"name": "a", "namespace": "ns"}})), "ns/a");
        assert_eq!(qualified_name(&json!({"metadata": {"name": "node-1"}})), "node-1");
        assert_eq!(qualified_name(&json!({"metadata": {"name": "b", "namespace": ""}})), "b");
        assert_eq!(qualified_name(&json!({"kind": "Pod"})), "");
        assert_eq!(kind_of(&json!({"kind": "Pod"})), "Pod");
        assert_eq!(kind_of(&json!(null)), "");
    }
}
