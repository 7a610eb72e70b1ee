//! kslim filter: client-side filtering of raw records by path/value criteria.
//!
//! Criteria map a field path to an expected value and are AND-combined:
//! - `{"status.phase": "Running"}` simple field match
//! - `{"spec.taints[*].key": "node.kubernetes.io/unschedulable"}` any array element
//! - `{"metadata.labels": {"app": "nginx"}}` partial object match
//!
//! Criteria arrive from callers, so they are validated against fixed limits before any
//! record is looked at. A rejected filter runs nothing.

#![forbid(unsafe_code)]

use std::borrow::Cow;

use kslim_core::{Error, FieldPath, Fields, Result};
use serde::Serialize;
use serde_json::{Number, Value};
use tracing::debug;

pub const MAX_FILTER_CRITERIA: usize = 50;
/// Counted as `.` separators in the path.
pub const MAX_PATH_DEPTH: usize = 20;
pub const MAX_FILTER_VALUE_SIZE: usize = 1024;

/// Path string -> expected value, as supplied by the caller.
pub type FilterCriteria = Fields;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterLimits {
    pub max_criteria: usize,
    pub max_path_depth: usize,
    pub max_value_bytes: usize,
}

impl Default for FilterLimits {
    fn default() -> Self {
        Self {
            max_criteria: MAX_FILTER_CRITERIA,
            max_path_depth: MAX_PATH_DEPTH,
            max_value_bytes: MAX_FILTER_VALUE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterStats {
    pub total: usize,
    pub matched: usize,
    pub criteria: usize,
}

#[derive(Debug, Clone)]
struct Criterion {
    path: FieldPath,
    expected: Value,
}

impl Criterion {
    // Existential over wildcard expansions; plain paths reach at most one value.
    fn matches(&self, record: &Value) -> bool {
        self.path.select(record).into_iter().any(|actual| values_match(actual, &self.expected))
    }
}

/// Validated, ready-to-run criteria.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    criteria: Vec<Criterion>,
}

impl Filter {
    pub fn compile(criteria: &FilterCriteria) -> Result<Self> {
        Self::compile_with_limits(criteria, &FilterLimits::default())
    }

    pub fn compile_with_limits(criteria: &FilterCriteria, limits: &FilterLimits) -> Result<Self> {
        let compiled = validate(criteria, limits).map_err(|e| {
            metrics::counter!("filter_rejected_total", "reason" => rejection_reason(&e)).increment(1);
            debug!(error = %e, criteria = criteria.len(), "filter rejected");
            e
        })?;
        Ok(Self { criteria: compiled })
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// True when every criterion matches. An empty filter matches everything.
    pub fn matches(&self, record: &Value) -> bool {
        self.criteria.iter().all(|c| c.matches(record))
    }

    pub fn select<'a>(&self, records: &'a [Value]) -> Vec<&'a Value> {
        self.select_with_stats(records).0
    }

    pub fn select_with_stats<'a>(&self, records: &'a [Value]) -> (Vec<&'a Value>, FilterStats) {
        let out: Vec<&Value> = records.iter().filter(|r| self.matches(r)).collect();
        let stats = self.record(records.len(), out.len());
        (out, stats)
    }

    /// Keep matching records, preserving order.
    pub fn apply(&self, records: Vec<Value>) -> Vec<Value> {
        if self.is_empty() {
            return records;
        }
        let total = records.len();
        let out: Vec<Value> = records.into_iter().filter(|r| self.matches(r)).collect();
        self.record(total, out.len());
        out
    }

    fn record(&self, total: usize, matched: usize) -> FilterStats {
        let stats = FilterStats { total, matched, criteria: self.criteria.len() };
        metrics::counter!("filter_records_matched_total").increment(matched as u64);
        debug!(total, matched, criteria = stats.criteria, "client-side filter applied");
        stats
    }
}

/// Validate `criteria` with default limits and filter `records` by them.
pub fn apply_client_side_filter(records: Vec<Value>, criteria: &FilterCriteria) -> Result<Vec<Value>> {
    if criteria.is_empty() {
        return Ok(records);
    }
    Ok(Filter::compile(criteria)?.apply(records))
}

fn validate(criteria: &FilterCriteria, limits: &FilterLimits) -> Result<Vec<Criterion>> {
    if criteria.len() > limits.max_criteria {
        return Err(Error::TooManyCriteria { count: criteria.len(), max: limits.max_criteria });
    }
    let mut out = Vec::with_capacity(criteria.len());
    for (raw, expected) in criteria.iter() {
        let path = FieldPath::parse(raw);
        path.validate(limits.max_path_depth)?;
        check_value_size(expected, limits.max_value_bytes)?;
        out.push(Criterion { path, expected: expected.clone() });
    }
    Ok(out)
}

// Strings nested in partial-match objects count too.
fn check_value_size(v: &Value, max: usize) -> Result<()> {
    match v {
        Value::String(s) if s.len() > max => Err(Error::ValueTooLarge { size: s.len(), max }),
        Value::Object(m) => m.values().try_for_each(|v| check_value_size(v, max)),
        Value::Array(a) => a.iter().try_for_each(|v| check_value_size(v, max)),
        _ => Ok(()),
    }
}

fn rejection_reason(e: &Error) -> &'static str {
    match e {
        Error::TooManyCriteria { .. } => "too_many_criteria",
        Error::EmptyPath => "empty_path",
        Error::InvalidPathPattern { .. } => "invalid_pattern",
        Error::PathTooDeep { .. } => "path_too_deep",
        Error::ValueTooLarge { .. } => "value_too_large",
        Error::Encode(_) => "encode",
    }
}

/// Compare an actual field value against an expected criterion value.
///
/// - null only matches null
/// - strings and booleans compare exactly
/// - an expected object matches when each of its keys is present in the actual
///   object with a matching value; extra actual keys are ignored
/// - numbers compare numerically, so `1` matches `1.0`
/// - anything else compares by rendered text (`"3"` matches `3`, `"true"` matches `true`)
pub fn values_match(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::String(a), Value::String(e)) => a == e,
        (Value::Bool(a), Value::Bool(e)) => a == e,
        (_, Value::Object(e)) => match actual.as_object() {
            Some(a) => maps_match(a, e),
            None => false,
        },
        (Value::Number(a), Value::Number(e)) => numbers_equal(a, e),
        _ => render(actual) == render(expected),
    }
}

fn maps_match(actual: &Fields, expected: &Fields) -> bool {
    expected.iter().all(|(k, ev)| actual.get(k).map_or(false, |av| values_match(av, ev)))
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

fn render(v: &Value) -> Cow<'_, str> {
    match v {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn criteria(v: Value) -> FilterCriteria {
        v.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn scalar_comparisons() {
        assert!(values_match(&json!(null), &json!(null)));
        assert!(!values_match(&json!(null), &json!("x")));
        assert!(!values_match(&json!("x"), &json!(null)));
        assert!(values_match(&json!("Running"), &json!("Running")));
        assert!(!values_match(&json!("Running"), &json!("running")));
        assert!(values_match(&json!(true), &json!(true)));
        assert!(!values_match(&json!(true), &json!(false)));
    }

    #[test]
    fn numbers_compare_numerically() {
        assert!(values_match(&json!(3), &json!(3)));
        assert!(values_match(&json!(1), &json!(1.0)));
        assert!(values_match(&json!(2.5), &json!(2.5)));
        assert!(!values_match(&json!(3), &json!(4)));
        assert!(values_match(&json!(u64::MAX), &json!(u64::MAX)));
    }

    #[test]
    fn mixed_types_fall_back_to_text() {
        assert!(values_match(&json!(3), &json!("3")));
        assert!(values_match(&json!("true"), &json!(true)));
        assert!(!values_match(&json!([1, 2]), &json!("1,2")));
        assert!(values_match(&json!([1, 2]), &json!([1, 2])));
    }

    #[test]
    fn partial_object_match() {
        let actual = json!({"app": "nginx", "tier": "web", "extra": {"a": 1, "b": 2}});
        assert!(values_match(&actual, &json!({"app": "nginx"})));
        assert!(values_match(&actual, &json!({"extra": {"b": 2}})));
        assert!(!values_match(&actual, &json!({"app": "nginx", "missing": "x"})));
        assert!(!values_match(&json!("nginx"), &json!({"app": "nginx"})));
        assert!(values_match(&actual, &json!({})));
    }

    #[test]
    fn limits_are_checked_before_matching() {
        let err = Filter::compile(&criteria(json!({"": "x"}))).unwrap_err();
        assert!(matches!(err, Error::EmptyPath));
        let err = Filter::compile(&criteria(json!({"a..b": "x"}))).unwrap_err();
        assert!(err.to_string().contains("'..'"));
        let big = "v".repeat(MAX_FILTER_VALUE_SIZE + 1);
        let err = Filter::compile(&criteria(json!({"a": big}))).unwrap_err();
        assert!(matches!(err, Error::ValueTooLarge { size: 1025, max: 1024 }));
        let nested = json!({"metadata.labels": {"app": "v".repeat(2000)}});
        assert!(matches!(Filter::compile(&criteria(nested)), Err(Error::ValueTooLarge { .. })));
        let ok = "v".repeat(MAX_FILTER_VALUE_SIZE);
        assert!(Filter::compile(&criteria(json!({"a": ok}))).is_ok());
    }

    #[test]
    fn custom_limits() {
        let limits = FilterLimits { max_criteria: 1, max_path_depth: 1, max_value_bytes: 4 };
        let two = criteria(json!({"a": 1, "b": 2}));
        assert!(matches!(Filter::compile_with_limits(&two, &limits), Err(Error::TooManyCriteria { count: 2, max: 1 })));
        let deep = criteria(json!({"a.b.c": 1}));
        assert!(matches!(Filter::compile_with_limits(&deep, &limits), Err(Error::PathTooDeep { depth: 2, .. })));
    }

    #[test]
    fn missing_field_never_matches() {
        let f = Filter::compile(&criteria(json!({"status.phase": null}))).unwrap();
        assert!(!f.matches(&json!({"status": {}})));
        assert!(f.matches(&json!({"status": {"phase": null}})));
        assert!(!f.matches(&json!("not an object")));
    }

    #[test]
    fn empty_filter_matches_all() {
        let f = Filter::compile(&FilterCriteria::new()).unwrap();
        assert!(f.is_empty());
        assert!(f.matches(&json!({})));
        let recs = vec![json!({"a": 1}), json!({"a": 2})];
        assert_eq!(apply_client_side_filter(recs.clone(), &FilterCriteria::new()).unwrap(), recs);
    }
}
