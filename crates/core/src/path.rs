//! Dotted field paths with an array wildcard segment.
//!
//! `status.conditions[*].lastTransitionTime` reads as: take `status`, then the array
//! under `conditions`, then `lastTransitionTime` inside every element. A segment of
//! just `[*]` means the current value itself is the array.
//!
//! Kubernetes annotation and label keys often contain dots
//! (`kubectl.kubernetes.io/last-applied-configuration`). At each object level the
//! single segment is tried first; if that key is absent, successive plain segments are
//! joined back with `.` and the first joined key present in the object is used.

use std::borrow::Cow;
use std::fmt;

use serde_json::Value;
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::Fields;

pub const ARRAY_WILDCARD: &str = "[*]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    /// `key[*]`: the key holds an array and the remaining path applies to each element.
    Each(String),
}

impl Segment {
    fn parse(s: &str) -> Self {
        match s.strip_suffix(ARRAY_WILDCARD) {
            Some(key) => Segment::Each(key.to_string()),
            None => Segment::Key(s.to_string()),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Segment::Key(k) | Segment::Each(k) => k,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Segment::Each(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: SmallVec<[Segment; 8]>,
}

impl FieldPath {
    /// Parsing never fails; structural problems are reported by [`FieldPath::validate`].
    pub fn parse(path: &str) -> Self {
        let segments = if path.is_empty() {
            SmallVec::new()
        } else {
            path.split('.').map(Segment::parse).collect()
        };
        Self { raw: path.to_string(), segments }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segment separators in the textual form.
    pub fn depth(&self) -> usize {
        self.raw.matches('.').count()
    }

    pub fn has_wildcard(&self) -> bool {
        self.segments.iter().any(Segment::is_wildcard)
    }

    /// Reject paths a caller must not be allowed to submit.
    pub fn validate(&self, max_depth: usize) -> Result<()> {
        if self.raw.is_empty() {
            return Err(Error::EmptyPath);
        }
        if self.raw.contains("..") {
            return Err(Error::InvalidPathPattern { path: self.raw.clone(), pattern: "..".into() });
        }
        let depth = self.depth();
        if depth > max_depth {
            return Err(Error::PathTooDeep { path: self.raw.clone(), depth, max: max_depth });
        }
        Ok(())
    }

    /// First value the path reaches, if any. Wildcards yield their first reachable element.
    pub fn evaluate<'a>(&self, v: &'a Value) -> Option<&'a Value> {
        self.select(v).into_iter().next()
    }

    /// Every value the path reaches, wildcards expanded in array order.
    pub fn select<'a>(&self, v: &'a Value) -> SmallVec<[&'a Value; 4]> {
        let mut out = SmallVec::new();
        if !self.segments.is_empty() {
            select_rec(v, &self.segments, &mut out);
        }
        out
    }

    /// Remove the path's targets in place; returns how many fields were removed.
    ///
    /// A path ending in a wildcard segment removes nothing: array elements are never
    /// deleted, only fields inside them.
    pub fn remove_from(&self, v: &mut Value) -> usize {
        remove_rec(v, &self.segments)
    }

    /// Copy of `v` with the path's targets removed. `v` is left untouched.
    pub fn removed(&self, v: &Value) -> Value {
        let mut out = v.clone();
        self.remove_from(&mut out);
        out
    }
}

impl From<&str> for FieldPath {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Resolve the object key addressed by the leading plain segments of `segs`.
/// Returns the key and how many segments it consumed.
fn resolve_key<'s>(map: &Fields, segs: &'s [Segment]) -> Option<(Cow<'s, str>, usize)> {
    let first = match segs.first() {
        Some(Segment::Key(k)) => k,
        _ => return None,
    };
    if map.contains_key(first.as_str()) {
        return Some((Cow::Borrowed(first.as_str()), 1));
    }
    let mut joined = first.clone();
    for (i, seg) in segs.iter().enumerate().skip(1) {
        let Segment::Key(k) = seg else { break };
        joined.push('.');
        joined.push_str(k);
        if map.contains_key(joined.as_str()) {
            return Some((Cow::Owned(joined), i + 1));
        }
    }
    None
}

fn select_rec<'a>(cur: &'a Value, segs: &[Segment], out: &mut SmallVec<[&'a Value; 4]>) {
    let Some((first, rest)) = segs.split_first() else {
        out.push(cur);
        return;
    };
    match first {
        Segment::Each(key) => {
            let target = if key.is_empty() { Some(cur) } else { cur.as_object().and_then(|m| m.get(key)) };
            if let Some(Value::Array(items)) = target {
                for it in items {
                    select_rec(it, rest, out);
                }
            }
        }
        Segment::Key(_) => {
            let Some(map) = cur.as_object() else { return };
            if let Some((key, used)) = resolve_key(map, segs) {
                if let Some(child) = map.get(&*key) {
                    select_rec(child, &segs[used..], out);
                }
            }
        }
    }
}

fn remove_rec(cur: &mut Value, segs: &[Segment]) -> usize {
    let Some((first, rest)) = segs.split_first() else { return 0 };
    match first {
        Segment::Each(key) => {
            if rest.is_empty() {
                return 0;
            }
            let target = if key.is_empty() { Some(cur) } else { cur.as_object_mut().and_then(|m| m.get_mut(key)) };
            match target {
                Some(Value::Array(items)) => items.iter_mut().map(|it| remove_rec(it, rest)).sum(),
                _ => 0,
            }
        }
        Segment::Key(_) => {
            let Some(map) = cur.as_object_mut() else { return 0 };
            let Some((key, used)) = resolve_key(map, segs) else { return 0 };
            if used == segs.len() {
                map.remove(&*key).map_or(0, |_| 1)
            } else {
                map.get_mut(&*key).map_or(0, |child| remove_rec(child, &segs[used..]))
            }
        }
    }
}
