//! Typed objects to records.
//!
//! Anything `Serialize` works; `k8s-openapi` resources serialize with their `kind`
//! and `apiVersion`, so kind-based passes see them the same as raw API output.

use kslim_core::Result;
use serde::Serialize;
use serde_json::Value;

use crate::processor::Processor;
use crate::ProcessingResult;

pub fn to_record<T: Serialize>(obj: &T) -> Result<Value> {
    Ok(serde_json::to_value(obj)?)
}

pub fn to_records<T: Serialize>(objs: &[T]) -> Result<Vec<Value>> {
    objs.iter().map(to_record).collect()
}

/// Convert then run the full pipeline with a per-request limit.
pub fn process_objects<T: Serialize>(processor: &Processor, objs: &[T], limit: i64) -> Result<ProcessingResult> {
    let records = to_records(objs)?;
    Ok(processor.process_with_limit(&records, limit))
}

pub fn process_single_object<T: Serialize>(processor: &Processor, obj: &T) -> Result<Value> {
    Ok(processor.process_single(&to_record(obj)?))
}
