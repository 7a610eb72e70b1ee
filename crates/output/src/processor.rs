//! The output pipeline: redact, then slim, then truncate.
//!
//! Redaction runs first so nothing sensitive survives into later stages or their
//! warnings. Truncation runs last so warnings describe the final list.

use std::time::Instant;

use chrono::Utc;
use kslim_core::OutputConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::redact::SecretMasker;
use crate::slim::Slimmer;
use crate::status::StatusTable;
use crate::summary::{summarize_with, ResourceSummary, SummaryOptions};
use crate::truncate::{effective_limit, estimate_list_size, fit_byte_budget, truncate_response};
use crate::{ProcessingMetadata, ProcessingResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingStats {
    pub items_processed: usize,
    pub items_truncated: usize,
    /// Secret records whose payload was masked.
    pub secrets_redacted: usize,
    pub fields_removed: usize,
    pub bytes_saved: u64,
    pub processing_time_ms: u64,
}

#[derive(Default)]
struct Tally {
    secrets: usize,
    fields: usize,
}

#[derive(Debug, Clone)]
pub struct Processor {
    config: OutputConfig,
    masker: SecretMasker,
    slimmer: Slimmer,
    statuses: StatusTable,
}

impl Default for Processor {
    fn default() -> Self {
        Self::new(OutputConfig::default())
    }
}

impl Processor {
    /// The config is stored validated: defaults filled, ceilings applied.
    pub fn new(config: OutputConfig) -> Self {
        let config = config.validated();
        let slimmer = Slimmer::new(config.excluded_fields.as_slice());
        Self { config, masker: SecretMasker::default(), slimmer, statuses: StatusTable::default() }
    }

    pub fn with_masker(mut self, masker: SecretMasker) -> Self {
        self.masker = masker;
        self
    }

    pub fn with_status_table(mut self, statuses: StatusTable) -> Self {
        self.statuses = statuses;
        self
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    pub fn process(&self, items: &[Value]) -> ProcessingResult {
        self.run(items, self.config.item_limit()).0
    }

    /// Process with a per-request limit; the configured limit and ceiling still apply.
    pub fn process_with_limit(&self, items: &[Value], limit: i64) -> ProcessingResult {
        self.run(items, effective_limit(limit, self.config.max_items)).0
    }

    /// Redact and slim one record. No truncation.
    pub fn process_single(&self, item: &Value) -> Value {
        let mut out = item.clone();
        if !out.is_null() {
            self.apply_passes(&mut out);
        }
        out
    }

    pub fn summarize(&self, items: &[Value], opts: &SummaryOptions) -> ResourceSummary {
        summarize_with(items, opts, &self.statuses)
    }

    pub fn should_suggest_summary(&self, count: usize) -> bool {
        count > self.config.summary_threshold()
    }

    pub fn process_with_stats(&self, items: &[Value]) -> (ProcessingResult, ProcessingStats) {
        self.run_with_stats(items, self.config.item_limit())
    }

    /// [`Processor::process_with_limit`] plus statistics.
    pub fn process_with_limit_and_stats(&self, items: &[Value], limit: i64) -> (ProcessingResult, ProcessingStats) {
        self.run_with_stats(items, effective_limit(limit, self.config.max_items))
    }

    fn run_with_stats(&self, items: &[Value], limit: usize) -> (ProcessingResult, ProcessingStats) {
        let start = Instant::now();
        let (result, tally) = self.run(items, limit);
        let stats = ProcessingStats {
            items_processed: items.len(),
            items_truncated: items.len() - result.metadata.final_count,
            secrets_redacted: tally.secrets,
            fields_removed: tally.fields,
            bytes_saved: result.metadata.bytes_reduced,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };
        (result, stats)
    }

    fn apply_passes(&self, item: &mut Value) -> Tally {
        let mut t = Tally::default();
        if self.config.mask_secrets && self.masker.mask_in_place(item) {
            t.secrets += 1;
        }
        if self.config.slim_output {
            t.fields += self.slimmer.slim_in_place(item);
        }
        t
    }

    fn run(&self, items: &[Value], limit: usize) -> (ProcessingResult, Tally) {
        let start = Instant::now();
        let mut metadata = ProcessingMetadata::started(Utc::now(), items.len());
        let mut tally = Tally::default();
        if items.is_empty() {
            return (ProcessingResult { items: Vec::new(), warnings: Vec::new(), metadata }, tally);
        }

        let before = estimate_list_size(items);
        let mut processed = items.to_vec();
        for item in processed.iter_mut() {
            let t = self.apply_passes(item);
            tally.secrets += t.secrets;
            tally.fields += t.fields;
        }
        metadata.secrets_masked = self.config.mask_secrets;
        metadata.slim_applied = self.config.slim_output;

        let mut warnings = Vec::new();
        let (kept, warning) = truncate_response(processed, limit as i64);
        warnings.extend(warning);
        let (kept, warning) = fit_byte_budget(kept, self.config.response_byte_limit(), items.len());
        warnings.extend(warning);

        metadata.truncated = !warnings.is_empty();
        metadata.final_count = kept.len();
        let after: u64 = estimate_list_size(&kept);
        metadata.bytes_reduced = before.saturating_sub(after);

        let dropped = items.len() - kept.len();
        let elapsed = start.elapsed();
        metrics::histogram!("output_process_ms").record(elapsed.as_secs_f64() * 1000.0);
        if dropped > 0 {
            metrics::counter!("output_items_truncated_total").increment(dropped as u64);
        }
        if tally.secrets > 0 {
            metrics::counter!("output_secrets_masked_total").increment(tally.secrets as u64);
        }
        debug!(
            original = items.len(),
            kept = kept.len(),
            limit,
            secrets = tally.secrets,
            fields_removed = tally.fields,
            bytes_reduced = metadata.bytes_reduced,
            took_ms = elapsed.as_millis() as u64,
            "processed output"
        );
        (ProcessingResult { items: kept, warnings, metadata }, tally)
    }
}

/// [`Processor::process`] with the default configuration.
pub fn quick_process(items: &[Value]) -> ProcessingResult {
    Processor::default().process(items)
}

pub fn quick_process_single(item: &Value) -> Value {
    Processor::default().process_single(item)
}
