//! pipeline.rs: one fetch → diff → notify → persist cycle.

use metrics::counter;
use serde::Serialize;
use std::sync::Arc;

use crate::baseline::BaselineStore;
use crate::delta::{filter_for_display, new_records};
use crate::ingest::types::{JobRecord, SourceAdapter};
use crate::ingest::{run_once, FetchOptions, SourceReport};
use crate::notify::{Notifier, NotifyOutcome};

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Size of the full fetch, which is also the new baseline.
    pub fetched: usize,
    /// Every record absent from the previous baseline.
    pub new_records: Vec<JobRecord>,
    /// `new_records` narrowed by the company filter; what the operator sees.
    pub surfaced: Vec<JobRecord>,
    pub sources: Vec<SourceReport>,
    pub notify: Option<NotifyOutcome>,
    pub notify_error: Option<String>,
    pub persisted: bool,
}

impl RunReport {
    /// Console summary of what was found.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.surfaced.len() + 1);
        lines.push(format!("Found {} new jobs.", self.surfaced.len()));
        for r in &self.surfaced {
            lines.push(format!("- {} @ {}", r.title, r.source));
        }
        lines
    }

    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources.iter().filter(|s| !s.status.is_ok())
    }
}

/// Run the pipeline once.
///
/// The company filter only narrows what is surfaced and notified; the new
/// baseline is always the full fetch, written even when nothing is new and
/// even when some sources failed.
pub async fn run_pipeline(
    adapters: &[Arc<dyn SourceAdapter>],
    store: &BaselineStore,
    notifier: &dyn Notifier,
    opts: &FetchOptions,
    company: Option<&str>,
) -> RunReport {
    let baseline = store.load().await;
    let fetch = run_once(adapters, opts).await;

    let fresh = new_records(&baseline, &fetch.records);
    let surfaced = filter_for_display(&fresh, company);
    counter!("pipeline_new_jobs_total").increment(fresh.len() as u64);
    tracing::info!(
        baseline = baseline.len(),
        fetched = fetch.records.len(),
        new = fresh.len(),
        surfaced = surfaced.len(),
        company = company.unwrap_or(""),
        "delta computed"
    );

    let (notify, notify_error) = if surfaced.is_empty() {
        (None, None)
    } else {
        match notifier.notify(&surfaced).await {
            Ok(outcome) => (Some(outcome), None),
            Err(e) => {
                tracing::warn!(notifier = notifier.name(), "notification failed: {e:#}");
                counter!("pipeline_notify_errors_total").increment(1);
                (None, Some(format!("{e:#}")))
            }
        }
    };

    let persisted = match store.save(&fetch.records).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(path = %store.path().display(), "could not save baseline: {e:#}");
            false
        }
    };

    RunReport {
        fetched: fetch.records.len(),
        new_records: fresh,
        surfaced,
        sources: fetch.sources,
        notify,
        notify_error,
        persisted,
    }
}
