// src/ingest/mod.rs
pub mod config;
pub mod normalize;
pub mod providers;
pub mod types;

use crate::ingest::types::{JobRecord, SourceAdapter, SourceKind};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 45;
pub const DEFAULT_FETCH_CONCURRENCY: usize = 8;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_jobs_total", "Total postings parsed from sources.");
        describe_counter!(
            "ingest_provider_errors_total",
            "Source fetch/parse errors."
        );
        describe_counter!(
            "ingest_provider_timeouts_total",
            "Source fetches abandoned after the per-task timeout."
        );
        describe_histogram!("ingest_parse_ms", "Source parse time in milliseconds.");
        describe_gauge!(
            "ingest_pipeline_last_run_ts",
            "Unix ts when the fetch orchestrator last ran."
        );
    });
}

#[derive(Clone, Copy, Debug)]
pub struct FetchOptions {
    /// Budget for a single source, counted from when it gets a slot.
    pub timeout: Duration,
    /// Max fetches in flight; the rest queue.
    pub concurrency: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Ok { count: usize },
    Failed { error: String },
    TimedOut,
}

impl SourceStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, SourceStatus::Ok { .. })
    }
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceStatus::Ok { count } => write!(f, "ok, {count} postings"),
            SourceStatus::Failed { error } => write!(f, "failed: {error}"),
            SourceStatus::TimedOut => f.write_str("timed out"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub name: String,
    pub kind: SourceKind,
    #[serde(flatten)]
    pub status: SourceStatus,
}

#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// Union of every source's postings; duplicates across sources are kept.
    pub records: Vec<JobRecord>,
    pub sources: Vec<SourceReport>,
}

impl FetchOutcome {
    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources.iter().filter(|s| !s.status.is_ok())
    }
}

async fn fetch_one(
    adapter: Arc<dyn SourceAdapter>,
    permits: Arc<Semaphore>,
    timeout: Duration,
) -> (Vec<JobRecord>, SourceStatus) {
    // The semaphore is never closed, so acquire only fails if that invariant breaks.
    let _permit = match permits.acquire_owned().await {
        Ok(p) => p,
        Err(e) => return (Vec::new(), SourceStatus::Failed { error: e.to_string() }),
    };

    match tokio::time::timeout(timeout, adapter.fetch_latest()).await {
        Ok(Ok(records)) => {
            tracing::debug!(provider = adapter.name(), count = records.len(), "source fetched");
            let count = records.len();
            (records, SourceStatus::Ok { count })
        }
        Ok(Err(e)) => {
            tracing::warn!(error = ?e, provider = adapter.name(), "provider error");
            counter!("ingest_provider_errors_total").increment(1);
            (Vec::new(), SourceStatus::Failed { error: format!("{e:#}") })
        }
        Err(_) => {
            tracing::warn!(
                provider = adapter.name(),
                timeout_secs = timeout.as_secs_f64(),
                "provider timed out"
            );
            counter!("ingest_provider_timeouts_total").increment(1);
            (Vec::new(), SourceStatus::TimedOut)
        }
    }
}

/// Fetch every source concurrently and merge the results.
///
/// Each source runs in its own task and owns its result slot; slots are merged
/// in adapter order once every task has settled. A failing, panicking or
/// timed-out source contributes nothing and never aborts its siblings.
pub async fn run_once(adapters: &[Arc<dyn SourceAdapter>], opts: &FetchOptions) -> FetchOutcome {
    ensure_metrics_described();

    let permits = Arc::new(Semaphore::new(opts.concurrency.max(1)));
    let handles: Vec<_> = adapters
        .iter()
        .map(|a| {
            let handle = tokio::spawn(fetch_one(a.clone(), permits.clone(), opts.timeout));
            (a.name().to_string(), a.kind(), handle)
        })
        .collect();

    let mut outcome = FetchOutcome::default();
    for (name, kind, handle) in handles {
        let (mut records, status) = match handle.await {
            Ok(slot) => slot,
            Err(e) => {
                tracing::warn!(error = ?e, provider = %name, "provider task panicked");
                counter!("ingest_provider_errors_total").increment(1);
                (Vec::new(), SourceStatus::Failed { error: e.to_string() })
            }
        };
        outcome.records.append(&mut records);
        outcome.sources.push(SourceReport { name, kind, status });
    }

    let now = chrono::Utc::now().timestamp().max(0) as u64;
    gauge!("ingest_pipeline_last_run_ts").set(now as f64);
    tracing::info!(
        target: "ingest",
        sources = outcome.sources.len(),
        failed = outcome.failed_sources().count(),
        records = outcome.records.len(),
        "fetch finished"
    );

    outcome
}
