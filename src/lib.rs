// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod baseline;
pub mod config;
pub mod delta;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod pipeline;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::baseline::BaselineStore;
pub use crate::ingest::types::{JobRecord, SourceAdapter, SourceConfig, SourceKind};
pub use crate::notify::{Notifier, NotifyOutcome};
pub use crate::pipeline::{run_pipeline, RunReport};
