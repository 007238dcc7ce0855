//! baseline.rs: the persisted snapshot of postings seen on the last run.
//!
//! The snapshot is a flat JSON array of `JobRecord`s and the only durable state
//! of the system. It is read once at the start of a run and replaced wholesale at
//! the end; there is no merging and no locking between overlapping runs.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::delta::matches_company;
use crate::ingest::types::JobRecord;

pub const DEFAULT_BASELINE_PATH: &str = "data/previous_jobs.json";

#[derive(Debug, Clone)]
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Previous snapshot; empty when the file is absent, empty or unreadable.
    pub async fn load(&self) -> Vec<JobRecord> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "read baseline: {e:#}");
                return Vec::new();
            }
        };
        if content.trim().is_empty() {
            return Vec::new();
        }

        let entries: Vec<Value> = match serde_json::from_str(&content) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "baseline is not a json array, starting empty: {e:#}"
                );
                return Vec::new();
            }
        };

        // Keep whatever is usable; one bad entry should not drop the whole snapshot.
        let total = entries.len();
        let records: Vec<JobRecord> = entries
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect();
        if records.len() < total {
            tracing::warn!(
                path = %self.path.display(),
                skipped = total - records.len(),
                "baseline entries without usable id skipped"
            );
        }
        records
    }

    /// Overwrite the snapshot with `records`.
    pub async fn save(&self, records: &[JobRecord]) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let json = serde_json::to_vec_pretty(records).context("serializing baseline")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        self.save(&[]).await
    }

    /// Drop every record matching `filter`; returns how many were removed.
    pub async fn clear_for_company(&self, filter: &str) -> Result<usize> {
        let old = self.load().await;
        let before = old.len();
        let kept: Vec<JobRecord> = old
            .into_iter()
            .filter(|r| !matches_company(r, filter))
            .collect();
        let removed = before - kept.len();
        self.save(&kept).await?;
        Ok(removed)
    }
}
