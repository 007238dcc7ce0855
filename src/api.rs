//! REST wrapper around the pipeline for the dashboard front end.
//!
//! Routes:
//! - `GET /health`
//! - `GET /jobs`: current baseline
//! - `GET /companies`: configured companies by vendor kind
//! - `GET /scrape?company=`: start a background run, returns `taskId`
//! - `GET /scrape/status/{task_id}`: `pending` until done; the final payload is returned once

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

use crate::baseline::BaselineStore;
use crate::ingest::config::CompanyListing;
use crate::ingest::types::SourceAdapter;
use crate::ingest::FetchOptions;
use crate::metrics::Metrics;
use crate::notify::Notifier;
use crate::pipeline::{run_pipeline, RunReport};

/// Completed results nobody polled are dropped after this long.
pub const COMPLETED_TASK_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
enum TaskStatus {
    Running,
    Completed {
        report: Box<RunReport>,
        finished_at: String,
        finished: Instant,
    },
}

#[derive(Clone)]
pub struct AppState {
    companies: Arc<CompanyListing>,
    adapters: Arc<Vec<Arc<dyn SourceAdapter>>>,
    store: BaselineStore,
    notifier: Arc<dyn Notifier>,
    opts: FetchOptions,
    task_ttl: Duration,
    tasks: Arc<RwLock<HashMap<String, TaskStatus>>>,
}

impl AppState {
    pub fn new(
        companies: CompanyListing,
        adapters: Vec<Arc<dyn SourceAdapter>>,
        store: BaselineStore,
        notifier: Arc<dyn Notifier>,
        opts: FetchOptions,
    ) -> Self {
        Self {
            companies: Arc::new(companies),
            adapters: Arc::new(adapters),
            store,
            notifier,
            opts,
            task_ttl: COMPLETED_TASK_TTL,
            tasks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn with_task_ttl(mut self, ttl: Duration) -> Self {
        self.task_ttl = ttl;
        self
    }
}

/// Path-safe task id label: lowercase alphanumerics, everything else `-`.
fn task_label(company: Option<&str>) -> String {
    let Some(c) = company else {
        return "all".to_string();
    };
    let label: String = c
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    if label.is_empty() {
        "all".to_string()
    } else {
        label
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { Json(json!({ "message": "Job board watcher running" })) }))
        .route("/health", get(|| async { "ok" }))
        .route("/jobs", get(get_jobs))
        .route("/companies", get(list_companies))
        .route("/scrape", get(start_scrape))
        .route("/scrape/status/{task_id}", get(scrape_status))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn get_jobs(State(state): State<AppState>) -> Json<serde_json::Value> {
    let jobs = state.store.load().await;
    Json(json!({ "status": "success", "jobs": jobs }))
}

async fn list_companies(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "status": "success", "companies": *state.companies }))
}

#[derive(Debug, Deserialize)]
struct ScrapeParams {
    company: Option<String>,
}

async fn start_scrape(
    State(state): State<AppState>,
    Query(params): Query<ScrapeParams>,
) -> Json<serde_json::Value> {
    let company = params.company.filter(|c| !c.trim().is_empty());
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let task_id = format!("scrape_{}_{}", task_label(company.as_deref()), &suffix[..8]);

    {
        let mut tasks = state.tasks.write().await;
        let ttl = state.task_ttl;
        let before = tasks.len();
        tasks.retain(|_, t| match t {
            TaskStatus::Running => true,
            TaskStatus::Completed { finished, .. } => finished.elapsed() < ttl,
        });
        if tasks.len() < before {
            tracing::debug!(evicted = before - tasks.len(), "dropped stale scrape results");
        }
        tasks.insert(task_id.clone(), TaskStatus::Running);
    }

    let bg = state.clone();
    let id = task_id.clone();
    tokio::spawn(async move {
        let report = run_pipeline(
            &bg.adapters,
            &bg.store,
            bg.notifier.as_ref(),
            &bg.opts,
            company.as_deref(),
        )
        .await;
        tracing::info!(task = %id, new = report.new_records.len(), "background scrape finished");
        bg.tasks.write().await.insert(
            id,
            TaskStatus::Completed {
                report: Box::new(report),
                finished_at: Utc::now().to_rfc3339(),
                finished: Instant::now(),
            },
        );
    });

    Json(json!({
        "status": "started",
        "message": "Job scraping started",
        "taskId": task_id,
    }))
}

async fn scrape_status(State(state): State<AppState>, Path(task_id): Path<String>) -> Response {
    let mut tasks = state.tasks.write().await;
    match tasks.remove(&task_id) {
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "status": "error", "message": "unknown task" })),
        )
            .into_response(),
        Some(TaskStatus::Running) => {
            tasks.insert(task_id, TaskStatus::Running);
            Json(json!({
                "status": "pending",
                "message": "Task is still running",
            }))
            .into_response()
        }
        // Completed payloads are handed out once.
        Some(TaskStatus::Completed {
            report,
            finished_at,
            ..
        }) => Json(json!({
            "status": "completed",
            "jobs": report.surfaced,
            "count": report.surfaced.len(),
            "new": report.new_records.len(),
            "fetched": report.fetched,
            "sources": report.sources,
            "persisted": report.persisted,
            "timestamp": finished_at,
        }))
        .into_response(),
    }
}

/// Serve the API (plus `/metrics`) until the process is stopped.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let metrics = Metrics::init(&state.opts)?;
    let app = router(state).merge(metrics.router());
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "api listening");
    axum::serve(listener, app).await.context("api server")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_label_is_path_safe() {
        assert_eq!(task_label(None), "all");
        assert_eq!(task_label(Some("Ciena")), "ciena");
        assert_eq!(task_label(Some("R&D / Ottawa")), "r-d---ottawa");
        assert_eq!(task_label(Some("   ")), "all");
    }
}
