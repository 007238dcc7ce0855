// src/ingest/providers/mod.rs
pub mod bamboohr;
pub mod third_party;
pub mod workday;

use anyhow::{Context, Result};
use metrics::{counter, histogram};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::ingest::types::{JobRecord, SourceAdapter, SourceConfig, SourceKind};

pub use bamboohr::BambooHrProvider;
pub use third_party::ThirdPartyProvider;
pub use workday::WorkdayProvider;

/// Shared HTTP client for all adapters.
pub fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!(
            "job-board-watcher/",
            env!("CARGO_PKG_VERSION"),
            " (+job posting monitor)"
        ))
        .connect_timeout(Duration::from_secs(20))
        .build()
        .context("building http client")
}

/// Build the adapter variant matching `cfg.kind`.
pub fn adapter_for(cfg: SourceConfig, client: reqwest::Client) -> Arc<dyn SourceAdapter> {
    match cfg.kind {
        SourceKind::BambooHr => Arc::new(BambooHrProvider::new(cfg, client)),
        SourceKind::Workday => Arc::new(WorkdayProvider::new(cfg, client)),
        SourceKind::ThirdParty => Arc::new(ThirdPartyProvider::new(cfg, client)),
    }
}

pub fn adapters_for(
    sources: impl IntoIterator<Item = SourceConfig>,
    client: &reqwest::Client,
) -> Vec<Arc<dyn SourceAdapter>> {
    sources
        .into_iter()
        .map(|cfg| adapter_for(cfg, client.clone()))
        .collect()
}

/// Configured headers as one map; a repeated name keeps the last value.
fn header_map(headers: &BTreeMap<String, String>, provider: &str) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (k, v) in headers {
        let name = HeaderName::from_bytes(k.trim().as_bytes())
            .with_context(|| format!("{provider}: invalid header name {k:?}"))?;
        let value = HeaderValue::from_str(v.trim())
            .with_context(|| format!("{provider}: invalid value for header {k}"))?;
        map.insert(name, value);
    }
    Ok(map)
}

/// Send a prepared request and return the body of a 2xx response.
async fn send_for_body(req: reqwest::RequestBuilder, provider: &str) -> Result<String> {
    let resp = req
        .send()
        .await
        .with_context(|| format!("{provider} http request"))?
        .error_for_status()
        .with_context(|| format!("{provider} non-2xx"))?;
    resp.text()
        .await
        .with_context(|| format!("{provider} http .text()"))
}

/// Run `parse` over a body and record parse telemetry.
fn timed_parse<F>(body: &str, parse: F) -> Result<Vec<JobRecord>>
where
    F: FnOnce(&str) -> Result<Vec<JobRecord>>,
{
    let t0 = Instant::now();
    let out = parse(body)?;
    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("ingest_parse_ms").record(ms);
    counter!("ingest_jobs_total").increment(out.len() as u64);
    Ok(out)
}
