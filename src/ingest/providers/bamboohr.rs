// src/ingest/providers/bamboohr.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{header_map, send_for_body, timed_parse};
use crate::ingest::normalize::{pick_id, pick_title, synthesize_id};
use crate::ingest::types::{JobRecord, SourceAdapter, SourceConfig, SourceKind};

/// Older boards answer with `result`, newer ones with `jobs`.
#[derive(Debug, Deserialize)]
struct ListResponse {
    result: Option<Vec<Map<String, Value>>>,
    jobs: Option<Vec<Map<String, Value>>>,
}

pub struct BambooHrProvider {
    cfg: SourceConfig,
    client: reqwest::Client,
}

impl BambooHrProvider {
    pub fn new(cfg: SourceConfig, client: reqwest::Client) -> Self {
        Self { cfg, client }
    }

    /// Base for posting links: the endpoint without its `/list` suffix.
    fn careers_base(&self) -> String {
        let trimmed = self.cfg.endpoint.trim_end_matches('/');
        trimmed.strip_suffix("/list").unwrap_or(trimmed).to_string()
    }

    fn posting_url(&self, id: &str) -> String {
        let base = self.careers_base();
        if base.ends_with("/careers") {
            format!("{base}/{id}")
        } else {
            format!("{base}/careers/{id}")
        }
    }

    pub fn parse_body(&self, body: &str) -> Result<Vec<JobRecord>> {
        let list: ListResponse =
            serde_json::from_str(body).context("parsing bamboohr job list json")?;
        let raw = list
            .result
            .or(list.jobs)
            .ok_or_else(|| anyhow!("bamboohr response has neither `result` nor `jobs`"))?;

        let mut out = Vec::with_capacity(raw.len());
        for posting in raw {
            let id = pick_id(&posting, &["id", "jobId"])
                .unwrap_or_else(|| synthesize_id(&self.cfg.name));
            out.push(JobRecord {
                url: self.posting_url(&id),
                title: pick_title(&posting),
                source: self.cfg.name.clone(),
                id,
                extra: posting,
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl SourceAdapter for BambooHrProvider {
    async fn fetch_latest(&self) -> Result<Vec<JobRecord>> {
        let req = self
            .client
            .get(&self.cfg.endpoint)
            .headers(header_map(&self.cfg.headers, &self.cfg.name)?);
        let body = send_for_body(req, &self.cfg.name).await?;
        timed_parse(&body, |b| self.parse_body(b))
    }

    fn name(&self) -> &str {
        &self.cfg.name
    }

    fn kind(&self) -> SourceKind {
        SourceKind::BambooHr
    }
}
