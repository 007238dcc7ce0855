// src/ingest/providers/third_party.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{header_map, send_for_body, timed_parse};
use crate::ingest::normalize::{pick_id, pick_link, pick_title, resolve_link, synthesize_id};
use crate::ingest::types::{JobRecord, SourceAdapter, SourceConfig, SourceKind};

/// Ad-hoc careers feed: a bare JSON array of postings.
pub struct ThirdPartyProvider {
    cfg: SourceConfig,
    client: reqwest::Client,
}

impl ThirdPartyProvider {
    pub fn new(cfg: SourceConfig, client: reqwest::Client) -> Self {
        Self { cfg, client }
    }

    pub fn parse_body(&self, body: &str) -> Result<Vec<JobRecord>> {
        let raw: Vec<Map<String, Value>> =
            serde_json::from_str(body).context("parsing third-party job array json")?;

        let out = raw
            .into_iter()
            .map(|posting| {
                let id =
                    pick_id(&posting, &["id"]).unwrap_or_else(|| synthesize_id(&self.cfg.name));
                let url = pick_link(&posting)
                    .map(|l| resolve_link(self.cfg.url_prefix.as_deref(), &l))
                    .unwrap_or_else(|| self.cfg.endpoint.clone());
                JobRecord {
                    id,
                    title: pick_title(&posting),
                    source: self.cfg.name.clone(),
                    url,
                    extra: posting,
                }
            })
            .collect();
        Ok(out)
    }
}

#[async_trait]
impl SourceAdapter for ThirdPartyProvider {
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
        SourceKind::ThirdParty
    }
}
