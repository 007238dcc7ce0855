// src/ingest/providers/workday.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{header_map, send_for_body, timed_parse};
use crate::ingest::normalize::{pick_title, resolve_link, synthesize_id, value_to_id};
use crate::ingest::types::{JobRecord, SourceAdapter, SourceConfig, SourceKind};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "jobPostings", default)]
    job_postings: Vec<Map<String, Value>>,
}

/// Workday "cxs" job search endpoint, queried with a POSTed facet payload.
pub struct WorkdayProvider {
    cfg: SourceConfig,
    client: reqwest::Client,
}

impl WorkdayProvider {
    pub fn new(cfg: SourceConfig, client: reqwest::Client) -> Self {
        Self { cfg, client }
    }

    pub fn parse_body(&self, body: &str) -> Result<Vec<JobRecord>> {
        let resp: SearchResponse =
            serde_json::from_str(body).context("parsing workday search json")?;
        let prefix = self.cfg.url_prefix.as_deref();

        let mut out = Vec::with_capacity(resp.job_postings.len());
        for mut posting in resp.job_postings {
            let external_path = posting
                .get("externalPath")
                .and_then(Value::as_str)
                .map(str::to_string)
                .filter(|p| !p.is_empty());

            // The raw path is the stable id; bulletFields[0] is usually the requisition number.
            let id = external_path
                .clone()
                .or_else(|| {
                    posting
                        .get("bulletFields")
                        .and_then(Value::as_array)
                        .and_then(|a| a.first())
                        .and_then(value_to_id)
                })
                .unwrap_or_else(|| synthesize_id(&self.cfg.name));

            let url = match &external_path {
                Some(path) => {
                    let full = resolve_link(prefix, path);
                    posting.insert("externalPath".into(), Value::String(full.clone()));
                    full
                }
                None => prefix.unwrap_or(self.cfg.endpoint.as_str()).to_string(),
            };

            out.push(JobRecord {
                id,
                title: pick_title(&posting),
                source: self.cfg.name.clone(),
                url,
                extra: posting,
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl SourceAdapter for WorkdayProvider {
    async fn fetch_latest(&self) -> Result<Vec<JobRecord>> {
        let payload = self
            .cfg
            .payload
            .clone()
            .unwrap_or_else(|| Value::Object(Map::new()));

        // Headers first: `.json()` only sets Content-Type when none is configured.
        let req = self
            .client
            .post(&self.cfg.endpoint)
            .headers(header_map(&self.cfg.headers, &self.cfg.name)?)
            .json(&payload);
        let body = send_for_body(req, &self.cfg.name).await?;
        timed_parse(&body, |b| self.parse_body(b))
    }

    fn name(&self) -> &str {
        &self.cfg.name
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Workday
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> WorkdayProvider {
        let cfg = SourceConfig::new(
            SourceKind::Workday,
            "Ciena",
            "https://ciena.wd5.myworkdayjobs.com/wday/cxs/ciena/Careers/jobs",
        )
        .with_url_prefix("https://ciena.wd5.myworkdayjobs.com/en-US/ciena");
        WorkdayProvider::new(cfg, reqwest::Client::new())
    }

    #[test]
    fn relative_external_path_becomes_id_and_link() {
        let body = r#"{"total":1,"jobPostings":[{
            "title":"Software Engineer",
            "externalPath":"/job/Ottawa/Software-Engineer_R1",
            "locationsText":"Ottawa",
            "bulletFields":["R1"]
        }]}"#;
        let jobs = provider().parse_body(body).unwrap();
        assert_eq!(jobs.len(), 1);
        let j = &jobs[0];
        assert_eq!(j.id, "/job/Ottawa/Software-Engineer_R1");
        assert_eq!(
            j.url,
            "https://ciena.wd5.myworkdayjobs.com/en-US/ciena/job/Ottawa/Software-Engineer_R1"
        );
        assert_eq!(j.vendor_field("externalPath"), Some(j.url.as_str()));
        assert_eq!(j.source, "Ciena");
        assert_eq!(j.vendor_field("locationsText"), Some("Ottawa"));
    }

    #[test]
    fn bullet_fields_then_random_id() {
        let body = r#"{"jobPostings":[
            {"title":"A","bulletFields":["R77","Posted Today"]},
            {"title":"B"}
        ]}"#;
        let jobs = provider().parse_body(body).unwrap();
        assert_eq!(jobs[0].id, "R77");
        assert_eq!(jobs[0].url, "https://ciena.wd5.myworkdayjobs.com/en-US/ciena");
        assert!(!jobs[1].id.is_empty());
    }

    #[test]
    fn absolute_paths_are_kept_and_missing_list_is_empty() {
        let body = r#"{"jobPostings":[{"title":"A","externalPath":"https://elsewhere.test/j/1"}]}"#;
        let jobs = provider().parse_body(body).unwrap();
        assert_eq!(jobs[0].url, "https://elsewhere.test/j/1");

        assert!(provider().parse_body(r#"{"total":0}"#).unwrap().is_empty());
        assert!(provider().parse_body("not json").is_err());
    }
}
