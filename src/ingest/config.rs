// src/ingest/config.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::normalize::company_from_endpoint;
use crate::ingest::types::{SourceConfig, SourceKind};

pub const ENV_PATH: &str = "JOB_SOURCES_PATH";
pub const DEFAULT_JSON_PATH: &str = "config/job_sources.json";
pub const DEFAULT_TOML_PATH: &str = "config/job_sources.toml";

/// BambooHR entries are usually bare list URLs; an object form allows a name override.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BambooEntry {
    Url(String),
    Full {
        endpoint: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        headers: BTreeMap<String, String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkdayEntry {
    pub name: String,
    pub endpoint: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub payload: Option<Value>,
    #[serde(default)]
    pub url_prefix: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThirdPartyEntry {
    pub name: String,
    pub endpoint: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub url_prefix: Option<String>,
}

/// The operator's source list. Unknown top-level keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourcesConfig {
    #[serde(rename = "ENDPOINTS", default)]
    pub endpoints: Vec<BambooEntry>,
    #[serde(rename = "WORKDAY_SOURCES", default)]
    pub workday_sources: Vec<WorkdayEntry>,
    #[serde(rename = "THIRD_PARTY_SOURCES", default)]
    pub third_party_sources: Vec<ThirdPartyEntry>,
}

/// Configured company names grouped by vendor kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompanyListing {
    pub bamboohr: Vec<String>,
    pub workday: Vec<String>,
    pub third_party: Vec<String>,
}

impl CompanyListing {
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("BambooHR companies: {}", self.bamboohr.join(", ")),
            format!("Workday companies: {}", self.workday.join(", ")),
            format!("Third-party companies: {}", self.third_party.join(", ")),
        ]
    }
}

impl BambooEntry {
    fn into_source(self) -> Result<SourceConfig> {
        let (endpoint, name, headers) = match self {
            BambooEntry::Url(endpoint) => (endpoint, None, BTreeMap::new()),
            BambooEntry::Full {
                endpoint,
                name,
                headers,
            } => (endpoint, name, headers),
        };
        let name = match name {
            Some(n) if !n.trim().is_empty() => n.trim().to_string(),
            _ => company_from_endpoint(&endpoint)
                .ok_or_else(|| anyhow!("cannot derive company name from {endpoint}"))?,
        };
        let mut cfg = SourceConfig::new(SourceKind::BambooHr, name, endpoint);
        cfg.headers = headers;
        Ok(cfg)
    }
}

impl SourcesConfig {
    /// Flatten into one `SourceConfig` per adapter invocation, in file order.
    pub fn sources(&self) -> Result<Vec<SourceConfig>> {
        let mut out = Vec::new();
        for e in &self.endpoints {
            out.push(e.clone().into_source()?);
        }
        for w in &self.workday_sources {
            let mut cfg = SourceConfig::new(SourceKind::Workday, &w.name, &w.endpoint);
            cfg.headers = w.headers.clone();
            cfg.payload = w.payload.clone();
            cfg.url_prefix = w.url_prefix.clone();
            out.push(cfg);
        }
        for t in &self.third_party_sources {
            let mut cfg = SourceConfig::new(SourceKind::ThirdParty, &t.name, &t.endpoint);
            cfg.headers = t.headers.clone();
            cfg.url_prefix = t.url_prefix.clone();
            out.push(cfg);
        }
        Ok(out)
    }

    pub fn companies(&self) -> Result<CompanyListing> {
        let mut listing = CompanyListing::default();
        for s in self.sources()? {
            match s.kind {
                SourceKind::BambooHr => listing.bamboohr.push(s.name),
                SourceKind::Workday => listing.workday.push(s.name),
                SourceKind::ThirdParty => listing.third_party.push(s.name),
            }
        }
        Ok(listing)
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
            && self.workday_sources.is_empty()
            && self.third_party_sources.is_empty()
    }
}

/// Load sources from an explicit path. Supports JSON or TOML.
pub fn load_sources_from(path: &Path) -> Result<SourcesConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading job sources from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg = parse_sources(&content, ext.as_str())
        .with_context(|| format!("parsing job sources in {}", path.display()))?;
    // Validate names up front so a bad entry is a startup error, not a silent skip.
    cfg.sources()?;
    Ok(cfg)
}

/// Load sources using env var + fallbacks:
/// 1) $JOB_SOURCES_PATH
/// 2) config/job_sources.json
/// 3) config/job_sources.toml
pub fn load_sources_default() -> Result<SourcesConfig> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_sources_from(&pb);
        }
        bail!("{ENV_PATH} points to non-existent path {}", pb.display());
    }
    let json_p = PathBuf::from(DEFAULT_JSON_PATH);
    if json_p.exists() {
        return load_sources_from(&json_p);
    }
    let toml_p = PathBuf::from(DEFAULT_TOML_PATH);
    if toml_p.exists() {
        return load_sources_from(&toml_p);
    }
    Err(anyhow!(
        "no job sources configured (set {ENV_PATH} or create {DEFAULT_JSON_PATH})"
    ))
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<SourcesConfig> {
    if hint_ext == "toml" {
        return toml::from_str(s).context("invalid toml");
    }
    match serde_json::from_str(s) {
        Ok(v) => Ok(v),
        Err(json_err) => {
            // Extension-less files: accept TOML too.
            toml::from_str(s).map_err(|_| anyhow!(json_err).context("invalid json"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "ENDPOINTS": [
            "https://solace.bamboohr.com/careers/list",
            {"endpoint": "https://dsr.bamboohr.com/careers/list", "name": "DistillerSR"}
        ],
        "WORKDAY_SOURCES": [{
            "name": "CIBC",
            "endpoint": "https://cibc.wd3.myworkdayjobs.com/wday/cxs/cibc/search/jobs",
            "headers": {"Accept": "application/json"},
            "payload": {"searchText": "", "appliedFacets": {}},
            "url_prefix": "https://cibc.wd3.myworkdayjobs.com/en-US/cibc"
        }],
        "THIRD_PARTY_SOURCES": [{"name": "Evertz", "endpoint": "https://evertz.test/careers.json"}],
        "FAILED_COMPANIES": ["ignored"]
    }"#;

    #[test]
    fn json_document_flattens_in_order() {
        let cfg = parse_sources(SAMPLE, "json").unwrap();
        let sources = cfg.sources().unwrap();
        let names: Vec<_> = sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Solace", "DistillerSR", "CIBC", "Evertz"]);
        assert_eq!(sources[2].kind, SourceKind::Workday);
        assert_eq!(sources[2].headers.get("Accept").unwrap(), "application/json");
        assert!(sources[2].payload.is_some());
        assert_eq!(sources[3].kind, SourceKind::ThirdParty);
    }

    #[test]
    fn companies_grouped_by_kind() {
        let cfg = parse_sources(SAMPLE, "json").unwrap();
        let listing = cfg.companies().unwrap();
        assert_eq!(listing.bamboohr, vec!["Solace", "DistillerSR"]);
        assert_eq!(listing.workday, vec!["CIBC"]);
        assert_eq!(listing.third_party, vec!["Evertz"]);
        assert_eq!(listing.lines()[0], "BambooHR companies: Solace, DistillerSR");
    }

    #[test]
    fn toml_document_is_accepted() {
        let s = r#"
ENDPOINTS = ["https://acme.bamboohr.com/careers/list"]

[[THIRD_PARTY_SOURCES]]
name = "Beta"
endpoint = "https://beta.test/jobs.json"
"#;
        let cfg = parse_sources(s, "toml").unwrap();
        assert_eq!(cfg.sources().unwrap().len(), 2);
        let cfg = parse_sources(s, "").unwrap();
        assert_eq!(cfg.companies().unwrap().bamboohr, vec!["Acme"]);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_sources("{not valid", "json").is_err());
        assert!(parse_sources("ENDPOINTS = 3", "toml").is_err());
    }
}
