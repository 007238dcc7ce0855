// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Canonical job posting every adapter converges to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String, // dedup key, stable across runs
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub source: String, // e.g. "Acme", set by the adapter
    #[serde(default)]
    pub url: String,
    /// Raw vendor fields, passed through for display only.
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl JobRecord {
    /// Title-like vendor field, looked up in `extra`.
    pub fn vendor_field(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }
}

/// Vendors send ids either as strings or as bare numbers.
fn deserialize_id<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(de)?;
    crate::ingest::normalize::value_to_id(&v)
        .ok_or_else(|| serde::de::Error::custom("job id must be a non-empty string or number"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    BambooHr,
    Workday,
    ThirdParty,
}

impl SourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::BambooHr => "BambooHR",
            SourceKind::Workday => "Workday",
            SourceKind::ThirdParty => "Third-party",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Static description of one adapter target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub name: String,
    pub endpoint: String,
    pub headers: BTreeMap<String, String>,
    pub payload: Option<Value>,
    pub url_prefix: Option<String>,
}

impl SourceConfig {
    pub fn new(kind: SourceKind, name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            endpoint: endpoint.into(),
            headers: BTreeMap::new(),
            payload: None,
            url_prefix: None,
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = Some(prefix.into());
        self
    }
}

#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Fetch and normalize every posting the source currently lists.
    async fn fetch_latest(&self) -> Result<Vec<JobRecord>>;
    /// Display name, also used as `JobRecord::source`.
    fn name(&self) -> &str;
    fn kind(&self) -> SourceKind;
}
