// src/notify/mod.rs
pub mod email;

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;

use crate::ingest::types::JobRecord;

pub use email::EmailNotifier;

pub const SUBJECT: &str = "New Job Postings";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NotifyOutcome {
    Sent { count: usize },
    Skipped { reason: String },
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a digest of `records`. Callers log failures; they never roll anything back.
    async fn notify(&self, records: &[JobRecord]) -> Result<NotifyOutcome>;
    fn name(&self) -> &'static str;
}

/// Plain-text digest: source, title and link per posting.
pub fn render_digest(records: &[JobRecord]) -> String {
    let mut body = String::new();
    for r in records {
        body.push_str(&format!("[{}] {}\n{}\n\n", r.source, r.title, r.url));
    }
    body
}

/// Used when the transport is not configured.
pub struct DisabledNotifier {
    reason: String,
}

impl DisabledNotifier {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait::async_trait]
impl Notifier for DisabledNotifier {
    async fn notify(&self, records: &[JobRecord]) -> Result<NotifyOutcome> {
        tracing::warn!(
            pending = records.len(),
            "email disabled ({}), not sending",
            self.reason
        );
        Ok(NotifyOutcome::Skipped {
            reason: self.reason.clone(),
        })
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Email when `EMAIL_FROM` and `EMAIL_PASSWORD` are set, otherwise a logged no-op.
pub fn notifier_from_env() -> Arc<dyn Notifier> {
    match EmailNotifier::from_env() {
        Ok(Some(n)) => Arc::new(n),
        Ok(None) => Arc::new(DisabledNotifier::new(
            "EMAIL_FROM or EMAIL_PASSWORD not set",
        )),
        Err(e) => {
            tracing::warn!("email notifier misconfigured: {e:#}");
            Arc::new(DisabledNotifier::new(format!("{e:#}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_lists_source_title_link() {
        let recs = vec![
            JobRecord {
                id: "1".into(),
                title: "Backend Developer".into(),
                source: "Acme".into(),
                url: "https://acme.test/1".into(),
                extra: Default::default(),
            },
            JobRecord {
                id: "2".into(),
                title: "Designer".into(),
                source: "Beta".into(),
                url: "https://beta.test/2".into(),
                extra: Default::default(),
            },
        ];
        assert_eq!(
            render_digest(&recs),
            "[Acme] Backend Developer\nhttps://acme.test/1\n\n[Beta] Designer\nhttps://beta.test/2\n\n"
        );
        assert_eq!(render_digest(&[]), "");
    }

    #[tokio::test]
    async fn disabled_notifier_skips() {
        let n = DisabledNotifier::new("no creds");
        let out = n.notify(&[]).await.unwrap();
        assert_eq!(
            out,
            NotifyOutcome::Skipped {
                reason: "no creds".into()
            }
        );
    }
}
