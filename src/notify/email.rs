use anyhow::{Context, Result};
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::{render_digest, Notifier, NotifyOutcome, SUBJECT};
use crate::ingest::types::JobRecord;

pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";

/// SMTP over implicit TLS; the digest goes to the sender's own mailbox.
pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    pub fn new(host: &str, from_addr: &str, password: &str) -> Result<Self> {
        let creds = Credentials::new(from_addr.to_string(), password.to_string());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .with_context(|| format!("invalid SMTP host {host}"))?
            .credentials(creds)
            .build();

        let from: Mailbox = from_addr
            .parse()
            .with_context(|| format!("invalid sender address {from_addr}"))?;
        let to = from.clone();

        Ok(Self { mailer, from, to })
    }

    /// `Ok(None)` when either secret is missing.
    pub fn from_env() -> Result<Option<Self>> {
        let from = std::env::var("EMAIL_FROM").ok().filter(|v| !v.is_empty());
        let pass = std::env::var("EMAIL_PASSWORD").ok().filter(|v| !v.is_empty());
        let (Some(from), Some(pass)) = (from, pass) else {
            return Ok(None);
        };
        let host = std::env::var("SMTP_HOST").unwrap_or_else(|_| DEFAULT_SMTP_HOST.to_string());
        Self::new(&host, &from, &pass).map(Some)
    }

    pub fn build_message(&self, records: &[JobRecord]) -> Result<Message> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(SUBJECT)
            .header(header::ContentType::TEXT_PLAIN)
            .body(render_digest(records))
            .context("build email")
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, records: &[JobRecord]) -> Result<NotifyOutcome> {
        if records.is_empty() {
            return Ok(NotifyOutcome::Skipped {
                reason: "nothing new".into(),
            });
        }
        let msg = self.build_message(records)?;
        tracing::info!(count = records.len(), "sending email");
        self.mailer.send(msg).await.context("send email")?;
        tracing::info!("email sent");
        Ok(NotifyOutcome::Sent {
            count: records.len(),
        })
    }

    fn name(&self) -> &'static str {
        "email"
    }
}
