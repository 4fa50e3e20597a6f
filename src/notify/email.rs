use anyhow::{bail, Context, Result};
use lettre::message::{Mailbox, Message, MultiPart};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::{digest, DigestNotifier};
use crate::config::SmtpSettings;
use crate::error::ConfigError;
use crate::ingest::types::Paper;

pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    /// Build a STARTTLS mailer. Settings must already be validated.
    pub fn new(smtp: &SmtpSettings) -> Result<Self, ConfigError> {
        let from: Mailbox = smtp.sender.parse().map_err(|_| ConfigError::Invalid {
            key: "SENDER_EMAIL",
            value: smtp.sender.clone(),
        })?;
        let to: Mailbox = smtp.receiver.parse().map_err(|_| ConfigError::Invalid {
            key: "RECEIVER_EMAIL",
            value: smtp.receiver.clone(),
        })?;

        let creds = Credentials::new(smtp.sender.clone(), smtp.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.server)
            .map_err(|_| ConfigError::Invalid {
                key: "SMTP_SERVER",
                value: smtp.server.clone(),
            })?
            .port(smtp.port)
            .credentials(creds)
            .build();

        Ok(Self { mailer, from, to })
    }
}

#[async_trait::async_trait]
impl DigestNotifier for EmailNotifier {
    async fn send_digest(&self, papers: &[Paper], topic: &str) -> Result<()> {
        if papers.is_empty() {
            bail!("no papers to send");
        }

        let today = chrono::Local::now().date_naive();
        let msg = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(digest::subject(topic, today))
            .multipart(MultiPart::alternative_plain_html(
                digest::render_text(papers, topic, today),
                digest::render_html(papers, topic, today),
            ))
            .context("build email")?;

        self.mailer.send(msg).await.context("send email")?;
        tracing::info!(target: "notify", to = %self.to, papers = papers.len(), "digest sent");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "email"
    }
}
