use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::NotifyConfig;

use super::{NotificationChannel, Recipient};

pub struct EmailChannel {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailChannel {
    /// Build the SMTP transport from config. Returns Ok(None) when the
    /// channel is simply not configured (no host or sender address).
    pub fn from_config(cfg: &NotifyConfig) -> Result<Option<Self>> {
        let (Some(host), Some(from)) = (cfg.smtp_host.as_deref(), cfg.smtp_from.as_deref()) else {
            return Ok(None);
        };

        let from: Mailbox = from
            .parse()
            .with_context(|| format!("invalid SMTP_FROM address: {}", from))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .with_context(|| format!("invalid SMTP relay host: {}", host))?
            .port(cfg.smtp_port);

        if let (Some(user), Some(pass)) = (cfg.smtp_username.as_deref(), cfg.smtp_password.as_deref())
        {
            builder = builder.credentials(Credentials::new(user.to_string(), pass.to_string()));
        }

        Ok(Some(Self {
            transport: builder.build(),
            from,
        }))
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn deliver(&self, recipient: &Recipient, subject: &str, body: &str) -> Result<()> {
        let to = recipient
            .email
            .as_deref()
            .context("recipient has no email address")?;
        let to: Mailbox = to
            .parse()
            .with_context(|| format!("invalid recipient email address: {}", to))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .context("failed to build email message")?;

        self.transport
            .send(message)
            .await
            .context("SMTP delivery failed")?;
        Ok(())
    }
}
