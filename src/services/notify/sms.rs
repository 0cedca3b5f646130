use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::json;

use crate::config::NotifyConfig;

use super::{NotificationChannel, Recipient};

/// SMS delivery over a JSON HTTP gateway: one POST per recipient with the
/// API key in a header. The gateway handles carrier routing.
pub struct SmsChannel {
    client: reqwest::Client,
    gateway_url: String,
    api_key: String,
}

impl SmsChannel {
    pub fn from_config(cfg: &NotifyConfig) -> Option<Self> {
        let gateway_url = cfg.sms_gateway_url.clone()?;
        let api_key = cfg.sms_api_key.clone().unwrap_or_default();
        Some(Self {
            client: reqwest::Client::new(),
            gateway_url,
            api_key,
        })
    }
}

#[async_trait]
impl NotificationChannel for SmsChannel {
    fn name(&self) -> &'static str {
        "sms"
    }

    async fn deliver(&self, recipient: &Recipient, _subject: &str, body: &str) -> Result<()> {
        let phone = recipient
            .phone
            .as_deref()
            .context("recipient has no phone number")?;

        let response = self
            .client
            .post(&self.gateway_url)
            .header("x-api-key", &self.api_key)
            .json(&json!({ "to": phone, "message": body }))
            .send()
            .await
            .context("SMS gateway request failed")?;

        if !response.status().is_success() {
            bail!("SMS gateway returned status {}", response.status());
        }
        Ok(())
    }
}
