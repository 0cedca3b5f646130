//! Outbound notification channels. Each channel wraps one vendor
//! transport behind [`NotificationChannel`]; the dispatcher owns the
//! configured instances and hands them to the send handler by name.
//! Deliveries are awaited one at a time with no retry; a failed delivery
//! is reported to the caller, not replayed.

pub mod email;
pub mod sms;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::{self, NotifyConfig};
use crate::error::ApiError;

use email::EmailChannel;
use sms::SmsChannel;

#[derive(Debug, Clone, Deserialize)]
pub struct Recipient {
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Recipient {
    /// Display label for delivery reports.
    pub fn label(&self) -> String {
        self.email
            .clone()
            .or_else(|| self.phone.clone())
            .unwrap_or_else(|| "(empty recipient)".to_string())
    }
}

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Channel type name (`"email"`, `"sms"`).
    fn name(&self) -> &'static str;

    async fn deliver(&self, recipient: &Recipient, subject: &str, body: &str)
        -> anyhow::Result<()>;
}

/// Configured channel instances, built once from config.
pub struct Dispatcher {
    email: Option<EmailChannel>,
    sms: Option<SmsChannel>,
}

impl Dispatcher {
    pub fn from_config(cfg: &NotifyConfig) -> Self {
        let email = match EmailChannel::from_config(cfg) {
            Ok(channel) => channel,
            Err(e) => {
                tracing::warn!("email channel disabled: {}", e);
                None
            }
        };
        let sms = SmsChannel::from_config(cfg);
        Self { email, sms }
    }

    pub fn channel(&self, name: &str) -> Result<&dyn NotificationChannel, ApiError> {
        match name {
            "email" => self
                .email
                .as_ref()
                .map(|c| c as &dyn NotificationChannel)
                .ok_or_else(|| ApiError::service_unavailable("Email channel is not configured")),
            "sms" => self
                .sms
                .as_ref()
                .map(|c| c as &dyn NotificationChannel)
                .ok_or_else(|| ApiError::service_unavailable("SMS channel is not configured")),
            other => Err(ApiError::bad_request(format!("Unknown channel: {}", other))),
        }
    }
}

pub static DISPATCHER: Lazy<Dispatcher> =
    Lazy::new(|| Dispatcher::from_config(&config::config().notify));

/// Substitute `{{placeholder}}` markers from the params map. Unresolved
/// placeholders fail the request instead of leaking braces to recipients.
pub fn render_template(text: &str, params: &Map<String, Value>) -> Result<String, ApiError> {
    let mut out = String::with_capacity(text.len());
    let mut missing: Vec<String> = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let key = after[..end].trim();
        match params.get(key) {
            Some(Value::String(s)) => out.push_str(s),
            Some(Value::Number(n)) => out.push_str(&n.to_string()),
            Some(Value::Bool(b)) => out.push_str(if *b { "true" } else { "false" }),
            _ => {
                if !missing.contains(&key.to_string()) {
                    missing.push(key.to_string());
                }
            }
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);

    if missing.is_empty() {
        Ok(out)
    } else {
        Err(ApiError::bad_request(format!(
            "Unresolved template placeholders: {}",
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn renders_placeholders() {
        let p = params(json!({ "name": "Ama", "count": 3 }));
        let out = render_template("Hello {{name}}, you have {{count}} items", &p).unwrap();
        assert_eq!(out, "Hello Ama, you have 3 items");
    }

    #[test]
    fn missing_placeholder_fails() {
        let p = params(json!({}));
        let err = render_template("Hello {{name}}", &p).unwrap_err();
        assert!(err.message().contains("name"));
    }

    #[test]
    fn text_without_markers_passes_through() {
        let p = params(json!({}));
        assert_eq!(render_template("Plain text", &p).unwrap(), "Plain text");
    }

    #[test]
    fn unterminated_marker_is_kept_verbatim() {
        let p = params(json!({ "a": "x" }));
        assert_eq!(render_template("{{a}} and {{b", &p).unwrap(), "x and {{b");
    }

    #[test]
    fn recipient_label_prefers_email() {
        let r = Recipient {
            email: Some("a@b.c".to_string()),
            phone: Some("+233200000000".to_string()),
        };
        assert_eq!(r.label(), "a@b.c");
        let r = Recipient { email: None, phone: None };
        assert_eq!(r.label(), "(empty recipient)");
    }
}
