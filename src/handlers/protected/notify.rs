//! Notification dispatch: render a stored template (or an inline
//! subject/body), then deliver to each recipient over each requested
//! channel, sequentially. Per-recipient outcomes are reported back; when
//! nothing at all was delivered the request fails with 502.

use axum::{extract::Extension, Json};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::api::response::{ApiResponse, ApiResult};
use crate::auth::Role;
use crate::database::models::notification_template::NotificationTemplate;
use crate::database::{audit, manager};
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::services::notify::{render_template, Recipient, DISPATCHER};

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub template_id: Option<Uuid>,
    pub subject: Option<String>,
    pub body: Option<String>,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub recipients: Vec<Recipient>,
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// POST /api/notifications/send
pub async fn send(
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<SendRequest>,
) -> ApiResult<Value> {
    auth.require_role(Role::AgencyAdmin)?;

    if payload.channels.is_empty() {
        return Err(ApiError::bad_request("At least one channel is required"));
    }
    if payload.recipients.is_empty() {
        return Err(ApiError::bad_request("At least one recipient is required"));
    }

    // Resolve every channel up front so an unknown or unconfigured channel
    // fails the whole request before anything is delivered
    let mut channels = Vec::with_capacity(payload.channels.len());
    for name in &payload.channels {
        channels.push(DISPATCHER.channel(name)?);
    }

    let (subject, body) = match payload.template_id {
        Some(template_id) => {
            let pool = manager::pool().await?;
            let template: NotificationTemplate =
                sqlx::query_as("SELECT * FROM notification_templates WHERE id = $1")
                    .bind(template_id)
                    .fetch_optional(pool)
                    .await?
                    .ok_or_else(|| {
                        ApiError::not_found(format!("Notification template {} not found", template_id))
                    })?;
            (template.subject, template.body)
        }
        None => {
            let subject = payload
                .subject
                .clone()
                .ok_or_else(|| ApiError::bad_request("Either template_id or subject is required"))?;
            let body = payload
                .body
                .clone()
                .ok_or_else(|| ApiError::bad_request("Either template_id or body is required"))?;
            (subject, body)
        }
    };

    let subject = render_template(&subject, &payload.params)?;
    let body = render_template(&body, &payload.params)?;

    let mut results = Vec::new();
    let mut sent = 0usize;
    for channel in &channels {
        for recipient in &payload.recipients {
            match channel.deliver(recipient, &subject, &body).await {
                Ok(()) => {
                    sent += 1;
                    results.push(json!({
                        "channel": channel.name(),
                        "recipient": recipient.label(),
                        "success": true,
                    }));
                }
                Err(e) => {
                    tracing::warn!(
                        channel = channel.name(),
                        recipient = %recipient.label(),
                        "notification delivery failed: {:#}",
                        e
                    );
                    results.push(json!({
                        "channel": channel.name(),
                        "recipient": recipient.label(),
                        "success": false,
                        "error": format!("{:#}", e),
                    }));
                }
            }
        }
    }

    let failed = results.len() - sent;
    if sent == 0 {
        return Err(ApiError::bad_gateway("All notification deliveries failed"));
    }

    audit::record(
        &auth,
        "send",
        "notifications",
        payload.template_id,
        json!({ "channels": payload.channels, "sent": sent, "failed": failed }),
    )
    .await;

    Ok(ApiResponse::success(json!({
        "sent": sent,
        "failed": failed,
        "results": results,
    })))
}
