//! Append-only audit trail. Every mutating handler records the actor, the
//! action and the affected record. Failures are logged rather than
//! surfaced: the mutation itself has already committed.

use serde_json::Value;
use uuid::Uuid;

use crate::config;
use crate::middleware::auth::AuthUser;

use super::manager;

pub async fn record(
    actor: &AuthUser,
    action: &str,
    resource: &str,
    record_id: Option<Uuid>,
    detail: Value,
) {
    if !config::config().security.enable_audit_logging {
        return;
    }

    let pool = match manager::pool().await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!("audit log skipped, no database: {}", e);
            return;
        }
    };

    let result = sqlx::query(
        "INSERT INTO audit_logs (actor_id, action, resource, record_id, detail) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(actor.id)
    .bind(action)
    .bind(resource)
    .bind(record_id)
    .bind(detail)
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::warn!(
            action,
            resource,
            "failed to write audit log entry: {}",
            e
        );
    }
}
