//! Compliance issue lifecycle endpoint. Same contract as leave requests:
//! unknown literal 400, invalid transition 409, cross-district 403.

use axum::{
    extract::{Extension, Path},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::api::response::{ApiResponse, ApiResult};
use crate::auth::Role;
use crate::database::models::compliance_issue::{ComplianceIssue, IssueStatus};
use crate::database::{audit, manager};
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    #[serde(default)]
    pub status: String,
}

/// PATCH /api/compliance-issues/:id/status
pub async fn patch_status(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<StatusRequest>,
) -> ApiResult<ComplianceIssue> {
    auth.require_role(Role::DistrictAdmin)?;
    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::bad_request(format!("Invalid record id: {}", id)))?;

    let target = IssueStatus::parse(&payload.status).ok_or_else(|| {
        ApiError::bad_request(format!(
            "Unknown status: {} (expected open, in_progress, resolved or closed)",
            payload.status
        ))
    })?;

    let pool = manager::pool().await?;
    let record: ComplianceIssue = sqlx::query_as("SELECT * FROM compliance_issues WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Compliance issue {} not found", id)))?;

    if auth.district_scoped() && record.district_id != auth.district_id {
        return Err(ApiError::forbidden("Record is outside your district"));
    }

    let current = IssueStatus::parse(&record.status)
        .ok_or_else(|| ApiError::internal_server_error("Stored status is not recognized"))?;
    if !current.can_transition(target) {
        return Err(ApiError::conflict(format!(
            "Cannot move a {} issue to {}",
            current.as_str(),
            target.as_str()
        )));
    }

    let updated: ComplianceIssue = sqlx::query_as(
        "UPDATE compliance_issues SET status = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(target.as_str())
    .fetch_one(pool)
    .await?;

    audit::record(
        &auth,
        "status_change",
        "compliance-issues",
        Some(id),
        json!({ "from": current.as_str(), "to": target.as_str() }),
    )
    .await;

    Ok(ApiResponse::success(updated))
}
