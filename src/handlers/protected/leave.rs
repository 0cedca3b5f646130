//! Leave request approval flow. Status moves only through this endpoint;
//! the generic data plane treats the column as read-only.

use axum::{
    extract::{Extension, Path},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::api::response::{ApiResponse, ApiResult};
use crate::auth::Role;
use crate::database::models::leave_request::{LeaveRequest, LeaveStatus};
use crate::database::{audit, manager};
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    #[serde(default)]
    pub status: String,
}

/// PATCH /api/leave-requests/:id/status
///
/// pending -> approved | rejected | cancelled; terminal states are
/// immutable (409). Callers outside the record's district get 403.
pub async fn patch_status(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<StatusRequest>,
) -> ApiResult<LeaveRequest> {
    auth.require_role(Role::DistrictAdmin)?;
    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::bad_request(format!("Invalid record id: {}", id)))?;

    let target = LeaveStatus::parse(&payload.status).ok_or_else(|| {
        ApiError::bad_request(format!(
            "Unknown status: {} (expected pending, approved, rejected or cancelled)",
            payload.status
        ))
    })?;

    let pool = manager::pool().await?;
    let record: LeaveRequest = sqlx::query_as("SELECT * FROM leave_requests WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Leave request {} not found", id)))?;

    if auth.district_scoped() && record.district_id != auth.district_id {
        return Err(ApiError::forbidden("Record is outside your district"));
    }

    let current = LeaveStatus::parse(&record.status)
        .ok_or_else(|| ApiError::internal_server_error("Stored status is not recognized"))?;
    if !current.can_transition(target) {
        return Err(ApiError::conflict(format!(
            "Cannot move a {} leave request to {}",
            current.as_str(),
            target.as_str()
        )));
    }

    let updated: LeaveRequest = sqlx::query_as(
        "UPDATE leave_requests SET status = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(target.as_str())
    .fetch_one(pool)
    .await?;

    audit::record(
        &auth,
        "status_change",
        "leave-requests",
        Some(id),
        json!({ "from": current.as_str(), "to": target.as_str() }),
    )
    .await;

    Ok(ApiResponse::success(updated))
}
