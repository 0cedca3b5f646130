//! File uploads: decode the payload, push it to the object store, return
//! the resulting URL. The store itself is a pass-through vendor call.

use std::collections::BTreeMap;

use axum::{extract::Extension, Json};
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::response::{ApiResponse, ApiResult};
use crate::auth::Role;
use crate::database::audit;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::services::storage::{sanitize_filename, STORAGE};

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    #[serde(default)]
    pub filename: String,
    pub content_type: Option<String>,
    /// Base64-encoded file content
    #[serde(default)]
    pub data: String,
}

/// POST /api/files
pub async fn upload(
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UploadRequest>,
) -> ApiResult<Value> {
    auth.require_role(Role::AgencyAdmin)?;

    let mut errors = BTreeMap::new();
    if payload.filename.trim().is_empty() {
        errors.insert("filename".to_string(), "this field is required".to_string());
    }
    if payload.data.is_empty() {
        errors.insert("data".to_string(), "this field is required".to_string());
    }
    if !errors.is_empty() {
        return Err(ApiError::validation_error("Validation failed", Some(errors)));
    }

    let bytes = general_purpose::STANDARD
        .decode(payload.data.as_bytes())
        .map_err(|_| {
            let mut errors = BTreeMap::new();
            errors.insert("data".to_string(), "must be valid base64".to_string());
            ApiError::validation_error("Validation failed", Some(errors))
        })?;

    let max = crate::config::config().storage.max_upload_bytes;
    if bytes.len() > max {
        return Err(ApiError::bad_request(format!(
            "File exceeds the maximum upload size of {} bytes",
            max
        )));
    }

    let storage = STORAGE
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("File storage is not configured"))?;

    let key = format!("{}/{}", Uuid::new_v4(), sanitize_filename(&payload.filename));
    let content_type = payload
        .content_type
        .as_deref()
        .unwrap_or("application/octet-stream");

    let size = bytes.len();
    let url = storage.put(&key, content_type, bytes).await.map_err(|e| {
        tracing::warn!("file upload failed: {:#}", e);
        ApiError::bad_gateway("File storage upload failed")
    })?;

    audit::record(
        &auth,
        "upload",
        "files",
        None,
        json!({ "key": key, "size": size }),
    )
    .await;

    Ok(ApiResponse::created(json!({
        "key": key,
        "url": url,
        "size": size,
    })))
}
