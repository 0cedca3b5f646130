//! User administration. Served by dedicated handlers rather than the
//! generic data plane: passwords are hashed on the way in and the hash
//! column never appears in a response.

use std::collections::{BTreeMap, HashMap};

use axum::{
    extract::{Extension, Path, Query},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::api::response::{ApiResponse, ApiResult};
use crate::api::validate::{validate_payload, FieldKind, FieldRule};
use crate::auth::Role;
use crate::database::models::user::{User, UserInfo};
use crate::database::{audit, manager, query};
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;

const USER_FIELDS: &[FieldRule] = &[
    FieldRule::required("email", FieldKind::Text).max_len(200),
    FieldRule::required("password", FieldKind::Text).max_len(128),
    FieldRule::required("full_name", FieldKind::Text).max_len(200),
    FieldRule::required("role", FieldKind::Text).one_of(Role::ALL),
    FieldRule::optional("district_id", FieldKind::Uuid),
    FieldRule::optional("agency_id", FieldKind::Uuid),
    FieldRule::optional("is_active", FieldKind::Bool),
];

const MIN_PASSWORD_LEN: usize = 8;

fn check_password_strength(payload: &Map<String, Value>) -> Result<(), ApiError> {
    if let Some(password) = payload.get("password").and_then(Value::as_str) {
        if password.chars().count() < MIN_PASSWORD_LEN {
            let mut errors = BTreeMap::new();
            errors.insert(
                "password".to_string(),
                format!("must be at least {} characters", MIN_PASSWORD_LEN),
            );
            return Err(ApiError::validation_error("Validation failed", Some(errors)));
        }
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| {
        tracing::error!("Password hashing failed: {}", e);
        ApiError::internal_server_error("Failed to process password")
    })
}

fn parse_user_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::bad_request(format!("Invalid user id: {}", id)))
}

/// GET /api/users - list users, newest first
pub async fn list(
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    auth.require_role(Role::Superadmin)?;

    let api = &crate::config::config().api;
    let limit = params
        .get("limit")
        .map(|v| v.parse::<i64>().map_err(|_| ApiError::bad_request("Invalid limit")))
        .transpose()?
        .unwrap_or(api.default_page_size)
        .clamp(1, api.max_page_size);
    let offset = params
        .get("offset")
        .map(|v| v.parse::<i64>().map_err(|_| ApiError::bad_request("Invalid offset")))
        .transpose()?
        .unwrap_or(0)
        .max(0);

    let pool = manager::pool().await?;
    let users: Vec<User> =
        sqlx::query_as("SELECT * FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    let infos: Vec<UserInfo> = users.iter().map(User::to_info).collect();
    Ok(ApiResponse::success(infos)
        .with_meta(json!({ "total": total, "limit": limit, "offset": offset }))
        .into_response())
}

/// POST /api/users - create a user with a bcrypt-hashed password
pub async fn create(
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<Value>,
) -> ApiResult<UserInfo> {
    auth.require_role(Role::Superadmin)?;

    let Value::Object(payload) = payload else {
        return Err(ApiError::bad_request("Request body must be a JSON object"));
    };
    validate_payload(USER_FIELDS, &payload, false)?;
    check_password_strength(&payload)?;

    let email = payload["email"].as_str().unwrap_or_default().trim().to_lowercase();
    let password_hash = hash_password(payload["password"].as_str().unwrap_or_default())?;

    let pool = manager::pool().await?;
    let user: User = sqlx::query_as(
        "INSERT INTO users (email, password_hash, full_name, role, district_id, agency_id, is_active) \
         VALUES ($1, $2, $3, $4, $5::uuid, $6::uuid, COALESCE($7, TRUE)) RETURNING *",
    )
    .bind(&email)
    .bind(&password_hash)
    .bind(payload["full_name"].as_str().unwrap_or_default())
    .bind(payload["role"].as_str().unwrap_or_default())
    .bind(payload.get("district_id").and_then(Value::as_str))
    .bind(payload.get("agency_id").and_then(Value::as_str))
    .bind(payload.get("is_active").and_then(Value::as_bool))
    .fetch_one(pool)
    .await?;

    audit::record(&auth, "create", "users", Some(user.id), json!({ "email": email })).await;

    Ok(ApiResponse::created(user.to_info()))
}

/// GET /api/users/:id
pub async fn get(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<UserInfo> {
    auth.require_role(Role::Superadmin)?;
    let id = parse_user_id(&id)?;

    let pool = manager::pool().await?;
    let user: User = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User {} not found", id)))?;

    Ok(ApiResponse::success(user.to_info()))
}

/// PATCH /api/users/:id - update profile fields, role, scope or password
pub async fn patch(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> ApiResult<UserInfo> {
    auth.require_role(Role::Superadmin)?;
    let id = parse_user_id(&id)?;

    let Value::Object(payload) = payload else {
        return Err(ApiError::bad_request("Request body must be a JSON object"));
    };
    if payload.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }
    validate_payload(USER_FIELDS, &payload, true)?;
    check_password_strength(&payload)?;

    let mut ws = query::WriteSet::default();
    for rule in USER_FIELDS {
        let Some(value) = payload.get(rule.name) else {
            continue;
        };
        match rule.name {
            "password" => {
                let hash = hash_password(value.as_str().unwrap_or_default())?;
                ws.push("password_hash", "", json!(hash));
            }
            "email" => {
                let email = value.as_str().unwrap_or_default().trim().to_lowercase();
                ws.push("email", "", json!(email));
            }
            _ => ws.push(rule.name, rule.kind.cast(), value.clone()),
        }
    }

    let assignments: Vec<String> = ws
        .columns
        .iter()
        .zip(ws.casts.iter())
        .enumerate()
        .map(|(i, (col, cast))| format!("\"{}\" = ${}{}", col, i + 2, cast))
        .collect();
    let sql = format!(
        "UPDATE users SET {}, updated_at = now() WHERE id = $1 RETURNING *",
        assignments.join(", ")
    );

    let pool = manager::pool().await?;
    let mut q = sqlx::query_as::<_, User>(&sql).bind(id);
    for value in &ws.values {
        q = query::bind_value_as(q, value);
    }
    let user = q
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User {} not found", id)))?;

    audit::record(&auth, "update", "users", Some(id), json!({ "fields": ws.columns })).await;

    Ok(ApiResponse::success(user.to_info()))
}

/// DELETE /api/users/:id
pub async fn delete(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    auth.require_role(Role::Superadmin)?;
    let id = parse_user_id(&id)?;

    if id == auth.id {
        return Err(ApiError::conflict("You cannot delete your own account"));
    }

    let pool = manager::pool().await?;
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found(format!("User {} not found", id)));
    }

    audit::record(&auth, "delete", "users", Some(id), Value::Null).await;

    Ok(ApiResponse::<()>::no_content())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_password_is_rejected() {
        let payload = json!({ "password": "short" }).as_object().unwrap().clone();
        let err = check_password_strength(&payload).unwrap_err();
        let body = err.to_json();
        assert!(body["error"]["field_errors"]["password"]
            .as_str()
            .unwrap()
            .contains("at least 8"));
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(bcrypt::verify("correct horse battery", &hash).unwrap());
        assert!(!bcrypt::verify("wrong", &hash).unwrap());
    }

    #[test]
    fn user_rules_reject_unknown_role() {
        let payload = json!({
            "email": "a@b.c",
            "password": "longenough",
            "full_name": "A",
            "role": "pope",
        })
        .as_object()
        .unwrap()
        .clone();
        assert!(validate_payload(USER_FIELDS, &payload, false).is_err());
    }
}
