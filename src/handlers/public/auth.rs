//! Public authentication endpoints: credential login and token refresh.

use std::collections::BTreeMap;

use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::response::{ApiResponse, ApiResult};
use crate::auth::{self, dev_users, Claims};
use crate::config;
use crate::database::manager;
use crate::database::models::user::User;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub token: String,
}

/// POST /api/auth/login - authenticate and receive a JWT
///
/// Expected input:
/// ```json
/// { "email": "admin@example.org", "password": "..." }
/// ```
///
/// Successful output:
/// ```json
/// {
///   "success": true,
///   "data": {
///     "token": "eyJhbGciOiJIUzI1NiI...",
///     "user": { "id": "...", "email": "...", "role": "district_admin", ... },
///     "expires_in": 14400
///   }
/// }
/// ```
pub async fn login(Json(payload): Json<LoginRequest>) -> ApiResult<Value> {
    let mut errors = BTreeMap::new();
    if payload.email.trim().is_empty() {
        errors.insert("email".to_string(), "this field is required".to_string());
    }
    if payload.password.is_empty() {
        errors.insert("password".to_string(), "this field is required".to_string());
    }
    if !errors.is_empty() {
        return Err(ApiError::validation_error("Validation failed", Some(errors)));
    }

    // Development stand-in accounts, checked before the database
    if config::config().security.enable_dev_login {
        if let Some(dev) = dev_users::authenticate(&payload.email, &payload.password) {
            let claims = Claims::new(
                dev.id,
                dev.email.to_string(),
                dev.role,
                dev.district_id,
                dev.agency_id,
            );
            return Ok(ApiResponse::success(token_response(
                claims,
                json!({
                    "id": dev.id,
                    "email": dev.email,
                    "full_name": dev.full_name,
                    "role": dev.role,
                    "district_id": dev.district_id,
                    "agency_id": dev.agency_id,
                }),
            )?));
        }
    }

    let pool = manager::pool().await?;
    let user: User = sqlx::query_as(
        "SELECT * FROM users WHERE email = $1 AND is_active = TRUE",
    )
    .bind(payload.email.trim())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    let verified = bcrypt::verify(&payload.password, &user.password_hash).unwrap_or(false);
    if !verified {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let claims = Claims::new(
        user.id,
        user.email.clone(),
        user.role(),
        user.district_id,
        user.agency_id,
    );
    let info = serde_json::to_value(user.to_info())
        .map_err(|e| ApiError::internal_server_error(e.to_string()))?;
    Ok(ApiResponse::success(token_response(claims, info)?))
}

/// POST /api/auth/refresh - exchange a (possibly expired) token for a new one
///
/// The signature must verify and the token must still be inside the
/// configured refresh window; claims carry over unchanged.
pub async fn refresh(Json(payload): Json<RefreshRequest>) -> ApiResult<Value> {
    if payload.token.trim().is_empty() {
        let mut errors = BTreeMap::new();
        errors.insert("token".to_string(), "this field is required".to_string());
        return Err(ApiError::validation_error("Validation failed", Some(errors)));
    }

    let claims = auth::decode_for_refresh(payload.token.trim())?.renewed();
    let token = auth::issue_token(&claims)?;
    let expires_in = claims.exp - claims.iat;

    Ok(ApiResponse::success(json!({
        "token": token,
        "expires_in": expires_in,
    })))
}

fn token_response(claims: Claims, user: Value) -> Result<Value, ApiError> {
    let token = auth::issue_token(&claims)?;
    Ok(json!({
        "token": token,
        "user": user,
        "expires_in": claims.exp - claims.iat,
    }))
}
