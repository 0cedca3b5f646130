use axum::extract::Extension;
use serde_json::{json, Value};

use crate::api::response::{ApiResponse, ApiResult};
use crate::middleware::auth::AuthUser;

/// GET /api/auth/whoami - identity and claims of the calling token
pub async fn whoami(Extension(auth): Extension<AuthUser>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "id": auth.id,
        "email": auth.email,
        "role": auth.role,
        "district_id": auth.district_id,
        "agency_id": auth.agency_id,
    })))
}
