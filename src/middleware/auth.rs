use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::auth::{self, Claims, Role};
use crate::error::ApiError;

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub district_id: Option<Uuid>,
    pub agency_id: Option<Uuid>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
            district_id: claims.district_id,
            agency_id: claims.agency_id,
        }
    }
}

impl AuthUser {
    /// Role gate used by every protected operation.
    pub fn require_role(&self, min: Role) -> Result<(), ApiError> {
        if self.role >= min {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "This operation requires the {} role",
                min
            )))
        }
    }

    /// Whether this user is restricted to rows inside their district.
    pub fn district_scoped(&self) -> bool {
        self.role < Role::Superadmin && self.district_id.is_some()
    }

    /// Whether this user is additionally restricted to rows inside their agency.
    pub fn agency_scoped(&self) -> bool {
        self.role < Role::DistrictAdmin && self.agency_id.is_some()
    }
}

/// JWT authentication middleware that validates tokens and injects the
/// user context as a request extension.
pub async fn jwt_auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_bearer_token(&headers)
        .map_err(|msg| ApiError::unauthorized(msg).into_response())?;

    let claims = auth::decode_token(&token).map_err(|e| e.into_response())?;

    let auth_user = AuthUser::from(claims);
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Extract the bearer token from the Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .or_else(|| headers.get("Authorization"))
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty bearer token".to_string());
        }
        Ok(token.to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            email: "t@churchflow.local".to_string(),
            role,
            district_id: Some(Uuid::new_v4()),
            agency_id: None,
        }
    }

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc.def.ghi");

        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert!(extract_bearer_token(&headers).is_err());

        headers.remove("authorization");
        assert!(extract_bearer_token(&headers).is_err());
    }

    #[test]
    fn role_gate() {
        assert!(user(Role::DistrictAdmin).require_role(Role::DistrictAdmin).is_ok());
        assert!(user(Role::Superadmin).require_role(Role::Staff).is_ok());
        assert!(user(Role::Staff).require_role(Role::DistrictAdmin).is_err());
    }

    #[test]
    fn scoping_flags() {
        let mut u = user(Role::DistrictAdmin);
        assert!(u.district_scoped());
        assert!(!u.agency_scoped());

        u.role = Role::Superadmin;
        assert!(!u.district_scoped());

        u.role = Role::AgencyAdmin;
        u.agency_id = Some(Uuid::new_v4());
        assert!(u.agency_scoped());
    }
}
