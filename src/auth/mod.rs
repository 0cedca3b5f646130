pub mod dev_users;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;
use crate::error::ApiError;

pub const TOKEN_ISSUER: &str = "churchflow-api";

/// Role lattice, weakest first. Ordering is meaningful: `role >= min_role`
/// is the authorization check used throughout the handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Staff,
    AgencyAdmin,
    DistrictAdmin,
    Superadmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Staff => "staff",
            Role::AgencyAdmin => "agency_admin",
            Role::DistrictAdmin => "district_admin",
            Role::Superadmin => "superadmin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "staff" => Some(Role::Staff),
            "agency_admin" => Some(Role::AgencyAdmin),
            "district_admin" => Some(Role::DistrictAdmin),
            "superadmin" => Some(Role::Superadmin),
            _ => None,
        }
    }

    pub const ALL: &'static [&'static str] =
        &["staff", "agency_admin", "district_admin", "superadmin"];
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub district_id: Option<Uuid>,
    pub agency_id: Option<Uuid>,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

impl Claims {
    pub fn new(
        sub: Uuid,
        email: String,
        role: Role,
        district_id: Option<Uuid>,
        agency_id: Option<Uuid>,
    ) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub,
            email,
            role,
            district_id,
            agency_id,
            exp,
            iat: now.timestamp(),
            iss: TOKEN_ISSUER.to_string(),
        }
    }

    /// Re-stamp iat/exp on an existing claim set (token refresh).
    pub fn renewed(mut self) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        self.iat = now.timestamp();
        self.exp = (now + Duration::hours(expiry_hours as i64)).timestamp();
        self
    }
}

fn secret() -> Result<&'static str, ApiError> {
    let secret = config::config().security.jwt_secret.as_str();
    if secret.is_empty() {
        tracing::error!("JWT secret not configured (set JWT_SECRET)");
        return Err(ApiError::internal_server_error("Authentication is not configured"));
    }
    Ok(secret)
}

pub fn issue_token(claims: &Claims) -> Result<String, ApiError> {
    let encoding_key = EncodingKey::from_secret(secret()?.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| {
        tracing::error!("JWT generation error: {}", e);
        ApiError::internal_server_error("Failed to issue token")
    })
}

pub fn decode_token(token: &str) -> Result<Claims, ApiError> {
    let decoding_key = DecodingKey::from_secret(secret()?.as_bytes());
    let mut validation = Validation::default();
    validation.set_issuer(&[TOKEN_ISSUER]);

    let token_data = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))?;
    Ok(token_data.claims)
}

/// Decode a token for refresh: the signature must verify, expiry may have
/// passed but only within the configured refresh window.
pub fn decode_for_refresh(token: &str) -> Result<Claims, ApiError> {
    let decoding_key = DecodingKey::from_secret(secret()?.as_bytes());
    let mut validation = Validation::default();
    validation.set_issuer(&[TOKEN_ISSUER]);
    validation.validate_exp = false;

    let token_data = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))?;

    let claims = token_data.claims;
    let window = Duration::hours(config::config().security.refresh_window_hours as i64);
    let cutoff = claims.exp + window.num_seconds();
    if Utc::now().timestamp() > cutoff {
        return Err(ApiError::unauthorized("Token is past the refresh window"));
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ordering_matches_privilege() {
        assert!(Role::Superadmin > Role::DistrictAdmin);
        assert!(Role::DistrictAdmin > Role::AgencyAdmin);
        assert!(Role::AgencyAdmin > Role::Staff);
    }

    #[test]
    fn role_parse_round_trips() {
        for name in Role::ALL {
            let role = Role::parse(name).unwrap();
            assert_eq!(role.as_str(), *name);
        }
        assert!(Role::parse("deacon").is_none());
    }

    #[test]
    fn token_round_trips() {
        // Development preset provides a usable secret
        let claims = Claims::new(
            Uuid::new_v4(),
            "admin@churchflow.local".to_string(),
            Role::Superadmin,
            None,
            None,
        );
        let token = issue_token(&claims).unwrap();
        let decoded = decode_token(&token).unwrap();
        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.role, Role::Superadmin);
        assert_eq!(decoded.iss, TOKEN_ISSUER);
    }

    #[test]
    fn refresh_renews_expiry() {
        let claims = Claims::new(
            Uuid::new_v4(),
            "staff@churchflow.local".to_string(),
            Role::Staff,
            None,
            None,
        );
        let token = issue_token(&claims).unwrap();
        let renewed = decode_for_refresh(&token).unwrap().renewed();
        assert!(renewed.exp >= claims.exp);
        assert_eq!(renewed.sub, claims.sub);
    }
}
