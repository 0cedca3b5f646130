use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::Role;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: String,
    pub district_id: Option<Uuid>,
    pub agency_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-facing projection of a user row. The password hash never leaves
/// the database layer.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub district_id: Option<Uuid>,
    pub agency_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Stored role column, defaulting to the weakest role on unknown values.
    pub fn role(&self) -> Role {
        Role::parse(&self.role).unwrap_or(Role::Staff)
    }

    pub fn to_info(&self) -> UserInfo {
        UserInfo {
            id: self.id,
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            role: self.role(),
            district_id: self.district_id,
            agency_id: self.agency_id,
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: "p@churchflow.app".to_string(),
            password_hash: "$2b$12$hash".to_string(),
            full_name: "Pat".to_string(),
            role: role.to_string(),
            district_id: None,
            agency_id: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn unknown_role_degrades_to_staff() {
        assert_eq!(user("bishop").role(), Role::Staff);
        assert_eq!(user("district_admin").role(), Role::DistrictAdmin);
    }

    #[test]
    fn info_projection_has_no_hash() {
        let info = user("staff").to_info();
        let json = serde_json::to_value(&info).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "staff");
    }
}
