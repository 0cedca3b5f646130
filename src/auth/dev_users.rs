//! Hard-coded development user list, consulted at login before the
//! database when `security.enable_dev_login` is set. A stand-in for real
//! accounts while an environment has no seeded users; never active in
//! staging or production presets.

use uuid::Uuid;

use super::Role;

pub struct DevUser {
    pub id: Uuid,
    pub email: &'static str,
    pub password: &'static str,
    pub full_name: &'static str,
    pub role: Role,
    pub district_id: Option<Uuid>,
    pub agency_id: Option<Uuid>,
}

pub const DEV_DISTRICT_ID: Uuid = Uuid::from_u128(0x0d15_71c7_0000_0000_0000_0000_0000_0001_u128);
pub const DEV_AGENCY_ID: Uuid = Uuid::from_u128(0xa9e0_0000_0000_0000_0000_0000_0000_0001_u128);

pub static DEV_USERS: &[DevUser] = &[
    DevUser {
        id: Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_1001_u128),
        email: "admin@churchflow.local",
        password: "churchflow-dev",
        full_name: "Dev Superadmin",
        role: Role::Superadmin,
        district_id: None,
        agency_id: None,
    },
    DevUser {
        id: Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_1002_u128),
        email: "district.admin@churchflow.local",
        password: "churchflow-dev",
        full_name: "Dev District Admin",
        role: Role::DistrictAdmin,
        district_id: Some(DEV_DISTRICT_ID),
        agency_id: None,
    },
    DevUser {
        id: Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_1003_u128),
        email: "agency.admin@churchflow.local",
        password: "churchflow-dev",
        full_name: "Dev Agency Admin",
        role: Role::AgencyAdmin,
        district_id: Some(DEV_DISTRICT_ID),
        agency_id: Some(DEV_AGENCY_ID),
    },
    DevUser {
        id: Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_1004_u128),
        email: "staff@churchflow.local",
        password: "churchflow-dev",
        full_name: "Dev Staff",
        role: Role::Staff,
        district_id: Some(DEV_DISTRICT_ID),
        agency_id: Some(DEV_AGENCY_ID),
    },
];

/// Plain string comparison; these are fixed development credentials, not
/// real accounts.
pub fn authenticate(email: &str, password: &str) -> Option<&'static DevUser> {
    DEV_USERS
        .iter()
        .find(|u| u.email == email && u.password == password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_dev_user_authenticates() {
        let user = authenticate("admin@churchflow.local", "churchflow-dev").unwrap();
        assert_eq!(user.role, Role::Superadmin);
        assert!(user.district_id.is_none());
    }

    #[test]
    fn wrong_password_is_rejected() {
        assert!(authenticate("admin@churchflow.local", "nope").is_none());
        assert!(authenticate("unknown@churchflow.local", "churchflow-dev").is_none());
    }

    #[test]
    fn scoped_dev_users_share_the_dev_district() {
        let district = authenticate("district.admin@churchflow.local", "churchflow-dev").unwrap();
        let agency = authenticate("agency.admin@churchflow.local", "churchflow-dev").unwrap();
        assert_eq!(district.district_id, agency.district_id);
        assert!(agency.agency_id.is_some());
    }
}
