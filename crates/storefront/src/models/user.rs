//! User profile records (`users` collection).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use devgon_core::{Email, UserId, UserRole, timestamp};

/// The persisted profile, keyed by the identity id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub name: String,
    pub email: Email,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub suspended: bool,
    #[serde(
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

/// Persisted field names, for partial updates.
pub mod fields {
    pub const NAME: &str = "name";
    pub const PHONE: &str = "phone";
    pub const ADDRESS: &str = "address";
    pub const ROLE: &str = "role";
    pub const SUSPENDED: &str = "suspended";
}

/// A stored user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    #[serde(flatten)]
    pub profile: UserProfile,
}

impl User {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.profile.role.is_admin()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_minimal_profile() {
        let profile: UserProfile =
            serde_json::from_value(serde_json::json!({"email": "old@devgon.in"})).unwrap();
        assert_eq!(profile.role, UserRole::User);
        assert!(!profile.suspended);
        assert!(profile.created_at.is_none());
    }

    #[test]
    fn test_persisted_names() {
        let profile = UserProfile {
            name: "Asha".to_owned(),
            email: Email::parse("asha@devgon.in").unwrap(),
            phone: "9876543210".to_owned(),
            address: "Pune".to_owned(),
            role: UserRole::Admin,
            suspended: false,
            created_at: None,
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["role"], "admin");
        assert_eq!(json["suspended"], false);
        assert_eq!(json["phone"], "9876543210");
        assert!(json.get("createdAt").is_none());
    }
}
