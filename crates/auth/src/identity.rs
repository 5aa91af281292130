//! Authenticated identity as the backend reports it.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a user account.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for UserId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for UserId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// Role granted to a user.
///
/// Roles are opaque strings at this layer; mapping them to capabilities is
/// the backend's business.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Profile of the authenticated user.
///
/// Wire form is camelCase, matching the backend's `user` object. Audit
/// timestamps are optional because older backend versions omit them.
///
/// # Invariants
/// - Present in the token store iff a valid [`CredentialPair`] is present;
///   the two are committed and cleared together.
///
/// [`CredentialPair`]: crate::CredentialPair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

// Backends predating account deactivation omit the flag entirely.
fn active_by_default() -> bool {
    true
}

impl Identity {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.as_str() == role)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend_user_json() -> &'static str {
        r#"{
            "id": "018f2a3e-5f6a-7c4d-9b1e-0123456789ab",
            "username": "testuser",
            "email": "test@example.com",
            "firstName": "Test",
            "lastName": "User",
            "roles": ["USER"],
            "isActive": true,
            "createdAt": "2026-01-15T09:30:00Z"
        }"#
    }

    #[test]
    fn parses_backend_user_object() {
        let identity: Identity = serde_json::from_str(backend_user_json()).unwrap();
        assert_eq!(identity.username, "testuser");
        assert_eq!(identity.full_name(), "Test User");
        assert!(identity.is_active);
        assert!(identity.has_role("USER"));
        assert!(!identity.has_role("ADMIN"));
        assert!(identity.created_at.is_some());
        assert!(identity.updated_at.is_none());
    }

    #[test]
    fn missing_activity_flag_means_active() {
        let identity: Identity = serde_json::from_str(
            r#"{
                "id": "018f2a3e-5f6a-7c4d-9b1e-0123456789ab",
                "username": "legacy",
                "email": "legacy@example.com",
                "firstName": "Legacy",
                "lastName": "Account"
            }"#,
        )
        .unwrap();
        assert!(identity.is_active);
        assert!(identity.roles.is_empty());
    }

    #[test]
    fn serializes_camel_case() {
        let identity: Identity = serde_json::from_str(backend_user_json()).unwrap();
        let value = serde_json::to_value(&identity).unwrap();
        assert!(value.get("firstName").is_some());
        assert!(value.get("isActive").is_some());
        assert!(value.get("first_name").is_none());
    }
}
