// ── User profile ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use showroom_api::RawDocument;

use crate::error::CoreError;
use crate::model::collections;
use crate::model::DocumentId;

/// Authorization role. The closed two-value set is the sole authorization
/// signal in the system; anything else fails validation at the boundary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, Default,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

/// The store-side profile of an account (keyed by the auth uid).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: DocumentId,
    pub display_name: String,
    pub email: String,
    pub role: Role,
}

/// Wire form of a profile document.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileDoc {
    display_name: String,
    email: String,
    role: String,
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Validate a raw store document into a typed profile.
    pub fn from_document(doc: &RawDocument) -> Result<Self, CoreError> {
        let invalid = |reason: String| CoreError::InvalidDocument {
            collection: collections::PROFILES.into(),
            id: doc.id.clone(),
            reason,
        };

        let wire: ProfileDoc =
            serde_json::from_value(doc.data.clone()).map_err(|e| invalid(e.to_string()))?;

        let role: Role = wire
            .role
            .parse()
            .map_err(|_| invalid(format!("unknown role {:?}", wire.role)))?;

        if wire.display_name.trim().is_empty() {
            return Err(invalid("displayName is empty".into()));
        }

        Ok(Self {
            id: DocumentId::from(doc.id.clone()),
            display_name: wire.display_name,
            email: wire.email,
            role,
        })
    }

    /// Render the canonical wire body for a full-document overwrite.
    pub fn to_body(&self) -> serde_json::Value {
        serde_json::to_value(ProfileDoc {
            display_name: self.display_name.clone(),
            email: self.email.clone(),
            role: self.role.to_string(),
        })
        .expect("profile body serialization cannot fail")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(id: &str, data: serde_json::Value) -> RawDocument {
        RawDocument {
            id: id.into(),
            data,
        }
    }

    #[test]
    fn role_parses_closed_set() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn profile_from_document() {
        let doc = raw(
            "u1",
            json!({ "displayName": "Alice", "email": "alice@example.com", "role": "admin" }),
        );
        let profile = UserProfile::from_document(&doc).unwrap();
        assert!(profile.is_admin());
        assert_eq!(profile.display_name, "Alice");
    }

    #[test]
    fn profile_unknown_role_is_invalid() {
        let doc = raw(
            "u2",
            json!({ "displayName": "Eve", "email": "eve@example.com", "role": "root" }),
        );
        assert!(matches!(
            UserProfile::from_document(&doc),
            Err(CoreError::InvalidDocument { .. })
        ));
    }

    #[test]
    fn profile_body_roundtrip() {
        let doc = raw(
            "u3",
            json!({ "displayName": "Bob", "email": "bob@example.com", "role": "user" }),
        );
        let profile = UserProfile::from_document(&doc).unwrap();
        let reparsed = UserProfile::from_document(&raw("u3", profile.to_body())).unwrap();
        assert_eq!(profile, reparsed);
    }
}
