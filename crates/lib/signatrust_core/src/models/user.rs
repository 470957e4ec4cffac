//! User and API-token models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Logged-in user as reported by the users endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: i32,
    pub email: String,
}

/// Result of exchanging an authorization code.
///
/// The certification console answers with JSON carrying the token under
/// `token` (or `csrf_token`). The key-management backend answers with a
/// redirect and sets its session cookie instead; those cookies land in
/// `cookies` and the token stays empty until an `Xsrf-Token` cookie arrives.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenGrant {
    #[serde(alias = "csrf_token", default)]
    pub token: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cookies: BTreeMap<String, String>,
}

impl TokenGrant {
    /// Whether the grant carries any credential at all.
    pub fn is_empty(&self) -> bool {
        self.token.is_empty() && self.cookies.is_empty()
    }
}

/// API token record (only the hash is returned when listing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiToken {
    pub id: i32,
    #[serde(default)]
    pub user_id: i32,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub create_at: String,
    #[serde(default)]
    pub expire_at: String,
}

/// Body of `POST /api/v1/users/api_keys`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateApiToken {
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_accepts_csrf_token_alias() {
        let grant: TokenGrant = serde_json::from_value(serde_json::json!({
            "email": "ops@example.com",
            "id": 3,
            "csrf_token": "abc"
        }))
        .unwrap();
        assert_eq!(grant.token, "abc");
        assert_eq!(grant.id, Some(3));
        assert!(grant.cookies.is_empty());
        assert!(!grant.is_empty());
    }

    #[test]
    fn grant_without_token_is_empty() {
        let grant: TokenGrant = serde_json::from_value(serde_json::json!({"id": 3})).unwrap();
        assert!(grant.is_empty());
    }

    #[test]
    fn api_token_tolerates_missing_fields() {
        let token: ApiToken =
            serde_json::from_value(serde_json::json!({"id": 1, "description": "ci"})).unwrap();
        assert_eq!(token.description, "ci");
        assert!(token.token.is_empty());
    }
}
