//! Key / certificate records as served by `/api/v1/keys/`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Visibility scope of a key record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            other => Err(format!("unsupported visibility '{other}'")),
        }
    }
}

/// Key family. The backend distinguishes several x509 roles (`x509ca`,
/// `x509ica`, `x509ee`) which all belong to the `X509` family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    Pgp,
    X509,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Pgp => "pgp",
            KeyType::X509 => "x509",
        }
    }

    /// Family of a backend key type string, `None` when unrecognised.
    pub fn family_of(raw: &str) -> Option<KeyType> {
        match raw {
            "pgp" => Some(KeyType::Pgp),
            "x509" | "x509ca" | "x509ica" | "x509ee" => Some(KeyType::X509),
            _ => None,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyType::family_of(s).ok_or_else(|| format!("unsupported key type '{s}'"))
    }
}

/// Lifecycle state of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyState {
    Enabled,
    Disabled,
    PendingDelete,
    PendingRevoke,
    Revoked,
    Deleted,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for KeyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KeyState::Enabled => "enabled",
            KeyState::Disabled => "disabled",
            KeyState::PendingDelete => "pending_delete",
            KeyState::PendingRevoke => "pending_revoke",
            KeyState::Revoked => "revoked",
            KeyState::Deleted => "deleted",
            KeyState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A key record. Server-owned; the console only displays it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataKey {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub visibility: Visibility,
    #[serde(default)]
    pub user: i32,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    pub key_type: String,
    #[serde(default)]
    pub parent_id: Option<i32>,
    #[serde(default)]
    pub fingerprint: String,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub create_at: String,
    #[serde(default)]
    pub expire_at: String,
    pub key_state: KeyState,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub request_delete_users: Option<String>,
    #[serde(default)]
    pub request_revoke_users: Option<String>,
}

impl DataKey {
    pub fn family(&self) -> Option<KeyType> {
        KeyType::family_of(&self.key_type)
    }
}

/// Paging metadata attached to list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PagedMeta {
    pub total_count: u64,
}

/// One page of keys.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PagedKeys {
    pub data: Vec<DataKey>,
    #[serde(default)]
    pub meta: PagedMeta,
}

/// Which field a free-text search is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    #[default]
    Name,
    Description,
}

impl FromStr for SearchField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SearchField::Name),
            "description" => Ok(SearchField::Description),
            other => Err(format!("unsupported search field '{other}'")),
        }
    }
}

/// Query parameters of `GET /api/v1/keys/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyListQuery {
    pub visibility: Visibility,
    pub page_size: u64,
    pub page_number: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_type: Option<String>,
}

impl KeyListQuery {
    /// Query for one page of a scope, without any search filter.
    pub fn page(visibility: Visibility, page_size: u64, page_number: u64) -> Self {
        Self {
            visibility,
            page_size,
            page_number,
            name: None,
            description: None,
            key_type: None,
        }
    }

    /// Adds a search filter on `field`. Blank text leaves the query unchanged.
    pub fn with_search(mut self, field: SearchField, text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return self;
        }
        match field {
            SearchField::Name => self.name = Some(text.to_string()),
            SearchField::Description => self.description = Some(text.to_string()),
        }
        self
    }

    /// Flattened `(key, value)` pairs in wire order.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("visibility".to_string(), self.visibility.to_string()),
            ("page_size".to_string(), self.page_size.to_string()),
            ("page_number".to_string(), self.page_number.to_string()),
        ];
        if let Some(name) = &self.name {
            pairs.push(("name".to_string(), name.clone()));
        }
        if let Some(description) = &self.description {
            pairs.push(("description".to_string(), description.clone()));
        }
        if let Some(key_type) = &self.key_type {
            pairs.push(("key_type".to_string(), key_type.clone()));
        }
        pairs
    }
}

/// Body of `POST /api/v1/keys/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateKey {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    pub attributes: BTreeMap<String, String>,
    pub key_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i32>,
    /// UTC expiry, e.g. `2024-04-08 13:36:35.328324 UTC`.
    pub expire_at: String,
}

/// Body of `POST /api/v1/keys/import`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportKey {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    pub attributes: BTreeMap<String, String>,
    pub key_type: String,
    pub private_key: String,
    pub public_key: String,
    pub certificate: String,
}

/// Key material returned by `POST /api/v1/keys/{id}/export`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExportedKey {
    #[serde(default)]
    pub private_key: String,
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub certificate: String,
}

/// Per-id lifecycle actions on `/api/v1/keys/{id}/{action}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Enable,
    Disable,
    Export,
    RequestDelete,
    CancelDelete,
}

impl KeyAction {
    pub fn path_segment(&self) -> &'static str {
        match self {
            KeyAction::Enable => "enable",
            KeyAction::Disable => "disable",
            KeyAction::Export => "export",
            KeyAction::RequestDelete => "request_delete",
            KeyAction::CancelDelete => "cancel_delete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_family_groups_x509_roles() {
        assert_eq!(KeyType::family_of("pgp"), Some(KeyType::Pgp));
        for raw in ["x509", "x509ca", "x509ica", "x509ee"] {
            assert_eq!(KeyType::family_of(raw), Some(KeyType::X509), "{raw}");
        }
        assert_eq!(KeyType::family_of("rsa"), None);
    }

    #[test]
    fn unknown_key_state_is_tolerated() {
        let state: KeyState = serde_json::from_str("\"frozen\"").unwrap();
        assert_eq!(state, KeyState::Unknown);
        let state: KeyState = serde_json::from_str("\"pending_delete\"").unwrap();
        assert_eq!(state, KeyState::PendingDelete);
    }

    #[test]
    fn query_without_search_has_only_scope_and_paging() {
        let q = KeyListQuery::page(Visibility::Public, 10, 1);
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"visibility": "public", "page_size": 10, "page_number": 1})
        );
    }

    #[test]
    fn blank_search_text_is_ignored() {
        let q = KeyListQuery::page(Visibility::Private, 20, 3).with_search(SearchField::Name, "   ");
        assert_eq!(q, KeyListQuery::page(Visibility::Private, 20, 3));
    }

    #[test]
    fn description_search_omits_name() {
        let q = KeyListQuery::page(Visibility::Public, 10, 1)
            .with_search(SearchField::Description, "release");
        let pairs = q.to_pairs();
        assert!(pairs.contains(&("description".to_string(), "release".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "name"));
    }

    #[test]
    fn paged_keys_parse_backend_shape() {
        let body = serde_json::json!({
            "data": [{
                "id": 7,
                "name": "openEuler-pgp",
                "description": "release signing",
                "visibility": "public",
                "user": 1,
                "attributes": {"digest_algorithm": "sha2_256"},
                "key_type": "pgp",
                "parent_id": null,
                "fingerprint": "ABCD",
                "serial_number": null,
                "create_at": "2023-04-08 13:36:35.328324 UTC",
                "expire_at": "2025-04-08 13:36:35.328324 UTC",
                "key_state": "enabled",
                "user_email": "admin@example.com",
                "request_delete_users": null,
                "request_revoke_users": null
            }],
            "meta": {"total_count": 1}
        });
        let page: PagedKeys = serde_json::from_value(body).unwrap();
        assert_eq!(page.meta.total_count, 1);
        assert_eq!(page.data[0].family(), Some(KeyType::Pgp));
        assert_eq!(page.data[0].key_state, KeyState::Enabled);
    }
}
