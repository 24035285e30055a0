//! Shared data types for the vault export.
//!
//! Field names follow the camelCase keys of the JSON export so the same types
//! serve both as the in-memory model and the wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Root of an exported vault: folders plus records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vault {
    #[serde(default)]
    pub encrypted: bool,
    /// Organisation collections, carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collections: Option<Vec<Collection>>,
    #[serde(default, deserialize_with = "skip_nulls")]
    pub folders: Vec<Folder>,
    /// Vault entries. The export calls them `items`.
    #[serde(rename = "items", default, deserialize_with = "skip_nulls")]
    pub records: Vec<Record>,
}

/// Represents a folder in the vault.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl Folder {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: Some(name.into()),
        }
    }
}

/// An organisation collection descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: Option<String>,
    pub organization_id: Option<String>,
    pub name: Option<String>,
    pub external_id: Option<String>,
}

/// Represents a vault entry: login, card, identity or secure note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: Option<String>,
    pub organization_id: Option<String>,
    /// Weak reference to [`Folder::id`].
    pub folder_id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: i32,
    #[serde(default)]
    pub reprompt: i32,
    pub name: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub login: Option<LoginBlock>,
    #[serde(default, deserialize_with = "skip_nulls")]
    pub fields: Vec<CustomField>,
    /// `None` means the key was absent; merges never produce `Some(vec![])`.
    #[serde(default, deserialize_with = "skip_nulls_opt")]
    pub collection_ids: Option<Vec<String>>,
    #[serde(default, deserialize_with = "skip_nulls_opt")]
    pub password_history: Option<Vec<HistoryEntry>>,
    pub revision_date: Option<DateTime<Utc>>,
    pub creation_date: Option<DateTime<Utc>>,
    pub deleted_date: Option<DateTime<Utc>>,
    pub archived_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure_note: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<Value>,
    /// Keys this model does not know about (e.g. `sshKey`), written back as-is.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Username of the login block, if any.
    pub fn username(&self) -> Option<&str> {
        self.login.as_ref().and_then(|l| l.username.as_deref())
    }

    /// Non-blank URIs of the login block, in list order.
    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.login
            .iter()
            .flat_map(|l| l.uris.iter())
            .filter_map(|u| u.uri.as_deref())
            .filter(|u| !u.trim().is_empty())
    }
}

/// Login credentials of a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginBlock {
    #[serde(default, deserialize_with = "skip_nulls")]
    pub uris: Vec<UriEntry>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub totp: Option<String>,
    /// Keys such as `fido2Credentials` and `passwordRevisionDate`, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A URI attached to a login. Unique by `uri`, case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UriEntry {
    /// Match strategy as exported (opaque here).
    #[serde(rename = "match", default)]
    pub match_kind: Option<Value>,
    pub uri: Option<String>,
}

impl UriEntry {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            match_kind: None,
            uri: Some(uri.into()),
        }
    }
}

/// A user-defined field. Unique by `(name case-insensitive, type)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    pub name: Option<String>,
    pub value: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: i32,
    pub linked_id: Option<i32>,
}

impl CustomField {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            value: Some(value.into()),
            kind: 0,
            linked_id: None,
        }
    }
}

/// A previous password. Unique by the exact `(password, lastUsedDate)` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub last_used_date: Option<DateTime<Utc>>,
    pub password: Option<String>,
}

/// True when the value is absent, empty, or only whitespace.
pub fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Accepts `null`, a missing key, or a list with `null` holes.
fn skip_nulls<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items: Option<Vec<Option<T>>> = Option::deserialize(deserializer)?;
    Ok(items.unwrap_or_default().into_iter().flatten().collect())
}

fn skip_nulls_opt<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items: Option<Vec<Option<T>>> = Option::deserialize(deserializer)?;
    Ok(items.map(|list| list.into_iter().flatten().collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_collections_and_entries_are_tolerated() {
        let json = r#"{
            "folders": null,
            "items": [
                null,
                {"id": "a", "type": 1, "name": "Site", "login": {"uris": [null, {"uri": "https://x"}]}},
                {"id": "b", "fields": null, "collectionIds": ["c1", null]}
            ]
        }"#;

        let vault: Vault = serde_json::from_str(json).unwrap();
        assert!(vault.folders.is_empty());
        assert_eq!(vault.records.len(), 2);
        assert_eq!(vault.records[0].uris().collect::<Vec<_>>(), vec!["https://x"]);
        assert!(vault.records[1].fields.is_empty());
        assert_eq!(vault.records[1].collection_ids, Some(vec!["c1".to_string()]));
        assert_eq!(vault.records[1].password_history, None);
    }

    #[test]
    fn test_unknown_keys_and_opaque_objects_survive() {
        let json = r#"{"id": "a", "type": 3, "card": {"brand": "Visa"}, "sshKey": {"k": 1}}"#;

        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.kind, 3);
        assert!(record.card.is_some());
        assert!(record.extra.contains_key("sshKey"));

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["card"]["brand"], "Visa");
        assert_eq!(back["sshKey"]["k"], 1);
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(None));
        assert!(is_blank(Some("")));
        assert!(is_blank(Some("  \t")));
        assert!(!is_blank(Some("x")));
    }
}
