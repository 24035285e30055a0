//! Field-by-field merge of two records.
//!
//! The policy is the same everywhere: the primary record wins unless its value
//! is blank, and list-like data is unioned with the primary's entries first.

use crate::models::{is_blank, CustomField, HistoryEntry, LoginBlock, Record, UriEntry};

/// Merge `secondary` into a copy of `primary`.
///
/// `primary` should be the revision to prefer. `revision_date` is always the
/// primary's; the caller decides which revision the result represents.
/// Opaque sub-objects (`card`, `identity`, `secure_note`, unknown keys) come
/// from `primary` only.
pub fn merge_records(primary: &Record, secondary: Option<&Record>) -> Record {
    let mut result = primary.clone();
    result.collection_ids = merge_collection_ids(primary.collection_ids.as_deref(), None);

    let Some(secondary) = secondary else {
        return result;
    };

    result.name = prefer_non_blank(&primary.name, &secondary.name);
    result.notes = prefer_non_blank(&primary.notes, &secondary.notes);
    result.folder_id = prefer_non_blank(&primary.folder_id, &secondary.folder_id);
    result.favorite = primary.favorite || secondary.favorite;

    result.login = merge_login(primary.login.as_ref(), secondary.login.as_ref());
    result.fields = merge_fields(&primary.fields, &secondary.fields);
    result.collection_ids = merge_collection_ids(
        primary.collection_ids.as_deref(),
        secondary.collection_ids.as_deref(),
    );
    result.password_history = merge_password_history(
        primary.password_history.as_deref(),
        secondary.password_history.as_deref(),
    );

    result.creation_date = primary.creation_date.or(secondary.creation_date);
    result.deleted_date = primary.deleted_date.or(secondary.deleted_date);
    result.archived_date = primary.archived_date.or(secondary.archived_date);

    result
}

/// Merge two login blocks. URIs are unioned by case-insensitive `uri`;
/// unknown keys such as passkeys come from `primary`.
pub fn merge_login(
    primary: Option<&LoginBlock>,
    secondary: Option<&LoginBlock>,
) -> Option<LoginBlock> {
    let (primary, secondary) = match (primary, secondary) {
        (None, None) => return None,
        (Some(only), None) | (None, Some(only)) => return Some(only.clone()),
        (Some(p), Some(s)) => (p, s),
    };

    let mut uris: Vec<UriEntry> = primary.uris.clone();
    for candidate in &secondary.uris {
        let seen = uris
            .iter()
            .any(|u| eq_ignore_case(u.uri.as_deref(), candidate.uri.as_deref()));
        if !seen {
            uris.push(candidate.clone());
        }
    }

    Some(LoginBlock {
        uris,
        username: prefer_non_blank(&primary.username, &secondary.username),
        password: prefer_non_blank(&primary.password, &secondary.password),
        totp: prefer_non_blank(&primary.totp, &secondary.totp),
        extra: primary.extra.clone(),
    })
}

/// Union custom fields by `(name case-insensitive, type)`, primary first.
pub fn merge_fields(primary: &[CustomField], secondary: &[CustomField]) -> Vec<CustomField> {
    let mut result = primary.to_vec();
    for field in secondary {
        let seen = result.iter().any(|f| {
            f.kind == field.kind && eq_ignore_case(f.name.as_deref(), field.name.as_deref())
        });
        if !seen {
            result.push(field.clone());
        }
    }
    result
}

/// Union collection ids ignoring case and blanks. An empty union is `None`.
pub fn merge_collection_ids(
    primary: Option<&[String]>,
    secondary: Option<&[String]>,
) -> Option<Vec<String>> {
    let mut result: Vec<String> = Vec::new();
    let candidates = primary
        .unwrap_or_default()
        .iter()
        .chain(secondary.unwrap_or_default());

    for id in candidates {
        if is_blank(Some(id)) {
            continue;
        }
        if !result.iter().any(|existing| eq_ignore_case(Some(existing), Some(id))) {
            result.push(id.clone());
        }
    }

    (!result.is_empty()).then_some(result)
}

/// Union password history by exact `(password, lastUsedDate)`. An empty union is `None`.
pub fn merge_password_history(
    primary: Option<&[HistoryEntry]>,
    secondary: Option<&[HistoryEntry]>,
) -> Option<Vec<HistoryEntry>> {
    let mut result: Vec<HistoryEntry> = primary.unwrap_or_default().to_vec();
    for entry in secondary.unwrap_or_default() {
        if !result.contains(entry) {
            result.push(entry.clone());
        }
    }

    (!result.is_empty()).then_some(result)
}

fn prefer_non_blank(primary: &Option<String>, secondary: &Option<String>) -> Option<String> {
    if is_blank(primary.as_deref()) && !is_blank(secondary.as_deref()) {
        secondary.clone()
    } else {
        primary.clone()
    }
}

fn eq_ignore_case(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.to_lowercase() == b.to_lowercase(),
        (None, None) => true,
        _ => false,
    }
}
