//! Composite grouping keys.

use crate::models::{is_blank, Record};

/// Separator between the parts of a composite key.
pub const KEY_SEPARATOR: &str = "|";

/// Build the composite key `name|type|username|uri...` for a record.
///
/// Returns an empty string when the record has no identity at all (blank
/// name, type 0, no username, no URIs). Such records never group.
pub fn composite_key(record: &Record) -> String {
    let username = record.username().filter(|u| !u.trim().is_empty());
    let uris: Vec<&str> = record.uris().collect();

    if is_blank(record.name.as_deref())
        && record.kind == 0
        && username.is_none()
        && uris.is_empty()
    {
        return String::new();
    }

    let mut parts = vec![record.name.clone().unwrap_or_default(), record.kind.to_string()];
    parts.extend(username.map(str::to_string));
    parts.extend(uris.into_iter().map(str::to_string));
    parts.join(KEY_SEPARATOR)
}
