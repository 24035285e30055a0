//! Reading and writing the JSON vault export.

use crate::error::ExportError;
use crate::models::{is_blank, Vault};
use serde_json::Value;
use std::path::Path;

/// A vault read from disk, with the size of the file it came from.
#[derive(Debug, Clone)]
pub struct LoadedExport {
    pub vault: Vault,
    /// Size of the source file in bytes.
    pub size: usize,
}

/// Read and parse an export file.
pub fn load(path: impl AsRef<Path>) -> Result<LoadedExport, ExportError> {
    let path = path.as_ref();

    let json = std::fs::read_to_string(path).map_err(|source| ExportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    // Exports saved on Windows may start with a byte order mark.
    let text = json.strip_prefix('\u{feff}').unwrap_or(&json);
    let vault = serde_json::from_str(text).map_err(|source| ExportError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!("Loaded export {} ({} bytes)", path.display(), json.len());
    Ok(LoadedExport {
        vault,
        size: json.len(),
    })
}

/// Serialize a vault as pretty JSON, blank strings written as `null`.
pub fn to_json(vault: &Vault) -> Result<String, ExportError> {
    let mut normalized = vault.clone();
    normalize_blank_strings(&mut normalized);
    Ok(serde_json::to_string_pretty(&normalized)?)
}

/// Write a vault to `path`. Returns the number of bytes written.
pub fn save(vault: &Vault, path: impl AsRef<Path>) -> Result<usize, ExportError> {
    let path = path.as_ref();
    let json = to_json(vault)?;

    std::fs::write(path, &json).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!("Saved export {} ({} bytes)", path.display(), json.len());
    Ok(json.len())
}

/// Turn every blank scalar string into an absent value.
///
/// Absent lists stay absent; nothing is created.
pub fn normalize_blank_strings(vault: &mut Vault) {
    for folder in &mut vault.folders {
        clear_blank(&mut folder.id);
        clear_blank(&mut folder.name);
    }

    for record in &mut vault.records {
        clear_blank(&mut record.id);
        clear_blank(&mut record.organization_id);
        clear_blank(&mut record.folder_id);
        clear_blank(&mut record.name);
        clear_blank(&mut record.notes);

        for field in &mut record.fields {
            clear_blank(&mut field.name);
            clear_blank(&mut field.value);
        }

        if let Some(login) = record.login.as_mut() {
            clear_blank(&mut login.username);
            clear_blank(&mut login.password);
            clear_blank(&mut login.totp);
            for uri in &mut login.uris {
                clear_blank(&mut uri.uri);
                if matches!(&uri.match_kind, Some(Value::String(s)) if s.trim().is_empty()) {
                    uri.match_kind = None;
                }
            }
        }
    }
}

fn clear_blank(value: &mut Option<String>) {
    if is_blank(value.as_deref()) {
        *value = None;
    }
}
