//! Folder deduplication by case-insensitive name.

use crate::diagnostics::{DedupEvent, DiagnosticsSink};
use crate::models::{is_blank, Folder};
use std::collections::HashMap;

/// Result of folder reconciliation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FolderReconciliation {
    /// First-seen folder per name, in first-seen order.
    pub folders: Vec<Folder>,
    /// Old folder id -> canonical folder id. Canonical ids map to themselves.
    pub id_map: HashMap<String, String>,
}

impl FolderReconciliation {
    /// Canonical id for `folder_id`, if it is known to the map.
    pub fn resolve(&self, folder_id: &str) -> Option<&str> {
        self.id_map.get(folder_id).map(String::as_str)
    }
}

/// Collapse folders that share a name (ignoring case) onto the first one seen.
///
/// Blank-named folders are dropped. A duplicate only gets a mapping entry
/// when both its id and the canonical id are non-blank.
pub fn reconcile_folders(
    folders: &[Folder],
    sink: &mut dyn DiagnosticsSink,
) -> FolderReconciliation {
    let mut result = FolderReconciliation::default();
    let mut by_name: HashMap<String, usize> = HashMap::new();

    for folder in folders {
        let name = folder.name.as_deref().unwrap_or_default();
        if name.trim().is_empty() {
            sink.emit(&DedupEvent::FolderDropped {
                id: folder.id.clone(),
            });
            continue;
        }

        let lookup = name.to_lowercase();
        match by_name.get(&lookup) {
            None => {
                if let Some(id) = folder.id.as_deref().filter(|id| !id.trim().is_empty()) {
                    result.id_map.insert(id.to_string(), id.to_string());
                }
                by_name.insert(lookup, result.folders.len());
                result.folders.push(folder.clone());
                sink.emit(&DedupEvent::FolderKept {
                    name: name.to_string(),
                    id: folder.id.clone(),
                });
            }
            Some(&index) => {
                let canonical = &result.folders[index];
                match (folder.id.as_deref(), canonical.id.as_deref()) {
                    (Some(from), Some(to)) if !is_blank(Some(from)) && !is_blank(Some(to)) => {
                        let to = to.to_string();
                        result.id_map.insert(from.to_string(), to.clone());
                        sink.emit(&DedupEvent::FolderMapped {
                            name: name.to_string(),
                            from: from.to_string(),
                            to,
                        });
                    }
                    _ => sink.emit(&DedupEvent::FolderUnmapped {
                        name: name.to_string(),
                        id: folder.id.clone(),
                    }),
                }
            }
        }
    }

    result
}
