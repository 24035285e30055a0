//! Vault reconciliation: folder dedup, record grouping, and conflict policy.

use crate::diagnostics::{DedupEvent, DiagnosticsSink};
use crate::folders::{reconcile_folders, FolderReconciliation};
use crate::key::composite_key;
use crate::merge::merge_records;
use crate::models::{Record, Vault};
use serde::Serialize;
use std::collections::HashMap;

/// How two records with the same composite key are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// Keep the record with the later revision; drop the other entirely.
    #[default]
    LatestWins,
    /// Combine both records, preferring the later revision's values.
    Merge,
    /// Keep every record. Only folders are reconciled, leaving duplicate
    /// records for the interactive resolver.
    KeepAll,
}

impl MergePolicy {
    pub fn from_merge_mode(merge_mode: bool) -> Self {
        if merge_mode {
            Self::Merge
        } else {
            Self::LatestWins
        }
    }
}

/// Counts before and after a reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub original_folders: usize,
    pub final_folders: usize,
    pub original_records: usize,
    pub final_records: usize,
}

impl Summary {
    pub fn removed_folders(&self) -> usize {
        self.original_folders.saturating_sub(self.final_folders)
    }

    pub fn removed_records(&self) -> usize {
        self.original_records.saturating_sub(self.final_records)
    }
}

/// Deduplicate `vault` in place.
///
/// Folders collapse by case-insensitive name and record folder references are
/// rewritten to the surviving folder. Records sharing a composite key collapse
/// to one according to `policy`. The result is ordered newest revision first,
/// then newest creation first.
pub fn reconcile(
    vault: &mut Vault,
    policy: MergePolicy,
    sink: &mut dyn DiagnosticsSink,
) -> Summary {
    let mut summary = Summary {
        original_folders: vault.folders.len(),
        original_records: vault.records.len(),
        ..Default::default()
    };

    let mut folders = reconcile_folders(&vault.folders, sink);
    vault.folders = std::mem::take(&mut folders.folders);
    summary.final_folders = vault.folders.len();
    tracing::debug!(
        "Folder deduplication: original={}, deduped={}, removed={}",
        summary.original_folders,
        summary.final_folders,
        summary.removed_folders()
    );

    let mut kept: Vec<Record> = Vec::with_capacity(vault.records.len());
    let mut slot_by_key: HashMap<String, usize> = HashMap::new();

    for mut record in std::mem::take(&mut vault.records) {
        let key = composite_key(&record);
        if key.is_empty() {
            sink.emit(&DedupEvent::RecordSkipped {
                id: record.id.clone(),
            });
            remap_folder(&mut record, &folders, sink);
            kept.push(record);
            continue;
        }

        let slot = match (policy, slot_by_key.get(&key).copied()) {
            (MergePolicy::KeepAll, _) | (_, None) => {
                remap_folder(&mut record, &folders, sink);
                sink.emit(&DedupEvent::RecordKept {
                    key: key.clone(),
                    id: record.id.clone(),
                    name: record.name.clone(),
                });
                slot_by_key.entry(key).or_insert(kept.len());
                kept.push(record);
                continue;
            }
            (_, Some(slot)) => slot,
        };

        // Absent revision dates sort before any real date; ties keep the existing record.
        let incoming_is_later = record.revision_date > kept[slot].revision_date;

        if policy == MergePolicy::LatestWins {
            if incoming_is_later {
                remap_folder(&mut record, &folders, sink);
                let discarded = std::mem::replace(&mut kept[slot], record);
                sink.emit(&DedupEvent::RecordDiscarded {
                    key,
                    kept: Box::new(kept[slot].clone()),
                    discarded: Box::new(discarded),
                });
            } else {
                sink.emit(&DedupEvent::RecordDiscarded {
                    key,
                    kept: Box::new(kept[slot].clone()),
                    discarded: Box::new(record),
                });
            }
            continue;
        }

        let existing = &kept[slot];
        let mut merged = if incoming_is_later {
            remap_folder(&mut record, &folders, sink);
            merge_records(&record, Some(existing))
        } else {
            merge_records(existing, Some(&record))
        };
        // The folder may have been filled in from the older side.
        remap_folder(&mut merged, &folders, sink);

        let (primary_id, secondary_id) = if incoming_is_later {
            (record.id.clone(), existing.id.clone())
        } else {
            (existing.id.clone(), record.id.clone())
        };
        let before = std::mem::replace(&mut kept[slot], merged);
        sink.emit(&DedupEvent::RecordMerged {
            key,
            primary_id,
            secondary_id,
            before: Box::new(before),
            after: Box::new(kept[slot].clone()),
        });
    }

    kept.sort_by(|a, b| {
        b.revision_date
            .cmp(&a.revision_date)
            .then_with(|| b.creation_date.cmp(&a.creation_date))
    });
    vault.records = kept;
    summary.final_records = vault.records.len();
    tracing::debug!(
        "Record deduplication: original={}, deduped={}, removed={}",
        summary.original_records,
        summary.final_records,
        summary.removed_records()
    );

    summary
}

fn remap_folder(
    record: &mut Record,
    folders: &FolderReconciliation,
    sink: &mut dyn DiagnosticsSink,
) {
    let Some(from) = record.folder_id.as_deref().filter(|id| !id.trim().is_empty()) else {
        return;
    };
    let Some(to) = folders.resolve(from).filter(|to| *to != from) else {
        return;
    };

    sink.emit(&DedupEvent::RecordRemapped {
        id: record.id.clone(),
        from: from.to_string(),
        to: to.to_string(),
    });
    record.folder_id = Some(to.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{NoopSink, RecordingSink};
    use crate::models::{Folder, LoginBlock, UriEntry};
    use chrono::{TimeZone, Utc};

    fn login(id: &str, name: &str, username: &str, uri: &str) -> Record {
        Record {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            kind: 1,
            login: Some(LoginBlock {
                username: Some(username.to_string()),
                uris: vec![UriEntry::new(uri)],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn revised(mut record: Record, year: i32) -> Record {
        record.revision_date = Some(Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap());
        record
    }

    #[test]
    fn test_ties_keep_first_seen_record() {
        let mut first = revised(login("a", "Site", "u", "https://x"), 2020);
        first.notes = Some("first".to_string());
        let mut second = revised(login("b", "Site", "u", "https://x"), 2020);
        second.notes = Some("second".to_string());
        let mut vault = Vault {
            records: vec![first, second],
            ..Default::default()
        };

        reconcile(&mut vault, MergePolicy::LatestWins, &mut NoopSink);

        assert_eq!(vault.records.len(), 1);
        assert_eq!(vault.records[0].id.as_deref(), Some("a"));
    }

    #[test]
    fn test_merge_ties_use_first_seen_as_primary() {
        let mut first = revised(login("a", "Site", "u", "https://x"), 2020);
        first.notes = Some("first".to_string());
        first.login.as_mut().unwrap().password = Some("first-pw".to_string());
        let mut second = revised(login("b", "Site", "u", "https://x"), 2020);
        second.notes = Some("second".to_string());
        second.folder_id = Some("f1".to_string());
        let mut vault = Vault {
            folders: vec![Folder::new("f1", "Work")],
            records: vec![first, second],
            ..Default::default()
        };

        reconcile(&mut vault, MergePolicy::Merge, &mut NoopSink);

        assert_eq!(vault.records.len(), 1);
        let merged = &vault.records[0];
        assert_eq!(merged.id.as_deref(), Some("a"));
        assert_eq!(merged.notes.as_deref(), Some("first"));
        assert_eq!(merged.login.as_ref().unwrap().password.as_deref(), Some("first-pw"));
        assert_eq!(merged.folder_id.as_deref(), Some("f1"));
    }

    #[test]
    fn test_missing_revision_loses_to_any_date() {
        let undated = login("a", "Site", "u", "https://x");
        let dated = revised(login("b", "Site", "u", "https://x"), 1999);
        let mut vault = Vault {
            records: vec![undated, dated],
            ..Default::default()
        };

        reconcile(&mut vault, MergePolicy::LatestWins, &mut NoopSink);

        assert_eq!(vault.records[0].id.as_deref(), Some("b"));
    }

    #[test]
    fn test_identityless_records_are_kept_apart() {
        let mut vault = Vault {
            records: vec![
                Record {
                    id: Some("x".to_string()),
                    ..Default::default()
                },
                Record {
                    id: Some("y".to_string()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let mut sink = RecordingSink::new();

        let summary = reconcile(&mut vault, MergePolicy::Merge, &mut sink);

        assert_eq!(summary.final_records, 2);
        assert_eq!(summary.removed_records(), 0);
        let skipped = sink
            .events
            .iter()
            .filter(|e| matches!(e, DedupEvent::RecordSkipped { .. }))
            .count();
        assert_eq!(skipped, 2);
    }

    #[test]
    fn test_merged_folder_from_older_side_is_remapped() {
        let mut newer = revised(login("a", "Site", "u", "https://x"), 2021);
        newer.folder_id = None;
        let mut older = revised(login("b", "Site", "u", "https://x"), 2020);
        older.folder_id = Some("f2".to_string());
        let mut vault = Vault {
            folders: vec![Folder::new("f1", "Work"), Folder::new("f2", "work")],
            records: vec![newer, older],
            ..Default::default()
        };

        reconcile(&mut vault, MergePolicy::Merge, &mut NoopSink);

        assert_eq!(vault.records.len(), 1);
        assert_eq!(vault.records[0].id.as_deref(), Some("a"));
        assert_eq!(vault.records[0].folder_id.as_deref(), Some("f1"));
    }

    #[test]
    fn test_output_is_ordered_by_revision_then_creation() {
        let mut a = revised(login("a", "A", "u", "https://a"), 2020);
        a.creation_date = Some(Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap());
        let mut b = revised(login("b", "B", "u", "https://b"), 2020);
        b.creation_date = Some(Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap());
        let c = revised(login("c", "C", "u", "https://c"), 2022);
        let d = login("d", "D", "u", "https://d");
        let mut vault = Vault {
            records: vec![d, a, b, c],
            ..Default::default()
        };

        reconcile(&mut vault, MergePolicy::LatestWins, &mut NoopSink);

        let ids: Vec<_> = vault.records.iter().filter_map(|r| r.id.as_deref()).collect();
        assert_eq!(ids, vec!["c", "b", "a", "d"]);
    }

    #[test]
    fn test_merge_event_carries_before_and_after() {
        let older = revised(login("a", "Site", "u", "https://x"), 2020);
        let mut newer = revised(login("b", "Site", "u", "https://x"), 2021);
        newer.favorite = true;
        let mut vault = Vault {
            records: vec![older, newer],
            ..Default::default()
        };
        let mut sink = RecordingSink::new();

        reconcile(&mut vault, MergePolicy::Merge, &mut sink);

        let merged = sink.events.iter().find_map(|e| match e {
            DedupEvent::RecordMerged {
                primary_id,
                secondary_id,
                before,
                after,
                ..
            } => Some((
                primary_id.clone(),
                secondary_id.clone(),
                before.id.clone(),
                after.id.clone(),
            )),
            _ => None,
        });
        assert_eq!(
            merged,
            Some((
                Some("b".to_string()),
                Some("a".to_string()),
                Some("a".to_string()),
                Some("b".to_string()),
            ))
        );
    }

    #[test]
    fn test_keep_all_only_reconciles_folders() {
        let mut a = login("a", "Site", "u", "https://x");
        a.folder_id = Some("f2".to_string());
        let b = login("b", "Site", "u", "https://x");
        let mut vault = Vault {
            folders: vec![Folder::new("f1", "Work"), Folder::new("f2", "WORK")],
            records: vec![a, b],
            ..Default::default()
        };

        let summary = reconcile(&mut vault, MergePolicy::KeepAll, &mut NoopSink);

        assert_eq!(summary.final_folders, 1);
        assert_eq!(summary.final_records, 2);
        assert_eq!(vault.records[0].folder_id.as_deref(), Some("f1"));
    }

    #[test]
    fn test_policy_from_merge_mode() {
        assert_eq!(MergePolicy::from_merge_mode(true), MergePolicy::Merge);
        assert_eq!(MergePolicy::from_merge_mode(false), MergePolicy::LatestWins);
    }
}
