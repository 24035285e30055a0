//! Observational events emitted while reconciling a vault.
//!
//! Sinks never influence control flow; the engine behaves identically with a
//! [`NoopSink`].

use crate::models::Record;

/// Something the engine decided during a reconciliation pass.
#[derive(Debug, Clone, PartialEq)]
pub enum DedupEvent {
    /// First folder seen with this name; it becomes canonical.
    FolderKept { name: String, id: Option<String> },
    /// A duplicate folder whose id now points at the canonical folder.
    FolderMapped { name: String, from: String, to: String },
    /// A duplicate folder dropped without a mapping (blank id on one side).
    FolderUnmapped { name: String, id: Option<String> },
    /// A folder with a blank name, dropped from the output.
    FolderDropped { id: Option<String> },
    /// A record with an empty composite key; left out of grouping.
    RecordSkipped { id: Option<String> },
    /// First record seen for a key.
    RecordKept {
        key: String,
        id: Option<String>,
        name: Option<String>,
    },
    /// Latest-wins: `discarded` lost to `kept`.
    RecordDiscarded {
        key: String,
        kept: Box<Record>,
        discarded: Box<Record>,
    },
    /// Merge mode: `before` was the group representative, `after` replaces it.
    RecordMerged {
        key: String,
        primary_id: Option<String>,
        secondary_id: Option<String>,
        before: Box<Record>,
        after: Box<Record>,
    },
    /// A record's folder reference was rewritten to the canonical folder.
    RecordRemapped {
        id: Option<String>,
        from: String,
        to: String,
    },
}

/// Receiver for [`DedupEvent`]s.
pub trait DiagnosticsSink {
    fn emit(&mut self, event: &DedupEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DiagnosticsSink for NoopSink {
    fn emit(&mut self, _event: &DedupEvent) {}
}

/// Collects events in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub events: Vec<DedupEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DiagnosticsSink for RecordingSink {
    fn emit(&mut self, event: &DedupEvent) {
        self.events.push(event.clone());
    }
}

/// Forwards events to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn emit(&mut self, event: &DedupEvent) {
        match event {
            DedupEvent::FolderKept { name, id } => {
                tracing::debug!("Keeping folder name='{}' id={:?}", name, id);
            }
            DedupEvent::FolderMapped { name, from, to } => {
                tracing::debug!(
                    "Duplicate folder name='{}': mapping id '{}' -> '{}'",
                    name,
                    from,
                    to
                );
            }
            DedupEvent::FolderUnmapped { name, id } => {
                tracing::debug!(
                    "Duplicate folder name='{}' has a blank id on one side; cannot remap {:?}",
                    name,
                    id
                );
            }
            DedupEvent::FolderDropped { id } => {
                tracing::debug!("Dropping folder with blank name id={:?}", id);
            }
            DedupEvent::RecordSkipped { id } => {
                tracing::debug!("Skipping record id={:?}: composite key is empty", id);
            }
            DedupEvent::RecordKept { key, id, name } => {
                tracing::debug!("Keeping record key='{}' id={:?} name={:?}", key, id, name);
            }
            DedupEvent::RecordDiscarded { key, kept, discarded } => {
                tracing::debug!(
                    "Duplicate for key='{}': keeping id={:?}, discarding id={:?}",
                    key,
                    kept.id,
                    discarded.id
                );
            }
            DedupEvent::RecordMerged {
                key,
                primary_id,
                secondary_id,
                ..
            } => {
                tracing::debug!(
                    "Merged duplicate for key='{}': latest id={:?} absorbed id={:?}",
                    key,
                    primary_id,
                    secondary_id
                );
            }
            DedupEvent::RecordRemapped { id, from, to } => {
                tracing::debug!("Remapping record id={:?} folderId '{}' -> '{}'", id, from, to);
            }
        }
    }
}
