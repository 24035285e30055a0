//! Deduplication and merge engine for password-manager vault exports.
//!
//! This crate provides the vault model, the reconciliation engine, and the
//! interactive group resolver used by the command-line frontend.

pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod export;
pub mod folders;
pub mod groups;
pub mod key;
pub mod merge;
pub mod models;
pub mod resolver;

pub use diagnostics::{DedupEvent, DiagnosticsSink, NoopSink, RecordingSink, TracingSink};
pub use engine::{reconcile, MergePolicy, Summary};
pub use error::ExportError;
pub use folders::{reconcile_folders, FolderReconciliation};
pub use groups::{find_duplicate_groups, DuplicateGroup};
pub use key::composite_key;
pub use merge::merge_records;
pub use models::{CustomField, Folder, HistoryEntry, LoginBlock, Record, UriEntry, Vault};
pub use resolver::{Command, GroupView, Outcome, ResolverSession, SessionState};
