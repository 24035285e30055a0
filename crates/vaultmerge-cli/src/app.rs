//! One deduplication run: load, reconcile, review, save, report.

use crate::handlers;
use crate::report::{self, ReportInput, VaultChanges};
use crate::ui::{self, ConsoleSink};
use anyhow::{Context, Result};
use chrono::Local;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use vaultmerge_core::export::{self, LoadedExport};
use vaultmerge_core::{reconcile, MergePolicy, ResolverSession, Summary, TracingSink};

/// Resolved options for a run, after merging config and flags.
#[derive(Debug, Clone)]
pub struct Settings {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub policy: MergePolicy,
    pub verbose: bool,
    pub interactive: bool,
    pub write_report: bool,
}

/// Main application model.
pub struct App {
    settings: Settings,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Run once, reading operator commands from `input` and writing all
    /// console output to `out`. Returns the final counts.
    pub fn run(&self, input: impl BufRead, out: &mut impl Write) -> Result<Summary> {
        let settings = &self.settings;

        let LoadedExport { mut vault, size } = export::load(&settings.input)
            .with_context(|| format!("Failed to load export: {}", settings.input.display()))?;
        let original = vault.clone();

        let mut summary = if settings.verbose {
            let mut sink = ConsoleSink::new(&mut *out);
            reconcile(&mut vault, settings.policy, &mut sink)
        } else {
            reconcile(&mut vault, settings.policy, &mut TracingSink)
        };
        ui::print_summary(out, &summary)?;

        if settings.interactive {
            let mut session = ResolverSession::new(std::mem::take(&mut vault.records));
            if session.group_count() == 0 {
                writeln!(out, "No duplicate groups found.")?;
            } else {
                writeln!(out, "Found {} duplicate groups.", session.group_count())?;
                handlers::run_session(&mut session, input, out)?;
            }
            vault.records = session.finish();
            summary.final_records = vault.records.len();
        }

        let changes = VaultChanges::between(&original, &vault);
        if settings.verbose {
            ui::print_changes(out, &changes)?;
        }

        let Some(output) = settings.output.as_deref() else {
            tracing::info!("No output path given; nothing written");
            return Ok(summary);
        };

        let final_size = export::save(&vault, output)
            .with_context(|| format!("Failed to write export: {}", output.display()))?;
        writeln!(out, "Wrote {} ({} bytes)", output.display(), final_size)?;

        if settings.write_report {
            let report = ReportInput {
                input_path: &settings.input,
                output_path: output,
                original_size: size,
                final_size,
                summary,
                policy: settings.policy,
                changes: &changes,
                generated_at: Local::now(),
            };
            match report::write_report(&report) {
                Ok(path) => writeln!(out, "Report written to {}", path.display())?,
                Err(e) => tracing::error!("{:#}", e),
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use vaultmerge_core::Vault;

    const EXPORT: &str = r#"{
        "encrypted": false,
        "folders": [
            { "id": "f1", "name": "Work" },
            { "id": "f2", "name": "WORK" }
        ],
        "items": [
            {
                "id": "a", "folderId": "f2", "type": 1, "name": "Site",
                "revisionDate": "2020-01-01T00:00:00Z",
                "login": { "username": "me", "uris": [{ "match": null, "uri": "https://a" }] }
            },
            {
                "id": "b", "folderId": null, "type": 1, "name": "Site", "favorite": true,
                "revisionDate": "2021-01-01T00:00:00Z",
                "login": { "username": "me", "uris": [{ "match": null, "uri": "https://a" }] }
            },
            { "id": "c", "type": 2, "name": "Note", "secureNote": { "type": 0 } }
        ]
    }"#;

    fn settings(dir: &std::path::Path, policy: MergePolicy) -> Settings {
        let input = dir.join("export.json");
        std::fs::write(&input, EXPORT).unwrap();
        Settings {
            input,
            output: Some(dir.join("deduped.json")),
            policy,
            verbose: false,
            interactive: false,
            write_report: true,
        }
    }

    fn saved(dir: &std::path::Path) -> Vault {
        let json = std::fs::read_to_string(dir.join("deduped.json")).unwrap();
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_merge_run_writes_output_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::new(settings(dir.path(), MergePolicy::Merge));
        let mut out = Vec::new();

        let summary = app.run(Cursor::new(""), &mut out).unwrap();

        assert_eq!(summary.final_folders, 1);
        assert_eq!(summary.final_records, 2);
        let vault = saved(dir.path());
        let merged = vault.records.iter().find(|r| r.id.as_deref() == Some("b")).unwrap();
        assert!(merged.favorite);
        assert_eq!(merged.folder_id.as_deref(), Some("f1"));
        assert!(vault.records[1].secure_note.is_some());

        let report = std::fs::read_to_string(dir.path().join("deduped.md")).unwrap();
        assert!(report.contains("- **Items removed:** 1 (33.3% reduction)"));
        let console = String::from_utf8(out).unwrap();
        assert!(console.contains("deduplicated items=2 (removed 1)"));
    }

    #[test]
    fn test_review_resolves_groups_from_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(dir.path(), MergePolicy::KeepAll);
        settings.interactive = true;
        settings.write_report = false;
        let app = App::new(settings);
        let mut out = Vec::new();

        let summary = app.run(Cursor::new("d 1\n"), &mut out).unwrap();

        assert_eq!(summary.final_records, 2);
        let ids: Vec<_> = saved(dir.path())
            .records
            .iter()
            .filter_map(|r| r.id.clone())
            .collect();
        // Newest first: "b" leads the group and survives the delete of index 1.
        assert_eq!(ids, vec!["b", "c"]);
        assert!(!dir.path().join("deduped.md").exists());
    }

    #[test]
    fn test_verbose_prints_decisions_and_diff() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(dir.path(), MergePolicy::LatestWins);
        settings.verbose = true;
        settings.output = None;
        let app = App::new(settings);
        let mut out = Vec::new();

        app.run(Cursor::new(""), &mut out).unwrap();

        let console = String::from_utf8(out).unwrap();
        assert!(console.contains("Duplicate folder name='WORK': mapping id 'f2' -> 'f1'"));
        assert!(console.contains("Visual diff of changes"));
        assert!(!dir.path().join("deduped.json").exists());
    }

    #[test]
    fn test_missing_input_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::new(Settings {
            input: dir.path().join("nope.json"),
            output: None,
            policy: MergePolicy::LatestWins,
            verbose: false,
            interactive: false,
            write_report: false,
        });

        let err = app.run(Cursor::new(""), &mut Vec::new()).unwrap_err();
        assert!(format!("{err:#}").contains("nope.json"));
    }
}
