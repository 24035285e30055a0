//! Markdown run report and the vault-level change set it describes.

use anyhow::Context;
use chrono::{DateTime, Local};
use std::collections::HashSet;
use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};
use vaultmerge_core::{Folder, MergePolicy, Record, Summary, Vault};

/// A record whose folder reference changed between the two vaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remap {
    pub id: String,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Differences between an original vault and its deduplicated result.
#[derive(Debug, Clone, Default)]
pub struct VaultChanges {
    pub removed_folders: Vec<Folder>,
    pub added_folders: Vec<Folder>,
    pub removed_records: Vec<Record>,
    pub added_records: Vec<Record>,
    pub remapped: Vec<Remap>,
}

impl VaultChanges {
    /// Folders match by id or case-insensitive name; records match by id.
    pub fn between(original: &Vault, result: &Vault) -> Self {
        let original_ids: HashSet<&str> = record_ids(&original.records).collect();
        let result_ids: HashSet<&str> = record_ids(&result.records).collect();

        let remapped = original
            .records
            .iter()
            .filter_map(|before| {
                let id = before.id.as_deref().filter(|id| !id.is_empty())?;
                let after = result.records.iter().find(|r| r.id.as_deref() == Some(id))?;
                (before.folder_id != after.folder_id).then(|| Remap {
                    id: id.to_string(),
                    from: before.folder_id.clone(),
                    to: after.folder_id.clone(),
                })
            })
            .collect();

        Self {
            removed_folders: original
                .folders
                .iter()
                .filter(|f| !folder_in(f, &result.folders))
                .cloned()
                .collect(),
            added_folders: result
                .folders
                .iter()
                .filter(|f| !folder_in(f, &original.folders))
                .cloned()
                .collect(),
            removed_records: original
                .records
                .iter()
                .filter(|r| r.id.as_deref().is_some_and(|id| !result_ids.contains(id)))
                .cloned()
                .collect(),
            added_records: result
                .records
                .iter()
                .filter(|r| r.id.as_deref().is_some_and(|id| !original_ids.contains(id)))
                .cloned()
                .collect(),
            remapped,
        }
    }
}

fn folder_in(folder: &Folder, set: &[Folder]) -> bool {
    set.iter().any(|other| {
        same_value(folder.id.as_deref(), other.id.as_deref())
            || same_value(folder.name.as_deref(), other.name.as_deref())
    })
}

fn record_ids(records: &[Record]) -> impl Iterator<Item = &str> {
    records
        .iter()
        .filter_map(|r| r.id.as_deref())
        .filter(|id| !id.is_empty())
}

fn same_value(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) if !a.trim().is_empty() => a.to_lowercase() == b.to_lowercase(),
        _ => false,
    }
}

/// Everything the report needs about one run.
pub struct ReportInput<'a> {
    pub input_path: &'a Path,
    pub output_path: &'a Path,
    pub original_size: usize,
    pub final_size: usize,
    pub summary: Summary,
    pub policy: MergePolicy,
    pub changes: &'a VaultChanges,
    pub generated_at: DateTime<Local>,
}

/// The report sits next to the output file with a `.md` extension.
pub fn report_path(output: &Path) -> PathBuf {
    output.with_extension("md")
}

pub fn render_markdown(report: &ReportInput<'_>) -> Result<String, fmt::Error> {
    let mut md = String::new();
    write_summary(&mut md, report)?;
    write_method(&mut md, report.policy)?;
    writeln!(md)?;
    writeln!(
        md,
        "Generated on: {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(md)?;
    writeln!(md, "## Visual diff")?;
    writeln!(md)?;
    writeln!(md, "```diff")?;
    write_diff(&mut md, report.changes)?;
    writeln!(md, "```")?;
    Ok(md)
}

fn write_summary(md: &mut String, report: &ReportInput<'_>) -> fmt::Result {
    let summary = &report.summary;

    writeln!(md, "# Vault Deduplication Summary")?;
    writeln!(md)?;
    writeln!(md, "## Original File")?;
    writeln!(md, "- **Path:** {}", report.input_path.display())?;
    writeln!(md, "- **Size:** {}", format_size(report.original_size))?;
    writeln!(md, "- **Folders:** {}", summary.original_folders)?;
    writeln!(md, "- **Items:** {}", summary.original_records)?;
    writeln!(md)?;
    writeln!(md, "## Deduplicated File")?;
    writeln!(md, "- **Path:** {}", report.output_path.display())?;
    writeln!(md, "- **Size:** {}", format_size(report.final_size))?;
    writeln!(md, "- **Folders:** {}", summary.final_folders)?;
    writeln!(md, "- **Items:** {}", summary.final_records)?;
    writeln!(md)?;
    writeln!(md, "## Results")?;
    writeln!(
        md,
        "- **Folders removed:** {} ({}% reduction)",
        summary.removed_folders(),
        percent(summary.removed_folders(), summary.original_folders)
    )?;
    writeln!(
        md,
        "- **Items removed:** {} ({}% reduction)",
        summary.removed_records(),
        percent(summary.removed_records(), summary.original_records)
    )?;
    let saved = report.original_size as i64 - report.final_size as i64;
    writeln!(
        md,
        "- **Size reduction:** {} bytes ({}%)",
        group_thousands(saved),
        percent_signed(saved, report.original_size)
    )?;
    writeln!(md)
}

fn write_method(md: &mut String, policy: MergePolicy) -> fmt::Result {
    writeln!(md, "## Method")?;
    writeln!(md, "- Folders deduplicated by case-insensitive name")?;
    writeln!(
        md,
        "- Items deduplicated by composite key: name + type + username + URIs"
    )?;
    match policy {
        MergePolicy::LatestWins => writeln!(
            md,
            "- For duplicates, the item with the latest revision date was kept"
        )?,
        MergePolicy::Merge => writeln!(
            md,
            "- Duplicates merged: fields, URIs, collections and password history \
             combined, latest revision preferred"
        )?,
        MergePolicy::KeepAll => writeln!(
            md,
            "- No items collapsed automatically; duplicates were resolved in interactive review"
        )?,
    }
    writeln!(md, "- Folder references remapped to the surviving folder ids")
}

fn write_diff(md: &mut String, changes: &VaultChanges) -> fmt::Result {
    let text = |value: &Option<String>| value.clone().unwrap_or_default();

    for folder in &changes.removed_folders {
        writeln!(
            md,
            "- Folder removed: name='{}' id='{}'",
            text(&folder.name),
            text(&folder.id)
        )?;
    }
    for folder in &changes.added_folders {
        writeln!(
            md,
            "+ Folder added: name='{}' id='{}'",
            text(&folder.name),
            text(&folder.id)
        )?;
    }
    for record in &changes.removed_records {
        writeln!(
            md,
            "- Item removed: id='{}' name='{}' username='{}'",
            text(&record.id),
            text(&record.name),
            record.username().unwrap_or_default()
        )?;
    }
    for record in &changes.added_records {
        writeln!(
            md,
            "+ Item added: id='{}' name='{}' username='{}'",
            text(&record.id),
            text(&record.name),
            record.username().unwrap_or_default()
        )?;
    }
    for remap in &changes.remapped {
        writeln!(
            md,
            "- Remapped item: id='{}' folderId='{}'",
            remap.id,
            text(&remap.from)
        )?;
        writeln!(
            md,
            "+ Remapped item: id='{}' folderId='{}'",
            remap.id,
            text(&remap.to)
        )?;
    }
    Ok(())
}

/// Write the report for a finished run. Returns the report path.
pub fn write_report(report: &ReportInput<'_>) -> anyhow::Result<PathBuf> {
    let path = report_path(report.output_path);
    let markdown = render_markdown(report).context("Failed to render report")?;
    std::fs::write(&path, markdown)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    tracing::info!("Wrote report {}", path.display());
    Ok(path)
}

fn format_size(bytes: usize) -> String {
    format!(
        "{} bytes ({:.2} MB)",
        group_thousands(bytes as i64),
        bytes as f64 / (1024.0 * 1024.0)
    )
}

fn percent(part: usize, whole: usize) -> String {
    percent_signed(part as i64, whole)
}

fn percent_signed(part: i64, whole: usize) -> String {
    if whole == 0 {
        return "0.0".to_string();
    }
    format!("{:.1}", part as f64 * 100.0 / whole as f64)
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if value < 0 {
        grouped.insert(0, '-');
    }
    grouped
}
