//! Console rendering with crossterm colors.

use crate::report::VaultChanges;
use crossterm::style::Stylize;
use std::io::{self, Write};
use vaultmerge_core::{DedupEvent, DiagnosticsSink, GroupView, Record, Summary};

/// One line of a before/after comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLine {
    Removed(String),
    Added(String),
    Same(String),
}

/// Flat `Label: value` lines describing a record.
pub fn record_lines(record: &Record) -> Vec<String> {
    let mut lines = vec![
        format!("Id: {}", record.id.as_deref().unwrap_or("<null>")),
        format!("Name: {}", record.name.as_deref().unwrap_or("<null>")),
        format!("FolderId: {}", record.folder_id.as_deref().unwrap_or("<null>")),
        format!("Type: {}", record.kind),
        format!("Favorite: {}", record.favorite),
        format!(
            "Notes: {}",
            record
                .notes
                .as_deref()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or("<empty>")
        ),
        format!("Username: {}", record.username().unwrap_or("<null>")),
    ];

    let uris: Vec<&str> = record.uris().collect();
    if uris.is_empty() {
        lines.push("URIs: <none>".to_string());
    } else {
        lines.extend(uris.iter().map(|u| format!("URI: {u}")));
    }

    if record.fields.is_empty() {
        lines.push("Fields: <none>".to_string());
    } else {
        lines.extend(record.fields.iter().map(|f| {
            format!(
                "Field: {}={} (type {})",
                f.name.as_deref().unwrap_or_default(),
                f.value.as_deref().unwrap_or_default(),
                f.kind
            )
        }));
    }

    lines
}

/// Multi-line detail view of a record.
pub fn record_details(record: &Record) -> String {
    record_lines(record).join("\n")
}

/// Lines of `before` first, then lines only in `after`, each tagged.
pub fn diff_records(before: &Record, after: &Record) -> Vec<DiffLine> {
    let old = record_lines(before);
    let new = record_lines(after);

    let mut ordered: Vec<&String> = Vec::new();
    for line in old.iter().chain(new.iter()) {
        if !ordered.contains(&line) {
            ordered.push(line);
        }
    }

    ordered
        .into_iter()
        .map(|line| match (old.contains(line), new.contains(line)) {
            (true, false) => DiffLine::Removed(line.clone()),
            (false, true) => DiffLine::Added(line.clone()),
            _ => DiffLine::Same(line.clone()),
        })
        .collect()
}

pub fn print_summary(out: &mut impl Write, summary: &Summary) -> io::Result<()> {
    writeln!(
        out,
        "Result: original folders={}, deduplicated folders={} (removed {})",
        summary.original_folders,
        summary.final_folders,
        summary.removed_folders()
    )?;
    writeln!(
        out,
        "Result: original items={}, deduplicated items={} (removed {})",
        summary.original_records,
        summary.final_records,
        summary.removed_records()
    )
}

/// Colored before/after view of a whole run.
pub fn print_changes(out: &mut impl Write, changes: &VaultChanges) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Visual diff of changes (removed = red, added = green):")?;

    if changes.removed_folders.is_empty() && changes.added_folders.is_empty() {
        writeln!(out, "  No folder additions or removals")?;
    }
    for folder in &changes.removed_folders {
        writeln!(
            out,
            "{}",
            format!(
                "- Folder removed: name='{}' id='{}'",
                folder.name.as_deref().unwrap_or_default(),
                folder.id.as_deref().unwrap_or_default()
            )
            .red()
        )?;
    }
    for folder in &changes.added_folders {
        writeln!(
            out,
            "{}",
            format!(
                "+ Folder added:   name='{}' id='{}'",
                folder.name.as_deref().unwrap_or_default(),
                folder.id.as_deref().unwrap_or_default()
            )
            .green()
        )?;
    }
    writeln!(out)?;

    if changes.removed_records.is_empty() && changes.added_records.is_empty() {
        writeln!(out, "  No item additions or removals")?;
    }
    for record in &changes.removed_records {
        let line = format!("- Item removed:   {}", record_brief(record));
        writeln!(out, "{}", line.red())?;
    }
    for record in &changes.added_records {
        let line = format!("+ Item added:     {}", record_brief(record));
        writeln!(out, "{}", line.green())?;
    }
    writeln!(out)?;

    if changes.remapped.is_empty() {
        writeln!(out, "  No folder remappings detected")?;
    }
    for remap in &changes.remapped {
        let before = format!(
            "- Remapped item: id='{}' folderId='{}'",
            remap.id,
            or_null(&remap.from)
        );
        let after = format!(
            "+ Remapped item: id='{}' folderId='{}'",
            remap.id,
            or_null(&remap.to)
        );
        writeln!(out, "{}", before.red())?;
        writeln!(out, "{}", after.green())?;
    }
    writeln!(out)
}

pub fn print_group(out: &mut impl Write, view: &GroupView<'_>) -> io::Result<()> {
    writeln!(out, "{}", "-".repeat(60))?;
    writeln!(
        out,
        "Group {}/{} key: {} (count={})",
        view.index + 1,
        view.total,
        view.key,
        view.records.len()
    )?;
    for (i, record) in view.records.iter().enumerate() {
        let uris: Vec<&str> = record.uris().collect();
        writeln!(
            out,
            "[{}] id={} name={} username={} uris={}",
            i,
            record.id.as_deref().unwrap_or_default(),
            record.name.as_deref().unwrap_or_default(),
            record.username().unwrap_or_default(),
            uris.join(", ")
        )?;
    }
    writeln!(out)
}

pub fn print_commands(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Commands:")?;
    writeln!(out, "  v <idx|list>   View record details (e.g. v 0, v 0-2)")?;
    writeln!(out, "  m <list>       Merge selected records (two or more indices)")?;
    writeln!(out, "  d <list>       Delete selected records from the vault")?;
    writeln!(out, "  k              Keep first record in group (remove others)")?;
    writeln!(out, "  s or n         Skip to next group")?;
    writeln!(out, "  p              Go to previous group")?;
    writeln!(out, "  q              Quit interactive mode")?;
    write!(out, "Enter command: ")?;
    out.flush()
}

fn record_brief(record: &Record) -> String {
    format!(
        "id='{}' name='{}' username='{}'",
        record.id.as_deref().unwrap_or_default(),
        record.name.as_deref().unwrap_or_default(),
        record.username().unwrap_or_default()
    )
}

fn or_null(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("<null>")
}

/// Renders engine events as colored console lines.
pub struct ConsoleSink<W: Write> {
    out: W,
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn write_event(&mut self, event: &DedupEvent) -> io::Result<()> {
        let out = &mut self.out;
        match event {
            DedupEvent::FolderKept { name, id } => {
                writeln!(out, "Keeping folder name='{}' id='{}'", name, or_null(id))
            }
            DedupEvent::FolderMapped { name, from, to } => writeln!(
                out,
                "Duplicate folder name='{}': mapping id '{}' -> '{}'",
                name, from, to
            ),
            DedupEvent::FolderUnmapped { name, id } => writeln!(
                out,
                "Duplicate folder name='{}' found (id missing on one side); cannot remap id '{}'",
                name,
                or_null(id)
            ),
            DedupEvent::FolderDropped { id } => {
                writeln!(out, "Dropping folder with blank name id='{}'", or_null(id))
            }
            DedupEvent::RecordSkipped { id } => writeln!(
                out,
                "Skipping item id='{}' because composite key is empty.",
                or_null(id)
            ),
            DedupEvent::RecordKept { key, id, name } => writeln!(
                out,
                "Keeping item key='{}' id='{}' name='{}'",
                key,
                or_null(id),
                or_null(name)
            ),
            DedupEvent::RecordDiscarded { key, kept, discarded } => {
                writeln!(
                    out,
                    "Duplicate detected for key='{}': keeping id='{}'",
                    key,
                    or_null(&kept.id)
                )?;
                let line = format!("- Item removed: {}", record_brief(discarded));
                writeln!(out, "{}", line.red())
            }
            DedupEvent::RecordMerged {
                key,
                primary_id,
                secondary_id,
                before,
                after,
            } => {
                writeln!(
                    out,
                    "Merging duplicate item for key='{}': latest id='{}', older id='{}'",
                    key,
                    or_null(primary_id),
                    or_null(secondary_id)
                )?;
                for line in diff_records(before, after) {
                    match line {
                        DiffLine::Removed(text) => writeln!(out, "{}", format!("- {text}").red())?,
                        DiffLine::Added(text) => writeln!(out, "{}", format!("+ {text}").green())?,
                        DiffLine::Same(text) => writeln!(out, "  {text}")?,
                    }
                }
                writeln!(out)
            }
            DedupEvent::RecordRemapped { id, from, to } => {
                let before = format!(
                    "- Remapped item (before): id='{}' folderId='{}'",
                    or_null(id),
                    from
                );
                let after = format!(
                    "+ Remapped item (after):  id='{}' folderId='{}'",
                    or_null(id),
                    to
                );
                writeln!(out, "{}", before.red())?;
                writeln!(out, "{}", after.green())
            }
        }
    }
}

impl<W: Write> DiagnosticsSink for ConsoleSink<W> {
    fn emit(&mut self, event: &DedupEvent) {
        if let Err(e) = self.write_event(event) {
            tracing::warn!("Failed to write diagnostic output: {}", e);
        }
    }
}
