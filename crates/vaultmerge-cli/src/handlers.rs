//! Operator command handling for interactive review.

use crate::ui;
use std::io::{self, BufRead, Write};
use vaultmerge_core::{Command, Outcome, ResolverSession};

/// Drive `session` from `input` until every group is resolved, the operator
/// quits, or input ends. End of input and read failures count as quit; a line
/// that is not UTF-8 is skipped.
pub fn run_session(
    session: &mut ResolverSession,
    input: impl BufRead,
    out: &mut impl Write,
) -> io::Result<()> {
    let mut lines = input.lines();

    while let Some(view) = session.current() {
        ui::print_group(out, &view)?;
        ui::print_commands(out)?;

        let command = match lines.next() {
            Some(Ok(line)) => Command::parse(&line),
            Some(Err(e)) if e.kind() == io::ErrorKind::InvalidData => {
                tracing::warn!("Ignoring unreadable operator input: {}", e);
                writeln!(out, "Could not read command: input is not valid UTF-8")?;
                continue;
            }
            Some(Err(e)) => {
                tracing::warn!("Operator input failed, ending review: {}", e);
                writeln!(out)?;
                Command::Quit
            }
            None => {
                writeln!(out)?;
                Command::Quit
            }
        };

        let outcome = session.apply(&command);
        if handle_outcome(out, outcome)? {
            break;
        }
    }

    writeln!(out, "Interactive review finished.")?;
    Ok(())
}

/// Report an outcome to the operator. Returns true if the session should end.
pub fn handle_outcome(out: &mut impl Write, outcome: Outcome) -> io::Result<bool> {
    match outcome {
        Outcome::Viewed(records) => {
            for record in &records {
                writeln!(out, "{}", ui::record_details(record))?;
                writeln!(out)?;
            }
        }
        Outcome::Merged { count, id } => {
            writeln!(
                out,
                "Merged {} records into id={}",
                count,
                id.as_deref().unwrap_or("<null>")
            )?;
        }
        Outcome::Deleted { count } => writeln!(out, "Deleted {count} records.")?,
        Outcome::KeptFirst { removed } => {
            writeln!(out, "Kept first record, removed {removed} others.")?;
        }
        Outcome::Skipped | Outcome::MovedBack => {}
        Outcome::Quit => return Ok(true),
        Outcome::Rejected(reason) => writeln!(out, "{reason}")?,
        Outcome::Invalid(input) => writeln!(out, "Unknown command: '{}'", input.trim())?,
    }
    Ok(false)
}
