//! Operator-driven resolution of duplicate groups.
//!
//! The session keeps two structures: a working list that owns every record,
//! and a snapshot of the duplicate groups that only holds handles into it.
//! Removals are propagated from the working list to the snapshot by handle.

use crate::groups::duplicate_positions;
use crate::merge::merge_records;
use crate::models::Record;

/// One operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    View(String),
    Merge(String),
    Delete(String),
    KeepFirst,
    Skip,
    Previous,
    Quit,
    /// Blank or unrecognised input.
    Invalid(String),
}

impl Command {
    /// Parse a command line such as `m 0,2` or `v 0-3`.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (verb, arg) = match line.split_once(char::is_whitespace) {
            Some((verb, arg)) => (verb, arg.trim().to_string()),
            None => (line, String::new()),
        };

        match verb.to_lowercase().as_str() {
            "v" | "view" => Self::View(arg),
            "m" | "merge" => Self::Merge(arg),
            "d" | "delete" => Self::Delete(arg),
            "k" | "keep" => Self::KeepFirst,
            "s" | "skip" | "n" | "next" => Self::Skip,
            "p" | "prev" | "previous" => Self::Previous,
            "q" | "quit" => Self::Quit,
            _ => Self::Invalid(line.to_string()),
        }
    }
}

/// Parse `0,2,4-6` into sorted, unique, in-bounds indices.
///
/// Ranges may be given in either order and are clamped to `0..len`.
/// Malformed and out-of-bounds tokens are dropped.
pub fn parse_index_set(input: &str, len: usize) -> Vec<usize> {
    let mut indices = Vec::new();

    for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if let Some((start, end)) = token.split_once('-') {
            let (Ok(a), Ok(b)) = (start.trim().parse::<i64>(), end.trim().parse::<i64>()) else {
                continue;
            };
            let low = a.min(b).max(0);
            let high = a.max(b).min(len as i64 - 1);
            indices.extend((low..=high).map(|i| i as usize));
        } else if let Ok(index) = token.parse::<usize>() {
            if index < len {
                indices.push(index);
            }
        }
    }

    indices.sort_unstable();
    indices.dedup();
    indices
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Handle(usize);

#[derive(Debug, Clone)]
struct GroupSnapshot {
    key: String,
    members: Vec<Handle>,
}

/// Where the session is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AtGroup(usize),
    Done,
}

/// Result of applying one command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Selected records, for display. Nothing changed.
    Viewed(Vec<Record>),
    Merged { count: usize, id: Option<String> },
    Deleted { count: usize },
    KeptFirst { removed: usize },
    Skipped,
    MovedBack,
    Quit,
    /// The command's precondition failed; the session did not move.
    Rejected(String),
    Invalid(String),
}

/// The group currently presented to the operator.
#[derive(Debug, Clone)]
pub struct GroupView<'a> {
    pub index: usize,
    pub total: usize,
    pub key: &'a str,
    pub records: Vec<&'a Record>,
}

/// Interactive resolution state machine over a record list.
#[derive(Debug, Clone)]
pub struct ResolverSession {
    working: Vec<(Handle, Record)>,
    groups: Vec<GroupSnapshot>,
    state: SessionState,
}

impl ResolverSession {
    /// Start a session over `records`, grouping them by composite key.
    pub fn new(records: Vec<Record>) -> Self {
        let groups: Vec<GroupSnapshot> = duplicate_positions(&records)
            .into_iter()
            .map(|(key, positions)| GroupSnapshot {
                key,
                members: positions.into_iter().map(Handle).collect(),
            })
            .collect();
        let working = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| (Handle(i), record))
            .collect();
        let state = if groups.is_empty() {
            SessionState::Done
        } else {
            SessionState::AtGroup(0)
        };

        Self {
            working,
            groups,
            state,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Current working list, in order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.working.iter().map(|(_, record)| record)
    }

    /// The group the session is at, or `None` once done.
    pub fn current(&self) -> Option<GroupView<'_>> {
        let SessionState::AtGroup(index) = self.state else {
            return None;
        };
        let group = &self.groups[index];
        Some(GroupView {
            index,
            total: self.groups.len(),
            key: &group.key,
            records: group.members.iter().filter_map(|h| self.lookup(*h)).collect(),
        })
    }

    /// Apply one command to the current group.
    pub fn apply(&mut self, command: &Command) -> Outcome {
        let SessionState::AtGroup(index) = self.state else {
            return Outcome::Rejected("No group left to resolve.".to_string());
        };
        let members = self.groups[index].members.clone();

        match command {
            Command::View(arg) => {
                let selected = parse_index_set(arg, members.len());
                if selected.is_empty() {
                    return Outcome::Rejected("No valid indices to view.".to_string());
                }
                let records = selected
                    .iter()
                    .filter_map(|&i| self.lookup(members[i]).cloned())
                    .collect();
                Outcome::Viewed(records)
            }
            Command::Merge(arg) => {
                let selected: Vec<Handle> = parse_index_set(arg, members.len())
                    .into_iter()
                    .map(|i| members[i])
                    .collect();
                if selected.len() < 2 {
                    return Outcome::Rejected(
                        "Need at least two records to merge (provide two or more indices)."
                            .to_string(),
                    );
                }

                let mut to_merge = selected.iter().filter_map(|h| self.lookup(*h));
                let Some(first) = to_merge.next() else {
                    return Outcome::Rejected("Selected records are no longer present.".to_string());
                };
                let merged =
                    to_merge.fold(first.clone(), |acc, next| merge_records(&acc, Some(next)));
                let id = merged.id.clone();

                if let Some(slot) = self.working.iter_mut().find(|(h, _)| *h == selected[0]) {
                    slot.1 = merged;
                }
                self.remove(&selected[1..]);
                self.advance(index);
                Outcome::Merged {
                    count: selected.len(),
                    id,
                }
            }
            Command::Delete(arg) => {
                let selected: Vec<Handle> = parse_index_set(arg, members.len())
                    .into_iter()
                    .map(|i| members[i])
                    .collect();
                if selected.is_empty() {
                    return Outcome::Rejected("No valid indices to delete.".to_string());
                }

                self.remove(&selected);
                if self.groups[index].members.len() <= 1 {
                    self.advance(index);
                }
                Outcome::Deleted {
                    count: selected.len(),
                }
            }
            Command::KeepFirst => {
                if members.is_empty() {
                    return Outcome::Rejected("Group is empty; nothing to keep.".to_string());
                }
                self.remove(&members[1..]);
                self.advance(index);
                Outcome::KeptFirst {
                    removed: members.len() - 1,
                }
            }
            Command::Skip => {
                self.advance(index);
                Outcome::Skipped
            }
            Command::Previous => {
                self.state = SessionState::AtGroup(index.saturating_sub(1));
                Outcome::MovedBack
            }
            Command::Quit => {
                self.state = SessionState::Done;
                Outcome::Quit
            }
            Command::Invalid(line) => Outcome::Invalid(line.clone()),
        }
    }

    /// End the session and hand back the working list.
    pub fn finish(self) -> Vec<Record> {
        self.working.into_iter().map(|(_, record)| record).collect()
    }

    fn lookup(&self, handle: Handle) -> Option<&Record> {
        self.working
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, record)| record)
    }

    fn remove(&mut self, handles: &[Handle]) {
        self.working.retain(|(h, _)| !handles.contains(h));
        for group in &mut self.groups {
            group.members.retain(|h| !handles.contains(h));
        }
    }

    fn advance(&mut self, from: usize) {
        self.state = if from + 1 < self.groups.len() {
            SessionState::AtGroup(from + 1)
        } else {
            SessionState::Done
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LoginBlock, UriEntry};

    fn record(id: &str, name: &str) -> Record {
        Record {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            kind: 1,
            login: Some(LoginBlock {
                username: Some("user".to_string()),
                uris: vec![UriEntry::new("https://example.com")],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().filter_map(|r| r.id.as_deref()).collect()
    }

    #[test]
    fn test_parse_index_set() {
        assert_eq!(parse_index_set("0,2", 3), vec![0, 2]);
        assert_eq!(parse_index_set("2-0", 3), vec![0, 1, 2]);
        assert_eq!(parse_index_set("1-9", 3), vec![1, 2]);
        assert_eq!(parse_index_set("2, 2, x, -1, 7, 1", 3), vec![1, 2]);
        assert_eq!(parse_index_set("a-b,,", 3), Vec::<usize>::new());
        assert_eq!(parse_index_set("", 3), Vec::<usize>::new());
        assert_eq!(parse_index_set("0-2", 0), Vec::<usize>::new());
    }

    #[test]
    fn test_command_parse() {
        assert_eq!(Command::parse("m 0,2"), Command::Merge("0,2".to_string()));
        assert_eq!(Command::parse("  V   0-1 "), Command::View("0-1".to_string()));
        assert_eq!(Command::parse("k"), Command::KeepFirst);
        assert_eq!(Command::parse("n"), Command::Skip);
        assert_eq!(Command::parse("p"), Command::Previous);
        assert_eq!(Command::parse("q"), Command::Quit);
        assert_eq!(Command::parse(""), Command::Invalid(String::new()));
        assert_eq!(Command::parse("zap 1"), Command::Invalid("zap 1".to_string()));
    }

    #[test]
    fn test_merge_replaces_first_and_removes_others() {
        let mut second = record("2", "Site");
        second.favorite = true;
        let records = vec![record("1", "Site"), second, record("3", "Other")];
        let mut session = ResolverSession::new(records);

        let outcome = session.apply(&Command::parse("m 0,1"));

        assert_eq!(
            outcome,
            Outcome::Merged {
                count: 2,
                id: Some("1".to_string()),
            }
        );
        assert_eq!(session.state(), SessionState::Done);
        let result = session.finish();
        assert_eq!(ids(&result), vec!["1", "3"]);
        assert!(result[0].favorite);
    }

    #[test]
    fn test_merge_needs_two_indices() {
        let mut session = ResolverSession::new(vec![record("1", "Site"), record("2", "Site")]);

        let outcome = session.apply(&Command::parse("m 0,7"));

        assert!(matches!(outcome, Outcome::Rejected(_)));
        assert_eq!(session.state(), SessionState::AtGroup(0));
    }

    #[test]
    fn test_keep_first_removes_others() {
        let mut session = ResolverSession::new(vec![record("1", "Site"), record("2", "Site")]);

        let outcome = session.apply(&Command::KeepFirst);

        assert_eq!(outcome, Outcome::KeptFirst { removed: 1 });
        assert_eq!(ids(&session.finish()), vec!["1"]);
    }

    #[test]
    fn test_skip_leaves_records_unchanged() {
        let mut session = ResolverSession::new(vec![record("1", "Site"), record("2", "Site")]);

        assert_eq!(session.apply(&Command::Skip), Outcome::Skipped);
        assert_eq!(ids(&session.finish()), vec!["1", "2"]);
    }

    #[test]
    fn test_delete_stays_until_one_left() {
        let records = vec![record("1", "Site"), record("2", "Site"), record("3", "Site")];
        let mut session = ResolverSession::new(records);

        assert_eq!(session.apply(&Command::parse("d 2")), Outcome::Deleted { count: 1 });
        assert_eq!(session.state(), SessionState::AtGroup(0));
        assert_eq!(session.current().unwrap().records.len(), 2);

        assert_eq!(session.apply(&Command::parse("d 0")), Outcome::Deleted { count: 1 });
        assert_eq!(session.state(), SessionState::Done);
        assert_eq!(ids(&session.finish()), vec!["2"]);
    }

    #[test]
    fn test_view_does_not_mutate() {
        let mut session = ResolverSession::new(vec![record("1", "Site"), record("2", "Site")]);

        let Outcome::Viewed(viewed) = session.apply(&Command::parse("v 1")) else {
            panic!("expected records to view");
        };

        assert_eq!(ids(&viewed), vec!["2"]);
        assert_eq!(session.state(), SessionState::AtGroup(0));
        assert!(matches!(session.apply(&Command::parse("v")), Outcome::Rejected(_)));
    }

    #[test]
    fn test_previous_is_clamped_and_revisits() {
        let records = vec![
            record("1", "A"),
            record("2", "A"),
            record("3", "B"),
            record("4", "B"),
        ];
        let mut session = ResolverSession::new(records);

        assert_eq!(session.apply(&Command::Previous), Outcome::MovedBack);
        assert_eq!(session.state(), SessionState::AtGroup(0));

        session.apply(&Command::Skip);
        assert_eq!(session.state(), SessionState::AtGroup(1));
        session.apply(&Command::Previous);
        assert_eq!(session.current().unwrap().key, "A|1|user|https://example.com");
    }

    #[test]
    fn test_quit_and_invalid() {
        let records = vec![
            record("1", "A"),
            record("2", "A"),
            record("3", "B"),
            record("4", "B"),
        ];
        let mut session = ResolverSession::new(records);

        assert!(matches!(session.apply(&Command::parse("")), Outcome::Invalid(_)));
        assert_eq!(session.state(), SessionState::AtGroup(0));

        assert_eq!(session.apply(&Command::Quit), Outcome::Quit);
        assert_eq!(session.state(), SessionState::Done);
        assert!(matches!(session.apply(&Command::Skip), Outcome::Rejected(_)));
        assert_eq!(session.finish().len(), 4);
    }

    #[test]
    fn test_no_groups_starts_done() {
        let session = ResolverSession::new(vec![record("1", "A"), record("2", "B")]);
        assert_eq!(session.state(), SessionState::Done);
        assert!(session.current().is_none());
    }
}
