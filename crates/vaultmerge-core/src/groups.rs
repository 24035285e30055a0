//! Duplicate-group query over a record list.

use crate::key::composite_key;
use crate::models::Record;
use std::collections::HashMap;

/// Records sharing one composite key. Only valid for the list it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateGroup {
    pub key: String,
    pub records: Vec<Record>,
}

/// Group records by composite key, keeping only keys seen at least twice.
///
/// Groups are ordered by the first appearance of their key; records keep their
/// list order. Records with an empty key never group.
pub fn find_duplicate_groups(records: &[Record]) -> Vec<DuplicateGroup> {
    duplicate_positions(records)
        .into_iter()
        .map(|(key, positions)| DuplicateGroup {
            key,
            records: positions.into_iter().map(|i| records[i].clone()).collect(),
        })
        .collect()
}

/// Same grouping as [`find_duplicate_groups`], as positions into `records`.
pub fn duplicate_positions(records: &[Record]) -> Vec<(String, Vec<usize>)> {
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for (position, record) in records.iter().enumerate() {
        let key = composite_key(record);
        if key.is_empty() {
            continue;
        }
        match by_key.get(&key) {
            Some(&group) => groups[group].1.push(position),
            None => {
                by_key.insert(key.clone(), groups.len());
                groups.push((key, vec![position]));
            }
        }
    }

    groups.retain(|(_, positions)| positions.len() > 1);
    groups
}
