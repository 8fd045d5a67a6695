//! Record deduplicator implementation.
//!
//! Two records are duplicates when they have the same canonical key and the
//! same `doi` value, where two records without a `doi` also count as equal:
//!
//! | key   | doi                    | duplicate? |
//! |-------|------------------------|------------|
//! | equal | both absent            | yes        |
//! | equal | both present and equal | yes        |
//! | equal | differ, or one absent  | no         |
//! | differ| anything               | no         |
//!
//! Equal keys without DOIs are therefore merged even when they describe
//! different works that happen to share authors and year.
//!
//! ## Usage
//!
//! ```rust
//! use bibshorts::{dedupe::Deduplicator, FieldStore, Record};
//!
//! let paper = |doi: &str| {
//!     let fields: FieldStore = [("doi", doi)].into_iter().collect();
//!     Record::new("article", fields).with_key("Smith_only.2020")
//! };
//! let mut records = vec![paper("10.1/a"), paper("10.1/a"), paper("10.1/b")];
//!
//! let removed = Deduplicator::new().remove_duplicates(&mut records);
//! assert_eq!(removed.len(), 1);
//! assert_eq!(records.len(), 2);
//! ```

use crate::record::Record;
use std::collections::HashMap;

/// Configuration options for the deduplication scan.
#[derive(Debug, Default, Clone)]
pub struct DeduplicatorConfig {
    /// Look up earlier records through a `(key, doi)` index instead of
    /// comparing against every earlier record.
    /// Produces the same result; worthwhile for large collections.
    pub use_index: bool,
}

/// A surviving record and the later records found equal to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// Position of the record that is kept
    pub unique: usize,
    /// Positions of the records dropped in its favour, ascending
    pub duplicates: Vec<usize>,
}

/// Stable, order-preserving duplicate elimination.
///
/// Records are scanned in order; each one is compared against the records
/// kept before it and dropped on the first match.
///
/// # Performance
///
/// - Time complexity: O(n²) with the default scan
/// - O(n) expected with `use_index`
#[derive(Debug, Default, Clone)]
pub struct Deduplicator {
    config: DeduplicatorConfig,
}

/// Whether two records are duplicates of each other.
///
/// Records without a key are never duplicates.
pub fn is_duplicate(a: &Record, b: &Record) -> bool {
    match (&a.key, &b.key) {
        (Some(key_a), Some(key_b)) => key_a == key_b && a.doi() == b.doi(),
        _ => false,
    }
}

impl Deduplicator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(mut self, config: DeduplicatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Groups records by the first earlier record each one duplicates.
    ///
    /// Every record appears in exactly one group, either as `unique` or in
    /// `duplicates`. Groups are ordered by the position of their unique record.
    pub fn find_duplicates(&self, records: &[Record]) -> Vec<DuplicateGroup> {
        let mut groups: Vec<DuplicateGroup> = Vec::new();

        if self.config.use_index {
            let mut index: HashMap<(&str, Option<&str>), usize> = HashMap::new();
            for (i, record) in records.iter().enumerate() {
                let Some(key) = record.key.as_deref() else {
                    groups.push(DuplicateGroup::single(i));
                    continue;
                };
                match index.get(&(key, record.doi())) {
                    Some(&group) => groups[group].duplicates.push(i),
                    None => {
                        index.insert((key, record.doi()), groups.len());
                        groups.push(DuplicateGroup::single(i));
                    }
                }
            }
        } else {
            for (i, record) in records.iter().enumerate() {
                match groups
                    .iter_mut()
                    .find(|group| is_duplicate(&records[group.unique], record))
                {
                    Some(group) => group.duplicates.push(i),
                    None => groups.push(DuplicateGroup::single(i)),
                }
            }
        }

        groups
    }

    /// Drops every record that duplicates an earlier one.
    ///
    /// Survivors keep their relative order. Returns the dropped records in
    /// their original order.
    pub fn remove_duplicates(&self, records: &mut Vec<Record>) -> Vec<Record> {
        let mut dropped_at = vec![false; records.len()];
        for group in self.find_duplicates(records) {
            for i in group.duplicates {
                dropped_at[i] = true;
            }
        }

        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(records.len());
        for (record, dropped) in records.drain(..).zip(dropped_at) {
            if dropped {
                removed.push(record);
            } else {
                kept.push(record);
            }
        }
        *records = kept;
        removed
    }
}

impl DuplicateGroup {
    fn single(unique: usize) -> Self {
        Self {
            unique,
            duplicates: Vec::new(),
        }
    }
}
