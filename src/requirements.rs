//! Required fields per entry type.

use crate::record::Record;
use crate::{BibError, Result};

const REQUIRED_FIELDS: &[(&str, &[&str])] = &[
    (
        "article",
        &["author", "year", "title", "journal", "volume", "number", "pages"],
    ),
    ("book", &["author", "year", "title", "publisher", "address"]),
    ("inproceedings", &["author", "year", "title", "booktitle"]),
    ("techreport", &["author", "year", "title"]),
    ("incollection", &["author", "year", "title"]),
    ("misc", &["author", "year", "title"]),
];

/// Result of checking a record against its entry type's required fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completeness {
    /// Required fields the record lacks, in table order
    pub missing: Vec<&'static str>,
}

impl Completeness {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Required fields for an entry type, ignoring case.
pub fn required_fields(entry_type: &str) -> Option<&'static [&'static str]> {
    REQUIRED_FIELDS
        .iter()
        .find(|(kind, _)| kind.eq_ignore_ascii_case(entry_type.trim()))
        .map(|(_, fields)| *fields)
}

/// Checks that a record has every field its entry type requires.
///
/// # Errors
///
/// Returns `BibError::UnknownEntryType` if the entry type is not in the table.
pub fn verify(record: &Record) -> Result<Completeness> {
    let required = required_fields(&record.entry_type)
        .ok_or_else(|| BibError::UnknownEntryType(record.entry_type.clone()))?;

    let missing = required
        .iter()
        .copied()
        .filter(|field| !record.fields.contains(field))
        .collect();

    Ok(Completeness { missing })
}
