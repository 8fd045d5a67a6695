//! BibTeX format data structures.
//!
//! This module defines the intermediate data produced by the parser before it
//! becomes a [`Record`].

use crate::record::{FieldStore, Record};

/// Structured raw data from one BibTeX entry.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawBibEntry {
    /// Entry type, lowercased
    pub(crate) entry_type: String,
    /// Citation key as written in the input
    pub(crate) cite_key: Option<String>,
    /// Field name/value pairs in input order, names lowercased
    pub(crate) fields: Vec<(String, String)>,
    /// The text the entry was parsed from
    pub(crate) raw: String,
}

impl From<RawBibEntry> for Record {
    fn from(
        RawBibEntry {
            entry_type,
            cite_key,
            fields,
            raw,
        }: RawBibEntry,
    ) -> Self {
        let fields: FieldStore = fields.into_iter().collect();
        let mut record = Record::new(&entry_type, fields).with_raw(raw);
        record.input_key = cite_key;
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_entry_into_record() {
        let raw = RawBibEntry {
            entry_type: "inproceedings".to_string(),
            cite_key: Some("doe99".to_string()),
            fields: vec![
                ("title".to_string(), "On Things".to_string()),
                ("ID".to_string(), "shadow".to_string()),
            ],
            raw: "@inproceedings{doe99, title = {On Things}}".to_string(),
        };

        let record: Record = raw.into();

        assert_eq!(record.entry_type, "inproceedings");
        assert_eq!(record.input_key.as_deref(), Some("doe99"));
        assert_eq!(record.key, None);
        assert_eq!(record.fields.get("title"), Some("On Things"));
        assert!(!record.fields.contains("id"));
        assert!(record.raw.starts_with("@inproceedings"));
        assert!(record.search_successes.is_empty());
    }
}
