//! BibTeX format reader and writer.
//!
//! # Example
//!
//! ```
//! use bibshorts::{BibtexParser, RecordParser};
//!
//! let input = r#"@article{smith2020,
//!   author = {Smith, J. and Doe, A.},
//!   title = {Example Title},
//!   year = {2020}
//! }"#;
//!
//! let records = BibtexParser::new().parse(input).unwrap();
//! assert_eq!(records[0].fields.get("title"), Some("Example Title"));
//! assert_eq!(records[0].input_key.as_deref(), Some("smith2020"));
//! ```

mod format;
mod parse;
mod structure;

use crate::{Record, RecordParser, Result};

pub use format::{format_entries, format_entry};

/// Parser for BibTeX formatted records.
///
/// Field names are lowercased, values lose their outer braces or quotes and
/// have their whitespace collapsed. `@comment`, `@preamble` and `@string`
/// blocks are skipped.
#[derive(Debug, Clone, Default)]
pub struct BibtexParser;

impl BibtexParser {
    /// Creates a new BibTeX parser instance.
    ///
    /// # Examples
    ///
    /// ```
    /// use bibshorts::BibtexParser;
    /// let parser = BibtexParser::new();
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Parses every entry of `input` independently.
    ///
    /// Unlike [`RecordParser::parse`], a malformed entry does not hide the
    /// others: each entry gets its own result, in input order.
    pub fn parse_each(&self, input: &str) -> Vec<Result<Record>> {
        parse::split_entries(input)
            .into_iter()
            .map(|block| parse::parse_entry(block.text, block.line).map(Record::from))
            .collect()
    }

    /// Parses the first entry found in `input`.
    ///
    /// # Errors
    ///
    /// Returns `BibError::MalformedRecord` if there is no entry or the first
    /// one cannot be parsed.
    pub fn parse_first(&self, input: &str) -> Result<Record> {
        let block = parse::split_entries(input).into_iter().next().ok_or_else(|| {
            crate::BibError::MalformedRecord {
                message: "no entry found".to_string(),
                line: 1,
            }
        })?;
        parse::parse_entry(block.text, block.line).map(Record::from)
    }
}

impl RecordParser for BibtexParser {
    /// Parses a string containing one or more BibTeX entries.
    ///
    /// # Errors
    ///
    /// Returns `BibError::MalformedRecord` if any entry is malformed
    fn parse(&self, input: &str) -> Result<Vec<Record>> {
        self.parse_each(input).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BibError;
    use pretty_assertions::assert_eq;

    const TWO_ENTRIES: &str = r#"@article{a,
  author = {Smith, J.},
  year = {2020}
}

@book{b,
  author = {Doe, A.},
  title = {A Book}
}
"#;

    #[test]
    fn test_parse_multiple_entries() {
        let records = BibtexParser::new().parse(TWO_ENTRIES).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].entry_type, "article");
        assert_eq!(records[1].entry_type, "book");
        assert_eq!(records[1].fields.get("title"), Some("A Book"));
    }

    #[test]
    fn test_parse_fails_on_any_malformed_entry() {
        let input = format!("{TWO_ENTRIES}\n@misc{{broken, title = }}\n");
        let result = BibtexParser::new().parse(&input);
        assert!(matches!(result, Err(BibError::MalformedRecord { .. })));
    }

    #[test]
    fn test_parse_each_isolates_failures() {
        let input = format!("@misc{{broken, title = }}\n{TWO_ENTRIES}");
        let results = BibtexParser::new().parse_each(&input);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_err());
        assert!(results[1].is_ok());
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_parse_entries_sharing_a_line() {
        let input = "@misc{a, author = {Adams, A.}, year = 2001} @misc{b, author = {Baker, B.}, year = 2002}\n";
        let records = BibtexParser::new().parse(input).unwrap();
        assert_eq!(
            records.iter().map(|r| r.input_key.as_deref()).collect::<Vec<_>>(),
            vec![Some("a"), Some("b")]
        );
        assert_eq!(records[1].fields.get("author"), Some("Baker, B."));
    }

    #[test]
    fn test_parse_value_with_line_starting_at_sign() {
        let input = "@misc{k,\n  author = {Adams, A.},\n  abstract = {Handles like\n@user are common},\n}\n";
        let records = BibtexParser::new().parse(input).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].fields.get("abstract"),
            Some("Handles like @user are common")
        );
    }

    #[test]
    fn test_parse_first() {
        let record = BibtexParser::new()
            .parse_first(" @article{x, doi = {10.1000/a}}")
            .unwrap();
        assert_eq!(record.doi(), Some("10.1000/a"));

        assert!(BibtexParser::new().parse_first("<html>not found</html>").is_err());
    }

    #[test]
    fn test_round_trip_through_format() {
        let input = r#"@Article{orig,
  Author = {M{\"u}ller, K. and {van Dyke}, D.},
  Title = "Quantum {Stuff}: a
     review",
  year = 2019,
  doi = {10.1000/XYZ},
}"#;
        let parser = BibtexParser::new();
        let original = parser.parse_first(input).unwrap().with_key("Muller_vanDyke.2019");

        let reparsed = parser.parse_first(&format_entry(&original)).unwrap();

        assert_eq!(reparsed.entry_type, original.entry_type);
        assert_eq!(reparsed.input_key.as_deref(), Some("Muller_vanDyke.2019"));
        assert_eq!(reparsed.fields, original.fields);
    }
}
