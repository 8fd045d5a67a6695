//! A library for building deduplicated, consistently-keyed BibTeX bibliographies.
//!
//! `bibshorts` takes partial BibTeX records, fills in their missing fields from
//! external reference sources, assigns every record a canonical citation key,
//! removes duplicates and writes the collection back out in a stable order.
//!
//! # Key Features
//!
//! - **Enrichment** from an ordered list of sources:
//!   - `dx-doi` (content negotiation on the DOI resolver)
//!   - `google-scholar` (DOI used as search query)
//!   - `isbn` (Open Library book lookup)
//!
//!   Each source either overwrites existing fields or only fills gaps, and a
//!   failing source never stops the ones after it.
//!
//! - **Canonical keys** of the form `Surname1_Surname2.Year`, with `only` for
//!   single-author works and `0000` for undated ones.
//!
//! - **Deduplication and ordering**: records sharing key and DOI are merged,
//!   colliding keys of distinct works get an `a`, `b`, ... suffix, and the
//!   output is sorted by first author, second author and year.
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! use bibshorts::{Collection, Enricher, HttpTransport};
//!
//! let input = r#"@article{smith2020,
//!   author = {Smith, J. and Doe, A.},
//!   title = {An Example},
//!   year = {2020},
//!   doi = {10.1000/example}
//! }"#;
//!
//! let enricher = Enricher::new(HttpTransport::new().unwrap());
//! let mut collection = Collection::new();
//! collection.ingest(input, &enricher);
//!
//! let warnings = collection.finalize();
//! println!("{}", collection.to_bibtex());
//! println!("{} incomplete records", warnings.len());
//! ```
//!
//! # Parsing Without Enrichment
//!
//! ```rust
//! use bibshorts::{BibtexParser, RecordParser};
//!
//! let records = BibtexParser::new()
//!     .parse("@book{x, author = {Knuth, Donald}, year = 1968}")
//!     .unwrap();
//! assert_eq!(records[0].entry_type, "book");
//! assert_eq!(records[0].fields.get("Author"), Some("Knuth, Donald"));
//! ```
//!
//! # Error Handling
//!
//! Operations that can fail for a whole record return [`Result`], which wraps
//! [`BibError`]. Failures of individual sources during enrichment are reported
//! as [`SourceError`] values inside [`SourceAttempt`]s and never abort a record.
//!
//! # Logging
//!
//! The crate logs through [`tracing`] and never installs a subscriber itself.

use thiserror::Error;

pub mod bibtex;
pub mod collection;
pub mod dedupe;
pub mod enrich;
pub mod input;
pub mod key;
pub mod record;
pub mod requirements;
pub mod sources;
mod regex;
mod utils;

// Reexports
pub use bibtex::BibtexParser;
pub use collection::{Collection, CollectionConfig, CompletenessWarning, KeylessPolicy};
pub use enrich::{Enricher, SourceAttempt};
pub use input::read_inputs;
pub use key::{KeyParts, assign_key};
pub use record::{FieldStore, Record};
pub use requirements::{Completeness, verify};
#[cfg(feature = "http")]
pub use sources::HttpTransport;
pub use sources::{Response, Source, SourceDescriptor, SourceError, Transport};

/// A specialized Result type for bibliography operations.
pub type Result<T> = std::result::Result<T, BibError>;

/// Errors that affect a whole record or a whole input.
#[derive(Error, Debug)]
pub enum BibError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed record: {message} at line {line}")]
    MalformedRecord { message: String, line: usize },

    #[error("No author names found: {0}")]
    NoAuthor(String),

    #[error("Unknown entry type: {0}")]
    UnknownEntryType(String),

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Export error: {0}")]
    Export(String),
}

impl From<csv::Error> for BibError {
    fn from(err: csv::Error) -> Self {
        BibError::Export(err.to_string())
    }
}

/// Trait for turning raw bibliography text into records.
pub trait RecordParser {
    /// Parse a string containing one or more entries.
    ///
    /// # Errors
    ///
    /// Returns `BibError::MalformedRecord` if any entry cannot be parsed.
    fn parse(&self, input: &str) -> Result<Vec<Record>>;
}
