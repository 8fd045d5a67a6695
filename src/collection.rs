//! The bibliography collection.
//!
//! A [`Collection`] turns raw BibTeX text into enriched, keyed records and
//! owns them until they are written out:
//!
//! 1. each entry is parsed, enriched from the configured sources and given
//!    its canonical key ([`Collection::ingest`]),
//! 2. keyed records are inserted in input order, with colliding keys of
//!    distinct works disambiguated by a letter suffix ([`Collection::insert`]),
//! 3. [`Collection::finalize`] removes duplicates, sorts by key and reports
//!    incomplete records,
//! 4. [`Collection::to_bibtex`] and [`Collection::export_summary`] render the
//!    result.
//!
//! ```rust
//! use bibshorts::{Collection, FieldStore, Record};
//!
//! let mut collection = Collection::new();
//! for doi in ["10.1/a", "10.1/b", "10.1/a"] {
//!     let fields: FieldStore = [("author", "Smith, J."), ("year", "2020"), ("doi", doi)]
//!         .into_iter()
//!         .collect();
//!     collection.insert(Record::new("misc", fields)).unwrap();
//! }
//!
//! assert_eq!(collection.keys(), vec!["Smith_only.2020", "Smith_only.2020a", "Smith_only.2020"]);
//! assert_eq!(collection.dedup(), 1);
//! ```

use crate::bibtex::{BibtexParser, format_entries};
use crate::dedupe::{Deduplicator, DeduplicatorConfig, is_duplicate};
use crate::enrich::Enricher;
use crate::key::{assign_key, compare_keys};
use crate::record::Record;
use crate::requirements::verify;
use crate::sources::{Source, SourceDescriptor};
use crate::{BibError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// Placeholder written to the summary for absent fields.
const MISSING: &str = "MISSING";

const SUMMARY_FIELDS: [&str; 3] = ["author", "year", "title"];

/// Collections at least this large are deduplicated through a key index.
const INDEXED_DEDUP_THRESHOLD: usize = 256;

/// What to do with a record whose canonical key cannot be derived.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeylessPolicy {
    /// Skip the record
    #[default]
    Drop,
    /// Keep the record under the citation key written in its input, if any
    KeepInputKey,
}

/// Configuration for building a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Sources consulted for every ingested record, in precedence order
    pub sources: Vec<SourceDescriptor>,
    /// Enrich records on the rayon thread pool (needs the `parallel` feature)
    pub run_in_parallel: bool,
    pub keyless_policy: KeylessPolicy,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            sources: vec![
                SourceDescriptor::new(Source::DxDoi, false),
                SourceDescriptor::new(Source::GoogleScholar, false),
            ],
            run_in_parallel: false,
            keyless_policy: KeylessPolicy::Drop,
        }
    }
}

impl CollectionConfig {
    #[must_use]
    pub fn with_sources(mut self, sources: Vec<SourceDescriptor>) -> Self {
        self.sources = sources;
        self
    }

    #[must_use]
    pub fn with_parallel(mut self, run_in_parallel: bool) -> Self {
        self.run_in_parallel = run_in_parallel;
        self
    }

    #[must_use]
    pub fn with_keyless_policy(mut self, policy: KeylessPolicy) -> Self {
        self.keyless_policy = policy;
        self
    }
}

/// A record that failed the completeness check at finalize time.
///
/// Informational only: the record is still written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletenessWarning {
    /// Required fields of the entry type are absent
    MissingFields {
        key: String,
        missing: Vec<&'static str>,
    },
    /// The entry type has no required-field table
    UnknownEntryType { key: String, entry_type: String },
}

impl CompletenessWarning {
    pub fn key(&self) -> &str {
        match self {
            CompletenessWarning::MissingFields { key, .. }
            | CompletenessWarning::UnknownEntryType { key, .. } => key,
        }
    }
}

impl fmt::Display for CompletenessWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletenessWarning::MissingFields { key, missing } => {
                write!(f, "{} is missing {}", key, missing.join(", "))
            }
            CompletenessWarning::UnknownEntryType { key, entry_type } => {
                write!(f, "{} has unknown entry type @{}", key, entry_type)
            }
        }
    }
}

/// An ordered set of keyed records.
#[derive(Debug, Default, Clone)]
pub struct Collection {
    config: CollectionConfig,
    records: Vec<Record>,
    parser: BibtexParser,
}

impl Collection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(mut self, config: CollectionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    /// Parses, enriches, keys and inserts every entry in `text`.
    ///
    /// Returns the number of records inserted. Malformed entries and entries
    /// that cannot be keyed are logged and skipped.
    pub fn ingest(&mut self, text: &str, enricher: &Enricher) -> usize {
        self.ingest_batch([text], enricher)
    }

    /// Ingests several raw texts as one batch.
    ///
    /// Records are inserted in input order, also when enrichment runs in
    /// parallel.
    pub fn ingest_batch<I, S>(&mut self, inputs: I, enricher: &Enricher) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = Vec::new();
        for input in inputs {
            for result in self.parser.parse_each(input.as_ref()) {
                match result {
                    Ok(record) => parsed.push(record),
                    Err(e) => warn!("Skipping record: {}", e),
                }
            }
        }
        let total = parsed.len();

        let prepared = self.prepare_all(parsed, enricher);

        let mut inserted = 0;
        for record in prepared.into_iter().flatten() {
            if let Err(e) = self.insert(record) {
                warn!("Skipping record: {}", e);
                continue;
            }
            inserted += 1;
        }

        info!("Ingested {} of {} record(s)", inserted, total);
        inserted
    }

    fn prepare_all(&self, records: Vec<Record>, enricher: &Enricher) -> Vec<Option<Record>> {
        #[cfg(feature = "parallel")]
        if self.config.run_in_parallel {
            use rayon::prelude::*;
            return records
                .into_par_iter()
                .map(|record| self.prepare(record, enricher))
                .collect();
        }

        records
            .into_iter()
            .map(|record| self.prepare(record, enricher))
            .collect()
    }

    /// Enriches a record and assigns its key; `None` if it must be dropped.
    fn prepare(&self, mut record: Record, enricher: &Enricher) -> Option<Record> {
        enricher.enrich(&mut record, &self.config.sources);

        match assign_key(&record) {
            Ok(key) => record.key = Some(key),
            Err(e) => match (self.config.keyless_policy, record.input_key.clone()) {
                (KeylessPolicy::KeepInputKey, Some(input_key)) => {
                    warn!("{}; keeping input key {}", e, input_key);
                    record.key = Some(input_key);
                }
                _ => {
                    warn!("Dropping record: {}", e);
                    return None;
                }
            },
        }
        Some(record)
    }

    /// Appends a record, returning the key it was stored under.
    ///
    /// A record without a key is keyed first. If another work already holds
    /// the key, the first free key among `key` + `a`, `b`, ..., `z`, `aa`, ...
    /// is used instead. A member that duplicates the record does not block
    /// its key, so the pair is still found by [`Collection::dedup`].
    ///
    /// # Errors
    ///
    /// Returns `BibError::NoAuthor` if the record has no key and none can be
    /// derived.
    pub fn insert(&mut self, mut record: Record) -> Result<String> {
        let base = match record.key.take() {
            Some(key) => key,
            None => assign_key(&record)?,
        };

        for candidate in (0..).map(|n| format!("{}{}", base, collision_suffix(n))) {
            record.key = Some(candidate);
            let blocked = self
                .records
                .iter()
                .any(|member| member.key == record.key && !is_duplicate(member, &record));
            if !blocked {
                break;
            }
        }

        let key = record.key_or_empty().to_string();
        self.records.push(record);
        Ok(key)
    }

    /// Removes every record that duplicates an earlier one.
    ///
    /// Returns the number of records removed. Applying it again removes
    /// nothing.
    pub fn dedup(&mut self) -> usize {
        let config = DeduplicatorConfig {
            use_index: self.records.len() >= INDEXED_DEDUP_THRESHOLD,
        };
        let removed = Deduplicator::new()
            .with_config(config)
            .remove_duplicates(&mut self.records);
        for record in &removed {
            info!("Removed duplicate {}", record.key_or_empty());
        }
        removed.len()
    }

    /// Stable sort by first author, second author and year.
    pub fn sort(&mut self) {
        self.records
            .sort_by(|a, b| compare_keys(a.key_or_empty(), b.key_or_empty()));
    }

    /// Deduplicates, sorts and checks every record for completeness.
    pub fn finalize(&mut self) -> Vec<CompletenessWarning> {
        let removed = self.dedup();
        self.sort();
        info!(
            "Finalized {} record(s), {} duplicate(s) removed",
            self.records.len(),
            removed
        );

        let warnings: Vec<CompletenessWarning> =
            self.records.iter().filter_map(completeness_warning).collect();
        for warning in &warnings {
            warn!("{}", warning);
        }
        warnings
    }

    /// Renders the records as BibTeX, in their current order.
    pub fn to_bibtex(&self) -> String {
        format_entries(&self.records)
    }

    /// One `key;author;year;title` line per record, in their current order.
    ///
    /// Absent fields are written as `MISSING`.
    ///
    /// # Errors
    ///
    /// Returns `BibError::Export` if the summary cannot be written.
    pub fn export_summary(&self) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        for record in &self.records {
            let mut row = vec![record.key.as_deref().unwrap_or(MISSING)];
            row.extend(
                SUMMARY_FIELDS
                    .iter()
                    .map(|name| record.fields.get(name).unwrap_or(MISSING)),
            );
            writer.write_record(&row)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| BibError::Export(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| BibError::Export(e.to_string()))
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.records.iter().map(Record::key_or_empty).collect()
    }
}

fn completeness_warning(record: &Record) -> Option<CompletenessWarning> {
    let key = record.key_or_empty().to_string();
    match verify(record) {
        Ok(completeness) if completeness.is_complete() => None,
        Ok(completeness) => Some(CompletenessWarning::MissingFields {
            key,
            missing: completeness.missing,
        }),
        Err(BibError::UnknownEntryType(entry_type)) => {
            Some(CompletenessWarning::UnknownEntryType { key, entry_type })
        }
        Err(_) => None,
    }
}

/// `""` for 0, then `a`..`z`, `aa`..`az`, `ba`, ...
fn collision_suffix(mut n: usize) -> String {
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(char::from(b'a' + (n % 26) as u8));
        n /= 26;
    }
    letters.iter().rev().collect()
}

impl IntoIterator for Collection {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
