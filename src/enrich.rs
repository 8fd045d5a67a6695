//! Record enrichment from external sources.
//!
//! [`Enricher::enrich`] walks an ordered list of [`SourceDescriptor`]s. For
//! each one it builds the source's query from the record's current fields,
//! fetches BibTeX, parses it and merges the fields into the record under the
//! descriptor's overwrite policy. A source that fails for any reason is
//! skipped and the next one is tried; nothing is retried.

use crate::bibtex::BibtexParser;
use crate::record::Record;
use crate::sources::{
    ScholarSession, Source, SourceDescriptor, SourceError, Transport, fetch_dx_doi,
    fetch_google_scholar, fetch_isbn,
};
use tracing::debug;

/// The outcome of consulting one source for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAttempt {
    pub source: Source,
    /// Number of fields the merge added or changed, or why the source failed
    pub outcome: Result<usize, SourceError>,
}

impl SourceAttempt {
    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Fills in records from external sources over a [`Transport`].
///
/// An `Enricher` holds no per-record state, so a single instance can serve
/// many records, including from several threads at once.
pub struct Enricher {
    transport: Box<dyn Transport>,
    session: ScholarSession,
    parser: BibtexParser,
}

impl Enricher {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
            session: ScholarSession::new(),
            parser: BibtexParser::new(),
        }
    }

    #[must_use]
    pub fn with_session(mut self, session: ScholarSession) -> Self {
        self.session = session;
        self
    }

    /// Fetches the raw BibTeX a source holds for `record`.
    ///
    /// # Errors
    ///
    /// Returns the `SourceError` of the failed query or lookup.
    pub fn fetch(&self, source: Source, record: &Record) -> Result<String, SourceError> {
        let transport = self.transport.as_ref();
        match source {
            Source::DxDoi => fetch_dx_doi(transport, record),
            Source::GoogleScholar => fetch_google_scholar(transport, &self.session, record),
            Source::Isbn => fetch_isbn(transport, record),
        }
    }

    /// Consults every source in order and merges what each one returns.
    ///
    /// Successful sources are appended to `record.search_successes`. Failures
    /// are reported in the returned attempts and otherwise ignored.
    pub fn enrich(&self, record: &mut Record, sources: &[SourceDescriptor]) -> Vec<SourceAttempt> {
        sources
            .iter()
            .map(|descriptor| {
                let outcome = self.attempt(record, descriptor);
                match &outcome {
                    Ok(changed) => debug!(
                        "{}: merged {} field(s) from {}",
                        describe(record),
                        changed,
                        descriptor.name
                    ),
                    Err(e) => debug!("{}: {} skipped: {}", describe(record), descriptor.name, e),
                }
                SourceAttempt {
                    source: descriptor.name,
                    outcome,
                }
            })
            .collect()
    }

    fn attempt(
        &self,
        record: &mut Record,
        descriptor: &SourceDescriptor,
    ) -> Result<usize, SourceError> {
        let text = self.fetch(descriptor.name, record)?;
        let fetched = self
            .parser
            .parse_first(&text)
            .map_err(|e| SourceError::MalformedResponse(e.to_string()))?;

        let changed = record.fields.merge(fetched.fields, descriptor.overwrite);
        record.search_successes.push(descriptor.name);
        Ok(changed)
    }
}

fn describe(record: &Record) -> &str {
    record
        .input_key
        .as_deref()
        .or(record.key.as_deref())
        .unwrap_or("<unnamed>")
}
