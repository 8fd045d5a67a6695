//! External reference sources.
//!
//! Each [`Source`] variant has one lookup handler that turns a record's
//! current fields into a query, runs it over a [`Transport`] and returns the
//! raw BibTeX text the source answered with.
//!
//! The network itself sits behind [`Transport`], so handlers can be driven by
//! [`HttpTransport`] in production and by an in-memory double in tests.

mod doi;
mod isbn;
mod scholar;
#[cfg(feature = "http")]
mod transport;

use crate::BibError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub(crate) use doi::fetch_dx_doi;
pub(crate) use isbn::fetch_isbn;
pub(crate) use scholar::fetch_google_scholar;
pub use scholar::ScholarSession;
#[cfg(feature = "http")]
pub use transport::HttpTransport;

/// Failure of a single source lookup.
///
/// These never escape enrichment; they are reported per source so callers can
/// log or inspect them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Record has no '{0}' field to query with")]
    MissingQuery(&'static str),

    #[error("Invalid DOI: {0}")]
    InvalidDoi(String),

    #[error("Invalid ISBN: {0}")]
    InvalidIsbn(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// The closed set of reference sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    /// BibTeX from the DOI resolver via content negotiation
    DxDoi,
    /// Google Scholar search using the DOI as query
    GoogleScholar,
    /// Open Library book data looked up by ISBN
    Isbn,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::DxDoi, Source::GoogleScholar, Source::Isbn];

    pub fn name(self) -> &'static str {
        match self {
            Source::DxDoi => "dx-doi",
            Source::GoogleScholar => "google-scholar",
            Source::Isbn => "isbn",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Source {
    type Err = BibError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Source::ALL
            .into_iter()
            .find(|source| source.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BibError::UnknownSource(s.to_string()))
    }
}

/// One configured lookup: which source, and whether it may overwrite fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub name: Source,
    /// Replace existing fields with the source's values instead of only
    /// filling gaps
    #[serde(default)]
    pub overwrite: bool,
}

impl SourceDescriptor {
    pub fn new(name: Source, overwrite: bool) -> Self {
        Self { name, overwrite }
    }
}

/// Status and body of a transport response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// The body of a successful response.
    ///
    /// # Errors
    ///
    /// `NotFound` for a 404 and `Transport` for any other non-200 status.
    pub fn into_body(self, url: &str) -> Result<String, SourceError> {
        match self.status {
            200 => Ok(self.body),
            404 => Err(SourceError::NotFound(url.to_string())),
            status => Err(SourceError::Transport(format!(
                "HTTP status {} from {}",
                status, url
            ))),
        }
    }
}

/// Blocking GET requests against external services.
pub trait Transport: Send + Sync {
    /// Fetch `url` with the given request headers.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Transport` if no response could be obtained.
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<Response, SourceError>;
}
