//! `dx-doi`: BibTeX straight from the DOI resolver.

use super::{SourceError, Transport};
use crate::record::Record;
use crate::utils::{format_doi, is_valid_doi};

const DX_DOI_URL: &str = "https://dx.doi.org";

/// The record's DOI in the bare `10.xxxx/...` form used for queries.
pub(crate) fn query_doi(record: &Record) -> Result<String, SourceError> {
    let raw = record.doi().ok_or(SourceError::MissingQuery("doi"))?;
    format_doi(raw)
        .filter(|doi| is_valid_doi(doi))
        .ok_or_else(|| SourceError::InvalidDoi(raw.to_string()))
}

/// Asks the resolver for `application/x-bibtex` for the record's DOI.
pub(crate) fn fetch_dx_doi(
    transport: &dyn Transport,
    record: &Record,
) -> Result<String, SourceError> {
    let doi = query_doi(record)?;
    let url = format!("{}/{}", DX_DOI_URL, doi);
    transport
        .get(&url, &[("Accept", "application/x-bibtex")])?
        .into_body(&url)
}
