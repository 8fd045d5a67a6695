//! `google-scholar`: search Scholar for the DOI and follow its BibTeX link.

use super::doi::query_doi;
use super::{SourceError, Transport};
use crate::record::Record;
use crate::regex::Regex;
use crate::utils::unescape_html;
use nanoid::nanoid;
use std::sync::LazyLock;

const GOOGLE_SCHOLAR_URL: &str = "https://scholar.google.com";

/// Scholar's citation format code for BibTeX, sent in the `CF` cookie field.
const FORMAT_BIBTEX: u8 = 4;

const HEX_ALPHABET: [char; 16] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f',
];

static BIB_LINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<a href="([^"]*/scholar\.bib\?[^"]*)""#).unwrap());

/// Identifier that shapes Scholar requests.
///
/// Scholar expects a 16 hex digit `GSP` id in its cookie. It only selects the
/// citation export format and carries no credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScholarSession {
    id: String,
}

impl ScholarSession {
    /// A session with a freshly generated random id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: nanoid!(16, &HEX_ALPHABET),
        }
    }

    /// A session with a fixed id.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn cookie(&self) -> String {
        format!("GSP=ID={}:CF={}", self.id, FORMAT_BIBTEX)
    }
}

impl Default for ScholarSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Finds the first BibTeX export link on a results page, made absolute.
fn bib_link(page: &str) -> Option<String> {
    let link = unescape_html(BIB_LINK_REGEX.captures(page)?.get(1)?.as_str());
    if link.starts_with("http://") || link.starts_with("https://") {
        Some(link)
    } else {
        Some(format!("{}{}", GOOGLE_SCHOLAR_URL, link))
    }
}

/// Searches Scholar with the record's DOI and downloads the first hit's BibTeX.
pub(crate) fn fetch_google_scholar(
    transport: &dyn Transport,
    session: &ScholarSession,
    record: &Record,
) -> Result<String, SourceError> {
    let doi = query_doi(record)?;
    let cookie = session.cookie();
    let headers = [("User-Agent", "Mozilla/5.0"), ("Cookie", cookie.as_str())];

    let search_url = format!(
        "{}/scholar?q={}",
        GOOGLE_SCHOLAR_URL,
        urlencoding::encode(&doi)
    );
    let page = transport.get(&search_url, &headers)?.into_body(&search_url)?;

    let bib_url = bib_link(&page)
        .ok_or_else(|| SourceError::NotFound(format!("no BibTeX link for {}", doi)))?;
    transport.get(&bib_url, &headers)?.into_body(&bib_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldStore;
    use crate::sources::testing::ScriptedTransport;

    const SEARCH_URL: &str = "https://scholar.google.com/scholar?q=10.1000%2Fabc";

    fn record() -> Record {
        let fields: FieldStore = [("doi", "10.1000/abc")].into_iter().collect();
        Record::new("article", fields)
    }

    #[test]
    fn test_session_id_shape() {
        let session = ScholarSession::new();
        assert_eq!(session.id().len(), 16);
        assert!(session.id().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(
            ScholarSession::with_id("0123456789abcdef").cookie(),
            "GSP=ID=0123456789abcdef:CF=4"
        );
    }

    #[test]
    fn test_bib_link() {
        let page = r#"<div><a href="/scholar.bib?q=info:xyz:scholar.google.com/&amp;output=citation">Import into BibTeX</a></div>"#;
        assert_eq!(
            bib_link(page).as_deref(),
            Some("https://scholar.google.com/scholar.bib?q=info:xyz:scholar.google.com/&output=citation")
        );

        let absolute = r#"<a href="https://scholar.googleusercontent.com/scholar.bib?q=info:abc">"#;
        assert_eq!(
            bib_link(absolute).as_deref(),
            Some("https://scholar.googleusercontent.com/scholar.bib?q=info:abc")
        );

        assert_eq!(bib_link("<html>no results</html>"), None);
    }

    #[test]
    fn test_fetch_follows_bib_link_with_session_cookie() {
        let bib_url = "https://scholar.google.com/scholar.bib?q=info:abc";
        let transport = ScriptedTransport::new()
            .respond(SEARCH_URL, 200, r#"<a href="/scholar.bib?q=info:abc">BibTeX</a>"#)
            .respond(bib_url, 200, "@article{s, title={From Scholar}}");
        let session = ScholarSession::with_id("00000000000000ff");

        let body = fetch_google_scholar(&transport, &session, &record()).unwrap();

        assert_eq!(body, "@article{s, title={From Scholar}}");
        assert_eq!(transport.requested_urls(), vec![SEARCH_URL, bib_url]);
        assert!(
            transport
                .headers_for(bib_url)
                .contains(&("Cookie".to_string(), "GSP=ID=00000000000000ff:CF=4".to_string()))
        );
    }

    #[test]
    fn test_fetch_without_link_is_not_found() {
        let transport = ScriptedTransport::new().respond(SEARCH_URL, 200, "<html></html>");
        let result = fetch_google_scholar(&transport, &ScholarSession::new(), &record());
        assert!(matches!(result, Err(SourceError::NotFound(_))));
    }

    #[test]
    fn test_fetch_rate_limited() {
        let transport = ScriptedTransport::new().respond(SEARCH_URL, 429, "");
        let result = fetch_google_scholar(&transport, &ScholarSession::new(), &record());
        assert!(matches!(result, Err(SourceError::Transport(_))));
    }
}
