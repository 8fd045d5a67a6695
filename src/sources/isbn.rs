//! `isbn`: book metadata from Open Library, rendered as BibTeX.
//!
//! API docs: https://openlibrary.org/dev/docs/api/books

use super::{SourceError, Transport};
use crate::record::Record;
use crate::regex::Regex;
use crate::utils::{normalize_isbn, split_display_name};
use itertools::Itertools;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::LazyLock;

const OPEN_LIBRARY_URL: &str = "https://openlibrary.org";

static YEAR_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}").unwrap());

#[derive(Debug, Deserialize)]
struct OpenLibraryBook {
    title: Option<String>,
    subtitle: Option<String>,
    #[serde(default)]
    authors: Vec<NamedItem>,
    #[serde(default)]
    publishers: Vec<NamedItem>,
    #[serde(default)]
    publish_places: Vec<NamedItem>,
    publish_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedItem {
    name: String,
}

/// Keeps a value safe to place between BibTeX braces.
fn clean(value: &str) -> String {
    value.replace(['{', '}'], "").trim().to_string()
}

fn first_name(items: &[NamedItem]) -> Option<String> {
    items.first().map(|item| clean(&item.name))
}

impl OpenLibraryBook {
    fn to_bibtex(&self, isbn: &str) -> String {
        let mut fields: Vec<(&str, String)> = Vec::new();

        let authors = self
            .authors
            .iter()
            .map(|author| match split_display_name(&clean(&author.name)) {
                (family, given) if given.is_empty() => family,
                (family, given) => format!("{}, {}", family, given),
            })
            .filter(|name| !name.is_empty())
            .join(" and ");
        if !authors.is_empty() {
            fields.push(("author", authors));
        }

        let title = match (&self.title, &self.subtitle) {
            (Some(title), Some(subtitle)) => Some(format!("{}: {}", clean(title), clean(subtitle))),
            (Some(title), None) => Some(clean(title)),
            _ => None,
        };
        fields.extend(title.map(|t| ("title", t)));
        fields.extend(first_name(&self.publishers).map(|p| ("publisher", p)));
        fields.extend(first_name(&self.publish_places).map(|a| ("address", a)));

        let year = self
            .publish_date
            .as_deref()
            .and_then(|date| YEAR_REGEX.find(date))
            .map(|m| m.as_str().to_string());
        fields.extend(year.map(|y| ("year", y)));
        fields.push(("isbn", isbn.to_string()));

        let mut out = format!("@book{{{},\n", isbn);
        for (name, value) in fields {
            out.push_str(&format!("  {} = {{{}}},\n", name, value));
        }
        out.push('}');
        out
    }
}

/// Looks up the record's ISBN and renders the book as a `@book` entry.
pub(crate) fn fetch_isbn(transport: &dyn Transport, record: &Record) -> Result<String, SourceError> {
    let raw = record
        .fields
        .get("isbn")
        .ok_or(SourceError::MissingQuery("isbn"))?;
    let isbn = normalize_isbn(raw).ok_or_else(|| SourceError::InvalidIsbn(raw.to_string()))?;

    let url = format!(
        "{}/api/books?bibkeys=ISBN:{}&format=json&jscmd=data",
        OPEN_LIBRARY_URL, isbn
    );
    let body = transport
        .get(&url, &[("Accept", "application/json")])?
        .into_body(&url)?;

    let mut books: HashMap<String, OpenLibraryBook> = serde_json::from_str(&body)
        .map_err(|e| SourceError::MalformedResponse(format!("Invalid Open Library JSON: {}", e)))?;
    let book = books
        .remove(&format!("ISBN:{}", isbn))
        .ok_or_else(|| SourceError::NotFound(format!("ISBN {}", isbn)))?;

    Ok(book.to_bibtex(&isbn))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldStore;
    use crate::sources::testing::ScriptedTransport;
    use pretty_assertions::assert_eq;

    const URL: &str =
        "https://openlibrary.org/api/books?bibkeys=ISBN:9780306406157&format=json&jscmd=data";

    fn record(isbn: &str) -> Record {
        let fields: FieldStore = [("isbn", isbn)].into_iter().collect();
        Record::new("book", fields)
    }

    #[test]
    fn test_fetch_renders_book() {
        let json = r#"{"ISBN:9780306406157": {
            "title": "The Art of Computer Programming",
            "subtitle": "Fundamental {Algorithms}",
            "authors": [{"name": "Donald E. Knuth"}, {"name": "Plato"}],
            "publishers": [{"name": "Addison-Wesley"}],
            "publish_places": [{"name": "Reading, Mass."}],
            "publish_date": "June 1968"
        }}"#;
        let transport = ScriptedTransport::new().respond(URL, 200, json);

        let bibtex = fetch_isbn(&transport, &record("978-0-306-40615-7")).unwrap();

        let expected = "@book{9780306406157,
  author = {Knuth, Donald E. and Plato},
  title = {The Art of Computer Programming: Fundamental Algorithms},
  publisher = {Addison-Wesley},
  address = {Reading, Mass.},
  year = {1968},
  isbn = {9780306406157},
}";
        assert_eq!(bibtex, expected);
    }

    #[test]
    fn test_fetch_minimal_book() {
        let transport =
            ScriptedTransport::new().respond(URL, 200, r#"{"ISBN:9780306406157": {}}"#);
        let bibtex = fetch_isbn(&transport, &record("9780306406157")).unwrap();
        assert_eq!(bibtex, "@book{9780306406157,\n  isbn = {9780306406157},\n}");
    }

    #[test]
    fn test_fetch_unknown_isbn_is_not_found() {
        let transport = ScriptedTransport::new().respond(URL, 200, "{}");
        let result = fetch_isbn(&transport, &record("9780306406157"));
        assert!(matches!(result, Err(SourceError::NotFound(_))));
    }

    #[test]
    fn test_fetch_rejects_bad_checksum_without_request() {
        let transport = ScriptedTransport::new();
        let result = fetch_isbn(&transport, &record("978-0-306-40615-8"));
        assert_eq!(
            result,
            Err(SourceError::InvalidIsbn("978-0-306-40615-8".to_string()))
        );
        assert!(transport.requested_urls().is_empty());
    }

    #[test]
    fn test_fetch_malformed_json() {
        let transport = ScriptedTransport::new().respond(URL, 200, "<html>");
        let result = fetch_isbn(&transport, &record("9780306406157"));
        assert!(matches!(result, Err(SourceError::MalformedResponse(_))));
    }
}
