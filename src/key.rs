//! Canonical citation keys.
//!
//! A key has the shape `First_Second.Year`:
//!
//! - `First` is the surname of the first author,
//! - `Second` is the surname of the second author, or `only`,
//! - `Year` is the publication year, or `0000` when unknown.
//!
//! ```
//! use bibshorts::{assign_key, Record, FieldStore};
//!
//! let fields: FieldStore = [("author", "Smith, J. and Doe, A."), ("year", "2020")]
//!     .into_iter()
//!     .collect();
//! let record = Record::new("article", fields);
//! assert_eq!(assign_key(&record).unwrap(), "Smith_Doe.2020");
//! ```
//!
//! Keys order by first author, then second author (with `only` before any
//! named co-author), then year; see [`KeyParts`].

use crate::regex::Regex;
use crate::record::Record;
use crate::utils::{key_surname, strip_grouping};
use crate::{BibError, Result};
use itertools::Itertools;
use std::cmp::Ordering;
use std::sync::LazyLock;

/// Second-author token of single-author works.
pub const SINGLE_AUTHOR: &str = "only";

/// Year token of undated works.
pub const UNKNOWN_YEAR: &str = "0000";

const AUTHOR_SEPARATOR: &str = " and ";

static RAW_AUTHOR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?ims)\bauthor\s*=\s*[{"](.*?)[}"]\s*,?\s*$"#).unwrap()
});

static YEAR_DIGITS_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}").unwrap());

/// Derives the canonical key of a record.
///
/// Authors come from the `author` field; only when the record has none is its
/// raw text scanned for an author block.
///
/// # Errors
///
/// Returns `BibError::NoAuthor` if no author can be found, or if the first
/// author has nothing left once normalised.
pub fn assign_key(record: &Record) -> Result<String> {
    let authors = author_list(record);
    let describe = || {
        record
            .input_key
            .clone()
            .unwrap_or_else(|| format!("@{} entry", record.entry_type))
    };

    let first = authors
        .first()
        .map(|author| key_surname(author))
        .filter(|name| !name.is_empty())
        .ok_or_else(|| BibError::NoAuthor(describe()))?;

    let second = authors
        .get(1)
        .map(|author| key_surname(author))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| SINGLE_AUTHOR.to_string());

    Ok(format!("{}_{}.{}", first, second, year(record)))
}

/// The record's authors, split on `" and "`.
fn author_list(record: &Record) -> Vec<String> {
    let block = match record.fields.get("author") {
        Some(value) => value.to_string(),
        None => match raw_author_block(&record.raw) {
            Some(block) => block,
            None => return Vec::new(),
        },
    };

    block
        .split(AUTHOR_SEPARATOR)
        .map(str::trim)
        .filter(|author| !author.is_empty())
        .map(String::from)
        .collect()
}

/// Secondary strategy: find `author = {...}` in unstructured text.
fn raw_author_block(raw: &str) -> Option<String> {
    let block = RAW_AUTHOR_REGEX.captures(raw)?.get(1)?.as_str();
    Some(block.split_whitespace().join(" "))
}

fn year(record: &Record) -> String {
    let Some(value) = record.fields.get("year") else {
        return UNKNOWN_YEAR.to_string();
    };
    let value = strip_grouping(value);
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        return value;
    }
    YEAR_DIGITS_REGEX
        .find(&value)
        .map_or_else(|| UNKNOWN_YEAR.to_string(), |m| m.as_str().to_string())
}

/// A key split into the tokens it sorts by.
///
/// Keys without separators are not expected; missing tokens parse as empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyParts<'a> {
    pub first: &'a str,
    pub second: &'a str,
    pub year: &'a str,
}

impl<'a> KeyParts<'a> {
    pub fn parse(key: &'a str) -> Self {
        let (names, year) = key.rsplit_once('.').unwrap_or((key, ""));
        let (first, second) = names.split_once('_').unwrap_or((names, ""));
        Self {
            first,
            second,
            year,
        }
    }
}

fn compare_second(a: &str, b: &str) -> Ordering {
    match (a == SINGLE_AUTHOR, b == SINGLE_AUTHOR) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.cmp(b),
    }
}

impl Ord for KeyParts<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.first
            .cmp(other.first)
            .then_with(|| compare_second(self.second, other.second))
            .then_with(|| self.year.cmp(other.year))
    }
}

impl PartialOrd for KeyParts<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Orders two keys by author tokens and year.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    KeyParts::parse(a).cmp(&KeyParts::parse(b))
}
