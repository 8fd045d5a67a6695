//! BibTeX format parsing implementation.
//!
//! This module handles the low-level parsing of BibTeX formatted text.

use crate::BibError;
use crate::bibtex::structure::RawBibEntry;
use itertools::Itertools;

/// Entry types that carry no bibliographic record.
const NON_RECORD_TYPES: [&str; 3] = ["comment", "preamble", "string"];

/// One `@type{...}` block cut out of a larger text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EntryBlock<'a> {
    /// 1-based line number of the block's first line in the source text
    pub(crate) line: usize,
    pub(crate) text: &'a str,
}

/// Cut a text into entry blocks.
///
/// A block starts at an `@` outside any entry and ends at the delimiter that
/// closes the entry's opening `{` or `(`, so several entries may share a line
/// and braced values may contain `@`. An entry that never closes runs up to
/// the next line starting with `@` instead, leaving the entries after it
/// intact. Text between blocks is ignored, as are `@comment`, `@preamble` and
/// `@string` blocks.
pub(crate) fn split_entries(text: &str) -> Vec<EntryBlock<'_>> {
    let mut blocks = Vec::new();
    let mut line = 1;
    let mut counted = 0;
    let mut pos = 0;

    while let Some(found) = text[pos..].find('@') {
        let start = pos + found;
        let end = match entry_end(text, start) {
            EntryEnd::Closed(end) => end,
            EntryEnd::NotAnEntry if !starts_line(text, start) => {
                pos = start + 1;
                continue;
            }
            _ => next_line_entry(text, start + 1).unwrap_or(text.len()),
        };

        line += text[counted..start].matches('\n').count();
        counted = start;
        let block = EntryBlock {
            line,
            text: &text[start..end],
        };
        match block_type(block.text) {
            Some(kind) if NON_RECORD_TYPES.contains(&kind.as_str()) => {
                tracing::debug!("Skipping @{} block at line {}", kind, line);
            }
            _ => blocks.push(block),
        }
        pos = end;
    }
    blocks
}

enum EntryEnd {
    /// Byte offset just past the closing delimiter
    Closed(usize),
    Unterminated,
    /// No opening delimiter follows the `@`
    NotAnEntry,
}

fn entry_end(text: &str, start: usize) -> EntryEnd {
    let body = start + 1;
    let mut chars = text[body..].char_indices();
    let mut seen_type = false;
    let mut after_type = false;
    let close = loop {
        match chars.next().map(|(_, c)| c) {
            Some(c) if is_ident_char(c) && !after_type => seen_type = true,
            Some(c) if c.is_whitespace() => after_type = seen_type,
            Some('{') if seen_type => break '}',
            Some('(') if seen_type => break ')',
            _ => return EntryEnd::NotAnEntry,
        }
    };

    let mut depth = 0usize;
    let mut in_quote = false;
    let mut escaped = false;
    for (i, c) in chars {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' if depth > 0 => depth -= 1,
            '"' if depth == 0 => in_quote = !in_quote,
            c if c == close && depth == 0 && !in_quote => {
                return EntryEnd::Closed(body + i + c.len_utf8());
            }
            '}' => return EntryEnd::Unterminated,
            _ => {}
        }
    }
    EntryEnd::Unterminated
}

/// Whether only blanks precede byte offset `at` on its line.
fn starts_line(text: &str, at: usize) -> bool {
    let line_start = text[..at].rfind('\n').map_or(0, |n| n + 1);
    text[line_start..at].trim().is_empty()
}

/// Offset of the next `@` at or after `from` that is the first non-blank
/// character of its line.
fn next_line_entry(text: &str, from: usize) -> Option<usize> {
    text[from..]
        .match_indices('@')
        .map(|(i, _)| from + i)
        .find(|&i| starts_line(text, i))
}

/// The lowercased identifier after `@`, if the block has one.
fn block_type(text: &str) -> Option<String> {
    let rest = text.trim_start().strip_prefix('@')?;
    let kind: String = rest
        .trim_start()
        .chars()
        .take_while(|c| is_ident_char(*c))
        .collect();
    (!kind.is_empty()).then(|| kind.to_lowercase())
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | ':' | '.' | '+' | '/')
}

/// Parse one entry block into its raw parts.
///
/// `first_line` is the line number of the block in its source text and is
/// only used to report errors.
pub(crate) fn parse_entry(text: &str, first_line: usize) -> Result<RawBibEntry, BibError> {
    let mut cursor = Cursor::new(text, first_line);

    cursor.skip_whitespace();
    cursor.expect('@')?;
    cursor.skip_whitespace();
    let entry_type = cursor.take_while(is_ident_char);
    if entry_type.is_empty() {
        return Err(cursor.error("missing entry type after '@'"));
    }

    cursor.skip_whitespace();
    let closing = match cursor.bump() {
        Some('{') => '}',
        Some('(') => ')',
        _ => return Err(cursor.error("expected '{' or '(' after entry type")),
    };

    let cite_key = cursor.citation_key(closing);
    let mut fields: Vec<(String, String)> = Vec::new();

    loop {
        cursor.skip_whitespace_and_commas();
        match cursor.peek() {
            None => return Err(cursor.error("unterminated entry")),
            Some(c) if c == closing => {
                cursor.bump();
                break;
            }
            Some(_) => {}
        }

        let name = cursor.take_while(is_ident_char);
        if name.is_empty() {
            return Err(cursor.error("expected field name"));
        }
        cursor.skip_whitespace();
        cursor.expect('=')?;
        let value = cursor.field_value(closing)?;

        let name = name.to_lowercase();
        if fields.iter().any(|(existing, _)| *existing == name) {
            tracing::debug!("Ignoring repeated field '{}' in entry {:?}", name, cite_key);
        } else {
            fields.push((name, value));
        }

        cursor.skip_whitespace();
        match cursor.peek() {
            Some(',') => {}
            Some(c) if c == closing => {}
            None => return Err(cursor.error("unterminated entry")),
            Some(c) => {
                return Err(cursor.error(&format!("expected ',' or '{}', found '{}'", closing, c)));
            }
        }
    }

    cursor.skip_whitespace();
    if cursor.peek().is_some() {
        tracing::warn!(
            "Ignoring text after entry {:?} at line {}",
            cite_key.as_deref().unwrap_or_default(),
            cursor.line
        );
    }

    Ok(RawBibEntry {
        entry_type: entry_type.to_lowercase(),
        cite_key,
        fields,
        raw: text.to_string(),
    })
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl Cursor {
    fn new(text: &str, first_line: usize) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            line: first_line,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn error(&self, message: &str) -> BibError {
        BibError::MalformedRecord {
            message: message.to_string(),
            line: self.line,
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), BibError> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.error(&format!("expected '{}', found '{}'", expected, c))),
            None => Err(self.error(&format!("expected '{}', found end of input", expected))),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn skip_whitespace_and_commas(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace() || c == ',') {
            self.bump();
        }
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek().filter(|c| predicate(*c)) {
            out.push(c);
            self.bump();
        }
        out
    }

    /// Reads the citation key, if the entry has one.
    ///
    /// An entry without a key goes straight to its first `name = value` pair,
    /// in which case the cursor is left where it started.
    fn citation_key(&mut self, closing: char) -> Option<String> {
        let (pos, line) = (self.pos, self.line);
        let key = self.take_while(|c| c != ',' && c != closing && c != '=');
        if self.peek() == Some('=') {
            self.pos = pos;
            self.line = line;
            return None;
        }
        let key = key.trim();
        (!key.is_empty()).then(|| key.to_string())
    }

    /// Reads a value made of `#`-joined pieces and collapses its whitespace.
    fn field_value(&mut self, closing: char) -> Result<String, BibError> {
        let mut value = String::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('{') => {
                    self.bump();
                    value.push_str(&self.delimited('}')?);
                }
                Some('"') => {
                    self.bump();
                    value.push_str(&self.delimited('"')?);
                }
                Some(c) if c.is_alphanumeric() => {
                    value.push_str(&self.take_while(|c| {
                        !c.is_whitespace() && c != ',' && c != '#' && c != closing
                    }));
                }
                _ => return Err(self.error("expected field value")),
            }
            self.skip_whitespace();
            if self.peek() == Some('#') {
                self.bump();
            } else {
                break;
            }
        }
        Ok(value.split_whitespace().join(" "))
    }

    /// Reads up to `end` at brace depth zero, keeping inner braces.
    fn delimited(&mut self, end: char) -> Result<String, BibError> {
        let mut out = String::new();
        let mut depth = 0usize;
        let mut escaped = false;
        while let Some(c) = self.bump() {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '{' => depth += 1,
                '}' if depth > 0 => depth -= 1,
                c if c == end && depth == 0 => return Ok(out),
                '}' => return Err(self.error("unbalanced '}' in field value")),
                _ => {}
            }
            out.push(c);
        }
        Err(self.error("unterminated field value"))
    }
}
