//! BibTeX output.

use crate::record::Record;

/// Renders one record as a BibTeX entry.
///
/// Fields are written in name order, one per line, each value in braces:
///
/// ```text
/// @article{Smith_Doe.2020,
///   author = {Smith, J. and Doe, A.},
///   year = {2020},
/// }
/// ```
pub fn format_entry(record: &Record) -> String {
    let mut out = format!("@{}{{{},\n", record.entry_type, record.key_or_empty());
    for (name, value) in record.fields.iter() {
        out.push_str(&format!("  {} = {{{}}},\n", name, value));
    }
    out.push('}');
    out
}

/// Renders records as blank-line separated entries.
pub fn format_entries<'a>(records: impl IntoIterator<Item = &'a Record>) -> String {
    let mut out = String::new();
    for record in records {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(&format_entry(record));
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out
}
