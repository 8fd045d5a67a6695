//! Records and their field stores.
//!
//! A [`Record`] is one bibliographic entry: its entry type, a [`FieldStore`]
//! of field values, and once assigned, its canonical key.

use crate::sources::Source;
use crate::utils::format_doi;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field names that describe an entry rather than belong to it.
const META_FIELDS: [&str; 2] = ["entrytype", "id"];

/// Mapping of field name to value for one record.
///
/// Field names are stored lowercased, so lookups are case-insensitive and
/// iteration yields fields in lexicographic name order.
///
/// Serialises as a flat name → value map; deserialising goes through
/// [`FieldStore::insert`], so names are normalised and meta-fields dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct FieldStore {
    fields: BTreeMap<CompactString, String>,
}

impl FieldStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn normalize_name(name: &str) -> CompactString {
        CompactString::from(name.trim().to_lowercase())
    }

    /// Returns the value of `name`, ignoring case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(&Self::normalize_name(name))
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(&Self::normalize_name(name))
    }

    /// Sets a field, replacing any previous value.
    ///
    /// Meta-fields (`ENTRYTYPE`, `ID`) are ignored: they live on the record.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) -> Option<String> {
        let name = Self::normalize_name(name);
        if META_FIELDS.contains(&name.as_str()) {
            return None;
        }
        self.fields.insert(name, value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.fields.remove(&Self::normalize_name(name))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over `(name, value)` pairs in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(CompactString::as_str)
    }

    /// Folds `incoming` into this store.
    ///
    /// With `overwrite` every incoming field replaces the existing one; without
    /// it only fields absent here are added. Returns how many fields changed.
    pub fn merge(&mut self, incoming: FieldStore, overwrite: bool) -> usize {
        let mut changed = 0;
        for (name, value) in incoming.fields {
            match self.fields.get_mut(&name) {
                Some(existing) if overwrite => {
                    if *existing != value {
                        *existing = value;
                        changed += 1;
                    }
                }
                Some(_) => {}
                None => {
                    self.fields.insert(name, value);
                    changed += 1;
                }
            }
        }
        changed
    }
}

impl<N: AsRef<str>, V: Into<String>> FromIterator<(N, V)> for FieldStore {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut store = FieldStore::new();
        for (name, value) in iter {
            store.insert(name.as_ref(), value);
        }
        store
    }
}

impl From<BTreeMap<String, String>> for FieldStore {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl From<FieldStore> for BTreeMap<String, String> {
    fn from(store: FieldStore) -> Self {
        store
            .fields
            .into_iter()
            .map(|(name, value)| (name.into_string(), value))
            .collect()
    }
}

/// One bibliographic entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Record {
    /// Entry type, lowercased (e.g. `article`)
    pub entry_type: String,
    /// Field values, without the entry type or citation key
    pub fields: FieldStore,
    /// Canonical key, unset until a key is assigned
    pub key: Option<String>,
    /// Sources that contributed data, in the order they were merged
    pub search_successes: Vec<Source>,
    /// Citation key written in the input, if any
    pub input_key: Option<String>,
    /// Raw text the record was parsed from
    #[serde(skip)]
    pub raw: String,
}

impl Record {
    pub fn new(entry_type: &str, fields: FieldStore) -> Self {
        Self {
            entry_type: entry_type.trim().to_lowercase(),
            fields,
            ..Default::default()
        }
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = raw.into();
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// The `doi` field exactly as stored.
    pub fn doi(&self) -> Option<&str> {
        self.fields.get("doi")
    }

    /// The `doi` field reduced to a bare lowercase DOI, for lookups.
    pub fn normalized_doi(&self) -> Option<String> {
        self.doi().and_then(format_doi)
    }

    /// Key used in output; empty until one is assigned.
    pub fn key_or_empty(&self) -> &str {
        self.key.as_deref().unwrap_or_default()
    }
}
