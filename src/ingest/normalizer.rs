//! Join key normalization and duplicate detection.
//!
//! Every keyed table must go through [`normalize_keys`] before any join:
//! keys rendered as numbers in one file and as padded text in another would
//! otherwise silently fail to match.

use std::collections::BTreeMap;

use tracing::warn;

use crate::models::DuplicateKey;

use super::Table;

/// Logical name of the join key column.
pub const KEY_COLUMN: &str = "key";

/// Returns the canonical form of an employee key.
///
/// The key is trimmed, an integral float rendering (`"1234.0"`) loses its
/// fractional part and a purely numeric key loses its leading zeros.
///
/// # Examples
///
/// ```
/// use benefit_engine::ingest::normalize_key;
///
/// assert_eq!(normalize_key(" 1234 "), "1234");
/// assert_eq!(normalize_key("1234.0"), "1234");
/// assert_eq!(normalize_key("001234"), "1234");
/// assert_eq!(normalize_key("A-0012"), "A-0012");
/// assert_eq!(normalize_key("000"), "0");
/// ```
pub fn normalize_key(raw: &str) -> String {
    let key = raw.trim();

    let key = match key.split_once('.') {
        Some((integer, fraction))
            if !integer.is_empty()
                && integer.chars().all(|c| c.is_ascii_digit())
                && !fraction.is_empty()
                && fraction.chars().all(|c| c == '0') =>
        {
            integer
        }
        _ => key,
    };

    if !key.is_empty() && key.chars().all(|c| c.is_ascii_digit()) {
        let stripped = key.trim_start_matches('0');
        if stripped.is_empty() {
            "0".to_string()
        } else {
            stripped.to_string()
        }
    } else {
        key.to_string()
    }
}

/// Rewrites the key column of a table to canonical form, in place.
///
/// Tables without a key column are left untouched.
pub fn normalize_keys(table: &mut Table) {
    table.map_column(KEY_COLUMN, normalize_key);
}

/// A table indexed by its (normalized) join key.
///
/// Only the first row of each key is indexed; `keys()` preserves source order.
#[derive(Debug, Clone)]
pub struct KeyedTable {
    table: Table,
    index: BTreeMap<String, usize>,
    order: Vec<String>,
    empty_key_rows: usize,
}

impl KeyedTable {
    /// The underlying table.
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// The row index of the first occurrence of a key.
    pub fn row_of(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Returns true if the key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Distinct keys in source order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Distinct keys paired with the row of their first occurrence.
    pub fn entries(&self) -> impl Iterator<Item = (&str, usize)> {
        self.order
            .iter()
            .filter_map(|key| self.index.get(key).map(|row| (key.as_str(), *row)))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if no row had a usable key.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Rows dropped because their key was blank.
    pub fn empty_key_rows(&self) -> usize {
        self.empty_key_rows
    }
}

/// Indexes a normalized table by key, keeping the first occurrence.
///
/// Every key seen more than once is returned as a [`DuplicateKey`]; the
/// later rows are never merged or indexed.
pub fn index_by_key(table: Table) -> (KeyedTable, Vec<DuplicateKey>) {
    let mut index = BTreeMap::new();
    let mut order = Vec::new();
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut empty_key_rows = 0;

    for row in 0..table.len() {
        let Some(key) = table.cell(row, KEY_COLUMN) else {
            empty_key_rows += 1;
            continue;
        };

        *counts.entry(key.to_string()).or_default() += 1;
        if !index.contains_key(key) {
            index.insert(key.to_string(), row);
            order.push(key.to_string());
        }
    }

    let source = table.source().to_string();
    let duplicates: Vec<DuplicateKey> = order
        .iter()
        .filter_map(|key| {
            let occurrences = counts.get(key).copied().unwrap_or(0);
            (occurrences > 1).then(|| DuplicateKey {
                source: source.clone(),
                key: key.clone(),
                occurrences,
            })
        })
        .collect();

    for duplicate in &duplicates {
        warn!(
            source = %duplicate.source,
            key = %duplicate.key,
            occurrences = duplicate.occurrences,
            "Duplicate join key, using first occurrence"
        );
    }

    (
        KeyedTable {
            table,
            index,
            order,
            empty_key_rows,
        },
        duplicates,
    )
}
