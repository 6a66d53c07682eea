//! Loaded source tables.
//!
//! A [`Table`] is the normalized, untyped form of one source file: trimmed
//! headers, rows padded to the header width and a resolution of the
//! logical columns declared in the source manifest.

use std::collections::BTreeMap;

use crate::config::{ColumnRef, SourceKind};
use crate::error::{EngineError, EngineResult};

/// One loaded source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    source: SourceKind,
    path: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    columns: BTreeMap<String, usize>,
}

impl Table {
    /// Creates a table from headers and rows. Rows are padded to the header width.
    pub fn new(
        source: SourceKind,
        path: impl Into<String>,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                if row.len() < width {
                    row.resize(width, String::new());
                }
                row
            })
            .collect();

        Self {
            source,
            path: path.into(),
            headers,
            rows,
            columns: BTreeMap::new(),
        }
    }

    /// Resolves the declared logical columns against the headers.
    ///
    /// Header names are compared trimmed and case-insensitively; positional
    /// references must fall inside the header width. Logical columns listed
    /// in [`SourceKind::required_columns`] must resolve, others are optional.
    pub fn resolve_columns(&mut self, declared: &BTreeMap<String, ColumnRef>) -> EngineResult<()> {
        for (logical, column_ref) in declared {
            let index = match column_ref {
                ColumnRef::Index(index) => (*index < self.headers.len()).then_some(*index),
                ColumnRef::Names(names) => self.headers.iter().position(|header| {
                    names
                        .iter()
                        .any(|name| name.trim().to_lowercase() == header.to_lowercase())
                }),
            };

            if let Some(index) = index {
                self.columns.insert(logical.clone(), index);
            }
        }

        for required in self.source.required_columns() {
            if !self.columns.contains_key(*required) {
                return Err(EngineError::MissingColumn {
                    source_name: self.source.to_string(),
                    column: (*required).to_string(),
                });
            }
        }

        Ok(())
    }

    /// The source kind of this table.
    pub fn source(&self) -> SourceKind {
        self.source
    }

    /// The path the table was read from.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Trimmed header names.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Physical index of a resolved logical column.
    pub fn column_index(&self, logical: &str) -> Option<usize> {
        self.columns.get(logical).copied()
    }

    /// Trimmed cell of a logical column; `None` when the column is not
    /// resolved or the cell is blank.
    pub fn cell(&self, row: usize, logical: &str) -> Option<&str> {
        let index = self.column_index(logical)?;
        self.rows
            .get(row)
            .and_then(|cells| cells.get(index))
            .map(|cell| cell.trim())
            .filter(|cell| !cell.is_empty())
    }

    /// Rewrites every cell of a logical column in place.
    ///
    /// Does nothing when the column is not resolved.
    pub fn map_column<F>(&mut self, logical: &str, mut f: F)
    where
        F: FnMut(&str) -> String,
    {
        let Some(index) = self.column_index(logical) else {
            return;
        };
        for row in &mut self.rows {
            if let Some(cell) = row.get_mut(index) {
                *cell = f(cell);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> ColumnRef {
        ColumnRef::Names(values.iter().map(|v| v.to_string()).collect())
    }

    fn vacations_table() -> Table {
        Table::new(
            SourceKind::Vacations,
            "2.ferias.csv",
            vec!["MATRICULA".to_string(), "DIAS DE FÉRIAS".to_string()],
            vec![
                vec!["1001".to_string(), " 10 ".to_string()],
                vec!["1002".to_string()],
            ],
        )
    }

    #[test]
    fn test_rows_are_padded_to_header_width() {
        let mut table = vacations_table();
        let mut declared = BTreeMap::new();
        declared.insert("key".to_string(), names(&["matricula"]));
        declared.insert("vacation_days".to_string(), ColumnRef::Index(1));
        table.resolve_columns(&declared).unwrap();

        assert_eq!(table.cell(0, "vacation_days"), Some("10"));
        assert_eq!(table.cell(1, "vacation_days"), None);
    }

    #[test]
    fn test_names_resolve_case_insensitively() {
        let mut table = vacations_table();
        let mut declared = BTreeMap::new();
        declared.insert("key".to_string(), names(&["Matricula"]));
        declared.insert("vacation_days".to_string(), names(&["dias de férias"]));

        assert!(table.resolve_columns(&declared).is_ok());
        assert_eq!(table.column_index("key"), Some(0));
        assert_eq!(table.column_index("vacation_days"), Some(1));
    }

    #[test]
    fn test_missing_required_column_is_error() {
        let mut table = vacations_table();
        let mut declared = BTreeMap::new();
        declared.insert("key".to_string(), names(&["MATRICULA"]));
        declared.insert("vacation_days".to_string(), names(&["DIAS"]));

        match table.resolve_columns(&declared) {
            Err(EngineError::MissingColumn {
                source_name,
                column,
            }) => {
                assert_eq!(source_name, "vacations");
                assert_eq!(column, "vacation_days");
            }
            other => panic!("Expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_index_does_not_resolve() {
        let mut table = vacations_table();
        let mut declared = BTreeMap::new();
        declared.insert("key".to_string(), ColumnRef::Index(0));
        declared.insert("vacation_days".to_string(), ColumnRef::Index(7));

        assert!(table.resolve_columns(&declared).is_err());
    }

    #[test]
    fn test_map_column_rewrites_cells() {
        let mut table = vacations_table();
        let mut declared = BTreeMap::new();
        declared.insert("key".to_string(), ColumnRef::Index(0));
        declared.insert("vacation_days".to_string(), ColumnRef::Index(1));
        table.resolve_columns(&declared).unwrap();

        table.map_column("key", |cell| format!("K{}", cell));
        assert_eq!(table.cell(0, "key"), Some("K1001"));
        assert_eq!(table.cell(1, "key"), Some("K1002"));
    }
}
