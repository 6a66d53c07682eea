//! Source file loading.
//!
//! This module provides the [`RecordLoader`], which reads every declared
//! source file of a run into a [`Table`].

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::{debug, info};

use crate::config::{SourceKind, SourceSpec};
use crate::error::{EngineError, EngineResult};

use super::Table;

/// All tables loaded for a run, by source kind.
#[derive(Debug, Clone, Default)]
pub struct SourceTables {
    tables: BTreeMap<SourceKind, Table>,
}

impl SourceTables {
    /// Adds a table, replacing any previous table of the same kind.
    pub fn insert(&mut self, table: Table) {
        self.tables.insert(table.source(), table);
    }

    /// Returns the table of a kind, if loaded.
    pub fn get(&self, kind: SourceKind) -> Option<&Table> {
        self.tables.get(&kind)
    }

    /// Mutable access to every table.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.tables.values_mut()
    }

    /// Removes and returns the table of a kind.
    pub fn take(&mut self, kind: SourceKind) -> Option<Table> {
        self.tables.remove(&kind)
    }

    /// Number of loaded tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if no table was loaded.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Reads the declared source files of a run.
///
/// # Example
///
/// ```no_run
/// use benefit_engine::config::ConfigLoader;
/// use benefit_engine::ingest::RecordLoader;
///
/// let config = ConfigLoader::load("./config/default")?;
/// let tables = RecordLoader::new(config.config().sources()).load_all("./dados")?;
/// println!("{} tables loaded", tables.len());
/// # Ok::<(), benefit_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RecordLoader<'a> {
    sources: &'a [SourceSpec],
}

impl<'a> RecordLoader<'a> {
    /// Creates a loader for the given source manifest.
    pub fn new(sources: &'a [SourceSpec]) -> Self {
        Self { sources }
    }

    /// Loads every declared source from `directory`.
    ///
    /// All required files are checked before any is read, so a missing file
    /// fails the run with [`EngineError::MissingFile`] without partial work.
    /// Optional files that are absent are skipped.
    pub fn load_all<P: AsRef<Path>>(&self, directory: P) -> EngineResult<SourceTables> {
        let directory = directory.as_ref();

        for spec in self.sources.iter().filter(|s| s.required) {
            let path = directory.join(&spec.file);
            if !path.is_file() {
                return Err(EngineError::MissingFile {
                    path: path.display().to_string(),
                });
            }
        }

        let mut tables = SourceTables::default();
        for spec in self.sources {
            let path = directory.join(&spec.file);
            if !path.is_file() {
                info!(source = %spec.kind, path = %path.display(), "Optional source absent, skipping");
                continue;
            }

            let table = Self::load_file(&path, spec)?;
            info!(
                source = %spec.kind,
                path = %path.display(),
                rows = table.len(),
                "Loaded source"
            );
            tables.insert(table);
        }

        Ok(tables)
    }

    /// Loads a single source file.
    pub fn load_file(path: &Path, spec: &SourceSpec) -> EngineResult<Table> {
        let path_str = path.display().to_string();
        let file = File::open(path).map_err(|_| EngineError::MissingFile {
            path: path_str.clone(),
        })?;
        Self::read_table(file, spec, &path_str)
    }

    /// Reads a delimited table from any reader.
    ///
    /// `spec.header_row` rows are skipped before the header. Header names are
    /// trimmed and a leading byte-order mark is dropped. Blank rows are skipped.
    pub fn read_table<R: Read>(reader: R, spec: &SourceSpec, path: &str) -> EngineResult<Table> {
        let read_error = |message: String| EngineError::SourceReadError {
            path: path.to_string(),
            message,
        };

        let delimiter = u8::try_from(spec.delimiter)
            .map_err(|_| read_error(format!("delimiter '{}' is not ASCII", spec.delimiter)))?;

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut records = reader.records();

        for skipped in 0..spec.header_row {
            if records.next().transpose().map_err(|e| read_error(e.to_string()))?.is_none() {
                return Err(read_error(format!(
                    "file ends after {} rows, before the header row",
                    skipped
                )));
            }
        }

        let headers: Vec<String> = match records.next() {
            Some(record) => record
                .map_err(|e| read_error(e.to_string()))?
                .iter()
                .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
                .collect(),
            None => return Err(read_error("file has no header row".to_string())),
        };

        let mut rows = Vec::new();
        for record in records {
            let record = record.map_err(|e| read_error(e.to_string()))?;
            if record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            rows.push(record.iter().map(str::to_string).collect());
        }

        debug!(path, headers = ?headers, rows = rows.len(), "Parsed delimited table");

        let mut table = Table::new(spec.kind, path, headers, rows);
        table.resolve_columns(&spec.columns)?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnRef;
    use std::fs;
    use tempfile::TempDir;

    fn spec(kind: SourceKind, file: &str, delimiter: char, header_row: usize) -> SourceSpec {
        let mut columns = BTreeMap::new();
        match kind {
            SourceKind::WorkingDays => {
                columns.insert("union".to_string(), ColumnRef::Index(0));
                columns.insert("working_days".to_string(), ColumnRef::Index(1));
            }
            _ => {
                columns.insert(
                    "key".to_string(),
                    ColumnRef::Names(vec!["MATRICULA".to_string()]),
                );
                columns.insert(
                    "vacation_days".to_string(),
                    ColumnRef::Names(vec!["DIAS DE FÉRIAS".to_string()]),
                );
            }
        }

        SourceSpec {
            kind,
            file: file.to_string(),
            delimiter,
            header_row,
            required: true,
            columns,
        }
    }

    #[test]
    fn test_read_semicolon_table_with_padded_headers() {
        let content = "\u{feff} MATRICULA ; DIAS DE FÉRIAS \n1001;10\n\n1002;5\n";
        let spec = spec(SourceKind::Vacations, "2.ferias.csv", ';', 0);

        let table = RecordLoader::read_table(content.as_bytes(), &spec, "2.ferias.csv").unwrap();

        assert_eq!(table.headers(), &["MATRICULA", "DIAS DE FÉRIAS"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(1, "key"), Some("1002"));
        assert_eq!(table.cell(1, "vacation_days"), Some("5"));
    }

    #[test]
    fn test_header_row_offset_skips_title_line() {
        let content = "Dias uteis maio/2025;\nSINDICATO;DIAS UTEIS\nSINDPD SP;22\n";
        let spec = spec(SourceKind::WorkingDays, "6.dias_uteis.csv", ';', 1);

        let table = RecordLoader::read_table(content.as_bytes(), &spec, "6.dias_uteis.csv").unwrap();

        assert_eq!(table.headers(), &["SINDICATO", "DIAS UTEIS"]);
        assert_eq!(table.cell(0, "union"), Some("SINDPD SP"));
        assert_eq!(table.cell(0, "working_days"), Some("22"));
    }

    #[test]
    fn test_empty_file_is_read_error() {
        let spec = spec(SourceKind::Vacations, "2.ferias.csv", ';', 0);
        let result = RecordLoader::read_table("".as_bytes(), &spec, "2.ferias.csv");
        assert!(matches!(result, Err(EngineError::SourceReadError { .. })));
    }

    #[test]
    fn test_missing_required_file_fails_before_reading() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("2.ferias.csv"), "MATRICULA;DIAS DE FÉRIAS\n").unwrap();

        let sources = vec![
            spec(SourceKind::Vacations, "2.ferias.csv", ';', 0),
            spec(SourceKind::Active, "1.ativos.csv", ';', 0),
        ];

        match RecordLoader::new(&sources).load_all(dir.path()) {
            Err(EngineError::MissingFile { path }) => assert!(path.ends_with("1.ativos.csv")),
            other => panic!("Expected MissingFile, got {:?}", other),
        }
    }

    #[test]
    fn test_optional_missing_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("2.ferias.csv"),
            "MATRICULA;DIAS DE FÉRIAS\n1001;10\n",
        )
        .unwrap();

        let mut optional = spec(SourceKind::Interns, "estagio.csv", ';', 0);
        optional.required = false;
        let sources = vec![spec(SourceKind::Vacations, "2.ferias.csv", ';', 0), optional];

        let tables = RecordLoader::new(&sources).load_all(dir.path()).unwrap();
        assert_eq!(tables.len(), 1);
        assert!(tables.get(SourceKind::Vacations).is_some());
        assert!(tables.get(SourceKind::Interns).is_none());
    }
}
