//! Reading and normalizing the monthly source files.
//!
//! Loading happens in three steps: [`RecordLoader`] reads every declared file
//! into an untyped [`Table`], [`normalize_keys`] brings join keys to canonical
//! form and [`SourceInputs::from_tables`] parses the cells into typed inputs.

mod loader;
mod normalizer;
mod parse;
mod sources;
mod table;

pub use loader::{RecordLoader, SourceTables};
pub use normalizer::{KEY_COLUMN, KeyedTable, index_by_key, normalize_key, normalize_keys};
pub use parse::{parse_count, parse_date, parse_money};
pub use sources::{ActiveEmployee, AdmissionEntry, ExtractedInputs, SourceInputs, TerminationEntry};
pub use table::Table;
