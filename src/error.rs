//! Error types for the benefit engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while loading, consolidating and
//! calculating benefits.

use thiserror::Error;

/// The main error type for the benefit engine.
///
/// Fatal errors (missing files, missing columns, bad configuration) abort the
/// run. Per-record errors such as [`EngineError::RateNotFound`] are collected
/// as issues and never abort a run.
///
/// # Example
///
/// ```
/// use benefit_engine::error::EngineError;
///
/// let error = EngineError::MissingFile {
///     path: "dados/1.ativos.csv".to_string(),
/// };
/// assert_eq!(error.to_string(), "Required input file not found: dados/1.ativos.csv");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A required input table is absent from the input directory.
    #[error("Required input file not found: {path}")]
    MissingFile {
        /// The path that was expected.
        path: String,
    },

    /// An input table exists but could not be read as delimited text.
    #[error("Failed to read source '{path}': {message}")]
    SourceReadError {
        /// The path of the source file.
        path: String,
        /// A description of the read error.
        message: String,
    },

    /// A column required by the pipeline is absent from a source table.
    #[error("Source '{source_name}' has no column for '{column}'")]
    MissingColumn {
        /// The source that is missing the column.
        source_name: String,
        /// The logical column that could not be resolved.
        column: String,
    },

    /// No daily rate could be resolved for a union.
    #[error("No daily rate resolved for union '{union}'")]
    RateNotFound {
        /// The union name of the affected record.
        union: String,
    },

    /// A single record could not be processed.
    #[error("Invalid record '{key}': {message}")]
    InvalidRecord {
        /// The join key of the record.
        key: String,
        /// A description of what made the record invalid.
        message: String,
    },

    /// The reference period could not be parsed.
    #[error("Invalid reference period '{value}': expected YYYY-MM")]
    InvalidPeriod {
        /// The rejected value.
        value: String,
    },

    /// An agreement document could not be turned into a rule.
    #[error("Rule extraction failed for '{document}': {message}")]
    ExtractionError {
        /// The document path handed to the extractor.
        document: String,
        /// A description of the failure.
        message: String,
    },

    /// The report could not be written.
    #[error("Failed to write report '{path}': {message}")]
    ReportWriteError {
        /// The output path.
        path: String,
        /// A description of the write error.
        message: String,
    },

    /// An amount could not be represented (decimal overflow).
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
