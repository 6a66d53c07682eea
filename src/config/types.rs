//! Configuration types for the benefit pipeline.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::models::ReferencePeriod;

/// Metadata about the pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineMetadata {
    /// Human-readable name of the configuration.
    pub name: String,
    /// Company or payroll the configuration belongs to.
    #[serde(default)]
    pub company: String,
    /// Version of the configuration.
    pub version: String,
}

/// Eligibility and adjustment policy.
#[derive(Debug, Clone, Deserialize)]
pub struct Policy {
    /// Confirmed terminations up to this day of month are excluded from payment.
    #[serde(default = "default_termination_cutoff_day")]
    pub termination_cutoff_day: u32,
    /// Vacation days at or above this count zero the payable days.
    #[serde(default = "default_full_month_vacation_days")]
    pub full_month_vacation_days: u32,
    /// Leave categories (from the active-employees table) that exclude a record.
    #[serde(default)]
    pub excluded_leave_categories: Vec<String>,
    /// Role title fragments that exclude a record (matched case-insensitively).
    #[serde(default)]
    pub excluded_role_titles: Vec<String>,
}

fn default_termination_cutoff_day() -> u32 {
    15
}

fn default_full_month_vacation_days() -> u32 {
    30
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            termination_cutoff_day: default_termination_cutoff_day(),
            full_month_vacation_days: default_full_month_vacation_days(),
            excluded_leave_categories: Vec::new(),
            excluded_role_titles: Vec::new(),
        }
    }
}

/// The `pipeline.yaml` file.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineFile {
    /// Configuration metadata.
    pub metadata: PipelineMetadata,
    /// Default reference period; the CLI may override it.
    #[serde(default)]
    pub period: Option<ReferencePeriod>,
    /// `chrono` formats tried in order when parsing date cells.
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,
    /// Delimiter of the written report.
    #[serde(default = "default_output_delimiter")]
    pub output_delimiter: char,
    /// Eligibility and adjustment policy.
    #[serde(default)]
    pub policy: Policy,
}

fn default_date_formats() -> Vec<String> {
    vec!["%m/%d/%Y".to_string(), "%Y-%m-%d".to_string()]
}

fn default_output_delimiter() -> char {
    ';'
}

/// The kinds of source tables the pipeline knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Active employees: the base population.
    Active,
    /// Vacation days per employee.
    Vacations,
    /// Terminations with notice status.
    Terminations,
    /// Admissions in the period.
    Admissions,
    /// Leaves of absence.
    Leaves,
    /// Apprentices (trainees).
    Apprentices,
    /// Interns.
    Interns,
    /// Daily rate by region.
    RegionRates,
    /// Working days by union.
    WorkingDays,
    /// Union name to agreement document.
    UnionDocuments,
}

impl SourceKind {
    /// Stable name used in logs and issues.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Active => "active",
            SourceKind::Vacations => "vacations",
            SourceKind::Terminations => "terminations",
            SourceKind::Admissions => "admissions",
            SourceKind::Leaves => "leaves",
            SourceKind::Apprentices => "apprentices",
            SourceKind::Interns => "interns",
            SourceKind::RegionRates => "region_rates",
            SourceKind::WorkingDays => "working_days",
            SourceKind::UnionDocuments => "union_documents",
        }
    }

    /// Logical columns the pipeline cannot do without for this source.
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            SourceKind::Active => &["key", "union"],
            SourceKind::Vacations => &["key", "vacation_days"],
            SourceKind::Terminations => &["key", "termination_date", "notice"],
            SourceKind::Admissions => &["key", "admission_date"],
            SourceKind::Leaves | SourceKind::Apprentices | SourceKind::Interns => &["key"],
            SourceKind::RegionRates => &["region", "rate"],
            SourceKind::WorkingDays => &["union", "working_days"],
            SourceKind::UnionDocuments => &["union", "document"],
        }
    }

    /// Whether the source is keyed by employee identifier.
    pub fn is_keyed(&self) -> bool {
        !matches!(
            self,
            SourceKind::RegionRates | SourceKind::WorkingDays | SourceKind::UnionDocuments
        )
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a logical column is found in a source file.
///
/// Either a list of accepted header names (variants across files) or a
/// zero-based position, for files whose headers are unreliable.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    /// Zero-based column position.
    Index(usize),
    /// Accepted header names, compared after trimming and case-insensitively.
    Names(Vec<String>),
}

/// Declaration of one expected source file.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSpec {
    /// Which table this is.
    pub kind: SourceKind,
    /// File name inside the input directory.
    pub file: String,
    /// Field delimiter.
    #[serde(default = "default_source_delimiter")]
    pub delimiter: char,
    /// Number of rows preceding the header row.
    #[serde(default)]
    pub header_row: usize,
    /// Whether a missing file aborts the run.
    #[serde(default = "default_required")]
    pub required: bool,
    /// Logical column name to physical column.
    #[serde(default)]
    pub columns: BTreeMap<String, ColumnRef>,
}

fn default_source_delimiter() -> char {
    ';'
}

fn default_required() -> bool {
    true
}

/// The `sources.yaml` file.
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesFile {
    /// Declared source files.
    pub sources: Vec<SourceSpec>,
}

/// A region and the union-name fragments that identify it.
#[derive(Debug, Clone, Deserialize)]
pub struct RegionSpec {
    /// Region name, as used in the region rate table.
    pub name: String,
    /// Fragments searched for in the upper-cased union name.
    pub patterns: Vec<String>,
}

/// The `regions.yaml` file.
#[derive(Debug, Clone, Deserialize)]
pub struct RegionsFile {
    /// Configured regions, matched in order.
    pub regions: Vec<RegionSpec>,
}

/// The complete pipeline configuration loaded from YAML files.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pipeline: PipelineFile,
    sources: Vec<SourceSpec>,
    regions: Vec<RegionSpec>,
}

impl EngineConfig {
    /// Creates a new EngineConfig from its component parts.
    pub fn new(pipeline: PipelineFile, sources: Vec<SourceSpec>, regions: Vec<RegionSpec>) -> Self {
        Self {
            pipeline,
            sources,
            regions,
        }
    }

    /// Returns the configuration metadata.
    pub fn metadata(&self) -> &PipelineMetadata {
        &self.pipeline.metadata
    }

    /// Returns the default reference period, if configured.
    pub fn period(&self) -> Option<ReferencePeriod> {
        self.pipeline.period
    }

    /// Returns the date formats tried when parsing date cells.
    pub fn date_formats(&self) -> &[String] {
        &self.pipeline.date_formats
    }

    /// Returns the report delimiter.
    pub fn output_delimiter(&self) -> char {
        self.pipeline.output_delimiter
    }

    /// Returns the eligibility policy.
    pub fn policy(&self) -> &Policy {
        &self.pipeline.policy
    }

    /// Returns all declared sources.
    pub fn sources(&self) -> &[SourceSpec] {
        &self.sources
    }

    /// Returns the declared source of a kind.
    pub fn source(&self, kind: SourceKind) -> Option<&SourceSpec> {
        self.sources.iter().find(|s| s.kind == kind)
    }

    /// Returns the configured regions.
    pub fn regions(&self) -> &[RegionSpec] {
        &self.regions
    }
}
