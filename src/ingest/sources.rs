//! Typed extraction of the loaded source tables.
//!
//! This is the last ingest step: keys are normalized, keyed tables are
//! de-duplicated and every cell the pipeline needs is parsed into its typed
//! form. Malformed cells become absent values plus an issue; nothing here
//! aborts a run except a missing base population.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::config::SourceKind;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    DuplicateKey, IssueKind, NoticeStatus, RegionRateTable, RunIssue, UnionWorkingDaysTable,
};

use super::normalizer::{KeyedTable, index_by_key, normalize_keys};
use super::parse::{parse_count, parse_date, parse_money};
use super::{SourceTables, Table};

/// Upper bound of any day count within one month (vacations, working days).
const MAX_MONTH_DAYS: u32 = 31;

/// One row of the base population.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveEmployee {
    /// Canonical key.
    pub id: String,
    /// Union name, trimmed.
    pub union: String,
    /// Role title.
    pub role_title: Option<String>,
    /// Situation/leave category of the base table.
    pub leave_category: Option<String>,
}

/// Termination data of one employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminationEntry {
    /// Termination date; `None` when blank or malformed.
    pub date: Option<NaiveDate>,
    /// Notice status.
    pub notice: NoticeStatus,
}

/// Admission data of one employee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionEntry {
    /// Admission date; `None` when blank or malformed.
    pub date: Option<NaiveDate>,
    /// Role the employee was admitted to.
    pub role: Option<String>,
}

/// Every typed input of the consolidator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceInputs {
    /// Base population, in source order, one row per key.
    pub active: Vec<ActiveEmployee>,
    /// Vacation days by key.
    pub vacations: BTreeMap<String, u32>,
    /// Terminations by key.
    pub terminations: BTreeMap<String, TerminationEntry>,
    /// Admissions by key.
    pub admissions: BTreeMap<String, AdmissionEntry>,
    /// Leaves of absence by key, with the leave description.
    pub leaves: BTreeMap<String, Option<String>>,
    /// Apprentice keys.
    pub apprentices: BTreeSet<String>,
    /// Intern keys.
    pub interns: BTreeSet<String>,
    /// Daily rate by region.
    pub region_rates: RegionRateTable,
    /// Working days by union.
    pub working_days: UnionWorkingDaysTable,
    /// Agreement document by union.
    pub union_documents: BTreeMap<String, PathBuf>,
}

/// Typed inputs plus everything worth reporting about them.
#[derive(Debug, Clone, Default)]
pub struct ExtractedInputs {
    /// The typed inputs.
    pub inputs: SourceInputs,
    /// Duplicate keys found in any source.
    pub duplicates: Vec<DuplicateKey>,
    /// Non-fatal issues (malformed cells, blank keys).
    pub issues: Vec<RunIssue>,
}

impl ExtractedInputs {
    fn malformed(&mut self, source: SourceKind, key: &str, message: String) {
        debug!(source = %source, key, %message, "Malformed cell treated as absent");
        self.issues.push(
            RunIssue::new(IssueKind::MalformedValue, message)
                .with_source(source.as_str())
                .with_key(key),
        );
    }

    fn index(&mut self, mut table: Table) -> KeyedTable {
        normalize_keys(&mut table);
        let (keyed, duplicates) = index_by_key(table);

        if keyed.empty_key_rows() > 0 {
            self.issues.push(
                RunIssue::new(
                    IssueKind::EmptyKey,
                    format!("{} rows without a key were dropped", keyed.empty_key_rows()),
                )
                .with_source(keyed.table().source().as_str()),
            );
        }
        for duplicate in &duplicates {
            self.issues.push(
                RunIssue::new(
                    IssueKind::DuplicateKey,
                    format!(
                        "key appears {} times, first occurrence used",
                        duplicate.occurrences
                    ),
                )
                .with_source(duplicate.source.clone())
                .with_key(duplicate.key.clone()),
            );
        }
        self.duplicates.extend(duplicates);
        keyed
    }

    fn duplicate_lookup_row(&mut self, source: SourceKind, name: &str) {
        match self
            .duplicates
            .iter_mut()
            .find(|d| d.source == source.as_str() && d.key == name)
        {
            Some(existing) => existing.occurrences += 1,
            None => {
                self.duplicates.push(DuplicateKey {
                    source: source.to_string(),
                    key: name.to_string(),
                    occurrences: 2,
                });
                self.issues.push(
                    RunIssue::new(
                        IssueKind::DuplicateKey,
                        format!("'{}' is listed more than once, first entry used", name),
                    )
                    .with_source(source.as_str()),
                );
            }
        }
    }
}

impl SourceInputs {
    /// Extracts typed inputs from the loaded tables.
    ///
    /// `date_formats` are tried in order for every date cell.
    /// `document_root` is the directory agreement document paths are relative to.
    ///
    /// Fails only when the base population table is absent.
    pub fn from_tables(
        mut tables: SourceTables,
        date_formats: &[String],
        document_root: &Path,
    ) -> EngineResult<ExtractedInputs> {
        let mut extracted = ExtractedInputs::default();

        let active = tables
            .take(SourceKind::Active)
            .ok_or_else(|| EngineError::MissingFile {
                path: SourceKind::Active.to_string(),
            })?;
        let active = extracted.index(active);
        extracted.inputs.active = active
            .entries()
            .map(|(key, row)| {
                let table = active.table();
                ActiveEmployee {
                    id: key.to_string(),
                    union: table.cell(row, "union").unwrap_or_default().to_string(),
                    role_title: table.cell(row, "role").map(str::to_string),
                    leave_category: table.cell(row, "leave_category").map(str::to_string),
                }
            })
            .collect();

        if let Some(table) = tables.take(SourceKind::Vacations) {
            let keyed = extracted.index(table);
            for (key, row) in keyed.entries() {
                let cell = keyed.table().cell(row, "vacation_days");
                match cell.map(parse_count) {
                    Some(Some(days)) if days <= MAX_MONTH_DAYS => {
                        extracted.inputs.vacations.insert(key.to_string(), days);
                    }
                    Some(_) => extracted.malformed(
                        SourceKind::Vacations,
                        key,
                        format!(
                            "vacation days '{}' is not a count between 0 and {}",
                            cell.unwrap_or_default(),
                            MAX_MONTH_DAYS
                        ),
                    ),
                    None => {}
                }
            }
        }

        if let Some(table) = tables.take(SourceKind::Terminations) {
            let keyed = extracted.index(table);
            for (key, row) in keyed.entries() {
                let table = keyed.table();
                let raw_date = table.cell(row, "termination_date");
                let date = raw_date.and_then(|cell| parse_date(cell, date_formats));
                if let (Some(cell), None) = (raw_date, date) {
                    extracted.malformed(
                        SourceKind::Terminations,
                        key,
                        format!("termination date '{}' could not be parsed", cell),
                    );
                }
                let notice = NoticeStatus::from_cell(table.cell(row, "notice").unwrap_or_default());
                extracted
                    .inputs
                    .terminations
                    .insert(key.to_string(), TerminationEntry { date, notice });
            }
        }

        if let Some(table) = tables.take(SourceKind::Admissions) {
            let keyed = extracted.index(table);
            for (key, row) in keyed.entries() {
                let table = keyed.table();
                let raw_date = table.cell(row, "admission_date");
                let date = raw_date.and_then(|cell| parse_date(cell, date_formats));
                if let (Some(cell), None) = (raw_date, date) {
                    extracted.malformed(
                        SourceKind::Admissions,
                        key,
                        format!("admission date '{}' could not be parsed", cell),
                    );
                }
                let role = table.cell(row, "role").map(str::to_string);
                extracted
                    .inputs
                    .admissions
                    .insert(key.to_string(), AdmissionEntry { date, role });
            }
        }

        if let Some(table) = tables.take(SourceKind::Leaves) {
            let keyed = extracted.index(table);
            for (key, row) in keyed.entries() {
                let category = keyed.table().cell(row, "leave_category").map(str::to_string);
                extracted.inputs.leaves.insert(key.to_string(), category);
            }
        }

        if let Some(table) = tables.take(SourceKind::Apprentices) {
            let keyed = extracted.index(table);
            extracted.inputs.apprentices = keyed.keys().map(str::to_string).collect();
        }

        if let Some(table) = tables.take(SourceKind::Interns) {
            let keyed = extracted.index(table);
            extracted.inputs.interns = keyed.keys().map(str::to_string).collect();
        }

        if let Some(table) = tables.take(SourceKind::RegionRates) {
            for row in 0..table.len() {
                let Some(region) = table.cell(row, "region") else {
                    continue;
                };
                let raw_rate = table.cell(row, "rate").unwrap_or_default();
                match parse_money(raw_rate) {
                    Some(rate) => {
                        if !extracted.inputs.region_rates.insert(region, rate) {
                            extracted.duplicate_lookup_row(SourceKind::RegionRates, region);
                        }
                    }
                    None => extracted.malformed(
                        SourceKind::RegionRates,
                        region,
                        format!("rate '{}' for region '{}' is not an amount", raw_rate, region),
                    ),
                }
            }
        }

        if let Some(table) = tables.take(SourceKind::WorkingDays) {
            for row in 0..table.len() {
                let Some(union) = table.cell(row, "union") else {
                    continue;
                };
                let raw_days = table.cell(row, "working_days").unwrap_or_default();
                match parse_count(raw_days) {
                    Some(days) if days <= MAX_MONTH_DAYS => {
                        if !extracted.inputs.working_days.insert(union, days) {
                            extracted.duplicate_lookup_row(SourceKind::WorkingDays, union);
                        }
                    }
                    _ => extracted.malformed(
                        SourceKind::WorkingDays,
                        union,
                        format!(
                            "working days '{}' for union '{}' is not a count between 0 and {}",
                            raw_days, union, MAX_MONTH_DAYS
                        ),
                    ),
                }
            }
        }

        if let Some(table) = tables.take(SourceKind::UnionDocuments) {
            for row in 0..table.len() {
                let (Some(union), Some(document)) =
                    (table.cell(row, "union"), table.cell(row, "document"))
                else {
                    continue;
                };
                if extracted.inputs.union_documents.contains_key(union) {
                    extracted.duplicate_lookup_row(SourceKind::UnionDocuments, union);
                    continue;
                }
                extracted
                    .inputs
                    .union_documents
                    .insert(union.to_string(), document_root.join(document));
            }
        }

        info!(
            active = extracted.inputs.active.len(),
            vacations = extracted.inputs.vacations.len(),
            terminations = extracted.inputs.terminations.len(),
            admissions = extracted.inputs.admissions.len(),
            leaves = extracted.inputs.leaves.len(),
            apprentices = extracted.inputs.apprentices.len(),
            interns = extracted.inputs.interns.len(),
            regions = extracted.inputs.region_rates.len(),
            unions = extracted.inputs.working_days.len(),
            duplicates = extracted.duplicates.len(),
            "Source inputs extracted"
        );

        Ok(extracted)
    }
}
