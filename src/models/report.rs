//! Report models for the benefit engine.
//!
//! This module contains the [`BenefitReport`] type and its associated
//! structures: one [`BenefitReportRow`] per eligible employee, the audit
//! steps recorded by the adjustment rules, and the issues collected while a
//! run progresses.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ReferencePeriod;

/// The benefit a report line refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenefitKind {
    /// Transport-equivalent voucher, rate resolved from the region table.
    Transport,
    /// Meal allowance, rate resolved from the union agreement.
    Meal,
}

/// Amounts for one benefit of one employee.
///
/// `employer_cost + employee_share == total` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenefitLine {
    /// Which benefit this line pays.
    pub kind: BenefitKind,
    /// Daily rate applied.
    pub daily_rate: Decimal,
    /// `payable_days * daily_rate`.
    pub total: Decimal,
    /// Part of the total paid by the employer.
    pub employer_cost: Decimal,
    /// Part of the total discounted from the employee.
    pub employee_share: Decimal,
}

/// One row of the final benefit report.
///
/// # Example
///
/// ```
/// use benefit_engine::models::{BenefitKind, BenefitLine, BenefitReportRow};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let row = BenefitReportRow {
///     id: "1001".to_string(),
///     admission_date: None,
///     union: "SINDPD SP".to_string(),
///     processing_date: NaiveDate::from_ymd_opt(2025, 5, 2).unwrap(),
///     payable_days: 22,
///     transport: BenefitLine {
///         kind: BenefitKind::Transport,
///         daily_rate: Decimal::new(3750, 2),
///         total: Decimal::new(82500, 2),
///         employer_cost: Decimal::new(66000, 2),
///         employee_share: Decimal::new(16500, 2),
///     },
///     meal: None,
///     observation: String::new(),
/// };
/// assert_eq!(row.transport.employer_cost + row.transport.employee_share, row.transport.total);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenefitReportRow {
    /// Employee identifier.
    pub id: String,
    /// Admission date, when known.
    pub admission_date: Option<NaiveDate>,
    /// Union name.
    pub union: String,
    /// Date the report was processed (not a business date).
    pub processing_date: NaiveDate,
    /// Final, non-negative payable days.
    pub payable_days: u32,
    /// Transport benefit amounts.
    pub transport: BenefitLine,
    /// Meal benefit amounts, when a meal rate was resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal: Option<BenefitLine>,
    /// Free-text observation (e.g. a missing rate).
    #[serde(default)]
    pub observation: String,
}

/// Aggregated amounts over all report rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTotals {
    /// Number of rows in the report.
    pub rows: usize,
    /// Sum of all payable days.
    pub payable_days: u64,
    /// Sum of all benefit totals.
    pub total: Decimal,
    /// Sum of all employer costs.
    pub employer_cost: Decimal,
    /// Sum of all employee shares.
    pub employee_share: Decimal,
}

impl ReportTotals {
    /// Returns the totals with one more row added.
    ///
    /// `None` when any amount sum would overflow; `self` is left as it was.
    pub fn checked_add_row(&self, row: &BenefitReportRow) -> Option<Self> {
        let mut next = self.clone();
        next.rows += 1;
        next.payable_days += u64::from(row.payable_days);
        for line in std::iter::once(&row.transport).chain(row.meal.as_ref()) {
            next.total = next.total.checked_add(line.total)?;
            next.employer_cost = next.employer_cost.checked_add(line.employer_cost)?;
            next.employee_share = next.employee_share.checked_add(line.employee_share)?;
        }
        Some(next)
    }
}

/// The complete benefit report of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenefitReport {
    /// Unique identifier for this run.
    pub run_id: Uuid,
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
    /// The month being paid.
    pub period: ReferencePeriod,
    /// Processing date stamped on every row.
    pub processing_date: NaiveDate,
    /// One row per eligible employee.
    pub rows: Vec<BenefitReportRow>,
    /// Aggregated amounts.
    pub totals: ReportTotals,
}

/// A single step in the audit trace of the days-payable adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A join key that appeared more than once in one source table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateKey {
    /// The source table name.
    pub source: String,
    /// The duplicated key.
    pub key: String,
    /// How many rows carried the key.
    pub occurrences: usize,
}

/// Category of a non-fatal issue collected during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A key appeared more than once in a source.
    DuplicateKey,
    /// A row had an empty join key.
    EmptyKey,
    /// A cell could not be parsed and was treated as absent.
    MalformedValue,
    /// An auxiliary row had no counterpart in the base population.
    UnmatchedRow,
    /// The union name did not map to any configured region.
    UnmatchedRegion,
    /// The union has no working-day count.
    MissingWorkingDays,
    /// No daily rate could be resolved.
    MissingRate,
    /// An agreement document could not be turned into a rule.
    ExtractionFailed,
    /// A record was rejected while building the report.
    InvalidRecord,
}

/// A non-fatal problem, kept for manual review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunIssue {
    /// What kind of problem this is.
    pub kind: IssueKind,
    /// The source table involved, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// The employee key involved, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Human-readable description.
    pub message: String,
}

impl RunIssue {
    /// Creates an issue with only a kind and a message.
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            source: None,
            key: None,
            message: message.into(),
        }
    }

    /// Attaches the source table name.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attaches the employee key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// A record left out of the report, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedRecord {
    /// Employee identifier.
    pub id: String,
    /// Why it was excluded.
    pub reason: String,
}
