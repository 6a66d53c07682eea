//! Employee record model and related types.
//!
//! This module defines the [`EmployeeRecord`] that flows through the
//! consolidation pipeline, together with the notice, role and eligibility
//! enums that describe it.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::RegionMatch;

/// Status of the termination notice attached to a termination record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeStatus {
    /// The termination was communicated and confirmed ("OK" in the source).
    Confirmed,
    /// A termination exists but the notice is not confirmed yet.
    Pending,
    /// No termination notice data for this employee.
    #[default]
    Absent,
}

impl NoticeStatus {
    /// Interprets the raw notice cell of the terminations table.
    ///
    /// # Examples
    ///
    /// ```
    /// use benefit_engine::models::NoticeStatus;
    ///
    /// assert_eq!(NoticeStatus::from_cell("OK"), NoticeStatus::Confirmed);
    /// assert_eq!(NoticeStatus::from_cell(" ok "), NoticeStatus::Confirmed);
    /// assert_eq!(NoticeStatus::from_cell("AGUARDANDO"), NoticeStatus::Pending);
    /// assert_eq!(NoticeStatus::from_cell(""), NoticeStatus::Absent);
    /// ```
    pub fn from_cell(cell: &str) -> Self {
        let cell = cell.trim();
        if cell.is_empty() {
            NoticeStatus::Absent
        } else if cell.eq_ignore_ascii_case("ok") {
            NoticeStatus::Confirmed
        } else {
            NoticeStatus::Pending
        }
    }
}

/// Role category of an employee, as far as benefit eligibility is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleCategory {
    /// A regular employee.
    #[default]
    Standard,
    /// Apprentice/trainee, listed in the apprentices table.
    Trainee,
    /// Intern, listed in the interns table.
    Intern,
    /// A role excluded by title (e.g. directors).
    OtherExcluded,
}

/// Why a record was classified ineligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IneligibilityReason {
    /// Listed in the leave-of-absence table.
    OnLeave,
    /// Listed in the apprentices table.
    Trainee,
    /// Listed in the interns table.
    Intern,
    /// The record's own leave category is an excluded one.
    ExcludedLeaveCategory,
    /// The role title is excluded from the benefit.
    ExcludedRole,
    /// Confirmed termination on or before the cutoff day.
    TerminatedBeforeCutoff,
    /// Payable days ended at zero or below.
    NoPayableDays,
}

impl fmt::Display for IneligibilityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            IneligibilityReason::OnLeave => "on leave of absence",
            IneligibilityReason::Trainee => "apprentice",
            IneligibilityReason::Intern => "intern",
            IneligibilityReason::ExcludedLeaveCategory => "excluded leave category",
            IneligibilityReason::ExcludedRole => "excluded role",
            IneligibilityReason::TerminatedBeforeCutoff => "terminated before cutoff day",
            IneligibilityReason::NoPayableDays => "no payable days",
        };
        f.write_str(text)
    }
}

/// Tri-state benefit eligibility.
///
/// Transitions are monotonic: once a record is [`Eligibility::Ineligible`] it
/// never becomes eligible again, and the first reason is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Eligibility {
    /// Receives the benefit.
    #[default]
    Eligible,
    /// Excluded from the benefit.
    Ineligible(IneligibilityReason),
    /// Eligibility could not be decided (e.g. no working-day count for the union).
    Undetermined,
}

/// A single employee as it moves through consolidation and adjustment.
///
/// Records are created once per base-population row, enriched by the
/// consolidator and recomputed by the days-payable adjuster. Monetary rates
/// are decimals; `payable_days` is signed because the adjustment rules may
/// drive it below zero before it is clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    /// Canonical join key (employee registration number).
    pub id: String,
    /// Free-text union name as it appears in the active-employees table.
    pub union: String,
    /// Role title, from the base table or the admissions table.
    #[serde(default)]
    pub role_title: Option<String>,
    /// Role category derived from membership tables and the title.
    #[serde(default)]
    pub role_category: RoleCategory,
    /// Leave/situation category carried by the base table.
    #[serde(default)]
    pub leave_category: Option<String>,
    /// Admission date, if the employee was admitted recently.
    #[serde(default)]
    pub admission_date: Option<NaiveDate>,
    /// Termination date, if any.
    #[serde(default)]
    pub termination_date: Option<NaiveDate>,
    /// Termination notice status.
    #[serde(default)]
    pub notice_status: NoticeStatus,
    /// Vacation days taken in the period (0 to 31).
    #[serde(default)]
    pub vacation_days: Option<u32>,
    /// Region derived from the union name.
    #[serde(default)]
    pub region: RegionMatch,
    /// Standard working-day count of the union for the period.
    #[serde(default)]
    pub standard_days: Option<u32>,
    /// Daily transport rate resolved from the region.
    #[serde(default)]
    pub transport_daily_rate: Option<Decimal>,
    /// Daily meal rate resolved from the union agreement.
    #[serde(default)]
    pub meal_daily_rate: Option<Decimal>,
    /// Benefit eligibility.
    #[serde(default)]
    pub eligibility: Eligibility,
    /// Days payable after adjustment.
    #[serde(default)]
    pub payable_days: Option<i32>,
}

impl EmployeeRecord {
    /// Creates an eligible record with only its key and union set.
    ///
    /// # Examples
    ///
    /// ```
    /// use benefit_engine::models::{EmployeeRecord, Eligibility};
    ///
    /// let record = EmployeeRecord::new("1001", "SINDPD SP");
    /// assert_eq!(record.eligibility, Eligibility::Eligible);
    /// assert!(record.payable_days.is_none());
    /// ```
    pub fn new(id: impl Into<String>, union: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            union: union.into(),
            role_title: None,
            role_category: RoleCategory::Standard,
            leave_category: None,
            admission_date: None,
            termination_date: None,
            notice_status: NoticeStatus::Absent,
            vacation_days: None,
            region: RegionMatch::Unmatched,
            standard_days: None,
            transport_daily_rate: None,
            meal_daily_rate: None,
            eligibility: Eligibility::Eligible,
            payable_days: None,
        }
    }

    /// Returns true while the record is still eligible.
    pub fn is_eligible(&self) -> bool {
        self.eligibility == Eligibility::Eligible
    }

    /// Marks the record ineligible.
    ///
    /// Returns `true` if this call changed the eligibility. A record that is
    /// already ineligible keeps its first reason.
    ///
    /// # Examples
    ///
    /// ```
    /// use benefit_engine::models::{EmployeeRecord, Eligibility, IneligibilityReason};
    ///
    /// let mut record = EmployeeRecord::new("1001", "SINDPD SP");
    /// assert!(record.mark_ineligible(IneligibilityReason::OnLeave));
    /// assert!(!record.mark_ineligible(IneligibilityReason::Trainee));
    /// assert_eq!(
    ///     record.eligibility,
    ///     Eligibility::Ineligible(IneligibilityReason::OnLeave)
    /// );
    /// ```
    pub fn mark_ineligible(&mut self, reason: IneligibilityReason) -> bool {
        match self.eligibility {
            Eligibility::Ineligible(_) => false,
            Eligibility::Eligible | Eligibility::Undetermined => {
                self.eligibility = Eligibility::Ineligible(reason);
                true
            }
        }
    }

    /// Marks an eligible record as undetermined. Ineligible records are left alone.
    pub fn mark_undetermined(&mut self) -> bool {
        if self.eligibility == Eligibility::Eligible {
            self.eligibility = Eligibility::Undetermined;
            true
        } else {
            false
        }
    }
}
