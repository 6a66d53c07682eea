//! Benefit eligibility classification.
//!
//! [`classify`] runs after consolidation and before the days-payable
//! adjustment; [`finalize_eligibility`] runs after the adjustment and is the
//! last word before the calculator. Both only move records towards
//! ineligibility, never back.

use chrono::Datelike;
use tracing::debug;

use crate::config::Policy;
use crate::models::{
    EmployeeRecord, Eligibility, IneligibilityReason, NoticeStatus, ReferencePeriod, RoleCategory,
};

/// Returns true if a role title matches one of the excluded title fragments.
///
/// Matching is a case-insensitive substring search.
pub fn is_excluded_role(title: &str, excluded: &[String]) -> bool {
    let title = title.to_uppercase();
    excluded
        .iter()
        .map(|fragment| fragment.trim().to_uppercase())
        .any(|fragment| !fragment.is_empty() && title.contains(&fragment))
}

/// Returns true if the record has a confirmed termination that excludes it
/// from this period's benefit.
///
/// That is a termination before the period starts, or within the period on
/// or before the cutoff day.
pub fn terminated_before_cutoff(
    record: &EmployeeRecord,
    period: &ReferencePeriod,
    cutoff_day: u32,
) -> bool {
    if record.notice_status != NoticeStatus::Confirmed {
        return false;
    }
    match record.termination_date {
        Some(date) if date < period.first_day() => true,
        Some(date) if period.contains_date(date) => date.day() <= cutoff_day,
        _ => false,
    }
}

/// Classifies a consolidated record.
///
/// The record becomes ineligible if it is an apprentice or intern, carries an
/// excluded leave category or role title, or was terminated with confirmed
/// notice up to the cutoff day. A record still eligible whose union has no
/// working-day count becomes [`Eligibility::Undetermined`]. A reason already
/// set (e.g. a leave of absence found during consolidation) is kept.
///
/// # Examples
///
/// ```
/// use benefit_engine::config::Policy;
/// use benefit_engine::consolidation::classify;
/// use benefit_engine::models::{
///     EmployeeRecord, Eligibility, IneligibilityReason, ReferencePeriod, RoleCategory,
/// };
///
/// let period = ReferencePeriod::new(2025, 5).unwrap();
/// let mut record = EmployeeRecord::new("1001", "SINDPD SP");
/// record.standard_days = Some(22);
/// record.role_category = RoleCategory::Trainee;
///
/// let record = classify(record, &period, &Policy::default());
/// assert_eq!(
///     record.eligibility,
///     Eligibility::Ineligible(IneligibilityReason::Trainee)
/// );
/// ```
pub fn classify(
    mut record: EmployeeRecord,
    period: &ReferencePeriod,
    policy: &Policy,
) -> EmployeeRecord {
    match record.role_category {
        RoleCategory::Trainee => {
            record.mark_ineligible(IneligibilityReason::Trainee);
        }
        RoleCategory::Intern => {
            record.mark_ineligible(IneligibilityReason::Intern);
        }
        RoleCategory::OtherExcluded => {
            record.mark_ineligible(IneligibilityReason::ExcludedRole);
        }
        RoleCategory::Standard => {}
    }

    let excluded_leave = record.leave_category.as_deref().is_some_and(|category| {
        policy
            .excluded_leave_categories
            .iter()
            .any(|excluded| excluded.trim().to_lowercase() == category.trim().to_lowercase())
    });
    if excluded_leave {
        record.mark_ineligible(IneligibilityReason::ExcludedLeaveCategory);
    }

    let excluded_role = record
        .role_title
        .as_deref()
        .is_some_and(|title| is_excluded_role(title, &policy.excluded_role_titles));
    if excluded_role {
        if record.role_category == RoleCategory::Standard {
            record.role_category = RoleCategory::OtherExcluded;
        }
        record.mark_ineligible(IneligibilityReason::ExcludedRole);
    }

    if terminated_before_cutoff(&record, period, policy.termination_cutoff_day) {
        record.mark_ineligible(IneligibilityReason::TerminatedBeforeCutoff);
    }

    if record.standard_days.is_none() {
        record.mark_undetermined();
    }

    if !record.is_eligible() {
        debug!(id = %record.id, eligibility = ?record.eligibility, "Record classified");
    }
    record
}

/// Settles eligibility after the days-payable adjustment.
///
/// Payable days are clamped to zero or more. A record left with no payable
/// days becomes ineligible, and an eligible record with no computed days
/// becomes undetermined.
///
/// # Examples
///
/// ```
/// use benefit_engine::consolidation::finalize_eligibility;
/// use benefit_engine::models::{EmployeeRecord, Eligibility, IneligibilityReason};
///
/// let mut record = EmployeeRecord::new("1001", "SINDPD SP");
/// record.payable_days = Some(-3);
///
/// let record = finalize_eligibility(record);
/// assert_eq!(record.payable_days, Some(0));
/// assert_eq!(
///     record.eligibility,
///     Eligibility::Ineligible(IneligibilityReason::NoPayableDays)
/// );
/// ```
pub fn finalize_eligibility(mut record: EmployeeRecord) -> EmployeeRecord {
    match record.payable_days {
        Some(days) if days <= 0 => {
            record.payable_days = Some(0);
            record.mark_ineligible(IneligibilityReason::NoPayableDays);
        }
        Some(_) => {}
        None => {
            record.mark_undetermined();
        }
    }
    record
}

/// Returns a human-readable reason for a record that will not be paid.
pub fn exclusion_reason(record: &EmployeeRecord) -> Option<String> {
    match record.eligibility {
        Eligibility::Eligible => None,
        Eligibility::Ineligible(reason) => Some(reason.to_string()),
        Eligibility::Undetermined => Some(format!(
            "no working-day count for union '{}'",
            record.union
        )),
    }
}
