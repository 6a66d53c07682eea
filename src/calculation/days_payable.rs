//! Days-payable adjustment.
//!
//! Starting from the union's standard working-day count, three rules are
//! applied in a fixed order: admission proration, termination proration and
//! vacation deduction. Each rule that changes the count records an
//! [`AuditStep`].

use chrono::{Datelike, NaiveDate};

use crate::config::Policy;
use crate::models::{AuditStep, EmployeeRecord, NoticeStatus, ReferencePeriod};

/// The adjusted record and the audit trail of the rules that applied.
#[derive(Debug, Clone)]
pub struct DaysPayableResult {
    /// A new record carrying the computed `payable_days`.
    pub record: EmployeeRecord,
    /// One step per rule that changed the count, in application order.
    pub audit_steps: Vec<AuditStep>,
}

/// Prorates the standard days for an admission.
///
/// Admission after the first day of the period pays from the admission day
/// on; admission on or before the period start changes nothing; admission
/// after the period end pays nothing.
///
/// # Examples
///
/// ```
/// use benefit_engine::calculation::prorate_admission;
/// use benefit_engine::models::ReferencePeriod;
/// use chrono::NaiveDate;
///
/// let period = ReferencePeriod::new(2025, 5).unwrap();
/// let admitted = NaiveDate::from_ymd_opt(2025, 5, 10).unwrap();
/// assert_eq!(prorate_admission(22, admitted, &period), 13);
///
/// let long_ago = NaiveDate::from_ymd_opt(2020, 1, 6).unwrap();
/// assert_eq!(prorate_admission(22, long_ago, &period), 22);
/// ```
pub fn prorate_admission(days: i32, admission: NaiveDate, period: &ReferencePeriod) -> i32 {
    if admission <= period.first_day() {
        days
    } else if admission > period.last_day() {
        0
    } else {
        days - admission.day() as i32 + 1
    }
}

/// Termination proration: the termination day, when the termination falls in
/// the period after the cutoff day and the notice is confirmed.
///
/// Returns `None` when the rule does not apply. Confirmed terminations up to
/// the cutoff are left to the eligibility classifier.
pub fn prorate_termination(
    termination: NaiveDate,
    notice: NoticeStatus,
    period: &ReferencePeriod,
    cutoff_day: u32,
) -> Option<i32> {
    let applies = notice == NoticeStatus::Confirmed
        && period.contains_date(termination)
        && termination.day() > cutoff_day;
    applies.then(|| termination.day() as i32)
}

/// Deducts vacation days. A full month of vacation pays nothing.
///
/// # Examples
///
/// ```
/// use benefit_engine::calculation::deduct_vacation;
///
/// assert_eq!(deduct_vacation(22, 5, 30), 17);
/// assert_eq!(deduct_vacation(22, 30, 30), 0);
/// assert_eq!(deduct_vacation(10, 12, 30), -2);
/// ```
pub fn deduct_vacation(days: i32, vacation_days: u32, full_month_days: u32) -> i32 {
    if vacation_days >= full_month_days {
        0
    } else {
        days.saturating_sub(i32::try_from(vacation_days).unwrap_or(i32::MAX))
    }
}

/// Computes the payable days of a record.
///
/// Records without a standard working-day count, or with one too large to be
/// a day count, pass through with no payable days. Records with no admission,
/// termination or vacation data are paid their standard days. The result is
/// not clamped; a negative count is settled by
/// [`crate::consolidation::finalize_eligibility`].
///
/// # Examples
///
/// ```
/// use benefit_engine::calculation::adjust_days_payable;
/// use benefit_engine::config::Policy;
/// use benefit_engine::models::{EmployeeRecord, ReferencePeriod};
/// use chrono::NaiveDate;
///
/// let period = ReferencePeriod::new(2025, 5).unwrap();
/// let mut record = EmployeeRecord::new("1001", "SINDPD SP");
/// record.standard_days = Some(22);
/// record.admission_date = NaiveDate::from_ymd_opt(2025, 5, 10);
///
/// let result = adjust_days_payable(&record, &period, &Policy::default());
/// assert_eq!(result.record.payable_days, Some(13));
/// assert_eq!(result.audit_steps.len(), 1);
/// ```
pub fn adjust_days_payable(
    record: &EmployeeRecord,
    period: &ReferencePeriod,
    policy: &Policy,
) -> DaysPayableResult {
    let mut adjusted = record.clone();
    let mut audit_steps = Vec::new();

    let Some(mut days) = record
        .standard_days
        .and_then(|standard_days| i32::try_from(standard_days).ok())
    else {
        adjusted.payable_days = None;
        return DaysPayableResult {
            record: adjusted,
            audit_steps,
        };
    };

    let mut step_number = 1;

    if let Some(admission) = record.admission_date {
        let prorated = prorate_admission(days, admission, period);
        if prorated != days {
            audit_steps.push(AuditStep {
                step_number,
                rule_id: "admission_proration".to_string(),
                rule_name: "Admission Proration".to_string(),
                input: serde_json::json!({
                    "payable_days": days,
                    "admission_date": admission.to_string(),
                    "period": period.to_string()
                }),
                output: serde_json::json!({ "payable_days": prorated }),
                reasoning: if admission > period.last_day() {
                    format!("Admitted on {} after the period ends, nothing payable", admission)
                } else {
                    format!("{} - {} + 1 = {}", days, admission.day(), prorated)
                },
            });
            step_number += 1;
            days = prorated;
        }
    }

    if let Some(termination) = record.termination_date {
        if let Some(prorated) = prorate_termination(
            termination,
            record.notice_status,
            period,
            policy.termination_cutoff_day,
        ) {
            audit_steps.push(AuditStep {
                step_number,
                rule_id: "termination_proration".to_string(),
                rule_name: "Termination Proration".to_string(),
                input: serde_json::json!({
                    "payable_days": days,
                    "termination_date": termination.to_string(),
                    "cutoff_day": policy.termination_cutoff_day
                }),
                output: serde_json::json!({ "payable_days": prorated }),
                reasoning: format!(
                    "Confirmed termination on day {} after day {}, paid up to the termination day",
                    termination.day(),
                    policy.termination_cutoff_day
                ),
            });
            step_number += 1;
            days = prorated;
        }
    }

    if let Some(vacation_days) = record.vacation_days.filter(|v| *v > 0) {
        let deducted = deduct_vacation(days, vacation_days, policy.full_month_vacation_days);
        audit_steps.push(AuditStep {
            step_number,
            rule_id: "vacation_deduction".to_string(),
            rule_name: "Vacation Deduction".to_string(),
            input: serde_json::json!({
                "payable_days": days,
                "vacation_days": vacation_days
            }),
            output: serde_json::json!({ "payable_days": deducted }),
            reasoning: if vacation_days >= policy.full_month_vacation_days {
                format!("{} vacation days cover the whole month", vacation_days)
            } else {
                format!("{} - {} = {}", days, vacation_days, deducted)
            },
        });
        days = deducted;
    }

    adjusted.payable_days = Some(days);
    DaysPayableResult {
        record: adjusted,
        audit_steps,
    }
}
