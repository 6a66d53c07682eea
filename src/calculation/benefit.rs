//! Benefit amount calculation.
//!
//! Projects finalized employee records into report rows. Every amount is
//! `payable_days * daily_rate`, split between employer and employee with the
//! fixed [`EMPLOYER_SHARE`] and [`EMPLOYEE_SHARE`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::consolidation::exclusion_reason;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    BenefitKind, BenefitLine, BenefitReportRow, EmployeeRecord, ExcludedRecord, IssueKind,
    ReportTotals, RunIssue,
};

/// Share of the benefit paid by the employer (80%).
pub const EMPLOYER_SHARE: Decimal = Decimal::from_parts(8, 0, 0, false, 1);

/// Share of the benefit discounted from the employee (20%).
pub const EMPLOYEE_SHARE: Decimal = Decimal::from_parts(2, 0, 0, false, 1);

/// Rows, exclusions and issues produced by [`calculate_benefits`].
#[derive(Debug, Clone, Default)]
pub struct BenefitCalculation {
    /// One row per eligible record, in input order.
    pub rows: Vec<BenefitReportRow>,
    /// Sums over `rows`.
    pub totals: ReportTotals,
    /// Records left out, with their reason.
    pub excluded: Vec<ExcludedRecord>,
    /// Missing rates and rejected records.
    pub issues: Vec<RunIssue>,
}

impl BenefitCalculation {
    fn reject(&mut self, id: &str, message: String) {
        let error = EngineError::InvalidRecord {
            key: id.to_string(),
            message,
        };
        warn!(id, %error, "Record excluded from report");
        self.issues
            .push(RunIssue::new(IssueKind::InvalidRecord, error.to_string()).with_key(id));
        self.excluded.push(ExcludedRecord {
            id: id.to_string(),
            reason: error.to_string(),
        });
    }
}

/// Computes the amounts of one benefit.
///
/// The employer cost is rounded to cents and the employee share is the
/// remainder, so the two parts always add up to the total. Fails with
/// [`EngineError::CalculationError`] when the amounts do not fit a decimal.
///
/// # Examples
///
/// ```
/// use benefit_engine::calculation::calculate_line;
/// use benefit_engine::models::BenefitKind;
/// use rust_decimal::Decimal;
///
/// let line = calculate_line(BenefitKind::Transport, 22, Decimal::new(3750, 2))?;
/// assert_eq!(line.total, Decimal::new(82500, 2));
/// assert_eq!(line.employer_cost, Decimal::new(66000, 2));
/// assert_eq!(line.employee_share, Decimal::new(16500, 2));
///
/// assert!(calculate_line(BenefitKind::Meal, 22, Decimal::MAX).is_err());
/// # Ok::<(), benefit_engine::error::EngineError>(())
/// ```
pub fn calculate_line(
    kind: BenefitKind,
    payable_days: u32,
    daily_rate: Decimal,
) -> EngineResult<BenefitLine> {
    let overflow = || EngineError::CalculationError {
        message: format!(
            "{} days at daily rate {} overflows the {:?} amount",
            payable_days, daily_rate, kind
        ),
    };

    let total = Decimal::from(payable_days)
        .checked_mul(daily_rate)
        .ok_or_else(overflow)?
        .round_dp(2);
    let employer_cost = total
        .checked_mul(EMPLOYER_SHARE)
        .ok_or_else(overflow)?
        .round_dp(2);
    let employee_share = total.checked_sub(employer_cost).ok_or_else(overflow)?;

    Ok(BenefitLine {
        kind,
        daily_rate,
        total,
        employer_cost,
        employee_share,
    })
}

/// Builds the row of an eligible record; a missing transport rate gives a
/// zero transport line and an observation.
fn report_row(
    record: &EmployeeRecord,
    payable_days: u32,
    processing_date: NaiveDate,
) -> EngineResult<BenefitReportRow> {
    let (transport, observation) = match record.transport_daily_rate {
        Some(rate) => (
            calculate_line(BenefitKind::Transport, payable_days, rate)?,
            String::new(),
        ),
        None => {
            let error = EngineError::RateNotFound {
                union: record.union.clone(),
            };
            (
                calculate_line(BenefitKind::Transport, payable_days, Decimal::ZERO)?,
                error.to_string(),
            )
        }
    };

    let meal = record
        .meal_daily_rate
        .map(|rate| calculate_line(BenefitKind::Meal, payable_days, rate))
        .transpose()?;

    Ok(BenefitReportRow {
        id: record.id.clone(),
        admission_date: record.admission_date,
        union: record.union.clone(),
        processing_date,
        payable_days,
        transport,
        meal,
        observation,
    })
}

/// Projects finalized records into report rows.
///
/// Only eligible records produce rows; every other record is listed in
/// [`BenefitCalculation::excluded`]. A record without a transport rate still
/// gets a row, with zero amounts and an observation, and a
/// [`IssueKind::MissingRate`] issue. A record whose amounts, or whose
/// contribution to the totals, overflow is excluded with an
/// [`IssueKind::InvalidRecord`] issue. Input records are not modified.
pub fn calculate_benefits(
    records: &[EmployeeRecord],
    processing_date: NaiveDate,
) -> BenefitCalculation {
    let mut calculation = BenefitCalculation::default();

    for record in records {
        if let Some(reason) = exclusion_reason(record) {
            calculation.excluded.push(ExcludedRecord {
                id: record.id.clone(),
                reason,
            });
            continue;
        }

        let Some(Ok(payable_days)) = record.payable_days.map(u32::try_from) else {
            calculation.reject(
                &record.id,
                format!(
                    "eligible record has no valid payable days ({:?})",
                    record.payable_days
                ),
            );
            continue;
        };

        let row = match report_row(record, payable_days, processing_date) {
            Ok(row) => row,
            Err(error) => {
                calculation.reject(&record.id, error.to_string());
                continue;
            }
        };
        let Some(totals) = calculation.totals.checked_add_row(&row) else {
            calculation.reject(&record.id, "amounts overflow the report totals".to_string());
            continue;
        };

        if record.transport_daily_rate.is_none() {
            warn!(
                id = %record.id,
                observation = %row.observation,
                "Transport amounts set to zero"
            );
            calculation.issues.push(
                RunIssue::new(IssueKind::MissingRate, row.observation.clone())
                    .with_key(&record.id),
            );
        }
        calculation.totals = totals;
        calculation.rows.push(row);
    }

    info!(
        rows = calculation.rows.len(),
        excluded = calculation.excluded.len(),
        "Benefit amounts calculated"
    );

    calculation
}
