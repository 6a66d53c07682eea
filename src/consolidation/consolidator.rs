//! The join sequence that turns source inputs into employee records.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::config::SourceKind;
use crate::ingest::SourceInputs;
use crate::models::{
    EmployeeRecord, IneligibilityReason, IssueKind, RegionMatch, RoleCategory, RunIssue,
};

use super::RegionClassifier;

/// Output of a consolidation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Consolidation {
    /// One record per base-population row, in base order.
    pub records: Vec<EmployeeRecord>,
    /// Auxiliary rows with no base counterpart, by source.
    pub unmatched: BTreeMap<SourceKind, usize>,
    /// Unmatched rows, regions and working days worth reviewing.
    pub issues: Vec<RunIssue>,
}

/// Joins the auxiliary sources onto the base population.
///
/// Joins are left joins keyed on the normalized employee key, applied in a
/// fixed order: vacations, terminations, admissions, leaves, apprentice and
/// intern membership, region and rate, working days. Base rows are never
/// dropped and auxiliary rows never add records.
///
/// # Example
///
/// ```
/// use benefit_engine::consolidation::{Consolidator, RegionClassifier};
/// use benefit_engine::ingest::{ActiveEmployee, SourceInputs};
///
/// let mut inputs = SourceInputs::default();
/// inputs.active.push(ActiveEmployee {
///     id: "1001".to_string(),
///     union: "SINDPD SP".to_string(),
///     role_title: None,
///     leave_category: None,
/// });
/// inputs.vacations.insert("1001".to_string(), 5);
/// inputs.vacations.insert("9999".to_string(), 3);
///
/// let consolidation = Consolidator::new(RegionClassifier::default()).consolidate(&inputs);
/// assert_eq!(consolidation.records.len(), 1);
/// assert_eq!(consolidation.records[0].vacation_days, Some(5));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Consolidator {
    classifier: RegionClassifier,
    meal_rates: BTreeMap<String, Decimal>,
}

impl Consolidator {
    /// Creates a consolidator with the given region classifier.
    pub fn new(classifier: RegionClassifier) -> Self {
        Self {
            classifier,
            meal_rates: BTreeMap::new(),
        }
    }

    /// Daily meal rates by exact union name, resolved from the union agreements.
    pub fn with_meal_rates(mut self, meal_rates: BTreeMap<String, Decimal>) -> Self {
        self.meal_rates = meal_rates;
        self
    }

    /// Runs the join sequence.
    ///
    /// This is a pure function of `inputs`; running it twice yields equal output.
    pub fn consolidate(&self, inputs: &SourceInputs) -> Consolidation {
        let mut consolidation = Consolidation::default();
        let base: BTreeSet<&str> = inputs.active.iter().map(|a| a.id.as_str()).collect();

        self.count_unmatched(inputs, &base, &mut consolidation);

        let mut unmatched_regions = BTreeSet::new();
        let mut missing_days = BTreeSet::new();

        for active in &inputs.active {
            let mut record = EmployeeRecord::new(active.id.as_str(), active.union.as_str());
            record.role_title = active.role_title.clone();
            record.leave_category = active.leave_category.clone();

            record.vacation_days = inputs.vacations.get(&record.id).copied();

            if let Some(termination) = inputs.terminations.get(&record.id) {
                record.termination_date = termination.date;
                record.notice_status = termination.notice;
            }

            if let Some(admission) = inputs.admissions.get(&record.id) {
                record.admission_date = admission.date;
                if record.role_title.is_none() {
                    record.role_title = admission.role.clone();
                }
            }

            if let Some(category) = inputs.leaves.get(&record.id) {
                record.mark_ineligible(IneligibilityReason::OnLeave);
                if record.leave_category.is_none() {
                    record.leave_category = category.clone();
                }
            }

            if inputs.apprentices.contains(&record.id) {
                record.role_category = RoleCategory::Trainee;
            } else if inputs.interns.contains(&record.id) {
                record.role_category = RoleCategory::Intern;
            }

            record.region = self.classifier.classify(&record.union);
            match &record.region {
                RegionMatch::Matched(region) => {
                    record.transport_daily_rate = inputs.region_rates.rate(region);
                }
                RegionMatch::Unmatched => {
                    unmatched_regions.insert(record.union.clone());
                }
            }

            record.standard_days = inputs.working_days.days(&record.union);
            if record.standard_days.is_none() {
                missing_days.insert(record.union.clone());
            }

            record.meal_daily_rate = self.meal_rates.get(&record.union).copied();

            consolidation.records.push(record);
        }

        for union in unmatched_regions {
            warn!(union = %union, "Union does not match any configured region");
            consolidation.issues.push(RunIssue::new(
                IssueKind::UnmatchedRegion,
                format!("union '{}' does not match any configured region", union),
            ));
        }
        for union in missing_days {
            warn!(union = %union, "Union has no working-day count");
            consolidation.issues.push(
                RunIssue::new(
                    IssueKind::MissingWorkingDays,
                    format!("union '{}' has no working-day count", union),
                )
                .with_source(SourceKind::WorkingDays.as_str()),
            );
        }

        info!(
            records = consolidation.records.len(),
            unmatched_rows = consolidation.unmatched.values().sum::<usize>(),
            "Consolidation complete"
        );

        consolidation
    }

    fn count_unmatched(
        &self,
        inputs: &SourceInputs,
        base: &BTreeSet<&str>,
        consolidation: &mut Consolidation,
    ) {
        let keyed: [(SourceKind, Vec<&String>); 6] = [
            (SourceKind::Vacations, inputs.vacations.keys().collect()),
            (SourceKind::Terminations, inputs.terminations.keys().collect()),
            (SourceKind::Admissions, inputs.admissions.keys().collect()),
            (SourceKind::Leaves, inputs.leaves.keys().collect()),
            (SourceKind::Apprentices, inputs.apprentices.iter().collect()),
            (SourceKind::Interns, inputs.interns.iter().collect()),
        ];

        for (source, keys) in keyed {
            let count = keys.iter().filter(|k| !base.contains(k.as_str())).count();
            if count == 0 {
                continue;
            }
            warn!(source = %source, count, "Rows without a base employee were dropped");
            consolidation.unmatched.insert(source, count);
            consolidation.issues.push(
                RunIssue::new(
                    IssueKind::UnmatchedRow,
                    format!("{} rows have no matching active employee", count),
                )
                .with_source(source.as_str()),
            );
        }
    }
}
