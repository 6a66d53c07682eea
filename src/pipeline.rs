//! End-to-end orchestration of a monthly benefit run.
//!
//! Stages run once, in order, each consuming the previous stage's output:
//! load, normalize and extract the sources, consolidate, classify, adjust
//! payable days, settle eligibility and calculate amounts.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{adjust_days_payable, calculate_benefits};
use crate::config::{EngineConfig, Policy, SourceKind};
use crate::consolidation::{Consolidator, RegionClassifier, classify, finalize_eligibility};
use crate::error::EngineResult;
use crate::external::RuleExtractor;
use crate::ingest::{RecordLoader, SourceInputs};
use crate::models::{
    AuditStep, BenefitReport, DuplicateKey, EmployeeRecord, ExcludedRecord, IssueKind,
    ReferencePeriod, RunIssue,
};

/// The adjustment steps applied to one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordAudit {
    /// Employee identifier.
    pub id: String,
    /// Steps in application order.
    pub steps: Vec<AuditStep>,
}

/// The outcome of evaluating consolidated records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// The benefit report.
    pub report: BenefitReport,
    /// Records left out of the report, with the reason.
    pub excluded: Vec<ExcludedRecord>,
    /// Non-fatal issues raised while calculating.
    pub issues: Vec<RunIssue>,
    /// Adjustment audit of every record whose payable days were adjusted.
    pub audit: Vec<RecordAudit>,
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// The benefit report.
    pub report: BenefitReport,
    /// Duplicate join keys, for manual review.
    pub duplicates: Vec<DuplicateKey>,
    /// Records left out of the report.
    pub excluded: Vec<ExcludedRecord>,
    /// Every non-fatal issue of the run, in stage order.
    pub issues: Vec<RunIssue>,
    /// Adjustment audit per record.
    pub audit: Vec<RecordAudit>,
}

/// Classifies, adjusts and calculates already consolidated records.
///
/// This is the part of a run that does not touch the filesystem; the HTTP
/// surface calls it directly.
///
/// # Example
///
/// ```
/// use benefit_engine::config::Policy;
/// use benefit_engine::models::{EmployeeRecord, ReferencePeriod};
/// use benefit_engine::pipeline::evaluate_records;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let mut record = EmployeeRecord::new("1001", "SINDPD SP");
/// record.standard_days = Some(22);
/// record.transport_daily_rate = Some(Decimal::new(3750, 2));
///
/// let evaluation = evaluate_records(
///     vec![record],
///     ReferencePeriod::new(2025, 5).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 5, 2).unwrap(),
///     &Policy::default(),
/// );
/// assert_eq!(evaluation.report.rows[0].payable_days, 22);
/// ```
pub fn evaluate_records(
    records: Vec<EmployeeRecord>,
    period: ReferencePeriod,
    processing_date: NaiveDate,
    policy: &Policy,
) -> Evaluation {
    let mut audit = Vec::new();

    let finalized: Vec<EmployeeRecord> = records
        .into_iter()
        .map(|record| classify(record, &period, policy))
        .map(|record| {
            let adjusted = adjust_days_payable(&record, &period, policy);
            if !adjusted.audit_steps.is_empty() {
                audit.push(RecordAudit {
                    id: adjusted.record.id.clone(),
                    steps: adjusted.audit_steps,
                });
            }
            finalize_eligibility(adjusted.record)
        })
        .collect();

    let calculation = calculate_benefits(&finalized, processing_date);
    for excluded in &calculation.excluded {
        warn!(id = %excluded.id, reason = %excluded.reason, "Record excluded from report");
    }

    Evaluation {
        report: BenefitReport {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            period,
            processing_date,
            rows: calculation.rows,
            totals: calculation.totals,
        },
        excluded: calculation.excluded,
        issues: calculation.issues,
        audit,
    }
}

/// Resolves the daily meal rate of every union with an agreement document.
///
/// Only unions present in the base population are looked up. Failures are
/// returned as [`IssueKind::ExtractionFailed`] issues and leave the union
/// without a meal rate.
pub fn resolve_meal_rates(
    inputs: &SourceInputs,
    extractor: &dyn RuleExtractor,
) -> (BTreeMap<String, Decimal>, Vec<RunIssue>) {
    let mut rates = BTreeMap::new();
    let mut issues = Vec::new();

    let unions: BTreeSet<&str> = inputs.active.iter().map(|a| a.union.as_str()).collect();
    for union in unions {
        let Some(document) = inputs.union_documents.get(union) else {
            continue;
        };
        match extractor.extract(document) {
            Ok(rule) => {
                info!(union, rate = %rule.daily_rate, "Meal rate resolved from agreement");
                rates.insert(union.to_string(), rule.daily_rate);
            }
            Err(error) => {
                warn!(union, %error, "Agreement rule could not be extracted");
                issues.push(
                    RunIssue::new(IssueKind::ExtractionFailed, error.to_string())
                        .with_source(SourceKind::UnionDocuments.as_str()),
                );
            }
        }
    }

    (rates, issues)
}

/// A configured benefit run.
///
/// # Example
///
/// ```no_run
/// use benefit_engine::config::ConfigLoader;
/// use benefit_engine::models::ReferencePeriod;
/// use benefit_engine::pipeline::Pipeline;
/// use chrono::NaiveDate;
///
/// let loader = ConfigLoader::load("./config/default")?;
/// let output = Pipeline::new(loader.config()).run(
///     "./dados",
///     ReferencePeriod::new(2025, 5).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 5, 2).unwrap(),
/// )?;
/// println!("{} rows", output.report.rows.len());
/// # Ok::<(), benefit_engine::error::EngineError>(())
/// ```
pub struct Pipeline<'a> {
    config: &'a EngineConfig,
    extractor: Option<&'a dyn RuleExtractor>,
}

impl<'a> Pipeline<'a> {
    /// Creates a run over the given configuration. Meal rates are not resolved.
    pub fn new(config: &'a EngineConfig) -> Self {
        Self {
            config,
            extractor: None,
        }
    }

    /// Resolves meal rates from union agreements with `extractor`.
    pub fn with_rule_extractor(mut self, extractor: &'a dyn RuleExtractor) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Runs every stage over the files in `input_dir`.
    ///
    /// Fails only on fatal input problems (missing file, missing column);
    /// everything else ends up in [`PipelineOutput::issues`].
    pub fn run<P: AsRef<Path>>(
        &self,
        input_dir: P,
        period: ReferencePeriod,
        processing_date: NaiveDate,
    ) -> EngineResult<PipelineOutput> {
        let input_dir = input_dir.as_ref();
        let start_time = Instant::now();
        info!(period = %period, input = %input_dir.display(), "Starting benefit run");

        let tables = RecordLoader::new(self.config.sources()).load_all(input_dir)?;
        let extracted = SourceInputs::from_tables(tables, self.config.date_formats(), input_dir)?;
        let mut issues = extracted.issues;

        let meal_rates = match self.extractor {
            Some(extractor) => {
                let (rates, extraction_issues) = resolve_meal_rates(&extracted.inputs, extractor);
                issues.extend(extraction_issues);
                rates
            }
            None => BTreeMap::new(),
        };

        let consolidation = Consolidator::new(RegionClassifier::new(self.config.regions()))
            .with_meal_rates(meal_rates)
            .consolidate(&extracted.inputs);
        issues.extend(consolidation.issues);

        let evaluation = evaluate_records(
            consolidation.records,
            period,
            processing_date,
            self.config.policy(),
        );
        issues.extend(evaluation.issues);

        info!(
            run_id = %evaluation.report.run_id,
            rows = evaluation.report.rows.len(),
            excluded = evaluation.excluded.len(),
            duplicates = extracted.duplicates.len(),
            issues = issues.len(),
            total = %evaluation.report.totals.total,
            duration_ms = start_time.elapsed().as_millis(),
            "Benefit run complete"
        );

        Ok(PipelineOutput {
            report: evaluation.report,
            duplicates: extracted.duplicates,
            excluded: evaluation.excluded,
            issues,
            audit: evaluation.audit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::external::ExtractedRule;
    use crate::ingest::ActiveEmployee;
    use crate::models::{Eligibility, IneligibilityReason};
    use std::path::PathBuf;

    fn period() -> ReferencePeriod {
        ReferencePeriod::new(2025, 5).unwrap()
    }

    fn processing_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 2).unwrap()
    }

    fn record(id: &str) -> EmployeeRecord {
        let mut record = EmployeeRecord::new(id, "SINDPD SP");
        record.standard_days = Some(22);
        record.transport_daily_rate = Some(Decimal::new(3750, 2));
        record
    }

    struct FixedExtractor;

    impl RuleExtractor for FixedExtractor {
        fn extract(&self, document: &Path) -> EngineResult<ExtractedRule> {
            if document.ends_with("missing.txt") {
                return Err(EngineError::ExtractionError {
                    document: document.display().to_string(),
                    message: "no daily amount found".to_string(),
                });
            }
            Ok(ExtractedRule {
                daily_rate: Decimal::new(4000, 2),
                rule_text: "R$ 40,00".to_string(),
            })
        }
    }

    #[test]
    fn test_evaluate_admission_and_vacation() {
        let mut admitted = record("1001");
        admitted.admission_date = NaiveDate::from_ymd_opt(2025, 5, 10);
        let mut on_vacation = record("1002");
        on_vacation.vacation_days = Some(30);

        let evaluation = evaluate_records(
            vec![admitted, on_vacation],
            period(),
            processing_date(),
            &Policy::default(),
        );

        assert_eq!(evaluation.report.rows.len(), 1);
        assert_eq!(evaluation.report.rows[0].payable_days, 13);
        assert_eq!(evaluation.excluded[0].id, "1002");
        assert_eq!(
            evaluation.excluded[0].reason,
            IneligibilityReason::NoPayableDays.to_string()
        );
        assert_eq!(evaluation.audit.len(), 2);
        assert_eq!(evaluation.report.totals.rows, 1);
    }

    #[test]
    fn test_evaluate_never_reports_ineligible_records() {
        let mut trainee = record("1001");
        trainee.role_category = crate::models::RoleCategory::Trainee;
        let mut on_leave = record("1002");
        on_leave.eligibility = Eligibility::Ineligible(IneligibilityReason::OnLeave);

        let evaluation = evaluate_records(
            vec![trainee, on_leave, record("1003")],
            period(),
            processing_date(),
            &Policy::default(),
        );

        let ids: Vec<&str> = evaluation.report.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1003"]);
        assert_eq!(evaluation.excluded.len(), 2);
    }

    #[test]
    fn test_evaluate_excludes_record_with_unrepresentable_amount() {
        let mut huge = record("1001");
        huge.transport_daily_rate = Some(Decimal::MAX);

        let evaluation = evaluate_records(
            vec![huge, record("1002")],
            period(),
            processing_date(),
            &Policy::default(),
        );

        assert_eq!(evaluation.report.rows.len(), 1);
        assert_eq!(evaluation.report.totals.rows, 1);
        assert_eq!(evaluation.excluded[0].id, "1001");
        assert_eq!(evaluation.issues[0].kind, IssueKind::InvalidRecord);
        assert_eq!(evaluation.issues[0].key.as_deref(), Some("1001"));
    }

    #[test]
    fn test_resolve_meal_rates_only_for_present_unions() {
        let mut inputs = SourceInputs::default();
        inputs.active.push(ActiveEmployee {
            id: "1001".to_string(),
            union: "SINDPD SP".to_string(),
            role_title: None,
            leave_category: None,
        });
        inputs.active.push(ActiveEmployee {
            id: "1002".to_string(),
            union: "SINDPD RJ".to_string(),
            role_title: None,
            leave_category: None,
        });
        inputs
            .union_documents
            .insert("SINDPD SP".to_string(), PathBuf::from("sp.txt"));
        inputs
            .union_documents
            .insert("SINDPD RJ".to_string(), PathBuf::from("missing.txt"));
        inputs
            .union_documents
            .insert("SITEPD PR".to_string(), PathBuf::from("pr.txt"));

        let (rates, issues) = resolve_meal_rates(&inputs, &FixedExtractor);

        assert_eq!(rates.len(), 1);
        assert_eq!(rates.get("SINDPD SP"), Some(&Decimal::new(4000, 2)));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::ExtractionFailed);
    }
}
