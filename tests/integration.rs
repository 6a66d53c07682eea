//! Integration tests for the benefit engine.
//!
//! Every test writes a complete month of source files (May 2025) into a
//! temporary directory and runs the pipeline with `config/default`:
//! - Pass-through and admission/termination/vacation adjustments
//! - Eligibility exclusions (leave, apprentice, intern, role, maternity)
//! - Duplicate keys and key normalization
//! - Missing rates, unmatched unions and fatal input errors
//! - Agreement meal rates, written outputs and the HTTP surface

use std::fs;
use std::path::Path;
use std::str::FromStr;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use benefit_engine::api::{AppState, create_router};
use benefit_engine::config::{ConfigLoader, SourceKind};
use benefit_engine::error::EngineError;
use benefit_engine::external::{CachedRuleExtractor, TextRuleExtractor};
use benefit_engine::models::{BenefitReportRow, IssueKind, ReferencePeriod};
use benefit_engine::pipeline::{Pipeline, PipelineOutput};
use benefit_engine::report::{REPORT_COLUMNS, ReportWriter};

// =============================================================================
// Test Helpers
// =============================================================================

const SP: &str = "SINDPD SP - SIND.TRAB.EM PROC DADOS E EMPR.EMPRESAS PROC DADOS ESTADO DE SP.";
const RJ: &str = "SINDPD RJ - SINDICATO PROFISSIONAIS DE PROC DADOS DO RIO DE JANEIRO";
const PR: &str = "SITEPD PR - SIND DOS TRAB EM EMPR PRIVADAS DE PROC DE DADOS DE CURITIBA E REGIAO METROPOLITANA";

fn decimal(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn period() -> ReferencePeriod {
    ReferencePeriod::new(2025, 5).unwrap()
}

fn processing_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 5, 2).unwrap()
}

fn load_config() -> ConfigLoader {
    ConfigLoader::load("./config/default").expect("Failed to load config")
}

fn write(dir: &Path, file: &str, lines: &[&str]) {
    fs::write(dir.join(file), lines.join("\n") + "\n").unwrap();
}

fn write_fixture(dir: &Path) {
    let active_header = "MATRICULA;TITULO DO CARGO;DESC. SITUACAO;Sindicato";
    let active_rows = [
        format!("1001;ANALISTA DE SISTEMAS;Trabalhando;{SP}"),
        format!("1002;ANALISTA DE SISTEMAS;Trabalhando;{SP}"),
        format!("1003;DESENVOLVEDOR;Trabalhando;{SP}"),
        format!("1004;DESENVOLVEDOR;Trabalhando;{SP}"),
        format!("1005;DESENVOLVEDOR;Trabalhando;{SP}"),
        format!("1006;APRENDIZ;Trabalhando;{SP}"),
        format!("1007;ESTAGIARIO;Trabalhando;{SP}"),
        format!("1008;ANALISTA;Trabalhando;{SP}"),
        format!("1009;DIRETOR COMERCIAL;Trabalhando;{SP}"),
        "1010;ANALISTA;Trabalhando;SINDICATO SEM CADASTRO".to_string(),
        format!("1011;ANALISTA;Licença Maternidade;{SP}"),
        format!("1012;ANALISTA;Trabalhando;{RJ}"),
        format!("1013;ANALISTA;Trabalhando;{SP}"),
        format!("1014;ANALISTA;Trabalhando;{PR}"),
        format!("0015;ANALISTA;Trabalhando;{SP}"),
        format!("1001;ANALISTA DUPLICADO;Trabalhando;{RJ}"),
    ];
    let mut active: Vec<&str> = vec![active_header];
    active.extend(active_rows.iter().map(String::as_str));
    write(dir, "1.ativos.csv", &active);

    write(
        dir,
        "2.ferias.csv",
        &[
            "MATRICULA;DESC. SITUACAO;DIAS DE FÉRIAS",
            "1005;Férias;30",
            "1012;Férias;5",
            "1013;Férias;10",
            "01013;Férias;3",
            "9999;Férias;4",
        ],
    );
    write(
        dir,
        "3.desligados.csv",
        &[
            "MATRICULA ;DATA DEMISSÃO;COMUNICADO DE DESLIGAMENTO",
            "1003;05/20/2025;OK",
            "1004;05/10/2025;OK",
        ],
    );
    write(
        dir,
        "4.admissao_abril.csv",
        &[
            "MATRICULA;Admissão;Cargo",
            "1002;05/10/2025;ANALISTA DE SISTEMAS",
            "1003;05/10/2025;DESENVOLVEDOR",
            "15.0;05/20/2025;ANALISTA",
        ],
    );
    write(
        dir,
        "5.base_sindicato_x_valor.csv",
        &[
            "ESTADO,VALOR",
            "São Paulo,37.5",
            "Rio de Janeiro,\"R$ 35,00\"",
            "Rio Grande do Sul,35.0",
        ],
    );
    let working_days = [
        "Dias úteis maio/2025;".to_string(),
        "SINDICATO;DIAS UTEIS".to_string(),
        format!("{SP};22"),
        format!("{RJ};21"),
        format!("{PR};23"),
    ];
    let working_days: Vec<&str> = working_days.iter().map(String::as_str).collect();
    write(dir, "6.dias_uteis.csv", &working_days);
    write(
        dir,
        "afastamentos.csv",
        &["MATRICULA;DESC. SITUACAO", "1008;Auxílio Doença"],
    );
    write(dir, "aprendiz.csv", &["MATRICULA;TITULO DO CARGO", "1006;APRENDIZ"]);
    write(dir, "estagio.csv", &["MATRICULA;TITULO DO CARGO", "1007;ESTAGIARIO"]);
}

fn run(dir: &Path) -> PipelineOutput {
    let loader = load_config();
    Pipeline::new(loader.config())
        .run(dir, period(), processing_date())
        .expect("pipeline run failed")
}

fn fixture_run() -> PipelineOutput {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    run(dir.path())
}

fn row<'a>(output: &'a PipelineOutput, id: &str) -> &'a BenefitReportRow {
    output
        .report
        .rows
        .iter()
        .find(|r| r.id == id)
        .unwrap_or_else(|| panic!("no report row for {}", id))
}

fn excluded_reason(output: &PipelineOutput, id: &str) -> String {
    output
        .excluded
        .iter()
        .find(|e| e.id == id)
        .map(|e| e.reason.clone())
        .unwrap_or_else(|| panic!("{} was not excluded", id))
}

// =============================================================================
// Adjustment Scenarios
// =============================================================================

#[test]
fn test_report_rows_and_exclusions() {
    let output = fixture_run();

    let ids: Vec<&str> = output.report.rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["1001", "1002", "1003", "1012", "1013", "1014", "15"]);
    assert_eq!(output.excluded.len(), 8);
    assert_eq!(output.report.totals.rows, 7);
    assert_eq!(output.report.period, period());
}

#[test]
fn test_no_adjustment_data_pays_standard_days() {
    let output = fixture_run();
    let row = row(&output, "1001");

    assert_eq!(row.payable_days, 22);
    assert_eq!(row.union, SP);
    assert_eq!(row.processing_date, processing_date());
    assert_eq!(row.transport.daily_rate, decimal("37.5"));
    assert_eq!(row.transport.total, decimal("825.00"));
    assert_eq!(row.transport.employer_cost, decimal("660.00"));
    assert_eq!(row.transport.employee_share, decimal("165.00"));
}

#[test]
fn test_admission_on_day_10_pays_13_days() {
    let output = fixture_run();
    let row = row(&output, "1002");

    assert_eq!(row.payable_days, 13);
    assert_eq!(row.admission_date, NaiveDate::from_ymd_opt(2025, 5, 10));
    assert_eq!(row.transport.total, decimal("487.50"));

    let audit = output.audit.iter().find(|a| a.id == "1002").unwrap();
    assert_eq!(audit.steps[0].rule_id, "admission_proration");
}

#[test]
fn test_confirmed_termination_on_day_20_overrides_admission() {
    let output = fixture_run();
    assert_eq!(row(&output, "1003").payable_days, 20);
}

#[test]
fn test_confirmed_termination_before_cutoff_is_excluded() {
    let output = fixture_run();
    assert_eq!(excluded_reason(&output, "1004"), "terminated before cutoff day");
}

#[test]
fn test_full_month_vacation_is_excluded() {
    let output = fixture_run();
    assert_eq!(excluded_reason(&output, "1005"), "no payable days");
}

#[test]
fn test_partial_vacation_is_deducted() {
    let output = fixture_run();
    let row = row(&output, "1012");

    assert_eq!(row.payable_days, 16);
    assert_eq!(row.transport.daily_rate, decimal("35.00"));
    assert_eq!(row.transport.total, decimal("560.00"));
}

// =============================================================================
// Eligibility
// =============================================================================

#[test]
fn test_membership_and_leave_exclusions() {
    let output = fixture_run();

    assert_eq!(excluded_reason(&output, "1006"), "apprentice");
    assert_eq!(excluded_reason(&output, "1007"), "intern");
    assert_eq!(excluded_reason(&output, "1008"), "on leave of absence");
    assert_eq!(excluded_reason(&output, "1009"), "excluded role");
    assert_eq!(excluded_reason(&output, "1011"), "excluded leave category");
}

#[test]
fn test_union_without_working_days_is_undetermined() {
    let output = fixture_run();

    assert!(excluded_reason(&output, "1010").contains("SINDICATO SEM CADASTRO"));
    let kinds: Vec<IssueKind> = output.issues.iter().map(|i| i.kind).collect();
    assert!(kinds.contains(&IssueKind::UnmatchedRegion));
    assert!(kinds.contains(&IssueKind::MissingWorkingDays));
}

#[test]
fn test_no_ineligible_record_in_report() {
    let output = fixture_run();
    for excluded in &output.excluded {
        assert!(output.report.rows.iter().all(|r| r.id != excluded.id));
    }
}

// =============================================================================
// Keys and Duplicates
// =============================================================================

#[test]
fn test_duplicate_keys_reported_and_first_occurrence_used() {
    let output = fixture_run();

    let active = output
        .duplicates
        .iter()
        .find(|d| d.source == SourceKind::Active.as_str())
        .unwrap();
    assert_eq!(active.key, "1001");
    assert_eq!(active.occurrences, 2);

    let vacations = output
        .duplicates
        .iter()
        .find(|d| d.source == SourceKind::Vacations.as_str())
        .unwrap();
    assert_eq!(vacations.key, "1013");

    assert_eq!(output.report.rows.iter().filter(|r| r.id == "1001").count(), 1);
    assert_eq!(row(&output, "1001").union, SP);
    assert_eq!(row(&output, "1013").payable_days, 12);
}

#[test]
fn test_keys_normalized_before_joins() {
    let output = fixture_run();
    let row = row(&output, "15");

    assert_eq!(row.admission_date, NaiveDate::from_ymd_opt(2025, 5, 20));
    assert_eq!(row.payable_days, 3);
}

#[test]
fn test_unmatched_auxiliary_rows_are_reported() {
    let output = fixture_run();

    let unmatched = output
        .issues
        .iter()
        .find(|i| i.kind == IssueKind::UnmatchedRow)
        .unwrap();
    assert_eq!(unmatched.source.as_deref(), Some("vacations"));
    assert!(output.report.rows.iter().all(|r| r.id != "9999"));
}

// =============================================================================
// Amounts
// =============================================================================

#[test]
fn test_missing_rate_gives_zero_row_with_observation() {
    let output = fixture_run();
    let row = row(&output, "1014");

    assert_eq!(row.payable_days, 23);
    assert_eq!(row.transport.total, Decimal::ZERO);
    assert!(row.observation.contains("SITEPD PR"));
    assert!(
        output
            .issues
            .iter()
            .any(|i| i.kind == IssueKind::MissingRate && i.key.as_deref() == Some("1014"))
    );
}

#[test]
fn test_every_row_splits_total_exactly() {
    let output = fixture_run();

    for row in &output.report.rows {
        let line = &row.transport;
        assert_eq!(line.total, Decimal::from(row.payable_days) * line.daily_rate);
        assert_eq!(line.employer_cost + line.employee_share, line.total);
    }
    let totals = &output.report.totals;
    assert_eq!(totals.employer_cost + totals.employee_share, totals.total);
}

#[test]
fn test_runs_are_deterministic() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());

    let first = run(dir.path());
    let second = run(dir.path());

    assert_eq!(first.report.rows, second.report.rows);
    assert_eq!(first.excluded, second.excluded);
    assert_eq!(first.duplicates, second.duplicates);
}

// =============================================================================
// Agreements and Outputs
// =============================================================================

#[test]
fn test_agreement_meal_rates() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    fs::create_dir(dir.path().join("convencoes")).unwrap();
    fs::write(
        dir.path().join("convencoes/sindpd_sp.txt"),
        "CLÁUSULA DÉCIMA - AUXÍLIO REFEIÇÃO\nValor de R$ 40,00 por dia útil trabalhado.\n",
    )
    .unwrap();
    fs::write(dir.path().join("convencoes/sindpd_rj.txt"), "Sem cláusula de valores.\n").unwrap();
    let documents = [
        "SINDICATO;DOCUMENTO".to_string(),
        format!("{SP};convencoes/sindpd_sp.txt"),
        format!("{RJ};convencoes/sindpd_rj.txt"),
    ];
    let documents: Vec<&str> = documents.iter().map(String::as_str).collect();
    write(dir.path(), "convencoes.csv", &documents);

    let loader = load_config();
    let extractor = CachedRuleExtractor::new(TextRuleExtractor::new().unwrap());
    let output = Pipeline::new(loader.config())
        .with_rule_extractor(&extractor)
        .run(dir.path(), period(), processing_date())
        .unwrap();

    let meal = row(&output, "1001").meal.as_ref().unwrap();
    assert_eq!(meal.daily_rate, decimal("40.00"));
    assert_eq!(meal.total, decimal("880.00"));
    assert!(row(&output, "1012").meal.is_none());
    assert!(
        output
            .issues
            .iter()
            .any(|i| i.kind == IssueKind::ExtractionFailed)
    );
    assert_eq!(extractor.len(), 2);
}

#[test]
fn test_outputs_written_to_disk() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    let output = run(dir.path());

    let out_dir = TempDir::new().unwrap();
    let report_path = out_dir.path().join("VR_MENSAL_05.2025.csv");
    ReportWriter::new(';')
        .unwrap()
        .write_run(
            &report_path,
            &output.report,
            &output.duplicates,
            &output.excluded,
            &output.issues,
        )
        .unwrap();

    let report = fs::read_to_string(&report_path).unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines[0], REPORT_COLUMNS.join(";"));
    assert_eq!(lines.len(), 8);
    assert!(lines[2].starts_with("1002;2025-05-10;"));

    let duplicates = fs::read_to_string(out_dir.path().join("duplicates.csv")).unwrap();
    assert!(duplicates.contains("vacations;1013;2"));
    let review = fs::read_to_string(out_dir.path().join("review.csv")).unwrap();
    assert!(review.contains("excluded;;1006;apprentice"));
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn test_missing_required_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    fs::remove_file(dir.path().join("3.desligados.csv")).unwrap();

    let loader = load_config();
    let result = Pipeline::new(loader.config()).run(dir.path(), period(), processing_date());

    match result {
        Err(EngineError::MissingFile { path }) => assert!(path.ends_with("3.desligados.csv")),
        other => panic!("Expected MissingFile, got {:?}", other.map(|o| o.report.rows.len())),
    }
}

#[test]
fn test_missing_required_column_is_fatal() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    write(dir.path(), "2.ferias.csv", &["MATRICULA;DESC. SITUACAO", "1005;Férias"]);

    let loader = load_config();
    let result = Pipeline::new(loader.config()).run(dir.path(), period(), processing_date());

    assert!(matches!(
        result,
        Err(EngineError::MissingColumn { ref column, .. }) if column == "vacation_days"
    ));
}

// =============================================================================
// HTTP API
// =============================================================================

fn create_router_for_test() -> Router {
    create_router(AppState::new(load_config()))
}

async fn post_calculate(router: Router, body: Value) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/calculate")
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

#[tokio::test]
async fn test_api_calculates_consolidated_records() {
    let body = json!({
        "period": "2025-05",
        "processing_date": "2025-05-02",
        "records": [
            {
                "id": "1002",
                "union": SP,
                "admission_date": "2025-05-10",
                "standard_days": 22,
                "transport_daily_rate": "37.50"
            },
            {
                "id": "1005",
                "union": SP,
                "vacation_days": 30,
                "standard_days": 22,
                "transport_daily_rate": "37.50"
            },
            {
                "id": "1006",
                "union": SP,
                "role_category": "trainee",
                "standard_days": 22,
                "transport_daily_rate": "37.50"
            }
        ]
    });

    let (status, result) = post_calculate(create_router_for_test(), body).await;

    assert_eq!(status, StatusCode::OK);
    assert!(result["correlation_id"].is_string());
    assert_eq!(result["report"]["rows"].as_array().unwrap().len(), 1);
    assert_eq!(result["report"]["rows"][0]["payable_days"], 13);
    assert_eq!(
        decimal(result["report"]["rows"][0]["transport"]["total"].as_str().unwrap()),
        decimal("487.50")
    );
    assert_eq!(result["excluded"].as_array().unwrap().len(), 2);
    assert_eq!(result["audit"][0]["steps"][0]["rule_id"], "admission_proration");
}

#[tokio::test]
async fn test_api_rejects_invalid_period() {
    let body = json!({ "period": "2025-13", "records": [] });

    let (status, error) = post_calculate(create_router_for_test(), body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "MALFORMED_JSON");
}
