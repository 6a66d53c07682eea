//! Delimited output of a benefit run.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;
use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::models::{BenefitLine, BenefitReport, DuplicateKey, ExcludedRecord, RunIssue};

/// Columns of the benefit report, transport benefit only.
pub const REPORT_COLUMNS: [&str; 10] = [
    "Matricula",
    "Admissão",
    "Sindicato do Colaborador",
    "Competência",
    "Dias",
    "VALOR DIÁRIO VR",
    "TOTAL VR",
    "Custo empresa VR",
    "Desconto profissional VR",
    "OBS GERAL",
];

/// Extra columns written when any row carries a meal benefit.
pub const MEAL_COLUMNS: [&str; 4] = [
    "VALOR DIÁRIO VA",
    "TOTAL VA",
    "Custo empresa VA",
    "Desconto profissional VA",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Writes reports and review tables as delimited text.
///
/// # Example
///
/// ```
/// use benefit_engine::models::DuplicateKey;
/// use benefit_engine::report::ReportWriter;
///
/// let writer = ReportWriter::new(';')?;
/// let mut out = Vec::new();
/// writer.write_duplicates(
///     &mut out,
///     &[DuplicateKey {
///         source: "vacations".to_string(),
///         key: "1001".to_string(),
///         occurrences: 2,
///     }],
///     "duplicates.csv",
/// )?;
/// assert_eq!(
///     String::from_utf8(out).unwrap(),
///     "source;key;occurrences\nvacations;1001;2\n"
/// );
/// # Ok::<(), benefit_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ReportWriter {
    delimiter: u8,
}

impl ReportWriter {
    /// Creates a writer for the given ASCII delimiter.
    pub fn new(delimiter: char) -> EngineResult<Self> {
        let delimiter = u8::try_from(delimiter).map_err(|_| EngineError::ReportWriteError {
            path: String::new(),
            message: format!("delimiter '{}' is not ASCII", delimiter),
        })?;
        Ok(Self { delimiter })
    }

    /// Writes the benefit report. Meal columns are added when any row has a meal line.
    ///
    /// `path` is only used in error messages.
    pub fn write_report<W: Write>(
        &self,
        writer: W,
        report: &BenefitReport,
        path: &str,
    ) -> EngineResult<()> {
        let with_meal = report.rows.iter().any(|row| row.meal.is_some());

        let mut header: Vec<&str> = REPORT_COLUMNS.to_vec();
        if with_meal {
            header.extend(MEAL_COLUMNS);
        }

        let mut records = Vec::with_capacity(report.rows.len());
        for row in &report.rows {
            let mut record = vec![
                row.id.clone(),
                row.admission_date
                    .map(|d| d.format(DATE_FORMAT).to_string())
                    .unwrap_or_default(),
                row.union.clone(),
                row.processing_date.format(DATE_FORMAT).to_string(),
                row.payable_days.to_string(),
            ];
            record.extend(line_cells(&row.transport));
            record.push(row.observation.clone());
            if with_meal {
                match &row.meal {
                    Some(meal) => record.extend(line_cells(meal)),
                    None => record.extend(std::iter::repeat_n(String::new(), MEAL_COLUMNS.len())),
                }
            }
            records.push(record);
        }

        self.write_rows(writer, &header, records, path)
    }

    /// Writes the duplicate keys table.
    pub fn write_duplicates<W: Write>(
        &self,
        writer: W,
        duplicates: &[DuplicateKey],
        path: &str,
    ) -> EngineResult<()> {
        let records = duplicates.iter().map(|d| {
            vec![d.source.clone(), d.key.clone(), d.occurrences.to_string()]
        });
        self.write_rows(writer, &["source", "key", "occurrences"], records, path)
    }

    /// Writes the review table: excluded records followed by run issues.
    pub fn write_review<W: Write>(
        &self,
        writer: W,
        excluded: &[ExcludedRecord],
        issues: &[RunIssue],
        path: &str,
    ) -> EngineResult<()> {
        let excluded_rows = excluded.iter().map(|e| {
            vec![
                "excluded".to_string(),
                String::new(),
                e.id.clone(),
                e.reason.clone(),
            ]
        });
        let issue_rows = issues.iter().map(|i| {
            let kind = serde_json::to_value(i.kind)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            vec![
                kind,
                i.source.clone().unwrap_or_default(),
                i.key.clone().unwrap_or_default(),
                i.message.clone(),
            ]
        });
        self.write_rows(
            writer,
            &["kind", "source", "key", "message"],
            excluded_rows.chain(issue_rows),
            path,
        )
    }

    /// Writes every output of a run next to each other.
    ///
    /// The report goes to `report_path`; `duplicates.csv` and `review.csv`
    /// are written to the same directory.
    pub fn write_run(
        &self,
        report_path: &Path,
        report: &BenefitReport,
        duplicates: &[DuplicateKey],
        excluded: &[ExcludedRecord],
        issues: &[RunIssue],
    ) -> EngineResult<()> {
        let directory = report_path.parent().unwrap_or_else(|| Path::new("."));

        let report_file = create(report_path)?;
        self.write_report(report_file, report, &report_path.display().to_string())?;

        let duplicates_path = directory.join("duplicates.csv");
        let duplicates_file = create(&duplicates_path)?;
        self.write_duplicates(
            duplicates_file,
            duplicates,
            &duplicates_path.display().to_string(),
        )?;

        let review_path = directory.join("review.csv");
        let review_file = create(&review_path)?;
        self.write_review(review_file, excluded, issues, &review_path.display().to_string())?;

        info!(
            report = %report_path.display(),
            rows = report.rows.len(),
            duplicates = duplicates.len(),
            review = excluded.len() + issues.len(),
            "Run outputs written"
        );
        Ok(())
    }

    fn write_rows<W, I>(&self, writer: W, header: &[&str], rows: I, path: &str) -> EngineResult<()>
    where
        W: Write,
        I: IntoIterator<Item = Vec<String>>,
    {
        let write_error = |message: String| EngineError::ReportWriteError {
            path: path.to_string(),
            message,
        };

        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(writer);

        writer
            .write_record(header)
            .map_err(|e| write_error(e.to_string()))?;
        for row in rows {
            writer
                .write_record(&row)
                .map_err(|e| write_error(e.to_string()))?;
        }
        writer.flush().map_err(|e| write_error(e.to_string()))
    }
}

fn line_cells(line: &BenefitLine) -> [String; 4] {
    [
        format!("{:.2}", line.daily_rate),
        format!("{:.2}", line.total),
        format!("{:.2}", line.employer_cost),
        format!("{:.2}", line.employee_share),
    ]
}

fn create(path: &Path) -> EngineResult<File> {
    File::create(path).map_err(|e| EngineError::ReportWriteError {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
