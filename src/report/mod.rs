//! Report output.
//!
//! The benefit report is written with the column layout payroll expects;
//! duplicates and excluded records go to separate review tables.

mod writer;

pub use writer::{MEAL_COLUMNS, REPORT_COLUMNS, ReportWriter};
