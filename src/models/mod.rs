//! Core data models for the benefit engine.
//!
//! This module contains all the domain models used throughout the pipeline.

mod employee;
mod lookup;
mod period;
mod report;

pub use employee::{EmployeeRecord, Eligibility, IneligibilityReason, NoticeStatus, RoleCategory};
pub use lookup::{RegionMatch, RegionRateTable, UnionWorkingDaysTable};
pub use period::ReferencePeriod;
pub use report::{
    AuditStep, BenefitKind, BenefitLine, BenefitReport, BenefitReportRow, DuplicateKey,
    ExcludedRecord, IssueKind, ReportTotals, RunIssue,
};
