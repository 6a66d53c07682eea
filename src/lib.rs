//! Payroll consolidation and benefit calculation engine.
//!
//! This crate loads the monthly payroll source tables, consolidates them into
//! one record per active employee, decides benefit eligibility, adjusts the
//! payable days of each employee and calculates the meal/transport benefit
//! amounts with their employer/employee split.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod consolidation;
pub mod error;
pub mod external;
pub mod ingest;
pub mod models;
pub mod pipeline;
pub mod report;
