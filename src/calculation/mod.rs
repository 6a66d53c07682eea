//! Calculation logic for the benefit engine.
//!
//! This module contains the days-payable adjustment rules (admission
//! proration, termination proration, vacation deduction) and the benefit
//! amount calculation with its fixed employer/employee split.

mod benefit;
mod days_payable;

pub use benefit::{
    BenefitCalculation, EMPLOYEE_SHARE, EMPLOYER_SHARE, calculate_benefits, calculate_line,
};
pub use days_payable::{
    DaysPayableResult, adjust_days_payable, deduct_vacation, prorate_admission,
    prorate_termination,
};
