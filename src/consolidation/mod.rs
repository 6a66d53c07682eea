//! Consolidation of source inputs into classified employee records.
//!
//! The [`Consolidator`] performs the ordered left joins, the
//! [`RegionClassifier`] maps union names onto regions, and the eligibility
//! functions decide which records reach the benefit calculator.

mod consolidator;
mod eligibility;
mod region;

pub use consolidator::{Consolidation, Consolidator};
pub use eligibility::{
    classify, exclusion_reason, finalize_eligibility, is_excluded_role, terminated_before_cutoff,
};
pub use region::RegionClassifier;
