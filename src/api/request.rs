//! Request types for the benefit engine API.
//!
//! This module defines the JSON request structure for the `/calculate` endpoint.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{EmployeeRecord, ReferencePeriod};

/// Longest month, the upper bound of any day count.
const MAX_DAYS_IN_MONTH: u32 = 31;

/// Request body for the `/calculate` endpoint.
///
/// Records arrive already consolidated: the caller has joined vacations,
/// terminations, admissions, rates and working days onto each employee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationRequest {
    /// The month being paid, as `YYYY-MM`.
    pub period: ReferencePeriod,
    /// Date stamped on every report row; defaults to today.
    #[serde(default)]
    pub processing_date: Option<NaiveDate>,
    /// Consolidated employee records.
    pub records: Vec<EmployeeRecord>,
}

impl CalculationRequest {
    /// Checks what serde cannot: unique identifiers and plausible day counts.
    pub fn validate(&self) -> EngineResult<()> {
        let mut seen = BTreeSet::new();
        for record in &self.records {
            if record.id.trim().is_empty() {
                return Err(EngineError::InvalidRecord {
                    key: record.id.clone(),
                    message: "identifier is empty".to_string(),
                });
            }
            if !seen.insert(record.id.as_str()) {
                return Err(EngineError::InvalidRecord {
                    key: record.id.clone(),
                    message: "identifier appears more than once".to_string(),
                });
            }
            for (field, value) in [
                ("standard_days", record.standard_days),
                ("vacation_days", record.vacation_days),
            ] {
                if value.is_some_and(|days| days > MAX_DAYS_IN_MONTH) {
                    return Err(EngineError::InvalidRecord {
                        key: record.id.clone(),
                        message: format!("{} must be at most {}", field, MAX_DAYS_IN_MONTH),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(records: Vec<EmployeeRecord>) -> CalculationRequest {
        CalculationRequest {
            period: ReferencePeriod::new(2025, 5).unwrap(),
            processing_date: None,
            records,
        }
    }

    #[test]
    fn test_deserialize_request() {
        let json = r#"{
            "period": "2025-05",
            "records": [
                {"id": "1001", "union": "SINDPD SP", "standard_days": 22, "transport_daily_rate": "37.50"}
            ]
        }"#;

        let request: CalculationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.period, ReferencePeriod::new(2025, 5).unwrap());
        assert!(request.processing_date.is_none());
        assert_eq!(request.records.len(), 1);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_invalid_period_is_rejected() {
        let json = r#"{"period": "2025-13", "records": []}"#;
        assert!(serde_json::from_str::<CalculationRequest>(json).is_err());
    }

    #[test]
    fn test_duplicate_ids_fail_validation() {
        let request = request(vec![
            EmployeeRecord::new("1001", "SINDPD SP"),
            EmployeeRecord::new("1001", "SINDPD RJ"),
        ]);
        assert!(matches!(
            request.validate(),
            Err(EngineError::InvalidRecord { key, .. }) if key == "1001"
        ));
    }

    #[test]
    fn test_implausible_day_count_fails_validation() {
        let mut record = EmployeeRecord::new("1001", "SINDPD SP");
        record.vacation_days = Some(45);
        assert!(request(vec![record]).validate().is_err());
    }
}
