//! Per-region and per-union lookup tables.
//!
//! These are the small reference tables the consolidator joins onto the
//! base population: daily rates by region and standard working days by union.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Outcome of classifying a union name into one of the configured regions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionMatch {
    /// The union name matched a configured region.
    Matched(String),
    /// No configured region matched.
    #[default]
    Unmatched,
}

impl RegionMatch {
    /// Returns the region name when matched.
    pub fn name(&self) -> Option<&str> {
        match self {
            RegionMatch::Matched(name) => Some(name),
            RegionMatch::Unmatched => None,
        }
    }
}

/// Daily transport rate by region name, one row per region.
///
/// # Example
///
/// ```
/// use benefit_engine::models::RegionRateTable;
/// use rust_decimal::Decimal;
///
/// let mut table = RegionRateTable::default();
/// table.insert("São Paulo", Decimal::new(3750, 2));
/// assert_eq!(table.rate("São Paulo"), Some(Decimal::new(3750, 2)));
/// assert_eq!(table.rate("Paraná"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionRateTable {
    rates: BTreeMap<String, Decimal>,
}

impl RegionRateTable {
    /// Adds a region rate. An existing region keeps its first rate.
    ///
    /// Returns `false` if the region was already present.
    pub fn insert(&mut self, region: impl Into<String>, rate: Decimal) -> bool {
        let region = region.into();
        if self.rates.contains_key(&region) {
            return false;
        }
        self.rates.insert(region, rate);
        true
    }

    /// The daily rate of a region.
    pub fn rate(&self, region: &str) -> Option<Decimal> {
        self.rates.get(region).copied()
    }

    /// Number of regions in the table.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Returns true if the table has no regions.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Standard working-day count by exact union name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionWorkingDaysTable {
    days: BTreeMap<String, u32>,
}

impl UnionWorkingDaysTable {
    /// Adds a union's working-day count. An existing union keeps its first count.
    pub fn insert(&mut self, union: impl Into<String>, days: u32) -> bool {
        let union = union.into();
        if self.days.contains_key(&union) {
            return false;
        }
        self.days.insert(union, days);
        true
    }

    /// Working days for a union, matched exactly.
    pub fn days(&self, union: &str) -> Option<u32> {
        self.days.get(union).copied()
    }

    /// Number of unions in the table.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Returns true if the table has no unions.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_rate_keeps_first_entry() {
        let mut table = RegionRateTable::default();
        assert!(table.insert("Paraná", Decimal::new(3500, 2)));
        assert!(!table.insert("Paraná", Decimal::new(9900, 2)));
        assert_eq!(table.rate("Paraná"), Some(Decimal::new(3500, 2)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_working_days_exact_match_only() {
        let mut table = UnionWorkingDaysTable::default();
        table.insert("SINDPD SP", 22);
        assert_eq!(table.days("SINDPD SP"), Some(22));
        assert_eq!(table.days("SINDPD SP "), None);
        assert_eq!(table.days("sindpd sp"), None);
    }

    #[test]
    fn test_region_match_name() {
        assert_eq!(RegionMatch::Matched("Paraná".into()).name(), Some("Paraná"));
        assert_eq!(RegionMatch::Unmatched.name(), None);
    }

    #[test]
    fn test_region_match_serialization() {
        assert_eq!(
            serde_json::to_string(&RegionMatch::Unmatched).unwrap(),
            "\"unmatched\""
        );
        assert_eq!(
            serde_json::to_string(&RegionMatch::Matched("Paraná".into())).unwrap(),
            r#"{"matched":"Paraná"}"#
        );
    }
}
