//! Region classification of union names.
//!
//! Union names are free text ("SINDPD SP - SIND. TRAB. EM PROC DADOS...").
//! The classifier maps them onto the configured regions by searching each
//! region's patterns, in configuration order, in the upper-cased name.

use crate::config::RegionSpec;
use crate::models::RegionMatch;

/// Maps union names onto configured regions.
///
/// # Example
///
/// ```
/// use benefit_engine::config::RegionSpec;
/// use benefit_engine::consolidation::RegionClassifier;
/// use benefit_engine::models::RegionMatch;
///
/// let classifier = RegionClassifier::new(&[RegionSpec {
///     name: "São Paulo".to_string(),
///     patterns: vec!["SINDPD SP".to_string(), "SÃO PAULO".to_string()],
/// }]);
///
/// assert_eq!(
///     classifier.classify("SINDPD SP - SIND.TRAB.EM PROC DADOS"),
///     RegionMatch::Matched("São Paulo".to_string())
/// );
/// assert_eq!(classifier.classify("SINDICATO X"), RegionMatch::Unmatched);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RegionClassifier {
    regions: Vec<(String, Vec<String>)>,
}

impl RegionClassifier {
    /// Builds a classifier from configured regions. Patterns are upper-cased once here.
    pub fn new(regions: &[RegionSpec]) -> Self {
        Self {
            regions: regions
                .iter()
                .map(|region| {
                    let patterns = region
                        .patterns
                        .iter()
                        .map(|p| p.trim().to_uppercase())
                        .filter(|p| !p.is_empty())
                        .collect();
                    (region.name.clone(), patterns)
                })
                .collect(),
        }
    }

    /// Classifies a union name. The first region with a matching pattern wins.
    pub fn classify(&self, union: &str) -> RegionMatch {
        let union = union.trim().to_uppercase();
        if union.is_empty() {
            return RegionMatch::Unmatched;
        }

        self.regions
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|p| union.contains(p.as_str())))
            .map(|(name, _)| RegionMatch::Matched(name.clone()))
            .unwrap_or_default()
    }

    /// Number of configured regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Returns true if no region is configured.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
