//! Benefit rule extraction from union agreements.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::ingest::parse_money;

/// A monetary amount in Brazilian notation, with or without thousands separators.
const AMOUNT_PATTERN: &str = r"R\$\s*(\d{1,3}(?:\.\d{3})+,\d{2}|\d+,\d{2})";

/// The benefit rule found in a union agreement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRule {
    /// Daily meal rate stated by the agreement.
    pub daily_rate: Decimal,
    /// The text the rate was taken from.
    pub rule_text: String,
}

/// Turns an agreement document into an [`ExtractedRule`].
pub trait RuleExtractor {
    /// Extracts the rule of one document.
    fn extract(&self, document: &Path) -> EngineResult<ExtractedRule>;
}

/// Reads a plain-text agreement and takes the first `R$ 00,00` amount.
///
/// # Example
///
/// ```
/// use benefit_engine::external::TextRuleExtractor;
/// use rust_decimal::Decimal;
///
/// let extractor = TextRuleExtractor::new()?;
/// let rule = extractor
///     .extract_from_text("Cláusula 12: auxílio refeição de R$ 42,50 por dia útil.")
///     .unwrap();
/// assert_eq!(rule.daily_rate, Decimal::new(4250, 2));
/// # Ok::<(), benefit_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct TextRuleExtractor {
    amount: Regex,
}

impl TextRuleExtractor {
    /// Creates the extractor.
    pub fn new() -> EngineResult<Self> {
        let amount = Regex::new(AMOUNT_PATTERN).map_err(|e| EngineError::ExtractionError {
            document: AMOUNT_PATTERN.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { amount })
    }

    /// Extracts the rule from agreement text. Returns `None` when the text
    /// states no amount.
    pub fn extract_from_text(&self, text: &str) -> Option<ExtractedRule> {
        let captures = self.amount.captures(text)?;
        let matched = captures.get(0)?;
        let daily_rate = parse_money(captures.get(1)?.as_str())?;

        let line_start = text[..matched.start()].rfind('\n').map_or(0, |i| i + 1);
        let line_end = text[matched.end()..]
            .find('\n')
            .map_or(text.len(), |i| matched.end() + i);

        Some(ExtractedRule {
            daily_rate,
            rule_text: text[line_start..line_end].trim().to_string(),
        })
    }
}

impl RuleExtractor for TextRuleExtractor {
    fn extract(&self, document: &Path) -> EngineResult<ExtractedRule> {
        let extraction_error = |message: String| EngineError::ExtractionError {
            document: document.display().to_string(),
            message,
        };

        let text = fs::read_to_string(document).map_err(|e| extraction_error(e.to_string()))?;
        self.extract_from_text(&text)
            .ok_or_else(|| extraction_error("no daily amount found".to_string()))
    }
}

/// Memoizes a [`RuleExtractor`] so each document is extracted at most once.
///
/// Failures are cached too.
#[derive(Debug)]
pub struct CachedRuleExtractor<E> {
    inner: E,
    cache: Mutex<HashMap<PathBuf, Result<ExtractedRule, String>>>,
}

impl<E: RuleExtractor> CachedRuleExtractor<E> {
    /// Wraps an extractor.
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Number of distinct documents seen.
    pub fn len(&self) -> usize {
        self.cache.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    /// Returns true if nothing was extracted yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: RuleExtractor> RuleExtractor for CachedRuleExtractor<E> {
    fn extract(&self, document: &Path) -> EngineResult<ExtractedRule> {
        let mut cache = self.cache.lock().unwrap_or_else(|p| p.into_inner());

        let cached = match cache.get(document) {
            Some(cached) => {
                debug!(document = %document.display(), "Agreement rule served from cache");
                cached.clone()
            }
            None => {
                let result = self.inner.extract(document).map_err(|e| e.to_string());
                cache.insert(document.to_path_buf(), result.clone());
                result
            }
        };

        cached.map_err(|message| EngineError::ExtractionError {
            document: document.display().to_string(),
            message,
        })
    }
}
