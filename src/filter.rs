use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static PRICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$(\d+)\.(\d{2})$").expect("price pattern is valid"));

/// Decides whether a block of text is on-topic for the product domain
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    /// Lowercased keywords
    keywords: Vec<String>,
}

impl KeywordMatcher {
    /// Create a matcher from a keyword list (matching is case-insensitive)
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    /// True when `text` contains at least one keyword as a substring
    pub fn matches(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let lowered = text.to_lowercase();
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }

    /// Same as [`matches`](Self::matches) but accepts an absent value
    pub fn matches_opt(&self, text: Option<&str>) -> bool {
        text.is_some_and(|t| self.matches(t))
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

/// Inclusive plausibility bounds for a price in dollars
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl Default for PriceRange {
    fn default() -> Self {
        Self {
            min: 5.0,
            max: 100.0,
        }
    }
}

/// Gates matched price strings on format and range
#[derive(Debug, Clone, Copy)]
pub struct PriceValidator {
    range: PriceRange,
}

impl PriceValidator {
    pub fn new(range: PriceRange) -> Self {
        Self { range }
    }

    /// True only for `$<digits>.<2 digits>` strings whose value is positive and
    /// within the configured range. Never panics on malformed input.
    pub fn is_plausible(&self, price_text: &str) -> bool {
        match parse_cents(price_text) {
            // Bounds may carry sub-cent fractions, so compare in dollars
            Some(cents) if cents > 0 => {
                let value = cents as f64 / 100.0;
                self.range.min <= value && value <= self.range.max
            }
            _ => false,
        }
    }

    /// First plausible currency substring of `text`, if any
    pub fn first_plausible<'a>(&self, text: &'a str) -> Option<&'a str> {
        crate::utils::CURRENCY_RE
            .find_iter(text)
            .map(|m| m.as_str())
            .find(|candidate| self.is_plausible(candidate))
    }
}

/// Free-function form of [`PriceValidator::is_plausible`]
pub fn is_plausible(price_text: &str, min_value: f64, max_value: f64) -> bool {
    PriceValidator::new(PriceRange {
        min: min_value,
        max: max_value,
    })
    .is_plausible(price_text)
}

/// Parse `$12.34` into 1234 cents
fn parse_cents(price_text: &str) -> Option<u64> {
    let caps = PRICE_RE.captures(price_text.trim())?;
    let dollars: u64 = caps.get(1)?.as_str().parse().ok()?;
    let cents: u64 = caps.get(2)?.as_str().parse().ok()?;
    dollars.checked_mul(100)?.checked_add(cents)
}

/// Detects WAF / security-challenge pages by marker strings
#[derive(Debug, Clone)]
pub struct BlockDetector {
    markers: Vec<String>,
}

impl BlockDetector {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let markers = markers
            .into_iter()
            .map(|m| m.as_ref().to_lowercase())
            .filter(|m| !m.is_empty())
            .collect();
        Self { markers }
    }

    /// Returns the first marker found in `content`
    pub fn detect(&self, content: &str) -> Option<&str> {
        let lowered = content.to_lowercase();
        self.markers
            .iter()
            .find(|m| lowered.contains(m.as_str()))
            .map(|m| m.as_str())
    }
}
