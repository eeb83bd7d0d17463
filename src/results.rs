use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One normalized discount listing
///
/// Serialized with the key names the published JSON file uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealRecord {
    /// Retailer the record came from
    #[serde(rename = "store")]
    pub source: String,

    /// Product or offer description
    #[serde(rename = "product")]
    pub title: String,

    /// Validated currency string or the price sentinel
    pub price: String,

    /// Offer mechanism ("Save $8.00", "Half Price", ...)
    #[serde(rename = "special")]
    pub discount_label: String,

    /// Absolute URL where the deal can be checked
    #[serde(rename = "url")]
    pub reference_url: String,

    /// Set only for records produced by the generic fallback tier
    #[serde(skip)]
    pub generic: bool,
}

/// Which extraction tier produced a set of records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    StructuredContainers,
    ProductLinks,
    FreeText,
    GenericFallback,
    /// Nothing usable was found
    None,
}

impl ExtractionMethod {
    pub fn label(&self) -> &'static str {
        match self {
            ExtractionMethod::StructuredContainers => "structured containers",
            ExtractionMethod::ProductLinks => "product links",
            ExtractionMethod::FreeText => "free-text patterns",
            ExtractionMethod::GenericFallback => "generic fallback",
            ExtractionMethod::None => "no data",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Records gathered for one retailer
#[derive(Debug, Clone)]
pub struct SourceOutcome {
    pub source: String,
    pub method: ExtractionMethod,
    /// Candidate URL that produced the records, if any did
    pub url: Option<String>,
    pub deals: Vec<DealRecord>,
}

impl SourceOutcome {
    pub fn empty(source: &str) -> Self {
        Self {
            source: source.to_string(),
            method: ExtractionMethod::None,
            url: None,
            deals: Vec::new(),
        }
    }
}

/// The document handed to the persistence sink
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// ISO-8601 timestamp of the run
    pub date: String,
    pub total_deals: usize,
    pub deals: Vec<DealRecord>,
    /// Local-time display string
    pub last_check: String,
    /// Provenance label, informational only
    pub method: String,
}

impl RunResult {
    /// Build a result stamped with the current local time
    pub fn new(deals: Vec<DealRecord>, method: String) -> Self {
        Self::at(Local::now(), deals, method)
    }

    /// Build a result for a fixed timestamp
    pub fn at(now: DateTime<Local>, deals: Vec<DealRecord>, method: String) -> Self {
        Self {
            date: now.to_rfc3339(),
            total_deals: deals.len(),
            deals,
            last_check: now.format("%Y-%m-%d %H:%M:%S %Z").to_string(),
            method,
        }
    }

    /// Assemble a result from per-source outcomes, concatenating in order
    pub fn from_outcomes(outcomes: &[SourceOutcome]) -> Self {
        let deals = outcomes
            .iter()
            .flat_map(|o| o.deals.iter().cloned())
            .collect();
        Self::new(deals, describe_method(outcomes))
    }
}

/// Human-readable provenance such as
/// "Direct store scraping: structured containers (Coles), no data (Woolworths)"
pub fn describe_method(outcomes: &[SourceOutcome]) -> String {
    if outcomes.is_empty() {
        return "Direct store scraping: no sources configured".to_string();
    }
    let parts = outcomes
        .iter()
        .map(|o| format!("{} ({})", o.method, o.source))
        .collect::<Vec<_>>()
        .join(", ");
    format!("Direct store scraping: {}", parts)
}
