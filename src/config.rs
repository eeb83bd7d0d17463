use crate::errors::ConfigError;
use crate::filter::PriceRange;
use regex::Regex;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use url::Url;

/// Top-level configuration for a deal sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Domain keywords; a block of text is on-topic if it contains any of them
    pub keywords: Vec<String>,

    /// Plausible price bounds for the product domain
    pub price_range: PriceRange,

    /// Selector lists and limits used by the extractor
    pub extraction: ExtractionConfig,

    /// Default and sentinel strings for normalized records
    pub defaults: RecordDefaults,

    /// Page fetching settings
    pub fetch: FetchConfig,

    /// Retailers to sweep, in order
    pub sources: Vec<SourceConfig>,

    /// Pause between retailers in seconds
    pub politeness_delay_secs: u64,

    /// Where the run result is written
    pub output_path: PathBuf,

    pub notification: NotificationConfig,
}

/// Selectors and caps for the extraction cascade
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Repeating product containers, tried in order; first selector with a match wins
    pub container_selectors: Vec<String>,

    /// Candidate title elements inside a container, in priority order
    pub title_selectors: Vec<String>,

    /// Candidate price elements inside a container, in priority order
    pub price_selectors: Vec<String>,

    /// Candidate discount badge elements inside a container, in priority order
    pub discount_selectors: Vec<String>,

    /// Regex an href must match to count as a product/category link
    pub product_path_pattern: String,

    /// Maximum number of links considered by the link tier
    pub max_link_candidates: usize,

    /// Free-text segments are chunked to at most this many characters
    pub max_segment_len: usize,

    /// Free-text segments shorter than this are ignored
    pub min_segment_len: usize,

    /// Free-text tier stops after this many records
    pub max_text_records: usize,

    /// A title candidate at least this long is preferred over shorter ones
    pub min_title_len: usize,

    pub title_max_len: usize,

    pub discount_max_len: usize,
}

/// Placeholder strings used when a field cannot be determined
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordDefaults {
    /// Title used when a fragment has none
    pub title: String,

    /// Title of the single non-specific record from the generic fallback tier
    pub fallback_title: String,

    /// Price shown when no valid price was found
    pub price_sentinel: String,

    /// Discount label used when no offer text was found
    pub discount_sentinel: String,

    /// Discount label of the generic fallback record
    pub fallback_discount: String,
}

/// Browser rendering hints for dynamic pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderInstructions {
    /// Scroll to the bottom of the page after load
    pub scroll_to_bottom: bool,

    /// Seconds to wait before reading the page source
    pub wait_secs: u64,
}

impl Default for RenderInstructions {
    fn default() -> Self {
        Self {
            scroll_to_bottom: true,
            wait_secs: 3,
        }
    }
}

/// Settings for the WebDriver page fetcher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// URL for the WebDriver instance
    pub webdriver_url: String,

    /// Per-fetch timeout in seconds
    pub timeout_secs: u64,

    pub render: RenderInstructions,

    /// Case-insensitive markers identifying a block or challenge page
    pub block_markers: Vec<String>,
}

/// One retailer and its candidate pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Store name written into each record
    pub name: String,

    /// Candidate page URLs in priority order
    pub urls: Vec<String>,

    /// Text the page must contain to count as real store content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_marker: Option<String>,

    /// Overrides the fetch-level render instructions for this source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render: Option<RenderInstructions>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub enabled: bool,

    /// Noun phrase used in the subject line, e.g. "Nappy Deals"
    pub subject: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            keywords: [
                "napp", "diaper", "huggies", "pampers", "babylove", "rascal", "tooshies",
            ]
            .iter()
            .map(|k| k.to_string())
            .collect(),
            price_range: PriceRange::default(),
            extraction: ExtractionConfig::default(),
            defaults: RecordDefaults::default(),
            fetch: FetchConfig::default(),
            sources: default_sources(),
            politeness_delay_secs: 3,
            output_path: PathBuf::from("docs/latest_deals.json"),
            notification: NotificationConfig::default(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            container_selectors: strings(&[
                r#"[data-testid="product-tile"]"#,
                ".product-tile",
                ".product__tile",
                ".product-card",
                "article.product",
                "li.product",
            ]),
            title_selectors: strings(&[
                r#"[data-testid="product-title"]"#,
                ".product__title",
                ".product-title",
                "h2",
                "h3",
                "a",
            ]),
            price_selectors: strings(&[
                r#"[data-testid="product-pricing"]"#,
                ".price__value",
                ".product__price",
                ".price",
                r#"[class*="price"]"#,
            ]),
            discount_selectors: strings(&[
                r#"[data-testid="special-badge"]"#,
                ".product__badge",
                ".badge-label",
                ".special",
                ".badge",
                r#"[class*="promo"]"#,
            ]),
            product_path_pattern: r"/(product|products|productdetails|p|browse|on-special)/"
                .to_string(),
            max_link_candidates: 10,
            max_segment_len: 400,
            min_segment_len: 15,
            max_text_records: 5,
            min_title_len: 10,
            title_max_len: 150,
            discount_max_len: 60,
        }
    }
}

impl Default for RecordDefaults {
    fn default() -> Self {
        Self {
            title: "Nappies Deal".to_string(),
            fallback_title: "Nappies Specials Available - Check website for details".to_string(),
            price_sentinel: "Check website".to_string(),
            discount_sentinel: "Special Price".to_string(),
            fallback_discount: "Check website for current deals".to_string(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:4444".to_string(),
            timeout_secs: 45,
            render: RenderInstructions::default(),
            block_markers: strings(&[
                "incapsula",
                "request unsuccessful",
                "access denied",
                "pardon our interruption",
            ]),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            subject: "Nappy Deals".to_string(),
        }
    }
}

fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig {
            name: "Coles".to_string(),
            urls: strings(&[
                "https://www.coles.com.au/on-special/baby/nappies-nappy-pants",
                "https://www.coles.com.au/browse/baby/nappies-nappy-pants/nappies",
                "https://shop.coles.com.au/a/national/specials/browse/baby/nappies-nappy-pants",
            ]),
            required_marker: None,
            render: None,
        },
        SourceConfig {
            name: "Woolworths".to_string(),
            urls: strings(&[
                "https://www.woolworths.com.au/shop/browse/baby/nappies-pants",
                "https://www.woolworths.com.au/shop/browse/baby/nappies-pants?specials=true",
            ]),
            required_marker: Some("woolworths".to_string()),
            render: None,
        },
    ]
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_json(&contents)
    }

    /// Parse configuration from a JSON string; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Check the configuration can drive a run, failing on the first problem
    pub fn validate(&self) -> Result<(), ConfigError> {
        let PriceRange { min, max } = self.price_range;
        if !(min.is_finite() && max.is_finite()) || min <= 0.0 || min > max {
            return Err(ConfigError::InvalidRange { min, max });
        }

        if self.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(ConfigError::NoKeywords);
        }

        let ex = &self.extraction;
        // Truncation appends "...", so text caps below 3 could never be met
        for (field, min, value) in [
            ("title_max_len", 3, ex.title_max_len),
            ("discount_max_len", 3, ex.discount_max_len),
            ("max_segment_len", 1, ex.max_segment_len),
        ] {
            if value < min {
                return Err(ConfigError::LimitTooSmall { field, min, value });
            }
        }

        for selector in ex
            .container_selectors
            .iter()
            .chain(&ex.title_selectors)
            .chain(&ex.price_selectors)
            .chain(&ex.discount_selectors)
        {
            if Selector::parse(selector).is_err() {
                return Err(ConfigError::InvalidSelector(selector.clone()));
            }
        }

        Regex::new(&ex.product_path_pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: ex.product_path_pattern.clone(),
            source,
        })?;

        if self.sources.is_empty() {
            return Err(ConfigError::NoSources);
        }
        for source in &self.sources {
            if source.urls.is_empty() {
                return Err(ConfigError::NoCandidates(source.name.clone()));
            }
            for url in &source.urls {
                Url::parse(url).map_err(|e| ConfigError::InvalidUrl {
                    url: url.clone(),
                    source: e,
                })?;
            }
        }

        Ok(())
    }
}

impl SourceConfig {
    pub fn new(name: &str, urls: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            urls: strings(urls),
            required_marker: None,
            render: None,
        }
    }
}
