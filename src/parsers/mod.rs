pub mod fallback;
pub mod html;
pub mod text;

#[cfg(test)]
mod tests;

use crate::config::{AppConfig, ExtractionConfig, RecordDefaults};
use crate::errors::ConfigError;
use crate::filter::{KeywordMatcher, PriceValidator};
use crate::results::ExtractionMethod;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

/// Unnormalized bag of fields pulled out of a page by one tier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFragment {
    pub title: Option<String>,
    pub price: Option<String>,
    pub discount: Option<String>,
    pub url: Option<String>,
    /// Produced by the generic fallback tier, not tied to a specific product
    pub generic: bool,
}

/// A tier could not run at all (as opposed to running and finding nothing)
///
/// The built-in tiers work on an already parsed document and always run; this
/// is the channel for custom tiers passed to [`PatternExtractor::with_tiers`]
/// that depend on something that can fail, such as a second fetch.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("document error: {0}")]
    Document(String),
}

/// Selectors, patterns and limits compiled once from configuration
#[derive(Debug, Clone)]
pub struct ExtractionRules {
    pub matcher: KeywordMatcher,
    pub validator: PriceValidator,
    pub container_selectors: Vec<Selector>,
    pub title_selectors: Vec<Selector>,
    pub price_selectors: Vec<Selector>,
    pub discount_selectors: Vec<Selector>,
    pub anchor_selector: Selector,
    pub product_path: Regex,
    pub limits: ExtractionConfig,
    pub defaults: RecordDefaults,
}

impl ExtractionRules {
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let ex = &config.extraction;
        Ok(Self {
            matcher: KeywordMatcher::new(&config.keywords),
            validator: PriceValidator::new(config.price_range),
            container_selectors: compile_selectors(&ex.container_selectors)?,
            title_selectors: compile_selectors(&ex.title_selectors)?,
            price_selectors: compile_selectors(&ex.price_selectors)?,
            discount_selectors: compile_selectors(&ex.discount_selectors)?,
            anchor_selector: compile_selector("a[href]")?,
            product_path: Regex::new(&ex.product_path_pattern).map_err(|source| {
                ConfigError::InvalidPattern {
                    pattern: ex.product_path_pattern.clone(),
                    source,
                }
            })?,
            limits: ex.clone(),
            defaults: config.defaults.clone(),
        })
    }
}

pub(crate) fn compile_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|_| ConfigError::InvalidSelector(selector.to_string()))
}

fn compile_selectors(selectors: &[String]) -> Result<Vec<Selector>, ConfigError> {
    selectors.iter().map(|s| compile_selector(s)).collect()
}

/// A fetched page as seen by the tiers
pub struct Page<'a> {
    /// Raw page source
    pub content: &'a str,
    /// Page URL, used to absolutize links
    pub base_url: Option<&'a Url>,
    pub document: &'a Html,
}

impl<'a> Page<'a> {
    pub fn root(&self) -> ElementRef<'a> {
        self.document.root_element()
    }
}

/// One strategy in the extraction cascade
pub trait Tier: Send + Sync {
    fn method(&self) -> ExtractionMethod;

    /// `Ok(vec![])` means the tier ran and found nothing
    fn extract(&self, page: &Page, rules: &ExtractionRules)
    -> Result<Vec<RawFragment>, ExtractError>;
}

/// Fragments plus the tier that produced them
#[derive(Debug, Clone)]
pub struct Extraction {
    pub method: ExtractionMethod,
    pub fragments: Vec<RawFragment>,
}

impl Extraction {
    pub fn nothing() -> Self {
        Self {
            method: ExtractionMethod::None,
            fragments: Vec::new(),
        }
    }
}

/// Runs the tiers in order and returns the first non-empty result
pub struct PatternExtractor {
    rules: ExtractionRules,
    tiers: Vec<Box<dyn Tier>>,
}

impl PatternExtractor {
    /// Extractor with the standard cascade:
    /// structured containers, product links, free text, generic fallback
    pub fn new(rules: ExtractionRules) -> Self {
        Self::with_tiers(
            rules,
            vec![
                Box::new(html::StructuredContainerTier),
                Box::new(html::ProductLinkTier),
                Box::new(text::FreeTextTier),
                Box::new(fallback::GenericFallbackTier),
            ],
        )
    }

    /// Extractor with a custom cascade
    pub fn with_tiers(rules: ExtractionRules, tiers: Vec<Box<dyn Tier>>) -> Self {
        Self { rules, tiers }
    }

    pub fn rules(&self) -> &ExtractionRules {
        &self.rules
    }

    /// Run the cascade over raw page content
    ///
    /// Never fails: a tier error is logged and the next tier is tried, and a
    /// page with nothing usable yields [`Extraction::nothing`].
    pub fn extract(&self, content: &str, base_url: &str) -> Extraction {
        if content.trim().is_empty() {
            ::log::debug!("Empty content for {}, nothing to extract", base_url);
            return Extraction::nothing();
        }

        let base = match Url::parse(base_url) {
            Ok(url) => Some(url),
            Err(e) => {
                ::log::warn!("Base URL {:?} unusable ({}), links stay relative", base_url, e);
                None
            }
        };

        let document = Html::parse_document(content);
        let page = Page {
            content,
            base_url: base.as_ref(),
            document: &document,
        };

        for tier in &self.tiers {
            let method = tier.method();
            match tier.extract(&page, &self.rules) {
                Ok(fragments) if !fragments.is_empty() => {
                    ::log::info!(
                        "Tier '{}' found {} fragments in {}",
                        method,
                        fragments.len(),
                        base_url
                    );
                    return Extraction { method, fragments };
                }
                Ok(_) => {
                    ::log::debug!("Tier '{}' found nothing in {}", method, base_url);
                }
                Err(e) => {
                    ::log::warn!("Tier '{}' failed on {}: {}", method, base_url, e);
                }
            }
        }

        Extraction::nothing()
    }
}

/// Resolve an href against the site's origin
///
/// Returns `None` for script/fragment-only links and anything unparsable.
pub fn resolve_href(href: &str, base: Option<&Url>) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    if let Ok(absolute) = Url::parse(href) {
        return matches!(absolute.scheme(), "http" | "https").then(|| absolute.to_string());
    }
    let origin = base?.join("/").ok()?;
    origin.join(href).ok().map(|u| u.to_string())
}
