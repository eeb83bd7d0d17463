use crate::parsers::html::QueryNode;
use crate::parsers::{ExtractError, ExtractionRules, Page, RawFragment, Tier};
use crate::results::ExtractionMethod;

/// Tier 4: the page is on-topic but nothing specific could be extracted
///
/// Emits at most one record, explicitly marked as non-specific. Never
/// carries a price.
pub struct GenericFallbackTier;

impl Tier for GenericFallbackTier {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::GenericFallback
    }

    fn extract(
        &self,
        page: &Page,
        rules: &ExtractionRules,
    ) -> Result<Vec<RawFragment>, ExtractError> {
        if !rules.matcher.matches(&page.root().text_content()) {
            return Ok(Vec::new());
        }

        ::log::info!("Keyword evidence found but no specific deals, emitting generic record");
        Ok(vec![RawFragment {
            title: Some(rules.defaults.fallback_title.clone()),
            price: None,
            discount: Some(rules.defaults.fallback_discount.clone()),
            url: page.base_url.map(|u| u.to_string()),
            generic: true,
        }])
    }
}
