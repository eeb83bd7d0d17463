use crate::config::{AppConfig, RecordDefaults};
use crate::filter::PriceValidator;
use crate::parsers::RawFragment;
use crate::results::DealRecord;
use crate::utils::{clean_text, truncate_chars};

/// Turns raw fragments into canonical deal records
///
/// Pure: the same fragment always yields the same record, and nothing here fails.
#[derive(Debug, Clone)]
pub struct RecordNormalizer {
    validator: PriceValidator,
    defaults: RecordDefaults,
    title_max_len: usize,
    discount_max_len: usize,
}

impl RecordNormalizer {
    pub fn new(
        validator: PriceValidator,
        defaults: RecordDefaults,
        title_max_len: usize,
        discount_max_len: usize,
    ) -> Self {
        Self {
            validator,
            defaults,
            title_max_len,
            discount_max_len,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            PriceValidator::new(config.price_range),
            config.defaults.clone(),
            config.extraction.title_max_len,
            config.extraction.discount_max_len,
        )
    }

    /// Build a record, substituting defaults for absent or unusable fields
    pub fn normalize(&self, fragment: &RawFragment, source: &str, fallback_url: &str) -> DealRecord {
        let title = cleaned(fragment.title.as_deref())
            .map(|t| truncate_chars(&t, self.title_max_len))
            .unwrap_or_else(|| self.defaults.title.clone());

        let price = fragment
            .price
            .as_deref()
            .map(str::trim)
            .filter(|p| self.validator.is_plausible(p))
            .map(str::to_string)
            .unwrap_or_else(|| self.defaults.price_sentinel.clone());

        let discount_label = cleaned(fragment.discount.as_deref())
            .map(|d| truncate_chars(&d, self.discount_max_len))
            .unwrap_or_else(|| self.defaults.discount_sentinel.clone());

        let reference_url = fragment
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(fallback_url)
            .to_string();

        DealRecord {
            source: source.to_string(),
            title,
            price,
            discount_label,
            reference_url,
            generic: fragment.generic,
        }
    }

    pub fn price_sentinel(&self) -> &str {
        &self.defaults.price_sentinel
    }
}

/// Markup-stripped, whitespace-collapsed text, or `None` if nothing is left
fn cleaned(text: Option<&str>) -> Option<String> {
    text.map(clean_text).filter(|t| !t.is_empty())
}
