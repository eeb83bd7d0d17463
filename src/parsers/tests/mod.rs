mod extractor_tests;

use crate::config::AppConfig;
use crate::parsers::{ExtractionRules, PatternExtractor};

pub(super) const COLES_URL: &str = "https://www.coles.com.au/on-special/baby/nappies-nappy-pants";

pub(super) fn default_rules() -> ExtractionRules {
    ExtractionRules::from_config(&AppConfig::default()).unwrap()
}

pub(super) fn default_extractor() -> PatternExtractor {
    PatternExtractor::new(default_rules())
}
