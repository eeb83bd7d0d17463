use super::{COLES_URL, default_extractor, default_rules};
use crate::parsers::fallback::GenericFallbackTier;
use crate::parsers::html::{ProductLinkTier, StructuredContainerTier};
use crate::parsers::text::FreeTextTier;
use crate::parsers::{
    ExtractError, ExtractionRules, Page, PatternExtractor, RawFragment, Tier, resolve_href,
};
use crate::results::ExtractionMethod;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

/// Wraps a tier and counts how often it runs
struct CountingTier {
    inner: Box<dyn Tier>,
    calls: Arc<AtomicUsize>,
}

impl Tier for CountingTier {
    fn method(&self) -> ExtractionMethod {
        self.inner.method()
    }

    fn extract(
        &self,
        page: &Page,
        rules: &ExtractionRules,
    ) -> Result<Vec<RawFragment>, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.extract(page, rules)
    }
}

struct FailingTier;

impl Tier for FailingTier {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::StructuredContainers
    }

    fn extract(&self, _: &Page, _: &ExtractionRules) -> Result<Vec<RawFragment>, ExtractError> {
        Err(ExtractError::Document("unreadable".to_string()))
    }
}

fn counting_extractor() -> (PatternExtractor, Vec<Arc<AtomicUsize>>) {
    let inner: Vec<Box<dyn Tier>> = vec![
        Box::new(StructuredContainerTier),
        Box::new(ProductLinkTier),
        Box::new(FreeTextTier),
        Box::new(GenericFallbackTier),
    ];
    let counters: Vec<Arc<AtomicUsize>> =
        inner.iter().map(|_| Arc::new(AtomicUsize::new(0))).collect();
    let tiers = inner
        .into_iter()
        .zip(&counters)
        .map(|(inner, calls)| {
            Box::new(CountingTier {
                inner,
                calls: Arc::clone(calls),
            }) as Box<dyn Tier>
        })
        .collect();
    (PatternExtractor::with_tiers(default_rules(), tiers), counters)
}

fn calls(counters: &[Arc<AtomicUsize>]) -> Vec<usize> {
    counters.iter().map(|c| c.load(Ordering::SeqCst)).collect()
}

#[cfg(test)]
mod cascade_tests {
    use super::*;

    #[test]
    fn test_structured_hit_skips_later_tiers() {
        let (extractor, counters) = counting_extractor();
        let html = r#"<div class="product-tile"><h3>Huggies Nappies Size 4</h3>
            <span class="price">$21.50</span></div>"#;

        let extraction = extractor.extract(html, COLES_URL);
        assert_eq!(extraction.method, ExtractionMethod::StructuredContainers);
        assert_eq!(calls(&counters), [1, 0, 0, 0]);
    }

    #[test]
    fn test_fallback_runs_only_after_all_tiers_miss() {
        let (extractor, counters) = counting_extractor();
        let html = "<p>We stock Pampers nappies in all sizes.</p>";

        let extraction = extractor.extract(html, COLES_URL);
        assert_eq!(extraction.method, ExtractionMethod::GenericFallback);
        assert_eq!(calls(&counters), [1, 1, 1, 1]);
    }

    #[test]
    fn test_empty_content_runs_no_tiers() {
        let (extractor, counters) = counting_extractor();
        let extraction = extractor.extract("   ", COLES_URL);
        assert_eq!(extraction.method, ExtractionMethod::None);
        assert!(extraction.fragments.is_empty());
        assert_eq!(calls(&counters), [0, 0, 0, 0]);
    }

    #[test]
    fn test_tier_error_advances_to_next_tier() {
        let extractor = PatternExtractor::with_tiers(
            default_rules(),
            vec![Box::new(FailingTier), Box::new(FreeTextTier)],
        );
        let extraction = extractor.extract("Huggies Nappies Jumbo $35.00", COLES_URL);
        assert_eq!(extraction.method, ExtractionMethod::FreeText);
        assert_eq!(extraction.fragments.len(), 1);
    }

    #[test]
    fn test_first_matching_container_selector_wins() {
        // The data-testid selector matches first, so .product-tile is never consulted
        let html = "<div data-testid=\"product-tile\">Toilet paper $9.00</div>\n\
                    <div class=\"product-tile\">Huggies Nappies $21.50</div>";
        let extraction = default_extractor().extract(html, COLES_URL);
        assert_eq!(extraction.method, ExtractionMethod::FreeText);
        assert_eq!(extraction.fragments[0].price.as_deref(), Some("$21.50"));
    }

    #[test]
    fn test_no_keywords_no_records() {
        let html = r#"<div class="product-tile"><h3>Toilet Paper 24 Pack</h3>
            <span class="price">$12.00</span></div>"#;
        let extraction = default_extractor().extract(html, COLES_URL);
        assert_eq!(extraction.method, ExtractionMethod::None);
        assert!(extraction.fragments.is_empty());
    }
}

#[cfg(test)]
mod container_tests {
    use super::*;

    #[test]
    fn test_prefers_descriptive_title() {
        let html = r#"<div class="product-tile">
            <h2>Huggies</h2>
            <h3>Huggies Ultra Dry Nappies Size 4</h3>
            <span class="price">$21.50</span></div>"#;
        let extraction = default_extractor().extract(html, COLES_URL);
        assert_eq!(
            extraction.fragments[0].title.as_deref(),
            Some("Huggies Ultra Dry Nappies Size 4")
        );
    }

    #[test]
    fn test_first_valid_price_wins() {
        let html = r#"<div class="product-tile"><h3>Pampers Baby Dry Nappies</h3>
            <span class="price__value">$250.00</span>
            <span class="price">$42.00</span>
            <span class="price">$39.00</span></div>"#;
        let extraction = default_extractor().extract(html, COLES_URL);
        assert_eq!(extraction.fragments[0].price.as_deref(), Some("$42.00"));
    }

    #[test]
    fn test_discount_from_vocabulary_when_no_badge() {
        let html = r#"<div class="product-tile"><h3>Babylove Nappy Pants</h3>
            <span class="price">$18.00</span> <p>Now 30% off</p></div>"#;
        let extraction = default_extractor().extract(html, COLES_URL);
        assert_eq!(extraction.fragments[0].discount.as_deref(), Some("30% off"));
    }

    #[test]
    fn test_relative_link_made_absolute() {
        let html = r#"<div class="product-tile">
            <a href="/product/huggies-ultra-dry-4"><h3>Huggies Ultra Dry Nappies</h3></a>
            <span class="price">$21.50</span></div>"#;
        let extraction = default_extractor().extract(html, COLES_URL);
        assert_eq!(
            extraction.fragments[0].url.as_deref(),
            Some("https://www.coles.com.au/product/huggies-ultra-dry-4")
        );
    }

    #[test]
    fn test_container_without_price_dropped_others_kept() {
        let html = r#"
            <div class="product-tile"><h3>Huggies Nappies Size 3</h3><span class="price">$150.00</span></div>
            <div class="product-tile"><h3>Huggies Nappies Size 5</h3><span class="price">$27.00</span></div>"#;
        let extraction = default_extractor().extract(html, COLES_URL);
        assert_eq!(extraction.method, ExtractionMethod::StructuredContainers);
        assert_eq!(extraction.fragments.len(), 1);
        assert_eq!(extraction.fragments[0].price.as_deref(), Some("$27.00"));
    }

    #[test]
    fn test_malformed_markup_still_extracts() {
        let html = r#"<div class="product-tile"><h3>Huggies Nappies Size 4<span class="price">$21.50</div></div></span>"#;
        let extraction = default_extractor().extract(html, COLES_URL);
        assert_eq!(extraction.fragments.len(), 1);
        assert_eq!(extraction.fragments[0].price.as_deref(), Some("$21.50"));
    }
}

#[cfg(test)]
mod link_tests {
    use super::*;

    #[test]
    fn test_product_links_with_neighbouring_price() {
        let html = r#"<ul>
            <li><a href="/product/huggies-ultra-dry-size-4">Huggies Ultra Dry Nappies Size 4</a>
                <span>$24.00</span> <em>Half Price</em></li>
            <li><a href="/about">About our nappies</a> $9.00</li>
        </ul>"#;
        let extraction = default_extractor().extract(html, COLES_URL);
        assert_eq!(extraction.method, ExtractionMethod::ProductLinks);
        assert_eq!(extraction.fragments.len(), 1);

        let fragment = &extraction.fragments[0];
        assert_eq!(
            fragment.title.as_deref(),
            Some("Huggies Ultra Dry Nappies Size 4")
        );
        assert_eq!(fragment.price.as_deref(), Some("$24.00"));
        assert_eq!(fragment.discount.as_deref(), Some("Half Price"));
        assert_eq!(
            fragment.url.as_deref(),
            Some("https://www.coles.com.au/product/huggies-ultra-dry-size-4")
        );
    }

    #[test]
    fn test_link_never_borrows_a_sibling_price() {
        let html = r#"<ul>
            <li><a href="/product/pampers-5">Pampers Nappies Size 5</a></li>
            <li><a href="/product/huggies-4">Huggies Nappies Size 4</a> $24.00</li>
        </ul>"#;
        let extraction = default_extractor().extract(html, COLES_URL);
        assert_eq!(extraction.method, ExtractionMethod::ProductLinks);
        assert_eq!(extraction.fragments.len(), 1);

        let fragment = &extraction.fragments[0];
        assert_eq!(fragment.title.as_deref(), Some("Huggies Nappies Size 4"));
        assert_eq!(fragment.price.as_deref(), Some("$24.00"));
        assert_eq!(
            fragment.url.as_deref(),
            Some("https://www.coles.com.au/product/huggies-4")
        );
    }

    #[test]
    fn test_link_candidates_capped() {
        let items: String = (0..15)
            .map(|i| {
                format!(
                    "<li><a href=\"/product/nappies-{i}\">Huggies Nappies Pack {i}</a> ${}.00</li>\n",
                    10 + i
                )
            })
            .collect();
        let extraction = default_extractor().extract(&format!("<ul>{items}</ul>"), COLES_URL);
        assert_eq!(extraction.method, ExtractionMethod::ProductLinks);
        assert_eq!(extraction.fragments.len(), 10);
    }
}

#[cfg(test)]
mod free_text_tests {
    use super::*;

    const PLAIN: &str = "Weekly specials\n\
        Huggies Ultra Dry Nappies Jumbo Pack $35.00 save $10.00\n\
        Pampers Baby Dry Nappies Size 5 $24.50 20% off\n\
        Toilet paper 24 pack $9.00\n\
        Babylove Nappy Pants Bulk $150.00\n";

    #[test]
    fn test_plain_text_segments() {
        let extraction = default_extractor().extract(PLAIN, COLES_URL);
        assert_eq!(extraction.method, ExtractionMethod::FreeText);
        assert_eq!(extraction.fragments.len(), 2);

        let first = &extraction.fragments[0];
        assert_eq!(first.price.as_deref(), Some("$35.00"));
        assert_eq!(first.discount.as_deref(), Some("save $10.00"));
        assert!(first.title.as_deref().unwrap().starts_with("Huggies Ultra Dry"));
        assert!(!first.title.as_deref().unwrap().contains("$35.00"));

        let second = &extraction.fragments[1];
        assert_eq!(second.price.as_deref(), Some("$24.50"));
        assert_eq!(second.discount.as_deref(), Some("20% off"));
    }

    #[test]
    fn test_free_text_record_cap() {
        let content: String = (0..8)
            .map(|i| format!("Huggies Nappies value pack {i} ${}.00\n", 20 + i))
            .collect();
        let extraction = default_extractor().extract(&content, COLES_URL);
        assert_eq!(extraction.fragments.len(), 5);
    }

    #[test]
    fn test_repeated_segments_collapse() {
        let line = "Huggies Nappies Jumbo Pack $35.00\n";
        let extraction = default_extractor().extract(&line.repeat(3), COLES_URL);
        assert_eq!(extraction.fragments.len(), 1);
    }
}

#[cfg(test)]
mod fallback_tests {
    use super::*;

    #[test]
    fn test_fallback_never_invents_a_price() {
        let html = "<p>Pampers nappies on special this week, prices from $150.00</p>";
        let extraction = default_extractor().extract(html, COLES_URL);
        assert_eq!(extraction.method, ExtractionMethod::GenericFallback);
        assert_eq!(extraction.fragments.len(), 1);

        let fragment = &extraction.fragments[0];
        assert!(fragment.generic);
        assert_eq!(fragment.price, None);
        assert_eq!(
            fragment.discount.as_deref(),
            Some("Check website for current deals")
        );
        assert_eq!(fragment.url.as_deref(), Some(COLES_URL));
    }
}

#[cfg(test)]
mod href_tests {
    use super::*;

    #[test]
    fn test_resolve_href() {
        let base = Url::parse("https://www.coles.com.au/browse/baby/nappies").unwrap();
        assert_eq!(
            resolve_href("/product/a", Some(&base)).as_deref(),
            Some("https://www.coles.com.au/product/a")
        );
        assert_eq!(
            resolve_href("product/a", Some(&base)).as_deref(),
            Some("https://www.coles.com.au/product/a")
        );
        assert_eq!(
            resolve_href("https://other.example/x", Some(&base)).as_deref(),
            Some("https://other.example/x")
        );
        assert_eq!(resolve_href("#top", Some(&base)), None);
        assert_eq!(resolve_href("javascript:void(0)", Some(&base)), None);
        assert_eq!(resolve_href("mailto:a@b.c", Some(&base)), None);
        assert_eq!(resolve_href("/product/a", None), None);
    }
}
