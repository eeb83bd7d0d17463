use crate::parsers::{ExtractError, ExtractionRules, Page, RawFragment, Tier, resolve_href, text};
use crate::results::ExtractionMethod;
use crate::utils::{CURRENCY_RE, collapse_whitespace};
use scraper::{ElementRef, Selector};

/// How many ancestors of a product link are searched for a price
const MAX_LINK_ANCESTORS: usize = 3;

/// Minimal document-query interface the tiers are written against
pub trait QueryNode<'a>: Sized + Copy {
    fn select_first(&self, selector: &Selector) -> Option<Self>;
    fn select_all(&self, selector: &Selector) -> Vec<Self>;
    /// Whitespace-collapsed text content
    fn text_content(&self) -> String;
    fn attribute(&self, name: &str) -> Option<&'a str>;
    fn parent_element(&self) -> Option<Self>;
}

impl<'a> QueryNode<'a> for ElementRef<'a> {
    fn select_first(&self, selector: &Selector) -> Option<Self> {
        self.select(selector).next()
    }

    fn select_all(&self, selector: &Selector) -> Vec<Self> {
        self.select(selector).collect()
    }

    fn text_content(&self) -> String {
        collapse_whitespace(&self.text().collect::<Vec<_>>().join(" "))
    }

    fn attribute(&self, name: &str) -> Option<&'a str> {
        self.value().attr(name)
    }

    fn parent_element(&self) -> Option<Self> {
        (**self).parent().and_then(ElementRef::wrap)
    }
}

/// Tier 1: repeating product containers
pub struct StructuredContainerTier;

impl Tier for StructuredContainerTier {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::StructuredContainers
    }

    fn extract(
        &self,
        page: &Page,
        rules: &ExtractionRules,
    ) -> Result<Vec<RawFragment>, ExtractError> {
        let root = page.root();

        for (index, selector) in rules.container_selectors.iter().enumerate() {
            let containers = root.select_all(selector);
            if containers.is_empty() {
                continue;
            }

            ::log::debug!(
                "Container selector #{} matched {} elements",
                index,
                containers.len()
            );

            // First selector with matches wins, even if every container is filtered out
            let fragments = containers
                .iter()
                .filter_map(|container| fragment_from_scope(*container, None, page, rules))
                .collect();
            return Ok(fragments);
        }

        Ok(Vec::new())
    }
}

/// Tier 2: on-topic links that look like product or category pages
pub struct ProductLinkTier;

impl Tier for ProductLinkTier {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::ProductLinks
    }

    fn extract(
        &self,
        page: &Page,
        rules: &ExtractionRules,
    ) -> Result<Vec<RawFragment>, ExtractError> {
        let candidates: Vec<ElementRef> = page
            .root()
            .select_all(&rules.anchor_selector)
            .into_iter()
            .filter(|anchor| {
                is_product_link(*anchor, rules) && rules.matcher.matches(&anchor.text_content())
            })
            .take(rules.limits.max_link_candidates)
            .collect();

        ::log::debug!("{} product link candidates", candidates.len());

        let fragments = candidates
            .iter()
            .filter_map(|anchor| {
                // The price usually sits beside the link rather than inside it
                let mut scope = Some(*anchor);
                for _ in 0..=MAX_LINK_ANCESTORS {
                    let current = scope?;
                    if let Some(fragment) = fragment_from_scope(current, Some(*anchor), page, rules)
                    {
                        return Some(fragment);
                    }
                    // A parent shared with other products would lend us their prices
                    scope = current
                        .parent_element()
                        .filter(|parent| product_link_count(*parent, rules) <= 1);
                }
                None
            })
            .collect();

        Ok(fragments)
    }
}

fn is_product_link<'a, N: QueryNode<'a>>(anchor: N, rules: &ExtractionRules) -> bool {
    anchor
        .attribute("href")
        .is_some_and(|href| rules.product_path.is_match(href))
}

fn product_link_count<'a, N: QueryNode<'a>>(scope: N, rules: &ExtractionRules) -> usize {
    scope
        .select_all(&rules.anchor_selector)
        .into_iter()
        .filter(|anchor| is_product_link(*anchor, rules))
        .count()
}

/// Build a fragment from one container, or `None` if it is off-topic or has no valid price
pub(crate) fn fragment_from_scope<'a, N: QueryNode<'a>>(
    scope: N,
    link: Option<N>,
    page: &Page,
    rules: &ExtractionRules,
) -> Option<RawFragment> {
    let scope_text = scope.text_content();
    if !rules.matcher.matches(&scope_text) {
        ::log::trace!("Skipping off-topic container");
        return None;
    }

    let Some(price) = extract_price(scope, &scope_text, rules) else {
        ::log::debug!(
            "Dropping container without a plausible price: {:.60}",
            scope_text
        );
        return None;
    };

    Some(RawFragment {
        title: extract_title(scope, link, &scope_text, rules),
        price: Some(price),
        discount: extract_discount(scope, &scope_text, rules),
        url: extract_url(scope, link, page, rules),
        generic: false,
    })
}

/// Title candidates in priority order; first on-topic one of at least
/// `min_title_len` chars wins, else the first on-topic one of any length
fn extract_title<'a, N: QueryNode<'a>>(
    scope: N,
    link: Option<N>,
    scope_text: &str,
    rules: &ExtractionRules,
) -> Option<String> {
    let mut candidates: Vec<String> = Vec::new();
    if let Some(link) = link {
        candidates.push(link.text_content());
        if let Some(title) = link.attribute("title") {
            candidates.push(collapse_whitespace(title));
        }
    }
    for selector in &rules.title_selectors {
        if let Some(node) = scope.select_first(selector) {
            candidates.push(node.text_content());
        }
    }
    candidates.push(collapse_whitespace(&CURRENCY_RE.replace_all(scope_text, " ")));

    let on_topic: Vec<&String> = candidates
        .iter()
        .filter(|c| rules.matcher.matches(c))
        .collect();

    on_topic
        .iter()
        .find(|c| c.chars().count() >= rules.limits.min_title_len)
        .or_else(|| on_topic.first())
        .map(|c| c.to_string())
}

fn extract_price<'a, N: QueryNode<'a>>(
    scope: N,
    scope_text: &str,
    rules: &ExtractionRules,
) -> Option<String> {
    for selector in &rules.price_selectors {
        for node in scope.select_all(selector) {
            if let Some(price) = rules.validator.first_plausible(&node.text_content()) {
                return Some(price.to_string());
            }
        }
    }
    rules
        .validator
        .first_plausible(scope_text)
        .map(|p| p.to_string())
}

fn extract_discount<'a, N: QueryNode<'a>>(
    scope: N,
    scope_text: &str,
    rules: &ExtractionRules,
) -> Option<String> {
    for selector in &rules.discount_selectors {
        for node in scope.select_all(selector) {
            let label = node.text_content();
            if !label.is_empty() {
                return Some(label);
            }
        }
    }
    text::find_discount(scope_text)
}

/// The link's own href, else the container's, else its first anchor
fn extract_url<'a, N: QueryNode<'a>>(
    scope: N,
    link: Option<N>,
    page: &Page,
    rules: &ExtractionRules,
) -> Option<String> {
    let own = link
        .and_then(|l| l.attribute("href"))
        .or_else(|| scope.attribute("href"));
    if let Some(url) = own.and_then(|href| resolve_href(href, page.base_url)) {
        return Some(url);
    }

    scope
        .select_all(&rules.anchor_selector)
        .into_iter()
        .filter_map(|a| a.attribute("href"))
        .find_map(|href| resolve_href(href, page.base_url))
}
