use crate::parsers::{ExtractError, ExtractionRules, Page, RawFragment, Tier, resolve_href};
use crate::results::ExtractionMethod;
use crate::utils::{CURRENCY_RE, clean_text};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Discount phrases, most specific first
static DISCOUNT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bsave\s+\$\d+(?:\.\d{1,2})?",
        r"(?i)\bhalf\s+price\b|½\s*price\b",
        r"(?i)\b\d{1,3}\s?%\s*off\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("discount pattern is valid"))
    .collect()
});

static HREF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"href\s*=\s*["']([^"']+)["']"#).expect("href pattern is valid"));

/// First discount phrase in `text`: "save $X" beats "half price" beats "X% off"
pub fn find_discount(text: &str) -> Option<String> {
    DISCOUNT_PATTERNS
        .iter()
        .find_map(|re| re.find(text))
        .map(|m| m.as_str().to_string())
}

/// Split raw content into bounded segments
///
/// Lines are the primary unit. Lines longer than `max_len` chars (minified
/// markup) are re-chunked on tag-open boundaries so no segment exceeds `max_len`.
pub fn split_segments(content: &str, max_len: usize) -> Vec<String> {
    let mut segments = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.chars().count() <= max_len {
            segments.push(line.to_string());
            continue;
        }

        let mut current = String::new();
        let mut current_len = 0;
        for piece in split_keep_tag_open(line) {
            let piece_len = piece.chars().count();
            if current_len + piece_len > max_len && !current.is_empty() {
                segments.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if piece_len > max_len {
                // A single pathological piece is capped rather than kept whole
                segments.push(piece.chars().take(max_len).collect());
                continue;
            }
            current.push_str(piece);
            current_len += piece_len;
        }
        if !current.is_empty() {
            segments.push(current);
        }
    }
    segments
}

/// Split before every '<' so each piece starts at a tag
fn split_keep_tag_open(line: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in line.match_indices('<') {
        if idx > start {
            pieces.push(&line[start..idx]);
        }
        start = idx;
    }
    if start < line.len() {
        pieces.push(&line[start..]);
    }
    pieces
}

/// Tier 3: keyword and price co-occurring in a raw text segment
pub struct FreeTextTier;

impl Tier for FreeTextTier {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::FreeText
    }

    fn extract(
        &self,
        page: &Page,
        rules: &ExtractionRules,
    ) -> Result<Vec<RawFragment>, ExtractError> {
        let limits = &rules.limits;
        let mut seen: HashSet<String> = HashSet::new();
        let mut fragments = Vec::new();

        for segment in split_segments(page.content, limits.max_segment_len) {
            if fragments.len() >= limits.max_text_records {
                ::log::debug!("Free-text tier reached {} records", limits.max_text_records);
                break;
            }
            if segment.chars().count() < limits.min_segment_len
                || !rules.matcher.matches(&segment)
                || !CURRENCY_RE.is_match(&segment)
            {
                continue;
            }

            let cleaned = clean_text(&segment);
            if !seen.insert(cleaned.clone()) {
                continue;
            }

            let Some(price) = rules.validator.first_plausible(&cleaned) else {
                ::log::debug!("No plausible price in segment: {:.60}", cleaned);
                continue;
            };

            let title = clean_text(&cleaned.replace(price, " "));
            let url = HREF_RE
                .captures(&segment)
                .and_then(|caps| caps.get(1))
                .and_then(|href| resolve_href(href.as_str(), page.base_url));

            fragments.push(RawFragment {
                title: (!title.is_empty()).then_some(title),
                price: Some(price.to_string()),
                discount: find_discount(&cleaned),
                url,
                generic: false,
            });
        }

        Ok(fragments)
    }
}
