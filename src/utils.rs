use once_cell::sync::Lazy;
use regex::Regex;

/// Matches a dollar amount with exactly two decimal places, e.g. `$21.50`
pub static CURRENCY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\d+\.\d{2}\b").expect("currency pattern is valid"));

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

static ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&#?[a-zA-Z0-9]+;").expect("entity pattern is valid"));

/// Remove tag-like substrings and HTML entities
///
/// A handful of common entities are decoded; anything else is dropped.
pub fn strip_markup(text: &str) -> String {
    let without_tags = TAG_RE.replace_all(text, " ");
    let decoded = without_tags
        .replace("&amp;", "&")
        .replace("&nbsp;", " ")
        .replace("&#36;", "$")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    ENTITY_RE.replace_all(&decoded, "").into_owned()
}

/// Collapse all runs of whitespace into single spaces and trim the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip markup then collapse whitespace
pub fn clean_text(text: &str) -> String {
    collapse_whitespace(&strip_markup(text))
}

/// Truncate to at most `max_chars` characters, appending "..." when cut
///
/// Operates on chars so multi-byte text never splits mid-codepoint.
/// Already-truncated input is returned unchanged.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut cut: String = text.chars().take(keep).collect();
    cut.truncate(cut.trim_end().len());
    cut.push_str("...");
    cut
}

/// First currency-looking substring in `text`, if any
pub fn find_currency(text: &str) -> Option<&str> {
    CURRENCY_RE.find(text).map(|m| m.as_str())
}
