//! Field Extractor: derives company, location, and a bounded description
//! from a raw feed item.
//!
//! These are best-effort heuristics over free text. They never fail: when a
//! rule finds nothing, a default is used instead.

use lazy_static::lazy_static;
use regex::Regex;

use crate::feeds::FeedItem;
use crate::models::posting::MAX_DESCRIPTION_CHARS;

pub const UNKNOWN_COMPANY: &str = "Unknown Company";
pub const DEFAULT_LOCATION: &str = "Remote";

/// Upper bound for a `location: ...` fragment, in characters.
const MAX_LOCATION_CHARS: usize = 100;

lazy_static! {
    /// Company rules, tried in order against the title.
    static ref COMPANY_RULES: Vec<Regex> = vec![
        Regex::new(r"(?i)\bat\s+([^|]+)").unwrap(),
        Regex::new(r"-\s*([^-]+)$").unwrap(),
        Regex::new(r"\|\s*(.+)").unwrap(),
        Regex::new(r":\s*([^:]+)").unwrap(),
    ];
    static ref DESCRIPTION_LOCATION: Regex =
        Regex::new(r"(?i)\b(remote|hybrid|onsite)\b|\blocation[:\s]+([^,\r\n]+)").unwrap();
    static ref TITLE_LOCATION: Regex = Regex::new(r"(?i)\b(remote|hybrid|onsite)\b").unwrap();
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFields {
    pub company: String,
    pub location: String,
    pub description: String,
}

/// Runs all extraction rules for one item.
pub fn extract_fields(item: &FeedItem, feed_title: Option<&str>) -> ExtractedFields {
    let title = item.title.as_deref().unwrap_or_default();
    let text = item.best_text();

    ExtractedFields {
        company: extract_company(title, feed_title),
        location: extract_location(text, title),
        description: truncate_chars(text, MAX_DESCRIPTION_CHARS),
    }
}

/// First non-empty capture among the title rules, else the feed's name,
/// else [`UNKNOWN_COMPANY`].
pub fn extract_company(title: &str, feed_title: Option<&str>) -> String {
    COMPANY_RULES
        .iter()
        .filter_map(|rule| rule.captures(title))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim()))
        .find(|company| !company.is_empty())
        .or_else(|| feed_title.map(str::trim).filter(|t| !t.is_empty()))
        .unwrap_or(UNKNOWN_COMPANY)
        .to_string()
}

/// Searches the description, then the title. Defaults to [`DEFAULT_LOCATION`]
/// since the configured sources are remote-job feeds.
pub fn extract_location(description: &str, title: &str) -> String {
    if let Some(caps) = DESCRIPTION_LOCATION.captures(description) {
        if let Some(token) = caps.get(1) {
            return normalize_token(token.as_str());
        }
        if let Some(fragment) = caps.get(2) {
            let fragment = fragment.as_str().trim();
            if !fragment.is_empty() {
                return truncate_chars(fragment, MAX_LOCATION_CHARS);
            }
        }
    }

    TITLE_LOCATION
        .captures(title)
        .and_then(|caps| caps.get(1))
        .map(|m| normalize_token(m.as_str()))
        .unwrap_or_else(|| DEFAULT_LOCATION.to_string())
}

fn normalize_token(token: &str) -> String {
    match token.to_ascii_lowercase().as_str() {
        "remote" => "Remote".to_string(),
        "hybrid" => "Hybrid".to_string(),
        "onsite" => "Onsite".to_string(),
        other => other.to_string(),
    }
}

/// Truncates to at most `max` characters on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
