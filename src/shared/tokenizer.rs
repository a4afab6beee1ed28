use once_cell::sync::Lazy;
use regex::Regex;

static NON_ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Normalize text into index terms.
/// - Lowercase
/// - Replace every character outside [a-z0-9] with whitespace
/// - Split on whitespace, dropping empty tokens
///
/// Order-preserving. No stemming, no stop-listing.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let cleaned = NON_ALPHANUMERIC.replace_all(&lowered, " ");
    cleaned.split_whitespace().map(str::to_string).collect()
}
