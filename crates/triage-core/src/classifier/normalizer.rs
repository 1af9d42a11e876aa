//! Text normalization shared by queries and corpus keywords.
//!
//! Lowercase plus whitespace collapsing only. No stemming, no punctuation
//! stripping, no fuzzy matching: containment must stay exact and auditable.

/// Normalize free text for containment matching.
///
/// Leading and trailing whitespace is removed and every internal run of
/// whitespace (spaces, tabs, newlines) becomes a single space.
pub fn normalize_query(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.extend(word.chars().flat_map(char::to_lowercase));
    }
    out
}
