//! Term normalisation shared by snippet search and relevance scoring.

use std::collections::BTreeSet;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "can", "do", "does", "for", "from",
    "how", "i", "if", "in", "is", "it", "me", "my", "of", "on", "or", "so", "should", "that",
    "the", "this", "to", "was", "what", "when", "where", "which", "who", "why", "with", "you",
    "your",
];

/// Split text into lowercase alphanumeric terms, dropping stopwords and
/// single characters.
pub fn terms(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 1)
        .map(|t| t.to_lowercase())
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
        .collect()
}

/// Normalise a list of caller-supplied query terms the same way.
pub fn normalize_terms<S: AsRef<str>>(raw: &[S]) -> BTreeSet<String> {
    raw.iter().flat_map(|t| terms(t.as_ref())).collect()
}
