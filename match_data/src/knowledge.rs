//! General-knowledge snippets: strategy notes, matchup facts, item advice.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::ids::SnippetId;

/// A unit of general domain text with a keyword signature for ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSnippet {
    pub id: SnippetId,

    pub title: String,

    /// Body text handed verbatim to the language-generation collaborator.
    pub text: String,

    /// Lowercase keywords describing the snippet.
    #[serde(default)]
    pub keywords: BTreeSet<String>,

    /// Optional dense embedding for similarity ranking.
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,

    /// Publication time, unix seconds. Newer snippets win relevance ties.
    #[serde(default)]
    pub published_at: u64,
}

impl KnowledgeSnippet {
    /// Create a new snippet with the given title and text.
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: SnippetId::new(),
            title: title.into(),
            text: text.into(),
            keywords: BTreeSet::new(),
            embedding: None,
            published_at: 0,
        }
    }

    pub fn with_id(mut self, id: SnippetId) -> Self {
        self.id = id;
        self
    }

    /// Add a keyword (stored lowercase).
    pub fn with_keyword(mut self, keyword: impl AsRef<str>) -> Self {
        self.keywords.insert(keyword.as_ref().trim().to_lowercase());
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for keyword in keywords {
            self.keywords.insert(keyword.as_ref().trim().to_lowercase());
        }
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_published_at(mut self, published_at: u64) -> Self {
        self.published_at = published_at;
        self
    }

    /// Size in bytes of the text this snippet contributes to a payload.
    pub fn size(&self) -> usize {
        self.title.len() + self.text.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_builder() {
        let snippet = KnowledgeSnippet::new("Warding", "Ward the river bush before dragon.")
            .with_keyword("Vision")
            .with_keywords(["dragon", " river "])
            .with_published_at(10);

        assert_eq!(snippet.keywords.len(), 3);
        assert!(snippet.keywords.contains("vision"));
        assert!(snippet.keywords.contains("river"));
        assert_eq!(snippet.published_at, 10);
        assert_eq!(snippet.size(), "Warding".len() + "Ward the river bush before dragon.".len());
    }
}
