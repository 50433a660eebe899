//! Snippet relevance scoring against the combined query signal.

use match_data::{KnowledgeSnippet, SnippetId};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};

use super::FactStatement;
use crate::text;

/// Weight of a term taken from the user's question.
pub const QUESTION_TERM_WEIGHT: f64 = 1.0;
/// Weight of a term derived from a fact statement's keywords.
pub const FACT_TERM_WEIGHT: f64 = 0.5;

/// Weighted query terms plus an optional query embedding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySignal {
    terms: BTreeMap<String, f64>,
    embedding: Option<Vec<f32>>,
}

impl QuerySignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Question terms at full weight, then fact keywords at reduced weight.
    pub fn from_question(question: &str, facts: &[FactStatement]) -> Self {
        let mut signal = Self::new();
        for term in text::terms(question) {
            signal.add_term(term, QUESTION_TERM_WEIGHT);
        }
        for keyword in facts.iter().flat_map(|f| f.keywords.iter()) {
            signal.add_term(keyword.clone(), FACT_TERM_WEIGHT);
        }
        signal
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Add a term, keeping the larger weight if it is already present.
    pub fn add_term(&mut self, term: impl Into<String>, weight: f64) {
        let entry = self.terms.entry(term.into()).or_insert(0.0);
        *entry = entry.max(weight);
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    /// Terms for the store's snippet search.
    pub fn query_terms(&self) -> Vec<String> {
        self.terms.keys().cloned().collect()
    }

    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.embedding.is_none()
    }

    /// Weighted share of query terms present in the vocabulary, 0 - 1.
    pub fn term_overlap(&self, vocabulary: &BTreeSet<String>) -> f64 {
        let total: f64 = self.terms.values().sum();
        if total <= 0.0 {
            return 0.0;
        }
        let hit: f64 = self
            .terms
            .iter()
            .filter(|(term, _)| vocabulary.contains(*term))
            .map(|(_, weight)| weight)
            .sum();
        hit / total
    }
}

/// Cosine similarity; `None` when dimensions differ or a vector is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a <= f64::EPSILON || norm_b <= f64::EPSILON {
        return None;
    }
    Some(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

/// Deterministic relevance function. Any implementation is acceptable as
/// long as equal inputs give equal scores.
pub trait RelevanceScorer: Send + Sync {
    fn score(&self, query: &QuerySignal, snippet: &KnowledgeSnippet) -> f64;
}

/// Term overlap, blended with embedding cosine similarity when both sides
/// carry an embedding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapScorer {
    /// Share of the score taken by the embedding similarity (0 - 1).
    pub embedding_weight: f64,
}

impl Default for OverlapScorer {
    fn default() -> Self {
        Self { embedding_weight: 0.5 }
    }
}

impl RelevanceScorer for OverlapScorer {
    fn score(&self, query: &QuerySignal, snippet: &KnowledgeSnippet) -> f64 {
        let mut vocabulary = text::terms(&snippet.title);
        vocabulary.extend(text::terms(&snippet.text));
        vocabulary.extend(snippet.keywords.iter().flat_map(|k| text::terms(k)));
        let overlap = query.term_overlap(&vocabulary);

        let similarity = query
            .embedding()
            .zip(snippet.embedding.as_deref())
            .and_then(|(q, s)| cosine_similarity(q, s));

        match similarity {
            Some(cos) => {
                let w = self.embedding_weight.clamp(0.0, 1.0);
                (1.0 - w) * overlap + w * cos.max(0.0)
            }
            None => overlap,
        }
    }
}

/// A snippet with its relevance score. Serializes only the snippet's text
/// fields; keywords and embedding are ranking inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSnippet {
    #[serde(serialize_with = "serialize_snippet_text")]
    pub snippet: KnowledgeSnippet,
    pub score: f64,
}

#[derive(Serialize)]
struct SnippetText<'a> {
    id: SnippetId,
    title: &'a str,
    text: &'a str,
    published_at: u64,
}

fn serialize_snippet_text<S>(snippet: &KnowledgeSnippet, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    SnippetText {
        id: snippet.id,
        title: &snippet.title,
        text: &snippet.text,
        published_at: snippet.published_at,
    }
    .serialize(serializer)
}

impl ScoredSnippet {
    pub fn new(snippet: KnowledgeSnippet, score: f64) -> Self {
        Self { snippet, score }
    }

    pub fn size(&self) -> usize {
        self.snippet.size()
    }
}

/// Sort by score descending, then recency descending, then id ascending.
pub fn sort_scored(snippets: &mut [ScoredSnippet]) {
    snippets.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.snippet.published_at.cmp(&a.snippet.published_at))
            .then_with(|| a.snippet.id.cmp(&b.snippet.id))
    });
}

/// Score, drop irrelevant (score <= 0) candidates, and sort.
pub fn rank_by_relevance(
    query: &QuerySignal,
    candidates: Vec<KnowledgeSnippet>,
    scorer: &dyn RelevanceScorer,
) -> Vec<ScoredSnippet> {
    let mut seen = BTreeSet::new();
    let mut scored: Vec<ScoredSnippet> = candidates
        .into_iter()
        .filter(|s| seen.insert(s.id))
        .filter_map(|snippet| {
            let score = scorer.score(query, &snippet);
            (score.is_finite() && score > 0.0).then(|| ScoredSnippet::new(snippet, score))
        })
        .collect();
    sort_scored(&mut scored);
    scored
}
