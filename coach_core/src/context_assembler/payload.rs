//! The bounded bundle handed to the language-generation collaborator.

use match_data::{PlayerId, Role};
use serde::{Deserialize, Serialize};

use super::{FactKind, FactSection, FactStatement, ScoredSnippet};

/// A section left out of the payload and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OmittedSection {
    pub section: FactSection,
    pub reason: String,
}

/// What the budget forced out.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TruncationReport {
    /// Mandatory facts dropped, in drop order.
    pub dropped_mandatory: Vec<FactKind>,
    /// Findings that did not fit.
    pub skipped_findings: usize,
    /// Ranked snippets that were not included.
    pub excluded_snippets: usize,
    /// The never-dropped facts alone exceed the budget.
    pub over_budget: bool,
}

impl TruncationReport {
    pub fn is_truncated(&self) -> bool {
        !self.dropped_mandatory.is_empty()
            || self.skipped_findings > 0
            || self.excluded_snippets > 0
    }
}

/// Facts and snippets, copied by value, within a byte budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextPayload {
    pub player_id: PlayerId,
    pub role: Role,
    pub question: String,
    /// Mandatory facts first, then findings in section order.
    pub facts: Vec<FactStatement>,
    /// Best first.
    pub snippets: Vec<ScoredSnippet>,
    pub budget: usize,
    pub used: usize,
    pub omitted_sections: Vec<OmittedSection>,
    pub truncation: TruncationReport,
}

impl ContextPayload {
    /// Sum of the included snippets' relevance scores.
    pub fn total_relevance(&self) -> f64 {
        self.snippets.iter().map(|s| s.score).sum()
    }

    pub fn facts_in(&self, section: FactSection) -> impl Iterator<Item = &FactStatement> {
        self.facts.iter().filter(move |f| f.section() == section)
    }

    pub fn has_section(&self, section: FactSection) -> bool {
        match section {
            FactSection::Snippets => !self.snippets.is_empty(),
            other => self.facts_in(other).next().is_some(),
        }
    }

    pub fn is_omitted(&self, section: FactSection) -> bool {
        self.omitted_sections.iter().any(|o| o.section == section)
    }

    /// Measured size of the contents; equals `used`.
    pub fn content_size(&self) -> usize {
        self.facts.iter().map(FactStatement::size).sum::<usize>()
            + self.snippets.iter().map(ScoredSnippet::size).sum::<usize>()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
