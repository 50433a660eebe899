//! Budget accounting and the truncation policy.

use serde::{Deserialize, Serialize};

use super::{FactKind, FactStatement, ScoredSnippet};

/// Remaining capacity of the payload, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    limit: usize,
    used: usize,
}

impl Budget {
    pub fn new(limit: usize) -> Self {
        Self { limit, used: 0 }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.used)
    }

    pub fn fits(&self, size: usize) -> bool {
        size <= self.remaining()
    }

    /// Reserve `size` if it fits.
    pub fn try_reserve(&mut self, size: usize) -> bool {
        if self.fits(size) {
            self.used += size;
            true
        } else {
            false
        }
    }

    /// Reserve unconditionally; used only for never-dropped facts.
    fn force_reserve(&mut self, size: usize) {
        self.used += size;
    }

    pub fn is_exceeded(&self) -> bool {
        self.used > self.limit
    }
}

/// Drop priority for mandatory facts; lower goes first, `None` never goes.
fn drop_rank(kind: &FactKind) -> Option<(u8, usize)> {
    match kind {
        // Oldest match detail first.
        FactKind::MatchDetail { age } => Some((0, usize::MAX - age)),
        FactKind::CurrentStats => Some((1, 0)),
        FactKind::ChampionPool => Some((2, 0)),
        _ => None,
    }
}

/// Outcome of reserving the mandatory facts.
#[derive(Debug, Clone, PartialEq)]
pub struct MandatoryReservation {
    pub kept: Vec<FactStatement>,
    pub dropped: Vec<FactKind>,
    /// True when the never-dropped facts alone exceed the budget.
    pub over_budget: bool,
}

/// Reserve budget for mandatory facts, dropping by policy until they fit:
/// match details oldest first, then the current stat line, then the
/// champion pool. The role and the current outcome are always kept.
pub fn reserve_mandatory(facts: Vec<FactStatement>, budget: &mut Budget) -> MandatoryReservation {
    let mut total: usize = facts.iter().map(FactStatement::size).sum();

    let mut droppable: Vec<(usize, (u8, usize))> = facts
        .iter()
        .enumerate()
        .filter_map(|(i, f)| drop_rank(&f.kind).map(|rank| (i, rank)))
        .collect();
    droppable.sort_by_key(|(_, rank)| *rank);

    let mut removed = vec![false; facts.len()];
    let mut dropped = Vec::new();
    for (index, _) in droppable {
        if total <= budget.remaining() {
            break;
        }
        removed[index] = true;
        total -= facts[index].size();
        dropped.push(facts[index].kind);
    }

    let kept: Vec<FactStatement> = facts
        .into_iter()
        .zip(removed)
        .filter_map(|(fact, gone)| (!gone).then_some(fact))
        .collect();

    let over_budget = !budget.fits(total);
    budget.force_reserve(total);

    MandatoryReservation {
        kept,
        dropped,
        over_budget,
    }
}

/// Include each optional fact that still fits; returns the kept facts and
/// the number skipped.
pub fn include_findings(
    findings: Vec<FactStatement>,
    budget: &mut Budget,
) -> (Vec<FactStatement>, usize) {
    let mut skipped = 0;
    let kept: Vec<FactStatement> = findings
        .into_iter()
        .filter(|fact| {
            let fits = budget.try_reserve(fact.size());
            if !fits {
                skipped += 1;
            }
            fits
        })
        .collect();
    (kept, skipped)
}

/// Snippets selected for the payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SnippetSelection {
    pub included: Vec<ScoredSnippet>,
    /// Candidates left out, starting with the first one that did not fit.
    pub excluded: usize,
}

/// Greedily include ranked snippets until the first one that does not fit,
/// then stop. Snippets are never split.
pub fn select_snippets(ranked: Vec<ScoredSnippet>, budget: &mut Budget) -> SnippetSelection {
    let mut selection = SnippetSelection::default();
    let mut candidates = ranked.into_iter();
    for candidate in candidates.by_ref() {
        if budget.try_reserve(candidate.size()) {
            selection.included.push(candidate);
        } else {
            selection.excluded = 1;
            break;
        }
    }
    selection.excluded += candidates.count();
    selection
}
