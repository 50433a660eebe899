//! In-memory store for synthetic corpora and embedding callers.

use match_data::{KnowledgeSnippet, MatchRecord, PlayerId, ReferencePlayerStat, Role};
use std::collections::HashMap;

use super::{
    rank_snippets, select_reference_stats, MatchFilter, MatchSource, ReferenceSource, SnippetSource,
};
use crate::error::StoreError;

/// A fully in-memory [`RecordStore`](super::RecordStore).
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    players: HashMap<PlayerId, Vec<MatchRecord>>,
    reference: Vec<ReferencePlayerStat>,
    snippets: Vec<KnowledgeSnippet>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a player known without adding any matches.
    pub fn register_player(&mut self, player_id: PlayerId) {
        self.players.entry(player_id).or_default();
    }

    /// Add a match, registering its player if needed.
    pub fn add_match(&mut self, record: MatchRecord) {
        self.players
            .entry(record.player_id.clone())
            .or_default()
            .push(record);
    }

    pub fn add_reference_stat(&mut self, stat: ReferencePlayerStat) {
        self.reference.push(stat);
    }

    pub fn add_snippet(&mut self, snippet: KnowledgeSnippet) {
        self.snippets.push(snippet);
    }

    pub fn with_match(mut self, record: MatchRecord) -> Self {
        self.add_match(record);
        self
    }

    pub fn with_reference_stat(mut self, stat: ReferencePlayerStat) -> Self {
        self.add_reference_stat(stat);
        self
    }

    pub fn with_snippet(mut self, snippet: KnowledgeSnippet) -> Self {
        self.add_snippet(snippet);
        self
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}

impl MatchSource for InMemoryStore {
    fn get_matches(
        &self,
        player_id: &PlayerId,
        filter: &MatchFilter,
    ) -> Result<Vec<MatchRecord>, StoreError> {
        let records = self
            .players
            .get(player_id)
            .ok_or_else(|| StoreError::NotFound(player_id.clone()))?;
        Ok(filter.apply(records.iter().cloned()))
    }
}

impl ReferenceSource for InMemoryStore {
    fn get_reference_stats(
        &self,
        role: Role,
        champion: Option<&str>,
    ) -> Result<Vec<ReferencePlayerStat>, StoreError> {
        Ok(select_reference_stats(&self.reference, role, champion))
    }
}

impl SnippetSource for InMemoryStore {
    fn search_snippets(&self, query_terms: &[String]) -> Result<Vec<KnowledgeSnippet>, StoreError> {
        Ok(rank_snippets(&self.snippets, query_terms))
    }
}
