//! Record Store - typed, read-only access to persisted match, reference and
//! knowledge data.
//!
//! The store is split into three capabilities so each data source can be
//! injected and swapped independently:
//! - **MatchSource**: the tracked player's match history
//! - **ReferenceSource**: the comparison population's distributions
//! - **SnippetSource**: the general-knowledge corpus
//!
//! Any type providing all three is a [`RecordStore`]. Writes belong to the
//! ingestion collaborator, never to this crate.

mod json_dir;
mod memory;

pub use json_dir::*;
pub use memory::*;

use match_data::{KnowledgeSnippet, MatchRecord, PlayerId, ReferencePlayerStat, Role};
use std::collections::BTreeSet;

use crate::error::StoreError;
use crate::text;

/// Narrowing applied to a player's match history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchFilter {
    /// Only matches on this champion (case-insensitive).
    pub champion: Option<String>,
    pub role: Option<Role>,
    /// Only matches started at or after this unix time.
    pub since: Option<u64>,
    /// Keep at most this many of the most recent matches.
    pub limit: Option<usize>,
}

impl MatchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn champion(mut self, champion: impl Into<String>) -> Self {
        self.champion = Some(champion.into());
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn since(mut self, since: u64) -> Self {
        self.since = Some(since);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check a single record against the filter (ignores `limit`).
    pub fn accepts(&self, record: &MatchRecord) -> bool {
        if let Some(champion) = &self.champion {
            if !record.champion.eq_ignore_ascii_case(champion) {
                return false;
            }
        }
        if let Some(role) = self.role {
            if record.role != role {
                return false;
            }
        }
        if let Some(since) = self.since {
            if record.started_at < since {
                return false;
            }
        }
        true
    }

    /// Filter and order records by start time, most recent first.
    ///
    /// Ties on start time are broken by match id (descending) so the order
    /// never depends on storage order.
    pub fn apply<I>(&self, records: I) -> Vec<MatchRecord>
    where
        I: IntoIterator<Item = MatchRecord>,
    {
        let mut selected: Vec<MatchRecord> =
            records.into_iter().filter(|r| self.accepts(r)).collect();
        selected.sort_by(|a, b| {
            b.started_at
                .cmp(&a.started_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
    }
}

/// Source of the tracked player's match history.
pub trait MatchSource {
    /// Matches ordered by start time, most recent first.
    ///
    /// Fails with [`StoreError::NotFound`] only for an unknown player; a known
    /// player without matches yields an empty vector.
    fn get_matches(
        &self,
        player_id: &PlayerId,
        filter: &MatchFilter,
    ) -> Result<Vec<MatchRecord>, StoreError>;
}

/// Source of reference population distributions.
pub trait ReferenceSource {
    /// Role-wide entries for `role`, plus the champion-specific entries when a
    /// champion is given.
    fn get_reference_stats(
        &self,
        role: Role,
        champion: Option<&str>,
    ) -> Result<Vec<ReferencePlayerStat>, StoreError>;
}

/// Source of general-knowledge snippets.
pub trait SnippetSource {
    /// Snippets matching any of the terms, best match first.
    fn search_snippets(&self, query_terms: &[String]) -> Result<Vec<KnowledgeSnippet>, StoreError>;
}

/// Full read interface consumed by the core.
pub trait RecordStore: MatchSource + ReferenceSource + SnippetSource {}

impl<T: MatchSource + ReferenceSource + SnippetSource> RecordStore for T {}

/// Combine three independently injected sources into one [`RecordStore`].
#[derive(Debug, Clone)]
pub struct Sources<M, R, S> {
    pub matches: M,
    pub reference: R,
    pub snippets: S,
}

impl<M, R, S> Sources<M, R, S> {
    pub fn new(matches: M, reference: R, snippets: S) -> Self {
        Self {
            matches,
            reference,
            snippets,
        }
    }
}

impl<M: MatchSource, R, S> MatchSource for Sources<M, R, S> {
    fn get_matches(
        &self,
        player_id: &PlayerId,
        filter: &MatchFilter,
    ) -> Result<Vec<MatchRecord>, StoreError> {
        self.matches.get_matches(player_id, filter)
    }
}

impl<M, R: ReferenceSource, S> ReferenceSource for Sources<M, R, S> {
    fn get_reference_stats(
        &self,
        role: Role,
        champion: Option<&str>,
    ) -> Result<Vec<ReferencePlayerStat>, StoreError> {
        self.reference.get_reference_stats(role, champion)
    }
}

impl<M, R, S: SnippetSource> SnippetSource for Sources<M, R, S> {
    fn search_snippets(&self, query_terms: &[String]) -> Result<Vec<KnowledgeSnippet>, StoreError> {
        self.snippets.search_snippets(query_terms)
    }
}

/// Pick the reference entries relevant to a role and optional champion.
pub(crate) fn select_reference_stats<'a, I>(
    stats: I,
    role: Role,
    champion: Option<&str>,
) -> Vec<ReferencePlayerStat>
where
    I: IntoIterator<Item = &'a ReferencePlayerStat>,
{
    stats
        .into_iter()
        .filter(|s| s.role == role)
        .filter(|s| match (&s.champion, champion) {
            (None, _) => true,
            (Some(_), Some(wanted)) => s.is_for_champion(wanted),
            (Some(_), None) => false,
        })
        .cloned()
        .collect()
}

/// Rank snippets by the number of distinct query terms they mention.
///
/// Snippets matching no term are dropped. Ties go to the newer snippet, then
/// to the smaller id.
pub fn rank_snippets<'a, I>(candidates: I, query_terms: &[String]) -> Vec<KnowledgeSnippet>
where
    I: IntoIterator<Item = &'a KnowledgeSnippet>,
{
    let query = text::normalize_terms(query_terms);
    if query.is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<(usize, &KnowledgeSnippet)> = candidates
        .into_iter()
        .filter_map(|snippet| {
            let mut vocabulary: BTreeSet<String> = text::terms(&snippet.title);
            vocabulary.extend(text::terms(&snippet.text));
            vocabulary.extend(snippet.keywords.iter().flat_map(|k| text::terms(k)));
            let count = query.iter().filter(|t| vocabulary.contains(*t)).count();
            (count > 0).then_some((count, snippet))
        })
        .collect();

    hits.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| b.1.published_at.cmp(&a.1.published_at))
            .then_with(|| a.1.id.cmp(&b.1.id))
    });

    hits.into_iter().map(|(_, s)| s.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use match_data::{MatchId, Outcome};

    fn record(id: &str, champion: &str, started_at: u64) -> MatchRecord {
        MatchRecord::new(
            MatchId::new(id),
            PlayerId::new("p1"),
            Role::Support,
            champion,
            Outcome::Win,
            started_at,
        )
    }

    #[test]
    fn test_filter_orders_most_recent_first() {
        let records = vec![
            record("A", "Thresh", 100),
            record("B", "Lulu", 300),
            record("C", "Thresh", 200),
        ];
        let ordered = MatchFilter::new().apply(records);
        let ids: Vec<_> = ordered.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_filter_champion_since_and_limit() {
        let records = vec![
            record("A", "Thresh", 100),
            record("B", "Lulu", 300),
            record("C", "thresh", 200),
            record("D", "Thresh", 400),
        ];
        let filter = MatchFilter::new().champion("THRESH").since(150).limit(1);
        let ordered = filter.apply(records);
        assert_eq!(ordered.len(), 1);
        assert_eq!(ordered[0].id.as_str(), "D");
    }

    #[test]
    fn test_rank_snippets_by_hits_then_recency() {
        let old = KnowledgeSnippet::new("Dragon setup", "Ward the river before dragon spawns.")
            .with_published_at(1);
        let new = KnowledgeSnippet::new("Dragon", "Group for dragon.").with_published_at(5);
        let unrelated = KnowledgeSnippet::new("Baron", "Baron buff pushes waves.");

        let query = ["dragon".to_string(), "river ward".to_string()];
        let ranked = rank_snippets([&old, &new, &unrelated], &query);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].id, old.id);
        assert_eq!(ranked[1].id, new.id);
    }

    #[test]
    fn test_rank_snippets_empty_query() {
        let snippet = KnowledgeSnippet::new("Dragon", "Group for dragon.");
        assert!(rank_snippets([&snippet], &[]).is_empty());
    }

    #[test]
    fn test_select_reference_stats() {
        let role_wide =
            ReferencePlayerStat::from_samples(Role::Support, None, "deaths", &[1.0, 2.0], &[50.0])
                .unwrap();
        let thresh = ReferencePlayerStat::from_samples(
            Role::Support,
            Some("Thresh".to_string()),
            "deaths",
            &[3.0],
            &[50.0],
        )
        .unwrap();
        let jungle =
            ReferencePlayerStat::from_samples(Role::Jungle, None, "deaths", &[1.0], &[50.0])
                .unwrap();
        let all = vec![role_wide, thresh, jungle];

        assert_eq!(select_reference_stats(&all, Role::Support, None).len(), 1);
        assert_eq!(select_reference_stats(&all, Role::Support, Some("thresh")).len(), 2);
        assert_eq!(select_reference_stats(&all, Role::Support, Some("Lulu")).len(), 1);
    }
}
