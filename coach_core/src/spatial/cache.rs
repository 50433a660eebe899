//! Explicit cache of expensive aggregates.
//!
//! Entries are keyed by player, match-set hash, the aggregator's grid
//! settings and event kind. New-match ingestion for a player must call
//! [`AggregateCache::invalidate_player`].

use match_data::{EventKind, MapBounds, MatchRecord, PlayerId};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use super::{SpatialAggregate, SpatialAggregator};

/// Cache key for one aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggregateKey {
    pub player_id: PlayerId,
    pub match_set: u64,
    pub cell_size: u32,
    pub path_gap_ms: u64,
    pub bounds: MapBounds,
    pub kind: EventKind,
}

impl AggregateKey {
    pub fn new(
        player_id: &PlayerId,
        matches: &[MatchRecord],
        aggregator: &SpatialAggregator,
        kind: EventKind,
    ) -> Self {
        let config = aggregator.config();
        Self {
            player_id: player_id.clone(),
            match_set: match_set_hash(matches),
            cell_size: config.cell_size,
            path_gap_ms: config.path_gap_ms,
            bounds: config.bounds,
            kind,
        }
    }
}

/// Order-independent hash of the ids in a match set. Repeated ids count,
/// since aggregation counts every occurrence.
pub fn match_set_hash(matches: &[MatchRecord]) -> u64 {
    let mut ids: Vec<&str> = matches.iter().map(|m| m.id.as_str()).collect();
    ids.sort_unstable();

    let mut hasher = DefaultHasher::new();
    ids.hash(&mut hasher);
    hasher.finish()
}

/// Memoises aggregates per key.
#[derive(Debug, Default)]
pub struct AggregateCache {
    entries: HashMap<AggregateKey, SpatialAggregate>,
    hits: u64,
    misses: u64,
}

impl AggregateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached aggregate or compute and store it.
    pub fn get_or_compute(
        &mut self,
        player_id: &PlayerId,
        matches: &[MatchRecord],
        aggregator: &SpatialAggregator,
        kind: EventKind,
    ) -> &SpatialAggregate {
        let key = AggregateKey::new(player_id, matches, aggregator, kind);
        if self.entries.contains_key(&key) {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        self.entries
            .entry(key)
            .or_insert_with(|| aggregator.aggregate(matches, kind))
    }

    /// Drop every entry for a player. Returns the number of entries removed.
    pub fn invalidate_player(&mut self, player_id: &PlayerId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| &key.player_id != player_id);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::SpatialConfig;
    use match_data::{MapPoint, MatchId, Outcome, Role};

    fn record(id: &str) -> MatchRecord {
        MatchRecord::new(
            MatchId::new(id),
            PlayerId::new("p1"),
            Role::Support,
            "Janna",
            Outcome::Win,
            0,
        )
        .with_event(0, MapPoint::new(100, 100), EventKind::Kill)
    }

    #[test]
    fn test_match_set_hash_ignores_order() {
        let a = vec![record("A"), record("B")];
        let b = vec![record("B"), record("A")];
        assert_eq!(match_set_hash(&a), match_set_hash(&b));
        assert_ne!(match_set_hash(&a), match_set_hash(&a[..1]));

        let repeated = vec![record("A"), record("A")];
        assert_ne!(match_set_hash(&repeated), match_set_hash(&repeated[..1]));
    }

    #[test]
    fn test_cache_separates_bounds() {
        let player = PlayerId::new("p1");
        let matches = vec![MatchRecord::new(
            MatchId::new("A"),
            player.clone(),
            Role::Support,
            "Janna",
            Outcome::Win,
            0,
        )
        .with_event(0, MapPoint::new(12_000, 12_000), EventKind::Kill)];
        let full_map = SpatialAggregator::with_defaults();
        let small_map = SpatialAggregator::new(SpatialConfig {
            bounds: MapBounds::new(0, 0, 10_000, 10_000),
            ..SpatialConfig::default()
        });
        let mut cache = AggregateCache::new();

        let full = cache.get_or_compute(&player, &matches, &full_map, EventKind::Kill);
        assert_eq!(full.grid.total(), 1);
        let small = cache.get_or_compute(&player, &matches, &small_map, EventKind::Kill);
        assert_eq!(small.grid.total(), 0);
        assert_eq!(small.diagnostics.out_of_bounds_events, 1);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_cache_hits_and_invalidation() {
        let player = PlayerId::new("p1");
        let other = PlayerId::new("p2");
        let matches = vec![record("A"), record("B")];
        let aggregator = SpatialAggregator::with_defaults();
        let mut cache = AggregateCache::new();

        let first = cache.get_or_compute(&player, &matches, &aggregator, EventKind::Kill);
        assert_eq!(first.grid.total(), 2);
        cache.get_or_compute(&player, &matches, &aggregator, EventKind::Kill);
        cache.get_or_compute(&player, &matches, &aggregator, EventKind::Death);
        cache.get_or_compute(&other, &matches, &aggregator, EventKind::Kill);

        assert_eq!(cache.stats(), (1, 3));
        assert_eq!(cache.len(), 3);

        assert_eq!(cache.invalidate_player(&player), 2);
        assert_eq!(cache.len(), 1);
    }
}
