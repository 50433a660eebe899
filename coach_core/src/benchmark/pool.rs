//! Champion pool and build summaries over a match history.

use match_data::{MatchRecord, Outcome};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChampionSummary {
    pub champion: String,
    pub games: usize,
    pub wins: usize,
    pub win_rate: f64,
}

/// Champions played at least `min_games` times, most played first.
///
/// Remakes are not games. Ties on games go to the higher win rate, then to
/// the champion name.
pub fn champion_pool(matches: &[MatchRecord], min_games: usize) -> Vec<ChampionSummary> {
    let mut tally: BTreeMap<String, (String, usize, usize)> = BTreeMap::new();
    for record in matches.iter().filter(|m| m.outcome != Outcome::Remake) {
        let entry = tally
            .entry(record.champion.to_lowercase())
            .or_insert_with(|| (record.champion.clone(), 0, 0));
        entry.1 += 1;
        if record.is_win() {
            entry.2 += 1;
        }
    }

    let mut pool: Vec<ChampionSummary> = tally
        .into_values()
        .filter(|(_, games, _)| *games >= min_games.max(1))
        .map(|(champion, games, wins)| ChampionSummary {
            champion,
            games,
            wins,
            win_rate: wins as f64 / games as f64,
        })
        .collect();

    pool.sort_by(|a, b| {
        b.games
            .cmp(&a.games)
            .then(b.win_rate.partial_cmp(&a.win_rate).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| a.champion.cmp(&b.champion))
    });
    pool
}

/// How often an item appears in final builds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemFrequency {
    pub item_id: u32,
    pub games: usize,
    /// Share of the analysed games carrying the item, 0 - 1.
    pub popularity: f64,
}

/// Most common final-build items on a champion. Item id 0 is an empty slot.
pub fn common_items(matches: &[MatchRecord], champion: &str, top_n: usize) -> Vec<ItemFrequency> {
    let games: Vec<&MatchRecord> = matches
        .iter()
        .filter(|m| m.champion.eq_ignore_ascii_case(champion))
        .collect();
    if games.is_empty() {
        return Vec::new();
    }

    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for record in &games {
        let mut seen: Vec<u32> = record.items.iter().copied().filter(|id| *id != 0).collect();
        seen.sort_unstable();
        seen.dedup();
        for id in seen {
            *counts.entry(id).or_default() += 1;
        }
    }

    let mut items: Vec<ItemFrequency> = counts
        .into_iter()
        .map(|(item_id, count)| ItemFrequency {
            item_id,
            games: count,
            popularity: count as f64 / games.len() as f64,
        })
        .collect();
    items.sort_by(|a, b| b.games.cmp(&a.games).then(a.item_id.cmp(&b.item_id)));
    items.truncate(top_n);
    items
}
