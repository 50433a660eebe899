//! Fact statements derived from match history and analytics findings.

use match_data::{
    EventKind, MapBounds, MapRegion, MatchId, MatchRecord, Role, Side, EARLY_GAME_END_MS,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::benchmark::{
    champion_pool, metric_label, BenchmarkResult, PlaystyleReport, ReferenceScope,
};
use crate::spatial::SpatialAggregate;
use crate::text;

/// What a fact statement describes. Mandatory kinds are reserved first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactKind {
    Role,
    ChampionPool,
    /// Outcome of the most recent match in the history.
    CurrentOutcome,
    CurrentStats,
    /// An older match; `age` 1 is the match before the current one.
    MatchDetail { age: usize },
    NoRecentMatches,
    Benchmark,
    Playstyle,
    HotSpot,
    /// Where the player stood when a dragon or baron was taken.
    ObjectiveProximity,
    /// Deaths and takedowns before the end of the laning phase.
    LaningPhase,
    CriticalMoment,
}

/// Payload section a fact belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactSection {
    Player,
    Benchmarks,
    Playstyle,
    Spatial,
    Laning,
    CriticalMoments,
    Snippets,
}

impl FactSection {
    pub fn label(&self) -> &'static str {
        match self {
            FactSection::Player => "player",
            FactSection::Benchmarks => "benchmarks",
            FactSection::Playstyle => "playstyle",
            FactSection::Spatial => "spatial",
            FactSection::Laning => "laning phase",
            FactSection::CriticalMoments => "critical moments",
            FactSection::Snippets => "snippets",
        }
    }
}

impl FactKind {
    pub fn section(&self) -> FactSection {
        match self {
            FactKind::Role
            | FactKind::ChampionPool
            | FactKind::CurrentOutcome
            | FactKind::CurrentStats
            | FactKind::MatchDetail { .. }
            | FactKind::NoRecentMatches => FactSection::Player,
            FactKind::Benchmark => FactSection::Benchmarks,
            FactKind::Playstyle => FactSection::Playstyle,
            FactKind::HotSpot | FactKind::ObjectiveProximity => FactSection::Spatial,
            FactKind::LaningPhase => FactSection::Laning,
            FactKind::CriticalMoment => FactSection::CriticalMoments,
        }
    }

    pub fn is_mandatory(&self) -> bool {
        self.section() == FactSection::Player
    }

    /// Facts that survive any truncation.
    pub fn is_never_dropped(&self) -> bool {
        matches!(
            self,
            FactKind::Role | FactKind::CurrentOutcome | FactKind::NoRecentMatches
        )
    }
}

/// A short statement copied into the payload by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactStatement {
    pub kind: FactKind,
    pub text: String,
    /// Terms fed into the snippet query signal.
    pub keywords: BTreeSet<String>,
}

impl FactStatement {
    pub fn new(kind: FactKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            keywords: BTreeSet::new(),
        }
    }

    /// Add keyword terms, normalised like query text.
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for keyword in keywords {
            self.keywords.extend(text::terms(keyword.as_ref()));
        }
        self
    }

    /// Budget cost in bytes.
    pub fn size(&self) -> usize {
        self.text.len()
    }

    pub fn section(&self) -> FactSection {
        self.kind.section()
    }
}

fn format_clock(timestamp_ms: u64) -> String {
    let secs = timestamp_ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

fn stat_line(record: &MatchRecord) -> String {
    let s = &record.stats;
    format!(
        "{}/{}/{} (KDA {:.2}), vision score {:.1}, kill participation {:.0}%, \
         {} wards placed, {} gold, {} damage, duration {}",
        s.kills,
        s.deaths,
        s.assists,
        s.kda(),
        s.vision_score,
        s.kill_participation * 100.0,
        s.wards_placed,
        s.gold,
        s.damage,
        format_clock(s.duration_secs as u64 * 1000),
    )
}

/// Always-included player facts, in payload order.
///
/// `matches` must be most recent first. With no matches only the role and
/// an explicit "no recent matches" statement are produced.
pub fn mandatory_facts(
    role: Role,
    matches: &[MatchRecord],
    pool_size: usize,
    match_details: usize,
) -> Vec<FactStatement> {
    let role_fact = FactStatement::new(FactKind::Role, format!("Role: {}.", role))
        .with_keywords([role.label()]);
    let mut facts = vec![role_fact];

    let Some(current) = matches.first() else {
        facts.push(FactStatement::new(
            FactKind::NoRecentMatches,
            "No recent matches are recorded for this player.",
        ));
        return facts;
    };

    let pool = champion_pool(matches, 1);
    if !pool.is_empty() && pool_size > 0 {
        let entries: Vec<String> = pool
            .iter()
            .take(pool_size)
            .map(|c| {
                format!(
                    "{} ({} games, {:.0}% win rate)",
                    c.champion,
                    c.games,
                    c.win_rate * 100.0
                )
            })
            .collect();
        let text = format!("Champion pool: {}.", entries.join(", "));
        facts.push(
            FactStatement::new(FactKind::ChampionPool, text)
                .with_keywords(pool.iter().take(pool_size).map(|c| c.champion.as_str())),
        );
    }

    facts.push(
        FactStatement::new(
            FactKind::CurrentOutcome,
            format!(
                "Most recent match {}: {} on {}.",
                current.id,
                current.outcome.label(),
                current.champion
            ),
        )
        .with_keywords([current.champion.as_str()]),
    );
    facts.push(FactStatement::new(
        FactKind::CurrentStats,
        format!("Most recent match stats: {}.", stat_line(current)),
    ));

    for (age, record) in matches.iter().enumerate().skip(1).take(match_details) {
        facts.push(
            FactStatement::new(
                FactKind::MatchDetail { age },
                format!(
                    "Match {} ({} before the most recent): {} on {}, {}/{}/{}, vision score {:.1}.",
                    record.id,
                    age,
                    record.outcome.label(),
                    record.champion,
                    record.stats.kills,
                    record.stats.deaths,
                    record.stats.assists,
                    record.stats.vision_score
                ),
            )
            .with_keywords([record.champion.as_str()]),
        );
    }

    facts
}

/// One statement per successful benchmark.
pub fn benchmark_facts(results: &[BenchmarkResult]) -> Vec<FactStatement> {
    results
        .iter()
        .map(|r| {
            let reference = match &r.scope {
                ReferenceScope::Champion(champion) => format!("{} reference", champion),
                ReferenceScope::RoleWide => format!("{} reference", r.role),
            };
            FactStatement::new(
                FactKind::Benchmark,
                format!(
                    "{} {}: {:.2} vs {} mean {:.2} \
                     ({:.0}th percentile, {:+.1} sd over {} matches).",
                    r.aggregate.label(),
                    metric_label(&r.metric),
                    r.player_value,
                    reference,
                    r.reference_mean,
                    r.percentile,
                    r.normalized_delta,
                    r.matches_used
                ),
            )
            .with_keywords([metric_label(&r.metric)])
        })
        .collect()
}

pub fn playstyle_fact(report: &PlaystyleReport) -> FactStatement {
    FactStatement::new(
        FactKind::Playstyle,
        format!("Playstyle: {}. {}", report.playstyle, report.evidence.join(" ")),
    )
    .with_keywords([report.playstyle.label()])
}

/// Statements naming the densest cells of an aggregate by map region.
pub fn hot_spot_facts(
    aggregate: &SpatialAggregate,
    bounds: &MapBounds,
    per_kind: usize,
) -> Vec<FactStatement> {
    let total = aggregate.grid.total();
    if total == 0 {
        return Vec::new();
    }
    let noun = match aggregate.kind {
        EventKind::Death => "deaths",
        EventKind::Kill => "kills",
        EventKind::Assist => "assists",
        EventKind::Ping => "pings",
        EventKind::PositionSample => "position samples",
        EventKind::WardPlaced => "wards",
    };

    aggregate
        .grid
        .hottest(per_kind)
        .into_iter()
        .map(|(cell, count)| {
            let center = aggregate.grid.cell_center(cell);
            let region = MapRegion::classify(center, bounds);
            FactStatement::new(
                FactKind::HotSpot,
                format!(
                    "{} of {} {} happened in the {} around ({}, {}).",
                    count, total, noun, region, center.x, center.y
                ),
            )
            .with_keywords([noun, region.label()])
        })
        .collect()
}

/// Closer than this to an objective counts as present.
pub const OBJECTIVE_PRESENT_DISTANCE: f64 = 3_000.0;
/// Farther than this from an objective counts as the opposite side of the map.
pub const OBJECTIVE_FAR_DISTANCE: f64 = 8_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectivePresence {
    Present,
    Nearby,
    FarSide,
}

impl ObjectivePresence {
    pub fn from_distance(distance: f64) -> Self {
        if distance < OBJECTIVE_PRESENT_DISTANCE {
            ObjectivePresence::Present
        } else if distance > OBJECTIVE_FAR_DISTANCE {
            ObjectivePresence::FarSide
        } else {
            ObjectivePresence::Nearby
        }
    }

    pub fn sentence(&self) -> &'static str {
        match self {
            ObjectivePresence::Present => "The player was at the objective.",
            ObjectivePresence::Nearby => "The player was nearby but not at the objective.",
            ObjectivePresence::FarSide => "The player was on the opposite side of the map.",
        }
    }
}

/// The player's position relative to one dragon or baron take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveProximity {
    pub match_id: MatchId,
    pub objective: String,
    pub objective_ms: u64,
    pub taken_by: Side,
    /// Map units between the objective and the nearest-in-time position sample.
    pub distance: f64,
    pub presence: ObjectivePresence,
}

fn is_epic_monster(objective: &str) -> bool {
    objective.contains("DRAGON") || objective.contains("BARON_NASHOR")
}

/// Dragon and baron takes by either side, paired with the position sample
/// closest in time. Takes without a location, or in matches without
/// position samples, are skipped. Match order, then by time.
pub fn objective_proximity(matches: &[MatchRecord]) -> Vec<ObjectiveProximity> {
    let mut found = Vec::new();
    for record in matches {
        let mut samples: Vec<_> = record.events_of(EventKind::PositionSample).collect();
        if samples.is_empty() {
            continue;
        }
        samples.sort_by_key(|e| e.timestamp_ms);

        let mut takes: Vec<_> = record
            .objectives
            .iter()
            .filter(|o| is_epic_monster(&o.objective))
            .filter_map(|o| o.point.map(|point| (o, point)))
            .collect();
        takes.sort_by_key(|(o, _)| o.timestamp_ms);

        for (objective, point) in takes {
            let Some(nearest) = samples
                .iter()
                .min_by_key(|e| e.timestamp_ms.abs_diff(objective.timestamp_ms))
            else {
                continue;
            };
            let distance = nearest.point.distance_to(&point);
            found.push(ObjectiveProximity {
                match_id: record.id.clone(),
                objective: objective.display_name(),
                objective_ms: objective.timestamp_ms,
                taken_by: objective.taken_by,
                distance,
                presence: ObjectivePresence::from_distance(distance),
            });
        }
    }
    found
}

pub fn objective_proximity_facts(found: &[ObjectiveProximity], limit: usize) -> Vec<FactStatement> {
    found
        .iter()
        .take(limit)
        .map(|p| {
            let team = match p.taken_by {
                Side::Ally => "allied",
                Side::Enemy => "enemy",
            };
            FactStatement::new(
                FactKind::ObjectiveProximity,
                format!(
                    "In match {} at {} the {} team took {}. {}",
                    p.match_id,
                    format_clock(p.objective_ms),
                    team,
                    p.objective,
                    p.presence.sentence()
                ),
            )
            .with_keywords([p.objective.as_str(), "objective"])
        })
        .collect()
}

/// Laning-phase activity of one match, from its positional events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaningSummary {
    pub match_id: MatchId,
    pub deaths: u32,
    pub takedowns: u32,
}

/// Deaths and takedowns at or before the end of the early game. Matches
/// without positional events carry no timeline and are skipped.
pub fn laning_phase(matches: &[MatchRecord]) -> Vec<LaningSummary> {
    matches
        .iter()
        .filter(|record| !record.events.is_empty())
        .map(|record| {
            let early = || record.events.iter().filter(|e| e.timestamp_ms <= EARLY_GAME_END_MS);
            LaningSummary {
                match_id: record.id.clone(),
                deaths: early().filter(|e| e.kind == EventKind::Death).count() as u32,
                takedowns: early().filter(|e| e.kind.is_takedown()).count() as u32,
            }
        })
        .collect()
}

/// One statement covering the most recent match and the average over all
/// summaries. `summaries` must be most recent first.
pub fn laning_phase_fact(summaries: &[LaningSummary]) -> Option<FactStatement> {
    let current = summaries.first()?;
    let n = summaries.len() as f64;
    let avg_deaths = summaries.iter().map(|s| s.deaths as f64).sum::<f64>() / n;
    let avg_takedowns = summaries.iter().map(|s| s.takedowns as f64).sum::<f64>() / n;
    Some(
        FactStatement::new(
            FactKind::LaningPhase,
            format!(
                "Before {} the player died {} times with {} takedowns in match {}, \
                 averaging {:.1} deaths and {:.1} takedowns over {} matches.",
                format_clock(EARLY_GAME_END_MS),
                current.deaths,
                current.takedowns,
                current.match_id,
                avg_deaths,
                avg_takedowns,
                summaries.len()
            ),
        )
        .with_keywords(["laning", "lane", "early"]),
    )
}

/// A death followed closely by an enemy objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalMoment {
    pub match_id: MatchId,
    pub death_ms: u64,
    pub objective: String,
    pub objective_ms: u64,
}

impl CriticalMoment {
    pub fn delay_ms(&self) -> u64 {
        self.objective_ms - self.death_ms
    }
}

/// Deaths followed within `window_ms` by an enemy objective, in match order
/// and then by time. Each death pairs with the first objective taken
/// strictly after it.
pub fn critical_moments(matches: &[MatchRecord], window_ms: u64) -> Vec<CriticalMoment> {
    let mut moments = Vec::new();
    for record in matches {
        let mut enemy: Vec<_> = record
            .objectives
            .iter()
            .filter(|o| o.taken_by == Side::Enemy)
            .collect();
        enemy.sort_by_key(|o| o.timestamp_ms);

        let mut deaths: Vec<u64> =
            record.events_of(EventKind::Death).map(|e| e.timestamp_ms).collect();
        deaths.sort_unstable();

        for death_ms in deaths {
            let follow_up = enemy
                .iter()
                .find(|o| o.timestamp_ms > death_ms && o.timestamp_ms - death_ms <= window_ms);
            if let Some(objective) = follow_up {
                moments.push(CriticalMoment {
                    match_id: record.id.clone(),
                    death_ms,
                    objective: objective.display_name(),
                    objective_ms: objective.timestamp_ms,
                });
            }
        }
    }
    moments
}

pub fn critical_moment_facts(moments: &[CriticalMoment], limit: usize) -> Vec<FactStatement> {
    moments
        .iter()
        .take(limit)
        .map(|m| {
            let phase = if m.death_ms <= EARLY_GAME_END_MS { "early game" } else { "later game" };
            FactStatement::new(
                FactKind::CriticalMoment,
                format!(
                    "In match {} the player died at {} and the enemy took {} {}s later ({}).",
                    m.match_id,
                    format_clock(m.death_ms),
                    m.objective,
                    m.delay_ms() / 1000,
                    phase
                ),
            )
            .with_keywords([m.objective.as_str(), "death", "objective"])
        })
        .collect()
}
