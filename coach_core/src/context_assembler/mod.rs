//! Context Assembler - builds the bounded context payload for advice
//! generation.
//!
//! The assembly works as follows:
//! 1. **Retrieve**: the player's recent matches and the reference data
//! 2. **Derive**: mandatory player facts, then benchmark, playstyle, spatial,
//!    laning-phase and critical-moment findings
//! 3. **Query**: question terms plus fact keywords form the query signal
//! 4. **Rank**: candidate snippets by relevance, ties by recency then id
//! 5. **Budget**: reserve mandatory facts, add findings that fit, then add
//!    snippets until the first one that does not fit

mod budget;
mod facts;
mod payload;
mod relevance;

pub use budget::*;
pub use facts::*;
pub use payload::*;
pub use relevance::*;

use match_data::{EventKind, KnowledgeSnippet, MatchRecord, PlayerId, ReferencePlayerStat, Role};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::benchmark::{infer_playstyle, BenchmarkEngine};
use crate::config::CoachConfig;
use crate::error::StoreError;
use crate::record_store::{MatchFilter, RecordStore};
use crate::spatial::SpatialAggregator;

/// Configuration for context assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Payload budget in bytes of statement and snippet text.
    pub budget: usize,

    /// Most recent matches retrieved per request.
    pub history_limit: usize,

    /// Older matches described after the current one.
    pub recent_match_details: usize,

    /// Champions named in the champion pool fact.
    pub champion_pool_size: usize,

    pub benchmark_metrics: Vec<String>,

    /// Compare against the requested champion's reference data when set.
    pub benchmark_by_champion: bool,

    pub include_playstyle: bool,

    /// Event kinds summarised as hot spots.
    pub heat_kinds: Vec<EventKind>,

    pub hot_spots_per_kind: usize,

    /// Dragon and baron takes described by the player's distance to them.
    pub max_objective_proximity: usize,

    pub include_laning_phase: bool,

    /// A death this close before an enemy objective is a critical moment.
    pub critical_window_ms: u64,

    pub max_critical_moments: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            budget: 4_000,
            history_limit: 20,
            recent_match_details: 3,
            champion_pool_size: 3,
            benchmark_metrics: vec![
                "vision_score".to_string(),
                "kill_participation".to_string(),
                "deaths".to_string(),
                "wards_placed".to_string(),
                "control_wards_placed".to_string(),
            ],
            benchmark_by_champion: true,
            include_playstyle: true,
            heat_kinds: vec![EventKind::Death, EventKind::WardPlaced],
            hot_spots_per_kind: 2,
            max_objective_proximity: 3,
            include_laning_phase: true,
            critical_window_ms: 60_000,
            max_critical_moments: 3,
        }
    }
}

/// What the caller wants context for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRequest {
    pub player_id: PlayerId,
    pub role: Role,
    /// Champion the question is about, if any.
    pub champion: Option<String>,
    pub question: String,
    pub query_embedding: Option<Vec<f32>>,
}

impl ContextRequest {
    pub fn new(player_id: PlayerId, role: Role, question: impl Into<String>) -> Self {
        Self {
            player_id,
            role,
            champion: None,
            question: question.into(),
            query_embedding: None,
        }
    }

    pub fn with_champion(mut self, champion: impl Into<String>) -> Self {
        self.champion = Some(champion.into());
        self
    }

    pub fn with_query_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.query_embedding = Some(embedding);
        self
    }
}

/// Facts derived before budgeting.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CollectedFacts {
    pub mandatory: Vec<FactStatement>,
    pub findings: Vec<FactStatement>,
    pub omitted: Vec<OmittedSection>,
}

impl CollectedFacts {
    fn omit(&mut self, section: FactSection, reason: impl Into<String>) {
        let reason = reason.into();
        debug!(section = section.label(), reason = %reason, "context section omitted");
        self.omitted.push(OmittedSection { section, reason });
    }

    pub fn all(&self) -> impl Iterator<Item = &FactStatement> {
        self.mandatory.iter().chain(self.findings.iter())
    }
}

/// Already-retrieved data for a pure assembly run.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyInputs<'a> {
    pub request: &'a ContextRequest,
    /// Most recent first.
    pub matches: &'a [MatchRecord],
    pub reference: &'a [ReferencePlayerStat],
    pub snippets: &'a [KnowledgeSnippet],
}

/// The context assembler builds payloads from store data.
pub struct ContextAssembler {
    config: ContextConfig,
    spatial: SpatialAggregator,
    benchmark: BenchmarkEngine,
    scorer: Box<dyn RelevanceScorer>,
}

impl ContextAssembler {
    /// Create a new assembler with the given configuration and default
    /// analytics engines.
    pub fn new(config: ContextConfig) -> Self {
        Self {
            config,
            spatial: SpatialAggregator::with_defaults(),
            benchmark: BenchmarkEngine::with_defaults(),
            scorer: Box::new(OverlapScorer::default()),
        }
    }

    /// Create an assembler with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ContextConfig::default())
    }

    /// Create an assembler wired from a full configuration.
    pub fn from_config(config: &CoachConfig) -> Self {
        Self::new(config.context.clone())
            .with_spatial(SpatialAggregator::new(config.spatial.clone()))
            .with_benchmark(BenchmarkEngine::new(config.benchmark.clone()))
    }

    pub fn with_spatial(mut self, spatial: SpatialAggregator) -> Self {
        self.spatial = spatial;
        self
    }

    pub fn with_benchmark(mut self, benchmark: BenchmarkEngine) -> Self {
        self.benchmark = benchmark;
        self
    }

    pub fn with_scorer(mut self, scorer: impl RelevanceScorer + 'static) -> Self {
        self.scorer = Box::new(scorer);
        self
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    fn reference_champion<'r>(&self, request: &'r ContextRequest) -> Option<&'r str> {
        request
            .champion
            .as_deref()
            .filter(|_| self.config.benchmark_by_champion)
    }

    /// Retrieve from the store and assemble.
    ///
    /// Fails only when the store does: an unknown player or an unavailable
    /// source. Missing optional data omits its section instead.
    pub fn assemble<S: RecordStore + ?Sized>(
        &self,
        request: &ContextRequest,
        store: &S,
    ) -> Result<ContextPayload, StoreError> {
        let filter = MatchFilter::new()
            .role(request.role)
            .limit(self.config.history_limit);
        let matches = store.get_matches(&request.player_id, &filter)?;
        let champion = self.reference_champion(request);
        let reference = store.get_reference_stats(request.role, champion)?;

        // The champion's own recent games, so older champion matches outside
        // the role history still count toward its benchmarks.
        let champion_matches = match champion {
            Some(champion) => {
                let filter = MatchFilter::new()
                    .role(request.role)
                    .champion(champion)
                    .limit(self.benchmark.config().window);
                Some(store.get_matches(&request.player_id, &filter)?)
            }
            None => None,
        };
        let benchmark_matches = champion_matches.as_deref().unwrap_or(matches.as_slice());

        let collected = self.collect_facts_with(request, &matches, benchmark_matches, &reference);
        let signal = self.query_signal(request, &collected);
        let snippets = store.search_snippets(&signal.query_terms())?;
        debug!(
            player = %request.player_id,
            matches = matches.len(),
            candidates = snippets.len(),
            "retrieved context inputs"
        );

        Ok(self.finish(request, collected, &signal, snippets))
    }

    /// Assemble from already-retrieved data. Deterministic.
    pub fn assemble_from(&self, inputs: AssemblyInputs<'_>) -> ContextPayload {
        let collected = self.collect_facts(inputs.request, inputs.matches, inputs.reference);
        let signal = self.query_signal(inputs.request, &collected);
        self.finish(inputs.request, collected, &signal, inputs.snippets.to_vec())
    }

    /// Derive mandatory facts and findings, recording omitted sections.
    pub fn collect_facts(
        &self,
        request: &ContextRequest,
        matches: &[MatchRecord],
        reference: &[ReferencePlayerStat],
    ) -> CollectedFacts {
        self.collect_facts_with(request, matches, matches, reference)
    }

    /// As [`collect_facts`](Self::collect_facts), benchmarking over a
    /// separate history.
    fn collect_facts_with(
        &self,
        request: &ContextRequest,
        matches: &[MatchRecord],
        benchmark_matches: &[MatchRecord],
        reference: &[ReferencePlayerStat],
    ) -> CollectedFacts {
        let mut collected = CollectedFacts {
            mandatory: mandatory_facts(
                request.role,
                matches,
                self.config.champion_pool_size,
                self.config.recent_match_details,
            ),
            ..CollectedFacts::default()
        };

        if matches.is_empty() {
            for section in [
                FactSection::Benchmarks,
                FactSection::Playstyle,
                FactSection::Spatial,
                FactSection::Laning,
                FactSection::CriticalMoments,
            ] {
                collected.omit(section, "no recent matches");
            }
            return collected;
        }

        self.collect_benchmarks(request, benchmark_matches, reference, &mut collected);
        self.collect_spatial(matches, &mut collected);
        self.collect_laning(matches, &mut collected);

        let moments = critical_moments(matches, self.config.critical_window_ms);
        if moments.is_empty() {
            collected.omit(
                FactSection::CriticalMoments,
                "no death was followed by an enemy objective",
            );
        } else {
            collected
                .findings
                .extend(critical_moment_facts(&moments, self.config.max_critical_moments));
        }

        collected
    }

    fn collect_benchmarks(
        &self,
        request: &ContextRequest,
        matches: &[MatchRecord],
        reference: &[ReferencePlayerStat],
        collected: &mut CollectedFacts,
    ) {
        let outcomes = self.benchmark.benchmark_all(
            matches,
            reference,
            request.role,
            self.reference_champion(request),
            self.config.benchmark_metrics.as_slice(),
        );

        let mut results = Vec::new();
        let mut first_error = None;
        for (metric, outcome) in outcomes {
            match outcome {
                Ok(result) => results.push(result),
                Err(err) => {
                    debug!(metric = %metric, error = %err, "metric not benchmarked");
                    first_error.get_or_insert_with(|| err.to_string());
                }
            }
        }

        if results.is_empty() {
            let reason =
                first_error.unwrap_or_else(|| "no benchmark metrics configured".to_string());
            collected.omit(FactSection::Benchmarks, reason);
        } else {
            collected.findings.extend(benchmark_facts(&results));
        }

        if !self.config.include_playstyle {
            return;
        }
        match infer_playstyle(&results) {
            Some(report) => collected.findings.push(playstyle_fact(&report)),
            None => collected.omit(FactSection::Playstyle, "vision score could not be benchmarked"),
        }
    }

    fn collect_spatial(&self, matches: &[MatchRecord], collected: &mut CollectedFacts) {
        let bounds = self.spatial.config().bounds;
        let mut spatial = Vec::new();
        for kind in &self.config.heat_kinds {
            let aggregate = self.spatial.aggregate(matches, *kind);
            spatial.extend(hot_spot_facts(&aggregate, &bounds, self.config.hot_spots_per_kind));
        }
        spatial.extend(objective_proximity_facts(
            &objective_proximity(matches),
            self.config.max_objective_proximity,
        ));

        if spatial.is_empty() {
            collected.omit(FactSection::Spatial, "no positional events of the requested kinds");
        } else {
            collected.findings.extend(spatial);
        }
    }

    fn collect_laning(&self, matches: &[MatchRecord], collected: &mut CollectedFacts) {
        if !self.config.include_laning_phase {
            return;
        }
        match laning_phase_fact(&laning_phase(matches)) {
            Some(fact) => collected.findings.push(fact),
            None => {
                collected.omit(FactSection::Laning, "no match timeline to split the laning phase")
            }
        }
    }

    pub fn query_signal(
        &self,
        request: &ContextRequest,
        collected: &CollectedFacts,
    ) -> QuerySignal {
        let facts: Vec<FactStatement> = collected.all().cloned().collect();
        let signal = QuerySignal::from_question(&request.question, &facts);
        match &request.query_embedding {
            Some(embedding) => signal.with_embedding(embedding.clone()),
            None => signal,
        }
    }

    fn finish(
        &self,
        request: &ContextRequest,
        collected: CollectedFacts,
        signal: &QuerySignal,
        candidates: Vec<KnowledgeSnippet>,
    ) -> ContextPayload {
        let CollectedFacts {
            mandatory,
            findings,
            mut omitted,
        } = collected;
        let mut budget = Budget::new(self.config.budget);

        let reservation = reserve_mandatory(mandatory, &mut budget);
        if reservation.over_budget {
            warn!(
                player = %request.player_id,
                budget = budget.limit(),
                used = budget.used(),
                "mandatory facts exceed the context budget"
            );
        } else if !reservation.dropped.is_empty() {
            debug!(dropped = reservation.dropped.len(), "truncated mandatory facts");
        }

        let (findings, skipped_findings) = include_findings(findings, &mut budget);

        let ranked = rank_by_relevance(signal, candidates, self.scorer.as_ref());
        if ranked.is_empty() {
            omitted.push(OmittedSection {
                section: FactSection::Snippets,
                reason: "no relevant snippets".to_string(),
            });
        }
        let selection = select_snippets(ranked, &mut budget);
        if selection.included.is_empty() && selection.excluded > 0 {
            omitted.push(OmittedSection {
                section: FactSection::Snippets,
                reason: "no snippet fits in the remaining budget".to_string(),
            });
        }

        let mut facts = reservation.kept;
        facts.extend(findings);

        ContextPayload {
            player_id: request.player_id.clone(),
            role: request.role,
            question: request.question.clone(),
            facts,
            snippets: selection.included,
            budget: budget.limit(),
            used: budget.used(),
            omitted_sections: omitted,
            truncation: TruncationReport {
                dropped_mandatory: reservation.dropped,
                skipped_findings,
                excluded_snippets: selection.excluded,
                over_budget: reservation.over_budget,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record_store::{InMemoryStore, MatchSource, ReferenceSource, SnippetSource};
    use match_data::{MapPoint, MatchId, MatchStats, ObjectiveEvent, Outcome, Side};
    use proptest::prelude::*;

    fn player() -> PlayerId {
        PlayerId::new("p1")
    }

    fn support_match(i: u64) -> MatchRecord {
        MatchRecord::new(
            MatchId::new(format!("NA1_{i}")),
            player(),
            Role::Support,
            if i % 2 == 0 { "Thresh" } else { "Lulu" },
            if i % 3 == 0 { Outcome::Loss } else { Outcome::Win },
            1_000 + i,
        )
        .with_stats(MatchStats {
            kills: 1,
            deaths: 2,
            assists: 14,
            vision_score: 60.0,
            kill_participation: 0.7,
            wards_placed: 20,
            duration_secs: 1_800,
            ..Default::default()
        })
        .with_event(600_000, MapPoint::new(7_300, 7_600), EventKind::Death)
        .with_event(300_000, MapPoint::new(11_000, 2_000), EventKind::WardPlaced)
        .with_objective(ObjectiveEvent {
            timestamp_ms: 630_000,
            objective: "DRAGON".to_string(),
            taken_by: Side::Enemy,
            point: None,
        })
    }

    fn reference(metric: &str, mean: f64, std_dev: f64) -> ReferencePlayerStat {
        let samples: Vec<f64> =
            (0..40).map(|i| mean + std_dev * ((i % 5) as f64 - 2.0) / 1.414).collect();
        ReferencePlayerStat::from_samples(
            Role::Support,
            None,
            metric,
            &samples,
            &match_data::DEFAULT_PERCENTILES,
        )
        .unwrap()
    }

    fn store(match_count: u64) -> InMemoryStore {
        let mut store = InMemoryStore::new()
            .with_reference_stat(reference("vision_score", 45.0, 8.0))
            .with_reference_stat(reference("kill_participation", 0.55, 0.1))
            .with_reference_stat(reference("deaths", 5.0, 2.0))
            .with_snippet(
                KnowledgeSnippet::new("Warding the river", "Ward the river before dragon spawns.")
                    .with_keywords(["vision", "dragon"])
                    .with_published_at(10),
            )
            .with_snippet(
                KnowledgeSnippet::new("Baron setup", "Clear baron pit vision.")
                    .with_published_at(5),
            );
        store.register_player(player());
        for i in 0..match_count {
            store.add_match(support_match(i));
        }
        store
    }

    fn request() -> ContextRequest {
        ContextRequest::new(player(), Role::Support, "How should I ward for dragon?")
    }

    #[test]
    fn test_full_payload() {
        let payload = ContextAssembler::with_defaults().assemble(&request(), &store(6)).unwrap();

        assert!(payload.has_section(FactSection::Player));
        assert!(payload.has_section(FactSection::Benchmarks));
        assert!(payload.has_section(FactSection::Playstyle));
        assert!(payload.has_section(FactSection::Spatial));
        assert!(payload.has_section(FactSection::CriticalMoments));
        assert!(payload.has_section(FactSection::Snippets));
        assert_eq!(payload.snippets[0].snippet.title, "Warding the river");
        assert!(payload.used <= payload.budget);
        assert_eq!(payload.used, payload.content_size());
        assert!(!payload.truncation.is_truncated());

        let current = payload.facts.iter().find(|f| f.kind == FactKind::CurrentOutcome).unwrap();
        assert!(current.text.contains("NA1_5"));
    }

    #[test]
    fn test_insufficient_data_omits_benchmarks() {
        let payload = ContextAssembler::with_defaults().assemble(&request(), &store(2)).unwrap();

        assert!(payload.facts.iter().any(|f| f.kind == FactKind::Role));
        assert!(payload.facts.iter().any(|f| f.kind == FactKind::CurrentOutcome));
        assert!(!payload.has_section(FactSection::Benchmarks));
        assert!(payload.is_omitted(FactSection::Benchmarks));
        let reason = &payload
            .omitted_sections
            .iter()
            .find(|o| o.section == FactSection::Benchmarks)
            .unwrap()
            .reason;
        assert!(reason.contains("need 5, have 2"), "{reason}");
    }

    #[test]
    fn test_known_player_without_matches() {
        let payload = ContextAssembler::with_defaults().assemble(&request(), &store(0)).unwrap();
        let kinds: Vec<_> = payload.facts.iter().map(|f| f.kind).collect();
        assert_eq!(kinds, vec![FactKind::Role, FactKind::NoRecentMatches]);
        assert!(payload.is_omitted(FactSection::Benchmarks));
    }

    #[test]
    fn test_unknown_player_fails() {
        let request = ContextRequest::new(PlayerId::new("ghost"), Role::Support, "help");
        let result = ContextAssembler::with_defaults().assemble(&request, &store(3));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    struct OfflineSnippets(InMemoryStore);

    impl MatchSource for OfflineSnippets {
        fn get_matches(
            &self,
            player_id: &PlayerId,
            filter: &MatchFilter,
        ) -> Result<Vec<MatchRecord>, StoreError> {
            self.0.get_matches(player_id, filter)
        }
    }

    impl ReferenceSource for OfflineSnippets {
        fn get_reference_stats(
            &self,
            role: Role,
            champion: Option<&str>,
        ) -> Result<Vec<ReferencePlayerStat>, StoreError> {
            self.0.get_reference_stats(role, champion)
        }
    }

    impl SnippetSource for OfflineSnippets {
        fn search_snippets(
            &self,
            _query_terms: &[String],
        ) -> Result<Vec<KnowledgeSnippet>, StoreError> {
            Err(StoreError::unavailable("snippet index", "connection refused"))
        }
    }

    #[test]
    fn test_unavailable_store_fails() {
        let offline = OfflineSnippets(store(6));
        let result = ContextAssembler::with_defaults().assemble(&request(), &offline);
        assert!(matches!(result, Err(StoreError::Unavailable { .. })));
    }

    #[test]
    fn test_tight_budget_keeps_current_outcome() {
        let assembler = ContextAssembler::new(ContextConfig {
            budget: 60,
            ..ContextConfig::default()
        });
        let payload = assembler.assemble(&request(), &store(6)).unwrap();

        let kinds: Vec<_> = payload.facts.iter().map(|f| f.kind).collect();
        assert!(kinds.contains(&FactKind::Role));
        assert!(kinds.contains(&FactKind::CurrentOutcome));
        assert!(payload.truncation.dropped_mandatory.contains(&FactKind::MatchDetail { age: 3 }));
        assert_eq!(payload.truncation.dropped_mandatory[0], FactKind::MatchDetail { age: 3 });
    }

    #[test]
    fn test_champion_benchmarks_reach_past_role_history() {
        let mut store = store(0);
        for i in 0..20u64 {
            let mut record = support_match(100 + i);
            record.champion = "Lulu".to_string();
            store.add_match(record);
        }
        for i in 0..5u64 {
            let mut record = support_match(i);
            record.champion = "Thresh".to_string();
            store.add_match(record);
        }

        let request = request().with_champion("Thresh");
        let payload = ContextAssembler::with_defaults().assemble(&request, &store).unwrap();
        assert!(payload.has_section(FactSection::Benchmarks));
        let benchmark = payload.facts_in(FactSection::Benchmarks).next().unwrap();
        assert!(benchmark.text.contains("over 5 matches"), "{}", benchmark.text);
    }

    #[test]
    fn test_objective_proximity_and_laning_facts() {
        let mut store = store(0);
        store.add_match(
            support_match(1)
                .with_event(625_000, MapPoint::new(9_500, 4_300), EventKind::PositionSample)
                .with_objective(ObjectiveEvent {
                    timestamp_ms: 630_500,
                    objective: "DRAGON".to_string(),
                    taken_by: Side::Ally,
                    point: Some(MapPoint::new(9_800, 4_400)),
                }),
        );

        let payload = ContextAssembler::with_defaults().assemble(&request(), &store).unwrap();
        let proximity: Vec<_> = payload
            .facts
            .iter()
            .filter(|f| f.kind == FactKind::ObjectiveProximity)
            .collect();
        assert_eq!(proximity.len(), 1);
        assert!(proximity[0].text.ends_with("The player was at the objective."));

        let laning: Vec<_> = payload.facts_in(FactSection::Laning).collect();
        assert_eq!(laning.len(), 1);
        assert!(laning[0].text.contains("died 1 times"));
    }

    #[test]
    fn test_laning_section_omitted_without_timeline() {
        let mut store = store(0);
        store.add_match(MatchRecord::new(
            MatchId::new("NA1_bare"),
            player(),
            Role::Support,
            "Nami",
            Outcome::Win,
            10,
        ));

        let payload = ContextAssembler::with_defaults().assemble(&request(), &store).unwrap();
        assert!(!payload.has_section(FactSection::Laning));
        assert!(payload.is_omitted(FactSection::Laning));
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let store = store(6);
        let assembler = ContextAssembler::with_defaults();
        let matches = store
            .get_matches(&player(), &MatchFilter::new().role(Role::Support))
            .unwrap();
        let reference = store.get_reference_stats(Role::Support, None).unwrap();
        let query = ["dragon".to_string(), "vision".to_string()];
        let snippets = store.search_snippets(&query).unwrap();
        let request = request();
        let inputs = AssemblyInputs {
            request: &request,
            matches: &matches,
            reference: &reference,
            snippets: &snippets,
        };

        assert_eq!(assembler.assemble_from(inputs), assembler.assemble_from(inputs));
    }

    proptest! {
        /// Property: the payload never exceeds its budget outside the
        /// documented over-budget case.
        #[test]
        fn prop_payload_within_budget(budget in 0usize..1_500, match_count in 0u64..8) {
            let assembler =
                ContextAssembler::new(ContextConfig { budget, ..ContextConfig::default() });
            let payload = assembler.assemble(&request(), &store(match_count)).unwrap();

            prop_assert_eq!(payload.used, payload.content_size());
            if payload.truncation.over_budget {
                let kinds: Vec<_> = payload.facts.iter().map(|f| f.kind).collect();
                prop_assert!(kinds.iter().all(|k| k.is_never_dropped()));
                prop_assert!(payload.snippets.is_empty());
            } else {
                prop_assert!(payload.used <= budget);
            }
        }
    }
}
