// End-to-end tests over a JSON data directory: aggregation, benchmarking,
// context assembly and artifact rendering against the same store.

use std::path::Path;

use coach_core::benchmark::BenchmarkEngine;
use coach_core::context_assembler::{ContextAssembler, ContextRequest, FactKind, FactSection};
use coach_core::record_store::{JsonDirStore, MatchFilter, MatchSource};
use coach_core::renderer::ArtifactRenderer;
use coach_core::spatial::SpatialAggregator;
use coach_core::{CoachConfig, StoreError};
use match_data::{
    EventKind, KnowledgeSnippet, MapPoint, MatchId, MatchRecord, MatchStats, ObjectiveEvent,
    Outcome, PlayerId, ReferencePlayerStat, Role, Side, DEFAULT_PERCENTILES,
};

fn write_json<T: serde::Serialize>(path: &Path, value: &T) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn player() -> PlayerId {
    PlayerId::new("Rift Walker")
}

fn history() -> Vec<MatchRecord> {
    (0..8u64)
        .map(|i| {
            let mut record = MatchRecord::new(
                MatchId::new(format!("EUW1_{i}")),
                player(),
                Role::Support,
                if i < 5 { "Thresh" } else { "Nautilus" },
                if i % 4 == 0 { Outcome::Loss } else { Outcome::Win },
                10_000 + i * 100,
            )
            .with_stats(MatchStats {
                deaths: 3 + (i % 3) as u32,
                assists: 12,
                vision_score: 58.0 + i as f64,
                kill_participation: 0.65,
                wards_placed: 22,
                control_wards_placed: 4,
                duration_secs: 1_920,
                ..Default::default()
            })
            .with_event(540_000, MapPoint::new(9_800, 4_300), EventKind::Death)
            .with_event(200_000, MapPoint::new(10_200, 4_100), EventKind::WardPlaced)
            .with_event(210_000, MapPoint::new(20_000, 4_100), EventKind::WardPlaced)
            .with_objective(ObjectiveEvent {
                timestamp_ms: 560_000,
                objective: "DRAGON".to_string(),
                taken_by: Side::Enemy,
                point: None,
            });
            for t in 0..30u64 {
                record = record.with_event(
                    t * 60_000,
                    MapPoint::new(1_000 + (t as i32) * 300, 1_000 + (t as i32) * 250),
                    EventKind::PositionSample,
                );
            }
            record
        })
        .collect()
}

fn reference(metric: &str, mean: f64, spread: f64) -> ReferencePlayerStat {
    let samples: Vec<f64> =
        (0..50).map(|i| mean + spread * ((i % 11) as f64 - 5.0) / 5.0).collect();
    ReferencePlayerStat::from_samples(Role::Support, None, metric, &samples, &DEFAULT_PERCENTILES)
        .unwrap()
}

fn seeded_store() -> (tempfile::TempDir, JsonDirStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonDirStore::new(dir.path());

    write_json(&store.player_path(&player()), &history());
    write_json(
        &store.reference_path(),
        &vec![
            reference("vision_score", 48.0, 10.0),
            reference("kill_participation", 0.55, 0.1),
            reference("deaths", 5.0, 2.0),
            reference("wards_placed", 18.0, 4.0),
            reference("control_wards_placed", 3.0, 1.0),
        ],
    );
    write_json(
        &store.snippets_path(),
        &vec![
            KnowledgeSnippet::new(
                "Dragon vision",
                "Sweep and ward the dragon pit a minute before it spawns.",
            )
            .with_keywords(["dragon", "ward", "vision"])
            .with_published_at(30),
            KnowledgeSnippet::new("Roaming mid", "Roam after shoving the wave.")
                .with_published_at(20),
            KnowledgeSnippet::new("Jungle tracking", "Track the enemy jungler's clear path.")
                .with_published_at(10),
        ],
    );

    (dir, store)
}

#[test]
fn test_full_pipeline_from_json_directory() {
    let (_dir, store) = seeded_store();
    let config = CoachConfig::from_toml_str("[context]\nbudget = 3000").unwrap();

    let matches = store
        .get_matches(&player(), &MatchFilter::new().role(Role::Support))
        .unwrap();
    assert_eq!(matches.len(), 8);
    assert_eq!(matches[0].id.as_str(), "EUW1_7");

    let aggregator = SpatialAggregator::new(config.spatial.clone());
    let wards = aggregator.aggregate(&matches, EventKind::WardPlaced);
    assert_eq!(wards.diagnostics.events_counted, 8);
    assert_eq!(wards.diagnostics.out_of_bounds_events, 8);
    assert_eq!(wards.grid.total(), 8);

    let engine = BenchmarkEngine::new(config.benchmark.clone());
    let outcomes = engine
        .benchmark_player(
            &store,
            &player(),
            Role::Support,
            None,
            &["vision_score", "Vision Score", "deaths"],
        )
        .unwrap();
    let vision = outcomes[0].1.as_ref().unwrap();
    assert!(vision.normalized_delta > 0.0);
    assert!(vision.percentile > 50.0);
    assert_eq!(outcomes[0].1, outcomes[1].1);

    let assembler = ContextAssembler::from_config(&config);
    let question = "How do I set up vision for dragon?";
    let request = ContextRequest::new(player(), Role::Support, question);
    let payload = assembler.assemble(&request, &store).unwrap();
    assert!(payload.used <= 3000);
    assert_eq!(payload.used, payload.content_size());
    assert!(payload.has_section(FactSection::Benchmarks));
    assert!(payload.has_section(FactSection::CriticalMoments));
    assert_eq!(payload.snippets[0].snippet.title, "Dragon vision");
    assert!(payload.facts.iter().any(|f| f.kind == FactKind::CurrentOutcome));

    let json = payload.to_json().unwrap();
    assert!(json.contains("EUW1_7"));

    let renderer = ArtifactRenderer::new(config.render.clone(), config.spatial.bounds).unwrap();
    let heat = renderer.heat_overlay(&wards.grid).unwrap();
    assert_eq!(heat.cells.len(), 1);
    assert_eq!(heat.cells[0].intensity, 1.0);

    let trace = wards.trace(&matches[0].id).unwrap();
    let path = renderer.path_overlay(trace).unwrap();
    assert!(path.polylines.len() >= 2);

    let results: Vec<_> = outcomes.into_iter().filter_map(|(_, r)| r.ok()).collect();
    let chart = renderer.benchmark_chart(&results);
    assert_eq!(chart.labels.len(), results.len());
    assert!(chart.delta.values.iter().all(|d| d.abs() <= config.render.delta_range));
}

#[test]
fn test_repeated_assembly_is_identical() {
    let (_dir, store) = seeded_store();
    let assembler = ContextAssembler::with_defaults();
    let request = ContextRequest::new(player(), Role::Support, "dragon vision");

    let first = assembler.assemble(&request, &store).unwrap();
    let second = assembler.assemble(&request, &store).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
}

#[test]
fn test_unknown_player_surfaces_not_found() {
    let (_dir, store) = seeded_store();
    let request = ContextRequest::new(PlayerId::new("nobody"), Role::Support, "help");
    let result = ContextAssembler::with_defaults().assemble(&request, &store);
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[test]
fn test_corrupt_snippet_file_is_unavailable() {
    let (_dir, store) = seeded_store();
    std::fs::write(store.snippets_path(), "[{").unwrap();

    let request = ContextRequest::new(player(), Role::Support, "dragon");
    let result = ContextAssembler::with_defaults().assemble(&request, &store);
    assert!(matches!(result, Err(StoreError::Unavailable { .. })));
}
