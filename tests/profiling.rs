use std::collections::BTreeSet;

use scout_terminal::dataset::{PlayerRecord, Snapshot};
use scout_terminal::engine::{self, ProfilingRequest};
use scout_terminal::filter::FilterCriteria;
use scout_terminal::metrics::{Metric, MetricCatalog, Polarity, ProfileError};
use scout_terminal::normalize::{self, column_stats, zscore};
use scout_terminal::ranking::{LeaderboardStatus, ProfileWeight, sanitize_weight};

const EPS: f64 = 1e-9;

fn tireur_catalog() -> MetricCatalog {
    MetricCatalog::from_json(
        r#"{
            "profiles": [{"name": "Tireur", "metrics": ["np_shots_90", "turnovers_90"]}],
            "inverted": ["turnovers_90"]
        }"#,
    )
    .expect("catalog json should parse")
}

fn two_profile_catalog() -> MetricCatalog {
    MetricCatalog::from_json(
        r#"{
            "profiles": [
                {"name": "Tireur", "metrics": ["np_shots_90", "turnovers_90"]},
                {"name": "Créateur", "metrics": ["xa_90", "op_key_passes_90"]}
            ],
            "inverted": ["turnovers_90"]
        }"#,
    )
    .expect("catalog json should parse")
}

fn shooter(name: &str, shots: f64, turnovers: f64) -> PlayerRecord {
    PlayerRecord::new(name)
        .with_stat(Metric::NpShots90, shots)
        .with_stat(Metric::Turnovers90, turnovers)
}

fn snapshot(rows: Vec<PlayerRecord>) -> Snapshot {
    Snapshot::new("test", rows)
}

fn run(snapshot: &Snapshot, catalog: &MetricCatalog, request: &ProfilingRequest) -> engine::ProfilingOutcome {
    engine::run(snapshot, &FilterCriteria::default(), catalog, request)
}

#[test]
fn two_player_shooter_example_ranks_b_over_a() {
    let snap = snapshot(vec![shooter("A", 1.0, 2.0), shooter("B", 3.0, 0.0)]);
    let outcome = run(&snap, &tireur_catalog(), &ProfilingRequest::with_profiles(["Tireur"]));

    assert_eq!(outcome.status(), LeaderboardStatus::Ranked);
    let rows = &outcome.leaderboard.rows;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].player, "B");
    assert!((rows[0].composite - 2.0).abs() < EPS);
    assert_eq!(rows[1].player, "A");
    assert!((rows[1].composite + 2.0).abs() < EPS);
    assert_eq!(rows[0].profile_scores.len(), 1);
    assert!((rows[0].profile_scores[0].unwrap() - 2.0).abs() < EPS);
}

#[test]
fn zscores_have_zero_mean_and_unit_population_std() {
    let values = [0.3, 1.7, 2.2, 4.0, 4.1, 7.5, 9.9, 10.2];
    let rows: Vec<PlayerRecord> = values
        .iter()
        .enumerate()
        .map(|(i, v)| PlayerRecord::new(format!("P{i}")).with_stat(Metric::NpShots90, *v))
        .collect();
    let population: Vec<&PlayerRecord> = rows.iter().collect();
    let metrics = BTreeSet::from([Metric::NpShots90]);
    let table = normalize::normalize(&population, &metrics, &MetricCatalog::default());

    let zs: Vec<f64> = (0..rows.len())
        .map(|i| table.score(i, Metric::NpShots90).expect("every value present"))
        .collect();
    let n = zs.len() as f64;
    let mean = zs.iter().sum::<f64>() / n;
    let var = zs.iter().map(|z| (z - mean).powi(2)).sum::<f64>() / n;
    assert!(mean.abs() < 1e-9);
    assert!((var.sqrt() - 1.0).abs() < 1e-9);
}

#[test]
fn inverted_metric_flips_order() {
    let stats = column_stats(&[1.0, 2.0, 3.0]).expect("non-empty");
    let low = zscore(1.0, &stats, Polarity::Inverted);
    let high = zscore(3.0, &stats, Polarity::Inverted);
    assert!(high < low);
    assert!((zscore(3.0, &stats, Polarity::Positive) + high).abs() < EPS);
}

#[test]
fn constant_column_scores_zero_everywhere() {
    let snap = snapshot(vec![
        shooter("A", 2.0, 1.0),
        shooter("B", 2.0, 3.0),
        shooter("C", 2.0, 5.0),
    ]);
    let outcome = run(&snap, &tireur_catalog(), &ProfilingRequest::with_profiles(["Tireur"]));

    assert_eq!(outcome.degenerate, vec![Metric::NpShots90]);
    for idx in 0..3 {
        assert_eq!(outcome.normalized.score(idx, Metric::NpShots90), Some(0.0));
    }
    // Ordering comes from turnovers alone; fewer is better.
    let order: Vec<&str> = outcome.leaderboard.rows.iter().map(|r| r.player.as_str()).collect();
    assert_eq!(order, vec!["A", "B", "C"]);
}

#[test]
fn missing_metric_makes_profile_missing_but_keeps_player() {
    let snap = snapshot(vec![
        shooter("A", 1.0, 2.0),
        shooter("B", 3.0, 0.0),
        PlayerRecord::new("C").with_stat(Metric::NpShots90, 2.0),
    ]);
    let outcome = run(&snap, &tireur_catalog(), &ProfilingRequest::with_profiles(["Tireur"]));

    // C's missing turnovers stay out of the mean and std.
    let turnover_stats = outcome.normalized.stats[&Metric::Turnovers90];
    assert_eq!(turnover_stats.count, 2);
    assert_eq!(outcome.normalized.score(2, Metric::Turnovers90), None);
    assert_eq!(outcome.profiles.score(2, "Tireur"), None);
    assert_eq!(outcome.profiles.total(2), Some(0.0));

    let c = outcome
        .leaderboard
        .rows
        .iter()
        .find(|r| r.player == "C")
        .expect("C still ranked");
    assert_eq!(c.profile_scores, vec![None]);
    assert_eq!(c.composite, 0.0);
}

#[test]
fn duplicate_names_keep_the_best_row() {
    let snap = snapshot(vec![
        shooter("Dup", 1.0, 3.0),
        shooter("Dup", 4.0, 0.5),
        shooter("Other", 2.0, 2.0),
        shooter("Third", 2.5, 1.0),
    ]);
    let outcome = run(&snap, &tireur_catalog(), &ProfilingRequest::with_profiles(["Tireur"]));

    let dups: Vec<_> = outcome
        .leaderboard
        .rows
        .iter()
        .filter(|r| r.player == "Dup")
        .collect();
    assert_eq!(dups.len(), 1);

    let first = outcome.profiles.score(0, "Tireur").expect("score");
    let second = outcome.profiles.score(1, "Tireur").expect("score");
    assert!(second > first);
    assert!((dups[0].composite - second).abs() < EPS);
    assert_eq!(dups[0].population_index, 1);
    assert_eq!(outcome.leaderboard.rows.len(), 3);
}

#[test]
fn ties_break_on_name() {
    let snap = snapshot(vec![
        shooter("Zed", 2.0, 1.0),
        shooter("Abe", 2.0, 1.0),
        shooter("Max", 1.0, 1.0),
    ]);
    let outcome = run(&snap, &tireur_catalog(), &ProfilingRequest::with_profiles(["Tireur"]));
    let order: Vec<&str> = outcome.leaderboard.rows.iter().map(|r| r.player.as_str()).collect();
    assert_eq!(order, vec!["Abe", "Zed", "Max"]);
}

fn two_profile_snapshot() -> Snapshot {
    snapshot(vec![
        shooter("A", 1.0, 2.0)
            .with_stat(Metric::Xa90, 0.4)
            .with_stat(Metric::OpKeyPasses90, 2.0),
        shooter("B", 3.0, 0.0)
            .with_stat(Metric::Xa90, 0.1)
            .with_stat(Metric::OpKeyPasses90, 0.5),
        shooter("C", 2.0, 1.0)
            .with_stat(Metric::Xa90, 0.2)
            .with_stat(Metric::OpKeyPasses90, 1.0),
    ])
}

#[test]
fn doubling_every_weight_doubles_composites_and_keeps_order() {
    let snap = two_profile_snapshot();
    let catalog = two_profile_catalog();
    let base = run(
        &snap,
        &catalog,
        &ProfilingRequest {
            selection: vec![ProfileWeight::new("Tireur", 1.0), ProfileWeight::new("Créateur", 0.5)],
            ..ProfilingRequest::default()
        },
    );
    let doubled = run(
        &snap,
        &catalog,
        &ProfilingRequest {
            selection: vec![ProfileWeight::new("Tireur", 2.0), ProfileWeight::new("Créateur", 1.0)],
            ..ProfilingRequest::default()
        },
    );

    let names = |o: &engine::ProfilingOutcome| {
        o.leaderboard.rows.iter().map(|r| r.player.clone()).collect::<Vec<_>>()
    };
    assert_eq!(names(&base), names(&doubled));
    for (a, b) in base.leaderboard.rows.iter().zip(&doubled.leaderboard.rows) {
        assert!((b.composite - 2.0 * a.composite).abs() < EPS);
        assert!((a.total - b.total).abs() < EPS);
    }
}

#[test]
fn repeated_profile_in_selection_counts_once() {
    let snap = two_profile_snapshot();
    let catalog = two_profile_catalog();
    let once = run(&snap, &catalog, &ProfilingRequest::with_profiles(["Tireur"]));
    let twice = run(
        &snap,
        &catalog,
        &ProfilingRequest {
            selection: vec![ProfileWeight::new("Tireur", 1.0), ProfileWeight::new("Tireur", 3.0)],
            ..ProfilingRequest::default()
        },
    );

    assert_eq!(twice.leaderboard.profiles, vec!["Tireur"]);
    for (a, b) in once.leaderboard.rows.iter().zip(&twice.leaderboard.rows) {
        assert_eq!(a.player, b.player);
        assert_eq!(b.profile_scores.len(), 1);
        assert!((a.composite - b.composite).abs() < EPS);
    }
}

#[test]
fn zero_weight_profile_does_not_move_the_composite() {
    let snap = two_profile_snapshot();
    let catalog = two_profile_catalog();
    let outcome = run(
        &snap,
        &catalog,
        &ProfilingRequest {
            selection: vec![ProfileWeight::new("Tireur", 1.0), ProfileWeight::new("Créateur", 0.0)],
            ..ProfilingRequest::default()
        },
    );
    for row in &outcome.leaderboard.rows {
        let tireur = row.profile_scores[0].unwrap_or(0.0);
        assert!((row.composite - tireur).abs() < EPS);
    }
}

#[test]
fn weights_are_sanitized() {
    assert_eq!(sanitize_weight(-3.0), 0.0);
    assert_eq!(sanitize_weight(f64::NAN), 1.0);
    assert_eq!(sanitize_weight(f64::INFINITY), 1.0);
    assert_eq!(ProfileWeight::new("Tireur", 2.5).weight, 2.5);
}

#[test]
fn empty_population_is_reported_before_empty_selection() {
    let snap = snapshot(vec![shooter("A", 1.0, 2.0)]);
    let criteria = FilterCriteria {
        search: "nobody".to_string(),
        ..FilterCriteria::default()
    };
    let outcome = engine::run(&snap, &criteria, &tireur_catalog(), &ProfilingRequest::default());
    assert_eq!(outcome.status(), LeaderboardStatus::EmptyPopulation);
    assert!(outcome.leaderboard.rows.is_empty());
    assert_eq!(outcome.population_size, 0);
}

#[test]
fn no_selection_yields_no_rows() {
    let snap = snapshot(vec![shooter("A", 1.0, 2.0), shooter("B", 3.0, 0.0)]);
    let outcome = run(&snap, &tireur_catalog(), &ProfilingRequest::default());
    assert_eq!(outcome.status(), LeaderboardStatus::NoProfilesSelected);
    assert!(outcome.leaderboard.rows.is_empty());
}

#[test]
fn single_player_scores_zero() {
    let snap = snapshot(vec![shooter("Solo", 2.4, 1.1)]);
    let outcome = run(&snap, &tireur_catalog(), &ProfilingRequest::with_profiles(["Tireur"]));
    assert_eq!(outcome.leaderboard.rows.len(), 1);
    let row = &outcome.leaderboard.rows[0];
    assert_eq!(row.player, "Solo");
    assert_eq!(row.composite, 0.0);
    assert_eq!(row.profile_scores, vec![Some(0.0)]);
}

#[test]
fn top_n_truncates_after_dedup() {
    let rows: Vec<PlayerRecord> = (0..40)
        .map(|i| shooter(&format!("P{i:02}"), i as f64, 1.0))
        .collect();
    let snap = snapshot(rows);
    let outcome = run(
        &snap,
        &tireur_catalog(),
        &ProfilingRequest {
            top_n: 5,
            ..ProfilingRequest::with_profiles(["Tireur"])
        },
    );
    let names: Vec<&str> = outcome.leaderboard.rows.iter().map(|r| r.player.as_str()).collect();
    assert_eq!(names, vec!["P39", "P38", "P37", "P36", "P35"]);

    let default = run(&snap, &tireur_catalog(), &ProfilingRequest::with_profiles(["Tireur"]));
    assert_eq!(default.leaderboard.rows.len(), 30);
}

#[test]
fn profile_with_absent_column_is_skipped_and_dropped_from_selection() {
    let snap = snapshot(vec![
        PlayerRecord::new("A")
            .with_stat(Metric::Xa90, 0.4)
            .with_stat(Metric::OpKeyPasses90, 2.0),
        PlayerRecord::new("B")
            .with_stat(Metric::Xa90, 0.1)
            .with_stat(Metric::OpKeyPasses90, 0.5),
    ]);
    let outcome = run(
        &snap,
        &two_profile_catalog(),
        &ProfilingRequest::with_profiles(["Tireur", "Créateur"]),
    );

    assert_eq!(
        outcome.skipped,
        vec![ProfileError::UnknownMetric {
            profile: "Tireur".to_string(),
            metric: "np_shots_90".to_string(),
        }]
    );
    assert_eq!(outcome.dropped_selection, vec!["Tireur".to_string()]);
    assert_eq!(outcome.leaderboard.profiles, vec!["Créateur".to_string()]);
    assert_eq!(outcome.status(), LeaderboardStatus::Ranked);
    assert_eq!(outcome.leaderboard.rows[0].player, "A");
    assert_eq!(outcome.warnings().len(), 2);
}

#[test]
fn configured_unknown_metric_surfaces_as_skip() {
    let catalog = MetricCatalog::from_json(
        r#"{"profiles": [
            {"name": "Tireur", "metrics": ["np_shots_90", "turnovers_90"]},
            {"name": "Mystère", "metrics": ["np_shots_90", "magic_90"]}
        ]}"#,
    )
    .expect("unknown metric names are not a config error");
    let snap = snapshot(vec![shooter("A", 1.0, 2.0), shooter("B", 3.0, 0.0)]);
    let outcome = run(&snap, &catalog, &ProfilingRequest::with_profiles(["Tireur", "Mystère"]));

    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].profile(), "Mystère");
    assert_eq!(outcome.dropped_selection, vec!["Mystère".to_string()]);
    assert_eq!(outcome.leaderboard.rows.len(), 2);
}

#[test]
fn only_unusable_profiles_selected_reports_no_profiles() {
    let snap = snapshot(vec![PlayerRecord::new("A").with_stat(Metric::Xa90, 0.2)]);
    let outcome = run(&snap, &tireur_catalog(), &ProfilingRequest::with_profiles(["Tireur"]));
    assert_eq!(outcome.status(), LeaderboardStatus::NoProfilesSelected);
    assert_eq!(outcome.dropped_selection, vec!["Tireur".to_string()]);
}

#[test]
fn filters_change_the_reference_population() {
    let mut a = shooter("A", 1.0, 1.0);
    a.competition = Some("Ligue 2".to_string());
    let mut b = shooter("B", 3.0, 1.0);
    b.competition = Some("Ligue 2".to_string());
    let mut c = shooter("C", 10.0, 1.0);
    c.competition = Some("Ligue 1".to_string());
    let snap = snapshot(vec![a, b, c]);

    let criteria = FilterCriteria {
        competitions: vec!["Ligue 2".to_string()],
        ..FilterCriteria::default()
    };
    let outcome = engine::run(
        &snap,
        &criteria,
        &tireur_catalog(),
        &ProfilingRequest::with_profiles(["Tireur"]),
    );
    assert_eq!(outcome.population_size, 2);
    let stats = outcome.normalized.stats[&Metric::NpShots90];
    assert!((stats.mean - 2.0).abs() < EPS);
    assert!((outcome.leaderboard.rows[0].composite - 1.0).abs() < EPS);
}
