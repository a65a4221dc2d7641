use std::fs;
use std::path::PathBuf;

use scout_terminal::dataset::{Snapshot, records_from_table};
use scout_terminal::metrics::{Metric, MetricCatalog, Polarity};
use scout_terminal::parsing::{is_missing_sentinel, parse_cell, parse_year};
use scout_terminal::scouting_db::entries_from_sheet;
use scout_terminal::sheet_fetch::parse_values_json;
use scout_terminal::statsbomb_fetch::{CompetitionSeason, parse_player_season_stats_json};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn missing_sentinels_never_become_zero() {
    for raw in ["", " ", "-", "NA", "n/a", "NaN", "None", "null", "#N/A"] {
        assert!(is_missing_sentinel(raw), "{raw:?} should be missing");
        assert_eq!(parse_cell(raw), None, "{raw:?} should parse as missing");
    }
    assert_eq!(parse_cell("abc"), None);
    assert_eq!(parse_cell("0"), Some(0.0));
}

#[test]
fn numeric_cells_accept_sheet_formatting() {
    assert_eq!(parse_cell("2,4"), Some(2.4));
    assert_eq!(parse_cell("1,234.5"), Some(1234.5));
    assert_eq!(parse_cell(" 37% "), Some(37.0));
    assert_eq!(parse_cell("inf"), None);
}

#[test]
fn years_come_from_the_leading_digits() {
    assert_eq!(parse_year("1998-04-02"), Some(1998));
    assert_eq!(parse_year("2003"), Some(2003));
    assert_eq!(parse_year("2003.0"), Some(2003));
    assert_eq!(parse_year("03/04/1998"), None);
    assert_eq!(parse_year(""), None);
}

#[test]
fn competition_list_skips_malformed_pairs() {
    let targets = CompetitionSeason::parse_list("129:317, 7:317,bad,8:x,8:317");
    assert_eq!(
        targets,
        vec![
            CompetitionSeason { competition_id: 129, season_id: 317 },
            CompetitionSeason { competition_id: 7, season_id: 317 },
            CompetitionSeason { competition_id: 8, season_id: 317 },
        ]
    );
}

#[test]
fn player_season_stats_fixture_parses() {
    let raw = read_fixture("statsbomb_player_season_stats.json");
    let rows = parse_player_season_stats_json(&raw, 2025).expect("fixture should parse");

    // Blank names and non-object rows are dropped.
    assert_eq!(rows.len(), 2);

    let lucas = &rows[0];
    assert_eq!(lucas.name, "Lucas Martin");
    assert_eq!(lucas.team.as_deref(), Some("Amiens"));
    assert_eq!(lucas.competition.as_deref(), Some("Ligue 2"));
    assert_eq!(lucas.minutes, Some(1843.5));
    assert_eq!(lucas.height, Some(181.0));
    assert_eq!(lucas.age, Some(24));
    assert_eq!(lucas.stat(Metric::NpShots90), Some(2.71));
    assert_eq!(lucas.stat(Metric::Xa90), Some(0.11));
    assert_eq!(lucas.stat(Metric::DribbleRatio), None);
    assert!(!lucas.extras.contains_key("player_id"));
    assert_eq!(
        lucas.extras.get("most_recent_match").map(String::as_str),
        Some("2025-05-10")
    );

    let moussa = &rows[1];
    assert_eq!(moussa.name, "Moussa Traoré");
    assert_eq!(moussa.stat(Metric::Turnovers90), None);
    assert_eq!(moussa.secondary_position.as_deref(), Some("Right Wing"));
}

#[test]
fn player_season_stats_rejects_non_arrays() {
    assert!(parse_player_season_stats_json("null", 2025).expect("null is empty").is_empty());
    assert!(parse_player_season_stats_json(r#"{"error":"denied"}"#, 2025).is_err());
    assert!(parse_player_season_stats_json("not json", 2025).is_err());
}

#[test]
fn snapshot_columns_only_count_metrics_with_values() {
    let raw = read_fixture("statsbomb_player_season_stats.json");
    let rows = parse_player_season_stats_json(&raw, 2025).expect("fixture should parse");
    let snapshot = Snapshot::new("fixture", rows);
    assert!(snapshot.has_column(Metric::NpShots90));
    assert!(snapshot.has_column(Metric::Turnovers90));
    assert!(!snapshot.has_column(Metric::DribbleRatio));
    assert!(!snapshot.has_column(Metric::Pressures90));
}

#[test]
fn sheet_values_are_squared_to_the_header() {
    let table = parse_values_json(&read_fixture("sheet_values_scouting.json"))
        .expect("fixture should parse");
    assert_eq!(table.header.len(), 9);
    assert_eq!(table.rows.len(), 5);
    assert!(table.rows.iter().all(|r| r.len() == 9));
    assert_eq!(table.cell(&table.rows[1], "Rapport"), Some(""));
    assert_eq!(table.cell(&table.rows[0], "Player"), Some("Diallo"));
}

#[test]
fn empty_sheet_has_no_rows() {
    let table = parse_values_json(r#"{"range":"A1:B2"}"#).expect("missing values is empty");
    assert!(table.is_empty());
    assert!(table.header.is_empty());
}

#[test]
fn scouting_entries_read_french_headers() {
    let table = parse_values_json(&read_fixture("sheet_values_scouting.json"))
        .expect("fixture should parse");
    let entries = entries_from_sheet(&table);
    let names: Vec<&str> = entries.iter().map(|e| e.player.as_str()).collect();
    assert_eq!(names, vec!["Diallo", "Camara", "Fofana", "Sylla"]);

    let diallo = &entries[0];
    assert_eq!(diallo.first_name.as_deref(), Some("Ilyes"));
    assert_eq!(diallo.birth_year, Some(2003));
    assert_eq!(diallo.championship.as_deref(), Some("National 1"));
    assert!(diallo.report.is_some());

    let fofana = &entries[2];
    assert_eq!(fofana.contract_end, None);
    assert_eq!(fofana.report, None);
    assert_eq!(entries[3].birth_year, None);
}

#[test]
fn sheet_shaped_player_table_becomes_records() {
    let table = parse_values_json(&read_fixture("sheet_values_players.json"))
        .expect("fixture should parse");
    let rows = records_from_table(&table.header, &table.rows, 2025);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].stat(Metric::NpShots90), Some(2.4));
    assert_eq!(rows[0].minutes, Some(1520.0));
    assert_eq!(rows[0].age, Some(25));
    assert_eq!(rows[1].stat(Metric::Turnovers90), None);
    assert_eq!(rows[2].age, None);
}

#[test]
fn profile_config_fixture_loads() {
    let catalog = MetricCatalog::from_json(&read_fixture("profiles.json"))
        .expect("fixture should parse");
    let names: Vec<&str> = catalog.profiles().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Tireur", "Créateur"]);
    assert_eq!(catalog.polarity_of(Metric::Turnovers90), Polarity::Inverted);
    assert_eq!(catalog.polarity_of(Metric::Errors90), Polarity::Positive);

    let resolution = catalog.resolve(&[Metric::NpShots90, Metric::Turnovers90].into_iter().collect());
    assert_eq!(resolution.usable.len(), 1);
    let skipped: Vec<&str> = resolution.skipped.iter().map(|s| s.profile()).collect();
    assert_eq!(skipped, vec!["Fantôme", "Créateur"]);
}

#[test]
fn profile_config_rejects_bad_shapes() {
    let one_metric = r#"{"profiles":[{"name":"Solo","metrics":["np_shots_90"]}]}"#;
    assert!(MetricCatalog::from_json(one_metric).is_err());

    let duplicate = r#"{"profiles":[
        {"name":"Tireur","metrics":["np_shots_90","turnovers_90"]},
        {"name":"Tireur","metrics":["xa_90","op_key_passes_90"]}
    ]}"#;
    assert!(MetricCatalog::from_json(duplicate).is_err());

    let bad_inverted = r#"{"profiles":[],"inverted":["nope_90"]}"#;
    assert!(MetricCatalog::from_json(bad_inverted).is_err());
}

#[test]
fn default_catalog_matches_known_columns() {
    let catalog = MetricCatalog::default();
    assert_eq!(catalog.profiles().len(), 11);
    assert!(catalog.profile("Tireur").is_some());
    assert_eq!(catalog.polarity_of(Metric::Turnovers90), Polarity::Inverted);
    assert_eq!(catalog.polarity_of(Metric::NpShots90), Polarity::Positive);
    for def in catalog.definitions() {
        assert_eq!(Metric::from_column(def.metric.column()), Some(def.metric));
        assert!(!def.profiles.is_empty());
    }
    assert_eq!(
        Metric::from_column("player_season_np_shots_90"),
        Some(Metric::NpShots90)
    );
}
