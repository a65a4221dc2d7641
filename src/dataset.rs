use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::metrics::Metric;
use crate::parsing::{parse_value, parse_year, value_text};

/// Provider identifiers that carry no scouting value.
const DROPPED_COLUMNS: &[&str] = &[
    "account_id",
    "player_id",
    "team_id",
    "competition_id",
    "season_id",
    "country_id",
    "player_female",
    "player_first_name",
    "player_last_name",
    "player_known_name",
];

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: String,
    pub primary_position: Option<String>,
    pub secondary_position: Option<String>,
    pub team: Option<String>,
    pub competition: Option<String>,
    pub season: Option<String>,
    pub birth_date: Option<String>,
    pub age: Option<u32>,
    pub height: Option<f64>,
    pub minutes: Option<f64>,
    /// Only non-missing metric values are stored.
    pub stats: HashMap<Metric, f64>,
    /// Passthrough display columns that are not used for scoring.
    pub extras: BTreeMap<String, String>,
}

impl PlayerRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_stat(mut self, metric: Metric, value: f64) -> Self {
        self.stats.insert(metric, value);
        self
    }

    pub fn stat(&self, metric: Metric) -> Option<f64> {
        self.stats.get(&metric).copied()
    }

    pub fn position_label(&self) -> &str {
        self.primary_position.as_deref().unwrap_or("-")
    }
}

/// One immutable read of the dataset. Shared across a pipeline pass behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub source: String,
    pub fetched_at: DateTime<Utc>,
    pub rows: Vec<PlayerRecord>,
    columns: BTreeSet<Metric>,
}

impl Snapshot {
    pub fn new(source: impl Into<String>, rows: Vec<PlayerRecord>) -> Self {
        // A column counts as present only when some row carries a value for it.
        let columns = rows
            .iter()
            .flat_map(|r| r.stats.keys().copied())
            .collect();
        Self {
            source: source.into(),
            fetched_at: Utc::now(),
            rows,
            columns,
        }
    }

    pub fn columns(&self) -> &BTreeSet<Metric> {
        &self.columns
    }

    pub fn has_column(&self, metric: Metric) -> bool {
        self.columns.contains(&metric)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Builds a record from one provider row (a JSON object keyed by column name).
pub fn record_from_json(row: &Map<String, Value>, current_year: i32) -> Option<PlayerRecord> {
    let mut record = PlayerRecord::default();
    for (raw_key, value) in row {
        let key = raw_key
            .strip_prefix("player_season_")
            .unwrap_or(raw_key.as_str());
        if DROPPED_COLUMNS.contains(&key) {
            continue;
        }
        if let Some(metric) = Metric::from_column(key) {
            if let Some(v) = parse_value(value) {
                record.stats.insert(metric, v);
            }
            continue;
        }
        match key {
            "player_name" => record.name = value_text(value).unwrap_or_default(),
            "primary_position" => record.primary_position = value_text(value),
            "secondary_position" => record.secondary_position = value_text(value),
            "team_name" => record.team = value_text(value),
            "competition_name" => record.competition = value_text(value),
            "season_name" => record.season = value_text(value),
            "birth_date" => record.birth_date = value_text(value),
            "player_height" => record.height = parse_value(value),
            "minutes" => record.minutes = parse_value(value),
            "age" => record.age = parse_value(value).filter(|v| *v >= 0.0).map(|v| v as u32),
            _ => {
                if let Some(text) = value_text(value) {
                    record.extras.insert(key.to_string(), text);
                }
            }
        }
    }
    finish_record(record, current_year)
}

/// Builds records from a header row plus string rows (sheet or CSV-like tables).
pub fn records_from_table(
    header: &[String],
    rows: &[Vec<String>],
    current_year: i32,
) -> Vec<PlayerRecord> {
    rows.iter()
        .filter_map(|row| {
            let map: Map<String, Value> = header
                .iter()
                .zip(row.iter())
                .map(|(h, cell)| (h.clone(), Value::String(cell.clone())))
                .collect();
            record_from_json(&map, current_year)
        })
        .collect()
}

fn finish_record(mut record: PlayerRecord, current_year: i32) -> Option<PlayerRecord> {
    record.name = record.name.trim().to_string();
    if record.name.is_empty() {
        return None;
    }
    if record.age.is_none() {
        record.age = record
            .birth_date
            .as_deref()
            .and_then(parse_year)
            .and_then(|year| u32::try_from(current_year - year).ok());
    }
    Some(record)
}

pub fn current_year() -> i32 {
    Utc::now().year()
}
