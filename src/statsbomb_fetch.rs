use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use rayon::prelude::*;
use serde_json::Value;

use crate::dataset::{PlayerRecord, record_from_json};
use crate::http_cache::fetch_cached;
use crate::http_client::http_client;

pub const STATSBOMB_API_URL: &str = "https://data.statsbombservices.com/api/v4";

#[derive(Debug, Clone)]
pub struct StatsBombCredentials {
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompetitionSeason {
    pub competition_id: u32,
    pub season_id: u32,
}

impl CompetitionSeason {
    /// Parses `"129:317,7:317"`; malformed pairs are skipped.
    pub fn parse_list(raw: &str) -> Vec<CompetitionSeason> {
        raw.split(',')
            .filter_map(|pair| {
                let (comp, season) = pair.trim().split_once(':')?;
                Some(CompetitionSeason {
                    competition_id: comp.trim().parse().ok()?,
                    season_id: season.trim().parse().ok()?,
                })
            })
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct FetchReport {
    pub rows: Vec<PlayerRecord>,
    pub errors: Vec<String>,
}

pub fn parse_player_season_stats_json(raw: &str, current_year: i32) -> Result<Vec<PlayerRecord>> {
    let value: Value = serde_json::from_str(raw).context("invalid player stats json")?;
    let rows = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Array(rows) => rows,
        other => {
            return Err(anyhow!(
                "expected an array of player rows, got {}",
                json_kind(&other)
            ));
        }
    };
    Ok(rows
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|row| record_from_json(row, current_year))
        .collect())
}

/// Where and how fresh to read player stats. A zero `max_age` always revalidates.
#[derive(Debug, Clone)]
pub struct FetchSettings<'a> {
    pub base_url: &'a str,
    pub parallelism: usize,
    pub max_age: Duration,
}

pub fn fetch_player_season_stats(
    creds: &StatsBombCredentials,
    settings: &FetchSettings<'_>,
    target: CompetitionSeason,
    current_year: i32,
) -> Result<Vec<PlayerRecord>> {
    let client = http_client()?;
    let url = format!(
        "{}/competitions/{}/seasons/{}/player-stats",
        settings.base_url.trim_end_matches('/'),
        target.competition_id,
        target.season_id
    );
    let request = client
        .get(&url)
        .basic_auth(&creds.user, Some(&creds.password));
    let body = fetch_cached(&url, request, settings.max_age)
        .with_context(|| format!("fetch player stats {url}"))?;
    parse_player_season_stats_json(&body, current_year)
}

/// Fetches every competition/season in parallel and concatenates the rows in input order.
pub fn fetch_all(
    creds: &StatsBombCredentials,
    settings: &FetchSettings<'_>,
    targets: &[CompetitionSeason],
    current_year: i32,
) -> FetchReport {
    let results: Vec<(CompetitionSeason, Result<Vec<PlayerRecord>>)> =
        with_fetch_pool(settings.parallelism, || {
            targets
                .par_iter()
                .map(|t| (*t, fetch_player_season_stats(creds, settings, *t, current_year)))
                .collect()
        });

    let mut report = FetchReport::default();
    for (target, result) in results {
        match result {
            Ok(rows) => {
                tracing::info!(
                    competition = target.competition_id,
                    season = target.season_id,
                    rows = rows.len(),
                    "player stats loaded"
                );
                report.rows.extend(rows);
            }
            Err(err) => {
                tracing::warn!("player stats {}:{} failed: {err:#}", target.competition_id, target.season_id);
                report.errors.push(format!(
                    "competition {} season {}: {err:#}",
                    target.competition_id, target.season_id
                ));
            }
        }
    }
    report
}

fn with_fetch_pool<T>(threads: usize, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(action),
        Err(_) => action(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
