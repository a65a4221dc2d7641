use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::dataset::PlayerRecord;
use crate::profiles::ProfileTable;

pub const DEFAULT_WEIGHT: f64 = 1.0;
pub const DEFAULT_TOP_N: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileWeight {
    pub profile: String,
    pub weight: f64,
}

impl ProfileWeight {
    pub fn new(profile: impl Into<String>, weight: f64) -> Self {
        Self {
            profile: profile.into(),
            weight: sanitize_weight(weight),
        }
    }

    pub fn unit(profile: impl Into<String>) -> Self {
        Self::new(profile, DEFAULT_WEIGHT)
    }
}

/// Weights are non-negative multipliers; garbage input falls back to the default.
pub fn sanitize_weight(weight: f64) -> f64 {
    if !weight.is_finite() {
        DEFAULT_WEIGHT
    } else {
        weight.max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaderboardStatus {
    Ranked,
    EmptyPopulation,
    NoProfilesSelected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub player: String,
    /// Index of the kept row in the filtered population.
    #[serde(skip)]
    pub population_index: usize,
    pub position: String,
    pub team: Option<String>,
    pub competition: Option<String>,
    /// One entry per selected profile, in selection order.
    pub profile_scores: Vec<Option<f64>>,
    pub composite: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub status: LeaderboardStatus,
    pub profiles: Vec<String>,
    pub rows: Vec<LeaderboardRow>,
}

impl Leaderboard {
    pub fn empty(status: LeaderboardStatus, profiles: Vec<String>) -> Self {
        Self {
            status,
            profiles,
            rows: Vec::new(),
        }
    }
}

pub fn composite_score(table: &ProfileTable, player: usize, selection: &[ProfileWeight]) -> f64 {
    selection
        .iter()
        .filter_map(|w| table.score(player, &w.profile).map(|s| s * w.weight))
        .sum()
}

/// Ranks the population by weighted composite. `population[i]` must line up with row `i` of `table`.
pub fn rank(
    population: &[&PlayerRecord],
    table: &ProfileTable,
    selection: &[ProfileWeight],
    top_n: usize,
) -> Leaderboard {
    let profiles: Vec<String> = selection.iter().map(|w| w.profile.clone()).collect();
    if population.is_empty() {
        return Leaderboard::empty(LeaderboardStatus::EmptyPopulation, profiles);
    }
    if selection.is_empty() {
        return Leaderboard::empty(LeaderboardStatus::NoProfilesSelected, profiles);
    }

    let mut rows: Vec<LeaderboardRow> = population
        .iter()
        .enumerate()
        .map(|(idx, player)| LeaderboardRow {
            player: player.name.clone(),
            population_index: idx,
            position: player.position_label().to_string(),
            team: player.team.clone(),
            competition: player.competition.clone(),
            profile_scores: selection
                .iter()
                .map(|w| table.score(idx, &w.profile))
                .collect(),
            composite: composite_score(table, idx, selection),
            total: table.total(idx).unwrap_or(0.0),
        })
        .collect();

    rows.sort_by(compare_rows);
    let rows = dedup_keep_best(rows);

    Leaderboard {
        status: LeaderboardStatus::Ranked,
        profiles,
        rows: rows.into_iter().take(top_n.max(1)).collect(),
    }
}

fn compare_rows(a: &LeaderboardRow, b: &LeaderboardRow) -> Ordering {
    b.composite
        .partial_cmp(&a.composite)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.player.cmp(&b.player))
}

/// Rows must already be sorted best-first: the first row seen for a name is its best one.
fn dedup_keep_best(rows: Vec<LeaderboardRow>) -> Vec<LeaderboardRow> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(row.player.clone()))
        .collect()
}
