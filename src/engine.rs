use std::collections::{BTreeSet, HashSet};

use crate::dataset::{PlayerRecord, Snapshot};
use crate::filter::{self, FilterCriteria};
use crate::metrics::{Metric, MetricCatalog, ProfileError};
use crate::normalize::{self, NormalizedTable};
use crate::profiles::{self, ProfileTable};
use crate::ranking::{self, DEFAULT_TOP_N, Leaderboard, LeaderboardStatus, ProfileWeight};

#[derive(Debug, Clone)]
pub struct ProfilingRequest {
    pub selection: Vec<ProfileWeight>,
    pub top_n: usize,
}

impl Default for ProfilingRequest {
    fn default() -> Self {
        Self {
            selection: Vec::new(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl ProfilingRequest {
    pub fn with_profiles<I, S>(profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selection: profiles.into_iter().map(ProfileWeight::unit).collect(),
            ..Self::default()
        }
    }
}

/// Result of one full pass. Nothing here survives into the next pass.
#[derive(Debug, Clone)]
pub struct ProfilingOutcome {
    pub population_size: usize,
    pub leaderboard: Leaderboard,
    pub skipped: Vec<ProfileError>,
    pub dropped_selection: Vec<String>,
    pub degenerate: Vec<Metric>,
    pub normalized: NormalizedTable,
    pub profiles: ProfileTable,
}

impl ProfilingOutcome {
    pub fn status(&self) -> LeaderboardStatus {
        self.leaderboard.status
    }

    pub fn warnings(&self) -> Vec<String> {
        let mut out: Vec<String> = self.skipped.iter().map(|e| e.to_string()).collect();
        out.extend(
            self.dropped_selection
                .iter()
                .map(|p| format!("selected profile {p} is not available")),
        );
        out
    }
}

/// Normalizer -> ProfileAggregator -> WeightedRanker over an already-filtered population.
pub fn run_pass(
    population: &[&PlayerRecord],
    columns: &BTreeSet<Metric>,
    catalog: &MetricCatalog,
    request: &ProfilingRequest,
) -> ProfilingOutcome {
    let resolution = catalog.resolve(columns);
    for skip in &resolution.skipped {
        tracing::warn!("{skip}; profile skipped");
    }

    // A profile listed twice counts once, with its first weight.
    let mut seen = HashSet::new();
    let (selection, dropped): (Vec<ProfileWeight>, Vec<ProfileWeight>) = request
        .selection
        .iter()
        .filter(|w| seen.insert(w.profile.as_str()))
        .cloned()
        .partition(|w| resolution.is_usable(&w.profile));
    let dropped_selection: Vec<String> = dropped.into_iter().map(|w| w.profile).collect();

    let normalized = normalize::normalize(population, &resolution.required_metrics(), catalog);
    let profile_table = profiles::aggregate(&normalized, &resolution.usable);
    let leaderboard = ranking::rank(population, &profile_table, &selection, request.top_n);

    match leaderboard.status {
        LeaderboardStatus::Ranked => tracing::info!(
            population = population.len(),
            rows = leaderboard.rows.len(),
            "leaderboard ranked"
        ),
        status => tracing::info!(?status, "leaderboard empty"),
    }

    ProfilingOutcome {
        population_size: population.len(),
        degenerate: normalized.degenerate_metrics(),
        leaderboard,
        skipped: resolution.skipped,
        dropped_selection,
        normalized,
        profiles: profile_table,
    }
}

/// Filter the snapshot then run a full pass on the result.
pub fn run(
    snapshot: &Snapshot,
    criteria: &FilterCriteria,
    catalog: &MetricCatalog,
    request: &ProfilingRequest,
) -> ProfilingOutcome {
    let population = filter::apply(snapshot, criteria);
    run_pass(&population, snapshot.columns(), catalog, request)
}
