use crate::metrics::ProfileDefinition;
use crate::normalize::NormalizedTable;

/// Per-player profile scores, columns in the order of `profiles`.
#[derive(Debug, Clone, Default)]
pub struct ProfileTable {
    pub profiles: Vec<String>,
    rows: Vec<ProfileRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileRow {
    pub scores: Vec<Option<f64>>,
    /// Sum over all profiles with missing profile scores counted as 0.
    pub total: f64,
}

impl ProfileTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, player: usize) -> Option<&ProfileRow> {
        self.rows.get(player)
    }

    pub fn column(&self, profile: &str) -> Option<usize> {
        self.profiles.iter().position(|p| p == profile)
    }

    pub fn score(&self, player: usize, profile: &str) -> Option<f64> {
        let col = self.column(profile)?;
        self.rows.get(player)?.scores.get(col).copied().flatten()
    }

    pub fn total(&self, player: usize) -> Option<f64> {
        self.rows.get(player).map(|r| r.total)
    }
}

pub fn profile_score(table: &NormalizedTable, player: usize, profile: &ProfileDefinition) -> Option<f64> {
    let [a, b] = profile.metrics;
    Some(table.score(player, a)? + table.score(player, b)?)
}

pub fn aggregate(table: &NormalizedTable, profiles: &[ProfileDefinition]) -> ProfileTable {
    let rows = (0..table.len())
        .map(|player| {
            let scores: Vec<Option<f64>> = profiles
                .iter()
                .map(|profile| profile_score(table, player, profile))
                .collect();
            let total = scores.iter().flatten().sum();
            ProfileRow { scores, total }
        })
        .collect();

    ProfileTable {
        profiles: profiles.iter().map(|p| p.name.clone()).collect(),
        rows,
    }
}
