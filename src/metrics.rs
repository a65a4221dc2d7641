use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw per-90 / ratio columns we know how to score.
/// Column names match the provider export once the `player_season_` prefix is stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Metric {
    NpXgPerShot,
    NpXg90,
    NpShots90,
    Npg90,
    Goals90,
    ConversionRatio,
    ShotOnTargetRatio,
    TouchesInsideBox90,
    Xa90,
    Assists90,
    KeyPasses90,
    OpKeyPasses90,
    ThroughBalls90,
    PassesIntoBox90,
    OpPassesIntoBox90,
    PassingRatio,
    LongBalls90,
    LongBallRatio,
    Crosses90,
    CrossingRatio,
    DeepProgressions90,
    DeepCompletions90,
    Dribbles90,
    DribbleRatio,
    Carries90,
    Turnovers90,
    Dispossessions90,
    Pressures90,
    PressureRegains90,
    Counterpressures90,
    PadjTackles90,
    PadjInterceptions90,
    Tackles90,
    Interceptions90,
    BallRecoveries90,
    AerialWins90,
    AerialRatio,
    ChallengeRatio,
    DribbledPast90,
    Fouls90,
    Errors90,
    Xgchain90,
    Xgbuildup90,
    Obv90,
    ObvPass90,
    ObvDribbleCarry90,
    ObvDefensiveAction90,
}

const METRIC_COLUMNS: &[(Metric, &str)] = &[
    (Metric::NpXgPerShot, "np_xg_per_shot"),
    (Metric::NpXg90, "np_xg_90"),
    (Metric::NpShots90, "np_shots_90"),
    (Metric::Npg90, "npg_90"),
    (Metric::Goals90, "goals_90"),
    (Metric::ConversionRatio, "conversion_ratio"),
    (Metric::ShotOnTargetRatio, "shot_on_target_ratio"),
    (Metric::TouchesInsideBox90, "touches_inside_box_90"),
    (Metric::Xa90, "xa_90"),
    (Metric::Assists90, "assists_90"),
    (Metric::KeyPasses90, "key_passes_90"),
    (Metric::OpKeyPasses90, "op_key_passes_90"),
    (Metric::ThroughBalls90, "through_balls_90"),
    (Metric::PassesIntoBox90, "passes_into_box_90"),
    (Metric::OpPassesIntoBox90, "op_passes_into_box_90"),
    (Metric::PassingRatio, "passing_ratio"),
    (Metric::LongBalls90, "long_balls_90"),
    (Metric::LongBallRatio, "long_ball_ratio"),
    (Metric::Crosses90, "crosses_90"),
    (Metric::CrossingRatio, "crossing_ratio"),
    (Metric::DeepProgressions90, "deep_progressions_90"),
    (Metric::DeepCompletions90, "deep_completions_90"),
    (Metric::Dribbles90, "dribbles_90"),
    (Metric::DribbleRatio, "dribble_ratio"),
    (Metric::Carries90, "carries_90"),
    (Metric::Turnovers90, "turnovers_90"),
    (Metric::Dispossessions90, "dispossessions_90"),
    (Metric::Pressures90, "pressures_90"),
    (Metric::PressureRegains90, "pressure_regains_90"),
    (Metric::Counterpressures90, "counterpressures_90"),
    (Metric::PadjTackles90, "padj_tackles_90"),
    (Metric::PadjInterceptions90, "padj_interceptions_90"),
    (Metric::Tackles90, "tackles_90"),
    (Metric::Interceptions90, "interceptions_90"),
    (Metric::BallRecoveries90, "ball_recoveries_90"),
    (Metric::AerialWins90, "aerial_wins_90"),
    (Metric::AerialRatio, "aerial_ratio"),
    (Metric::ChallengeRatio, "challenge_ratio"),
    (Metric::DribbledPast90, "dribbled_past_90"),
    (Metric::Fouls90, "fouls_90"),
    (Metric::Errors90, "errors_90"),
    (Metric::Xgchain90, "xgchain_90"),
    (Metric::Xgbuildup90, "xgbuildup_90"),
    (Metric::Obv90, "obv_90"),
    (Metric::ObvPass90, "obv_pass_90"),
    (Metric::ObvDribbleCarry90, "obv_dribble_carry_90"),
    (Metric::ObvDefensiveAction90, "obv_defensive_action_90"),
];

impl Metric {
    pub fn all() -> impl Iterator<Item = Metric> {
        METRIC_COLUMNS.iter().map(|(m, _)| *m)
    }

    pub fn column(self) -> &'static str {
        METRIC_COLUMNS
            .iter()
            .find(|(m, _)| *m == self)
            .map(|(_, col)| *col)
            .unwrap_or("unknown")
    }

    /// Accepts the bare column name or the provider's prefixed form.
    pub fn from_column(raw: &str) -> Option<Metric> {
        let key = raw.trim().to_ascii_lowercase();
        let key = key.strip_prefix("player_season_").unwrap_or(&key);
        METRIC_COLUMNS
            .iter()
            .find(|(_, col)| *col == key)
            .map(|(m, _)| *m)
    }

    /// Metrics where a lower raw value is the better outcome.
    pub fn default_polarity(self) -> Polarity {
        match self {
            Metric::Turnovers90
            | Metric::Dispossessions90
            | Metric::DribbledPast90
            | Metric::Fouls90
            | Metric::Errors90 => Polarity::Inverted,
            _ => Polarity::Positive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    Positive,
    Inverted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileDefinition {
    pub name: String,
    pub metrics: [Metric; 2],
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricDefinition {
    pub metric: Metric,
    pub polarity: Polarity,
    pub profiles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    #[error("profile {profile} references unknown metric {metric}")]
    UnknownMetric { profile: String, metric: String },
}

impl ProfileError {
    pub fn profile(&self) -> &str {
        match self {
            ProfileError::UnknownMetric { profile, .. } => profile,
        }
    }
}

/// Profiles split by whether the active dataset can feed them.
#[derive(Debug, Clone, Default)]
pub struct ProfileResolution {
    pub usable: Vec<ProfileDefinition>,
    pub skipped: Vec<ProfileError>,
}

impl ProfileResolution {
    pub fn required_metrics(&self) -> BTreeSet<Metric> {
        self.usable
            .iter()
            .flat_map(|p| p.metrics.iter().copied())
            .collect()
    }

    pub fn is_usable(&self, profile: &str) -> bool {
        self.usable.iter().any(|p| p.name == profile)
    }
}

#[derive(Debug, Clone)]
pub struct MetricCatalog {
    profiles: Vec<ProfileDefinition>,
    // Profiles whose config named a column we do not know. Kept so they surface as warnings.
    unresolved: Vec<ProfileError>,
    inverted: HashSet<Metric>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    profiles: Vec<ProfileEntry>,
    #[serde(default)]
    inverted: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ProfileEntry {
    name: String,
    metrics: Vec<String>,
}

const DEFAULT_PROFILES: &[(&str, Metric, Metric)] = &[
    ("Finisseur", Metric::Npg90, Metric::NpXgPerShot),
    ("Tireur", Metric::NpShots90, Metric::ShotOnTargetRatio),
    ("Créateur", Metric::Xa90, Metric::OpKeyPasses90),
    ("Passeur", Metric::PassingRatio, Metric::OpPassesIntoBox90),
    ("Dribbleur", Metric::Dribbles90, Metric::DribbleRatio),
    ("Conservation", Metric::Turnovers90, Metric::Dispossessions90),
    ("Progression", Metric::DeepProgressions90, Metric::Carries90),
    ("Récupérateur", Metric::PadjTackles90, Metric::PadjInterceptions90),
    ("Presseur", Metric::Pressures90, Metric::Counterpressures90),
    ("Aérien", Metric::AerialWins90, Metric::AerialRatio),
    ("Défense fiable", Metric::DribbledPast90, Metric::Errors90),
];

impl Default for MetricCatalog {
    fn default() -> Self {
        let profiles = DEFAULT_PROFILES
            .iter()
            .map(|(name, a, b)| ProfileDefinition {
                name: (*name).to_string(),
                metrics: [*a, *b],
            })
            .collect();
        Self::new(profiles)
    }
}

impl MetricCatalog {
    pub fn new(profiles: Vec<ProfileDefinition>) -> Self {
        let inverted = Metric::all()
            .filter(|m| m.default_polarity() == Polarity::Inverted)
            .collect();
        Self {
            profiles,
            unresolved: Vec::new(),
            inverted,
        }
    }

    pub fn with_inverted(mut self, inverted: impl IntoIterator<Item = Metric>) -> Self {
        self.inverted = inverted.into_iter().collect();
        self
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read profile config {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parse profile config {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(raw).context("invalid profile config json")?;

        let mut seen = HashSet::new();
        let mut profiles = Vec::new();
        let mut unresolved = Vec::new();
        for entry in file.profiles {
            let name = entry.name.trim().to_string();
            if name.is_empty() {
                return Err(anyhow!("profile with empty name"));
            }
            if !seen.insert(name.clone()) {
                return Err(anyhow!("duplicate profile {name}"));
            }
            let [a, b] = entry.metrics.as_slice() else {
                return Err(anyhow!(
                    "profile {name} must list exactly two metrics, got {}",
                    entry.metrics.len()
                ));
            };
            match (Metric::from_column(a), Metric::from_column(b)) {
                (Some(a), Some(b)) => profiles.push(ProfileDefinition {
                    name,
                    metrics: [a, b],
                }),
                (None, _) => unresolved.push(ProfileError::UnknownMetric {
                    profile: name,
                    metric: a.clone(),
                }),
                (_, None) => unresolved.push(ProfileError::UnknownMetric {
                    profile: name,
                    metric: b.clone(),
                }),
            }
        }

        let mut catalog = Self::new(profiles);
        catalog.unresolved = unresolved;
        if let Some(inverted) = file.inverted {
            let mut set = HashSet::new();
            for col in inverted {
                let metric = Metric::from_column(&col)
                    .ok_or_else(|| anyhow!("unknown metric {col} in inverted list"))?;
                set.insert(metric);
            }
            catalog.inverted = set;
        }
        Ok(catalog)
    }

    pub fn polarity_of(&self, metric: Metric) -> Polarity {
        if self.inverted.contains(&metric) {
            Polarity::Inverted
        } else {
            Polarity::Positive
        }
    }

    pub fn profiles(&self) -> &[ProfileDefinition] {
        &self.profiles
    }

    pub fn profile(&self, name: &str) -> Option<&ProfileDefinition> {
        self.profiles.iter().find(|p| p.name == name)
    }

    pub fn definitions(&self) -> Vec<MetricDefinition> {
        let mut memberships: HashMap<Metric, Vec<String>> = HashMap::new();
        let mut order = Vec::new();
        for profile in &self.profiles {
            for metric in profile.metrics {
                let entry = memberships.entry(metric).or_insert_with(|| {
                    order.push(metric);
                    Vec::new()
                });
                if !entry.contains(&profile.name) {
                    entry.push(profile.name.clone());
                }
            }
        }
        order
            .into_iter()
            .map(|metric| MetricDefinition {
                metric,
                polarity: self.polarity_of(metric),
                profiles: memberships.remove(&metric).unwrap_or_default(),
            })
            .collect()
    }

    /// Splits profiles into the ones the dataset can feed and the ones to skip.
    pub fn resolve(&self, present: &BTreeSet<Metric>) -> ProfileResolution {
        let mut out = ProfileResolution {
            usable: Vec::new(),
            skipped: self.unresolved.clone(),
        };
        for profile in &self.profiles {
            match profile.metrics.iter().find(|m| !present.contains(m)) {
                Some(missing) => out.skipped.push(ProfileError::UnknownMetric {
                    profile: profile.name.clone(),
                    metric: missing.column().to_string(),
                }),
                None => out.usable.push(profile.clone()),
            }
        }
        out
    }
}
