use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::dataset::{PlayerRecord, Snapshot};

/// Inclusive numeric range; `None` on either side leaves that side open.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Range {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Range {
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn is_open(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// A bounded range rejects rows with no value, like a comparison against NaN.
    pub fn admits(&self, value: Option<f64>) -> bool {
        if self.is_open() {
            return true;
        }
        let Some(v) = value else {
            return false;
        };
        self.min.is_none_or(|min| v >= min) && self.max.is_none_or(|max| v <= max)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub positions: Vec<String>,
    pub teams: Vec<String>,
    pub competitions: Vec<String>,
    pub seasons: Vec<String>,
    pub age: Range,
    pub minutes: Range,
    pub height: Range,
    pub search: String,
}

impl FilterCriteria {
    pub fn matches(&self, record: &PlayerRecord) -> bool {
        in_set(&self.positions, record.primary_position.as_deref())
            && in_set(&self.teams, record.team.as_deref())
            && in_set(&self.competitions, record.competition.as_deref())
            && in_set(&self.seasons, record.season.as_deref())
            && self.age.admits(record.age.map(f64::from))
            && self.minutes.admits(record.minutes)
            && self.height.admits(record.height)
            && name_matches(&self.search, &record.name)
    }

    pub fn is_empty(&self) -> bool {
        *self == FilterCriteria::default()
    }
}

fn in_set(allowed: &[String], value: Option<&str>) -> bool {
    if allowed.is_empty() {
        return true;
    }
    value.is_some_and(|v| allowed.iter().any(|a| a == v))
}

fn name_matches(search: &str, name: &str) -> bool {
    let needle = search.trim().to_lowercase();
    needle.is_empty() || name.to_lowercase().contains(&needle)
}

/// The population every score is computed against.
pub fn apply<'a>(snapshot: &'a Snapshot, criteria: &FilterCriteria) -> Vec<&'a PlayerRecord> {
    snapshot
        .rows
        .iter()
        .filter(|r| criteria.matches(r))
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub positions: Vec<String>,
    pub teams: Vec<String>,
    pub competitions: Vec<String>,
    pub seasons: Vec<String>,
    pub age: Range,
    pub minutes: Range,
    pub height: Range,
}

pub fn options(snapshot: &Snapshot) -> FilterOptions {
    let distinct = |f: fn(&PlayerRecord) -> Option<&String>| -> Vec<String> {
        snapshot
            .rows
            .iter()
            .filter_map(f)
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    };
    FilterOptions {
        positions: distinct(|r| r.primary_position.as_ref()),
        teams: distinct(|r| r.team.as_ref()),
        competitions: distinct(|r| r.competition.as_ref()),
        seasons: distinct(|r| r.season.as_ref()),
        age: extent(snapshot.rows.iter().filter_map(|r| r.age.map(f64::from))),
        minutes: extent(snapshot.rows.iter().filter_map(|r| r.minutes)),
        height: extent(snapshot.rows.iter().filter_map(|r| r.height)),
    }
}

fn extent(values: impl Iterator<Item = f64>) -> Range {
    values.fold(Range::default(), |acc, v| Range {
        min: Some(acc.min.map_or(v, |m| m.min(v))),
        max: Some(acc.max.map_or(v, |m| m.max(v))),
    })
}
