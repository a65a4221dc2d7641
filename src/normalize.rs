use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::dataset::PlayerRecord;
use crate::metrics::{Metric, MetricCatalog, Polarity};

/// Below this the column is treated as constant and every z is 0.
const STD_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricStats {
    pub mean: f64,
    pub std_dev: f64,
    pub count: usize,
}

impl MetricStats {
    pub fn is_degenerate(&self) -> bool {
        self.std_dev < STD_EPSILON
    }
}

/// z-scores for one population, indexed by the position of each player in that population.
#[derive(Debug, Clone, Default)]
pub struct NormalizedTable {
    pub stats: BTreeMap<Metric, MetricStats>,
    scores: Vec<HashMap<Metric, f64>>,
}

impl NormalizedTable {
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn score(&self, player: usize, metric: Metric) -> Option<f64> {
        self.scores.get(player)?.get(&metric).copied()
    }

    pub fn degenerate_metrics(&self) -> Vec<Metric> {
        self.stats
            .iter()
            .filter(|(_, s)| s.is_degenerate())
            .map(|(m, _)| *m)
            .collect()
    }
}

pub fn column_stats(values: &[f64]) -> Option<MetricStats> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values
        .iter()
        .map(|v| {
            let d = v - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    Some(MetricStats {
        mean,
        std_dev: var.sqrt(),
        count: values.len(),
    })
}

pub fn zscore(value: f64, stats: &MetricStats, polarity: Polarity) -> f64 {
    if stats.is_degenerate() {
        return 0.0;
    }
    let z = (value - stats.mean) / stats.std_dev;
    match polarity {
        Polarity::Positive => z,
        Polarity::Inverted => -z,
    }
}

/// Standardizes every required metric over the given population.
/// Missing raw values are left out of the mean/std and stay missing in the output.
pub fn normalize(
    population: &[&PlayerRecord],
    metrics: &BTreeSet<Metric>,
    catalog: &MetricCatalog,
) -> NormalizedTable {
    let mut table = NormalizedTable {
        stats: BTreeMap::new(),
        scores: vec![HashMap::new(); population.len()],
    };

    for &metric in metrics {
        let values: Vec<f64> = population.iter().filter_map(|p| p.stat(metric)).collect();
        let Some(stats) = column_stats(&values) else {
            continue;
        };
        let polarity = catalog.polarity_of(metric);
        for (idx, player) in population.iter().enumerate() {
            if let Some(v) = player.stat(metric) {
                table.scores[idx].insert(metric, zscore(v, &stats, polarity));
            }
        }
        if stats.is_degenerate() {
            tracing::debug!(metric = metric.column(), "degenerate metric, z fixed at 0");
        }
        table.stats.insert(metric, stats);
    }

    table
}
