use std::collections::HashSet;

use serde::Serialize;

use crate::dataset::PlayerRecord;
use crate::metrics::Metric;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub player: String,
    pub competition: Option<String>,
    pub x: f64,
    pub y: f64,
}

/// Raw two-metric comparison with median reference lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterView {
    pub x_metric: Metric,
    pub y_metric: Metric,
    pub median_x: Option<f64>,
    pub median_y: Option<f64>,
    pub highlighted: Vec<ScatterPoint>,
    pub others: Vec<ScatterPoint>,
}

impl ScatterView {
    pub fn points(&self) -> impl Iterator<Item = &ScatterPoint> {
        self.highlighted.iter().chain(self.others.iter())
    }

    /// Distinct competitions in first-seen order, one series each when drawn.
    pub fn competitions(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.points()
            .map(|p| p.competition.clone().unwrap_or_else(|| "-".to_string()))
            .filter(|c| seen.insert(c.clone()))
            .collect()
    }

    /// Quadrant relative to the medians: (above x median, above y median).
    pub fn quadrant(&self, point: &ScatterPoint) -> Option<(bool, bool)> {
        Some((point.x >= self.median_x?, point.y >= self.median_y?))
    }
}

pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Medians come from the whole population, not just the highlighted players.
pub fn compare(
    population: &[&PlayerRecord],
    x_metric: Metric,
    y_metric: Metric,
    highlighted: &[String],
) -> ScatterView {
    let mut xs: Vec<f64> = population.iter().filter_map(|p| p.stat(x_metric)).collect();
    let mut ys: Vec<f64> = population.iter().filter_map(|p| p.stat(y_metric)).collect();

    let mut view = ScatterView {
        x_metric,
        y_metric,
        median_x: median(&mut xs),
        median_y: median(&mut ys),
        highlighted: Vec::new(),
        others: Vec::new(),
    };

    for player in population {
        let (Some(x), Some(y)) = (player.stat(x_metric), player.stat(y_metric)) else {
            continue;
        };
        let point = ScatterPoint {
            player: player.name.clone(),
            competition: player.competition.clone(),
            x,
            y,
        };
        if highlighted.iter().any(|h| h == &player.name) {
            view.highlighted.push(point);
        } else {
            view.others.push(point);
        }
    }

    view
}
