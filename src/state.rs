use std::sync::Arc;

use crate::dataset::{PlayerRecord, Snapshot, current_year};
use crate::engine::{self, ProfilingOutcome, ProfilingRequest};
use crate::filter::{self, FilterCriteria, FilterOptions, Range};
use crate::metrics::{Metric, MetricCatalog};
use crate::ranking::{DEFAULT_TOP_N, DEFAULT_WEIGHT, ProfileWeight};
use crate::scatter::{self, ScatterView};
use crate::reports_db::ScoutingReport;
use crate::scouting_db::{self, ScoutingEntry, ScoutingQuery, ScoutingSort};

pub const WEIGHT_STEP: f64 = 0.25;
pub const WEIGHT_SOFT_CAP: f64 = 10.0;
const MINUTES_STEPS: [f64; 5] = [0.0, 450.0, 900.0, 1350.0, 1800.0];
const LOG_CAPACITY: usize = 50;

/// Which range bound `<` / `>` move on the rating screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    AgeMin,
    AgeMax,
    HeightMin,
    HeightMax,
    MinutesMin,
    MinutesMax,
}

impl RangeBound {
    const ALL: [RangeBound; 6] = [
        RangeBound::AgeMin,
        RangeBound::AgeMax,
        RangeBound::HeightMin,
        RangeBound::HeightMax,
        RangeBound::MinutesMin,
        RangeBound::MinutesMax,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RangeBound::AgeMin => "age min",
            RangeBound::AgeMax => "age max",
            RangeBound::HeightMin => "height min",
            RangeBound::HeightMax => "height max",
            RangeBound::MinutesMin => "minutes min",
            RangeBound::MinutesMax => "minutes max",
        }
    }

    fn step(self) -> f64 {
        match self {
            RangeBound::AgeMin | RangeBound::AgeMax => 1.0,
            RangeBound::HeightMin | RangeBound::HeightMax => 2.0,
            RangeBound::MinutesMin | RangeBound::MinutesMax => 90.0,
        }
    }

    fn is_upper(self) -> bool {
        matches!(
            self,
            RangeBound::AgeMax | RangeBound::HeightMax | RangeBound::MinutesMax
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Rating,
    Compare,
    Scouting,
    Player,
}

/// Results pushed from the loader thread to the UI.
#[derive(Debug, Clone)]
pub enum Delta {
    Snapshot(Arc<Snapshot>),
    Scouting(Vec<ScoutingEntry>),
    Log(String),
}

/// Requests sent from the UI to the loader thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderCommand {
    Refresh,
    ForceRefresh,
    /// `force` revalidates the sheet instead of trusting the disk cache.
    LoadScouting { force: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileChoice {
    pub name: String,
    pub selected: bool,
    pub weight: f64,
}

pub struct AppState {
    pub screen: Screen,
    pub help_overlay: bool,
    pub catalog: MetricCatalog,
    pub snapshot: Option<Arc<Snapshot>>,
    pub options: FilterOptions,
    pub criteria: FilterCriteria,
    pub range_focus: RangeBound,
    pub choices: Vec<ProfileChoice>,
    pub profile_cursor: usize,
    pub top_n: usize,
    pub outcome: Option<ProfilingOutcome>,
    pub selected: usize,
    pub scatter_x: Metric,
    pub scatter_y: Metric,
    pub highlighted: Vec<String>,
    pub scatter: Option<ScatterView>,
    pub scouting: Vec<ScoutingEntry>,
    pub scouting_query: ScoutingQuery,
    pub scouting_selected: usize,
    pub reports: Vec<ScoutingReport>,
    /// Report being typed on the player screen, if any.
    pub draft: Option<String>,
    pub logs: Vec<String>,
}

impl AppState {
    pub fn new(catalog: MetricCatalog) -> Self {
        let choices = catalog
            .profiles()
            .iter()
            .enumerate()
            .map(|(idx, p)| ProfileChoice {
                name: p.name.clone(),
                // Start with the first two profiles ticked so the board is never blank.
                selected: idx < 2,
                weight: DEFAULT_WEIGHT,
            })
            .collect();
        Self {
            screen: Screen::Rating,
            help_overlay: false,
            catalog,
            snapshot: None,
            options: FilterOptions::default(),
            criteria: FilterCriteria::default(),
            range_focus: RangeBound::AgeMin,
            choices,
            profile_cursor: 0,
            top_n: DEFAULT_TOP_N,
            outcome: None,
            selected: 0,
            scatter_x: Metric::NpXg90,
            scatter_y: Metric::Xa90,
            highlighted: Vec::new(),
            scatter: None,
            scouting: Vec::new(),
            scouting_query: ScoutingQuery::default(),
            scouting_selected: 0,
            reports: Vec::new(),
            draft: None,
            logs: Vec::new(),
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push(msg.into());
        if self.logs.len() > LOG_CAPACITY {
            let overflow = self.logs.len() - LOG_CAPACITY;
            self.logs.drain(0..overflow);
        }
    }

    /// Installs a new snapshot and recomputes everything derived from it.
    pub fn set_snapshot(&mut self, snapshot: Arc<Snapshot>) {
        self.options = filter::options(&snapshot);
        self.push_log(format!(
            "[INFO] Loaded {} rows from {}",
            snapshot.len(),
            snapshot.source
        ));
        self.snapshot = Some(snapshot);
        self.recompute();
    }

    pub fn request(&self) -> ProfilingRequest {
        ProfilingRequest {
            selection: self
                .choices
                .iter()
                .filter(|c| c.selected)
                .map(|c| ProfileWeight::new(c.name.clone(), c.weight))
                .collect(),
            top_n: self.top_n,
        }
    }

    /// Full pass over the current population; previous results are discarded.
    pub fn recompute(&mut self) {
        let Some(snapshot) = self.snapshot.clone() else {
            return;
        };
        let outcome = engine::run(&snapshot, &self.criteria, &self.catalog, &self.request());
        for warning in outcome.warnings() {
            if !self.logs.iter().any(|l| l.ends_with(&warning)) {
                self.push_log(format!("[WARN] {warning}"));
            }
        }
        let population = filter::apply(&snapshot, &self.criteria);
        self.scatter = Some(scatter::compare(
            &population,
            self.scatter_x,
            self.scatter_y,
            &self.highlighted,
        ));
        self.outcome = Some(outcome);
        self.clamp_selection();
    }

    pub fn leaderboard_len(&self) -> usize {
        self.outcome
            .as_ref()
            .map(|o| o.leaderboard.rows.len())
            .unwrap_or(0)
    }

    /// The exact population row behind the selected leaderboard entry.
    pub fn selected_player(&self) -> Option<&PlayerRecord> {
        let row = self.outcome.as_ref()?.leaderboard.rows.get(self.selected)?;
        let snapshot = self.snapshot.as_ref()?;
        filter::apply(snapshot, &self.criteria)
            .get(row.population_index)
            .copied()
    }

    pub fn clamp_selection(&mut self) {
        let len = self.leaderboard_len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
        let scouting_len = self.scouting_rows().len();
        if scouting_len == 0 {
            self.scouting_selected = 0;
        } else if self.scouting_selected >= scouting_len {
            self.scouting_selected = scouting_len - 1;
        }
    }

    pub fn select_next(&mut self) {
        match self.screen {
            Screen::Scouting => self.scouting_selected = self.scouting_selected.saturating_add(1),
            _ => self.selected = self.selected.saturating_add(1),
        }
        self.clamp_selection();
    }

    pub fn select_prev(&mut self) {
        match self.screen {
            Screen::Scouting => self.scouting_selected = self.scouting_selected.saturating_sub(1),
            _ => self.selected = self.selected.saturating_sub(1),
        }
    }

    pub fn move_profile_cursor(&mut self, forward: bool) {
        let len = self.choices.len();
        if len == 0 {
            return;
        }
        self.profile_cursor = if forward {
            (self.profile_cursor + 1) % len
        } else {
            (self.profile_cursor + len - 1) % len
        };
    }

    pub fn toggle_profile(&mut self) {
        if let Some(choice) = self.choices.get_mut(self.profile_cursor) {
            choice.selected = !choice.selected;
            self.recompute();
        }
    }

    pub fn adjust_weight(&mut self, delta: f64) {
        if let Some(choice) = self.choices.get_mut(self.profile_cursor) {
            choice.weight = (choice.weight + delta).clamp(0.0, WEIGHT_SOFT_CAP);
            self.recompute();
        }
    }

    pub fn cycle_position(&mut self) {
        self.criteria.positions = cycle_single(&self.options.positions, &self.criteria.positions);
        self.recompute();
    }

    pub fn cycle_competition(&mut self) {
        self.criteria.competitions =
            cycle_single(&self.options.competitions, &self.criteria.competitions);
        self.recompute();
    }

    pub fn cycle_team(&mut self) {
        self.criteria.teams = cycle_single(&self.options.teams, &self.criteria.teams);
        self.recompute();
    }

    pub fn cycle_season(&mut self) {
        self.criteria.seasons = cycle_single(&self.options.seasons, &self.criteria.seasons);
        self.recompute();
    }

    pub fn cycle_range_focus(&mut self) {
        let idx = RangeBound::ALL
            .iter()
            .position(|b| *b == self.range_focus)
            .unwrap_or(0);
        self.range_focus = RangeBound::ALL[(idx + 1) % RangeBound::ALL.len()];
    }

    /// Moves the focused bound one step inside the snapshot's extent. A bound
    /// pushed back to the edge of the extent becomes open again.
    pub fn step_range(&mut self, up: bool) {
        let focus = self.range_focus;
        let (extent, range) = match focus {
            RangeBound::AgeMin | RangeBound::AgeMax => (self.options.age, &mut self.criteria.age),
            RangeBound::HeightMin | RangeBound::HeightMax => {
                (self.options.height, &mut self.criteria.height)
            }
            RangeBound::MinutesMin | RangeBound::MinutesMax => {
                (self.options.minutes, &mut self.criteria.minutes)
            }
        };
        let (Some(lo), Some(hi)) = (extent.min, extent.max) else {
            return;
        };
        let delta = if up { focus.step() } else { -focus.step() };
        if focus.is_upper() {
            let floor = range.min.unwrap_or(lo).clamp(lo, hi);
            let next = (range.max.unwrap_or(hi) + delta).clamp(floor, hi);
            range.max = (next < hi).then_some(next);
        } else {
            let ceiling = range.max.unwrap_or(hi).clamp(lo, hi);
            let next = (range.min.unwrap_or(lo) + delta).clamp(lo, ceiling);
            range.min = (next > lo).then_some(next);
        }
        self.recompute();
    }

    pub fn reset_filters(&mut self) {
        self.criteria = FilterCriteria::default();
        self.recompute();
    }

    pub fn cycle_min_minutes(&mut self) {
        let current = self.criteria.minutes.min.unwrap_or(0.0);
        let next_idx = MINUTES_STEPS
            .iter()
            .position(|m| *m > current)
            .unwrap_or(0);
        let next = MINUTES_STEPS[next_idx];
        self.criteria.minutes.min = (next > 0.0).then_some(next);
        self.recompute();
    }

    pub fn cycle_scatter_axis(&mut self, x_axis: bool) {
        let Some(snapshot) = self.snapshot.as_ref() else {
            return;
        };
        let columns: Vec<Metric> = snapshot.columns().iter().copied().collect();
        if columns.is_empty() {
            return;
        }
        let current = if x_axis { self.scatter_x } else { self.scatter_y };
        let next = columns
            .iter()
            .position(|m| *m == current)
            .map(|idx| columns[(idx + 1) % columns.len()])
            .unwrap_or(columns[0]);
        if x_axis {
            self.scatter_x = next;
        } else {
            self.scatter_y = next;
        }
        self.recompute();
    }

    pub fn toggle_highlight(&mut self) {
        let Some(name) = self
            .outcome
            .as_ref()
            .and_then(|o| o.leaderboard.rows.get(self.selected))
            .map(|r| r.player.clone())
        else {
            return;
        };
        if let Some(pos) = self.highlighted.iter().position(|h| *h == name) {
            self.highlighted.remove(pos);
        } else {
            self.highlighted.push(name);
        }
        self.recompute();
    }

    pub fn set_scouting(&mut self, entries: Vec<ScoutingEntry>) {
        self.push_log(format!("[INFO] Loaded {} scouting entries", entries.len()));
        self.scouting = entries;
        self.clamp_selection();
    }

    pub fn scouting_rows(&self) -> Vec<&ScoutingEntry> {
        scouting_db::query(&self.scouting, &self.scouting_query, current_year())
    }

    pub fn cycle_scouting_sort(&mut self) {
        self.scouting_query.sort = match self.scouting_query.sort {
            ScoutingSort::Age => ScoutingSort::ContractEnd,
            ScoutingSort::ContractEnd => ScoutingSort::Age,
        };
    }

    pub fn cycle_scouting_position(&mut self) {
        let positions: Vec<String> = self
            .scouting
            .iter()
            .filter_map(|e| e.position.clone())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        self.scouting_query.positions = cycle_single(&positions, &self.scouting_query.positions);
        self.clamp_selection();
    }

    pub fn filter_summary(&self) -> String {
        let list = |v: &[String]| {
            if v.is_empty() {
                "All".to_string()
            } else {
                v.join(", ")
            }
        };
        let range = |r: &Range| match (r.min, r.max) {
            (None, None) => "any".to_string(),
            (Some(lo), None) => format!("{lo:.0}+"),
            (None, Some(hi)) => format!("<={hi:.0}"),
            (Some(lo), Some(hi)) => format!("{lo:.0}-{hi:.0}"),
        };
        format!(
            "Pos: {} | Team: {} | Comp: {} | Season: {} | Age: {} | Height: {} | Min: {} | [{}]",
            list(&self.criteria.positions),
            list(&self.criteria.teams),
            list(&self.criteria.competitions),
            list(&self.criteria.seasons),
            range(&self.criteria.age),
            range(&self.criteria.height),
            range(&self.criteria.minutes),
            self.range_focus.label()
        )
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::Snapshot(snapshot) => {
            let unchanged = state
                .snapshot
                .as_ref()
                .is_some_and(|current| Arc::ptr_eq(current, &snapshot));
            if !unchanged {
                state.set_snapshot(snapshot);
            }
        }
        Delta::Scouting(entries) => state.set_scouting(entries),
        Delta::Log(msg) => state.push_log(msg),
    }
}

/// All -> first option -> ... -> last option -> All.
fn cycle_single(options: &[String], current: &[String]) -> Vec<String> {
    if options.is_empty() {
        return Vec::new();
    }
    let next = match current.first() {
        None => Some(0),
        Some(cur) => options
            .iter()
            .position(|o| o == cur)
            .map(|idx| idx + 1)
            .filter(|idx| *idx < options.len()),
    };
    next.map(|idx| vec![options[idx].clone()]).unwrap_or_default()
}
