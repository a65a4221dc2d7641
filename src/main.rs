use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Local;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::widgets::{Axis, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph, Wrap};
use rusqlite::Connection;

use scout_terminal::config::{self, AppConfig};
use scout_terminal::dataset::current_year;
use scout_terminal::export::{self, DEFAULT_LINES_PER_PAGE, format_score};
use scout_terminal::logging;
use scout_terminal::provider::DataProvider;
use scout_terminal::ranking::LeaderboardStatus;
use scout_terminal::reports_db;
use scout_terminal::scouting_db::{self, ScoutingSort};
use scout_terminal::sheet_fetch;
use scout_terminal::state::{AppState, Delta, ProviderCommand, Screen, WEIGHT_STEP, apply_delta};

const SHEET_MAX_AGE: Duration = Duration::from_secs(300);

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
    refresh_every: Duration,
    last_refresh: Instant,
    export_dir: PathBuf,
    reports: Option<Connection>,
}

impl App {
    fn new(state: AppState, cfg: &AppConfig, cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        let reports = cfg
            .reports_db
            .clone()
            .or_else(reports_db::default_db_path)
            .and_then(|path| match reports_db::open_db(&path) {
                Ok(conn) => Some(conn),
                Err(err) => {
                    tracing::warn!(error = %err, "reports database unavailable");
                    None
                }
            });
        Self {
            state,
            should_quit: false,
            cmd_tx,
            refresh_every: cfg.snapshot_ttl,
            last_refresh: Instant::now(),
            export_dir: cfg.export_dir.clone(),
            reports,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.draft.is_some() {
            self.on_draft_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.state.screen = Screen::Rating,
            KeyCode::Char('2') => self.state.screen = Screen::Compare,
            KeyCode::Char('3') => {
                self.state.screen = Screen::Scouting;
                if self.state.scouting.is_empty() {
                    self.send(ProviderCommand::LoadScouting { force: false }, true);
                }
            }
            KeyCode::Char('d') | KeyCode::Enter => {
                if self.state.selected_player().is_some() {
                    self.state.screen = Screen::Player;
                    self.load_reports();
                }
            }
            KeyCode::Char('b') | KeyCode::Esc => self.state.screen = Screen::Rating,
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char(']') | KeyCode::Tab => self.state.move_profile_cursor(true),
            KeyCode::Char('[') | KeyCode::BackTab => self.state.move_profile_cursor(false),
            KeyCode::Char(' ') => self.state.toggle_profile(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.state.adjust_weight(WEIGHT_STEP),
            KeyCode::Char('-') => self.state.adjust_weight(-WEIGHT_STEP),
            KeyCode::Char('p') => {
                if self.state.screen == Screen::Scouting {
                    self.state.cycle_scouting_position();
                } else {
                    self.state.cycle_position();
                }
            }
            KeyCode::Char('c') => self.state.cycle_competition(),
            KeyCode::Char('m') => self.state.cycle_min_minutes(),
            KeyCode::Char('t') => self.state.cycle_team(),
            KeyCode::Char('n') => self.state.cycle_season(),
            KeyCode::Char('f') => self.state.cycle_range_focus(),
            KeyCode::Char('<') | KeyCode::Char(',') => self.state.step_range(false),
            KeyCode::Char('>') | KeyCode::Char('.') => self.state.step_range(true),
            KeyCode::Char('0') => self.state.reset_filters(),
            KeyCode::Char('x') => self.state.cycle_scatter_axis(true),
            KeyCode::Char('y') => self.state.cycle_scatter_axis(false),
            KeyCode::Char('h') => self.state.toggle_highlight(),
            KeyCode::Char('s') => self.state.cycle_scouting_sort(),
            KeyCode::Char('r') => self.send(ProviderCommand::Refresh, true),
            KeyCode::Char('R') => {
                self.send(ProviderCommand::ForceRefresh, true);
                if self.state.screen == Screen::Scouting {
                    self.send(ProviderCommand::LoadScouting { force: true }, false);
                }
            }
            KeyCode::Char('e') => self.export_current(),
            KeyCode::Char('w') => {
                if self.state.screen == Screen::Player {
                    self.state.draft = Some(String::new());
                }
            }
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            _ => {}
        }
    }

    fn on_draft_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.state.draft = None,
            KeyCode::Enter => self.save_draft(),
            KeyCode::Backspace => {
                if let Some(draft) = self.state.draft.as_mut() {
                    draft.pop();
                }
            }
            KeyCode::Char(ch) => {
                if let Some(draft) = self.state.draft.as_mut() {
                    draft.push(ch);
                }
            }
            _ => {}
        }
    }

    fn save_draft(&mut self) {
        let Some(body) = self.state.draft.take() else {
            return;
        };
        let Some(player) = self.state.selected_player().map(|p| p.name.clone()) else {
            return;
        };
        let Some(conn) = &self.reports else {
            self.state.push_log("[WARN] Reports database unavailable");
            return;
        };
        match reports_db::add_report(conn, &player, None, &body) {
            Ok(report) => {
                tracing::info!(player = %report.player, id = report.id, "report saved");
                self.state
                    .push_log(format!("[INFO] Report saved for {}", report.player));
                self.load_reports();
            }
            Err(err) => self.state.push_log(format!("[WARN] {err}")),
        }
    }

    fn load_reports(&mut self) {
        let Some(conn) = &self.reports else {
            self.state.reports.clear();
            return;
        };
        let Some(player) = self.state.selected_player().map(|p| p.name.clone()) else {
            self.state.reports.clear();
            return;
        };
        match reports_db::reports_for_player(conn, &player) {
            Ok(reports) => self.state.reports = reports,
            Err(err) => {
                self.state.reports.clear();
                self.state.push_log(format!("[WARN] {err}"));
            }
        }
    }

    fn export_current(&mut self) {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let (title, table) = match self.state.screen {
            Screen::Scouting => {
                let rows = self.state.scouting_rows();
                (
                    "Scouting database".to_string(),
                    export::scouting_table(&rows, current_year()),
                )
            }
            _ => {
                let Some(outcome) = &self.state.outcome else {
                    self.state.push_log("[INFO] Nothing to export yet");
                    return;
                };
                if outcome.status() != LeaderboardStatus::Ranked {
                    self.state.push_log("[INFO] Leaderboard is empty, nothing to export");
                    return;
                }
                ("Player rating".to_string(), export::leaderboard_table(outcome))
            }
        };
        let slug = if self.state.screen == Screen::Scouting {
            "scouting"
        } else {
            "rating"
        };
        if let Err(err) = std::fs::create_dir_all(&self.export_dir) {
            self.state.push_log(format!("[WARN] Export dir: {err}"));
            return;
        }
        let xlsx = self.export_dir.join(format!("{slug}_{stamp}.xlsx"));
        let txt = self.export_dir.join(format!("{slug}_{stamp}.txt"));
        let result = export::write_xlsx(&xlsx, slug, &table).and_then(|_| {
            export::write_paginated(&txt, &title, &table, DEFAULT_LINES_PER_PAGE)
        });
        match result {
            Ok(()) => self
                .state
                .push_log(format!("[INFO] Exported {} and {}", xlsx.display(), txt.display())),
            Err(err) => self.state.push_log(format!("[WARN] Export failed: {err}")),
        }
    }

    fn send(&mut self, cmd: ProviderCommand, announce: bool) {
        let Some(tx) = &self.cmd_tx else {
            if announce {
                self.state.push_log("[INFO] Data loader unavailable");
            }
            return;
        };
        if tx.send(cmd).is_err() {
            if announce {
                self.state.push_log("[WARN] Data loader request failed");
            }
        } else {
            if announce {
                self.state.push_log("[INFO] Data request sent");
            }
            if matches!(cmd, ProviderCommand::Refresh | ProviderCommand::ForceRefresh) {
                self.last_refresh = Instant::now();
            }
        }
    }

    fn maybe_refresh(&mut self) {
        if self.last_refresh.elapsed() >= self.refresh_every {
            self.send(ProviderCommand::Refresh, false);
        }
    }
}

/// Owns the provider on a worker thread so slow fetches never block drawing.
fn spawn_loader(cfg: AppConfig, tx: mpsc::Sender<Delta>, cmd_rx: mpsc::Receiver<ProviderCommand>) {
    thread::spawn(move || {
        let provider = cfg.provider();
        for cmd in cmd_rx {
            let delta = match cmd {
                ProviderCommand::Refresh | ProviderCommand::ForceRefresh => {
                    if cmd == ProviderCommand::ForceRefresh {
                        provider.invalidate();
                    }
                    match provider.snapshot() {
                        Ok(snapshot) => Delta::Snapshot(snapshot),
                        Err(err) => {
                            tracing::warn!(error = %err, "snapshot refresh failed");
                            Delta::Log(format!("[WARN] Refresh failed: {err}"))
                        }
                    }
                }
                ProviderCommand::LoadScouting { force } => match &cfg.sheet {
                    Some(sheet) => match sheet_fetch::fetch_sheet(
                        &sheet.spreadsheet_id,
                        &sheet.range,
                        &sheet.api_key,
                        if force { Duration::ZERO } else { SHEET_MAX_AGE },
                    ) {
                        Ok(table) => Delta::Scouting(scouting_db::entries_from_sheet(&table)),
                        Err(err) => {
                            tracing::warn!(error = %err, "scouting sheet fetch failed");
                            Delta::Log(format!("[WARN] Scouting sheet: {err}"))
                        }
                    },
                    None => Delta::Log("[INFO] Scouting sheet not configured".to_string()),
                },
            };
            if tx.send(delta).is_err() {
                return;
            }
        }
    });
}

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init_file();

    let cfg = AppConfig::from_env();
    let catalog = cfg.catalog()?;
    let mut state = AppState::new(catalog);
    state.top_n = cfg.top_n;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_loader(cfg.clone(), tx, cmd_rx);

    let mut app = App::new(state, &cfg, Some(cmd_tx));
    app.send(ProviderCommand::Refresh, false);
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        app.maybe_refresh();

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Rating => render_rating(frame, chunks[1], &app.state),
        Screen::Compare => render_compare(frame, chunks[1], &app.state),
        Screen::Scouting => render_scouting(frame, chunks[1], &app.state),
        Screen::Player => render_player(frame, chunks[1], &app.state),
    }

    let console = Paragraph::new(console_text(&app.state))
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(&app.state));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let title = match state.screen {
        Screen::Rating => format!("PLAYER RATING | {}", state.filter_summary()),
        Screen::Compare => format!("PLAYER COMPARE | {}", state.filter_summary()),
        Screen::Scouting => format!(
            "SCOUTING DB | Sort: {} | Pos: {}",
            scouting_sort_label(state.scouting_query.sort),
            state
                .scouting_query
                .positions
                .first()
                .map(String::as_str)
                .unwrap_or("All")
        ),
        Screen::Player => "PLAYER DETAIL".to_string(),
    };
    let source = state
        .snapshot
        .as_ref()
        .map(|s| {
            format!(
                "{} | {} rows | fetched {}",
                s.source,
                s.len(),
                s.fetched_at.format("%H:%M:%S")
            )
        })
        .unwrap_or_else(|| "loading...".to_string());
    format!("  SCOUT  {title}\n         {source}")
}

fn footer_text(state: &AppState) -> String {
    if state.draft.is_some() {
        return "Type report | Enter Save | Esc Cancel".to_string();
    }
    match state.screen {
        Screen::Rating => {
            "1/2/3 Screens | j/k Move | [/] Profile | Space Toggle | +/- Weight | p/c/m Filters | Enter Detail | e Export | ? Help | q Quit".to_string()
        }
        Screen::Compare => {
            "1/2/3 Screens | x/y Axes | h Highlight | j/k Move | p/c/m Filters | ? Help | q Quit".to_string()
        }
        Screen::Scouting => {
            "1/2/3 Screens | j/k Move | s Sort | p Position | R Reload | e Export | ? Help | q Quit".to_string()
        }
        Screen::Player => "b/Esc Back | w Write report | ? Help | q Quit".to_string(),
    }
}

fn render_rating(frame: &mut Frame, area: Rect, state: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(20)])
        .split(area);

    let profiles = Paragraph::new(profile_list_text(state))
        .block(Block::default().title("Profiles").borders(Borders::ALL));
    frame.render_widget(profiles, columns[0]);

    render_leaderboard(frame, columns[1], state);
}

fn profile_list_text(state: &AppState) -> String {
    state
        .choices
        .iter()
        .enumerate()
        .map(|(idx, choice)| {
            let cursor = if idx == state.profile_cursor { '>' } else { ' ' };
            let mark = if choice.selected { 'x' } else { ' ' };
            let usable = state
                .outcome
                .as_ref()
                .map(|o| o.skipped.iter().all(|s| s.profile() != choice.name))
                .unwrap_or(true);
            let suffix = if usable { "" } else { " (n/a)" };
            format!("{cursor}[{mark}] {:<16} x{:.2}{suffix}", choice.name, choice.weight)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_leaderboard(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Leaderboard").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(outcome) = &state.outcome else {
        render_placeholder(frame, inner, "Loading dataset...");
        return;
    };
    match outcome.status() {
        LeaderboardStatus::EmptyPopulation => {
            render_placeholder(frame, inner, "No player matches the current filters");
            return;
        }
        LeaderboardStatus::NoProfilesSelected => {
            render_placeholder(frame, inner, "Select at least one profile (Space)");
            return;
        }
        LeaderboardStatus::Ranked => {}
    }

    let board = &outcome.leaderboard;
    let mut widths = vec![
        Constraint::Length(4),
        Constraint::Min(18),
        Constraint::Length(12),
        Constraint::Length(16),
    ];
    widths.extend(board.profiles.iter().map(|_| Constraint::Length(11)));
    widths.push(Constraint::Length(9));
    widths.push(Constraint::Length(9));

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(inner);

    let mut header = vec![
        "#".to_string(),
        "Player".to_string(),
        "Position".to_string(),
        "Team".to_string(),
    ];
    header.extend(board.profiles.iter().cloned());
    header.push("Weighted".to_string());
    header.push("Total".to_string());
    render_row(
        frame,
        sections[0],
        &widths,
        &header,
        Style::default().add_modifier(Modifier::BOLD),
    );

    let list_area = sections[1];
    let visible = list_area.height as usize;
    let (start, end) = visible_range(state.selected, board.rows.len(), visible);
    for (i, idx) in (start..end).enumerate() {
        let row = &board.rows[idx];
        let row_area = Rect {
            x: list_area.x,
            y: list_area.y + i as u16,
            width: list_area.width,
            height: 1,
        };
        let mut style = if idx == state.selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        if state.highlighted.contains(&row.player) {
            style = style.fg(Color::Yellow);
        }
        let mut cells = vec![
            (idx + 1).to_string(),
            row.player.clone(),
            row.position.clone(),
            row.team.clone().unwrap_or_else(|| "-".to_string()),
        ];
        cells.extend(row.profile_scores.iter().map(|s| format_score(*s)));
        cells.push(format_score(Some(row.composite)));
        cells.push(format_score(Some(row.total)));
        if idx == state.selected {
            frame.render_widget(Block::default().style(style), row_area);
        }
        render_row(frame, row_area, &widths, &cells, style);
    }
}

fn render_row(frame: &mut Frame, area: Rect, widths: &[Constraint], cells: &[String], style: Style) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths.to_vec())
        .split(area);
    for (col, text) in cols.iter().zip(cells) {
        render_cell_text(frame, *col, text, style);
    }
}

fn render_compare(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Compare").borders(Borders::ALL);
    let Some(view) = &state.scatter else {
        frame.render_widget(block, area);
        return;
    };
    let others: Vec<(f64, f64)> = view.others.iter().map(|p| (p.x, p.y)).collect();
    let highlighted: Vec<(f64, f64)> = view.highlighted.iter().map(|p| (p.x, p.y)).collect();
    if others.is_empty() && highlighted.is_empty() {
        let inner = block.inner(area);
        frame.render_widget(block, area);
        render_placeholder(frame, inner, "No player has both metrics");
        return;
    }

    let (x_min, x_max) = bounds(view.points().map(|p| p.x));
    let (y_min, y_max) = bounds(view.points().map(|p| p.y));
    let median_x: Vec<(f64, f64)> = view
        .median_x
        .map(|m| vec![(m, y_min), (m, y_max)])
        .unwrap_or_default();
    let median_y: Vec<(f64, f64)> = view
        .median_y
        .map(|m| vec![(x_min, m), (x_max, m)])
        .unwrap_or_default();

    let datasets = vec![
        Dataset::default()
            .name("median")
            .marker(Marker::Dot)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::DarkGray))
            .data(&median_x),
        Dataset::default()
            .marker(Marker::Dot)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::DarkGray))
            .data(&median_y),
        Dataset::default()
            .name("players")
            .marker(Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Cyan))
            .data(&others),
        Dataset::default()
            .name("highlighted")
            .marker(Marker::Braille)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Yellow))
            .data(&highlighted),
    ];

    let axis_labels = |min: f64, max: f64| {
        vec![
            Span::raw(format!("{min:.2}")),
            Span::raw(format!("{:.2}", (min + max) / 2.0)),
            Span::raw(format!("{max:.2}")),
        ]
    };
    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title(view.x_metric.column())
                .bounds([x_min, x_max])
                .labels(axis_labels(x_min, x_max)),
        )
        .y_axis(
            Axis::default()
                .title(view.y_metric.column())
                .bounds([y_min, y_max])
                .labels(axis_labels(y_min, y_max)),
        );
    frame.render_widget(chart, area);
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    if (max - min).abs() < f64::EPSILON {
        return (min - 0.5, max + 0.5);
    }
    (min, max)
}

fn render_scouting(frame: &mut Frame, area: Rect, state: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(40)])
        .split(area);

    let block = Block::default().title("Scouting database").borders(Borders::ALL);
    let inner = block.inner(columns[0]);
    frame.render_widget(block, columns[0]);

    let rows = state.scouting_rows();
    if rows.is_empty() {
        render_placeholder(frame, inner, "No scouting entries (press R to reload)");
    } else {
        let widths = [
            Constraint::Min(16),
            Constraint::Length(12),
            Constraint::Length(5),
            Constraint::Length(12),
            Constraint::Length(8),
            Constraint::Min(14),
            Constraint::Length(14),
        ];
        let table = export::scouting_table(&rows, current_year());
        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(1)])
            .split(inner);
        render_row(
            frame,
            sections[0],
            &widths,
            &table.header,
            Style::default().add_modifier(Modifier::BOLD),
        );
        let list_area = sections[1];
        let (start, end) =
            visible_range(state.scouting_selected, table.rows.len(), list_area.height as usize);
        for (i, idx) in (start..end).enumerate() {
            let row_area = Rect {
                x: list_area.x,
                y: list_area.y + i as u16,
                width: list_area.width,
                height: 1,
            };
            let style = if idx == state.scouting_selected {
                Style::default().fg(Color::White).bg(Color::DarkGray)
            } else {
                Style::default()
            };
            if idx == state.scouting_selected {
                frame.render_widget(Block::default().style(style), row_area);
            }
            render_row(frame, row_area, &widths, &table.rows[idx], style);
        }
    }

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(12), Constraint::Min(3)])
        .split(columns[1]);

    let counts = scouting_db::position_counts(&rows)
        .into_iter()
        .map(|(position, count)| format!("{position:<24} {count:>4}"))
        .collect::<Vec<_>>()
        .join("\n");
    let counts = Paragraph::new(counts)
        .block(Block::default().title("By position").borders(Borders::ALL));
    frame.render_widget(counts, side[0]);

    let report = rows
        .get(state.scouting_selected)
        .and_then(|e| e.report.clone())
        .unwrap_or_else(|| "No report".to_string());
    let report = Paragraph::new(report)
        .wrap(Wrap { trim: true })
        .block(Block::default().title("Report").borders(Borders::ALL));
    frame.render_widget(report, side[1]);
}

fn render_player(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(player) = state.selected_player() else {
        render_placeholder(frame, area, "No player selected");
        return;
    };
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let text_or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    let number_or_dash = |v: Option<f64>| v.map(|n| format!("{n:.0}")).unwrap_or_else(|| "-".to_string());
    let mut lines = vec![
        format!("Name:        {}", player.name),
        format!("Position:    {}", player.position_label()),
        format!("Secondary:   {}", text_or_dash(&player.secondary_position)),
        format!("Team:        {}", text_or_dash(&player.team)),
        format!("Competition: {}", text_or_dash(&player.competition)),
        format!("Season:      {}", text_or_dash(&player.season)),
        format!(
            "Age:         {}",
            player.age.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string())
        ),
        format!("Height:      {}", number_or_dash(player.height)),
        format!("Minutes:     {}", number_or_dash(player.minutes)),
        String::new(),
    ];
    if let Some(row) = state
        .outcome
        .as_ref()
        .and_then(|o| o.leaderboard.rows.get(state.selected).map(|r| (o, r)))
    {
        let (outcome, row) = row;
        for (name, score) in outcome.leaderboard.profiles.iter().zip(&row.profile_scores) {
            lines.push(format!("{name:<16} {}", format_score(*score)));
        }
        lines.push(format!("{:<16} {}", "Weighted", format_score(Some(row.composite))));
        lines.push(format!("{:<16} {}", "Total", format_score(Some(row.total))));
    }
    lines.push(String::new());
    for profile in state.catalog.profiles() {
        for metric in profile.metrics {
            let value = player
                .stat(metric)
                .map(|v| format!("{v:.2}"))
                .unwrap_or_else(|| "-".to_string());
            lines.push(format!("{:<28} {value}", metric.column()));
        }
    }
    let detail = Paragraph::new(lines.join("\n"))
        .block(Block::default().title("Player").borders(Borders::ALL));
    frame.render_widget(detail, columns[0]);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(5)])
        .split(columns[1]);

    let reports = if state.reports.is_empty() {
        "No reports yet".to_string()
    } else {
        state
            .reports
            .iter()
            .map(|r| format!("{} | {}\n{}\n", r.created_at, r.image, r.body))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let reports = Paragraph::new(reports)
        .wrap(Wrap { trim: true })
        .block(Block::default().title("Reports").borders(Borders::ALL));
    frame.render_widget(reports, sections[0]);

    let draft_style = if state.draft.is_some() {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let draft = Paragraph::new(
        state
            .draft
            .clone()
            .unwrap_or_else(|| "Press w to write a report".to_string()),
    )
    .style(draft_style)
    .wrap(Wrap { trim: false })
    .block(Block::default().title("New report").borders(Borders::ALL));
    frame.render_widget(draft, sections[1]);
}

fn render_placeholder(frame: &mut Frame, area: Rect, text: &str) {
    let empty = Paragraph::new(text.to_string()).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(empty, area);
}

fn render_cell_text(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    let text_area = Rect {
        x: area.x,
        y: area.y + (area.height / 2),
        width: area.width,
        height: 1.min(area.height),
    };
    let paragraph = Paragraph::new(text.to_string()).style(style);
    frame.render_widget(paragraph, text_area);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    let skip = state.logs.len().saturating_sub(3);
    state.logs[skip..].join("\n")
}

fn scouting_sort_label(sort: ScoutingSort) -> &'static str {
    match sort {
        ScoutingSort::Age => "AGE",
        ScoutingSort::ContractEnd => "CONTRACT END",
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 80, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Scout Terminal - Help",
        "",
        "Global:",
        "  1 / 2 / 3    Rating / Compare / Scouting DB",
        "  Enter / d    Player detail",
        "  b / Esc      Back",
        "  r / R        Refresh data / force refetch",
        "  e            Export current table (xlsx + txt)",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Rating:",
        "  j/k or ↑/↓   Move",
        "  [ / ]        Previous / next profile",
        "  Space        Toggle profile",
        "  + / -        Adjust profile weight",
        "  p / c / m    Cycle position / competition / min minutes",
        "  t / n        Cycle team / season",
        "  f            Pick range: age, height, minutes (min/max)",
        "  < / >        Step picked range bound",
        "  0            Clear filters",
        "",
        "Compare:",
        "  x / y        Cycle axis metric",
        "  h            Highlight selected player",
        "",
        "Scouting DB:",
        "  s            Sort by age / contract end",
        "  p            Cycle position",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
