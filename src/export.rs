use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::engine::ProfilingOutcome;
use crate::scouting_db::ScoutingEntry;

pub const DEFAULT_LINES_PER_PAGE: usize = 50;

/// Header row plus data rows, already formatted as text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Columns written to spreadsheets as numbers. Everything else stays text.
    pub numeric_columns: Vec<usize>,
}

impl Table {
    /// The cell as a number, only for numeric columns.
    pub fn number_at(&self, row: &[String], col: usize) -> Option<f64> {
        if !self.numeric_columns.contains(&col) {
            return None;
        }
        row.get(col)?
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }
}

pub fn format_score(score: Option<f64>) -> String {
    match score {
        Some(v) => format!("{v:.2}"),
        None => "-".to_string(),
    }
}

pub fn leaderboard_table(outcome: &ProfilingOutcome) -> Table {
    let board = &outcome.leaderboard;
    let mut header = vec!["Rank".to_string(), "Player".to_string(), "Position".to_string()];
    header.extend(board.profiles.iter().cloned());
    header.push("Weighted Score".to_string());
    header.push("Total Score".to_string());

    // Rank, then every score column after Player and Position.
    let numeric_columns = std::iter::once(0).chain(3..header.len()).collect();

    let rows = board
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let mut cells = vec![
                (idx + 1).to_string(),
                row.player.clone(),
                row.position.clone(),
            ];
            cells.extend(row.profile_scores.iter().map(|s| format_score(*s)));
            cells.push(format_score(Some(row.composite)));
            cells.push(format_score(Some(row.total)));
            cells
        })
        .collect();

    Table {
        header,
        rows,
        numeric_columns,
    }
}

pub fn scouting_table(entries: &[&ScoutingEntry], current_year: i32) -> Table {
    let header = ["Player", "Prénom", "Age", "Poste", "Pied", "Club", "Fin de contrat"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    let text = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    let rows = entries
        .iter()
        .map(|e| {
            vec![
                e.player.clone(),
                text(&e.first_name),
                e.age(current_year)
                    .map(|a| a.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                text(&e.position),
                text(&e.foot),
                text(&e.club),
                text(&e.contract_end),
            ]
        })
        .collect();
    Table {
        header,
        rows,
        numeric_columns: vec![2],
    }
}

pub fn write_xlsx(path: &Path, sheet_name: &str, table: &Table) -> Result<()> {
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name)?;
        write_rows(sheet, table)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("save workbook {}", path.display()))?;
    tracing::info!(path = %path.display(), rows = table.rows.len(), "xlsx export written");
    Ok(())
}

fn write_rows(worksheet: &mut Worksheet, table: &Table) -> Result<()> {
    let bold = Format::new().set_bold();
    for (col_idx, value) in table.header.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col_idx as u16, value, &bold)
            .with_context(|| format!("write header cell {col_idx}"))?;
    }
    for (row_idx, row) in table.rows.iter().enumerate() {
        let r = row_idx as u32 + 1;
        for (col_idx, value) in row.iter().enumerate() {
            let c = col_idx as u16;
            match table.number_at(row, col_idx) {
                Some(num) => worksheet.write_number(r, c, num),
                None => worksheet.write_string(r, c, value),
            }
            .with_context(|| format!("write cell ({r},{c})"))?;
        }
    }
    Ok(())
}

/// Fixed-width text pages. The header repeats at the top of every page;
/// pages are separated by a form feed.
pub fn render_paginated(title: &str, table: &Table, lines_per_page: usize) -> String {
    let widths = column_widths(table);
    let header_line = format_line(&table.header, &widths);
    let rule = "-".repeat(header_line.chars().count());
    // Title, header and rule take three lines on each page.
    let per_page = lines_per_page.saturating_sub(3).max(1);

    let chunks: Vec<&[Vec<String>]> = if table.rows.is_empty() {
        vec![&table.rows[..]]
    } else {
        table.rows.chunks(per_page).collect()
    };
    let pages = chunks.len();

    let mut out = String::new();
    for (page_idx, chunk) in chunks.into_iter().enumerate() {
        if page_idx > 0 {
            out.push('\u{0C}');
        }
        out.push_str(&format!("{title} (page {}/{pages})\n", page_idx + 1));
        out.push_str(&header_line);
        out.push('\n');
        out.push_str(&rule);
        out.push('\n');
        for row in chunk {
            out.push_str(&format_line(row, &widths));
            out.push('\n');
        }
    }
    out
}

pub fn write_paginated(path: &Path, title: &str, table: &Table, lines_per_page: usize) -> Result<()> {
    let text = render_paginated(title, table, lines_per_page);
    fs::write(path, text).with_context(|| format!("write report {}", path.display()))?;
    tracing::info!(path = %path.display(), rows = table.rows.len(), "paginated export written");
    Ok(())
}

fn column_widths(table: &Table) -> Vec<usize> {
    let mut widths: Vec<usize> = table.header.iter().map(|h| h.chars().count()).collect();
    for row in &table.rows {
        for (idx, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            match widths.get_mut(idx) {
                Some(w) => *w = (*w).max(len),
                None => widths.push(len),
            }
        }
    }
    widths
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}
