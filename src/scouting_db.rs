use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::parsing::{parse_year, text_cell};
use crate::sheet_fetch::SheetTable;

/// One row of the curated scouting spreadsheet.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoutingEntry {
    pub player: String,
    pub first_name: Option<String>,
    pub position: Option<String>,
    pub foot: Option<String>,
    pub club: Option<String>,
    pub contract_end: Option<String>,
    pub birth_year: Option<i32>,
    pub championship: Option<String>,
    pub report: Option<String>,
}

impl ScoutingEntry {
    pub fn age(&self, current_year: i32) -> Option<i32> {
        self.birth_year.map(|y| current_year - y)
    }

    pub fn contract_end_date(&self) -> Option<NaiveDate> {
        parse_contract_date(self.contract_end.as_deref()?)
    }
}

/// Contract ends are typed by hand: `30/06/2026`, `2026-06-30`, or a bare year (end of June).
fn parse_contract_date(raw: &str) -> Option<NaiveDate> {
    const FORMATS: [&str; 3] = ["%d/%m/%Y", "%Y-%m-%d", "%d.%m.%Y"];
    let cleaned = raw.trim();
    for fmt in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(cleaned, fmt) {
            return Some(date);
        }
    }
    let year = parse_year(cleaned).filter(|_| cleaned.len() == 4)?;
    NaiveDate::from_ymd_opt(year, 6, 30)
}

pub fn entries_from_sheet(table: &SheetTable) -> Vec<ScoutingEntry> {
    let text = |row: &[String], col: &str| table.cell(row, col).and_then(text_cell);
    table
        .rows
        .iter()
        .filter_map(|row| {
            let player = text(row, "Player")?;
            Some(ScoutingEntry {
                player,
                first_name: text(row, "Prénom"),
                position: text(row, "Poste"),
                foot: text(row, "Pied"),
                club: text(row, "Club"),
                contract_end: text(row, "Fin de contrat"),
                birth_year: table.cell(row, "Date de naissance").and_then(parse_year),
                championship: text(row, "championnat"),
                report: text(row, "Rapport"),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScoutingSort {
    #[default]
    Age,
    ContractEnd,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoutingQuery {
    pub positions: Vec<String>,
    pub championships: Vec<String>,
    pub birth_years: Option<(i32, i32)>,
    pub search: String,
    pub sort: ScoutingSort,
}

impl ScoutingQuery {
    pub fn matches(&self, entry: &ScoutingEntry) -> bool {
        let in_list = |allowed: &[String], value: &Option<String>| {
            allowed.is_empty() || value.as_ref().is_some_and(|v| allowed.contains(v))
        };
        let in_years = match self.birth_years {
            None => true,
            Some((lo, hi)) => entry.birth_year.is_some_and(|y| y >= lo && y <= hi),
        };
        let needle = self.search.trim().to_lowercase();
        in_list(&self.positions, &entry.position)
            && in_list(&self.championships, &entry.championship)
            && in_years
            && (needle.is_empty() || entry.player.to_lowercase().contains(&needle))
    }
}

/// Filtered, sorted listing. Sorting is descending with blanks last.
pub fn query<'a>(
    entries: &'a [ScoutingEntry],
    query: &ScoutingQuery,
    current_year: i32,
) -> Vec<&'a ScoutingEntry> {
    let mut out: Vec<&ScoutingEntry> = entries.iter().filter(|e| query.matches(e)).collect();
    match query.sort {
        ScoutingSort::Age => out.sort_by(|a, b| desc_missing_last(a.age(current_year), b.age(current_year))),
        ScoutingSort::ContractEnd => {
            out.sort_by(|a, b| desc_missing_last(a.contract_end_date(), b.contract_end_date()))
        }
    }
    out
}

fn desc_missing_last<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Players per position, most common first.
pub fn position_counts(entries: &[&ScoutingEntry]) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for entry in entries {
        let key = entry.position.clone().unwrap_or_else(|| "-".to_string());
        *counts.entry(key).or_default() += 1;
    }
    let mut out: Vec<(String, usize)> = counts.into_iter().collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}
