use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

use crate::http_cache::fetch_cached;
use crate::http_client::http_client;
use crate::parsing::value_text;

const SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Header row plus data rows, every row exactly as wide as the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h.trim() == name)
    }

    pub fn cell<'a>(&'a self, row: &'a [String], name: &str) -> Option<&'a str> {
        row.get(self.column(name)?).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Parses a `values.get` response. Short rows are padded, long rows truncated,
/// and a repeated header keeps only its first column.
pub fn parse_values_json(raw: &str) -> Result<SheetTable> {
    let resp: ValuesResponse = serde_json::from_str(raw).context("invalid sheet values json")?;
    let mut values = resp.values.into_iter();
    let Some(header_row) = values.next() else {
        return Ok(SheetTable::default());
    };

    let header_cells: Vec<String> = header_row
        .iter()
        .map(|v| value_text(v).unwrap_or_default())
        .collect();
    let mut seen = HashSet::new();
    let keep: Vec<usize> = header_cells
        .iter()
        .enumerate()
        .filter(|(_, h)| seen.insert(h.trim().to_string()))
        .map(|(idx, _)| idx)
        .collect();
    let width = header_cells.len();

    let rows = values
        .map(|row| {
            let mut cells: Vec<String> = row
                .iter()
                .take(width)
                .map(|v| value_text(v).unwrap_or_default())
                .collect();
            cells.resize(width, String::new());
            keep.iter().map(|idx| cells[*idx].clone()).collect()
        })
        .collect();

    Ok(SheetTable {
        header: keep.iter().map(|idx| header_cells[*idx].clone()).collect(),
        rows,
    })
}

pub fn fetch_sheet(
    spreadsheet_id: &str,
    range: &str,
    api_key: &str,
    max_age: Duration,
) -> Result<SheetTable> {
    let mut url = Url::parse(SHEETS_API_URL).context("sheets base url")?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("sheets base url cannot take path segments"))?
        .push(spreadsheet_id)
        .push("values")
        .push(range);

    let key = url.to_string();
    let request = http_client()?.get(url).query(&[("key", api_key)]);
    let body = fetch_cached(&key, request, max_age)
        .with_context(|| format!("fetch sheet range {range}"))?;
    let table = parse_values_json(&body)?;
    if table.is_empty() {
        tracing::warn!(range, "no data found in sheet range");
    }
    Ok(table)
}
