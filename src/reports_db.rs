use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use rusqlite::{Connection, params};
use serde::Serialize;

use crate::http_cache::app_cache_dir;

pub const NO_IMAGE: &str = "No Image";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoutingReport {
    pub id: i64,
    pub created_at: String,
    pub player: String,
    pub image: String,
    pub body: String,
}

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join("scouting_reports.sqlite"))
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS reports (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at TEXT NOT NULL,
            player TEXT NOT NULL,
            image TEXT NOT NULL,
            body TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_reports_player ON reports(player);
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Stores a report. Both the player and the observations are required.
pub fn add_report(
    conn: &Connection,
    player: &str,
    image: Option<&str>,
    body: &str,
) -> Result<ScoutingReport> {
    let player = player.trim();
    let body = body.trim();
    if player.is_empty() || body.is_empty() {
        return Err(anyhow!("a report needs a player and some observations"));
    }
    let image = image
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|name| format!("Uploaded: {name}"))
        .unwrap_or_else(|| NO_IMAGE.to_string());
    let created_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

    conn.execute(
        "INSERT INTO reports (created_at, player, image, body) VALUES (?1, ?2, ?3, ?4)",
        params![created_at, player, image, body],
    )
    .context("insert report")?;

    Ok(ScoutingReport {
        id: conn.last_insert_rowid(),
        created_at,
        player: player.to_string(),
        image,
        body: body.to_string(),
    })
}

pub fn reports_for_player(conn: &Connection, player: &str) -> Result<Vec<ScoutingReport>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, created_at, player, image, body FROM reports
             WHERE player = ?1 ORDER BY id DESC",
        )
        .context("prepare reports query")?;
    let rows = stmt
        .query_map(params![player], map_report)
        .context("query reports")?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("read reports")
}

pub fn recent_reports(conn: &Connection, limit: usize) -> Result<Vec<ScoutingReport>> {
    let mut stmt = conn
        .prepare("SELECT id, created_at, player, image, body FROM reports ORDER BY id DESC LIMIT ?1")
        .context("prepare recent reports query")?;
    let rows = stmt
        .query_map(params![limit as i64], map_report)
        .context("query recent reports")?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("read recent reports")
}

fn map_report(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScoutingReport> {
    Ok(ScoutingReport {
        id: row.get(0)?,
        created_at: row.get(1)?,
        player: row.get(2)?,
        image: row.get(3)?,
        body: row.get(4)?,
    })
}
