use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use crate::metrics::MetricCatalog;
use crate::provider::{CachedProvider, DataProvider, DemoProvider, JsonFileProvider, StatsBombProvider};
use crate::ranking::DEFAULT_TOP_N;
use crate::statsbomb_fetch::{CompetitionSeason, STATSBOMB_API_URL, StatsBombCredentials};

const DEFAULT_COMPETITIONS: &str = "129:317,7:317,8:317";
const DEMO_PLAYERS: usize = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    StatsBomb,
    File,
    Demo,
}

#[derive(Debug, Clone)]
pub struct SheetConfig {
    pub spreadsheet_id: String,
    pub range: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub source: DataSource,
    pub statsbomb: Option<StatsBombCredentials>,
    pub competitions: Vec<CompetitionSeason>,
    pub statsbomb_url: String,
    pub data_file: Option<PathBuf>,
    pub profiles_file: Option<PathBuf>,
    pub snapshot_ttl: Duration,
    pub top_n: usize,
    pub fetch_parallelism: usize,
    pub sheet: Option<SheetConfig>,
    pub export_dir: PathBuf,
    pub reports_db: Option<PathBuf>,
}

/// Loads `.env.local` then `.env`; variables already set in the environment win.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

impl AppConfig {
    pub fn from_env() -> Self {
        let statsbomb = match (opt_env("STATSBOMB_USER"), opt_env("STATSBOMB_PASSWORD")) {
            (Some(user), Some(password)) => Some(StatsBombCredentials { user, password }),
            _ => None,
        };
        let data_file = opt_env("DATA_FILE").map(PathBuf::from);

        let source = match opt_env("DATA_SOURCE").map(|s| s.to_lowercase()).as_deref() {
            Some("statsbomb") => DataSource::StatsBomb,
            Some("file") => DataSource::File,
            Some("demo") => DataSource::Demo,
            _ if statsbomb.is_some() => DataSource::StatsBomb,
            _ if data_file.is_some() => DataSource::File,
            _ => DataSource::Demo,
        };

        let competitions = CompetitionSeason::parse_list(
            &opt_env("STATSBOMB_COMPETITIONS").unwrap_or_else(|| DEFAULT_COMPETITIONS.to_string()),
        );

        let sheet = match (opt_env("SPREADSHEET_ID"), opt_env("SHEETS_API_KEY")) {
            (Some(spreadsheet_id), Some(api_key)) => Some(SheetConfig {
                spreadsheet_id,
                range: opt_env("SHEET_RANGE").unwrap_or_else(|| "Feuille 1".to_string()),
                api_key,
            }),
            _ => None,
        };

        Self {
            source,
            statsbomb,
            competitions,
            statsbomb_url: opt_env("STATSBOMB_API_URL").unwrap_or_else(|| STATSBOMB_API_URL.to_string()),
            data_file,
            profiles_file: opt_env("PROFILES_FILE").map(PathBuf::from),
            snapshot_ttl: Duration::from_secs(
                env::var("SNAPSHOT_TTL_SECS")
                    .ok()
                    .and_then(|val| val.parse::<u64>().ok())
                    .unwrap_or(60)
                    .max(1),
            ),
            top_n: env::var("LEADERBOARD_TOP_N")
                .ok()
                .and_then(|val| val.parse::<usize>().ok())
                .unwrap_or(DEFAULT_TOP_N)
                .clamp(1, 500),
            fetch_parallelism: env::var("FETCH_PARALLELISM")
                .ok()
                .and_then(|val| val.parse::<usize>().ok())
                .unwrap_or(4)
                .clamp(1, 16),
            sheet,
            export_dir: opt_env("EXPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            reports_db: opt_env("REPORTS_DB").map(PathBuf::from),
        }
    }

    pub fn catalog(&self) -> Result<MetricCatalog> {
        match &self.profiles_file {
            Some(path) => MetricCatalog::load(path),
            None => Ok(MetricCatalog::default()),
        }
    }

    /// The configured source wrapped in the snapshot TTL cache.
    pub fn provider(&self) -> CachedProvider<Box<dyn DataProvider + Send + Sync>> {
        let inner: Box<dyn DataProvider + Send + Sync> = match (self.source, &self.statsbomb, &self.data_file) {
            // Disk-cached responses never outlive the snapshot window.
            (DataSource::StatsBomb, Some(creds), _) => Box::new(
                StatsBombProvider::new(
                    creds.clone(),
                    self.competitions.clone(),
                    self.fetch_parallelism,
                    self.snapshot_ttl,
                )
                .with_base_url(self.statsbomb_url.clone()),
            ),
            (DataSource::File, _, Some(path)) => Box::new(JsonFileProvider { path: path.clone() }),
            (source, _, _) => {
                if source != DataSource::Demo {
                    tracing::warn!(?source, "data source is missing its settings, using demo data");
                }
                Box::new(DemoProvider {
                    players: DEMO_PLAYERS,
                    seed: 7,
                })
            }
        };
        CachedProvider::new(inner, self.snapshot_ttl)
    }
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
