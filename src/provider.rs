use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};

use crate::dataset::{Snapshot, current_year, records_from_table};
use crate::demo_data;
use crate::sheet_fetch;
use crate::statsbomb_fetch::{self, CompetitionSeason, FetchSettings, StatsBombCredentials};

/// Source of the player dataset. Each call hands back an immutable snapshot.
pub trait DataProvider {
    fn snapshot(&self) -> Result<Arc<Snapshot>>;

    fn label(&self) -> String;

    /// Asks the source to bypass any cache it keeps on the next read.
    fn invalidate(&self) {}
}

impl<P: DataProvider + ?Sized> DataProvider for Box<P> {
    fn snapshot(&self) -> Result<Arc<Snapshot>> {
        (**self).snapshot()
    }

    fn label(&self) -> String {
        (**self).label()
    }

    fn invalidate(&self) {
        (**self).invalidate()
    }
}

/// Player season stats from the StatsBomb API. Responses go through the
/// on-disk HTTP cache; entries older than `max_age` are revalidated.
pub struct StatsBombProvider {
    pub creds: StatsBombCredentials,
    pub targets: Vec<CompetitionSeason>,
    pub parallelism: usize,
    pub max_age: Duration,
    pub base_url: String,
    revalidate: AtomicBool,
}

impl StatsBombProvider {
    pub fn new(
        creds: StatsBombCredentials,
        targets: Vec<CompetitionSeason>,
        parallelism: usize,
        max_age: Duration,
    ) -> Self {
        Self {
            creds,
            targets,
            parallelism,
            max_age,
            base_url: statsbomb_fetch::STATSBOMB_API_URL.to_string(),
            revalidate: AtomicBool::new(false),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl DataProvider for StatsBombProvider {
    fn snapshot(&self) -> Result<Arc<Snapshot>> {
        if self.targets.is_empty() {
            return Err(anyhow!("no competitions configured"));
        }
        let forced = self.revalidate.load(Ordering::SeqCst);
        let settings = FetchSettings {
            base_url: &self.base_url,
            parallelism: self.parallelism,
            max_age: if forced { Duration::ZERO } else { self.max_age },
        };
        let report = statsbomb_fetch::fetch_all(&self.creds, &settings, &self.targets, current_year());
        if report.rows.is_empty() && !report.errors.is_empty() {
            return Err(anyhow!(
                "every competition fetch failed: {}",
                report.errors.join("; ")
            ));
        }
        if forced {
            self.revalidate.store(false, Ordering::SeqCst);
        }
        Ok(Arc::new(Snapshot::new(self.label(), report.rows)))
    }

    fn label(&self) -> String {
        format!("statsbomb ({} competitions)", self.targets.len())
    }

    fn invalidate(&self) {
        self.revalidate.store(true, Ordering::SeqCst);
    }
}

/// Reads a dataset from disk: either provider-format rows (a JSON array of
/// objects) or a sheet export in values-API shape (`{"values": [[header], ...]}`).
pub struct JsonFileProvider {
    pub path: PathBuf,
}

impl DataProvider for JsonFileProvider {
    fn snapshot(&self) -> Result<Arc<Snapshot>> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("read dataset {}", self.path.display()))?;
        let year = current_year();
        let rows = if raw.trim_start().starts_with('{') {
            let table = sheet_fetch::parse_values_json(&raw)
                .with_context(|| format!("parse sheet dataset {}", self.path.display()))?;
            records_from_table(&table.header, &table.rows, year)
        } else {
            statsbomb_fetch::parse_player_season_stats_json(&raw, year)
                .with_context(|| format!("parse dataset {}", self.path.display()))?
        };
        Ok(Arc::new(Snapshot::new(self.label(), rows)))
    }

    fn label(&self) -> String {
        format!("file {}", self.path.display())
    }
}

pub struct DemoProvider {
    pub players: usize,
    pub seed: u64,
}

impl DataProvider for DemoProvider {
    fn snapshot(&self) -> Result<Arc<Snapshot>> {
        let rows = demo_data::demo_population(self.players, self.seed);
        Ok(Arc::new(Snapshot::new(self.label(), rows)))
    }

    fn label(&self) -> String {
        "demo".to_string()
    }
}

pub type Clock = Box<dyn Fn() -> Instant + Send + Sync>;

/// Serves the same snapshot for `ttl` after each successful read.
pub struct CachedProvider<P> {
    inner: P,
    ttl: Duration,
    clock: Clock,
    cached: Mutex<Option<(Instant, Arc<Snapshot>)>>,
}

impl<P: DataProvider> CachedProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self::with_clock(inner, ttl, Box::new(Instant::now))
    }

    pub fn with_clock(inner: P, ttl: Duration, clock: Clock) -> Self {
        Self {
            inner,
            ttl,
            clock,
            cached: Mutex::new(None),
        }
    }

}

impl<P: DataProvider> DataProvider for CachedProvider<P> {
    fn snapshot(&self) -> Result<Arc<Snapshot>> {
        let now = (self.clock)();
        let mut guard = self.cached.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((at, snapshot)) = guard.as_ref() {
            if now.saturating_duration_since(*at) < self.ttl {
                return Ok(Arc::clone(snapshot));
            }
        }
        tracing::info!(source = %self.inner.label(), "refreshing dataset snapshot");
        let fresh = self.inner.snapshot()?;
        *guard = Some((now, Arc::clone(&fresh)));
        Ok(fresh)
    }

    fn label(&self) -> String {
        self.inner.label()
    }

    /// Drops the cached snapshot and passes the request on, so the next read
    /// revalidates all the way to the source.
    fn invalidate(&self) {
        *self.cached.lock().unwrap_or_else(|e| e.into_inner()) = None;
        self.inner.invalidate();
    }
}
