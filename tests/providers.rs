use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};

use scout_terminal::dataset::{PlayerRecord, Snapshot};
use scout_terminal::metrics::Metric;
use scout_terminal::provider::{CachedProvider, DataProvider, DemoProvider, JsonFileProvider};

struct CountingProvider {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl DataProvider for CountingProvider {
    fn snapshot(&self) -> Result<Arc<Snapshot>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail {
            return Err(anyhow!("source down"));
        }
        let rows = vec![PlayerRecord::new(format!("Fetch {n}")).with_stat(Metric::Xa90, n as f64)];
        Ok(Arc::new(Snapshot::new("counting", rows)))
    }

    fn label(&self) -> String {
        "counting".to_string()
    }
}

fn fake_clock() -> (Arc<Mutex<Instant>>, Box<dyn Fn() -> Instant + Send + Sync>) {
    let now = Arc::new(Mutex::new(Instant::now()));
    let handle = Arc::clone(&now);
    let clock: Box<dyn Fn() -> Instant + Send + Sync> =
        Box::new(move || *handle.lock().expect("clock lock"));
    (now, clock)
}

fn advance(now: &Arc<Mutex<Instant>>, by: Duration) {
    let mut guard = now.lock().expect("clock lock");
    *guard += by;
}

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

#[test]
fn cached_provider_serves_the_same_snapshot_within_ttl() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (now, clock) = fake_clock();
    let provider = CachedProvider::with_clock(
        CountingProvider {
            calls: Arc::clone(&calls),
            fail: false,
        },
        Duration::from_secs(60),
        clock,
    );

    let first = provider.snapshot().expect("first read");
    advance(&now, Duration::from_secs(59));
    let second = provider.snapshot().expect("cached read");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    advance(&now, Duration::from_secs(1));
    let third = provider.snapshot().expect("refreshed read");
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(third.rows[0].name, "Fetch 2");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn invalidate_forces_a_refetch() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (_now, clock) = fake_clock();
    let provider = CachedProvider::with_clock(
        CountingProvider {
            calls: Arc::clone(&calls),
            fail: false,
        },
        Duration::from_secs(60),
        clock,
    );

    provider.snapshot().expect("first read");
    provider.invalidate();
    provider.snapshot().expect("second read");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn failed_fetch_is_not_cached() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (_now, clock) = fake_clock();
    let provider = CachedProvider::with_clock(
        CountingProvider {
            calls: Arc::clone(&calls),
            fail: true,
        },
        Duration::from_secs(60),
        clock,
    );

    assert!(provider.snapshot().is_err());
    assert!(provider.snapshot().is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn json_file_provider_reads_provider_rows() {
    let provider = JsonFileProvider {
        path: fixture_path("statsbomb_player_season_stats.json"),
    };
    let snapshot = provider.snapshot().expect("fixture should load");
    assert_eq!(snapshot.len(), 2);
    assert!(provider.label().contains("statsbomb_player_season_stats.json"));
}

#[test]
fn json_file_provider_reads_sheet_exports() {
    let provider = JsonFileProvider {
        path: fixture_path("sheet_values_players.json"),
    };
    let snapshot = provider.snapshot().expect("fixture should load");
    assert_eq!(snapshot.len(), 3);
    assert!(snapshot.has_column(Metric::NpShots90));
}

#[test]
fn json_file_provider_reports_missing_files() {
    let provider = JsonFileProvider {
        path: fixture_path("does_not_exist.json"),
    };
    let err = provider.snapshot().expect_err("missing file should fail");
    assert!(format!("{err:#}").contains("does_not_exist.json"));
}

#[test]
fn demo_provider_is_deterministic_per_seed() {
    let a = DemoProvider { players: 50, seed: 3 }.snapshot().expect("demo");
    let b = DemoProvider { players: 50, seed: 3 }.snapshot().expect("demo");
    let c = DemoProvider { players: 50, seed: 4 }.snapshot().expect("demo");

    assert_eq!(a.len(), 50);
    assert_eq!(a.rows, b.rows);
    assert_ne!(a.rows, c.rows);
    assert!(a.has_column(Metric::NpShots90));
    assert!(a.rows.iter().all(|r| r.minutes.is_some()));
}
