use std::fs::{self, File};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::http_cache::app_cache_dir;

const LOG_FILE: &str = "scout_terminal.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env("SCOUT_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Logs to stderr. For command-line tools.
pub fn init_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}

/// Logs to a file in the cache dir, since the terminal UI owns stdout.
/// Logging is dropped when no cache dir is available.
pub fn init_file() {
    let Some(dir) = app_cache_dir() else {
        return;
    };
    fs::create_dir_all(&dir).ok();
    let Ok(file) = File::create(dir.join(LOG_FILE)) else {
        return;
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}
