use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use scout_terminal::dataset::Snapshot;
use scout_terminal::provider::{CachedProvider, DataProvider, StatsBombProvider};
use scout_terminal::statsbomb_fetch::{CompetitionSeason, StatsBombCredentials};

const ETAG: &str = "\"v1\"";
const BODY: &str = r#"[{"player_name":"Cached Row","team_name":"Laval","player_season_np_shots_90":1.5}]"#;

/// Serves player stats with an ETag and answers conditional requests with 304.
/// Returns the base url and the raw request heads it received.
fn spawn_stats_server() -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind local server");
    let addr = listener.local_addr().expect("local addr");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
            let mut head = String::new();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
                    break;
                }
                head.push_str(&line.to_ascii_lowercase());
            }
            let conditional = head.contains("if-none-match");
            log.lock().expect("request log").push(head);
            let response = if conditional {
                format!("HTTP/1.1 304 Not Modified\r\nETag: {ETAG}\r\nConnection: close\r\n\r\n")
            } else {
                format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nETag: {ETAG}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{BODY}",
                    BODY.len()
                )
            };
            let _ = stream.write_all(response.as_bytes());
        }
    });
    (format!("http://{addr}"), seen)
}

fn stats_provider(base_url: &str) -> StatsBombProvider {
    StatsBombProvider::new(
        StatsBombCredentials {
            user: "scout".to_string(),
            password: "secret".to_string(),
        },
        vec![CompetitionSeason { competition_id: 1, season_id: 1 }],
        1,
        Duration::from_secs(6 * 60 * 60),
    )
    .with_base_url(base_url)
}

fn names(snapshot: &Snapshot) -> Vec<&str> {
    snapshot.rows.iter().map(|r| r.name.as_str()).collect()
}

// Only test in this binary: it points the process-wide disk cache at a temp dir.
#[test]
fn force_refresh_revalidates_the_disk_cache() {
    let cache_home = tempfile::tempdir().expect("temp cache dir");
    // SAFETY: set before any other thread in this binary reads the environment.
    unsafe { std::env::set_var("XDG_CACHE_HOME", cache_home.path()) };

    let (base_url, seen) = spawn_stats_server();
    let provider = CachedProvider::new(stats_provider(&base_url), Duration::from_secs(60));

    let first = provider.snapshot().expect("first read hits the server");
    assert_eq!(names(&first), vec!["Cached Row"]);
    assert_eq!(seen.lock().expect("request log").len(), 1);
    assert!(
        cache_home.path().join("scout_terminal").join("http_cache.json").exists(),
        "response should be stored on disk"
    );

    // Without a forced refresh a young disk entry is served as is.
    let cold = CachedProvider::new(stats_provider(&base_url), Duration::from_secs(60));
    assert_eq!(names(&cold.snapshot().expect("disk read")), vec!["Cached Row"]);
    assert_eq!(seen.lock().expect("request log").len(), 1);

    provider.invalidate();
    let second = provider.snapshot().expect("forced read revalidates");
    assert_eq!(names(&second), vec!["Cached Row"]);
    assert!(!Arc::ptr_eq(&first, &second));

    let requests = seen.lock().expect("request log");
    assert_eq!(requests.len(), 2, "forced refresh must reach the server");
    assert!(requests[0].contains("/competitions/1/seasons/1/player-stats"));
    assert!(!requests[0].contains("if-none-match"));
    assert!(requests[1].contains("if-none-match: \"v1\""));
    assert!(requests[1].contains("authorization: basic"));
}
