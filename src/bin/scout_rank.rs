use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use scout_terminal::config::{self, AppConfig};
use scout_terminal::engine::{self, ProfilingRequest};
use scout_terminal::export::{self, DEFAULT_LINES_PER_PAGE};
use scout_terminal::filter::{FilterCriteria, Range};
use scout_terminal::logging;
use scout_terminal::provider::DataProvider;
use scout_terminal::ranking::{DEFAULT_WEIGHT, LeaderboardStatus, ProfileWeight};
use scout_terminal::reports_db;

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init_stderr();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let cfg = AppConfig::from_env();

    if let Some(player) = arg_value(&args, "--add-report") {
        return add_report(&cfg, &args, &player);
    }
    if let Some(player) = arg_value(&args, "--reports") {
        return list_reports(&cfg, &player);
    }

    let catalog = cfg.catalog()?;
    let snapshot = cfg.provider().snapshot()?;

    let weights = arg_value(&args, "--weights")
        .map(|raw| parse_weights(&raw))
        .transpose()?
        .unwrap_or_default();
    let profiles = match arg_value(&args, "--profiles") {
        Some(raw) => split_list(&raw),
        None if !weights.is_empty() => {
            let mut names = weights.keys().cloned().collect::<Vec<_>>();
            names.sort();
            names
        }
        None => catalog.profiles().iter().map(|p| p.name.clone()).collect(),
    };
    let selection = profiles
        .iter()
        .map(|name| {
            let weight = weights.get(name).copied().unwrap_or(DEFAULT_WEIGHT);
            ProfileWeight::new(name.clone(), weight)
        })
        .collect();

    let top_n = match arg_value(&args, "--top") {
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .with_context(|| format!("invalid --top value {raw:?}"))?,
        None => cfg.top_n,
    };

    let criteria = FilterCriteria {
        positions: arg_value(&args, "--position")
            .map(|raw| split_list(&raw))
            .unwrap_or_default(),
        competitions: arg_value(&args, "--competition")
            .map(|raw| split_list(&raw))
            .unwrap_or_default(),
        teams: arg_value(&args, "--team")
            .map(|raw| split_list(&raw))
            .unwrap_or_default(),
        seasons: arg_value(&args, "--season")
            .map(|raw| split_list(&raw))
            .unwrap_or_default(),
        age: arg_range(&args, "--min-age", "--max-age")?,
        minutes: arg_range(&args, "--min-minutes", "--max-minutes")?,
        height: arg_range(&args, "--min-height", "--max-height")?,
        search: arg_value(&args, "--search").unwrap_or_default(),
    };

    let request = ProfilingRequest { selection, top_n };
    let outcome = engine::run(&snapshot, &criteria, &catalog, &request);

    println!("Source: {} ({} rows)", snapshot.source, snapshot.len());
    println!("Population: {}", outcome.population_size);
    for warning in outcome.warnings() {
        println!("warning: {warning}");
    }

    match outcome.status() {
        LeaderboardStatus::EmptyPopulation => {
            println!("No player matches the filters");
            return Ok(());
        }
        LeaderboardStatus::NoProfilesSelected => {
            println!("No usable profile selected");
            return Ok(());
        }
        LeaderboardStatus::Ranked => {}
    }

    let table = export::leaderboard_table(&outcome);
    if args.iter().any(|a| a == "--json") {
        println!("{}", serde_json::to_string_pretty(&outcome.leaderboard)?);
    } else {
        print!("{}", export::render_paginated("Player rating", &table, usize::MAX));
    }

    if let Some(path) = arg_value(&args, "--xlsx") {
        export::write_xlsx(&PathBuf::from(&path), "rating", &table)?;
        println!("Wrote {path}");
    }
    if let Some(path) = arg_value(&args, "--txt") {
        export::write_paginated(&PathBuf::from(&path), "Player rating", &table, DEFAULT_LINES_PER_PAGE)?;
        println!("Wrote {path}");
    }

    Ok(())
}

fn add_report(cfg: &AppConfig, args: &[String], player: &str) -> Result<()> {
    let body = arg_value(args, "--body").context("--add-report needs --body")?;
    let image = arg_value(args, "--image");
    let conn = open_reports(cfg)?;
    let report = reports_db::add_report(&conn, player, image.as_deref(), &body)?;
    println!("Report {} saved for {} ({})", report.id, report.player, report.image);
    Ok(())
}

fn list_reports(cfg: &AppConfig, player: &str) -> Result<()> {
    let conn = open_reports(cfg)?;
    let reports = reports_db::reports_for_player(&conn, player)?;
    if reports.is_empty() {
        println!("No reports for {player}");
    }
    for report in reports {
        println!("[{}] {} | {}", report.created_at, report.player, report.image);
        println!("  {}", report.body);
    }
    Ok(())
}

fn open_reports(cfg: &AppConfig) -> Result<rusqlite::Connection> {
    let path = cfg
        .reports_db
        .clone()
        .or_else(reports_db::default_db_path)
        .context("unable to resolve reports db path")?;
    reports_db::open_db(&path)
}

/// `Finisseur=2,Créateur=0.5`
fn parse_weights(raw: &str) -> Result<HashMap<String, f64>> {
    let mut out = HashMap::new();
    for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (name, weight) = item
            .rsplit_once('=')
            .ok_or_else(|| anyhow!("weight {item:?} is not NAME=VALUE"))?;
        let weight = weight
            .trim()
            .parse::<f64>()
            .with_context(|| format!("invalid weight for {name}"))?;
        out.insert(name.trim().to_string(), weight);
    }
    Ok(out)
}

fn arg_number(args: &[String], name: &str) -> Result<Option<f64>> {
    arg_value(args, name)
        .map(|raw| {
            raw.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| anyhow!("invalid {name} value {raw:?}"))
        })
        .transpose()
}

fn arg_range(args: &[String], min_flag: &str, max_flag: &str) -> Result<Range> {
    let range = Range {
        min: arg_number(args, min_flag)?,
        max: arg_number(args, max_flag)?,
    };
    if let (Some(min), Some(max)) = (range.min, range.max) {
        if min > max {
            return Err(anyhow!("{min_flag} {min} is above {max_flag} {max}"));
        }
    }
    Ok(range)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn arg_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.clone());
            }
        }
    }
    None
}

fn print_usage() {
    println!(
        "scout_rank [--profiles A,B] [--weights A=2,B=0.5] [--top N]\n\
         \x20          [--position P] [--competition C] [--team T] [--season S] [--search NAME]\n\
         \x20          [--min-age N] [--max-age N] [--min-height CM] [--max-height CM]\n\
         \x20          [--min-minutes M] [--max-minutes M]\n\
         \x20          [--json] [--xlsx PATH] [--txt PATH]\n\
         scout_rank --add-report PLAYER --body TEXT [--image NAME]\n\
         scout_rank --reports PLAYER"
    );
}
