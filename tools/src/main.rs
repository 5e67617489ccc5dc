//! smurf-detector: headless structuring detection runner.
//!
//! Usage:
//!   smurf-detector run --db txns.db
//!   smurf-detector run --db txns.db --channels CASH,ATM --direction IN \
//!       --per-tx-threshold 10000 --window-days 10 --min-count 3 \
//!       --min-total 20000 --write-alerts

use anyhow::{bail, Result};
use smurf_core::{
    config::{major_to_minor, DetectionConfig},
    detector::run_detection,
    store::DetectStore,
    transaction::Direction,
};
use std::env;

const USAGE: &str = "usage: smurf-detector run --db <path> \
    [--channels CASH,ATM] [--direction IN|OUT] [--per-tx-threshold 10000.0] \
    [--window-days 10] [--min-count 3] [--min-total 20000.0] [--write-alerts] \
    [--cluster-table smurf_clusters] [--link-table smurf_cluster_tx] \
    [--alert-tx-table smurf_alert_tx]";

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.get(1).map(String::as_str) != Some("run") {
        bail!("{USAGE}");
    }
    let Some(db) = str_arg(&args, "--db") else {
        bail!("--db is required\n{USAGE}");
    };

    let mut cfg = DetectionConfig::default();
    if let Some(channels) = str_arg(&args, "--channels") {
        cfg.params.channels = channels
            .split(',')
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .collect();
    }
    if let Some(direction) = str_arg(&args, "--direction") {
        cfg.params.direction = direction
            .parse::<Direction>()
            .map_err(|e| anyhow::anyhow!(e))?;
    }
    cfg.params.per_tx_threshold_minor =
        major_to_minor(parse_arg(&args, "--per-tx-threshold", 10000.0));
    cfg.params.window_days = parse_arg(&args, "--window-days", 10i64);
    cfg.params.min_count = parse_arg(&args, "--min-count", 3usize);
    cfg.params.min_total_minor = major_to_minor(parse_arg(&args, "--min-total", 20000.0));
    cfg.write_alerts = args.iter().any(|a| a == "--write-alerts");
    if let Some(name) = str_arg(&args, "--cluster-table") {
        cfg.tables.clusters = name.to_string();
    }
    if let Some(name) = str_arg(&args, "--link-table") {
        cfg.tables.cluster_tx = name.to_string();
    }
    if let Some(name) = str_arg(&args, "--alert-tx-table") {
        cfg.tables.alert_tx = name.to_string();
    }

    // The core assumes a valid configuration; reject bad flags here.
    cfg.validate()?;

    log::info!(
        "detecting on {db}: channels={:?} direction={} window={}d min_count={} \
         min_total={} threshold={} write_alerts={}",
        cfg.params.channels,
        cfg.params.direction.as_str(),
        cfg.params.window_days,
        cfg.params.min_count,
        cfg.params.min_total_minor,
        cfg.params.per_tx_threshold_minor,
        cfg.write_alerts,
    );

    let mut store = DetectStore::open(db)?;
    let summary = run_detection(&mut store, &cfg)?;

    println!(
        "Done. clusters={} links={} alerts={}",
        summary.clusters, summary.links, summary.alerts
    );
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}
