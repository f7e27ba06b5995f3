//! Window Detect CLI
//!
//! Open-window detection from zone temperature and AHU telemetry.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use window_detect::{
    config::Config,
    core::{classify, condition, ConditioningConfig, DetectionReport, DetectorConfig},
    telemetry::{self, RawTelemetry, TelemetryCache},
    VERSION,
};

#[derive(Parser)]
#[command(name = "window-detect")]
#[command(version = VERSION)]
#[command(about = "Open-window detection from zone telemetry", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run window detection for a zone over a time range
    Detect {
        /// Zone name, as configured
        #[arg(long)]
        zone: String,

        /// Start of the analyzed range (RFC 3339 or YYYY-MM-DD[THH:MM[:SS]], UTC)
        #[arg(long)]
        from: String,

        /// End of the analyzed range, inclusive
        #[arg(long)]
        to: String,

        /// Fetch fresh telemetry from SCADA instead of the cache (requires scada feature)
        #[arg(long)]
        refresh: bool,

        /// Path to the configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Telemetry cache directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Write the full report to this file
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Report format (json or csv)
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Show configuration
    Config {
        /// Path to the configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List configured zones and their channel ids
    Zones {
        /// Path to the configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Detect {
            zone,
            from,
            to,
            refresh,
            config,
            cache_dir,
            output,
            format,
        } => {
            cmd_detect(&zone, &from, &to, refresh, config, cache_dir, output, &format);
        }
        Commands::Config { config } => {
            cmd_config(config);
        }
        Commands::Zones { config } => {
            cmd_zones(config);
        }
    }
}

fn cmd_detect(
    zone: &str,
    from: &str,
    to: &str,
    refresh: bool,
    config_path: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    output: Option<PathBuf>,
    format: &str,
) {
    println!("Window Detect v{VERSION}");
    println!();

    let from = parse_cli_timestamp("from", from);
    let to = parse_cli_timestamp("to", to);

    let config = load_config(config_path);
    let cache = match cache_dir {
        Some(dir) => TelemetryCache::new(dir),
        None => TelemetryCache::new(TelemetryCache::default_dir()),
    };

    println!("Zone: {zone}");
    println!(
        "Range: {} .. {} (UTC)",
        from.format("%Y-%m-%d %H:%M"),
        to.format("%Y-%m-%d %H:%M")
    );
    println!();

    let telemetry = fetch_telemetry(&config, &cache, zone, refresh, from, to);
    if telemetry.is_empty() {
        println!("No telemetry for zone '{zone}' in the requested range.");
    }

    let frame = condition(&telemetry, &ConditioningConfig::default());
    let labels = classify(&frame, &DetectorConfig::default());
    let report = DetectionReport::build(zone, &frame, &labels);

    println!("Minutes analyzed: {}", report.minutes_analyzed);
    println!("Minutes open: {}", report.minutes_open);
    println!();

    if report.open_intervals.is_empty() {
        println!("No open windows detected.");
    } else {
        println!("Open intervals:");
        for interval in &report.open_intervals {
            println!(
                "  {} .. {} ({} min)",
                interval.start, interval.end, interval.minutes
            );
        }
    }

    if let Some(path) = output {
        let rendered = match format {
            "json" => report.to_json(),
            "csv" => report.to_csv(),
            other => {
                eprintln!("Error: unknown format '{other}' (expected json or csv)");
                std::process::exit(1);
            }
        };

        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        if let Err(e) = std::fs::write(&path, rendered) {
            eprintln!("Error writing report: {e}");
            std::process::exit(1);
        }

        println!();
        println!("Report written to {path:?}");
    }
}

fn cmd_config(config_path: Option<PathBuf>) {
    let shown_path = config_path
        .clone()
        .unwrap_or_else(Config::config_path);
    let config = load_config(config_path);

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {shown_path:?}");
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config.redacted()).unwrap_or_else(|_| "Error".to_string())
    );
}

fn cmd_zones(config_path: Option<PathBuf>) {
    let config = load_config(config_path);

    if config.zones.is_empty() {
        println!("No zones configured.");
        println!("Add zones under \"variables\" in {:?}", Config::config_path());
        return;
    }

    for (name, zone) in &config.zones {
        println!("{name}");
        for (channel, id) in zone.variable_ids() {
            println!("  {channel}: {id}");
        }
    }
}

/// Load configuration from an explicit path or the default location.
fn load_config(path: Option<PathBuf>) -> Config {
    let result = match &path {
        Some(p) => Config::load_from(p),
        None => Config::load(),
    };

    match result {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    }
}

/// Fetch zone telemetry from the cache, or from SCADA when `--refresh` is
/// given and the feature is compiled in.
#[allow(unused_variables)]
fn fetch_telemetry(
    config: &Config,
    cache: &TelemetryCache,
    zone: &str,
    refresh: bool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> RawTelemetry {
    #[cfg(feature = "scada")]
    if refresh {
        let zone_config = match config.zone(zone) {
            Ok(z) => z,
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        };

        match telemetry::refresh_from_scada(cache, zone, zone_config, &config.scada, from, to) {
            Ok(fetched) => {
                println!("Fetched {} samples from SCADA.", fetched.sample_count());
                return fetched;
            }
            Err(e) => {
                eprintln!("Error fetching telemetry: {e}");
                std::process::exit(1);
            }
        }
    }

    #[cfg(not(feature = "scada"))]
    if refresh {
        eprintln!("Warning: --refresh ignored (scada feature not enabled at compile time)");
    }

    match telemetry::load_cached(cache, zone, from, to) {
        Ok(loaded) => {
            println!("Loaded {} samples from cache.", loaded.sample_count());
            loaded
        }
        Err(e) => {
            eprintln!("Error loading telemetry: {e}");
            eprintln!("Run with --refresh to fetch from SCADA (requires the scada feature).");
            std::process::exit(1);
        }
    }
}

/// Parse a CLI timestamp, exiting with a message when it is malformed.
fn parse_cli_timestamp(label: &str, value: &str) -> DateTime<Utc> {
    match parse_timestamp(value) {
        Ok(ts) => ts,
        Err(e) => {
            eprintln!("Error parsing --{label}: {e}");
            std::process::exit(1);
        }
    }
}

/// Accept RFC 3339 or naive `YYYY-MM-DD[THH:MM[:SS]]` timestamps, naive ones
/// interpreted as UTC.
fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight));
        }
    }

    Err(format!(
        "unrecognized timestamp '{value}' (expected RFC 3339 or YYYY-MM-DD[THH:MM[:SS]])"
    ))
}
