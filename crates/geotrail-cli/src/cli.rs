//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use geotrail_core::RouteDate;

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "geotrail")]
#[command(author, version, about = "Record GPS routes and sync them with a geotrail service", long_about = None)]
pub struct Cli {
    /// Service base URL, or use GEOTRAIL_SERVER env var
    #[arg(short, long, global = true, env = "GEOTRAIL_SERVER")]
    pub server: Option<String>,

    /// Owner the routes belong to, or use GEOTRAIL_OWNER env var
    #[arg(short = 'u', long, global = true, env = "GEOTRAIL_OWNER")]
    pub owner: Option<String>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Output compact JSON (no pretty-printing)
    #[arg(long, global = true)]
    pub compact: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Write output to file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a route and upload it periodically
    Track {
        /// Replay samples from a CSV or JSON file instead of the simulated device
        #[arg(long, value_name = "FILE")]
        replay: Option<PathBuf>,

        /// Seconds between samples (overrides config)
        #[arg(short, long, value_parser = parse_seconds)]
        interval: Option<u64>,

        /// Seconds between uploads (overrides config)
        #[arg(long, value_name = "SECONDS", value_parser = parse_seconds)]
        upload_every: Option<u64>,

        /// Stop after this many seconds
        #[arg(short, long, value_parser = parse_seconds)]
        duration: Option<u64>,

        /// Date the route is stored under (YYYY-MM-DD, default today)
        #[arg(long, value_parser = parse_date)]
        date: Option<RouteDate>,

        /// Starting latitude of the simulated device
        #[arg(long, allow_negative_numbers = true, default_value = "25.0479")]
        lat: f64,

        /// Starting longitude of the simulated device
        #[arg(long, allow_negative_numbers = true, default_value = "121.5171")]
        lng: f64,
    },

    /// Upload a recorded route file
    Upload {
        /// CSV (header `lat,lng,ts`) or JSON array of samples
        #[arg(long, value_name = "FILE")]
        file: PathBuf,

        /// Date the route is stored under (default: date of the first sample)
        #[arg(long, value_parser = parse_date)]
        date: Option<RouteDate>,
    },

    /// Fetch one stored route
    Fetch {
        /// Route date (YYYY-MM-DD, default today)
        #[arg(long, value_parser = parse_date)]
        date: Option<RouteDate>,
    },

    /// List recent routes, newest first
    History {
        /// Number of routes to list
        #[arg(short = 'n', long, default_value = "10")]
        limit: u32,
    },

    /// Delete one stored route
    Delete {
        /// Route date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        date: RouteDate,
    },

    /// Record the current position once
    Locate {
        /// Latitude to report (simulated when omitted)
        #[arg(long, allow_negative_numbers = true, requires = "lng")]
        lat: Option<f64>,

        /// Longitude to report (simulated when omitted)
        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lng: Option<f64>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration subcommands
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a configuration file with the current settings
    Init,
}

/// Parse a `YYYY-MM-DD` route date
fn parse_date(s: &str) -> Result<RouteDate, String> {
    s.parse().map_err(|e: geotrail_core::ParseError| e.to_string())
}

/// Parse a positive number of seconds
fn parse_seconds(s: &str) -> Result<u64, String> {
    let seconds: u64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if seconds == 0 {
        return Err("must be at least 1 second".to_string());
    }
    Ok(seconds)
}
