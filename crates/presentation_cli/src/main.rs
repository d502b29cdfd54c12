//! Trayecto CLI
//!
//! Plans Santiago trips and reports real-time bus arrivals. Results are
//! printed to stdout as pretty JSON; logs go to stderr.

#![allow(clippy::print_stdout)]

use std::path::PathBuf;

use anyhow::Context;
use application::TripQuery;
use clap::{Parser, Subcommand};
use domain::GeoLocation;
use infrastructure::{AppConfig, TransitEngine, init_logging};
use serde::Serialize;
use tracing::debug;

/// Trayecto CLI
#[derive(Parser)]
#[command(name = "trayecto")]
#[command(author, version, about = "Santiago trip planner and arrivals tracker", long_about = None)]
struct Cli {
    /// Verbosity level (overrides the configured log filter)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (default: ./trayecto.toml if present)
    #[arg(short, long, env = "TRAYECTO_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Origin and destination shared by the planning commands
#[derive(clap::Args)]
struct TripArgs {
    /// Origin as "lat,lon"
    #[arg(long, value_parser = parse_location, allow_hyphen_values = true)]
    from: GeoLocation,

    /// Destination as "lat,lon"
    #[arg(long, value_parser = parse_location, allow_hyphen_values = true)]
    to: GeoLocation,

    /// Origin name as the itinerary site should show it
    #[arg(long)]
    from_name: Option<String>,

    /// Destination name as the itinerary site should show it
    #[arg(long)]
    to_name: Option<String>,
}

impl TripArgs {
    fn query(self) -> TripQuery {
        let query = TripQuery::new(self.from, self.to);
        let origin_name = self.from_name.unwrap_or_else(|| query.origin_name.clone());
        let destination_name = self.to_name.unwrap_or_else(|| query.destination_name.clone());
        query.with_names(origin_name, destination_name)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the suggested itineraries with a short summary each
    ///
    /// Example: trayecto options --from -33.4378,-70.6505 --to -33.4173,-70.6064
    Options {
        #[command(flatten)]
        trip: TripArgs,
    },

    /// Full itinerary for one suggested option
    ///
    /// Example: trayecto itinerary --from -33.4378,-70.6505 --to -33.4173,-70.6064 --option 2
    Itinerary {
        #[command(flatten)]
        trip: TripArgs,

        /// Option number as listed by `options` (1 = first)
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
        option: u16,

        /// Skip scraping and use the built-in route catalogue
        #[arg(long)]
        heuristic: bool,
    },

    /// Real-time arrivals at a bus stop, with buses that just passed
    ///
    /// Example: trayecto arrivals PA433
    Arrivals {
        /// Stop code as shown on the stop sign
        stop_code: String,
    },

    /// Validate and print the effective configuration
    CheckConfig {
        /// Also probe the browser and the routing engine
        #[arg(long)]
        probe: bool,
    },
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

/// Parse "lat,lon" into a validated location
fn parse_location(raw: &str) -> Result<GeoLocation, String> {
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lon\", got \"{raw}\""))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude \"{}\"", lat.trim()))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude \"{}\"", lon.trim()))?;
    GeoLocation::new(lat, lon).map_err(|e| e.to_string())
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(cli.config.as_deref()).context("loading configuration")?;

    let mut logging = config.logging.clone();
    if let Some(filter) = log_filter_from_verbosity(cli.verbose) {
        logging = logging.with_filter(filter);
    }
    init_logging(&logging)?;
    debug!(config = ?cli.config, "Starting");

    if let Commands::CheckConfig { probe: false } = cli.command {
        return print_json(&config);
    }

    let engine = TransitEngine::from_config(&config)
        .await
        .context("initializing engine")?;

    match cli.command {
        Commands::Options { trip } => {
            let options = engine.lightweight_options(&trip.query()).await?;
            print_json(&options)?;
        },

        Commands::Itinerary {
            trip,
            option,
            heuristic,
        } => {
            let query = trip.query();
            let itinerary = if heuristic {
                engine.heuristic_itinerary(&query).await?
            } else {
                engine
                    .detailed_itinerary(&query, usize::from(option - 1))
                    .await?
            };
            print_json(&itinerary)?;
        },

        Commands::Arrivals { stop_code } => {
            let arrivals = engine.arrivals(&stop_code).await?;
            print_json(&arrivals)?;
        },

        Commands::CheckConfig { .. } => {
            print_json(&serde_json::json!({
                "config": config,
                "health": engine.health().await,
            }))?;
        },
    }

    Ok(())
}
