//! Command-line argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "orgdir")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Query the organization directory catalog")]
pub struct Cli {
    /// TOML config file; `ORGDIR__*` variables override it.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// SQLite database file; overrides `database.path`.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
    /// Maximum activity depth applied before the command runs.
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub max_depth: Option<i64>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load the demo catalog into --db unless it already holds data
    Seed {},
    /// Show one organization by id
    Get { id: i64 },
    /// Show one organization by exact name
    ByName { name: String },
    /// Organizations whose name contains the text, ignoring case
    Search { fragment: String },
    /// Organizations whose building address contains the text
    Address { fragment: String },
    /// Organizations under an activity and its sub-activities
    Activity { name: String },
    /// Organizations within a great-circle radius
    Radius {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        #[arg(long)]
        radius_km: f64,
    },
    /// Organizations inside a latitude/longitude rectangle
    Bounds {
        #[arg(long, allow_negative_numbers = true)]
        min_lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        min_lon: f64,
        #[arg(long, allow_negative_numbers = true)]
        max_lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        max_lon: f64,
    },
}
