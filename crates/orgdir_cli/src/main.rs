//! `orgdir` command-line front-end.
//!
//! # Responsibility
//! - Load config, start logging and open the catalog database.
//! - Map each subcommand onto one core service call and print JSON.
//! - Map service error codes onto process exit codes.

mod args;
mod seed;

use anyhow::{bail, Context, Result};
use args::{Cli, Command};
use clap::Parser;
use log::info;
use orgdir_core::{
    init_logging, load_config, open_db, open_db_in_memory, ActivityServiceError, BoundsQuery,
    DepthPolicy, RadiusQuery, SearchService, SearchServiceError, SqliteCatalogRepository,
};
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.logging)?;

    let policy = Arc::new(DepthPolicy::new(config.hierarchy.default_max_depth));
    if let Some(max_depth) = cli.max_depth {
        policy
            .set_max_depth(max_depth)
            .map_err(ActivityServiceError::from)?;
    }

    let db_path = cli.db.or(config.database.path);
    let mut conn = open_catalog(db_path.as_deref(), &cli.command)?;
    info!(
        "event=cli_command module=cli status=start persistent={} max_depth={}",
        db_path.is_some(),
        policy.get_max_depth()
    );

    if let Command::Seed {} = cli.command {
        return print_json(&seed::seed_catalog(&mut conn, policy)?);
    }
    let search = SearchService::new(SqliteCatalogRepository::try_new(&conn)?, policy);

    match cli.command {
        // Returned above.
        Command::Seed {} => Ok(()),
        Command::Get { id } => print_json(&search.get_organization(id)?),
        Command::ByName { name } => print_json(&search.get_organization_by_name(&name)?),
        Command::Search { fragment } => print_json(&search.search_by_name(&fragment)?),
        Command::Address { fragment } => print_json(&search.search_by_address(&fragment)?),
        Command::Activity { name } => print_json(&search.search_by_activity(&name)?),
        Command::Radius {
            lat,
            lon,
            radius_km,
        } => print_json(&search.search_by_radius(&RadiusQuery::new(lat, lon, radius_km))?),
        Command::Bounds {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        } => print_json(&search.search_by_bounds(&BoundsQuery::new(
            min_lat, min_lon, max_lat, max_lon,
        ))?),
    }
}

/// Opens the configured database file. Without one, query commands run
/// against a fresh in-memory copy of the demo catalog.
fn open_catalog(db_path: Option<&Path>, command: &Command) -> Result<Connection> {
    if let Some(path) = db_path {
        return open_db(path)
            .with_context(|| format!("failed to open database `{}`", path.display()));
    }
    if matches!(command, Command::Seed {}) {
        bail!("`seed` needs a database file; pass --db or set database.path");
    }

    let mut conn = open_db_in_memory()?;
    seed::seed_catalog(&mut conn, Arc::new(DepthPolicy::default()))?;
    info!("event=catalog_open module=cli status=ok mode=memory seeded=true");
    Ok(conn)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> u8 {
    let code = err
        .downcast_ref::<SearchServiceError>()
        .map(SearchServiceError::code)
        .or_else(|| {
            err.downcast_ref::<ActivityServiceError>()
                .map(ActivityServiceError::code)
        });
    match code {
        Some("not_found") => 3,
        Some("invalid_argument" | "invalid_coordinate") => 2,
        Some("conflict") => 4,
        _ => 1,
    }
}
