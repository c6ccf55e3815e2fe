// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ikarus.flights contributors

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use ikarus_core::{
    default_session_path, split_key, AirportCatalog, AirportDatabase, AirportIndex, DataPaths,
    FlightHistory, Placement,
};
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding airports.json and airport_ids.json
    #[arg(short, long, env = "IKARUS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Session file holding the flight order
    #[arg(short, long, env = "IKARUS_SESSION")]
    session: Option<PathBuf>,

    /// Print debug output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the airport search index from the catalog
    BuildIndex,
    /// Search airports by IATA code or city prefix
    Airport {
        query: String,
        /// Include airports without an IATA code
        #[arg(long)]
        all: bool,
    },
    /// Manage the session file
    #[command(subcommand)]
    Session(SessionCommand),
    /// Manage flights of the current session
    #[command(subcommand)]
    Flight(FlightCommand),
    /// Show the statistics of the current session
    Stats,
}

#[derive(Subcommand)]
enum SessionCommand {
    /// Start a new, empty session (overwrites an existing one)
    New,
    /// Continue from a previously downloaded history file
    Upload { file: PathBuf },
    /// Write the full flight history to a file
    Download { file: PathBuf },
    /// Delete the session
    Delete,
}

#[derive(Subcommand)]
enum FlightCommand {
    /// Add a flight to the session
    Add(AddFlight),
    /// Remove a flight by key (YYYY-MM-DD_DEP_ARR)
    Remove { key: String },
    /// List all flights of the session
    List,
}

#[derive(Args)]
struct AddFlight {
    /// Departure ICAO code
    departure: String,
    /// Arrival ICAO code
    arrival: String,
    /// Flight date (YYYY-MM-DD)
    date: NaiveDate,
    /// Insert before this flight key instead of appending
    #[arg(long, conflicts_with = "after")]
    before: Option<String>,
    /// Insert after this flight key instead of appending
    #[arg(long)]
    after: Option<String>,
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let config = ConfigBuilder::new().add_filter_allow_str("ikarus").build();
    // Ignored if a logger is already installed
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}

fn load_session(path: &Path) -> Result<FlightHistory> {
    if !path.exists() {
        anyhow::bail!(
            "session not found - use `ikarus session new` or `ikarus session upload` ({})",
            path.display()
        );
    }
    FlightHistory::load_file(path)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let paths = DataPaths::resolve(cli.data_dir.as_deref());
    let session_path = cli.session.unwrap_or_else(default_session_path);
    log::debug!(
        "Resolved paths — airports={} index={} session={}",
        paths.airports.display(),
        paths.index.display(),
        session_path.display()
    );

    match cli.command {
        Commands::BuildIndex => {
            let catalog = AirportCatalog::load_file(&paths.airports)?;
            let index = AirportIndex::build(&catalog);
            index.save_file(&paths.index)?;
            println!(
                "Indexed {} airports under {} search keys -> {}",
                catalog.len(),
                index.len(),
                paths.index.display()
            );
        }
        Commands::Airport { query, all } => {
            let db = AirportDatabase::load(&paths)?;
            let matches = db.match_airports(&query, !all)?;
            let mut codes: Vec<_> = matches.into_iter().collect();
            codes.sort_by(|a, b| a.0.cmp(&b.0));
            for (code, found) in codes {
                let record = db.lookup(&code)?;
                println!(
                    "{:<4} {:<3} {:<24} {:<20} [{}]",
                    code,
                    found.iata,
                    record.city,
                    record.country,
                    found.matched.join(", ")
                );
            }
        }
        Commands::Session(SessionCommand::New) => {
            FlightHistory::new().save_file(&session_path)?;
            println!("created");
        }
        Commands::Session(SessionCommand::Upload { file }) => {
            let history = FlightHistory::load_file(&file)
                .with_context(|| format!("Failed to upload {}", file.display()))?;
            history.save_file(&session_path)?;
            println!("uploaded");
        }
        Commands::Session(SessionCommand::Download { file }) => {
            let db = AirportDatabase::load(&paths)?;
            let history = load_session(&session_path)?;
            let report = history.build_report(db.catalog())?;
            let content = serde_json::to_string_pretty(&report)?;
            std::fs::write(&file, content)
                .with_context(|| format!("Failed to write {}", file.display()))?;
            println!("Flight history written to {}", file.display());
        }
        Commands::Session(SessionCommand::Delete) => {
            FlightHistory::delete_file(&session_path)?;
            println!("deleted");
        }
        Commands::Flight(FlightCommand::Add(add)) => {
            let db = AirportDatabase::load(&paths)?;
            let mut history = load_session(&session_path)?;
            let key = db.build_key(add.date, &add.departure, &add.arrival)?;
            let display = key.to_string();
            match (add.before, add.after) {
                (Some(anchor), _) => {
                    history.insert(key, Placement::Before, &split_key(&anchor)?)?;
                }
                (None, Some(anchor)) => {
                    history.insert(key, Placement::After, &split_key(&anchor)?)?;
                }
                (None, None) => history.add(key)?,
            }
            history.save_file(&session_path)?;
            println!("Flight {} added successfully.", display);
        }
        Commands::Flight(FlightCommand::Remove { key }) => {
            let mut history = load_session(&session_path)?;
            let removed = history.remove(&split_key(&key)?)?;
            history.save_file(&session_path)?;
            println!("Flight {} removed.", removed);
        }
        Commands::Flight(FlightCommand::List) => {
            let db = AirportDatabase::load(&paths)?;
            let history = load_session(&session_path)?;
            let report = history.build_report(db.catalog())?;
            for (key, flight) in report.ordered_flights() {
                println!(
                    "{}  {} -> {}  {:>6} km  {:>5} kg CO2  {}",
                    key.date,
                    key.departure,
                    key.arrival,
                    flight.distance_km(),
                    flight.co2_kg(),
                    flight.flight_type()
                );
            }
        }
        Commands::Stats => {
            let db = AirportDatabase::load(&paths)?;
            let history = load_session(&session_path)?;
            let stats = history.build_report(db.catalog())?.stats;
            println!("Number of flights:   {}", stats.count);
            println!("Total CO2 [kg]:      {}", stats.total_co2_kg);
            println!("Total Distance [km]: {}", stats.total_distance_km);
        }
    }

    Ok(())
}
