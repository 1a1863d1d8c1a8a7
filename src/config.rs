// Runtime configuration: CLI flags first, then environment (.env included), then defaults.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::database_ops::db::IN_MEMORY_URL;
use crate::ingest::{check_batch_size, parse_batch_size, DEFAULT_BATCH_SIZE};
use crate::util::env::{env_opt, env_parse};

pub const DEFAULT_CSV_PATH: &str = "./data/Movielist.csv";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "award-intervals",
    version,
    about = "Loads award history from CSV and serves producer win intervals"
)]
pub struct Cli {
    /// CSV file loaded at startup (env: DATA_PATH)
    #[arg(long)]
    pub csv: Option<PathBuf>,
    /// Bind address (env: API_HOST)
    #[arg(long)]
    pub host: Option<String>,
    /// Listening port (env: PORT)
    #[arg(long)]
    pub port: Option<u16>,
    /// Records buffered per transaction (env: BATCH_SIZE)
    #[arg(long, value_parser = parse_batch_size)]
    pub batch_size: Option<usize>,
    /// SQLite URL (env: DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub csv_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub batch_size: usize,
    pub database_url: String,
    pub max_connections: u32,
}

impl AppConfig {
    /// Parses the process arguments and resolves the rest from the environment.
    pub fn load() -> Result<Self> {
        Self::from_cli(Cli::parse())
    }

    pub fn from_cli(cli: Cli) -> Result<Self> {
        let batch_size = check_batch_size(
            cli.batch_size
                .unwrap_or_else(|| env_parse("BATCH_SIZE", DEFAULT_BATCH_SIZE)),
        )?;

        Ok(Self {
            csv_path: cli
                .csv
                .or_else(|| env_opt("DATA_PATH").map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CSV_PATH)),
            host: cli
                .host
                .or_else(|| env_opt("API_HOST"))
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.unwrap_or_else(|| env_parse("PORT", DEFAULT_PORT)),
            batch_size,
            database_url: cli
                .database_url
                .or_else(|| env_opt("DATABASE_URL"))
                .unwrap_or_else(|| IN_MEMORY_URL.to_string()),
            max_connections: env_parse("DB_MAX_CONNS", DEFAULT_MAX_CONNECTIONS),
        })
    }
}
