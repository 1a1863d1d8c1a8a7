use anyhow::{Context, Result};
use award_intervals::database_ops::{
    compute_intervals, initialize_schema, list_producers, list_records, Store,
};
use award_intervals::ingest::{ingest_from_path, parse_batch_size, DEFAULT_BATCH_SIZE};
use award_intervals::util::{env, logging};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "intervals",
    version,
    about = "Loads a movie list into a scratch store and prints a report"
)]
struct Cli {
    /// `;`-delimited CSV with year, title, studios, producers and winner columns
    csv: PathBuf,
    #[arg(long, value_enum, default_value_t = Report::Intervals)]
    report: Report,
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE, value_parser = parse_batch_size)]
    batch_size: usize,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Report {
    /// Shortest and longest gaps between consecutive wins
    Intervals,
    Movies,
    Producers,
}

#[tokio::main]
async fn main() -> Result<()> {
    env::init_env();
    logging::init_tracing("warn")?;
    let cli = Cli::parse();

    let store = Store::in_memory().await?;
    initialize_schema(&store).await?;
    ingest_from_path(&store, &cli.csv, cli.batch_size)
        .await
        .with_context(|| format!("failed to load {}", cli.csv.display()))?;

    let json = match cli.report {
        Report::Intervals => serde_json::to_string_pretty(&compute_intervals(&store).await?)?,
        Report::Movies => serde_json::to_string_pretty(&list_records(&store).await?)?,
        Report::Producers => serde_json::to_string_pretty(&list_producers(&store).await?)?,
    };
    println!("{json}");
    Ok(())
}
