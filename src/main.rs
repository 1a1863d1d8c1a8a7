use anyhow::{Context, Result};
use award_intervals::api::ApiServer;
use award_intervals::config::AppConfig;
use award_intervals::database_ops::{initialize_schema, Store};
use award_intervals::ingest::ingest_from_path;
use award_intervals::util::{env, logging};
use tracing::{error, info};

#[actix_web::main]
async fn main() {
    env::init_env();
    if let Err(e) = logging::init_tracing(logging::DEFAULT_FILTER) {
        eprintln!("{e:#}");
    }

    if let Err(e) = run().await {
        error!(error = ?e, "award-intervals stopped");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = AppConfig::load()?;

    let store = Store::connect(&config.database_url, config.max_connections).await?;
    initialize_schema(&store).await?;

    let report = ingest_from_path(&store, &config.csv_path, config.batch_size)
        .await
        .with_context(|| format!("failed to load {}", config.csv_path.display()))?;
    info!(
        records = report.written.records,
        skipped = report.rows_skipped,
        batches = report.batches,
        "initial data loaded"
    );

    ApiServer::from_config(&config).run(store).await
}
