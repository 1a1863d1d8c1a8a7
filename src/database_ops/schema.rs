use anyhow::{Context, Result};
use tracing::{info, instrument};

use super::db::Store;

const SCHEMA: [(&str, &str); 3] = [
    (
        "movies",
        r#"
        CREATE TABLE IF NOT EXISTS movies (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            studios TEXT NOT NULL,
            year INTEGER NOT NULL,
            winner BOOLEAN NOT NULL,
            UNIQUE (title, studios, year)
        )
        "#,
    ),
    (
        "producers",
        r#"
        CREATE TABLE IF NOT EXISTS producers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    ),
    (
        "movie_producers",
        r#"
        CREATE TABLE IF NOT EXISTS movie_producers (
            movie_id INTEGER NOT NULL REFERENCES movies (id) ON DELETE CASCADE,
            producer_id INTEGER NOT NULL REFERENCES producers (id) ON DELETE CASCADE,
            PRIMARY KEY (movie_id, producer_id)
        )
        "#,
    ),
];

/// Creates the movies, producers and movie_producers relations if absent.
/// Safe to run against an already initialized store.
#[instrument(skip(store))]
pub async fn initialize_schema(store: &Store) -> Result<()> {
    let mut tx = store.pool.begin().await.context("schema: begin")?;
    for (table, ddl) in SCHEMA {
        sqlx::query(ddl)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("schema: create {table}"))?;
    }
    tx.commit().await.context("schema: commit")?;
    info!(tables = SCHEMA.len(), "schema ready");
    Ok(())
}
