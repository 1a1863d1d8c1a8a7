use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, instrument};

pub const IN_MEMORY_URL: &str = "sqlite::memory:";

/// Handle to the persisted store. Cheap to clone; every core operation takes
/// one explicitly.
#[derive(Clone, Debug)]
pub struct Store {
    pub pool: SqlitePool,
}

impl Store {
    // SECURITY: never include raw DSNs in tracing spans (they may point at private paths).
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let connect_options = SqliteConnectOptions::from_str(database_url)
            .context("invalid database URL")?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = is_in_memory(database_url);
        let pool_options = if in_memory {
            // Each in-memory database lives exactly as long as its connection:
            // keep a single one open for the life of the pool.
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections.max(1))
                .idle_timeout(Duration::from_secs(600))
        };

        let pool = pool_options
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(connect_options)
            .await
            .context("failed to open store")?;
        info!(in_memory, "connected to store");
        Ok(Self { pool })
    }

    /// Fresh volatile store, the reference deployment.
    pub async fn in_memory() -> Result<Self> {
        Self::connect(IN_MEMORY_URL, 1).await
    }

    /// Quick connectivity probe.
    pub async fn ping(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}

pub fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_in_memory_urls() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://file:awards?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite://data/awards.db"));
    }

    #[tokio::test]
    async fn in_memory_store_answers_pings() {
        let store = Store::in_memory().await.unwrap();
        assert!(store.ping().await);
    }
}
