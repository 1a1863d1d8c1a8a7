// Transactional batch writer: movies, producers and their links in one transaction.

use async_trait::async_trait;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, Transaction};
use tracing::{debug, instrument, warn};

use super::db::Store;
use crate::error::WriteError;
use crate::models::Record;

/// Upper bound on producer names bound into a single INSERT statement.
pub const PRODUCER_CHUNK_SIZE: usize = 1000;

/// What one committed batch did to the store.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    pub records: usize,
    pub producer_chunks: usize,
    pub associations: usize,
}

impl WriteSummary {
    pub fn absorb(&mut self, other: WriteSummary) {
        self.records += other.records;
        self.producer_chunks += other.producer_chunks;
        self.associations += other.associations;
    }
}

/// Destination for drained batches. Implemented by [`Store`]; tests plug in
/// their own sinks to observe or fail specific batches.
#[async_trait]
pub trait BatchSink: Send + Sync {
    async fn write_batch(&self, batch: &[Record]) -> Result<WriteSummary, WriteError>;
}

#[async_trait]
impl BatchSink for Store {
    async fn write_batch(&self, batch: &[Record]) -> Result<WriteSummary, WriteError> {
        write_batch(self, batch).await
    }
}

/// Writes one batch atomically.
///
/// Each movie is upserted on `(title, studios, year)` keeping its surrogate id,
/// its association rows are deleted, the batch's distinct producer names are
/// inserted in chunks of [`PRODUCER_CHUNK_SIZE`], and the associations are
/// rebuilt from the record's producer set. Any failure rolls the whole batch back.
#[instrument(skip_all, fields(batch_len = batch.len()))]
pub async fn write_batch(store: &Store, batch: &[Record]) -> Result<WriteSummary, WriteError> {
    let records = collapse_by_natural_key(batch);
    if records.is_empty() {
        return Ok(WriteSummary::default());
    }

    let mut tx = store.pool.begin().await?;
    match write_in_tx(&mut tx, &records).await {
        Ok(summary) => {
            tx.commit().await?;
            debug!(
                records = summary.records,
                producer_chunks = summary.producer_chunks,
                associations = summary.associations,
                "batch committed"
            );
            Ok(summary)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "rollback failed after batch error");
            }
            Err(err)
        }
    }
}

async fn write_in_tx(
    tx: &mut Transaction<'_, Sqlite>,
    records: &[&Record],
) -> Result<WriteSummary, WriteError> {
    let mut movie_ids = Vec::with_capacity(records.len());
    for record in records {
        let movie_id: i64 = sqlx::query_scalar(
            "INSERT INTO movies (title, studios, year, winner) VALUES (?, ?, ?, ?) \
             ON CONFLICT (title, studios, year) DO UPDATE SET winner = excluded.winner \
             RETURNING id",
        )
        .bind(&record.title)
        .bind(&record.studio)
        .bind(record.year)
        .bind(record.won)
        .fetch_one(&mut **tx)
        .await?;

        sqlx::query("DELETE FROM movie_producers WHERE movie_id = ?")
            .bind(movie_id)
            .execute(&mut **tx)
            .await?;
        movie_ids.push(movie_id);
    }

    let names: Vec<&str> = records
        .iter()
        .flat_map(|r| r.producers.iter().map(String::as_str))
        .collect::<IndexSet<&str>>()
        .into_iter()
        .collect();
    let producer_chunks = upsert_producers(tx, &names).await?;

    let mut associations = 0;
    for (movie_id, record) in movie_ids.iter().zip(records) {
        for name in &record.producers {
            sqlx::query(
                "INSERT INTO movie_producers (movie_id, producer_id) \
                 VALUES (?, (SELECT id FROM producers WHERE name = ?))",
            )
            .bind(movie_id)
            .bind(name)
            .execute(&mut **tx)
            .await?;
            associations += 1;
        }
    }

    Ok(WriteSummary {
        records: records.len(),
        producer_chunks,
        associations,
    })
}

/// Inserts unseen producer names; existing rows are left untouched.
/// Returns the number of statements issued.
async fn upsert_producers(
    tx: &mut Transaction<'_, Sqlite>,
    names: &[&str],
) -> Result<usize, WriteError> {
    let mut chunks = 0;
    for chunk in names.chunks(PRODUCER_CHUNK_SIZE) {
        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new("INSERT INTO producers (name) ");
        qb.push_values(chunk, |mut b, name| {
            b.push_bind(*name);
        });
        qb.push(" ON CONFLICT (name) DO NOTHING");
        qb.build().execute(&mut **tx).await?;
        chunks += 1;
        debug!(chunk = chunks, names = chunk.len(), "producer chunk upserted");
    }
    Ok(chunks)
}

/// Keeps the last occurrence of every natural key, at the position of its
/// first occurrence, so each movie id is rebuilt exactly once per batch.
fn collapse_by_natural_key(batch: &[Record]) -> Vec<&Record> {
    let mut latest: IndexMap<(&str, &str, i64), &Record> = IndexMap::with_capacity(batch.len());
    for record in batch {
        latest.insert(record.natural_key(), record);
    }
    latest.into_values().collect()
}
