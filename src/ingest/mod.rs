//! Ingestion entry points: CSV files, streamed uploads and direct inserts.
//!
//! All of them end in the same [`BatchSink`]; every call takes the store
//! handle explicitly.

pub mod accumulator;
pub mod pipeline;
pub mod source;

use bytes::Bytes;
use futures::Stream;
use std::fmt::Display;
use std::path::Path;
use tracing::{info, instrument};

use crate::database_ops::bulk_writer::{write_batch, BatchSink, WriteSummary};
use crate::database_ops::db::Store;
use crate::error::{IngestError, WriteError};
use crate::models::Record;

pub use accumulator::{check_batch_size, parse_batch_size, BatchAccumulator, DEFAULT_BATCH_SIZE};
pub use pipeline::{IngestPipeline, IngestReport, IngestState};
pub use source::{ByteStreamSource, CsvReaderSource, RowSource};

/// Loads a whole `;`-delimited file.
#[instrument(skip(store, path), fields(file = %path.as_ref().display()))]
pub async fn ingest_from_path(
    store: &Store,
    path: impl AsRef<Path>,
    batch_size: usize,
) -> Result<IngestReport, IngestError> {
    info!("loading CSV file");
    let source = CsvReaderSource::from_path(path.as_ref())?;
    ingest_rows(source, store, batch_size).await
}

/// Ingests an uploaded body chunk by chunk. The body is not read any further
/// while a batch is being written.
#[instrument(skip(store, stream))]
pub async fn ingest_from_stream<S, E>(
    store: &Store,
    stream: S,
    batch_size: usize,
) -> Result<IngestReport, IngestError>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
{
    ingest_rows(ByteStreamSource::new(stream), store, batch_size).await
}

/// Runs any row source into any sink.
pub async fn ingest_rows<S, W>(
    source: S,
    sink: &W,
    batch_size: usize,
) -> Result<IngestReport, IngestError>
where
    S: RowSource,
    W: BatchSink + ?Sized,
{
    IngestPipeline::new(source, sink, batch_size).run().await
}

/// Writes a single record through the batch writer.
pub async fn upsert_one(store: &Store, record: &Record) -> Result<WriteSummary, WriteError> {
    write_batch(store, std::slice::from_ref(record)).await
}

/// Writes many records as one transaction, bypassing the CSV parser.
pub async fn upsert_many(store: &Store, records: &[Record]) -> Result<WriteSummary, WriteError> {
    write_batch(store, records).await
}
