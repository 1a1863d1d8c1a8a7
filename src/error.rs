//! Error types for the ingestion core.
//!
//! Binaries and startup wiring use `anyhow`; everything the pipeline can
//! fail with is spelled out here so the HTTP layer can tell a bad upload
//! apart from a broken store.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("invalid year `{0}`")]
    InvalidYear(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("batch size must be at least 1")]
pub struct ZeroBatchSize;

/// A batch write that was rolled back.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read source: {0}")]
    Source(String),
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: {source}")]
    Normalize {
        row: u64,
        #[source]
        source: NormalizeError,
    },
    #[error("batch {batch} failed: {source}")]
    Write {
        batch: usize,
        #[source]
        source: WriteError,
    },
}

impl IngestError {
    /// True when the failure was caused by the input rather than the store.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            IngestError::Csv(_) | IngestError::Normalize { .. } | IngestError::Source(_)
        )
    }
}
