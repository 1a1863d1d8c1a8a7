//! Persistence: store handle, schema, batch writer and read-side queries.

pub mod bulk_writer;
pub mod db;
pub mod intervals;
pub mod listing;
pub mod schema;

pub use bulk_writer::{write_batch, BatchSink, WriteSummary, PRODUCER_CHUNK_SIZE};
pub use db::Store;
pub use intervals::compute_intervals;
pub use listing::{list_producers, list_records};
pub use schema::initialize_schema;
