//! Source row normalization: raw string fields in, typed [`Record`](crate::models::Record) out.

pub mod producers;
pub mod row;

pub use producers::split_producers;
pub use row::{normalize, RawRow};
