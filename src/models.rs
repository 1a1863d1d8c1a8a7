// Domain types shared by the ingestion pipeline, the store and the HTTP layer.

use serde::{Deserialize, Serialize};

/// A normalized award entry, ready to be written.
///
/// `(title, studio, year)` is the natural key; the surrogate id is assigned by
/// the store and never travels with the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub title: String,
    #[serde(rename = "studios")]
    pub studio: String,
    pub year: i64,
    #[serde(rename = "winner")]
    pub won: bool,
    /// Distinct producer names, in source order.
    pub producers: Vec<String>,
}

impl Record {
    pub fn natural_key(&self) -> (&str, &str, i64) {
        (&self.title, &self.studio, self.year)
    }
}

/// A persisted movie together with the names of its producers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieRow {
    pub id: i64,
    pub title: String,
    pub studios: String,
    pub year: i64,
    pub winner: bool,
    pub producers: Vec<String>,
}

/// A persisted producer together with the titles it is linked to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerRow {
    pub id: i64,
    pub name: String,
    pub movies: Vec<String>,
}

/// Gap between two consecutive wins of one producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interval {
    pub producer: String,
    pub interval: i64,
    pub previous_win: i64,
    pub following_win: i64,
}

/// Intervals holding the global minimum and maximum gap. Ties keep every entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerIntervals {
    pub min: Vec<Interval>,
    pub max: Vec<Interval>,
}
