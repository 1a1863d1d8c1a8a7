use indexmap::IndexMap;

use crate::error::NormalizeError;
use crate::models::Record;
use crate::normalization::producers::split_producers;

pub const TITLE: &str = "title";
pub const STUDIOS: &str = "studios";
pub const YEAR: &str = "year";
pub const PRODUCERS: &str = "producers";
pub const WINNER: &str = "winner";

/// The only `winner` value that marks a win. Matched case-sensitively.
pub const WIN_TOKEN: &str = "yes";

/// One untyped source row, keyed by header name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow(IndexMap<String, String>);

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs header names with field values. Extra fields without a header are
    /// ignored; missing trailing fields stay absent.
    pub fn from_fields<'a, H, F>(headers: H, fields: F) -> Self
    where
        H: IntoIterator<Item = &'a String>,
        F: IntoIterator<Item = &'a str>,
    {
        let map = headers
            .into_iter()
            .zip(fields)
            .map(|(h, f)| (h.clone(), f.to_string()))
            .collect();
        Self(map)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// A row with no non-empty field is a blank line.
    pub fn is_blank(&self) -> bool {
        self.0.values().all(|v| v.is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Cleans a header cell: strips a UTF-8 byte order mark and surrounding spaces.
pub fn header_name(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_string()
}

/// Turns a raw row into a typed record.
///
/// Blank rows yield `Ok(None)` and are meant to be skipped silently. Any other
/// row passes through with its text fields trimmed, empty or absent ones
/// included; an empty `producers` field gives a record without producers.
/// The year is the only field that must parse, since it is stored as an integer.
pub fn normalize(row: &RawRow) -> Result<Option<Record>, NormalizeError> {
    if row.is_blank() {
        return Ok(None);
    }

    let year_raw = field(row, YEAR);
    let year = year_raw
        .parse::<i64>()
        .map_err(|_| NormalizeError::InvalidYear(year_raw.to_string()))?;

    Ok(Some(Record {
        title: field(row, TITLE).to_string(),
        studio: field(row, STUDIOS).to_string(),
        year,
        won: row.get(WINNER) == Some(WIN_TOKEN),
        producers: split_producers(field(row, PRODUCERS)),
    }))
}

fn field<'a>(row: &'a RawRow, name: &str) -> &'a str {
    row.get(name).map(str::trim).unwrap_or_default()
}
