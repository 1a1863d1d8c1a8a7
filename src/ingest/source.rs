//! Row sources for the ingestion pipeline.
//!
//! A source yields one [`RawRow`] per data line and is only polled when the
//! pipeline is ready for the next row, so a pending flush holds the
//! underlying file or request body where it is.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use csv::{ReaderBuilder, StringRecord, Trim};
use futures::{Stream, StreamExt};
use memchr::{memchr, memchr3};
use std::collections::VecDeque;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::IngestError;
use crate::normalization::row::{header_name, RawRow};

pub const FIELD_DELIMITER: u8 = b';';

#[async_trait(?Send)]
pub trait RowSource {
    /// Next data row, or `None` once the source is exhausted.
    async fn next_row(&mut self) -> Result<Option<RawRow>, IngestError>;
}

fn reader_builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder
        .delimiter(FIELD_DELIMITER)
        .flexible(true)
        .trim(Trim::None);
    builder
}

/// Rows from any blocking reader; the header line names the fields.
pub struct CsvReaderSource<R: Read> {
    reader: csv::Reader<R>,
    headers: Vec<String>,
    record: StringRecord,
}

impl<R: Read> CsvReaderSource<R> {
    pub fn new(reader: R) -> Result<Self, IngestError> {
        let mut reader = reader_builder().has_headers(true).from_reader(reader);
        let headers = reader.headers()?.iter().map(header_name).collect();
        Ok(Self {
            reader,
            headers,
            record: StringRecord::new(),
        })
    }
}

impl CsvReaderSource<BufReader<File>> {
    pub fn from_path(path: &Path) -> Result<Self, IngestError> {
        let file = File::open(path).map_err(|source| IngestError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(BufReader::with_capacity(1 << 20, file))
    }
}

#[async_trait(?Send)]
impl<R: Read> RowSource for CsvReaderSource<R> {
    async fn next_row(&mut self) -> Result<Option<RawRow>, IngestError> {
        if !self.reader.read_record(&mut self.record)? {
            return Ok(None);
        }
        Ok(Some(RawRow::from_fields(&self.headers, &self.record)))
    }
}

/// Where the boundary scan stands inside the current field. Mirrors the csv
/// reader: a quote opens a quoted field only as the field's first byte, `""`
/// inside one is an escaped quote, and any other quote is literal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    FieldStart,
    Unquoted,
    Quoted,
    /// Just read a quote inside a quoted field: either its end or half of `""`.
    QuotedQuote,
}

/// Rows from an async stream of byte chunks, such as an HTTP request body.
///
/// Chunks are buffered until they hold at least one complete record (a
/// newline outside a quoted field); only complete records are handed to the
/// CSV parser, so records split across chunk boundaries parse correctly.
pub struct ByteStreamSource<S> {
    stream: S,
    pending: BytesMut,
    scanned: usize,
    scan: Scan,
    headers: Option<Vec<String>>,
    ready: VecDeque<RawRow>,
    exhausted: bool,
}

impl<S, E> ByteStreamSource<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            pending: BytesMut::new(),
            scanned: 0,
            scan: Scan::FieldStart,
            headers: None,
            ready: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Length of the prefix of `pending` that ends on a record boundary.
    fn complete_prefix_len(&mut self) -> Option<usize> {
        let buf = &self.pending[..];
        let mut boundary = None;
        let mut pos = self.scanned;
        while pos < buf.len() {
            let rest = &buf[pos..];
            let found = match self.scan {
                Scan::Quoted => memchr(b'"', rest),
                _ => memchr3(b'"', FIELD_DELIMITER, b'\n', rest),
            };
            // Ordinary bytes skipped outside quotes put us inside an unquoted field.
            let skipped = found.unwrap_or(rest.len());
            if skipped > 0 && self.scan != Scan::Quoted {
                self.scan = Scan::Unquoted;
            }
            let Some(offset) = found else {
                break;
            };

            let at = pos + offset;
            self.scan = match (self.scan, buf[at]) {
                (Scan::Quoted, _) => Scan::QuotedQuote,
                (Scan::FieldStart, b'"') | (Scan::QuotedQuote, b'"') => Scan::Quoted,
                (_, b'"') => Scan::Unquoted,
                (_, b'\n') => {
                    boundary = Some(at + 1);
                    Scan::FieldStart
                }
                _ => Scan::FieldStart,
            };
            pos = at + 1;
        }
        self.scanned = buf.len();
        boundary
    }

    fn parse(&mut self, bytes: &[u8]) -> Result<(), IngestError> {
        let mut reader = reader_builder().has_headers(false).from_reader(bytes);
        let mut record = StringRecord::new();
        while reader.read_record(&mut record)? {
            let row = self
                .headers
                .as_ref()
                .map(|headers| RawRow::from_fields(headers, &record));
            match row {
                Some(row) => self.ready.push_back(row),
                None => self.headers = Some(record.iter().map(header_name).collect()),
            }
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl<S, E> RowSource for ByteStreamSource<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
{
    async fn next_row(&mut self) -> Result<Option<RawRow>, IngestError> {
        loop {
            if let Some(row) = self.ready.pop_front() {
                return Ok(Some(row));
            }
            if self.exhausted {
                return Ok(None);
            }
            match self.stream.next().await {
                Some(chunk) => {
                    let chunk = chunk.map_err(|e| IngestError::Source(e.to_string()))?;
                    self.pending.extend_from_slice(&chunk);
                    if let Some(end) = self.complete_prefix_len() {
                        let complete = self.pending.split_to(end);
                        self.scanned = self.pending.len();
                        self.parse(&complete)?;
                    }
                }
                None => {
                    self.exhausted = true;
                    let rest = self.pending.split();
                    if !rest.is_empty() {
                        self.parse(&rest)?;
                    }
                }
            }
        }
    }
}
