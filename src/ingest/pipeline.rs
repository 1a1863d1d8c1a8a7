//! Pull-based ingestion state machine.
//!
//! ```text
//! Reading --threshold crossed--> Flushing --ok--> Reading
//!    |                              |
//!    |                              +--error--> Failed
//!    +--source exhausted--> Draining --ok--> Done
//!                              (skipped when nothing is buffered)
//! ```
//!
//! Rows are only pulled in `Reading`. While a batch is in `Flushing` or
//! `Draining` the source is not polled, which is the backpressure contract:
//! at most one batch in flight, and completion is reported only after the
//! trailing batch settles.

use serde::Serialize;
use tracing::{debug, error, info};

use super::accumulator::BatchAccumulator;
use super::source::RowSource;
use crate::database_ops::bulk_writer::{BatchSink, WriteSummary};
use crate::error::IngestError;
use crate::normalization::normalize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestState {
    Reading,
    Flushing,
    Draining,
    Done,
    Failed,
}

impl IngestState {
    pub fn is_terminal(self) -> bool {
        matches!(self, IngestState::Done | IngestState::Failed)
    }
}

/// Counters for one completed ingestion.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub rows_read: u64,
    pub rows_skipped: u64,
    pub batches: usize,
    pub written: WriteSummary,
}

pub struct IngestPipeline<'w, S, W: ?Sized> {
    source: S,
    sink: &'w W,
    accumulator: BatchAccumulator,
    state: IngestState,
    report: IngestReport,
}

impl<'w, S, W> IngestPipeline<'w, S, W>
where
    S: RowSource,
    W: BatchSink + ?Sized,
{
    pub fn new(source: S, sink: &'w W, batch_size: usize) -> Self {
        Self {
            source,
            sink,
            accumulator: BatchAccumulator::new(batch_size),
            state: IngestState::Reading,
            report: IngestReport::default(),
        }
    }

    pub fn state(&self) -> IngestState {
        self.state
    }

    pub fn report(&self) -> IngestReport {
        self.report
    }

    /// Drives the machine to `Done`, or stops at the first failure.
    pub async fn run(mut self) -> Result<IngestReport, IngestError> {
        while !self.state.is_terminal() {
            self.step().await?;
        }
        info!(
            rows_read = self.report.rows_read,
            rows_skipped = self.report.rows_skipped,
            batches = self.report.batches,
            records = self.report.written.records,
            "ingestion complete"
        );
        Ok(self.report)
    }

    /// Performs one transition and returns the state it landed in.
    /// Any error leaves the machine in `Failed`.
    pub async fn step(&mut self) -> Result<IngestState, IngestError> {
        let result = match self.state {
            IngestState::Reading => self.read_one().await,
            IngestState::Flushing => self.flush().await.map(|()| IngestState::Reading),
            IngestState::Draining => self.flush().await.map(|()| IngestState::Done),
            terminal => Ok(terminal),
        };
        self.state = match &result {
            Ok(next) => *next,
            Err(_) => IngestState::Failed,
        };
        result
    }

    async fn read_one(&mut self) -> Result<IngestState, IngestError> {
        let Some(raw) = self.source.next_row().await? else {
            return Ok(if self.accumulator.is_empty() {
                IngestState::Done
            } else {
                IngestState::Draining
            });
        };
        self.report.rows_read += 1;

        let record = normalize(&raw).map_err(|source| IngestError::Normalize {
            row: self.report.rows_read,
            source,
        })?;
        match record {
            Some(record) => self.accumulator.accept(record),
            None => {
                self.report.rows_skipped += 1;
                debug!(row = self.report.rows_read, "blank row skipped");
            }
        }

        Ok(if self.accumulator.should_flush() {
            IngestState::Flushing
        } else {
            IngestState::Reading
        })
    }

    async fn flush(&mut self) -> Result<(), IngestError> {
        let batch = self.accumulator.drain();
        self.report.batches += 1;
        let batch_no = self.report.batches;

        match self.sink.write_batch(&batch).await {
            Ok(summary) => {
                info!(
                    batch = batch_no,
                    size = batch.len(),
                    producer_chunks = summary.producer_chunks,
                    "batch committed"
                );
                self.report.written.absorb(summary);
                Ok(())
            }
            Err(source) => {
                error!(batch = batch_no, size = batch.len(), error = %source, "batch write failed; aborting ingestion");
                Err(IngestError::Write {
                    batch: batch_no,
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WriteError;
    use crate::ingest::source::CsvReaderSource;
    use crate::models::Record;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Remembers every batch it sees and fails the `fail_on`-th one.
    #[derive(Default)]
    struct RecordingSink {
        batches: Mutex<Vec<Vec<Record>>>,
        fail_on: Option<usize>,
    }

    #[async_trait]
    impl BatchSink for RecordingSink {
        async fn write_batch(&self, batch: &[Record]) -> Result<WriteSummary, WriteError> {
            let mut batches = self.batches.lock().unwrap();
            if self.fail_on == Some(batches.len() + 1) {
                return Err(WriteError::Store(sqlx::Error::Protocol("disk on fire".into())));
            }
            batches.push(batch.to_vec());
            Ok(WriteSummary {
                records: batch.len(),
                ..WriteSummary::default()
            })
        }
    }

    fn csv(rows: usize) -> String {
        let mut text = String::from("year;title;studios;producers;winner\n");
        for i in 0..rows {
            text.push_str(&format!("{};Movie {i};Studio;Producer {i};yes\n", 1980 + i));
        }
        text
    }

    fn source(text: &str) -> CsvReaderSource<&[u8]> {
        CsvReaderSource::new(text.as_bytes()).unwrap()
    }

    #[tokio::test]
    async fn batches_hold_threshold_plus_one_and_tail_is_drained() {
        let text = csv(10);
        let sink = RecordingSink::default();
        let report = IngestPipeline::new(source(&text), &sink, 3).run().await.unwrap();

        let sizes: Vec<usize> = sink.batches.lock().unwrap().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
        assert_eq!(report.batches, 3);
        assert_eq!(report.rows_read, 10);
        assert_eq!(report.written.records, 10);
    }

    #[tokio::test]
    async fn walks_through_the_expected_states() {
        let text = csv(3);
        let sink = RecordingSink::default();
        let mut pipeline = IngestPipeline::new(source(&text), &sink, 1);

        let mut states = vec![pipeline.state()];
        while !pipeline.state().is_terminal() {
            states.push(pipeline.step().await.unwrap());
        }
        use IngestState::*;
        assert_eq!(
            states,
            vec![Reading, Reading, Flushing, Reading, Reading, Draining, Done]
        );
    }

    #[tokio::test]
    async fn empty_source_finishes_without_flushing() {
        let text = csv(0);
        let sink = RecordingSink::default();
        let report = IngestPipeline::new(source(&text), &sink, 5).run().await.unwrap();
        assert_eq!(report, IngestReport::default());
        assert!(sink.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_rows_are_counted_and_skipped() {
        let text = "year;title;studios;producers;winner\n;;;;\n1980;T;S;P;yes\n;;;;\n";
        let sink = RecordingSink::default();
        let report = IngestPipeline::new(source(text), &sink, 100).run().await.unwrap();
        assert_eq!(report.rows_read, 3);
        assert_eq!(report.rows_skipped, 2);
        assert_eq!(report.written.records, 1);
    }

    #[tokio::test]
    async fn write_failure_stops_reading_and_reports_the_batch() {
        // 5 batches of 3 (threshold 2); the third write fails.
        let text = csv(15);
        let sink = RecordingSink {
            fail_on: Some(3),
            ..RecordingSink::default()
        };
        let mut pipeline = IngestPipeline::new(source(&text), &sink, 2);
        let err = loop {
            match pipeline.step().await {
                Ok(state) => assert!(!state.is_terminal(), "must fail before finishing"),
                Err(err) => break err,
            }
        };

        assert!(matches!(err, IngestError::Write { batch: 3, .. }));
        assert_eq!(pipeline.state(), IngestState::Failed);
        assert_eq!(sink.batches.lock().unwrap().len(), 2);
        // rows of batches 4 and 5 were never pulled
        assert_eq!(pipeline.report().rows_read, 9);
    }

    #[tokio::test]
    async fn incomplete_rows_are_written_as_they_are() {
        let text = "year;title;studios;producers;winner\n1980;A;S;P;yes\n1981;B;S;;yes\n1982;;S;P;\n";
        let sink = RecordingSink::default();
        let report = IngestPipeline::new(source(text), &sink, 100).run().await.unwrap();
        assert_eq!(report.written.records, 3);

        let batches = sink.batches.lock().unwrap();
        let titles: Vec<&str> = batches[0].iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", ""]);
        assert!(batches[0][1].producers.is_empty());
    }

    #[tokio::test]
    async fn unparsable_year_fails_the_ingestion() {
        let text = "year;title;studios;producers;winner\n1980;T;S;P;yes\nsoon;T2;S;P;\n";
        let sink = RecordingSink::default();
        let err = IngestPipeline::new(source(text), &sink, 100).run().await.unwrap_err();
        assert!(matches!(err, IngestError::Normalize { row: 2, .. }));
        assert!(sink.batches.lock().unwrap().is_empty());
    }
}
