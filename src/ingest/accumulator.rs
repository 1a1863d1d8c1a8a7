use crate::error::ZeroBatchSize;
use crate::models::Record;

/// Records buffered per batch unless `BATCH_SIZE` says otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 100;

pub fn check_batch_size(size: usize) -> Result<usize, ZeroBatchSize> {
    if size == 0 {
        return Err(ZeroBatchSize);
    }
    Ok(size)
}

/// Command-line parser for batch sizes; shared by every binary.
pub fn parse_batch_size(raw: &str) -> Result<usize, String> {
    let size = raw
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("invalid batch size `{raw}`: {e}"))?;
    check_batch_size(size).map_err(|e| e.to_string())
}

/// Buffers normalized records until the threshold is crossed.
///
/// A flush is due once the buffer holds strictly more than `threshold`
/// records, so a full batch carries `threshold + 1` of them.
#[derive(Debug)]
pub struct BatchAccumulator {
    threshold: usize,
    buffer: Vec<Record>,
}

impl BatchAccumulator {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            buffer: Vec::with_capacity(threshold.saturating_add(1)),
        }
    }

    pub fn accept(&mut self, record: Record) {
        self.buffer.push(record);
    }

    pub fn should_flush(&self) -> bool {
        self.buffer.len() > self.threshold
    }

    /// Hands back the buffered records and leaves the buffer empty.
    pub fn drain(&mut self) -> Vec<Record> {
        std::mem::replace(
            &mut self.buffer,
            Vec::with_capacity(self.threshold.saturating_add(1)),
        )
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }
}

impl Default for BatchAccumulator {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}
