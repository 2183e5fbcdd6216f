//! # Sink - Decoded Row Destinations
//!
//! A decode pass pushes two ordered row streams into a [`RecordSink`]:
//!
//! - full-fidelity rows ([`FullRow`]): one per sample, every supported sensor;
//! - paired rows ([`PairedRow`]): accelerometer and gyroscope zipped per index.
//!
//! | Sink                   | Use                                         |
//! |------------------------|---------------------------------------------|
//! | [`CsvSink`]            | the two CSV tables written by `dump --csv`  |
//! | [`MemorySink`]         | keeps every row, for tests and callers      |
//! | [`NullSink`]           | discards rows, report only                  |
//!
//! [`Summary`] tracks the record count and the first/last record timestamps
//! for the decode report.

mod csv_sink;

pub use csv_sink::{
    CsvSink, FullFidelityWriter, PairedStreamWriter, FULL_FIDELITY_HEADER, PAIRED_STREAM_HEADER,
};

use record::{FullRow, PairedRow};
use thiserror::Error;

/// Errors raised while writing rows.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Destination for decoded rows. Rows arrive in output order.
pub trait RecordSink {
    /// Accepts one full-fidelity row.
    fn full_row(&mut self, row: &FullRow) -> Result<(), SinkError>;

    /// Accepts one paired row.
    fn paired_row(&mut self, row: &PairedRow) -> Result<(), SinkError>;

    /// Flushes buffered output. Called once at the end of a pass, including a
    /// pass that stopped early.
    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    fn full_row(&mut self, row: &FullRow) -> Result<(), SinkError> {
        (**self).full_row(row)
    }

    fn paired_row(&mut self, row: &PairedRow) -> Result<(), SinkError> {
        (**self).paired_row(row)
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        (**self).finish()
    }
}

/// Keeps every row in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySink {
    pub full: Vec<FullRow>,
    pub paired: Vec<PairedRow>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordSink for MemorySink {
    fn full_row(&mut self, row: &FullRow) -> Result<(), SinkError> {
        self.full.push(*row);
        Ok(())
    }

    fn paired_row(&mut self, row: &PairedRow) -> Result<(), SinkError> {
        self.paired.push(*row);
        Ok(())
    }
}

/// Discards every row.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl RecordSink for NullSink {
    fn full_row(&mut self, _row: &FullRow) -> Result<(), SinkError> {
        Ok(())
    }

    fn paired_row(&mut self, _row: &PairedRow) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Record count and time span of a decode pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Records decoded.
    pub record_count: usize,
    /// Timestamp of the first record, if any.
    pub first_timestamp: Option<u32>,
    /// Timestamp of the last record, if any.
    pub last_timestamp: Option<u32>,
}

impl Summary {
    /// Counts one record stamped `timestamp`.
    pub fn observe(&mut self, timestamp: u32) {
        self.record_count += 1;
        self.first_timestamp.get_or_insert(timestamp);
        self.last_timestamp = Some(timestamp);
    }

    /// `last - first` in milliseconds, 0 without records. Negative if the
    /// device clock went backwards.
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        match (self.first_timestamp, self.last_timestamp) {
            (Some(first), Some(last)) => i64::from(last) - i64::from(first),
            _ => 0,
        }
    }
}
