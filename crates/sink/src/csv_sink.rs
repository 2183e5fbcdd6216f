use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::{Writer, WriterBuilder};
use record::{FullRow, PairedRow, Sample};
use tracing::debug;

use crate::{RecordSink, SinkError};

/// Header of the full-fidelity table. Rows carry one to three value fields
/// after the type, so the table is written flexible.
pub const FULL_FIDELITY_HEADER: [&str; 3] = ["Timestamp", "T", "<val>"];

/// Header of the paired table.
pub const PAIRED_STREAM_HEADER: [&str; 7] = [
    "Timestamp",
    "AccelerometerX",
    "AccelerometerY",
    "AccelerometerZ",
    "GyroscopeX",
    "GyroscopeY",
    "GyroscopeZ",
];

/// `;`-separated table, one row per sample: `timestamp;type;v1[;v2;v3]`.
#[derive(Debug)]
pub struct FullFidelityWriter<W: Write> {
    inner: Writer<W>,
    rows: usize,
}

impl<W: Write> FullFidelityWriter<W> {
    /// Wraps `out` and writes the header.
    pub fn new(out: W) -> Result<Self, SinkError> {
        let mut inner = WriterBuilder::new()
            .delimiter(b';')
            .flexible(true)
            .has_headers(false)
            .from_writer(out);
        inner.write_record(FULL_FIDELITY_HEADER)?;
        Ok(Self { inner, rows: 0 })
    }

    pub fn write_row(&mut self, row: &FullRow) -> Result<(), SinkError> {
        let mut fields = vec![
            row.timestamp.to_string(),
            row.sample.sensor().tag().to_string(),
        ];
        match row.sample {
            Sample::Accel(v) => fields.extend(v.iter().map(ToString::to_string)),
            Sample::Gyro(v) => fields.extend(v.iter().map(ToString::to_string)),
            Sample::Keyboard(v) => fields.push(v.to_string()),
        }
        self.inner.write_record(&fields)?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written, header excluded.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn flush(&mut self) -> Result<(), SinkError> {
        self.inner.flush()?;
        Ok(())
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> Result<W, SinkError> {
        self.inner
            .into_inner()
            .map_err(|e| SinkError::Io(e.into_error()))
    }
}

/// `,`-separated table of paired rows; the columns of a missing sensor are
/// left blank.
#[derive(Debug)]
pub struct PairedStreamWriter<W: Write> {
    inner: Writer<W>,
    rows: usize,
}

impl<W: Write> PairedStreamWriter<W> {
    /// Wraps `out` and writes the header.
    pub fn new(out: W) -> Result<Self, SinkError> {
        let mut inner = WriterBuilder::new().has_headers(false).from_writer(out);
        inner.write_record(PAIRED_STREAM_HEADER)?;
        Ok(Self { inner, rows: 0 })
    }

    pub fn write_row(&mut self, row: &PairedRow) -> Result<(), SinkError> {
        let mut fields = Vec::with_capacity(PAIRED_STREAM_HEADER.len());
        fields.push(row.timestamp.to_string());
        match row.accel {
            Some(v) => fields.extend(v.iter().map(ToString::to_string)),
            None => fields.extend(std::iter::repeat(String::new()).take(3)),
        }
        match row.gyro {
            Some(v) => fields.extend(v.iter().map(ToString::to_string)),
            None => fields.extend(std::iter::repeat(String::new()).take(3)),
        }
        self.inner.write_record(&fields)?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written, header excluded.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn flush(&mut self) -> Result<(), SinkError> {
        self.inner.flush()?;
        Ok(())
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> Result<W, SinkError> {
        self.inner
            .into_inner()
            .map_err(|e| SinkError::Io(e.into_error()))
    }
}

/// Writes both tables.
#[derive(Debug)]
pub struct CsvSink<W: Write> {
    full: FullFidelityWriter<W>,
    paired: PairedStreamWriter<W>,
}

impl<W: Write> CsvSink<W> {
    pub fn new(full: W, paired: W) -> Result<Self, SinkError> {
        Ok(Self {
            full: FullFidelityWriter::new(full)?,
            paired: PairedStreamWriter::new(paired)?,
        })
    }

    /// Flushes and returns the full-fidelity and paired writers.
    pub fn into_inner(self) -> Result<(W, W), SinkError> {
        Ok((self.full.into_inner()?, self.paired.into_inner()?))
    }
}

impl CsvSink<File> {
    /// Creates (or truncates) the two table files.
    pub fn create(full: impl AsRef<Path>, paired: impl AsRef<Path>) -> Result<Self, SinkError> {
        let (full, paired) = (full.as_ref(), paired.as_ref());
        debug!(full = %full.display(), paired = %paired.display(), "creating csv tables");
        Self::new(File::create(full)?, File::create(paired)?)
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn full_row(&mut self, row: &FullRow) -> Result<(), SinkError> {
        self.full.write_row(row)
    }

    fn paired_row(&mut self, row: &PairedRow) -> Result<(), SinkError> {
        self.paired.write_row(row)
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.full.flush()?;
        self.paired.flush()?;
        debug!(
            full_rows = self.full.rows(),
            paired_rows = self.paired.rows(),
            "csv tables flushed"
        );
        Ok(())
    }
}
