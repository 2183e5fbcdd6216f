//! Record payload decoding.
//!
//! ```text
//! [timestamp: u32 LE]
//! [type: u8][length: u8][samples: length B]    ← sub-record
//! [type: u8][length: u8][samples: length B]
//! ...
//! [type = 0]                                   ← end of record
//! ```
//!
//! Two policies read the same sub-records:
//!
//! - [`decode_full`]: one [`FullRow`] per sample, every supported sensor.
//! - [`decode_paired`]: accelerometer and gyroscope samples of one record
//!   zipped into [`PairedRow`]s with synthesized timestamps.

use byteorder::{LittleEndian, ReadBytesExt};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::clock::SampleClock;
use crate::RecordError;

/// Size of the record timestamp.
pub const TIMESTAMP_BYTES: usize = 4;

/// Size of a sub-record header: type + length.
pub const SUB_RECORD_HEADER_BYTES: usize = 2;

/// Sub-record type that terminates a record.
pub const END_OF_RECORD: u8 = 0;

/// Sensors whose samples can be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SensorType {
    /// Accelerometer: three `i16` per sample.
    Accel = 1,
    /// Gyroscope: three `i32` per sample.
    Gyro = 2,
    /// Keyboard event: one `i16` per sample.
    Keyboard = 14,
}

impl SensorType {
    /// Maps a sub-record type byte to a sensor.
    #[must_use]
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(SensorType::Accel),
            2 => Some(SensorType::Gyro),
            14 => Some(SensorType::Keyboard),
            _ => None,
        }
    }

    /// The type byte written on flash.
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Bytes occupied by one sample.
    #[must_use]
    pub const fn sample_width(self) -> usize {
        match self {
            SensorType::Accel => 6,
            SensorType::Gyro => 12,
            SensorType::Keyboard => 2,
        }
    }
}

/// One decoded sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    /// Accelerometer `x, y, z`.
    Accel([i16; 3]),
    /// Gyroscope `x, y, z`.
    Gyro([i32; 3]),
    /// Keyboard event value.
    Keyboard(i16),
}

impl Sample {
    /// Sensor that produced the sample.
    #[must_use]
    pub fn sensor(&self) -> SensorType {
        match self {
            Sample::Accel(_) => SensorType::Accel,
            Sample::Gyro(_) => SensorType::Gyro,
            Sample::Keyboard(_) => SensorType::Keyboard,
        }
    }

    // `chunk` is exactly `sensor.sample_width()` bytes long.
    fn decode(sensor: SensorType, chunk: &[u8]) -> Self {
        let i16_at = |i: usize| i16::from_le_bytes([chunk[i], chunk[i + 1]]);
        let i32_at =
            |i: usize| i32::from_le_bytes([chunk[i], chunk[i + 1], chunk[i + 2], chunk[i + 3]]);
        match sensor {
            SensorType::Accel => Sample::Accel([i16_at(0), i16_at(2), i16_at(4)]),
            SensorType::Gyro => Sample::Gyro([i32_at(0), i32_at(4), i32_at(8)]),
            SensorType::Keyboard => Sample::Keyboard(i16_at(0)),
        }
    }
}

/// A typed, length-prefixed group of samples inside a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubRecord<'a> {
    /// Offset of the type byte inside the record payload.
    pub offset: usize,
    /// Raw type byte.
    pub tag: u8,
    /// The `length` bytes following the header.
    pub body: &'a [u8],
}

impl<'a> SubRecord<'a> {
    /// Sensor for this sub-record, `None` if the type is not supported.
    #[must_use]
    pub fn sensor(&self) -> Option<SensorType> {
        SensorType::from_tag(self.tag)
    }

    /// Decodes every whole sample of a supported sub-record. Unsupported types
    /// yield nothing; bytes that do not fill a last sample are ignored.
    pub fn samples(&self) -> impl Iterator<Item = Sample> + 'a {
        let sensor = self.sensor();
        let body: &'a [u8] = self.body;
        let (body, width) = match sensor {
            Some(s) => (body, s.sample_width()),
            None => (&body[..0], 1),
        };
        body.chunks_exact(width)
            .filter_map(move |chunk| sensor.map(|s| Sample::decode(s, chunk)))
    }

    /// Bytes left over after the last whole sample.
    #[must_use]
    pub fn trailing_bytes(&self) -> usize {
        self.sensor()
            .map_or(0, |s| self.body.len() % s.sample_width())
    }
}

/// A record payload: timestamp plus sub-records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    /// Block-write timestamp.
    pub timestamp: u32,
    payload: &'a [u8],
}

impl<'a> Record<'a> {
    /// Reads the timestamp at the start of `payload`.
    ///
    /// # Errors
    ///
    /// [`RecordError::MalformedSource`] if the payload is shorter than the timestamp.
    pub fn parse(payload: &'a [u8]) -> Result<Self, RecordError> {
        let mut r = payload;
        let timestamp = r
            .read_u32::<LittleEndian>()
            .map_err(|_| RecordError::MalformedSource {
                offset: 0,
                needed: TIMESTAMP_BYTES,
                available: payload.len(),
            })?;
        Ok(Self { timestamp, payload })
    }

    /// Iterates the sub-records after the timestamp.
    #[must_use]
    pub fn sub_records(&self) -> SubRecords<'a> {
        SubRecords {
            payload: self.payload,
            pos: TIMESTAMP_BYTES,
            done: false,
        }
    }
}

/// Iterator over the sub-records of one record.
///
/// Stops at a zero type byte or at the end of the payload. A header or body
/// running past the payload is yielded once as
/// [`RecordError::MalformedSource`] and ends the iteration.
#[derive(Debug, Clone)]
pub struct SubRecords<'a> {
    payload: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> SubRecords<'a> {
    fn truncated(&mut self, needed: usize) -> Option<Result<SubRecord<'a>, RecordError>> {
        self.done = true;
        Some(Err(RecordError::MalformedSource {
            offset: self.pos,
            needed,
            available: self.payload.len() - self.pos,
        }))
    }
}

impl<'a> Iterator for SubRecords<'a> {
    type Item = Result<SubRecord<'a>, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let payload: &'a [u8] = self.payload;
        let Some(&tag) = payload.get(self.pos) else {
            self.done = true;
            return None;
        };
        if tag == END_OF_RECORD {
            self.done = true;
            return None;
        }
        let Some(&len) = payload.get(self.pos + 1) else {
            return self.truncated(SUB_RECORD_HEADER_BYTES);
        };
        let start = self.pos + SUB_RECORD_HEADER_BYTES;
        let Some(body) = payload.get(start..start + len as usize) else {
            return self.truncated(SUB_RECORD_HEADER_BYTES + len as usize);
        };

        let sub = SubRecord {
            offset: self.pos,
            tag,
            body,
        };
        self.pos = start + body.len();
        Some(Ok(sub))
    }
}

/// Non-fatal findings raised while decoding a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Anomaly {
    /// A sub-record type without a known sample layout; its bytes were skipped.
    #[error("unsupported sensor type {tag} ({len} bytes skipped)")]
    UnsupportedSampleType {
        /// Raw type byte.
        tag: u8,
        /// Declared sub-record length.
        len: usize,
    },

    /// Paired policy: the record holds neither accelerometer nor gyroscope samples.
    #[error("no accelerometer and no gyroscope samples")]
    NoInertialSamples,

    /// Paired policy: accelerometer and gyroscope sample counts differ.
    #[error("{accel} accelerometer and {gyro} gyroscope samples")]
    MismatchedPairedCounts {
        /// Accelerometer samples in the record.
        accel: usize,
        /// Gyroscope samples in the record.
        gyro: usize,
    },
}

/// Rows and anomalies produced by one policy for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded<R> {
    /// Rows in output order.
    pub rows: Vec<R>,
    /// Non-fatal findings.
    pub anomalies: Vec<Anomaly>,
}

impl<R> Default for Decoded<R> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            anomalies: Vec::new(),
        }
    }
}

/// Full-fidelity row: one sample stamped with its record timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FullRow {
    /// Record timestamp.
    pub timestamp: u32,
    /// The sample.
    pub sample: Sample,
}

/// Paired-stream row. A missing sensor leaves its columns blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairedRow {
    /// Synthesized sample timestamp in milliseconds.
    pub timestamp: i64,
    /// Accelerometer `x, y, z`.
    pub accel: Option<[i16; 3]>,
    /// Gyroscope `x, y, z`.
    pub gyro: Option<[i32; 3]>,
}

/// Full-fidelity policy: one row per sample, in stored order.
///
/// Unsupported sub-records are skipped for their declared length and reported
/// as [`Anomaly::UnsupportedSampleType`].
///
/// # Errors
///
/// [`RecordError::MalformedSource`] if a sub-record runs past the payload; the
/// rows of this record are discarded.
pub fn decode_full(record: &Record<'_>) -> Result<Decoded<FullRow>, RecordError> {
    let mut out = Decoded::default();
    for sub in record.sub_records() {
        let sub = sub?;
        if sub.sensor().is_none() {
            warn!(
                tag = sub.tag,
                len = sub.body.len(),
                timestamp = record.timestamp,
                "unsupported sensor type, skipping sub-record"
            );
            out.anomalies.push(Anomaly::UnsupportedSampleType {
                tag: sub.tag,
                len: sub.body.len(),
            });
            continue;
        }
        if sub.trailing_bytes() > 0 {
            debug!(
                tag = sub.tag,
                extra = sub.trailing_bytes(),
                "sub-record length is not a whole number of samples"
            );
        }
        out.rows.extend(sub.samples().map(|sample| FullRow {
            timestamp: record.timestamp,
            sample,
        }));
    }
    Ok(out)
}

/// Paired-stream policy: zips the record's accelerometer and gyroscope samples.
///
/// | accel | gyro  | result                                   |
/// |-------|-------|------------------------------------------|
/// | 0     | 0     | no rows, [`Anomaly::NoInertialSamples`]  |
/// | n     | 0     | n rows, gyro blank                       |
/// | 0     | n     | n rows, accel blank                      |
/// | n     | n     | n rows, `accel[i]` with `gyro[i]`        |
/// | n     | m ≠ n | no rows, [`Anomaly::MismatchedPairedCounts`] |
///
/// Row `i` of `n` is stamped by [`SampleClock::timestamp`]. Other sensor
/// types are ignored.
///
/// # Errors
///
/// [`RecordError::MalformedSource`] if a sub-record runs past the payload.
pub fn decode_paired(
    record: &Record<'_>,
    clock: &SampleClock,
) -> Result<Decoded<PairedRow>, RecordError> {
    let mut accel = Vec::new();
    let mut gyro = Vec::new();
    for sub in record.sub_records() {
        for sample in sub?.samples() {
            match sample {
                Sample::Accel(v) => accel.push(v),
                Sample::Gyro(v) => gyro.push(v),
                Sample::Keyboard(_) => trace!("keyboard sample ignored by paired policy"),
            }
        }
    }

    let ts = |i: usize, n: usize| clock.timestamp(record.timestamp, i, n);
    let mut out = Decoded::default();
    match (accel.len(), gyro.len()) {
        (0, 0) => {
            warn!(
                timestamp = record.timestamp,
                "no accelerometer and no gyroscope samples"
            );
            out.anomalies.push(Anomaly::NoInertialSamples);
        }
        (n, 0) => {
            out.rows = accel
                .iter()
                .enumerate()
                .map(|(i, a)| PairedRow {
                    timestamp: ts(i, n),
                    accel: Some(*a),
                    gyro: None,
                })
                .collect();
        }
        (0, n) => {
            out.rows = gyro
                .iter()
                .enumerate()
                .map(|(i, g)| PairedRow {
                    timestamp: ts(i, n),
                    accel: None,
                    gyro: Some(*g),
                })
                .collect();
        }
        (n, m) if n == m => {
            out.rows = accel
                .iter()
                .zip(&gyro)
                .enumerate()
                .map(|(i, (a, g))| PairedRow {
                    timestamp: ts(i, n),
                    accel: Some(*a),
                    gyro: Some(*g),
                })
                .collect();
        }
        (n, m) => {
            warn!(
                timestamp = record.timestamp,
                accel = n,
                gyro = m,
                "accelerometer and gyroscope sample counts differ, dropping record"
            );
            out.anomalies.push(Anomaly::MismatchedPairedCounts { accel: n, gyro: m });
        }
    }
    Ok(out)
}
