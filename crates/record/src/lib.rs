//! # Record - Element Stream & Sample Decoding
//!
//! Turns the linear log produced by the `partition` crate into sensor samples.
//!
//! ```text
//! linear bytes ──ElementWalker──▶ Element ──Record::parse──▶ Record
//!                                                              │
//!                          ┌───────────────────────────────────┤
//!                          ▼                                   ▼
//!                    decode_full                    decode_paired + SampleClock
//!                          │                                   │
//!                          ▼                                   ▼
//!                    Vec<FullRow>                       Vec<PairedRow>
//! ```
//!
//! ## Sensor types
//!
//! | Type | Sensor   | Sample width | Layout        |
//! |------|----------|--------------|---------------|
//! | 1    | Accel    | 6 B          | 3 x `i16` LE  |
//! | 2    | Gyro     | 12 B         | 3 x `i32` LE  |
//! | 14   | Keyboard | 2 B          | 1 x `i16` LE  |
//!
//! Other types are skipped by their declared length.
//!
//! ## Example
//!
//! ```rust
//! use record::{decode_paired, ElementWalker, Record, RecordBuilder, SampleClock};
//!
//! let payload = RecordBuilder::new(1000)
//!     .accel(&[[1, 1, 1], [2, 2, 2]])
//!     .unwrap()
//!     .build();
//!
//! let mut linear = vec![0xBB; 4];
//! linear.extend_from_slice(&payload);
//! linear.resize(4 + 32, 0);
//!
//! let clock = SampleClock::from_frequency(100).unwrap();
//! for element in ElementWalker::new(&linear, 32) {
//!     let record = Record::parse(element.unwrap().payload).unwrap();
//!     let rows = decode_paired(&record, &clock).unwrap().rows;
//!     assert_eq!(rows[0].timestamp, 990);
//!     assert_eq!(rows[1].timestamp, 1000);
//! }
//! ```

mod builder;
mod clock;
mod decode;
mod walker;

pub use builder::RecordBuilder;
pub use clock::{SampleClock, DEFAULT_FREQUENCY};
pub use decode::{
    decode_full, decode_paired, Anomaly, Decoded, FullRow, PairedRow, Record, Sample,
    SensorType, SubRecord, SubRecords, END_OF_RECORD, SUB_RECORD_HEADER_BYTES, TIMESTAMP_BYTES,
};
pub use walker::{Element, ElementWalker};

use thiserror::Error;

/// Errors that end the decoding of the element stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// A record boundary held a status other than *written*.
    #[error("unexpected marker {marker:02X?} at offset {offset}")]
    UnexpectedMarker {
        /// Offset of the marker.
        offset: usize,
        /// The bytes found there (at most four).
        marker: Vec<u8>,
    },

    /// The data ends in the middle of a field.
    #[error("malformed source at offset {offset}: {needed} bytes needed, {available} available")]
    MalformedSource {
        /// Offset of the field. Relative to the linear log for elements, to
        /// the record payload for sub-records.
        offset: usize,
        /// Bytes the field requires.
        needed: usize,
        /// Bytes left.
        available: usize,
    },

    /// A sub-record body is longer than its one-byte length field allows.
    #[error("sub-record of type {tag} is {len} bytes, at most 255 fit")]
    SubRecordTooLong {
        /// Type byte.
        tag: u8,
        /// Body length.
        len: usize,
    },

    /// The sampling frequency is zero.
    #[error("sampling frequency must be positive")]
    InvalidFrequency,
}
