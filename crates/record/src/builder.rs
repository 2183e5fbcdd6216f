use crate::decode::{SensorType, TIMESTAMP_BYTES};
use crate::RecordError;

/// Encodes record payloads in the layout the firmware stores them.
///
/// ```rust
/// use record::{decode_full, Record, RecordBuilder};
///
/// let payload = RecordBuilder::new(1000)
///     .accel(&[[1, 2, 3]])
///     .unwrap()
///     .gyro(&[[4, 5, 6]])
///     .unwrap()
///     .build();
/// let rows = decode_full(&Record::parse(&payload).unwrap()).unwrap().rows;
/// assert_eq!(rows.len(), 2);
/// ```
///
/// No terminator is appended: the element is zero-padded when written, and a
/// zero type byte ends the record.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    buf: Vec<u8>,
}

impl RecordBuilder {
    /// Starts a record stamped with `timestamp`.
    #[must_use]
    pub fn new(timestamp: u32) -> Self {
        let mut buf = Vec::with_capacity(128);
        buf.extend_from_slice(&timestamp.to_le_bytes());
        Self { buf }
    }

    /// Appends an accelerometer sub-record.
    pub fn accel(&mut self, samples: &[[i16; 3]]) -> Result<&mut Self, RecordError> {
        let body: Vec<u8> = samples
            .iter()
            .flatten()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        self.raw(SensorType::Accel.tag(), &body)
    }

    /// Appends a gyroscope sub-record.
    pub fn gyro(&mut self, samples: &[[i32; 3]]) -> Result<&mut Self, RecordError> {
        let body: Vec<u8> = samples
            .iter()
            .flatten()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        self.raw(SensorType::Gyro.tag(), &body)
    }

    /// Appends a keyboard sub-record.
    pub fn keyboard(&mut self, values: &[i16]) -> Result<&mut Self, RecordError> {
        let body: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.raw(SensorType::Keyboard.tag(), &body)
    }

    /// Appends a sub-record with an arbitrary type byte.
    ///
    /// # Errors
    ///
    /// [`RecordError::SubRecordTooLong`] if `body` does not fit the one-byte length.
    pub fn raw(&mut self, tag: u8, body: &[u8]) -> Result<&mut Self, RecordError> {
        let len = u8::try_from(body.len()).map_err(|_| RecordError::SubRecordTooLong {
            tag,
            len: body.len(),
        })?;
        self.buf.push(tag);
        self.buf.push(len);
        self.buf.extend_from_slice(body);
        Ok(self)
    }

    /// Encoded length so far, timestamp included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if no sub-record was appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.len() == TIMESTAMP_BYTES
    }

    /// Returns the encoded payload.
    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        self.buf.clone()
    }
}
