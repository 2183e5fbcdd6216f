/// Element walker: turns the linearized log into a sequence of written
/// elements, stepping over the block headers and erased padding left behind by
/// concatenation.
use byteorder::{LittleEndian, ReadBytesExt};
use partition::{ElementStatus, BLOCK_HEADER_BYTES, BLOCK_MAGIC_BYTES, STATUS_BYTES, UNTOUCHED_BYTE};
use tracing::debug;

use crate::RecordError;

/// One written element found in the linear log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element<'a> {
    /// Offset of the element's status prefix inside the linear log.
    pub offset: usize,
    /// Block-write timestamp (first four payload bytes).
    pub timestamp: u32,
    /// The whole payload, timestamp included.
    pub payload: &'a [u8],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Between elements: may face a block header, padding, or a status prefix.
    AtBoundary,
    /// In erased padding, looking for the next block magic.
    Resyncing,
    /// Facing a status prefix.
    InRecord,
    Done,
}

/// Iterator over the written elements of a linear log.
///
/// Yields `Ok(Element)` for every element whose status is
/// [`ElementStatus::Written`]. Block headers are skipped, and erased padding
/// (`0xFF`) is skipped up to the next block magic; no further magic means the
/// end of the data.
///
/// The first failure is yielded as `Err` and ends the iteration:
///
/// - [`RecordError::UnexpectedMarker`] for a status that is not *written*;
/// - [`RecordError::MalformedSource`] for an element cut short by the end of
///   the log.
///
/// Elements are only produced whole, so a consumer never observes a partial
/// record. The walk cannot be resumed midway; build a new walker to restart.
#[derive(Debug, Clone)]
pub struct ElementWalker<'a> {
    data: &'a [u8],
    payload_size: usize,
    offset: usize,
    state: State,
    emitted: usize,
}

impl<'a> ElementWalker<'a> {
    /// Creates a walker over `data` for elements carrying `payload_size` bytes
    /// after their status prefix.
    #[must_use]
    pub fn new(data: &'a [u8], payload_size: usize) -> Self {
        Self {
            data,
            payload_size,
            offset: 0,
            state: State::AtBoundary,
            emitted: 0,
        }
    }

    /// Current position in the linear log.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of elements yielded so far.
    #[must_use]
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    fn read_element(&mut self) -> Result<Element<'a>, RecordError> {
        let data: &'a [u8] = self.data;
        let start = self.offset;
        let rest = &data[start..];

        let marker = rest
            .get(..STATUS_BYTES)
            .ok_or(RecordError::MalformedSource {
                offset: start,
                needed: STATUS_BYTES,
                available: rest.len(),
            })?;
        if ElementStatus::from_marker(marker) != Some(ElementStatus::Written) {
            return Err(RecordError::UnexpectedMarker {
                offset: start,
                marker: marker.to_vec(),
            });
        }

        let needed = STATUS_BYTES + self.payload_size;
        let payload = rest
            .get(STATUS_BYTES..needed)
            .ok_or(RecordError::MalformedSource {
                offset: start,
                needed,
                available: rest.len(),
            })?;
        let mut r = payload;
        let timestamp = r
            .read_u32::<LittleEndian>()
            .map_err(|_| RecordError::MalformedSource {
                offset: start + STATUS_BYTES,
                needed: 4,
                available: payload.len(),
            })?;

        self.offset = start + needed;
        self.emitted += 1;
        Ok(Element {
            offset: start,
            timestamp,
            payload,
        })
    }
}

impl<'a> Iterator for ElementWalker<'a> {
    type Item = Result<Element<'a>, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        let data: &'a [u8] = self.data;
        loop {
            match self.state {
                State::Done => return None,
                State::AtBoundary => {
                    let Some(rest) = data.get(self.offset..).filter(|r| !r.is_empty()) else {
                        self.state = State::Done;
                        return None;
                    };
                    if rest.starts_with(&BLOCK_MAGIC_BYTES) {
                        // header of the next block, left in place by concatenation
                        self.offset += BLOCK_HEADER_BYTES;
                    } else if rest[0] == UNTOUCHED_BYTE {
                        self.state = State::Resyncing;
                    } else {
                        self.state = State::InRecord;
                    }
                }
                State::Resyncing => {
                    let rest = &data[self.offset..];
                    match rest.windows(2).position(|w| w == BLOCK_MAGIC_BYTES) {
                        Some(pos) => {
                            debug!(from = self.offset, skipped = pos, "resynced on next block");
                            self.offset += pos + BLOCK_HEADER_BYTES;
                            self.state = State::InRecord;
                        }
                        None => {
                            debug!(offset = self.offset, "no block after padding, end of data");
                            self.state = State::Done;
                            return None;
                        }
                    }
                }
                State::InRecord => {
                    if self.offset >= data.len() {
                        self.state = State::Done;
                        return None;
                    }
                    return match self.read_element() {
                        Ok(element) => {
                            self.state = State::AtBoundary;
                            Some(Ok(element))
                        }
                        Err(e) => {
                            self.state = State::Done;
                            Some(Err(e))
                        }
                    };
                }
            }
        }
    }
}
