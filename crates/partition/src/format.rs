//! Partition binary format constants, status markers and block header parsing.
//!
//! ## Block header (12 bytes)
//!
//! ```text
//! [magic: u16 LE = 0xABCD][elt_size: u16 LE][write_status: 4 B][read_status: 4 B]
//! ```
//!
//! ## Element (stride = elt_size + 4)
//!
//! ```text
//! [status: 4 B][payload: elt_size B]
//! ```
//!
//! Status fields are four repeated bytes. They are matched byte-for-byte; a
//! field holding anything else is reported as `None` by the parsers below.

use byteorder::{LittleEndian, ReadBytesExt};
use std::ops::Range;

use crate::PartitionError;

/// Block magic as stored on flash (`CD AB`).
pub const BLOCK_MAGIC: u16 = 0xABCD;

/// [`BLOCK_MAGIC`] in its on-flash byte order.
pub const BLOCK_MAGIC_BYTES: [u8; 2] = BLOCK_MAGIC.to_le_bytes();

/// Size of the block header: 2 (`magic`) + 2 (`elt_size`) + 4 + 4 (cursor statuses).
pub const BLOCK_HEADER_BYTES: usize = 2 + 2 + 4 + 4;

/// Size of the status prefix in front of every element.
pub const STATUS_BYTES: usize = 4;

/// Value of every byte of erased (never programmed) flash.
pub const ERASED_BYTE: u8 = 0xFF;

/// First byte of an "untouched" cursor status. Inside a linearized log it
/// marks erased padding at the end of a block.
pub const UNTOUCHED_BYTE: u8 = ERASED_BYTE;

/// Default flash block size in bytes.
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Default number of blocks in the raw data partition.
pub const DEFAULT_BLOCK_COUNT: usize = 506;

/// Largest partition image accepted: 1 GiB.
pub const MAX_IMAGE_LEN: usize = 1 << 30;

/// Where a cursor stands relative to a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStatus {
    /// The cursor is inside this block (`AA AA AA AA`).
    Here,
    /// The cursor visited this block and left it (`00 00 00 00`).
    Passed,
    /// The cursor never reached this block (`FF FF FF FF`).
    Untouched,
}

impl CursorStatus {
    /// Returns the 4-byte on-flash marker.
    #[must_use]
    pub const fn marker(self) -> [u8; 4] {
        match self {
            CursorStatus::Here => [0xAA; 4],
            CursorStatus::Passed => [0x00; 4],
            CursorStatus::Untouched => [0xFF; 4],
        }
    }

    /// Matches a 4-byte marker exactly.
    #[must_use]
    pub fn from_marker(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0xAA, 0xAA, 0xAA, 0xAA] => Some(CursorStatus::Here),
            [0x00, 0x00, 0x00, 0x00] => Some(CursorStatus::Passed),
            [0xFF, 0xFF, 0xFF, 0xFF] => Some(CursorStatus::Untouched),
            _ => None,
        }
    }
}

/// State of a single element slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementStatus {
    /// Never written (`FF FF FF FF`).
    Empty,
    /// Holds data that has not been read yet (`BB BB BB BB`).
    Written,
    /// Holds data that was already read (`00 00 00 00`).
    Consumed,
}

impl ElementStatus {
    /// Returns the 4-byte on-flash marker.
    #[must_use]
    pub const fn marker(self) -> [u8; 4] {
        match self {
            ElementStatus::Empty => [0xFF; 4],
            ElementStatus::Written => [0xBB; 4],
            ElementStatus::Consumed => [0x00; 4],
        }
    }

    /// Matches a 4-byte marker exactly.
    #[must_use]
    pub fn from_marker(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0xFF, 0xFF, 0xFF, 0xFF] => Some(ElementStatus::Empty),
            [0xBB, 0xBB, 0xBB, 0xBB] => Some(ElementStatus::Written),
            [0x00, 0x00, 0x00, 0x00] => Some(ElementStatus::Consumed),
            _ => None,
        }
    }
}

/// Parsed block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Declared payload size of every element in the block (status excluded).
    pub elt_size: u16,
    /// Write cursor status, `None` if the marker is not one of the three values.
    pub write: Option<CursorStatus>,
    /// Read cursor status, `None` if the marker is not one of the three values.
    pub read: Option<CursorStatus>,
}

impl BlockHeader {
    /// Builds a header with known cursor statuses.
    #[must_use]
    pub fn new(elt_size: u16, write: CursorStatus, read: CursorStatus) -> Self {
        Self {
            elt_size,
            write: Some(write),
            read: Some(read),
        }
    }

    /// Parses the header at the start of `block`.
    ///
    /// Returns `None` when the block is shorter than a header or does not start
    /// with [`BLOCK_MAGIC_BYTES`], i.e. the block was never formatted.
    #[must_use]
    pub fn parse(block: &[u8]) -> Option<Self> {
        if block.len() < BLOCK_HEADER_BYTES || block[..2] != BLOCK_MAGIC_BYTES {
            return None;
        }
        let mut r = &block[2..4];
        let elt_size = r.read_u16::<LittleEndian>().ok()?;
        Some(Self {
            elt_size,
            write: CursorStatus::from_marker(&block[4..8]),
            read: CursorStatus::from_marker(&block[8..12]),
        })
    }

    /// Serializes the header. An unknown status is written as untouched.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; BLOCK_HEADER_BYTES] {
        let mut out = [0u8; BLOCK_HEADER_BYTES];
        out[0..2].copy_from_slice(&BLOCK_MAGIC_BYTES);
        out[2..4].copy_from_slice(&self.elt_size.to_le_bytes());
        out[4..8].copy_from_slice(&self.write.unwrap_or(CursorStatus::Untouched).marker());
        out[8..12].copy_from_slice(&self.read.unwrap_or(CursorStatus::Untouched).marker());
        out
    }

    /// Distance between two consecutive element slots.
    #[must_use]
    pub fn stride(&self) -> usize {
        self.elt_size as usize + STATUS_BYTES
    }

    /// Returns `true` if either cursor resides in this block.
    #[must_use]
    pub fn holds_cursor(&self) -> bool {
        self.write == Some(CursorStatus::Here) || self.read == Some(CursorStatus::Here)
    }
}

/// Shape of a partition: block size and block count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Size of one block in bytes.
    pub block_size: usize,
    /// Number of blocks in the partition.
    pub block_count: usize,
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_SIZE, DEFAULT_BLOCK_COUNT)
    }
}

impl Geometry {
    /// Creates a geometry. Use [`Geometry::validate`] before scanning with it.
    #[must_use]
    pub const fn new(block_size: usize, block_count: usize) -> Self {
        Self {
            block_size,
            block_count,
        }
    }

    /// Total partition image length in bytes.
    ///
    /// Saturates instead of overflowing; [`Geometry::validate`] rejects such
    /// geometries.
    #[must_use]
    pub fn image_len(&self) -> usize {
        self.block_size.saturating_mul(self.block_count)
    }

    /// Byte range of block `index` inside the image.
    #[must_use]
    pub fn block_range(&self, index: usize) -> Range<usize> {
        let start = index.saturating_mul(self.block_size);
        start..start.saturating_add(self.block_size)
    }

    /// Rejects geometries that cannot hold a single block header, and
    /// geometries whose image would exceed [`MAX_IMAGE_LEN`].
    pub fn validate(&self) -> Result<(), PartitionError> {
        if self.block_size <= BLOCK_HEADER_BYTES {
            return Err(PartitionError::InvalidGeometry(format!(
                "block size {} does not exceed the {}-byte header",
                self.block_size, BLOCK_HEADER_BYTES
            )));
        }
        if self.block_count == 0 {
            return Err(PartitionError::InvalidGeometry(
                "block count must be at least 1".to_string(),
            ));
        }
        match self.block_size.checked_mul(self.block_count) {
            Some(len) if len <= MAX_IMAGE_LEN => Ok(()),
            _ => Err(PartitionError::InvalidGeometry(format!(
                "{} blocks of {} bytes exceed the {}-byte image limit",
                self.block_count, self.block_size, MAX_IMAGE_LEN
            ))),
        }
    }
}
