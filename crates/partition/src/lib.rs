//! # Partition - Circular Log Layout
//!
//! Reads (and, for fixtures, writes) the raw data partition that the device's
//! circular storage keeps on serial flash.
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ BLOCK 0 (block_size bytes)                                    │
//! │                                                              │
//! │ magic (u16 LE = 0xABCD) | elt_size (u16 LE)                   │
//! │ write_status (4 B)      | read_status (4 B)                   │
//! │                                                              │
//! │ status (4 B) | payload (elt_size B)    ← element 0           │
//! │ status (4 B) | payload (elt_size B)    ← element 1           │
//! │ ...                                                          │
//! │ erased padding (0xFF) up to the block end                    │
//! ├──────────────────────────────────────────────────────────────┤
//! │ BLOCK 1 ...                                                   │
//! ├──────────────────────────────────────────────────────────────┤
//! │ first block without magic: end of the formatted region        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! | Marker        | Cursor status | Element status |
//! |---------------|---------------|----------------|
//! | `AA AA AA AA` | here          |                |
//! | `BB BB BB BB` |               | written        |
//! | `00 00 00 00` | passed        | consumed       |
//! | `FF FF FF FF` | untouched     | empty          |
//!
//! ## Pipeline
//!
//! ```text
//! image ──locate_cursors──▶ Cursors ──extract_live_range──▶ linear bytes
//! ```
//!
//! The linear bytes still contain block headers and erased padding wherever the
//! live data crossed a block boundary; the `record` crate walks over them.
//!
//! ## Example
//!
//! ```rust
//! use partition::{extract_live_range, locate_cursors, Geometry, LogWriter};
//!
//! let geometry = Geometry::new(256, 4);
//! let mut log = LogWriter::new(geometry, 32).unwrap();
//! log.push(&[1, 2, 3, 4]).unwrap();
//! let image = log.finish();
//!
//! let cursors = locate_cursors(&image, &geometry).unwrap();
//! let live = extract_live_range(&image, &cursors);
//! assert_eq!(live.len(), 4 + 32);
//! ```

mod extract;
mod format;
mod scanner;
mod writer;

pub use extract::extract_live_range;
pub use format::{
    BlockHeader, CursorStatus, ElementStatus, Geometry, BLOCK_HEADER_BYTES, BLOCK_MAGIC,
    BLOCK_MAGIC_BYTES, DEFAULT_BLOCK_COUNT, DEFAULT_BLOCK_SIZE, ERASED_BYTE, MAX_IMAGE_LEN,
    STATUS_BYTES, UNTOUCHED_BYTE,
};
pub use scanner::{locate_cursors, Cursors};
pub use writer::{erase_image, LogWriter};

use thiserror::Error;

/// Errors raised while reading or building a partition image.
#[derive(Debug, Error)]
pub enum PartitionError {
    /// No block yielded a write cursor, a read cursor, or both.
    #[error("cursors not found in partition (write: {write:?}, read: {read:?})")]
    CursorNotFound {
        /// Write cursor, if one was found.
        write: Option<usize>,
        /// Read cursor, if one was found.
        read: Option<usize>,
    },

    /// Block size or count cannot describe a usable partition.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// The image holds fewer bytes than the geometry requires.
    #[error("partition image too short: expected {expected} bytes, got {actual}")]
    ImageTooShort {
        /// `block_count * block_size`.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },

    /// A payload does not fit in one element.
    #[error("payload of {len} bytes exceeds the {elt_size}-byte element")]
    PayloadTooLarge {
        /// Payload length.
        len: usize,
        /// Element payload size.
        elt_size: u16,
    },

    /// The write cursor would enter the block still held by the read cursor.
    #[error("circular log is full")]
    LogFull,
}

#[cfg(test)]
mod tests;
