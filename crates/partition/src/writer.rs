use crate::format::{
    BlockHeader, CursorStatus, ElementStatus, Geometry, BLOCK_HEADER_BYTES, ERASED_BYTE,
    STATUS_BYTES,
};
use crate::PartitionError;

/// Returns an erased partition image: `block_count * block_size` bytes of `0xFF`.
///
/// Programming this image clears the whole raw data partition.
#[must_use]
pub fn erase_image(geometry: &Geometry) -> Vec<u8> {
    vec![ERASED_BYTE; geometry.image_len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    block: usize,
    index: usize,
}

/// Builds partition images the way the firmware's circular storage fills them.
///
/// The writer starts from an erased image with block 0 formatted and holding
/// both cursors. [`push`](LogWriter::push) programs the element at the write
/// cursor and [`consume`](LogWriter::consume) retires elements at the read
/// cursor. When a cursor leaves a block, that block's status for it becomes
/// [`CursorStatus::Passed`] and the next block (modulo the block count) takes
/// [`CursorStatus::Here`]. The write cursor erases and reformats every block
/// it enters.
///
/// Used to produce test fixtures and benchmark inputs.
#[derive(Debug, Clone)]
pub struct LogWriter {
    geometry: Geometry,
    elt_size: u16,
    image: Vec<u8>,
    write: Slot,
    read: Slot,
    /// Written and not yet consumed elements.
    pending: usize,
}

impl LogWriter {
    /// Creates a writer for `geometry` whose elements carry `elt_size` payload bytes.
    ///
    /// # Errors
    ///
    /// [`PartitionError::InvalidGeometry`] if a block cannot hold at least one element.
    pub fn new(geometry: Geometry, elt_size: u16) -> Result<Self, PartitionError> {
        geometry.validate()?;
        let stride = elt_size as usize + STATUS_BYTES;
        if BLOCK_HEADER_BYTES + stride > geometry.block_size {
            return Err(PartitionError::InvalidGeometry(format!(
                "a {}-byte block cannot hold a {}-byte element",
                geometry.block_size, stride
            )));
        }

        let mut writer = Self {
            geometry,
            elt_size,
            image: erase_image(&geometry),
            write: Slot { block: 0, index: 0 },
            read: Slot { block: 0, index: 0 },
            pending: 0,
        };
        writer.format_block(0, CursorStatus::Here, CursorStatus::Here);
        Ok(writer)
    }

    /// Number of whole element slots in one block.
    #[must_use]
    pub fn elements_per_block(&self) -> usize {
        (self.geometry.block_size - BLOCK_HEADER_BYTES) / self.stride()
    }

    /// Absolute offset of the next element to be written.
    #[must_use]
    pub fn write_cursor(&self) -> usize {
        self.slot_offset(self.write)
    }

    /// Absolute offset of the oldest unread element.
    #[must_use]
    pub fn read_cursor(&self) -> usize {
        self.slot_offset(self.read)
    }

    /// Number of written, unread elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending
    }

    /// Returns `true` if every written element has been consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending == 0
    }

    /// Programs `payload` into the element at the write cursor, zero-padded to
    /// the element size, and advances the write cursor.
    ///
    /// # Errors
    ///
    /// - [`PartitionError::PayloadTooLarge`] if `payload` exceeds the element size.
    /// - [`PartitionError::LogFull`] if filling this slot would move the write
    ///   cursor into the block still held by the read cursor.
    pub fn push(&mut self, payload: &[u8]) -> Result<(), PartitionError> {
        let elt_size = self.elt_size as usize;
        if payload.len() > elt_size {
            return Err(PartitionError::PayloadTooLarge {
                len: payload.len(),
                elt_size: self.elt_size,
            });
        }

        let leaves_block = self.write.index + 1 == self.elements_per_block();
        let next_block = (self.write.block + 1) % self.geometry.block_count;
        if leaves_block && next_block == self.read.block {
            return Err(PartitionError::LogFull);
        }

        let at = self.slot_offset(self.write);
        self.image[at..at + STATUS_BYTES].copy_from_slice(&ElementStatus::Written.marker());
        let body = &mut self.image[at + STATUS_BYTES..at + STATUS_BYTES + elt_size];
        body.fill(0);
        body[..payload.len()].copy_from_slice(payload);
        self.pending += 1;

        if leaves_block {
            self.set_write_status(self.write.block, CursorStatus::Passed);
            self.format_block(next_block, CursorStatus::Here, CursorStatus::Untouched);
            self.write = Slot {
                block: next_block,
                index: 0,
            };
        } else {
            self.write.index += 1;
        }
        Ok(())
    }

    /// Marks up to `count` of the oldest elements as consumed and advances the
    /// read cursor. Returns how many elements were consumed.
    pub fn consume(&mut self, count: usize) -> usize {
        let mut consumed = 0;
        while consumed < count && self.pending > 0 {
            let at = self.slot_offset(self.read);
            self.image[at..at + STATUS_BYTES].copy_from_slice(&ElementStatus::Consumed.marker());
            self.pending -= 1;
            consumed += 1;

            self.read.index += 1;
            if self.read.index == self.elements_per_block() {
                let next_block = (self.read.block + 1) % self.geometry.block_count;
                self.set_read_status(self.read.block, CursorStatus::Passed);
                self.set_read_status(next_block, CursorStatus::Here);
                self.read = Slot {
                    block: next_block,
                    index: 0,
                };
            }
        }
        consumed
    }

    /// Borrows the image as it currently stands.
    #[must_use]
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    /// Consumes the writer and returns the partition image.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.image
    }

    fn stride(&self) -> usize {
        self.elt_size as usize + STATUS_BYTES
    }

    fn slot_offset(&self, slot: Slot) -> usize {
        slot.block * self.geometry.block_size + BLOCK_HEADER_BYTES + slot.index * self.stride()
    }

    fn format_block(&mut self, block: usize, write: CursorStatus, read: CursorStatus) {
        let range = self.geometry.block_range(block);
        let start = range.start;
        self.image[range].fill(ERASED_BYTE);
        let header = BlockHeader::new(self.elt_size, write, read);
        self.image[start..start + BLOCK_HEADER_BYTES].copy_from_slice(&header.to_bytes());
    }

    fn set_write_status(&mut self, block: usize, status: CursorStatus) {
        let at = block * self.geometry.block_size + 4;
        self.image[at..at + 4].copy_from_slice(&status.marker());
    }

    fn set_read_status(&mut self, block: usize, status: CursorStatus) {
        let at = block * self.geometry.block_size + 8;
        self.image[at..at + 4].copy_from_slice(&status.marker());
    }
}
