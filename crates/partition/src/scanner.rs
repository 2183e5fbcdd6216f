/// Cursor recovery: walks the valid block prefix and finds where the firmware
/// left its write and read cursors.
use tracing::{debug, warn};

use crate::format::{
    BlockHeader, CursorStatus, ElementStatus, Geometry, BLOCK_HEADER_BYTES, STATUS_BYTES,
};
use crate::PartitionError;

/// Absolute cursor positions recovered from a partition image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursors {
    /// Offset of the first empty element in the write block.
    pub write: usize,
    /// Offset of the first written element in the read block.
    pub read: usize,
    /// Element payload size declared by the block holding the write cursor.
    pub elt_size: u16,
}

impl Cursors {
    /// Returns `true` when the live data wraps past the end of the partition.
    #[must_use]
    pub fn wraps(&self) -> bool {
        self.write <= self.read
    }
}

/// Offsets (relative to the block start) of every slot whose status prefix
/// fits in the block. The last one may be a partial slot in the block's
/// padding; a full block whose write status is still *here* has its write
/// cursor there.
fn element_slots(block_len: usize, stride: usize) -> impl Iterator<Item = usize> {
    (BLOCK_HEADER_BYTES..)
        .step_by(stride)
        .take_while(move |slot| slot + STATUS_BYTES <= block_len)
}

/// Locates the write and read cursors in `image`.
///
/// Blocks are visited in index order. The scan stops without error at the
/// first block that lacks the magic (never formatted) or that the image does
/// not fully contain. Only blocks whose header marks a cursor as
/// [`CursorStatus::Here`] have their elements inspected:
///
/// - write cursor: first [`ElementStatus::Empty`] slot;
/// - read cursor: first [`ElementStatus::Written`] slot.
///
/// If more than one block claims a cursor, the first one wins.
///
/// # Errors
///
/// [`PartitionError::CursorNotFound`] when either cursor cannot be recovered.
pub fn locate_cursors(image: &[u8], geometry: &Geometry) -> Result<Cursors, PartitionError> {
    geometry.validate()?;

    let mut write: Option<(usize, u16)> = None;
    let mut read: Option<(usize, u16)> = None;

    for index in 0..geometry.block_count {
        let Some(block) = image.get(geometry.block_range(index)) else {
            warn!(
                block = index,
                image_len = image.len(),
                "image ends before block, stopping scan"
            );
            break;
        };
        let Some(header) = BlockHeader::parse(block) else {
            debug!(block = index, "no block magic, end of valid blocks");
            break;
        };
        if !header.holds_cursor() {
            continue;
        }

        let base = index * geometry.block_size;
        let mut want_write = header.write == Some(CursorStatus::Here);
        let mut want_read = header.read == Some(CursorStatus::Here);

        for slot in element_slots(block.len(), header.stride()) {
            if !want_write && !want_read {
                break;
            }
            let status = ElementStatus::from_marker(&block[slot..slot + STATUS_BYTES]);
            if want_write && status == Some(ElementStatus::Empty) {
                want_write = false;
                claim(&mut write, base + slot, header.elt_size, index, "write");
            } else if want_read && status == Some(ElementStatus::Written) {
                want_read = false;
                claim(&mut read, base + slot, header.elt_size, index, "read");
            }
        }
    }

    match (write, read) {
        (Some((write, elt_size)), Some((read, read_elt_size))) => {
            if read_elt_size != elt_size {
                warn!(
                    write_elt_size = elt_size,
                    read_elt_size, "cursor blocks disagree on element size"
                );
            }
            Ok(Cursors {
                write,
                read,
                elt_size,
            })
        }
        (write, read) => Err(PartitionError::CursorNotFound {
            write: write.map(|(offset, _)| offset),
            read: read.map(|(offset, _)| offset),
        }),
    }
}

fn claim(slot: &mut Option<(usize, u16)>, offset: usize, elt_size: u16, block: usize, which: &str) {
    match slot {
        Some((kept, _)) => warn!(
            cursor = which,
            block,
            offset,
            kept = *kept,
            "another block also holds the cursor, ignoring it"
        ),
        None => {
            debug!(cursor = which, block, offset, "cursor found");
            *slot = Some((offset, elt_size));
        }
    }
}
