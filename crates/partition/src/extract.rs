/// Linearization of the circular log between the read and write cursors.
use std::borrow::Cow;

use crate::scanner::Cursors;

/// Returns the bytes written between the read and the write cursor, oldest
/// first.
///
/// - `write > read`: `image[read..write]`, borrowed.
/// - otherwise the log wrapped: `image[read..len - 1]` followed by
///   `image[..write]`.
///
/// The wrapped tail stops one byte short of the image end. That byte always
/// falls in the erased padding of the last block, so nothing is lost, and the
/// output matches what the device tooling has always produced.
///
/// Cursors beyond the image are clamped to its length.
#[must_use]
pub fn extract_live_range<'a>(image: &'a [u8], cursors: &Cursors) -> Cow<'a, [u8]> {
    let write = cursors.write.min(image.len());
    let read = cursors.read.min(image.len());

    if write > read {
        return Cow::Borrowed(&image[read..write]);
    }

    let tail_end = image.len().saturating_sub(1).max(read);
    let tail = &image[read..tail_end];
    let head = &image[..write];

    let mut live = Vec::with_capacity(tail.len() + head.len());
    live.extend_from_slice(tail);
    live.extend_from_slice(head);
    Cow::Owned(live)
}
