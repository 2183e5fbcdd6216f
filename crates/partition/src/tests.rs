use super::*;

// -------------------- Helpers --------------------

const SMALL: Geometry = Geometry::new(128, 4);

/// Erased image with block 0 formatted and the given element statuses.
fn single_block_image(
    elt_size: u16,
    write: CursorStatus,
    read: CursorStatus,
    elements: &[ElementStatus],
) -> Vec<u8> {
    let mut image = erase_image(&SMALL);
    image[..BLOCK_HEADER_BYTES].copy_from_slice(&BlockHeader::new(elt_size, write, read).to_bytes());
    let stride = elt_size as usize + STATUS_BYTES;
    for (i, status) in elements.iter().enumerate() {
        let at = BLOCK_HEADER_BYTES + i * stride;
        image[at..at + STATUS_BYTES].copy_from_slice(&status.marker());
    }
    image
}

/// Writer state used by the wraparound tests: 8 pending records, write cursor
/// in block 0, read cursor in block 2.
fn wrapped_writer() -> LogWriter {
    let mut log = LogWriter::new(SMALL, 20).unwrap();
    for i in 0..12u8 {
        log.push(&[i]).unwrap();
    }
    assert_eq!(log.consume(10), 10);
    for i in 12..18u8 {
        log.push(&[i]).unwrap();
    }
    log
}

// -------------------- Markers & header --------------------

#[test]
fn markers_match_exactly() {
    assert_eq!(CursorStatus::from_marker(&[0xAA; 4]), Some(CursorStatus::Here));
    assert_eq!(CursorStatus::from_marker(&[0x00; 4]), Some(CursorStatus::Passed));
    assert_eq!(CursorStatus::from_marker(&[0xFF; 4]), Some(CursorStatus::Untouched));
    assert_eq!(CursorStatus::from_marker(&[0xAA, 0xAA, 0xAA, 0xAB]), None);

    assert_eq!(ElementStatus::from_marker(&[0xBB; 4]), Some(ElementStatus::Written));
    assert_eq!(ElementStatus::from_marker(&[0x00; 4]), Some(ElementStatus::Consumed));
    assert_eq!(ElementStatus::from_marker(&[0xFF; 4]), Some(ElementStatus::Empty));
    assert_eq!(ElementStatus::from_marker(&[0xBB, 0xBB, 0xBB]), None);
}

#[test]
fn header_parses_its_own_bytes() {
    let header = BlockHeader::new(128, CursorStatus::Passed, CursorStatus::Here);
    let bytes = header.to_bytes();
    assert_eq!(&bytes[..2], &[0xCD, 0xAB]);
    assert_eq!(BlockHeader::parse(&bytes), Some(header));
    assert_eq!(header.stride(), 132);
    assert!(header.holds_cursor());
}

#[test]
fn header_with_unknown_status_keeps_none() {
    let mut bytes = BlockHeader::new(16, CursorStatus::Here, CursorStatus::Here).to_bytes();
    bytes[8..12].copy_from_slice(&[0x12, 0x34, 0x56, 0x78]);
    let header = BlockHeader::parse(&bytes).unwrap();
    assert_eq!(header.write, Some(CursorStatus::Here));
    assert_eq!(header.read, None);
}

#[test]
fn header_rejects_missing_magic_and_short_input() {
    assert!(BlockHeader::parse(&[0xFF; 12]).is_none());
    assert!(BlockHeader::parse(&[0xCD, 0xAB, 0x10]).is_none());
}

#[test]
fn geometry_validation() {
    assert!(Geometry::default().validate().is_ok());
    assert_eq!(Geometry::default().image_len(), 506 * 4096);
    assert!(matches!(
        Geometry::new(12, 4).validate(),
        Err(PartitionError::InvalidGeometry(_))
    ));
    assert!(matches!(
        Geometry::new(4096, 0).validate(),
        Err(PartitionError::InvalidGeometry(_))
    ));
}

#[test]
fn geometry_too_large_is_rejected() {
    let overflowing = Geometry::new(usize::MAX / 2, 3);
    assert!(matches!(
        overflowing.validate(),
        Err(PartitionError::InvalidGeometry(_))
    ));
    assert_eq!(overflowing.image_len(), usize::MAX);

    assert!(matches!(
        Geometry::new(4096, MAX_IMAGE_LEN / 4096 + 1).validate(),
        Err(PartitionError::InvalidGeometry(_))
    ));
    assert!(Geometry::new(4096, MAX_IMAGE_LEN / 4096).validate().is_ok());
}

#[test]
fn erase_image_is_all_ff() {
    let image = erase_image(&SMALL);
    assert_eq!(image.len(), 512);
    assert!(image.iter().all(|&b| b == 0xFF));
}

// -------------------- Block scanner --------------------

#[test]
fn write_cursor_is_first_empty_element() {
    let image = single_block_image(
        20,
        CursorStatus::Here,
        CursorStatus::Here,
        &[ElementStatus::Written, ElementStatus::Written],
    );
    let cursors = locate_cursors(&image, &SMALL).unwrap();
    assert_eq!(cursors.write, 12 + 2 * 24);
    assert_eq!(cursors.read, 12);
    assert_eq!(cursors.elt_size, 20);
    assert!(!cursors.wraps());
}

#[test]
fn read_cursor_skips_consumed_elements() {
    let image = single_block_image(
        20,
        CursorStatus::Here,
        CursorStatus::Here,
        &[
            ElementStatus::Consumed,
            ElementStatus::Consumed,
            ElementStatus::Written,
        ],
    );
    let cursors = locate_cursors(&image, &SMALL).unwrap();
    assert_eq!(cursors.read, 12 + 2 * 24);
    assert_eq!(cursors.write, 12 + 3 * 24);
}

#[test]
fn erased_image_has_no_cursors() {
    let image = erase_image(&SMALL);
    let err = locate_cursors(&image, &SMALL).unwrap_err();
    assert!(matches!(
        err,
        PartitionError::CursorNotFound {
            write: None,
            read: None
        }
    ));
}

#[test]
fn fully_consumed_log_has_no_read_cursor() {
    let image = single_block_image(
        20,
        CursorStatus::Here,
        CursorStatus::Here,
        &[ElementStatus::Consumed],
    );
    let err = locate_cursors(&image, &SMALL).unwrap_err();
    assert!(matches!(
        err,
        PartitionError::CursorNotFound {
            write: Some(36),
            read: None
        }
    ));
}

#[test]
fn cursors_only_come_from_blocks_marked_here() {
    // Written and empty elements exist, but no header claims a cursor.
    let image = single_block_image(
        20,
        CursorStatus::Passed,
        CursorStatus::Untouched,
        &[ElementStatus::Written],
    );
    assert!(matches!(
        locate_cursors(&image, &SMALL),
        Err(PartitionError::CursorNotFound { .. })
    ));
}

#[test]
fn scan_stops_at_first_unformatted_block() {
    let mut image = single_block_image(20, CursorStatus::Passed, CursorStatus::Passed, &[]);
    // block 1 left erased, block 2 claims both cursors: never reached
    let header = BlockHeader::new(20, CursorStatus::Here, CursorStatus::Here).to_bytes();
    image[256..256 + BLOCK_HEADER_BYTES].copy_from_slice(&header);
    image[268..272].copy_from_slice(&ElementStatus::Written.marker());

    assert!(matches!(
        locate_cursors(&image, &SMALL),
        Err(PartitionError::CursorNotFound {
            write: None,
            read: None
        })
    ));
}

#[test]
fn first_block_claiming_a_cursor_wins() {
    let mut image = single_block_image(
        20,
        CursorStatus::Here,
        CursorStatus::Here,
        &[ElementStatus::Written],
    );
    let header = BlockHeader::new(20, CursorStatus::Here, CursorStatus::Passed).to_bytes();
    image[128..128 + BLOCK_HEADER_BYTES].copy_from_slice(&header);

    let cursors = locate_cursors(&image, &SMALL).unwrap();
    assert_eq!(cursors.write, 36);
}

#[test]
fn cursors_split_across_blocks() {
    let mut image = single_block_image(
        20,
        CursorStatus::Passed,
        CursorStatus::Here,
        &[ElementStatus::Consumed, ElementStatus::Written],
    );
    let header = BlockHeader::new(20, CursorStatus::Here, CursorStatus::Untouched).to_bytes();
    image[128..128 + BLOCK_HEADER_BYTES].copy_from_slice(&header);
    image[140..144].copy_from_slice(&ElementStatus::Written.marker());

    let cursors = locate_cursors(&image, &SMALL).unwrap();
    assert_eq!(cursors.read, 36);
    assert_eq!(cursors.write, 128 + 12 + 24);
}

#[test]
fn full_write_block_puts_write_cursor_in_trailing_padding() {
    // 128-byte block, stride 24: slots at 12..108 (4 whole), 108..128 is padding.
    let image = single_block_image(
        20,
        CursorStatus::Here,
        CursorStatus::Here,
        &[ElementStatus::Written; 4],
    );
    let cursors = locate_cursors(&image, &SMALL).unwrap();
    assert_eq!(cursors.write, 108);
    assert_eq!(cursors.read, 12);
    assert_eq!(extract_live_range(&image, &cursors).len(), 4 * 24);
}

#[test]
fn status_prefix_must_fit_in_block() {
    // 62-byte block, stride 24: slots at 12 and 36, the status at 60 would
    // end past the block.
    let geometry = Geometry::new(62, 1);
    let mut image = vec![0xFF; 62];
    let header = BlockHeader::new(20, CursorStatus::Here, CursorStatus::Here).to_bytes();
    image[..BLOCK_HEADER_BYTES].copy_from_slice(&header);
    image[12..16].copy_from_slice(&ElementStatus::Written.marker());
    image[36..40].copy_from_slice(&ElementStatus::Written.marker());

    assert!(matches!(
        locate_cursors(&image, &geometry),
        Err(PartitionError::CursorNotFound {
            write: None,
            read: Some(12)
        })
    ));
}

#[test]
fn short_image_stops_scan() {
    let image = single_block_image(20, CursorStatus::Here, CursorStatus::Here, &[]);
    let err = locate_cursors(&image[..100], &SMALL).unwrap_err();
    assert!(matches!(err, PartitionError::CursorNotFound { .. }));
}

// -------------------- Log extractor --------------------

#[test]
fn linear_range_between_cursors() {
    let mut log = LogWriter::new(SMALL, 20).unwrap();
    for i in 0..6u8 {
        log.push(&[i]).unwrap();
    }
    log.consume(1);
    let image = log.finish();

    let cursors = locate_cursors(&image, &SMALL).unwrap();
    let live = extract_live_range(&image, &cursors);
    assert_eq!(live.len(), cursors.write - cursors.read);
    assert_eq!(&live[..], &image[cursors.read..cursors.write]);
    assert!(matches!(live, std::borrow::Cow::Borrowed(_)));
}

#[test]
fn wrapped_range_drops_last_image_byte() {
    let log = wrapped_writer();
    let (write, read) = (log.write_cursor(), log.read_cursor());
    let image = log.finish();

    let cursors = locate_cursors(&image, &SMALL).unwrap();
    assert_eq!((cursors.write, cursors.read), (write, read));
    assert!(cursors.wraps());

    let live = extract_live_range(&image, &cursors);
    assert_eq!(live.len(), (SMALL.image_len() - 1 - read) + write);
    assert_eq!(&live[..image.len() - 1 - read], &image[read..image.len() - 1]);
    assert_eq!(&live[image.len() - 1 - read..], &image[..write]);
}

#[test]
fn cursors_past_image_end_are_clamped() {
    let image = vec![0u8; 10];
    let cursors = Cursors {
        write: 50,
        read: 4,
        elt_size: 4,
    };
    assert_eq!(extract_live_range(&image, &cursors).len(), 6);
}

// -------------------- Log writer --------------------

#[test]
fn writer_tracks_cursors_across_blocks() {
    let log = wrapped_writer();
    assert_eq!(log.elements_per_block(), 4);
    assert_eq!(log.len(), 8);
    assert_eq!(log.write_cursor(), 12 + 2 * 24);
    assert_eq!(log.read_cursor(), 256 + 12 + 2 * 24);

    let image = log.image();
    let block3 = BlockHeader::parse(&image[384..512]).unwrap();
    assert_eq!(block3.write, Some(CursorStatus::Passed));
    let block0 = BlockHeader::parse(&image[..128]).unwrap();
    assert_eq!(block0.write, Some(CursorStatus::Here));
    assert_eq!(block0.read, Some(CursorStatus::Untouched));
    let block2 = BlockHeader::parse(&image[256..384]).unwrap();
    assert_eq!(block2.read, Some(CursorStatus::Here));
}

#[test]
fn writer_refuses_to_overrun_read_block() {
    let mut log = LogWriter::new(SMALL, 20).unwrap();
    // 4 blocks x 4 slots; the 16th push would move the write cursor into block 0
    for i in 0..15u8 {
        log.push(&[i]).unwrap();
    }
    assert!(matches!(log.push(&[15]), Err(PartitionError::LogFull)));
    assert_eq!(log.len(), 15);
}

#[test]
fn writer_rejects_oversized_payload() {
    let mut log = LogWriter::new(SMALL, 8).unwrap();
    assert!(matches!(
        log.push(&[0u8; 9]),
        Err(PartitionError::PayloadTooLarge {
            len: 9,
            elt_size: 8
        })
    ));
}

#[test]
fn writer_rejects_element_larger_than_block() {
    assert!(matches!(
        LogWriter::new(SMALL, 200),
        Err(PartitionError::InvalidGeometry(_))
    ));
}

#[test]
fn consume_stops_when_log_is_empty() {
    let mut log = LogWriter::new(SMALL, 20).unwrap();
    log.push(&[1]).unwrap();
    log.push(&[2]).unwrap();
    assert_eq!(log.consume(5), 2);
    assert!(log.is_empty());
    assert_eq!(log.read_cursor(), log.write_cursor());
}

#[test]
fn pushed_payload_is_zero_padded() {
    let mut log = LogWriter::new(SMALL, 8).unwrap();
    log.push(&[7, 7, 7]).unwrap();
    let image = log.finish();
    assert_eq!(&image[12..16], &[0xBB; 4]);
    assert_eq!(&image[16..24], &[7, 7, 7, 0, 0, 0, 0, 0]);
    assert_eq!(&image[24..28], &[0xFF; 4]);
}
