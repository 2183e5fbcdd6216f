use partition::{Geometry, LogWriter};
use record::RecordBuilder;

/// 4 blocks of 256 bytes, 6 slots of 36 bytes each, 28 bytes of padding.
pub const GEOMETRY: Geometry = Geometry::new(256, 4);
pub const ELT_SIZE: u16 = 32;
pub const STRIDE: usize = ELT_SIZE as usize + 4;

/// One accel and one gyro sample, both derived from `ts`.
pub fn inertial_record(ts: u32) -> Vec<u8> {
    let v = ts as i16;
    RecordBuilder::new(ts)
        .accel(&[[v, v + 1, v + 2]])
        .unwrap()
        .gyro(&[[i32::from(v) * 10, 0, -1]])
        .unwrap()
        .build()
}

/// Image holding `records` from block 0 on, nothing consumed.
pub fn image_with(records: &[Vec<u8>]) -> Vec<u8> {
    let mut log = LogWriter::new(GEOMETRY, ELT_SIZE).unwrap();
    for r in records {
        log.push(r).unwrap();
    }
    log.finish()
}

/// Image whose live data wraps past the end of the partition. Holds records
/// stamped 15..=26 in write order.
pub fn wrapped_image() -> Vec<u8> {
    let mut log = LogWriter::new(GEOMETRY, ELT_SIZE).unwrap();
    for ts in 0..18 {
        log.push(&inertial_record(ts)).unwrap();
    }
    log.consume(15);
    for ts in 18..27 {
        log.push(&inertial_record(ts)).unwrap();
    }
    log.finish()
}
