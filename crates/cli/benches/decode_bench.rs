use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use engine::Decoder;
use partition::{extract_live_range, locate_cursors, Geometry, LogWriter};
use record::RecordBuilder;
use sink::{CsvSink, MemorySink, NullSink};

const ELT_SIZE: u16 = 128;

/// Default-geometry image whose live data wraps, about 8000 records.
fn build_image() -> Vec<u8> {
    let mut log = LogWriter::new(Geometry::default(), ELT_SIZE).unwrap();
    let accel: Vec<[i16; 3]> = (0..10).map(|i| [i, -i, i * 2]).collect();
    let gyro: Vec<[i32; 3]> = (0..5).map(|i| [i * 1000, -i, 7]).collect();
    let push = |log: &mut LogWriter, ts: u32| {
        let payload = RecordBuilder::new(ts)
            .accel(&accel)
            .unwrap()
            .gyro(&gyro)
            .unwrap()
            .build();
        log.push(&payload).unwrap();
    };

    for ts in 0..14_000 {
        push(&mut log, ts * 100);
    }
    log.consume(10_000);
    for ts in 14_000..18_000 {
        push(&mut log, ts * 100);
    }
    log.finish()
}

fn locate_benchmark(c: &mut Criterion) {
    let image = build_image();
    let geometry = Geometry::default();
    c.bench_function("locate_and_extract_default_geometry", |b| {
        b.iter(|| {
            let cursors = locate_cursors(&image, &geometry).unwrap();
            extract_live_range(&image, &cursors).len()
        });
    });
}

fn decode_benchmark(c: &mut Criterion) {
    let image = build_image();
    let decoder = Decoder::new(Geometry::default(), 100).unwrap();

    c.bench_function("decode_8k_records_null_sink", |b| {
        b.iter(|| {
            let report = decoder.decode(&image, &mut NullSink).unwrap();
            assert_eq!(report.summary.record_count, 8_000);
        });
    });

    c.bench_function("decode_8k_records_memory_sink", |b| {
        b.iter_batched(
            MemorySink::new,
            |mut sink| {
                decoder.decode(&image, &mut sink).unwrap();
                sink
            },
            BatchSize::LargeInput,
        );
    });

    c.bench_function("decode_8k_records_csv", |b| {
        b.iter_batched(
            || CsvSink::new(std::io::sink(), std::io::sink()).unwrap(),
            |mut sink| {
                decoder.decode(&image, &mut sink).unwrap();
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, locate_benchmark, decode_benchmark);
criterion_main!(benches);
