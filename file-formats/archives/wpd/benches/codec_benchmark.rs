//! codec and archive benchmarks

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::io::Cursor;
use wpd::{
    Attribute, AttributeType, Chunk, EntryFilter, Format, MemorySource, SchemaRegistry,
    WpdArchive,
};

fn sample_archive(entries: usize) -> WpdArchive {
    let mut archive = WpdArchive::new();
    for i in 0..entries {
        let mut record = Chunk::with_size(64);
        for offset in (0..64).step_by(4) {
            record.set_unsigned(offset, (i * offset) as u32).unwrap();
        }
        archive.insert_entry(format!("it_{i:05}"), record);
    }
    archive.string_reference("wea_sw01").unwrap();
    archive
}

fn bench_bit_fields(c: &mut Criterion) {
    let mut chunk = Chunk::with_size(256);

    c.bench_function("set_get_unsigned_mask", |b| {
        b.iter(|| {
            for offset in (0..256).step_by(4) {
                chunk
                    .set_unsigned_mask(black_box(offset), 5, 11, black_box(0x3FF))
                    .unwrap();
                black_box(chunk.get_unsigned_mask(offset, 5, 11).unwrap());
            }
        });
    });

    c.bench_function("get_signed_mask", |b| {
        b.iter(|| {
            for offset in (0..256).step_by(4) {
                black_box(chunk.get_signed_mask(black_box(offset), 3, 9).unwrap());
            }
        });
    });
}

fn bench_archive_round_trip(c: &mut Criterion) {
    let archive = sample_archive(1000);
    let mut bytes = Vec::new();
    archive.write_to(&mut bytes).unwrap();

    c.bench_function("archive_write_1000", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(bytes.len());
            archive.write_to(&mut out).unwrap();
            black_box(out);
        });
    });

    c.bench_function("archive_read_1000", |b| {
        b.iter(|| black_box(WpdArchive::read_from(&mut Cursor::new(&bytes)).unwrap()));
    });
}

fn bench_patch_and_convert(c: &mut Criterion) {
    let registry = SchemaRegistry::new(MemorySource::new());
    let mut format = Format::new("item", 64);
    format
        .add_attribute(Attribute::new("price", AttributeType::Unsigned, 0))
        .unwrap();
    format
        .add_attribute(Attribute::new("level", AttributeType::Unsigned, 4).with_bits(0, 8))
        .unwrap();

    let mut script = String::new();
    for i in 0..1000 {
        script.push_str(&format!("@it_{i:05}:\n> price = {i}\n> level = 0x{:02X}\n", i % 256));
    }

    c.bench_function("apply_patch_1000", |b| {
        b.iter(|| {
            let mut archive = sample_archive(1000);
            black_box(archive.apply_patch(&script, &format, &registry));
        });
    });

    let archive = sample_archive(1000);
    c.bench_function("convert_with_format_1000", |b| {
        b.iter(|| {
            let mut out = Vec::new();
            archive
                .convert_with_format(&mut out, &format, &registry, &EntryFilter::all(), true)
                .unwrap();
            black_box(out);
        });
    });
}

criterion_group!(
    benches,
    bench_bit_fields,
    bench_archive_round_trip,
    bench_patch_and_convert
);
criterion_main!(benches);
