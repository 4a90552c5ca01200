use criterion::{BenchmarkId, Criterion, Throughput};
use std::io::Write;
use streamzip::{CompressionMethod, ZipArchiveWriter};

fn crc32(c: &mut Criterion) {
    let mut group = c.benchmark_group("crc32");
    for size in &[1, 4, 16, 64, 256, 1024, 4096, 16384, 65536] {
        let data = vec![0; *size];
        let input = data.as_slice();
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _size| {
            b.iter(|| streamzip::crc32(input));
        });
    }
    group.finish();
}

fn write_entry(data: &[u8], method: CompressionMethod) -> Vec<u8> {
    let mut archive = ZipArchiveWriter::new(Vec::with_capacity(data.len() + 1024));
    archive
        .new_file("file.bin")
        .compression_method(method)
        .create()
        .unwrap();

    for chunk in data.chunks(8 * 1024) {
        archive.write_all(chunk).unwrap();
    }

    archive.finish().unwrap()
}

fn single_entry(c: &mut Criterion) {
    let mut group = c.benchmark_group("single-entry");
    for size in &[1024, 65536, 1024 * 1024] {
        let data: Vec<u8> = (0..*size).map(|i: usize| (i % 251) as u8).collect();
        group.throughput(Throughput::Bytes(*size as u64));
        for (label, method) in [
            ("store", CompressionMethod::Store),
            ("deflate", CompressionMethod::Deflate),
        ] {
            group.bench_with_input(BenchmarkId::new(label, size), size, |b, _size| {
                b.iter(|| write_entry(&data, method));
            });
        }
    }
    group.finish();
}

fn many_entries(c: &mut Criterion) {
    let mut group = c.benchmark_group("many-entries");
    let names: Vec<String> = (0..20_000).map(|i| format!("file{:06}.txt", i)).collect();
    group.throughput(Throughput::Elements(names.len() as u64));

    group.bench_function("store", |b| {
        b.iter(|| {
            let mut archive = ZipArchiveWriter::new(Vec::new());
            for name in &names {
                archive.new_file(name).create().unwrap();
                archive.write_all(b"x").unwrap();
                archive.close_entry().unwrap();
            }
            archive.finish().unwrap()
        });
    });
    group.finish();
}

criterion::criterion_group!(benches, crc32, single_entry, many_entries);
criterion::criterion_main!(benches);
