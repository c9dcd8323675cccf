use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use narcrs::narc::Archive;
use narcrs::yaz0;
use std::fs;
use std::path::Path;

fn gen_data(size: usize, seed: u64) -> Vec<u8> {
    let mut s = seed;
    let mut out = Vec::with_capacity(size);
    for _ in 0..size {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        out.push((s >> 33) as u8);
    }
    out
}

/// Asset-like data: random blocks with frequent short repeats.
fn gen_asset(size: usize, seed: u64) -> Vec<u8> {
    let noise = gen_data(size, seed);
    let mut out = Vec::with_capacity(size);
    let mut i = 0;
    while out.len() < size {
        let run = 4 + (noise[i % size] as usize % 60);
        if noise[(i + 1) % size] < 96 && out.len() > 512 {
            let back = 1 + noise[(i + 2) % size] as usize * 2;
            let start = out.len() - back.min(out.len());
            for k in 0..run {
                let b = out[start + k];
                out.push(b);
            }
        } else {
            out.extend_from_slice(&noise[i % size..(i % size + run).min(size)]);
        }
        i += 3;
    }
    out.truncate(size);
    out
}

fn sample_archive(files: usize, file_size: usize) -> Archive {
    let mut archive = Archive::new();
    let root = archive.root();
    for d in 0..(files / 16).max(1) {
        let dir = archive.tree.branch_or_create(root, &format!("d{d:03}")).unwrap();
        for f in 0..16.min(files) {
            let contents = gen_asset(file_size, (d * 16 + f) as u64);
            archive
                .tree
                .put_leaf(dir, &format!("f{f:02}.bin"), contents)
                .unwrap();
        }
    }
    archive
}

fn write_ratio_snapshot() {
    let input = gen_asset(512 * 1024, 123);
    let mut csv = String::from("level,compressed_bytes,input_bytes,ratio\n");
    for level in 1u32..=9 {
        let packed = yaz0::compress(&input, level);
        let ratio = packed.len() as f64 / input.len() as f64;
        csv.push_str(&format!("{level},{},{},{}\n", packed.len(), input.len(), ratio));
    }
    let out_dir = Path::new("target/criterion/custom_reports");
    let _ = fs::create_dir_all(out_dir);
    let _ = fs::write(out_dir.join("yaz0_ratio_snapshot.csv"), csv);
}

fn bench_compression_speed(c: &mut Criterion) {
    let mut g = c.benchmark_group("yaz0_compress_mb_s");
    for size in [16 * 1024usize, 256 * 1024] {
        let input = gen_asset(size, 1);
        g.throughput(Throughput::Bytes(size as u64));
        g.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(yaz0::compress(black_box(&input), 9)));
        });
    }
    g.finish();
}

fn bench_ratio_vs_level(c: &mut Criterion) {
    write_ratio_snapshot();
    let mut g = c.benchmark_group("yaz0_level");
    let input = gen_asset(128 * 1024, 3);
    g.throughput(Throughput::Bytes(input.len() as u64));
    for level in 1u32..=9u32 {
        g.bench_with_input(BenchmarkId::from_parameter(level), &level, |b, level| {
            b.iter(|| black_box(yaz0::compress(&input, *level).len()));
        });
    }
    g.finish();
}

fn bench_decompression_speed(c: &mut Criterion) {
    let mut g = c.benchmark_group("yaz0_decompress_mb_s");
    for size in [256 * 1024usize, 4 * 1024 * 1024] {
        let packed = yaz0::compress(&gen_asset(size, 2), 9);
        g.throughput(Throughput::Bytes(size as u64));
        g.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(yaz0::decompress(black_box(&packed)).unwrap()));
        });
    }
    g.finish();
}

fn bench_archive_codec(c: &mut Criterion) {
    let mut g = c.benchmark_group("narc_codec");
    for files in [16usize, 256, 2048] {
        let archive = sample_archive(files, 256);
        let bytes = archive.encode().unwrap();
        g.throughput(Throughput::Bytes(bytes.len() as u64));
        g.bench_with_input(BenchmarkId::new("encode", files), &files, |b, _| {
            b.iter(|| black_box(archive.encode().unwrap()));
        });
        g.bench_with_input(BenchmarkId::new("decode", files), &files, |b, _| {
            b.iter(|| black_box(Archive::decode(black_box(&bytes)).unwrap()));
        });
    }
    g.finish();
}

criterion_group!(
    benches,
    bench_compression_speed,
    bench_ratio_vs_level,
    bench_decompression_speed,
    bench_archive_codec
);
criterion_main!(benches);
