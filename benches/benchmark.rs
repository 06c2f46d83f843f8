use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::hint::black_box;
use std::io::Cursor;
use webp_batch::engine::{fit_within, Bounds};
use webp_batch::{TranscodeConfig, Transcoder, Upload};

const BATCH_SIZE: usize = 16;

fn jpeg(width: u32, height: u32, seed: u8) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, seed])
    }));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .unwrap();
    buf
}

fn batch() -> Vec<Upload> {
    (0..BATCH_SIZE)
        .map(|i| Upload::from_bytes(format!("{i}.jpg"), "image/jpeg", jpeg(1200, 800, i as u8)))
        .collect()
}

pub fn batch_throughput(c: &mut Criterion) {
    let uploads = batch();
    let mut group = c.benchmark_group("batch_throughput");
    group.sample_size(10);
    group.throughput(Throughput::Elements(BATCH_SIZE as u64));

    for workers in [1usize, 2, 4, 8] {
        let dir = tempfile::tempdir().unwrap();
        let config = TranscodeConfig::new(dir.path())
            .with_bounds(640, 640)
            .with_workers(workers);
        let transcoder = Transcoder::from_config(&config).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(workers), &uploads, |b, uploads| {
            b.iter(|| {
                let images = transcoder.process_batch(black_box(uploads.clone())).unwrap();
                transcoder.cleanup().unwrap();
                images
            })
        });
    }
    group.finish();
}

pub fn resize_geometry(c: &mut Criterion) {
    let bounds = Bounds::new(2560, 1440).unwrap();
    c.bench_function("fit_within", |b| {
        b.iter(|| fit_within(black_box(6000), black_box(4000), black_box(bounds)))
    });
}

criterion_group!(benches, batch_throughput, resize_geometry);
criterion_main!(benches);
