//! Benchmarks for frame decoding, sampling, and archive building.
//!
//! Run with: cargo bench
//!
//! Decoding benchmarks require the fixture from
//! `tests/fixtures/generate_fixtures.sh`.

use std::{path::Path, time::Duration};

use criterion::Criterion;
use framezip::{
    ArchiveCompression, ArchiveOptions, FfmpegLogLevel, FrameSample, MediaFile, PixelFormat,
    SampleOptions, build_archive, sample_frames,
};
use image::{DynamicImage, RgbImage};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

fn benchmark_single_frame(criterion: &mut Criterion) {
    framezip::set_ffmpeg_log_level(FfmpegLogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    criterion.bench_function("decode frame 0", |bencher| {
        bencher.iter(|| {
            let mut file = MediaFile::open(SAMPLE_VIDEO).unwrap();
            let _frame = file.video().frame(0).unwrap();
        });
    });

    criterion.bench_function("decode frame (mid-video seek)", |bencher| {
        bencher.iter(|| {
            let mut file = MediaFile::open(SAMPLE_VIDEO).unwrap();
            let _frame = file.video().frame(300).unwrap();
        });
    });
}

fn benchmark_sampling(criterion: &mut Criterion) {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    criterion.bench_function("sample every 8s", |bencher| {
        bencher.iter(|| {
            let mut file = MediaFile::open(SAMPLE_VIDEO).unwrap();
            let _samples = sample_frames(
                &mut file.video(),
                Duration::from_secs(8),
                &SampleOptions::new(),
            )
            .unwrap();
        });
    });

    criterion.bench_function("sample every 1s", |bencher| {
        bencher.iter(|| {
            let mut file = MediaFile::open(SAMPLE_VIDEO).unwrap();
            let _samples = sample_frames(
                &mut file.video(),
                Duration::from_secs(1),
                &SampleOptions::new(),
            )
            .unwrap();
        });
    });

    criterion.bench_function("sample every 8s Gray8 160w", |bencher| {
        bencher.iter(|| {
            let mut file = MediaFile::open(SAMPLE_VIDEO).unwrap();
            let options = SampleOptions::new()
                .with_pixel_format(PixelFormat::Gray8)
                .with_resolution(Some(160), None);
            let _samples = sample_frames(
                &mut file.video_with_output(options.frame_output().clone()),
                Duration::from_secs(8),
                &options,
            )
            .unwrap();
        });
    });
}

fn synthetic_samples(count: u64) -> Vec<FrameSample> {
    (0..count)
        .map(|index| FrameSample {
            frame_number: index * 192,
            timestamp: Duration::from_secs(index * 8),
            image: DynamicImage::ImageRgb8(RgbImage::from_fn(640, 360, |x, y| {
                image::Rgb([(x % 256) as u8, (y % 256) as u8, (index % 256) as u8])
            })),
        })
        .collect()
}

fn benchmark_archive(criterion: &mut Criterion) {
    let samples = synthetic_samples(8);

    criterion.bench_function("archive 8 PNG frames (deflate)", |bencher| {
        let options = ArchiveOptions::new();
        bencher.iter(|| build_archive(&samples, &options).unwrap());
    });

    criterion.bench_function("archive 8 PNG frames (stored)", |bencher| {
        let options = ArchiveOptions::new().with_compression(ArchiveCompression::Stored);
        bencher.iter(|| build_archive(&samples, &options).unwrap());
    });
}

criterion::criterion_group!(
    benches,
    benchmark_single_frame,
    benchmark_sampling,
    benchmark_archive,
);
criterion::criterion_main!(benches);
