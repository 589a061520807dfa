//! End-to-end capture tests against a generated fixture video.
//!
//! Run `tests/fixtures/generate_fixtures.sh` to create the fixture; the
//! tests return early without it.

use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use framezip::{
    Capture, CaptureOptions, FrameSource, MediaFile, OperationType, PREVIEW_COUNT, PixelFormat,
    ProgressCallback, ProgressInfo, SampleOptions, sample_frames,
};
use image::GenericImageView;
use zip::ZipArchive;

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

/// The same frames remuxed to MPEG-TS with timestamps offset past 2s.
fn offset_video_path() -> &'static str {
    "tests/fixtures/sample_video_offset.ts"
}

// ── Metadata ────────────────────────────────────────────────────────

#[test]
fn fixture_metadata() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let metadata = MediaFile::probe(path).expect("Failed to probe fixture");
    assert_eq!(metadata.video.width, 320);
    assert_eq!(metadata.video.height, 240);
    assert!((metadata.video.frames_per_second - 24.0).abs() < 0.01);
    assert!((metadata.duration.as_secs_f64() - 24.0).abs() < 0.1);
    assert_eq!(metadata.expected_samples(Duration::from_secs(8)), Some(3));
}

#[test]
fn first_frame_decodes_at_source_size() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut file = MediaFile::open(path).expect("Failed to open fixture");
    let frame = file
        .video()
        .read_frame(0)
        .expect("Failed to decode frame 0")
        .expect("Frame 0 missing");
    assert_eq!(frame.dimensions(), (320, 240));
}

#[test]
fn frame_past_end_is_none() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut file = MediaFile::open(path).expect("Failed to open fixture");
    let frame = file.video().frame(24 * 60).expect("Seek past end failed");
    assert!(frame.is_none());
}

// ── Sampling ────────────────────────────────────────────────────────

#[test]
fn samples_every_eight_seconds() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut file = MediaFile::open(path).expect("Failed to open fixture");
    let samples = sample_frames(
        &mut file.video(),
        Duration::from_secs(8),
        &SampleOptions::new(),
    )
    .expect("Sampling failed");

    let seconds: Vec<f64> = samples.iter().map(|sample| sample.seconds()).collect();
    assert_eq!(seconds, vec![0.0, 8.0, 16.0]);
}

#[test]
fn grayscale_and_scaled_output() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut file = MediaFile::open(path).expect("Failed to open fixture");
    let options = SampleOptions::new()
        .with_pixel_format(PixelFormat::Gray8)
        .with_resolution(Some(160), None);
    let samples = sample_frames(
        &mut file.video_with_output(options.frame_output().clone()),
        Duration::from_secs(12),
        &options,
    )
    .expect("Sampling failed");

    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0].image.dimensions(), (160, 120));
    assert!(samples[0].image.as_luma8().is_some());
}

#[test]
fn offset_stream_samples_from_its_first_frame() {
    let path = sample_video_path();
    let offset_path = offset_video_path();
    if !Path::new(path).exists() || !Path::new(offset_path).exists() {
        return;
    }

    let mut offset_file = MediaFile::open(offset_path).expect("Failed to open offset fixture");
    assert!(offset_file.metadata().video.start_time >= Duration::from_secs(2));

    let mut file = MediaFile::open(path).expect("Failed to open fixture");
    let expected = sample_frames(
        &mut file.video(),
        Duration::from_secs(8),
        &SampleOptions::new(),
    )
    .expect("Sampling failed");
    let actual = sample_frames(
        &mut offset_file.video(),
        Duration::from_secs(8),
        &SampleOptions::new(),
    )
    .expect("Sampling offset fixture failed");

    let seconds: Vec<f64> = actual.iter().map(|sample| sample.seconds()).collect();
    assert_eq!(seconds, vec![0.0, 8.0, 16.0]);
    assert_eq!(actual.len(), expected.len());
    for (offset_sample, sample) in actual.iter().zip(&expected) {
        assert_eq!(offset_sample.frame_number, sample.frame_number);
        assert_eq!(
            offset_sample.image.to_rgb8(),
            sample.image.to_rgb8(),
            "frame at {:.2}s differs between containers",
            sample.seconds()
        );
    }
}

// ── Full pipeline ───────────────────────────────────────────────────

struct RecordingProgress {
    operations: Mutex<Vec<OperationType>>,
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.operations.lock().unwrap().push(info.operation);
    }
}

#[test]
fn capture_produces_archive_and_previews() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let recorder = Arc::new(RecordingProgress {
        operations: Mutex::new(Vec::new()),
    });
    let output = Capture::new(path)
        .expect("Failed to parse source")
        .with_interval_secs(4)
        .with_options(CaptureOptions::new().with_progress(recorder.clone()))
        .run()
        .expect("Capture failed");

    assert_eq!(output.sample_count, 6);
    assert_eq!(output.previews.len(), PREVIEW_COUNT);
    assert_eq!(output.previews[2].seconds(), 8.0);
    assert_eq!(output.archive.len(), 6);

    let mut zip = ZipArchive::new(Cursor::new(output.archive.bytes()))
        .expect("Archive is not a readable ZIP");
    for name in output.archive.entries() {
        let mut data = Vec::new();
        zip.by_name(name)
            .expect("Missing entry")
            .read_to_end(&mut data)
            .expect("Failed to read entry");
        let image = image::load_from_memory(&data).expect("Entry is not a decodable image");
        assert_eq!(image.dimensions(), (320, 240));
    }

    let operations = recorder.operations.lock().unwrap();
    assert!(operations.contains(&OperationType::FrameSampling));
    assert!(operations.contains(&OperationType::Archiving));
    assert!(!operations.contains(&OperationType::Download));
}

#[test]
fn capture_is_deterministic() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let run = || {
        Capture::new(path)
            .expect("Failed to parse source")
            .run()
            .expect("Capture failed")
            .archive
            .entries()
            .to_vec()
    };
    assert_eq!(run(), run());
}
