//! Sample a local video without archiving, saving each still as a PNG.
//!
//! Usage:
//!   cargo run --example sample_local -- <input_file> [interval_seconds]

use std::error::Error;
use std::time::Duration;

use framezip::{
    ArchiveImageFormat, MediaFile, PixelFormat, SampleOptions, entry_name, sample_frames,
};

fn main() -> Result<(), Box<dyn Error>> {
    let input_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "input.mp4".to_string());
    let interval: u64 = match std::env::args().nth(2) {
        Some(value) => value.parse()?,
        None => 8,
    };

    println!("Opening {input_path}...");
    let mut file = MediaFile::open(&input_path)?;
    let metadata = file.metadata();
    println!(
        "Video: {}x{}, {:.2} fps, ~{} frames, expecting {:?} samples",
        metadata.video.width,
        metadata.video.height,
        metadata.video.frames_per_second,
        metadata.video.frame_count,
        metadata.expected_samples(Duration::from_secs(interval)),
    );

    // Half-size grayscale stills.
    let options = SampleOptions::new()
        .with_pixel_format(PixelFormat::Gray8)
        .with_resolution(Some(metadata.video.width / 2), None);
    let samples = sample_frames(
        &mut file.video_with_output(options.frame_output().clone()),
        Duration::from_secs(interval),
        &options,
    )?;

    for sample in &samples {
        let filename = entry_name(sample.timestamp, ArchiveImageFormat::Png);
        sample.image.save(&filename)?;
        println!("Saved {filename} (frame {})", sample.frame_number);
    }

    Ok(())
}
