//! Capture a frame every N seconds of a video into a ZIP archive.
//!
//! Usage:
//!   cargo run --example capture -- <url_or_file> [interval_seconds]

use std::error::Error;

use framezip::{Capture, DEFAULT_INTERVAL_SECS};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let source = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "input.mp4".to_string());
    let interval = match std::env::args().nth(2) {
        Some(value) => value.parse()?,
        None => DEFAULT_INTERVAL_SECS,
    };

    println!("Capturing {source} every {interval}s...");
    let output = Capture::new(&source)?.with_interval_secs(interval).run()?;

    println!(
        "Video: {}x{}, {:.2} fps, {:.2}s",
        output.metadata.video.width,
        output.metadata.video.height,
        output.metadata.video.frames_per_second,
        output.metadata.duration.as_secs_f64(),
    );
    println!("Captured {} frames", output.sample_count);
    for preview in &output.previews {
        println!("  Preview frame at {:.2}s", preview.seconds());
    }

    output.archive.write_to_path(output.archive.file_name())?;
    println!(
        "Saved {} ({} entries)",
        output.archive.file_name(),
        output.archive.len()
    );

    Ok(())
}
