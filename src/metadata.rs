//! Media metadata types.
//!
//! This module defines the metadata returned by
//! [`MediaFile::metadata`](crate::MediaFile::metadata). Metadata is read once
//! when the file is opened and cached for the lifetime of the handle.

use std::time::Duration;

/// Metadata for an opened video file.
///
/// # Example
///
/// ```no_run
/// use framezip::MediaFile;
///
/// let file = MediaFile::open("input.mp4").unwrap();
/// let metadata = file.metadata();
/// println!("Duration: {:?}", metadata.duration);
/// println!("Format: {}", metadata.format);
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct MediaMetadata {
    /// Metadata of the best video stream.
    pub video: VideoMetadata,
    /// Total duration reported by the container. Zero when unknown.
    pub duration: Duration,
    /// Container format name (e.g. `"mp4"`, `"matroska"`, `"webm"`).
    pub format: String,
}

impl MediaMetadata {
    /// Number of samples an interval is expected to produce, `ceil(D / I)`.
    ///
    /// Returns `None` when the duration is unknown or the interval is zero.
    /// The actual count may differ by one because of frame rounding.
    pub fn expected_samples(&self, interval: Duration) -> Option<u64> {
        if self.duration.is_zero() || interval.is_zero() {
            return None;
        }
        let ratio = self.duration.as_secs_f64() / interval.as_secs_f64();
        Some(ratio.ceil() as u64)
    }
}

/// Metadata for a video stream.
#[derive(Debug, Clone)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second (may be approximate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Estimated total number of frames, computed from duration and frame rate.
    pub frame_count: u64,
    /// Codec name (e.g. `"h264"`, `"vp9"`, `"av1"`).
    pub codec: String,
    /// Index of the stream inside the container.
    pub stream_index: usize,
    /// Timestamp of the stream's first frame. Frame numbers and sample
    /// timestamps are measured from here, so a stream starting at 1.4s
    /// still has its first sample at `0.00s`.
    pub start_time: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(seconds: u64) -> MediaMetadata {
        MediaMetadata {
            video: VideoMetadata {
                width: 64,
                height: 48,
                frames_per_second: 24.0,
                frame_count: seconds * 24,
                codec: "h264".to_string(),
                stream_index: 0,
                start_time: Duration::ZERO,
            },
            duration: Duration::from_secs(seconds),
            format: "mp4".to_string(),
        }
    }

    #[test]
    fn expected_samples_rounds_up() {
        assert_eq!(metadata(24).expected_samples(Duration::from_secs(8)), Some(3));
        assert_eq!(metadata(25).expected_samples(Duration::from_secs(8)), Some(4));
        assert_eq!(metadata(5).expected_samples(Duration::from_secs(60)), Some(1));
    }

    #[test]
    fn expected_samples_unknown_duration() {
        assert_eq!(metadata(0).expected_samples(Duration::from_secs(8)), None);
        assert_eq!(metadata(10).expected_samples(Duration::ZERO), None);
    }
}
