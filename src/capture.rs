//! The acquire → sample → archive pipeline for one request.
//!
//! [`Capture`] owns a request-scoped [`Workspace`](crate::Workspace) for the
//! duration of [`run`](Capture::run); the downloaded video is removed when
//! `run` returns, whether it succeeded or not. No partial archive is ever
//! returned.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
    time::Duration,
};

use crate::{
    archive::{ArchiveCompression, ArchiveImageFormat, ArchiveOptions, FrameArchive, build_archive},
    configuration::{DEFAULT_INTERVAL_SECS, PREVIEW_COUNT, PixelFormat, SampleOptions},
    download::{DownloadOptions, Downloader, VideoSource, Workspace},
    error::FramezipError,
    media::MediaFile,
    metadata::MediaMetadata,
    progress::{CancellationToken, OperationType, ProgressCallback, ProgressTracker},
    sampler::{FrameSample, sample_frames},
};

/// Options for every stage of a capture.
#[derive(Debug, Clone, Default)]
pub struct CaptureOptions {
    sample: SampleOptions,
    archive: ArchiveOptions,
    download: DownloadOptions,
}

impl CaptureOptions {
    /// Default options for every stage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach one progress callback to every stage.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.sample = self.sample.with_progress(callback.clone());
        self.archive = self.archive.with_progress(callback);
        self
    }

    /// Attach one cancellation token to every stage.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.sample = self.sample.with_cancellation(token.clone());
        self.archive = self.archive.with_cancellation(token);
        self
    }

    /// Set the progress cadence of every stage.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.sample = self.sample.with_batch_size(size);
        self.archive = self.archive.with_batch_size(size);
        self
    }

    /// Wall-clock budget for sampling.
    #[must_use]
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.sample = self.sample.with_time_limit(limit);
        self
    }

    /// Stop sampling after `count` samples.
    #[must_use]
    pub fn with_max_samples(mut self, count: usize) -> Self {
        self.sample = self.sample.with_max_samples(count);
        self
    }

    /// Pixel format of the sampled frames.
    #[must_use]
    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        self.sample = self.sample.with_pixel_format(format);
        self
    }

    /// Output resolution of the sampled frames.
    #[must_use]
    pub fn with_resolution(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.sample = self.sample.with_resolution(width, height);
        self
    }

    /// Image format of the archive entries.
    #[must_use]
    pub fn with_image_format(mut self, format: ArchiveImageFormat) -> Self {
        self.archive = self.archive.with_image_format(format);
        self
    }

    /// Compression of the archive entries.
    #[must_use]
    pub fn with_compression(mut self, compression: ArchiveCompression) -> Self {
        self.archive = self.archive.with_compression(compression);
        self
    }

    /// External downloader executable.
    #[must_use]
    pub fn with_downloader(mut self, program: impl Into<String>) -> Self {
        self.download = self.download.with_program(program);
        self
    }

    /// Sampling options in effect.
    pub fn sample_options(&self) -> &SampleOptions {
        &self.sample
    }

    /// Archive options in effect.
    pub fn archive_options(&self) -> &ArchiveOptions {
        &self.archive
    }

    /// Download options in effect.
    pub fn download_options(&self) -> &DownloadOptions {
        &self.download
    }
}

/// Everything a capture hands back to the caller.
pub struct CaptureOutput {
    /// Where the video came from.
    pub source: VideoSource,
    /// Metadata of the sampled video.
    pub metadata: MediaMetadata,
    /// Number of samples taken.
    pub sample_count: usize,
    /// Up to the first [`PREVIEW_COUNT`] samples.
    pub previews: Vec<FrameSample>,
    /// The finished archive.
    pub archive: FrameArchive,
}

impl Debug for CaptureOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CaptureOutput")
            .field("source", &self.source)
            .field("sample_count", &self.sample_count)
            .field("previews", &self.previews.len())
            .field("archive", &self.archive)
            .finish_non_exhaustive()
    }
}

/// One capture request.
///
/// # Example
///
/// ```no_run
/// use framezip::{Capture, FramezipError};
///
/// let output = Capture::new("https://www.youtube.com/watch?v=dQw4w9WgXcQ")?
///     .with_interval_secs(8)
///     .run()?;
/// println!("Captured {} frames", output.sample_count);
/// output.archive.write_to_path(output.archive.file_name())?;
/// # Ok::<(), FramezipError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Capture {
    source: VideoSource,
    interval: Duration,
    options: CaptureOptions,
}

impl Capture {
    /// Create a capture for a URL or local path, sampling every
    /// [`DEFAULT_INTERVAL_SECS`] seconds.
    ///
    /// # Errors
    ///
    /// Returns [`FramezipError::EmptySource`] for blank input.
    pub fn new(input: &str) -> Result<Self, FramezipError> {
        Ok(Self::from_source(VideoSource::parse(input)?))
    }

    /// Create a capture for an already classified source.
    pub fn from_source(source: VideoSource) -> Self {
        Self {
            source,
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            options: CaptureOptions::default(),
        }
    }

    /// Set the sampling interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the sampling interval in whole seconds.
    #[must_use]
    pub fn with_interval_secs(self, seconds: u64) -> Self {
        self.with_interval(Duration::from_secs(seconds))
    }

    /// Replace all options.
    #[must_use]
    pub fn with_options(mut self, options: CaptureOptions) -> Self {
        self.options = options;
        self
    }

    /// The source being captured.
    pub fn source(&self) -> &VideoSource {
        &self.source
    }

    /// The sampling interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Acquire, sample, and archive.
    ///
    /// # Errors
    ///
    /// Acquisition errors ([`FramezipError::DownloaderSpawn`],
    /// [`FramezipError::DownloadFailed`], [`FramezipError::DownloadMissing`])
    /// abort before any decoding. Open, decode, encode, and archive errors
    /// propagate unchanged.
    pub fn run(&self) -> Result<CaptureOutput, FramezipError> {
        log::info!(
            "Capturing {} every {:.2}s",
            self.source,
            self.interval.as_secs_f64()
        );

        let workspace = Workspace::new()?;
        let mut download_tracker = self.source.is_remote().then(|| {
            ProgressTracker::new(
                self.options.sample.progress.clone(),
                OperationType::Download,
                Some(1),
                1,
            )
        });
        let video_path =
            Downloader::new(self.options.download.clone()).acquire(&self.source, &workspace)?;
        if let Some(tracker) = download_tracker.as_mut() {
            tracker.advance(None, None);
        }

        let mut file = MediaFile::open(&video_path)?;
        let metadata = file.metadata().clone();
        let samples = {
            let mut video = file.video_with_output(self.options.sample.frame_output().clone());
            sample_frames(&mut video, self.interval, &self.options.sample)?
        };
        drop(file);

        let archive = build_archive(&samples, &self.options.archive)?;
        let sample_count = samples.len();
        let previews = samples.into_iter().take(PREVIEW_COUNT).collect();

        log::info!(
            "Capture of {} finished: {sample_count} samples, {} archive entries",
            self.source,
            archive.len()
        );

        Ok(CaptureOutput {
            source: self.source.clone(),
            metadata,
            sample_count,
            previews,
            archive,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_interval() {
        let capture = Capture::new("clip.mp4").unwrap();
        assert_eq!(capture.interval(), Duration::from_secs(8));
        assert_eq!(
            capture.source(),
            &VideoSource::Local("clip.mp4".into())
        );
    }

    #[test]
    fn options_fan_out_to_stages() {
        let options = CaptureOptions::new()
            .with_batch_size(5)
            .with_cancellation(CancellationToken::new())
            .with_image_format(ArchiveImageFormat::Bmp)
            .with_downloader("youtube-dl");
        assert!(format!("{:?}", options.sample_options()).contains("batch_size: 5"));
        assert!(format!("{:?}", options.archive_options()).contains("has_cancellation: true"));
        assert_eq!(options.archive_options().image_format(), ArchiveImageFormat::Bmp);
        assert_eq!(options.download_options().program(), "youtube-dl");
    }
}
