//! Sampling configuration.
//!
//! [`SampleOptions`] is a builder that threads progress callbacks,
//! cancellation tokens, limits, and frame output settings through the
//! sampler without polluting every function signature.
//!
//! # Example
//!
//! ```no_run
//! use std::{sync::Arc, time::Duration};
//!
//! use framezip::{CancellationToken, ProgressCallback, ProgressInfo, SampleOptions};
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{:?}: {} done", info.operation, info.current);
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let options = SampleOptions::new()
//!     .with_progress(Arc::new(LogProgress))
//!     .with_cancellation(token.clone())
//!     .with_time_limit(Duration::from_secs(600));
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;

use ffmpeg_next::format::Pixel;

use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// Smallest sampling interval the front end accepts, in seconds.
pub const MIN_INTERVAL_SECS: u64 = 1;
/// Largest sampling interval the front end accepts, in seconds.
pub const MAX_INTERVAL_SECS: u64 = 60;
/// Sampling interval used when none is given, in seconds.
pub const DEFAULT_INTERVAL_SECS: u64 = 8;
/// Number of leading samples offered as a preview.
pub const PREVIEW_COUNT: usize = 3;

/// Output pixel format for sampled frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 8-bit RGB (24 bpp). This is the default.
    #[default]
    Rgb8,
    /// 8-bit RGBA with alpha pre-set to 255 (32 bpp).
    Rgba8,
    /// 8-bit grayscale (8 bpp).
    Gray8,
}

impl PixelFormat {
    /// Map to the corresponding FFmpeg pixel format constant.
    pub(crate) fn to_ffmpeg_pixel(self) -> Pixel {
        match self {
            PixelFormat::Rgb8 => Pixel::RGB24,
            PixelFormat::Rgba8 => Pixel::RGBA,
            PixelFormat::Gray8 => Pixel::GRAY8,
        }
    }

    /// Bytes per pixel of the packed output buffer.
    pub(crate) fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
            PixelFormat::Gray8 => 1,
        }
    }

    /// Parse a user-supplied name such as `"rgb"` or `"gray8"`.
    pub fn from_name(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "rgb8" | "rgb" => Some(PixelFormat::Rgb8),
            "rgba8" | "rgba" => Some(PixelFormat::Rgba8),
            "gray8" | "gray" | "greyscale" | "grayscale" => Some(PixelFormat::Gray8),
            _ => None,
        }
    }
}

/// Frame output settings.
///
/// Controls the pixel format and resolution of decoded frames. When no
/// dimensions are set the source resolution is used. Setting one dimension
/// together with [`maintain_aspect_ratio`](FrameOutputOptions::maintain_aspect_ratio)
/// computes the other dimension automatically.
#[derive(Debug, Clone)]
pub struct FrameOutputOptions {
    /// Output pixel format.
    pub pixel_format: PixelFormat,
    /// Target width. `None` keeps the source width.
    pub width: Option<u32>,
    /// Target height. `None` keeps the source height.
    pub height: Option<u32>,
    /// When `true` and only one dimension is specified, the other is
    /// computed to preserve the source aspect ratio.
    pub maintain_aspect_ratio: bool,
}

impl Default for FrameOutputOptions {
    fn default() -> Self {
        Self {
            pixel_format: PixelFormat::Rgb8,
            width: None,
            height: None,
            maintain_aspect_ratio: true,
        }
    }
}

impl FrameOutputOptions {
    /// Resolve the final output dimensions given the source size.
    ///
    /// Returns `(width, height)`.
    pub(crate) fn resolve_dimensions(&self, source_width: u32, source_height: u32) -> (u32, u32) {
        match (self.width, self.height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) if self.maintain_aspect_ratio && source_width > 0 => {
                let ratio = w as f64 / source_width as f64;
                let h = (source_height as f64 * ratio).round() as u32;
                (w, h.max(1))
            }
            (Some(w), None) => (w, source_height),
            (None, Some(h)) if self.maintain_aspect_ratio && source_height > 0 => {
                let ratio = h as f64 / source_height as f64;
                let w = (source_width as f64 * ratio).round() as u32;
                (w.max(1), h)
            }
            (None, Some(h)) => (source_width, h),
            (None, None) => (source_width, source_height),
        }
    }
}

/// Options for a sampling run.
///
/// All fields have defaults; a default-constructed value samples the whole
/// video with no progress reporting, no cancellation, and no limits.
#[derive(Clone)]
pub struct SampleOptions {
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    /// How often to fire the progress callback (every N samples).
    pub(crate) batch_size: u64,
    /// Wall-clock budget for the whole sampling loop.
    pub(crate) time_limit: Option<Duration>,
    /// Stop after this many samples.
    pub(crate) max_samples: Option<usize>,
    pub(crate) frame_output: FrameOutputOptions,
}

impl Debug for SampleOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SampleOptions")
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .field("time_limit", &self.time_limit)
            .field("max_samples", &self.max_samples)
            .field("frame_output", &self.frame_output)
            .finish_non_exhaustive()
    }
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
            time_limit: None,
            max_samples: None,
            frame_output: FrameOutputOptions::default(),
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled the sampling loop stops and returns
    /// [`FramezipError::Cancelled`](crate::FramezipError::Cancelled).
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set how often the progress callback fires. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Abort with [`FramezipError::TimedOut`](crate::FramezipError::TimedOut)
    /// once sampling has run for longer than `limit`.
    #[must_use]
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Stop sampling after `count` samples. Not an error.
    #[must_use]
    pub fn with_max_samples(mut self, count: usize) -> Self {
        self.max_samples = Some(count);
        self
    }

    /// Set the output pixel format for sampled frames.
    #[must_use]
    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        self.frame_output.pixel_format = format;
        self
    }

    /// Set a custom output resolution for sampled frames.
    ///
    /// Pass `None` for either dimension to keep the source value.
    #[must_use]
    pub fn with_resolution(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.frame_output.width = width;
        self.frame_output.height = height;
        self
    }

    /// Set the complete frame output configuration.
    #[must_use]
    pub fn with_frame_output(mut self, options: FrameOutputOptions) -> Self {
        self.frame_output = options;
        self
    }

    /// Frame output settings in effect.
    pub fn frame_output(&self) -> &FrameOutputOptions {
        &self.frame_output
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
