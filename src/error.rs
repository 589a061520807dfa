//! Error types for the `framezip` crate.
//!
//! This module defines [`FramezipError`], the unified error type returned by
//! every fallible operation in the crate. Acquisition failures, decode
//! failures, and archive failures are distinct variants so callers can tell
//! a broken download apart from a broken video.

use std::{io::Error as IoError, path::PathBuf, process::ExitStatus, time::Duration};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;
use zip::result::ZipError;

/// The unified error type for all `framezip` operations.
///
/// Every public method that can fail returns `Result<T, FramezipError>`.
/// Variants carry enough context to diagnose the problem without needing
/// additional logging at the call site.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FramezipError {
    /// No URL or path was given.
    #[error("No video source given")]
    EmptySource,

    /// The external downloader could not be started at all.
    #[error("Failed to run downloader `{program}`: {reason}")]
    DownloaderSpawn {
        /// Program that was invoked.
        program: String,
        /// Underlying reason the spawn failed.
        reason: String,
    },

    /// The external downloader ran but reported failure.
    #[error("Download of {url} failed ({status}): {stderr}")]
    DownloadFailed {
        /// URL passed to the downloader.
        url: String,
        /// Exit status of the downloader process.
        status: ExitStatus,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// The downloader exited successfully but left no video behind.
    #[error("Downloader reported success but no video was written to {0}")]
    DownloadMissing(PathBuf),

    /// The video file could not be opened.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::MediaFile::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// The video reports a frame rate that cannot be used for timestamps.
    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(f64),

    /// The sampling interval is zero or shorter than one frame.
    #[error("Invalid sampling interval {interval:?} at {frames_per_second} fps")]
    InvalidInterval {
        /// The interval that was requested.
        interval: Duration,
        /// Frame rate the interval was resolved against.
        frames_per_second: f64,
    },

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while converting or encoding a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The ZIP archive could not be written.
    #[error("Archive error: {0}")]
    ArchiveError(#[from] ZipError),

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// The operation ran past its configured time limit.
    #[error("Operation timed out after {0:?}")]
    TimedOut(Duration),
}

impl From<FfmpegError> for FramezipError {
    fn from(error: FfmpegError) -> Self {
        FramezipError::FfmpegError(error.to_string())
    }
}
