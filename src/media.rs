//! Core [`MediaFile`] implementation.
//!
//! `MediaFile` opens a video file, caches the metadata of its best video
//! stream, and hands out a [`VideoHandle`] for decoding individual frames.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{codec::context::Context as CodecContext, format::context::Input, media::Type};

use crate::{
    configuration::FrameOutputOptions,
    error::FramezipError,
    conversion::{normalize_start_pts, pts_to_seconds},
    metadata::{MediaMetadata, VideoMetadata},
    video::VideoHandle,
};

/// An opened video file.
///
/// Created via [`MediaFile::open`], this struct holds the demuxer context
/// and cached metadata. Use [`video()`](MediaFile::video) to decode frames.
///
/// # Example
///
/// ```no_run
/// use framezip::{FramezipError, MediaFile};
///
/// let mut file = MediaFile::open("input.mp4")?;
/// println!("{:.2} fps", file.metadata().video.frames_per_second);
///
/// if let Some(frame) = file.video().frame(0)? {
///     frame.save("first_frame.png")?;
/// }
/// # Ok::<(), FramezipError>(())
/// ```
pub struct MediaFile {
    pub(crate) input_context: Input,
    pub(crate) metadata: MediaMetadata,
    pub(crate) video_stream_index: usize,
    pub(crate) file_path: PathBuf,
}

impl Debug for MediaFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MediaFile")
            .field("metadata", &self.metadata)
            .field("video_stream_index", &self.video_stream_index)
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}

impl MediaFile {
    /// Open a video file.
    ///
    /// Initializes FFmpeg (idempotent), opens the file, locates the best
    /// video stream, and caches its metadata.
    ///
    /// # Errors
    ///
    /// - [`FramezipError::FileOpen`] if the file cannot be opened or its
    ///   video codec parameters cannot be read.
    /// - [`FramezipError::NoVideoStream`] if the file has no video.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FramezipError> {
        let file_path = path.as_ref().to_path_buf();

        log::debug!("Opening media file: {}", file_path.display());

        ffmpeg_next::init().map_err(|error| FramezipError::FileOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&file_path).map_err(|error| FramezipError::FileOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            })?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(FramezipError::NoVideoStream)?;
        let video_stream_index = stream.index();

        let start_seconds =
            pts_to_seconds(normalize_start_pts(stream.start_time()), stream.time_base());
        let start_time = Duration::from_secs_f64(start_seconds.max(0.0));

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let decoder_context = CodecContext::from_parameters(stream.parameters()).map_err(
            |error| FramezipError::FileOpen {
                path: file_path.clone(),
                reason: format!(
                    "Failed to read video codec parameters for stream {video_stream_index}: {error}"
                ),
            },
        )?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| FramezipError::FileOpen {
                path: file_path.clone(),
                reason: format!(
                    "Failed to create video decoder for stream {video_stream_index}: {error}"
                ),
            })?;

        // Prefer the average frame rate; fall back to the stream's base rate.
        let average_rate = stream.avg_frame_rate();
        let frames_per_second = if average_rate.denominator() != 0 && average_rate.numerator() > 0
        {
            average_rate.numerator() as f64 / average_rate.denominator() as f64
        } else {
            let rate = stream.rate();
            if rate.denominator() != 0 {
                rate.numerator() as f64 / rate.denominator() as f64
            } else {
                0.0
            }
        };

        // The container duration spans first to last timestamp, so this
        // counts frames from the stream start like `VideoHandle::frame`.
        let frame_count = if frames_per_second > 0.0 {
            (duration.as_secs_f64() * frames_per_second).round() as u64
        } else {
            0
        };

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = MediaMetadata {
            video: VideoMetadata {
                width: decoder.width(),
                height: decoder.height(),
                frames_per_second,
                frame_count,
                codec,
                stream_index: video_stream_index,
                start_time,
            },
            duration,
            format: input_context.format().name().to_string(),
        };

        log::info!(
            "Opened media file: {} (format={}, duration={:.2}s, start={:.3}s, {}x{}, {:.2} fps, codec={}, ~{} frames)",
            file_path.display(),
            metadata.format,
            metadata.duration.as_secs_f64(),
            metadata.video.start_time.as_secs_f64(),
            metadata.video.width,
            metadata.video.height,
            metadata.video.frames_per_second,
            metadata.video.codec,
            metadata.video.frame_count,
        );

        Ok(Self {
            input_context,
            metadata,
            video_stream_index,
            file_path,
        })
    }

    /// Open a file, read its metadata, and close it again.
    pub fn probe<P: AsRef<Path>>(path: P) -> Result<MediaMetadata, FramezipError> {
        Ok(Self::open(path)?.metadata)
    }

    /// Get a reference to the cached metadata.
    pub fn metadata(&self) -> &MediaMetadata {
        &self.metadata
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Obtain a [`VideoHandle`] that decodes frames at source resolution
    /// in RGB8.
    pub fn video(&mut self) -> VideoHandle<'_> {
        VideoHandle {
            file: self,
            output: FrameOutputOptions::default(),
        }
    }

    /// Obtain a [`VideoHandle`] with custom frame output settings.
    pub fn video_with_output(&mut self, output: FrameOutputOptions) -> VideoHandle<'_> {
        VideoHandle { file: self, output }
    }
}
