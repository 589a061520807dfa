//! # framezip
//!
//! Download a video, sample one still frame every N seconds of playback,
//! and bundle the stills as lossless images in a single in-memory ZIP
//! archive.
//!
//! Remote videos are fetched with an external downloader (`yt-dlp` by
//! default), decoded with FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate, encoded with
//! [`image`](https://crates.io/crates/image), and archived with
//! [`zip`](https://crates.io/crates/zip).
//!
//! ## Quick Start
//!
//! ```no_run
//! use framezip::{Capture, FramezipError};
//!
//! let output = Capture::new("https://www.youtube.com/watch?v=dQw4w9WgXcQ")?
//!     .with_interval_secs(8)
//!     .run()?;
//!
//! for preview in &output.previews {
//!     println!("Preview frame at {:.2}s", preview.seconds());
//! }
//! output.archive.write_to_path("video_frames.zip")?;
//! # Ok::<(), FramezipError>(())
//! ```
//!
//! ## Stages
//!
//! - **Acquire** ([`Downloader`]): run the downloader into a per-request
//!   [`Workspace`] that is deleted on drop. Exit status and stderr are
//!   checked.
//! - **Sample** ([`sample_frames`]): seek to frame 0, then every
//!   `round(fps × interval)` frames, until the stream ends. Cancellable,
//!   with progress callbacks and an optional time limit.
//! - **Archive** ([`build_archive`]): one `frame_<t>s.png` entry per sample.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed, and `yt-dlp` must be on
//! `PATH` for remote sources.

pub mod archive;
pub mod capture;
pub mod configuration;
mod conversion;
pub mod download;
pub mod error;
pub mod ffmpeg;
pub mod media;
pub mod metadata;
pub mod progress;
pub mod sampler;
pub mod video;

pub use archive::{
    ARCHIVE_FILE_NAME, ARCHIVE_MIME_TYPE, ArchiveCompression, ArchiveImageFormat, ArchiveOptions,
    FrameArchive, build_archive, entry_name,
};
pub use capture::{Capture, CaptureOptions, CaptureOutput};
pub use configuration::{
    DEFAULT_INTERVAL_SECS, FrameOutputOptions, MAX_INTERVAL_SECS, MIN_INTERVAL_SECS,
    PREVIEW_COUNT, PixelFormat, SampleOptions,
};
pub use conversion::{frame_number_to_timestamp, interval_to_frame_step};
pub use download::{DEFAULT_DOWNLOADER, DownloadOptions, Downloader, VideoSource, Workspace};
pub use error::FramezipError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use media::MediaFile;
pub use metadata::{MediaMetadata, VideoMetadata};
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
pub use sampler::{FrameSample, FrameSource, sample_frames};
pub use video::VideoHandle;
