//! In-memory ZIP archive of sampled frames.
//!
//! Every sample becomes a standalone lossless image entry named
//! `frame_<seconds>s.<ext>`, where the timestamp is rendered with exactly
//! two decimal places. The archive is fully buffered before it is returned.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use framezip::{ArchiveOptions, FramezipError, MediaFile, SampleOptions, build_archive, sample_frames};
//!
//! let mut file = MediaFile::open("input.mp4")?;
//! let samples = sample_frames(&mut file.video(), Duration::from_secs(8), &SampleOptions::new())?;
//! let archive = build_archive(&samples, &ArchiveOptions::new())?;
//! archive.write_to_path(archive.file_name())?;
//! # Ok::<(), FramezipError>(())
//! ```

use std::{
    collections::HashMap,
    fmt::{Debug, Formatter, Result as FmtResult},
    io::{Cursor, Write},
    path::Path,
    sync::Arc,
    time::Duration,
};

use image::ImageFormat;
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::{
    error::FramezipError,
    progress::{CancellationToken, NoOpProgress, OperationType, ProgressCallback, ProgressTracker},
    sampler::FrameSample,
};

/// Logical file name offered for download.
pub const ARCHIVE_FILE_NAME: &str = "video_frames.zip";
/// MIME type of the archive.
pub const ARCHIVE_MIME_TYPE: &str = "application/zip";

/// Lossless image format used for archive entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchiveImageFormat {
    /// PNG. This is the default.
    #[default]
    Png,
    /// Uncompressed BMP.
    Bmp,
    /// TIFF.
    Tiff,
}

impl ArchiveImageFormat {
    /// File extension used in entry names.
    pub fn extension(self) -> &'static str {
        match self {
            ArchiveImageFormat::Png => "png",
            ArchiveImageFormat::Bmp => "bmp",
            ArchiveImageFormat::Tiff => "tiff",
        }
    }

    /// Parse a user-supplied extension such as `"png"` or `".tif"`.
    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "png" => Some(ArchiveImageFormat::Png),
            "bmp" => Some(ArchiveImageFormat::Bmp),
            "tif" | "tiff" => Some(ArchiveImageFormat::Tiff),
            _ => None,
        }
    }

    fn to_image_format(self) -> ImageFormat {
        match self {
            ArchiveImageFormat::Png => ImageFormat::Png,
            ArchiveImageFormat::Bmp => ImageFormat::Bmp,
            ArchiveImageFormat::Tiff => ImageFormat::Tiff,
        }
    }
}

/// How entries are stored inside the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchiveCompression {
    /// Deflate. This is the default.
    #[default]
    Deflated,
    /// No compression.
    Stored,
}

impl ArchiveCompression {
    fn to_zip_method(self) -> CompressionMethod {
        match self {
            ArchiveCompression::Deflated => CompressionMethod::Deflated,
            ArchiveCompression::Stored => CompressionMethod::Stored,
        }
    }
}

/// Options for [`build_archive`].
#[derive(Clone)]
pub struct ArchiveOptions {
    pub(crate) image_format: ArchiveImageFormat,
    pub(crate) compression: ArchiveCompression,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) batch_size: u64,
}

impl Debug for ArchiveOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ArchiveOptions")
            .field("image_format", &self.image_format)
            .field("compression", &self.compression)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveOptions {
    /// PNG entries, deflate compression, no progress reporting.
    pub fn new() -> Self {
        Self {
            image_format: ArchiveImageFormat::Png,
            compression: ArchiveCompression::Deflated,
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
        }
    }

    /// Set the entry image format.
    #[must_use]
    pub fn with_image_format(mut self, format: ArchiveImageFormat) -> Self {
        self.image_format = format;
        self
    }

    /// Set the entry compression.
    #[must_use]
    pub fn with_compression(mut self, compression: ArchiveCompression) -> Self {
        self.compression = compression;
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
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

    /// Entry image format in effect.
    pub fn image_format(&self) -> ArchiveImageFormat {
        self.image_format
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}

/// A finished archive held in memory.
#[derive(Clone)]
pub struct FrameArchive {
    bytes: Vec<u8>,
    entries: Vec<String>,
}

impl Debug for FrameArchive {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FrameArchive")
            .field("size", &self.bytes.len())
            .field("entries", &self.entries)
            .finish()
    }
}

impl FrameArchive {
    /// The raw ZIP bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the archive and return the raw ZIP bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Entry names in archive order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if the archive holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Logical file name offered for download.
    pub fn file_name(&self) -> &'static str {
        ARCHIVE_FILE_NAME
    }

    /// MIME type of the archive.
    pub fn mime_type(&self) -> &'static str {
        ARCHIVE_MIME_TYPE
    }

    /// Write the archive bytes to `path`, replacing any existing file.
    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), FramezipError> {
        std::fs::write(path.as_ref(), &self.bytes)?;
        log::info!(
            "Wrote {} ({} entries, {} bytes)",
            path.as_ref().display(),
            self.entries.len(),
            self.bytes.len()
        );
        Ok(())
    }
}

/// Entry name for a sample taken at `timestamp`.
///
/// ```
/// use std::time::Duration;
///
/// use framezip::{ArchiveImageFormat, entry_name};
///
/// assert_eq!(entry_name(Duration::from_secs(8), ArchiveImageFormat::Png), "frame_8.00s.png");
/// ```
pub fn entry_name(timestamp: Duration, format: ArchiveImageFormat) -> String {
    format!(
        "frame_{:.2}s.{}",
        timestamp.as_secs_f64(),
        format.extension()
    )
}

/// Encode every sample and write them into one in-memory ZIP archive.
///
/// Two samples whose timestamps format to the same name collide; the later
/// sample replaces the earlier entry in place and a warning is logged.
///
/// # Errors
///
/// - [`FramezipError::ImageError`] if a sample cannot be encoded.
/// - [`FramezipError::ArchiveError`] if the ZIP cannot be written.
/// - [`FramezipError::Cancelled`] if the options' token is cancelled.
pub fn build_archive(
    samples: &[FrameSample],
    options: &ArchiveOptions,
) -> Result<FrameArchive, FramezipError> {
    let image_format = options.image_format;
    let mut tracker = ProgressTracker::new(
        options.progress.clone(),
        OperationType::Archiving,
        Some(samples.len() as u64),
        options.batch_size,
    );

    let mut encoded_entries: Vec<(String, Duration, Vec<u8>)> = Vec::with_capacity(samples.len());
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(samples.len());

    for sample in samples {
        if options.is_cancelled() {
            return Err(FramezipError::Cancelled);
        }

        let name = entry_name(sample.timestamp, image_format);
        let mut encoded = Vec::new();
        sample
            .image
            .write_to(&mut Cursor::new(&mut encoded), image_format.to_image_format())?;

        match positions.get(&name) {
            Some(&index) => {
                log::warn!(
                    "Entry {name} collides: sample at {:.4}s replaces sample at {:.4}s",
                    sample.timestamp.as_secs_f64(),
                    encoded_entries[index].1.as_secs_f64(),
                );
                encoded_entries[index] = (name, sample.timestamp, encoded);
            }
            None => {
                positions.insert(name.clone(), encoded_entries.len());
                encoded_entries.push((name, sample.timestamp, encoded));
            }
        }

        tracker.advance(Some(sample.frame_number), Some(sample.timestamp));
    }

    let file_options = SimpleFileOptions::default()
        .compression_method(options.compression.to_zip_method())
        .unix_permissions(0o644);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let mut entries = Vec::with_capacity(encoded_entries.len());

    for (name, _, data) in encoded_entries {
        writer.start_file(name.as_str(), file_options)?;
        writer.write_all(&data)?;
        entries.push(name);
    }

    let bytes = writer.finish()?.into_inner();
    tracker.finish();

    log::info!(
        "Built archive with {} entries ({} bytes)",
        entries.len(),
        bytes.len()
    );

    Ok(FrameArchive { bytes, entries })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_names_use_two_decimals() {
        let png = ArchiveImageFormat::Png;
        assert_eq!(entry_name(Duration::ZERO, png), "frame_0.00s.png");
        assert_eq!(entry_name(Duration::from_secs_f64(1.0 / 3.0), png), "frame_0.33s.png");
        assert_eq!(
            entry_name(Duration::from_secs(16), ArchiveImageFormat::Tiff),
            "frame_16.00s.tiff"
        );
    }

    #[test]
    fn near_duplicate_timestamps_collide() {
        let png = ArchiveImageFormat::Png;
        assert_eq!(
            entry_name(Duration::from_secs_f64(8.0), png),
            entry_name(Duration::from_secs_f64(8.004), png),
        );
    }

    #[test]
    fn format_names() {
        assert_eq!(ArchiveImageFormat::from_name(".PNG"), Some(ArchiveImageFormat::Png));
        assert_eq!(ArchiveImageFormat::from_name("tif"), Some(ArchiveImageFormat::Tiff));
        assert_eq!(ArchiveImageFormat::from_name("jpg"), None);
    }

    #[test]
    fn empty_archive_is_valid_zip() {
        let archive = build_archive(&[], &ArchiveOptions::new()).unwrap();
        assert!(archive.is_empty());
        let reader = zip::ZipArchive::new(Cursor::new(archive.into_bytes())).unwrap();
        assert_eq!(reader.len(), 0);
    }
}
