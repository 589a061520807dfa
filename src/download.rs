//! Video acquisition.
//!
//! Remote videos are fetched by an external downloader (`yt-dlp` by default)
//! into a request-scoped [`Workspace`]. The workspace is a fresh temporary
//! directory that is removed when dropped, so no two requests share a path
//! and nothing is left behind on failure.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use tempfile::TempDir;

use crate::error::FramezipError;

/// Downloader invoked when none is configured.
pub const DEFAULT_DOWNLOADER: &str = "yt-dlp";

/// File name the downloader is asked to write inside the workspace.
const DOWNLOAD_FILE_NAME: &str = "video.mp4";

/// Where a video comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    /// A URL handed to the external downloader.
    Remote(String),
    /// A file that is already on disk.
    Local(PathBuf),
}

impl VideoSource {
    /// Classify user input: anything containing `://` is a URL, everything
    /// else a local path.
    ///
    /// ```
    /// use framezip::VideoSource;
    ///
    /// assert!(matches!(VideoSource::parse("https://example.com/v").unwrap(), VideoSource::Remote(_)));
    /// assert!(matches!(VideoSource::parse("clip.mp4").unwrap(), VideoSource::Local(_)));
    /// ```
    pub fn parse(input: &str) -> Result<Self, FramezipError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(FramezipError::EmptySource);
        }
        if trimmed.contains("://") {
            Ok(VideoSource::Remote(trimmed.to_string()))
        } else {
            Ok(VideoSource::Local(PathBuf::from(trimmed)))
        }
    }

    /// `true` when the source has to be downloaded first.
    pub fn is_remote(&self) -> bool {
        matches!(self, VideoSource::Remote(_))
    }
}

impl Display for VideoSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            VideoSource::Remote(url) => write!(f, "{url}"),
            VideoSource::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A per-request scratch directory, deleted on drop.
#[derive(Debug)]
pub struct Workspace {
    directory: TempDir,
}

impl Workspace {
    /// Create a fresh, uniquely named temporary directory.
    pub fn new() -> Result<Self, FramezipError> {
        let directory = tempfile::Builder::new().prefix("framezip-").tempdir()?;
        log::debug!("Created workspace {}", directory.path().display());
        Ok(Self { directory })
    }

    /// Directory path.
    pub fn path(&self) -> &Path {
        self.directory.path()
    }

    /// Path the downloader is asked to write to.
    pub fn download_path(&self) -> PathBuf {
        self.directory.path().join(DOWNLOAD_FILE_NAME)
    }

    /// Locate the downloaded video.
    ///
    /// yt-dlp may write `video.mp4.webm` or similar when it merges formats,
    /// so a single file starting with `video` is accepted too.
    fn locate_download(&self) -> Result<PathBuf, FramezipError> {
        let expected = self.download_path();
        if expected.is_file() {
            return Ok(expected);
        }

        let stem = Path::new(DOWNLOAD_FILE_NAME)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("video");
        let mut candidates = Vec::new();
        for entry in std::fs::read_dir(self.path())? {
            let path = entry?.path();
            let matches = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(stem) && !name.ends_with(".part"));
            if matches && path.is_file() {
                candidates.push(path);
            }
        }

        match candidates.len() {
            1 => Ok(candidates.remove(0)),
            _ => Err(FramezipError::DownloadMissing(expected)),
        }
    }
}

/// Downloader settings.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub(crate) program: String,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadOptions {
    /// Use [`DEFAULT_DOWNLOADER`].
    pub fn new() -> Self {
        Self {
            program: DEFAULT_DOWNLOADER.to_string(),
        }
    }

    /// Use a different downloader executable. It is called as
    /// `<program> <url> -o <path>`.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Downloader executable in effect.
    pub fn program(&self) -> &str {
        &self.program
    }
}

/// Runs the external downloader.
#[derive(Debug, Clone, Default)]
pub struct Downloader {
    options: DownloadOptions,
}

impl Downloader {
    /// Create a downloader with the given options.
    pub fn new(options: DownloadOptions) -> Self {
        Self { options }
    }

    /// Fetch `url` into `workspace` and return the path of the video.
    ///
    /// # Errors
    ///
    /// - [`FramezipError::DownloaderSpawn`] if the program cannot be run.
    /// - [`FramezipError::DownloadFailed`] if it exits unsuccessfully.
    /// - [`FramezipError::DownloadMissing`] if it exits successfully but no
    ///   video appears in the workspace.
    pub fn fetch(&self, url: &str, workspace: &Workspace) -> Result<PathBuf, FramezipError> {
        let program = &self.options.program;
        let destination = workspace.download_path();

        log::info!("Downloading {url}");
        log::debug!("Running: {program} {url} -o {}", destination.display());

        let output = Command::new(program)
            .arg(url)
            .arg("-o")
            .arg(&destination)
            .stdin(Stdio::null())
            .output()
            .map_err(|error| FramezipError::DownloaderSpawn {
                program: program.clone(),
                reason: error.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            log::warn!("Downloader exited with {}: {stderr}", output.status);
            return Err(FramezipError::DownloadFailed {
                url: url.to_string(),
                status: output.status,
                stderr,
            });
        }

        let path = workspace.locate_download()?;
        log::info!("Downloaded {url} to {}", path.display());
        Ok(path)
    }

    /// Resolve a source to a local video path, downloading when remote.
    pub fn acquire(
        &self,
        source: &VideoSource,
        workspace: &Workspace,
    ) -> Result<PathBuf, FramezipError> {
        match source {
            VideoSource::Remote(url) => self.fetch(url, workspace),
            VideoSource::Local(path) => Ok(path.clone()),
        }
    }
}
