//! Downloader integration tests.
//!
//! Real downloads need network access, so these tests substitute small
//! programs for `yt-dlp` to exercise each outcome of the subprocess.

use framezip::{
    Capture, CaptureOptions, DownloadOptions, Downloader, FramezipError, VideoSource, Workspace,
};

const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

#[test]
fn missing_program_is_a_spawn_error() {
    let workspace = Workspace::new().expect("Failed to create workspace");
    let downloader =
        Downloader::new(DownloadOptions::new().with_program("framezip-no-such-downloader"));

    match downloader.fetch(URL, &workspace) {
        Err(FramezipError::DownloaderSpawn { program, .. }) => {
            assert_eq!(program, "framezip-no-such-downloader");
        }
        other => panic!("expected a spawn error, got {other:?}"),
    }
}

#[test]
fn local_sources_skip_the_downloader() {
    let workspace = Workspace::new().expect("Failed to create workspace");
    let downloader =
        Downloader::new(DownloadOptions::new().with_program("framezip-no-such-downloader"));
    let source = VideoSource::parse("clips/local.mp4").expect("Failed to parse source");

    let path = downloader
        .acquire(&source, &workspace)
        .expect("Local source should not run the downloader");
    assert_eq!(path, std::path::PathBuf::from("clips/local.mp4"));
}

#[test]
fn capture_with_failing_downloader_produces_no_archive() {
    let options = CaptureOptions::new().with_downloader("framezip-no-such-downloader");
    let result = Capture::new(URL)
        .expect("Failed to parse source")
        .with_options(options)
        .run();

    assert!(matches!(result, Err(FramezipError::DownloaderSpawn { .. })));
}

#[cfg(unix)]
mod unix {
    use std::{fs, os::unix::fs::PermissionsExt, path::PathBuf};

    use tempfile::TempDir;

    use super::*;

    /// Write an executable shell script and return its path.
    fn script(directory: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = directory.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("Failed to write script");
        let mut permissions = fs::metadata(&path)
            .expect("Failed to stat script")
            .permissions();
        permissions.set_mode(0o755);
        fs::set_permissions(&path, permissions).expect("Failed to chmod script");
        path
    }

    fn downloader_for(path: &std::path::Path) -> Downloader {
        Downloader::new(DownloadOptions::new().with_program(path.to_string_lossy()))
    }

    #[test]
    fn nonzero_exit_is_reported_with_stderr() {
        let scripts = tempfile::tempdir().expect("Failed to create temp dir");
        let program = script(
            &scripts,
            "fail.sh",
            "echo 'ERROR: Video unavailable' >&2\nexit 1",
        );
        let workspace = Workspace::new().expect("Failed to create workspace");

        match downloader_for(&program).fetch(URL, &workspace) {
            Err(FramezipError::DownloadFailed {
                url,
                status,
                stderr,
            }) => {
                assert_eq!(url, URL);
                assert_eq!(status.code(), Some(1));
                assert_eq!(stderr, "ERROR: Video unavailable");
            }
            other => panic!("expected a download failure, got {other:?}"),
        }
    }

    #[test]
    fn success_without_output_is_reported() {
        let scripts = tempfile::tempdir().expect("Failed to create temp dir");
        let program = script(&scripts, "noop.sh", "exit 0");
        let workspace = Workspace::new().expect("Failed to create workspace");

        assert!(matches!(
            downloader_for(&program).fetch(URL, &workspace),
            Err(FramezipError::DownloadMissing(_))
        ));
    }

    #[test]
    fn downloaded_file_is_returned() {
        let scripts = tempfile::tempdir().expect("Failed to create temp dir");
        // Invoked as `<program> <url> -o <path>`.
        let program = script(&scripts, "fake.sh", "printf video > \"$3\"");
        let workspace = Workspace::new().expect("Failed to create workspace");

        let path = downloader_for(&program)
            .fetch(URL, &workspace)
            .expect("Download should succeed");
        assert_eq!(path, workspace.download_path());
        assert_eq!(fs::read(&path).expect("Failed to read download"), b"video");
    }

    #[test]
    fn capture_of_non_video_download_fails_to_open() {
        let scripts = tempfile::tempdir().expect("Failed to create temp dir");
        let program = script(&scripts, "junk.sh", "printf junk > \"$3\"");
        let options = CaptureOptions::new().with_downloader(program.to_string_lossy());

        let result = Capture::new(URL)
            .expect("Failed to parse source")
            .with_options(options)
            .run();
        assert!(matches!(result, Err(FramezipError::FileOpen { .. })));
    }

    /// Run a capture whose downloader writes its workspace directory to a
    /// file before running `body`. Returns the result and that directory.
    fn capture_recording_workspace(
        body: &str,
    ) -> (Result<framezip::CaptureOutput, FramezipError>, PathBuf) {
        let scripts = tempfile::tempdir().expect("Failed to create temp dir");
        let record = scripts.path().join("workspace");
        let program = script(
            &scripts,
            "record.sh",
            &format!("dirname \"$3\" > '{}'\n{body}", record.display()),
        );
        let options = CaptureOptions::new().with_downloader(program.to_string_lossy());

        let result = Capture::new(URL)
            .expect("Failed to parse source")
            .with_options(options)
            .run();
        let recorded = fs::read_to_string(&record).expect("Downloader did not record workspace");
        (result, PathBuf::from(recorded.trim()))
    }

    #[test]
    fn workspace_is_removed_when_open_fails() {
        let (result, workspace) = capture_recording_workspace("printf junk > \"$3\"");

        assert!(matches!(result, Err(FramezipError::FileOpen { .. })));
        assert!(
            workspace
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("framezip-"))
        );
        assert!(!workspace.exists(), "{} was left behind", workspace.display());
    }

    #[test]
    fn workspace_is_removed_when_download_fails() {
        let (result, workspace) =
            capture_recording_workspace("printf partial > \"$3.part\"\nexit 1");

        assert!(matches!(result, Err(FramezipError::DownloadFailed { .. })));
        assert!(!workspace.exists(), "{} was left behind", workspace.display());
    }
}
