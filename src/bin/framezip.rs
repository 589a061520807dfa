use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use dialoguer::{Input, theme::ColorfulTheme};
use framezip::{
    ARCHIVE_FILE_NAME, ArchiveImageFormat, CancellationToken, Capture, CaptureOptions,
    DEFAULT_DOWNLOADER, DEFAULT_INTERVAL_SECS, FfmpegLogLevel, MAX_INTERVAL_SECS,
    MIN_INTERVAL_SECS, MediaFile, OperationType, PixelFormat, ProgressCallback, ProgressInfo,
    VideoSource, entry_name,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  framezip capture https://www.youtube.com/watch?v=dQw4w9WgXcQ --interval 8\n  framezip capture clip.mp4 --out clip_frames.zip --preview-dir previews --progress\n  framezip metadata clip.mp4 --json\n  framezip completions zsh > _framezip";

#[derive(Debug, Parser)]
#[command(
    name = "framezip",
    version,
    about = "Capture video frames every N seconds as a ZIP of images",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar with sample counts instead of a spinner.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Pixel format of captured frames (rgb8, rgba8, gray8).
    #[arg(long, global = true)]
    pixel_format: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Download a video and capture a frame every N seconds into a ZIP.
    #[command(
        about = "Capture frames into a ZIP archive",
        after_help = "Examples:\n  framezip capture https://youtu.be/dQw4w9WgXcQ\n  framezip capture clip.mp4 --interval 2 --format bmp --out frames.zip"
    )]
    Capture {
        /// Video URL or local path. Prompted for when omitted.
        url: Option<String>,

        /// Seconds of video between captured frames.
        #[arg(
            long,
            short,
            default_value_t = DEFAULT_INTERVAL_SECS,
            value_parser = clap::value_parser!(u64).range(MIN_INTERVAL_SECS..=MAX_INTERVAL_SECS)
        )]
        interval: u64,

        /// Output archive path.
        #[arg(long, short, default_value = ARCHIVE_FILE_NAME)]
        out: PathBuf,

        /// Image format of archive entries (png, bmp, tiff).
        #[arg(long, default_value = "png")]
        format: String,

        /// Also save the preview frames into this directory.
        #[arg(long)]
        preview_dir: Option<PathBuf>,

        /// Downloader executable, called as `<downloader> <url> -o <path>`.
        #[arg(long, default_value = DEFAULT_DOWNLOADER)]
        downloader: String,

        /// Give up sampling after this many seconds.
        #[arg(long)]
        timeout: Option<u64>,

        /// Stop after this many frames.
        #[arg(long)]
        max_samples: Option<usize>,

        /// Scale frames to this width, keeping the aspect ratio.
        #[arg(long)]
        width: Option<u32>,
    },

    /// Print metadata for a video file.
    #[command(about = "Print video metadata", visible_alias = "probe")]
    Metadata {
        /// Input video path.
        input: String,

        /// Output metadata as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn init_logging(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    let default_filter = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let level = match &global.log_level {
        Some(level) => level.parse::<FfmpegLogLevel>()?,
        None if global.verbose => FfmpegLogLevel::Warning,
        None => FfmpegLogLevel::Error,
    };
    framezip::set_ffmpeg_log_level(level);
    Ok(())
}

fn prompt_for_url() -> Result<String, Box<dyn std::error::Error>> {
    let url: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Enter video URL")
        .interact_text()?;
    Ok(url)
}

struct TerminalProgress {
    bar: ProgressBar,
    detailed: bool,
}

impl TerminalProgress {
    fn new(detailed: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let template = if detailed {
            "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}"
        } else {
            "{spinner:.green} {msg}"
        };
        let bar = ProgressBar::new_spinner();
        bar.set_style(ProgressStyle::with_template(template)?.progress_chars("##-"));
        bar.set_message("Downloading and processing video...");
        bar.enable_steady_tick(Duration::from_millis(100));
        Ok(Self { bar, detailed })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let label = match info.operation {
            OperationType::Download => "downloaded",
            OperationType::FrameSampling => "sampling frames",
            OperationType::Archiving => "archiving",
            _ => "working",
        };

        if self.detailed {
            if let Some(total) = info.total {
                self.bar.set_length(total);
            }
            self.bar.set_position(info.current);
        }

        match info.current_timestamp {
            Some(timestamp) => self
                .bar
                .set_message(format!("{label} ({:.2}s)", timestamp.as_secs_f64())),
            None => self.bar.set_message(label),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_capture(
    global: &GlobalOptions,
    url: Option<String>,
    interval: u64,
    out: PathBuf,
    format: &str,
    preview_dir: Option<PathBuf>,
    downloader: String,
    timeout: Option<u64>,
    max_samples: Option<usize>,
    width: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let image_format = ArchiveImageFormat::from_name(format)
        .ok_or(format!("unsupported --format: {format} (png, bmp, tiff)"))?;
    ensure_writable_path(&out, global.overwrite)?;

    let url = match url {
        Some(url) => url,
        None => prompt_for_url()?,
    };
    let source = VideoSource::parse(&url)?;

    let token = CancellationToken::new();
    {
        let token = token.clone();
        ctrlc::set_handler(move || token.cancel())?;
    }

    let progress = Arc::new(TerminalProgress::new(global.progress)?);
    let mut options = CaptureOptions::new()
        .with_progress(progress.clone())
        .with_cancellation(token)
        .with_image_format(image_format)
        .with_downloader(downloader)
        .with_resolution(width, None);

    if let Some(name) = &global.pixel_format {
        let pixel_format =
            PixelFormat::from_name(name).ok_or(format!("unsupported --pixel-format: {name}"))?;
        options = options.with_pixel_format(pixel_format);
    }
    if let Some(seconds) = timeout {
        options = options.with_time_limit(Duration::from_secs(seconds));
    }
    if let Some(count) = max_samples {
        options = options.with_max_samples(count);
    }

    let result = Capture::from_source(source)
        .with_interval_secs(interval)
        .with_options(options)
        .run();
    progress.bar.finish_and_clear();
    let output = result?;

    println!(
        "{} {}",
        "success:".green().bold(),
        format!("Captured {} frames", output.sample_count).green()
    );

    if let Some(dir) = &preview_dir {
        fs::create_dir_all(dir)?;
    }
    for preview in &output.previews {
        println!(
            "  Preview frame at {:.2}s ({}x{})",
            preview.seconds(),
            preview.image.width(),
            preview.image.height()
        );
        if let Some(dir) = &preview_dir {
            let path = dir.join(entry_name(preview.timestamp, image_format));
            preview.image.save(&path)?;
            if global.verbose {
                eprintln!("saved preview -> {}", path.display());
            }
        }
    }

    output.archive.write_to_path(&out)?;
    println!(
        "{} {} ({} entries, {})",
        "saved".green().bold(),
        out.display(),
        output.archive.len(),
        output.archive.mime_type()
    );

    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global)?;

    match cli.command {
        Commands::Capture {
            url,
            interval,
            out,
            format,
            preview_dir,
            downloader,
            timeout,
            max_samples,
            width,
        } => run_capture(
            &cli.global,
            url,
            interval,
            out,
            &format,
            preview_dir,
            downloader,
            timeout,
            max_samples,
            width,
        )?,
        Commands::Metadata { input, json } => {
            let file = MediaFile::open(&input)?;
            let metadata = file.metadata();
            let video = &metadata.video;
            if json {
                let payload = json!({
                    "format": metadata.format,
                    "duration_seconds": metadata.duration.as_secs_f64(),
                    "start_time_seconds": video.start_time.as_secs_f64(),
                    "width": video.width,
                    "height": video.height,
                    "fps": video.frames_per_second,
                    "frame_count": video.frame_count,
                    "codec": video.codec,
                    "expected_samples": metadata.expected_samples(Duration::from_secs(DEFAULT_INTERVAL_SECS)),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Format: {}", metadata.format);
                println!("Duration: {:.2}s", metadata.duration.as_secs_f64());
                println!(
                    "Video: {}x{} @ {:.2} fps [{}], ~{} frames",
                    video.width, video.height, video.frames_per_second, video.codec, video.frame_count,
                );
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "framezip", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Commands};

    #[test]
    fn interval_defaults_to_eight() {
        let cli = Cli::try_parse_from(["framezip", "capture", "https://youtu.be/x"]).unwrap();
        match cli.command {
            Commands::Capture { interval, out, .. } => {
                assert_eq!(interval, 8);
                assert_eq!(out.to_str(), Some("video_frames.zip"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn interval_is_bounded() {
        assert!(Cli::try_parse_from(["framezip", "capture", "u", "--interval", "0"]).is_err());
        assert!(Cli::try_parse_from(["framezip", "capture", "u", "--interval", "61"]).is_err());
        assert!(Cli::try_parse_from(["framezip", "capture", "u", "--interval", "60"]).is_ok());
        assert!(Cli::try_parse_from(["framezip", "capture", "u", "-i", "1"]).is_ok());
    }

    #[test]
    fn url_is_optional() {
        let cli = Cli::try_parse_from(["framezip", "--progress", "capture"]).unwrap();
        assert!(cli.global.progress);
        assert!(matches!(cli.command, Commands::Capture { url: None, .. }));
    }
}
