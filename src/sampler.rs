//! Fixed-interval frame sampling.
//!
//! The sampler walks a [`FrameSource`] by frame number: it decodes frame 0,
//! then advances by `round(fps × interval)` frames, and stops at the first
//! frame the source cannot produce. Timestamps are computed from the frame
//! number and the reported frame rate, so they are measured in video time,
//! never in wall-clock time.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use framezip::{FramezipError, MediaFile, SampleOptions, sample_frames};
//!
//! let mut file = MediaFile::open("input.mp4")?;
//! let samples = sample_frames(
//!     &mut file.video(),
//!     Duration::from_secs(8),
//!     &SampleOptions::new(),
//! )?;
//! for sample in &samples {
//!     println!("{:.2}s", sample.seconds());
//! }
//! # Ok::<(), FramezipError>(())
//! ```

use std::time::Duration;

use image::DynamicImage;

use crate::{
    configuration::SampleOptions,
    conversion::{frame_number_to_timestamp, interval_to_frame_step},
    error::FramezipError,
    progress::{OperationType, ProgressTracker},
};

/// Something the sampler can pull frames from by number.
///
/// [`VideoHandle`](crate::VideoHandle) implements this over FFmpeg.
pub trait FrameSource {
    /// Frame rate used to turn intervals into frame steps and frame numbers
    /// into timestamps.
    fn frames_per_second(&self) -> f64;

    /// Estimated number of frames, if known. Only used for progress totals.
    fn frame_count(&self) -> Option<u64> {
        None
    }

    /// Decode the frame at `frame_number`.
    ///
    /// `Ok(None)` means the stream has no frame there (end of stream or a
    /// seek past the last frame) and ends sampling. Errors abort sampling.
    fn read_frame(&mut self, frame_number: u64) -> Result<Option<DynamicImage>, FramezipError>;
}

/// One sampled still.
#[derive(Debug, Clone)]
pub struct FrameSample {
    /// Frame number the still was decoded at.
    pub frame_number: u64,
    /// Position in the video, `frame_number / fps`.
    pub timestamp: Duration,
    /// The decoded image.
    pub image: DynamicImage,
}

impl FrameSample {
    /// Timestamp in fractional seconds.
    pub fn seconds(&self) -> f64 {
        self.timestamp.as_secs_f64()
    }
}

/// Sample one frame every `interval` of video time.
///
/// Returns the samples in strictly increasing timestamp order, the first at
/// `0.0`. The result is fully materialized.
///
/// # Errors
///
/// - [`FramezipError::InvalidFrameRate`] if the source reports a frame rate
///   that is not a finite positive number.
/// - [`FramezipError::InvalidInterval`] if `interval` rounds to zero frames.
/// - [`FramezipError::Cancelled`] / [`FramezipError::TimedOut`] when the
///   options ask the loop to stop.
/// - Any error returned by [`FrameSource::read_frame`].
pub fn sample_frames<S: FrameSource + ?Sized>(
    source: &mut S,
    interval: Duration,
    options: &SampleOptions,
) -> Result<Vec<FrameSample>, FramezipError> {
    let frames_per_second = source.frames_per_second();
    if !frames_per_second.is_finite() || frames_per_second <= 0.0 {
        return Err(FramezipError::InvalidFrameRate(frames_per_second));
    }

    let step = interval_to_frame_step(interval, frames_per_second);
    if step == 0 {
        return Err(FramezipError::InvalidInterval {
            interval,
            frames_per_second,
        });
    }

    let mut expected = source.frame_count().map(|count| count.div_ceil(step));
    if let (Some(total), Some(cap)) = (expected, options.max_samples) {
        expected = Some(total.min(cap as u64));
    }

    log::info!(
        "Sampling every {:.2}s ({step} frames at {frames_per_second:.3} fps){}",
        interval.as_secs_f64(),
        expected
            .map(|total| format!(", expecting ~{total} samples"))
            .unwrap_or_default(),
    );

    let mut tracker = ProgressTracker::new(
        options.progress.clone(),
        OperationType::FrameSampling,
        expected,
        options.batch_size,
    );

    let mut samples = Vec::new();
    let mut frame_number = 0_u64;

    loop {
        if options.is_cancelled() {
            log::info!("Sampling cancelled after {} samples", samples.len());
            return Err(FramezipError::Cancelled);
        }
        if let Some(limit) = options.time_limit {
            if tracker.elapsed() > limit {
                log::warn!("Sampling exceeded its time limit of {limit:?}");
                return Err(FramezipError::TimedOut(limit));
            }
        }
        if options
            .max_samples
            .is_some_and(|cap| samples.len() >= cap)
        {
            log::debug!("Reached the sample cap of {}", samples.len());
            break;
        }

        let Some(image) = source.read_frame(frame_number)? else {
            break;
        };

        let timestamp = frame_number_to_timestamp(frame_number, frames_per_second);
        log::debug!(
            "Sampled frame {frame_number} at {:.2}s",
            timestamp.as_secs_f64()
        );
        samples.push(FrameSample {
            frame_number,
            timestamp,
            image,
        });
        tracker.advance(Some(frame_number), Some(timestamp));

        frame_number = match frame_number.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }

    tracker.finish();
    log::info!("Captured {} frame samples", samples.len());

    Ok(samples)
}
