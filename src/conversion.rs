//! Pixel-buffer and timestamp helpers shared by the decoder and sampler.

use std::time::Duration;

use ffmpeg_next::{Rational, ffi::AV_NOPTS_VALUE, frame::Video as VideoFrame};

/// Copy pixel data from an FFmpeg video frame into a tightly-packed buffer.
///
/// FFmpeg frames frequently carry per-row padding (stride > width × bpp);
/// the padding is stripped so the result can go straight into
/// [`image::ImageBuffer::from_raw`].
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let expected_stride = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == expected_stride {
        data[..expected_stride * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(expected_stride * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + expected_stride]);
        }
        buffer
    }
}

/// Rescale a PTS value from stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Rescale a PTS value to a frame number.
pub(crate) fn pts_to_frame_number(pts: i64, time_base: Rational, frames_per_second: f64) -> u64 {
    let seconds = pts_to_seconds(pts, time_base);
    (seconds * frames_per_second).round().max(0.0) as u64
}

/// Stream start time in stream time base, or 0 when the container has none.
pub(crate) fn normalize_start_pts(start_pts: i64) -> i64 {
    if start_pts == AV_NOPTS_VALUE {
        0
    } else {
        start_pts
    }
}

/// Convert a frame number to a seek timestamp in AV_TIME_BASE (microseconds).
///
/// `input_context.seek()` (via `avformat_seek_file` with `stream_index = -1`)
/// expects absolute timestamps in AV_TIME_BASE, so the stream's start offset
/// is added back. Never negative.
pub(crate) fn frame_number_to_seek_timestamp(
    frame_number: u64,
    frames_per_second: f64,
    start_offset_seconds: f64,
) -> i64 {
    let seconds = frame_number as f64 / frames_per_second + start_offset_seconds;
    (seconds * 1_000_000.0).max(0.0) as i64
}

/// Playback time of a frame, `frame_number / frames_per_second`.
pub fn frame_number_to_timestamp(frame_number: u64, frames_per_second: f64) -> Duration {
    Duration::from_secs_f64(frame_number as f64 / frames_per_second)
}

/// Number of frames between two samples: `round(fps × interval)`.
pub fn interval_to_frame_step(interval: Duration, frames_per_second: f64) -> u64 {
    (frames_per_second * interval.as_secs_f64()).round() as u64
}
