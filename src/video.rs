//! Single-frame decoding.
//!
//! [`VideoHandle`] seeks to a frame number and decodes the still there. It is
//! the FFmpeg-backed [`FrameSource`] that the sampler drives.

use ffmpeg_next::{
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

use crate::{
    configuration::{FrameOutputOptions, PixelFormat},
    conversion::{
        frame_number_to_seek_timestamp, frame_to_buffer, normalize_start_pts, pts_to_frame_number,
        pts_to_seconds,
    },
    error::FramezipError,
    media::MediaFile,
    sampler::FrameSource,
};

/// Frame decoding operations on an opened [`MediaFile`].
///
/// Obtained via [`MediaFile::video`]. Each call to [`frame`](VideoHandle::frame)
/// creates a fresh decoder, seeks to the nearest keyframe before the target,
/// and decodes forward. The decoder is dropped when the call returns.
pub struct VideoHandle<'a> {
    pub(crate) file: &'a mut MediaFile,
    pub(crate) output: FrameOutputOptions,
}

impl<'a> VideoHandle<'a> {
    /// Decode the frame at `frame_number` (0-indexed).
    ///
    /// Returns the first decoded frame at or after the target. Returns
    /// `Ok(None)` when the target lies past the end of the stream.
    ///
    /// # Errors
    ///
    /// - [`FramezipError::InvalidFrameRate`] if the stream reports no usable
    ///   frame rate.
    /// - [`FramezipError::FfmpegError`] or [`FramezipError::VideoDecodeError`]
    ///   if decoding fails.
    pub fn frame(&mut self, frame_number: u64) -> Result<Option<DynamicImage>, FramezipError> {
        let video_metadata = &self.file.metadata.video;
        let frames_per_second = video_metadata.frames_per_second;
        let total_frames = video_metadata.frame_count;

        if !frames_per_second.is_finite() || frames_per_second <= 0.0 {
            return Err(FramezipError::InvalidFrameRate(frames_per_second));
        }

        if total_frames > 0 && frame_number >= total_frames {
            log::debug!("Frame {frame_number} is past the last frame ({total_frames})");
            return Ok(None);
        }

        let video_stream_index = self.file.video_stream_index;
        let stream = self
            .file
            .input_context
            .stream(video_stream_index)
            .ok_or(FramezipError::NoVideoStream)?;
        let time_base = stream.time_base();
        // Frame numbers count from the stream's first timestamp, which is
        // not zero for MPEG-TS and some Matroska files.
        let start_pts = normalize_start_pts(stream.start_time());
        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let mut decoder = decoder_context.decoder().video()?;

        let pixel_format = self.output.pixel_format;
        let (target_width, target_height) = self
            .output
            .resolve_dimensions(decoder.width(), decoder.height());

        let mut scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            pixel_format.to_ffmpeg_pixel(),
            target_width,
            target_height,
            ScalingFlags::BILINEAR,
        )?;

        let seek_timestamp = frame_number_to_seek_timestamp(
            frame_number,
            frames_per_second,
            pts_to_seconds(start_pts, time_base),
        );
        if let Err(error) = self
            .file
            .input_context
            .seek(seek_timestamp, ..seek_timestamp)
        {
            // Seeking past the end fails in some demuxers.
            if frame_number == 0 {
                return Err(error.into());
            }
            log::debug!("Seek to frame {frame_number} failed ({error}); treating as end of stream");
            return Ok(None);
        }

        let mut decoded_frame = VideoFrame::empty();
        let mut converted_frame = VideoFrame::empty();

        let mut receive = |decoder: &mut VideoDecoder| -> Result<Option<DynamicImage>, FramezipError> {
            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                let pts = decoded_frame.timestamp().or(decoded_frame.pts()).unwrap_or(0);
                let current_frame_number = pts_to_frame_number(
                    pts.saturating_sub(start_pts),
                    time_base,
                    frames_per_second,
                );

                if current_frame_number >= frame_number {
                    scaler.run(&decoded_frame, &mut converted_frame)?;
                    let image = convert_frame_to_image(
                        &converted_frame,
                        target_width,
                        target_height,
                        pixel_format,
                    )?;
                    return Ok(Some(image));
                }
            }
            Ok(None)
        };

        for (stream, packet) in self.file.input_context.packets() {
            if stream.index() != video_stream_index {
                continue;
            }

            decoder.send_packet(&packet)?;
            if let Some(image) = receive(&mut decoder)? {
                return Ok(Some(image));
            }
        }

        decoder.send_eof()?;
        let image = receive(&mut decoder)?;
        if image.is_none() {
            log::debug!("Stream ended before frame {frame_number}");
        }
        Ok(image)
    }

    /// Decode the frame at `frame_number` and save it to `path`.
    ///
    /// The image format is inferred from the file extension. Returns
    /// `false` when the frame lies past the end of the stream.
    pub fn save_frame<P: AsRef<std::path::Path>>(
        &mut self,
        frame_number: u64,
        path: P,
    ) -> Result<bool, FramezipError> {
        match self.frame(frame_number)? {
            Some(image) => {
                image.save(path)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl FrameSource for VideoHandle<'_> {
    fn frames_per_second(&self) -> f64 {
        self.file.metadata.video.frames_per_second
    }

    fn frame_count(&self) -> Option<u64> {
        Some(self.file.metadata.video.frame_count).filter(|&count| count > 0)
    }

    fn read_frame(&mut self, frame_number: u64) -> Result<Option<DynamicImage>, FramezipError> {
        self.frame(frame_number)
    }
}

/// Convert a scaled video frame to an [`image::DynamicImage`].
fn convert_frame_to_image(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
) -> Result<DynamicImage, FramezipError> {
    let buffer = frame_to_buffer(video_frame, width, height, pixel_format.bytes_per_pixel());
    let image = match pixel_format {
        PixelFormat::Rgb8 => RgbImage::from_raw(width, height, buffer).map(DynamicImage::ImageRgb8),
        PixelFormat::Rgba8 => {
            RgbaImage::from_raw(width, height, buffer).map(DynamicImage::ImageRgba8)
        }
        PixelFormat::Gray8 => {
            GrayImage::from_raw(width, height, buffer).map(DynamicImage::ImageLuma8)
        }
    };
    image.ok_or_else(|| {
        FramezipError::VideoDecodeError(
            "Failed to construct image from decoded frame data".to_string(),
        )
    })
}
