//! Video frame extraction.
//!
//! Videos are decoded with FFmpeg (via `ffmpeg-next`) into a directory of
//! zero-padded PNG files, `frame_000000.png`, `frame_000001.png`, ... so
//! that acquisition can list them exactly like an image sequence. Every
//! frame is written; temporal down-sampling happens later, in
//! [`select_frames`](crate::select_frames).
//!
//! # Example
//!
//! ```no_run
//! use lottieframe::ConversionOptions;
//!
//! let extracted = lottieframe::extract_video_frames(
//!     "clip.mp4",
//!     "scratch/",
//!     &ConversionOptions::new(),
//! )?;
//! println!("{} frames at {} fps", extracted.frame_count, extracted.frame_rate);
//! # Ok::<(), lottieframe::LottieFrameError>(())
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use ffmpeg_next::{
    codec::context::Context as CodecContext,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbImage;

use crate::configuration::ConversionOptions;
use crate::error::LottieFrameError;
use crate::progress::{OperationType, ProgressTracker};
use crate::selection::FrameRate;
use crate::utilities::{frame_to_buffer, rational_to_frame_rate, video_frame_name};

/// Stream properties read when a video is opened.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub frame_rate: FrameRate,
    /// Estimated from duration and frame rate; the decoded count can differ.
    pub estimated_frame_count: u64,
    pub duration: Duration,
    pub codec: String,
}

/// Result of decoding a video to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrames {
    /// Number of frames actually written.
    pub frame_count: usize,
    pub frame_rate: FrameRate,
    pub width: u32,
    pub height: u32,
}

/// Read a video's stream metadata without decoding any frames.
///
/// # Errors
///
/// Returns [`LottieFrameError::AcquisitionFailed`] if the file cannot be
/// opened, has no video stream, or reports no usable frame rate.
pub fn probe_video<P: AsRef<Path>>(path: P) -> Result<VideoMetadata, LottieFrameError> {
    let (_, _, metadata) = open_video(path.as_ref())?;
    Ok(metadata)
}

/// Decode every frame of `video_path` into `target_dir` as PNG files.
///
/// Progress is reported as [`OperationType::FrameAcquisition`] against the
/// estimated frame count, and the cancellation token in `options` is
/// checked before each frame is written.
///
/// # Errors
///
/// - [`LottieFrameError::AcquisitionFailed`] if the video cannot be opened
///   or yields no frames.
/// - [`LottieFrameError::FfmpegError`] for decoder or scaler failures.
/// - [`LottieFrameError::Cancelled`] if the token was cancelled.
pub fn extract_video_frames<P: AsRef<Path>, Q: AsRef<Path>>(
    video_path: P,
    target_dir: Q,
    options: &ConversionOptions,
) -> Result<VideoFrames, LottieFrameError> {
    let video_path = video_path.as_ref();
    let target_dir = target_dir.as_ref();

    let (mut input_context, stream_index, metadata) = open_video(video_path)?;
    fs::create_dir_all(target_dir)?;

    log::debug!(
        "Extracting ~{} frames ({}x{} @ {} fps, {}) from {} into {}",
        metadata.estimated_frame_count,
        metadata.width,
        metadata.height,
        metadata.frame_rate,
        metadata.codec,
        video_path.display(),
        target_dir.display(),
    );

    let stream = input_context
        .stream(stream_index)
        .ok_or_else(|| LottieFrameError::acquisition(video_path, "video stream disappeared"))?;
    let decoder_context = CodecContext::from_parameters(stream.parameters())?;
    let mut decoder = decoder_context.decoder().video()?;

    let scaler = ScalingContext::get(
        decoder.format(),
        decoder.width(),
        decoder.height(),
        Pixel::RGB24,
        decoder.width(),
        decoder.height(),
        ScalingFlags::BILINEAR,
    )?;

    let total = (metadata.estimated_frame_count > 0).then_some(metadata.estimated_frame_count);
    let mut writer = FrameWriter {
        scaler,
        rgb_frame: VideoFrame::empty(),
        target_dir,
        width: decoder.width(),
        height: decoder.height(),
        written: 0,
        tracker: ProgressTracker::new(
            options.progress.clone(),
            OperationType::FrameAcquisition,
            total,
            options.batch_size,
        ),
        options,
    };

    let mut decoded_frame = VideoFrame::empty();
    for (stream, packet) in input_context.packets() {
        if stream.index() != stream_index {
            continue;
        }
        decoder.send_packet(&packet)?;
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            writer.write(&decoded_frame)?;
        }
    }

    decoder.send_eof()?;
    while decoder.receive_frame(&mut decoded_frame).is_ok() {
        writer.write(&decoded_frame)?;
    }
    writer.tracker.finish();

    if writer.written == 0 {
        return Err(LottieFrameError::acquisition(
            video_path,
            "video stream contains no decodable frames",
        ));
    }

    Ok(VideoFrames {
        frame_count: writer.written,
        frame_rate: metadata.frame_rate,
        width: writer.width,
        height: writer.height,
    })
}

/// Converts decoded frames to RGB and saves them with sequential names.
struct FrameWriter<'a> {
    scaler: ScalingContext,
    rgb_frame: VideoFrame,
    target_dir: &'a Path,
    width: u32,
    height: u32,
    written: usize,
    tracker: ProgressTracker,
    options: &'a ConversionOptions,
}

impl FrameWriter<'_> {
    fn write(&mut self, decoded_frame: &VideoFrame) -> Result<(), LottieFrameError> {
        if self.options.is_cancelled() {
            return Err(LottieFrameError::Cancelled);
        }

        self.scaler.run(decoded_frame, &mut self.rgb_frame)?;
        let buffer = frame_to_buffer(&self.rgb_frame, self.width, self.height, 3);
        let image = RgbImage::from_raw(self.width, self.height, buffer).ok_or_else(|| {
            LottieFrameError::FfmpegError(
                "decoded frame does not match the stream dimensions".to_string(),
            )
        })?;
        image.save(self.target_dir.join(video_frame_name(self.written)))?;

        self.tracker.advance(Some(self.written));
        self.written += 1;
        Ok(())
    }
}

/// Open the file, pick the best video stream, and read its metadata.
fn open_video(path: &Path) -> Result<(Input, usize, VideoMetadata), LottieFrameError> {
    log::debug!("Opening video: {}", path.display());

    ffmpeg_next::init().map_err(|error| {
        LottieFrameError::acquisition(path, format!("FFmpeg initialisation failed: {error}"))
    })?;

    let input_context = ffmpeg_next::format::input(&path)
        .map_err(|error| LottieFrameError::acquisition(path, error.to_string()))?;

    let stream = input_context
        .streams()
        .best(Type::Video)
        .ok_or_else(|| LottieFrameError::acquisition(path, "no video stream found"))?;
    let stream_index = stream.index();

    let decoder = CodecContext::from_parameters(stream.parameters())
        .and_then(|context| context.decoder().video())
        .map_err(|error| {
            LottieFrameError::acquisition(path, format!("cannot create video decoder: {error}"))
        })?;

    let frame_rate = rational_to_frame_rate(stream.avg_frame_rate())
        .or_else(|| rational_to_frame_rate(stream.rate()))
        .ok_or_else(|| LottieFrameError::acquisition(path, "stream reports no frame rate"))?;

    let duration_microseconds = input_context.duration();
    let duration = if duration_microseconds > 0 {
        Duration::from_micros(duration_microseconds as u64)
    } else {
        Duration::ZERO
    };

    let codec = decoder
        .codec()
        .map(|codec| codec.name().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let metadata = VideoMetadata {
        width: decoder.width(),
        height: decoder.height(),
        frame_rate,
        estimated_frame_count: (duration.as_secs_f64() * frame_rate.as_f64()) as u64,
        duration,
        codec,
    };

    Ok((input_context, stream_index, metadata))
}
