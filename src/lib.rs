//! # lottieframe
//!
//! Convert image sequences and videos into frame-by-frame Lottie
//! animations.
//!
//! Each kept source frame becomes one image asset and one image layer that
//! is visible for exactly one frame of the animation. The interesting work
//! is deciding *which* frames to keep when the playback rate is lowered
//! ([`select_frames`]) and *what shape* the canvas ends up
//! ([`resolve_geometry`]); decoding, resizing, and encoding go through the
//! [`image`], [`webp`](https://crates.io/crates/webp), and
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crates.
//!
//! ## Quick Start
//!
//! ### Convert a directory of PNGs
//!
//! ```no_run
//! use lottieframe::ConversionOptions;
//!
//! let summary = lottieframe::convert("renders/", "out/", &ConversionOptions::new())?;
//! println!("{} frames -> {}", summary.plan.selected.len(), summary.document_path.display());
//! # Ok::<(), lottieframe::LottieFrameError>(())
//! ```
//!
//! ### Convert a video at 12 fps, cropped and scaled, with WebP assets
//!
//! ```no_run
//! use lottieframe::{
//!     ConversionOptions, CropAnchor, CropRequest, EmbedMode, OutputFormat, ScaleRequest,
//! };
//!
//! let options = ConversionOptions::new()
//!     .with_target_frame_rate(12.0)?
//!     .with_crop(CropRequest::new(Some(720), Some(720), CropAnchor::Center))
//!     .with_scale(ScaleRequest::width(360))
//!     .with_output_format(OutputFormat::Webp { quality: 80.0, lossless: false })
//!     .with_embed_mode(EmbedMode::External);
//! lottieframe::convert("clip.mp4", "out/", &options)?;
//! # Ok::<(), lottieframe::LottieFrameError>(())
//! ```
//!
//! ### Use the planning core on its own
//!
//! ```
//! use lottieframe::{FrameRate, ScaleRequest, resolve_geometry, select_frames};
//!
//! let frames = select_frames(121, FrameRate::from_fps(30.0)?, FrameRate::from_fps(15.0)?)?;
//! let geometry = resolve_geometry(300, 400, None, Some(&ScaleRequest::width(200)))?;
//! assert_eq!(frames.len(), 61);
//! assert_eq!(geometry.output_height, 267);
//! # Ok::<(), lottieframe::LottieFrameError>(())
//! ```
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `rayon` | Encode frame assets in parallel with [`assemble_parallel`] |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! FFmpeg development libraries (for video input) and a C toolchain (for
//! libwebp) must be available at build time.

pub mod acquisition;
pub mod assembly;
pub mod codec;
pub mod configuration;
pub mod document;
pub mod error;
pub mod ffmpeg;
pub mod geometry;
pub mod pipeline;
pub mod progress;
#[cfg(feature = "rayon")]
mod rayon;
pub mod selection;
mod utilities;
pub mod validation;
pub mod video;

pub use acquisition::{Frame, IMAGE_EXTENSIONS, SourceKind, list_frames, scan_frames};
pub use assembly::{AssetProvider, EncodedAsset, assemble, assemble_with_options};
pub use codec::ImageCodec;
pub use configuration::{ConversionOptions, EmbedMode, OutputFormat};
pub use document::{AnimationDocument, Asset, LOTTIE_VERSION, Layer, StaticValue, Transform};
pub use error::LottieFrameError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use geometry::{CropAnchor, CropRequest, GeometrySpec, ScaleRequest, resolve_geometry};
pub use pipeline::{
    ConversionPlan, ConversionSummary, convert, document_name, plan, plan_for_source, render_document,
    resolve_frame_rates,
};
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
#[cfg(feature = "rayon")]
pub use rayon::assemble_parallel;
pub use selection::{DEFAULT_FRAME_RATE, FrameRate, SelectedFrame, select_frames, skip_ratio};
pub use validation::{ValidationReport, validate_frames, validate_video};
pub use video::{VideoFrames, VideoMetadata, extract_video_frames, probe_video};
