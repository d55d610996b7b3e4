//! Conversion configuration.
//!
//! [`ConversionOptions`] is an immutable builder carrying everything a run
//! needs: frame rates, crop and scale requests, the output format, the embed
//! mode, and operational settings (progress, cancellation). Every stage
//! receives it by reference; nothing is stored in process-wide state, so
//! independent conversions can run side by side.
//!
//! # Example
//!
//! ```
//! use lottieframe::{
//!     ConversionOptions, CropAnchor, CropRequest, EmbedMode, OutputFormat, ScaleRequest,
//! };
//!
//! let options = ConversionOptions::new()
//!     .with_target_frame_rate(15.0)?
//!     .with_crop(CropRequest::new(Some(300), Some(400), CropAnchor::Center))
//!     .with_scale(ScaleRequest::width(200))
//!     .with_output_format(OutputFormat::Webp { quality: 80.0, lossless: false })
//!     .with_embed_mode(EmbedMode::External);
//! # Ok::<(), lottieframe::LottieFrameError>(())
//! ```

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::sync::Arc;

use serde::Serialize;

use crate::error::LottieFrameError;
use crate::geometry::{CropRequest, ScaleRequest};
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};
use crate::selection::FrameRate;

/// Encoded image format for frame assets.
///
/// Resolved once when options are built; MIME type and file extension are
/// derived from the variant rather than re-checked at each call site.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum OutputFormat {
    /// Lossless PNG. This is the default.
    #[default]
    Png,
    /// WebP. `quality` ranges from 0 to 100 and is ignored when `lossless`.
    Webp {
        quality: f32,
        lossless: bool,
    },
}

impl OutputFormat {
    /// WebP with the default lossy quality of 75.
    pub fn webp() -> Self {
        OutputFormat::Webp {
            quality: 75.0,
            lossless: false,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Webp { .. } => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Webp { .. } => "webp",
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            OutputFormat::Png => write!(f, "png"),
            OutputFormat::Webp { lossless: true, .. } => write!(f, "webp (lossless)"),
            OutputFormat::Webp { quality, .. } => write!(f, "webp (quality {quality})"),
        }
    }
}

/// Whether asset bytes are inlined into the document or written next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedMode {
    /// Base64 data URIs inside the JSON. This is the default.
    #[default]
    Embedded,
    /// Separate image files referenced by name.
    External,
}

/// Configuration for a conversion run.
#[derive(Clone)]
pub struct ConversionOptions {
    /// Playback rate of the produced animation. `None` keeps the source rate.
    pub(crate) target_frame_rate: Option<FrameRate>,
    /// Overrides the probed (video) or assumed (image directory) source rate.
    pub(crate) original_frame_rate: Option<FrameRate>,
    pub(crate) crop: Option<CropRequest>,
    pub(crate) scale: Option<ScaleRequest>,
    pub(crate) output_format: OutputFormat,
    pub(crate) embed_mode: EmbedMode,
    /// Document name (`nm`). Defaults to the input stem.
    pub(crate) name: Option<String>,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    /// How often to fire the progress callback (every N frames).
    pub(crate) batch_size: u64,
}

impl Debug for ConversionOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ConversionOptions")
            .field("target_frame_rate", &self.target_frame_rate)
            .field("original_frame_rate", &self.original_frame_rate)
            .field("crop", &self.crop)
            .field("scale", &self.scale)
            .field("output_format", &self.output_format)
            .field("embed_mode", &self.embed_mode)
            .field("name", &self.name)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionOptions {
    /// Defaults: source frame rate, no crop or scale, embedded PNG assets,
    /// no progress callback, no cancellation, batch size 1.
    pub fn new() -> Self {
        Self {
            target_frame_rate: None,
            original_frame_rate: None,
            crop: None,
            scale: None,
            output_format: OutputFormat::Png,
            embed_mode: EmbedMode::Embedded,
            name: None,
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
        }
    }

    /// Set the playback rate of the produced animation.
    ///
    /// # Errors
    ///
    /// Returns [`LottieFrameError::InvalidConfiguration`] for non-positive
    /// or non-finite rates.
    pub fn with_target_frame_rate(mut self, fps: f64) -> Result<Self, LottieFrameError> {
        self.target_frame_rate = Some(FrameRate::from_fps(fps)?);
        Ok(self)
    }

    /// Set the rate the source frames were captured at.
    ///
    /// # Errors
    ///
    /// Returns [`LottieFrameError::InvalidConfiguration`] for non-positive
    /// or non-finite rates.
    pub fn with_original_frame_rate(mut self, fps: f64) -> Result<Self, LottieFrameError> {
        self.original_frame_rate = Some(FrameRate::from_fps(fps)?);
        Ok(self)
    }

    #[must_use]
    pub fn with_crop(mut self, crop: CropRequest) -> Self {
        self.crop = Some(crop);
        self
    }

    #[must_use]
    pub fn with_scale(mut self, scale: ScaleRequest) -> Self {
        self.scale = Some(scale);
        self
    }

    #[must_use]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    #[must_use]
    pub fn with_embed_mode(mut self, mode: EmbedMode) -> Self {
        self.embed_mode = mode;
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach a progress callback, invoked every
    /// [`batch_size`](ConversionOptions::with_batch_size) encoded frames.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token. A cancelled token stops the run before
    /// the next frame is encoded with [`LottieFrameError::Cancelled`].
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

    pub fn target_frame_rate(&self) -> Option<FrameRate> {
        self.target_frame_rate
    }

    pub fn original_frame_rate(&self) -> Option<FrameRate> {
        self.original_frame_rate
    }

    pub fn crop(&self) -> Option<&CropRequest> {
        self.crop.as_ref()
    }

    pub fn scale(&self) -> Option<&ScaleRequest> {
        self.scale.as_ref()
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn embed_mode(&self) -> EmbedMode {
        self.embed_mode
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns `true` if cancellation has been requested.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
