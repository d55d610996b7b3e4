//! Crop and scale resolution.
//!
//! The output canvas is derived in two steps from the first frame's
//! dimensions: an optional [`CropRequest`] cuts a rectangle out of the
//! source, then an optional [`ScaleRequest`] sizes that rectangle to the
//! final canvas. The result is a [`GeometrySpec`] shared by every frame.
//!
//! # Example
//!
//! ```
//! use lottieframe::{CropAnchor, CropRequest, ScaleRequest, resolve_geometry};
//!
//! let geometry = resolve_geometry(
//!     600,
//!     800,
//!     Some(&CropRequest::new(Some(300), Some(400), CropAnchor::Center)),
//!     Some(&ScaleRequest::width(200)),
//! )?;
//! assert_eq!((geometry.crop_offset_x, geometry.crop_offset_y), (150, 200));
//! assert_eq!((geometry.output_width, geometry.output_height), (200, 267));
//! # Ok::<(), lottieframe::LottieFrameError>(())
//! ```

use serde::Serialize;

use crate::error::LottieFrameError;

/// Reference point used to position the crop rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CropAnchor {
    /// Center the rectangle in the source frame. This is the default.
    #[default]
    Center,
    /// Pin the rectangle to the top-left corner.
    TopLeft,
}

/// A requested crop. Missing dimensions keep the source size; dimensions
/// larger than the source are clamped to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CropRequest {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub anchor: CropAnchor,
}

impl CropRequest {
    pub fn new(width: Option<u32>, height: Option<u32>, anchor: CropAnchor) -> Self {
        Self {
            width,
            height,
            anchor,
        }
    }

    /// `true` when at least one dimension is set.
    pub fn is_active(&self) -> bool {
        self.width.is_some() || self.height.is_some()
    }
}

/// A requested output size, applied to the cropped rectangle.
///
/// Setting one dimension together with
/// [`maintain_aspect_ratio`](ScaleRequest::maintain_aspect_ratio) computes
/// the other automatically. A [`factor`](ScaleRequest::factor) scales both
/// dimensions and only applies when neither dimension is set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleRequest {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub maintain_aspect_ratio: bool,
    pub factor: Option<f64>,
}

impl Default for ScaleRequest {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            maintain_aspect_ratio: true,
            factor: None,
        }
    }
}

impl ScaleRequest {
    /// Scale to a target width, deriving the height.
    pub fn width(width: u32) -> Self {
        Self {
            width: Some(width),
            ..Self::default()
        }
    }

    /// Scale to a target height, deriving the width.
    pub fn height(height: u32) -> Self {
        Self {
            height: Some(height),
            ..Self::default()
        }
    }

    /// Scale to an exact size, ignoring the aspect ratio.
    pub fn exact(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    /// Scale both dimensions by a factor (`0.5` halves the canvas).
    pub fn factor(factor: f64) -> Self {
        Self {
            factor: Some(factor),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_maintain_aspect_ratio(mut self, maintain: bool) -> Self {
        self.maintain_aspect_ratio = maintain;
        self
    }

    /// Resolve the final output dimensions for a `base_width × base_height`
    /// rectangle. Returns `(width, height)`.
    fn resolve_dimensions(
        &self,
        base_width: u32,
        base_height: u32,
    ) -> Result<(u32, u32), LottieFrameError> {
        if self.width == Some(0) || self.height == Some(0) {
            return Err(LottieFrameError::invalid(
                "scale dimensions must be greater than zero",
            ));
        }

        let dimensions = match (self.width, self.height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) if self.maintain_aspect_ratio => {
                let ratio = w as f64 / base_width as f64;
                let h = (base_height as f64 * ratio).round() as u32;
                (w, h.max(1))
            }
            (Some(w), None) => (w, base_height),
            (None, Some(h)) if self.maintain_aspect_ratio => {
                let ratio = h as f64 / base_height as f64;
                let w = (base_width as f64 * ratio).round() as u32;
                (w.max(1), h)
            }
            (None, Some(h)) => (base_width, h),
            (None, None) => match self.factor {
                Some(factor) if !factor.is_finite() || factor <= 0.0 => {
                    return Err(LottieFrameError::invalid(format!(
                        "scale factor must be positive, got {factor}"
                    )));
                }
                Some(factor) => (
                    ((base_width as f64 * factor).round() as u32).max(1),
                    ((base_height as f64 * factor).round() as u32).max(1),
                ),
                None => (base_width, base_height),
            },
        };

        Ok(dimensions)
    }
}

/// Resolved crop rectangle and output canvas, identical for every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GeometrySpec {
    pub crop_width: u32,
    pub crop_height: u32,
    pub crop_offset_x: u32,
    pub crop_offset_y: u32,
    pub output_width: u32,
    pub output_height: u32,
}

impl GeometrySpec {
    /// `true` when the crop rectangle is smaller than the source frame.
    pub fn crops(&self, source_width: u32, source_height: u32) -> bool {
        self.crop_width != source_width || self.crop_height != source_height
    }

    /// `true` when the cropped rectangle has to be resized.
    pub fn scales(&self) -> bool {
        self.crop_width != self.output_width || self.crop_height != self.output_height
    }
}

/// Resolve the crop rectangle and output canvas for a source frame.
///
/// Pure: identical inputs always produce an identical [`GeometrySpec`].
///
/// # Errors
///
/// Returns [`LottieFrameError::InvalidConfiguration`] if the source has a
/// zero dimension, a crop dimension of zero was requested, or a scale
/// dimension or factor is not positive.
pub fn resolve_geometry(
    source_width: u32,
    source_height: u32,
    crop: Option<&CropRequest>,
    scale: Option<&ScaleRequest>,
) -> Result<GeometrySpec, LottieFrameError> {
    if source_width == 0 || source_height == 0 {
        return Err(LottieFrameError::invalid(format!(
            "source dimensions {source_width}x{source_height} must be positive"
        )));
    }

    let (crop_width, crop_height, crop_offset_x, crop_offset_y) = match crop {
        Some(request) if request.is_active() => {
            let width = request.width.unwrap_or(source_width).min(source_width);
            let height = request.height.unwrap_or(source_height).min(source_height);
            if width == 0 || height == 0 {
                return Err(LottieFrameError::invalid(format!(
                    "crop dimensions {width}x{height} must be positive"
                )));
            }
            let (offset_x, offset_y) = match request.anchor {
                CropAnchor::Center => ((source_width - width) / 2, (source_height - height) / 2),
                CropAnchor::TopLeft => (0, 0),
            };
            (width, height, offset_x, offset_y)
        }
        _ => (source_width, source_height, 0, 0),
    };

    let (output_width, output_height) = match scale {
        Some(request) => request.resolve_dimensions(crop_width, crop_height)?,
        None => (crop_width, crop_height),
    };

    log::debug!(
        "Resolved geometry for {source_width}x{source_height}: crop {crop_width}x{crop_height}+{crop_offset_x}+{crop_offset_y}, output {output_width}x{output_height}",
    );

    Ok(GeometrySpec {
        crop_width,
        crop_height,
        crop_offset_x,
        crop_offset_y,
        output_width,
        output_height,
    })
}
