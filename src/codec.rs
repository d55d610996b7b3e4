//! Image codec.
//!
//! [`ImageCodec`] is the [`AssetProvider`] used by the conversion pipeline.
//! For each requested frame it decodes the source image, cuts out the crop
//! rectangle, resizes it to the output canvas, and encodes it as PNG (with
//! the `image` crate) or WebP (with `libwebp` through the `webp` crate).

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::{
    DynamicImage, ImageError, ImageFormat,
    codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder},
    error::{EncodingError, ImageFormatHint},
    imageops::FilterType,
};

use crate::acquisition::Frame;
use crate::assembly::{AssetProvider, EncodedAsset};
use crate::configuration::OutputFormat;
use crate::error::LottieFrameError;
use crate::geometry::GeometrySpec;
use crate::selection::SelectedFrame;
use crate::utilities::asset_file_name;

/// Crops, scales, and encodes acquired frames.
///
/// Remembers every external asset file it writes so a failed run can
/// remove exactly those with [`remove_written_assets`](ImageCodec::remove_written_assets).
#[derive(Debug)]
pub struct ImageCodec<'a> {
    frames: &'a [Frame],
    geometry: GeometrySpec,
    format: OutputFormat,
    output_dir: Option<PathBuf>,
    written: Mutex<Vec<PathBuf>>,
}

impl<'a> ImageCodec<'a> {
    pub fn new(frames: &'a [Frame], geometry: GeometrySpec, format: OutputFormat) -> Self {
        Self {
            frames,
            geometry,
            format,
            output_dir: None,
            written: Mutex::new(Vec::new()),
        }
    }

    /// Directory that external assets are written to.
    #[must_use]
    pub fn with_output_dir<P: AsRef<Path>>(mut self, directory: P) -> Self {
        self.output_dir = Some(directory.as_ref().to_path_buf());
        self
    }

    /// Decode the frame at `original_index` and apply crop and scale.
    ///
    /// # Errors
    ///
    /// Returns [`LottieFrameError::AssetEncodingFailed`] if the index is
    /// unknown or the frame is smaller than the crop rectangle, and
    /// [`LottieFrameError::ImageError`] if decoding fails.
    pub fn render(&self, original_index: usize) -> Result<DynamicImage, LottieFrameError> {
        let frame = self
            .frames
            .get(original_index)
            .filter(|frame| frame.original_index == original_index)
            .ok_or_else(|| LottieFrameError::AssetEncodingFailed {
                original_index,
                reason: "no acquired frame with this index".to_string(),
            })?;

        let geometry = &self.geometry;
        let image = image::open(&frame.path)?;

        if geometry.crop_offset_x + geometry.crop_width > image.width()
            || geometry.crop_offset_y + geometry.crop_height > image.height()
        {
            return Err(LottieFrameError::AssetEncodingFailed {
                original_index,
                reason: format!(
                    "frame is {}x{}, smaller than the crop rectangle",
                    image.width(),
                    image.height()
                ),
            });
        }

        let image = if geometry.crops(image.width(), image.height()) {
            image.crop_imm(
                geometry.crop_offset_x,
                geometry.crop_offset_y,
                geometry.crop_width,
                geometry.crop_height,
            )
        } else {
            image
        };

        Ok(if geometry.scales() {
            image.resize_exact(
                geometry.output_width,
                geometry.output_height,
                FilterType::Lanczos3,
            )
        } else {
            image
        })
    }

    /// Encode an image in the configured output format.
    ///
    /// # Errors
    ///
    /// Returns [`LottieFrameError::ImageError`] if PNG encoding fails or
    /// libwebp rejects the frame (for example a side longer than 16383 px).
    pub fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>, LottieFrameError> {
        match self.format {
            OutputFormat::Png => {
                let mut buffer = Cursor::new(Vec::new());
                image.write_with_encoder(PngEncoder::new_with_quality(
                    &mut buffer,
                    CompressionType::Best,
                    PngFilter::Adaptive,
                ))?;
                Ok(buffer.into_inner())
            }
            OutputFormat::Webp { quality, lossless } => {
                let rgba = image.to_rgba8();
                let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
                let memory = encoder
                    .encode_simple(lossless, quality.clamp(0.0, 100.0))
                    .map_err(|error| {
                        ImageError::Encoding(EncodingError::new(
                            ImageFormatHint::Exact(ImageFormat::WebP),
                            format!(
                                "libwebp rejected {}x{} frame: {error:?}",
                                rgba.width(),
                                rgba.height()
                            ),
                        ))
                    })?;
                Ok(memory.to_vec())
            }
        }
    }

    /// External asset files written so far, in completion order.
    pub fn written_assets(&self) -> Vec<PathBuf> {
        self.written
            .lock()
            .map(|written| written.clone())
            .unwrap_or_default()
    }

    /// Delete the external asset files this codec wrote. Failures are
    /// logged, not returned.
    pub fn remove_written_assets(&self) {
        let Ok(mut written) = self.written.lock() else {
            return;
        };
        for path in written.drain(..) {
            if let Err(error) = fs::remove_file(&path) {
                log::warn!("Failed to remove partial asset {}: {error}", path.display());
            }
        }
    }

    fn render_and_encode(&self, frame: &SelectedFrame) -> Result<Vec<u8>, LottieFrameError> {
        let image = self.render(frame.original_index)?;
        self.encode(&image)
    }
}

impl AssetProvider for ImageCodec<'_> {
    fn encoded_asset(&self, frame: &SelectedFrame) -> Result<EncodedAsset, LottieFrameError> {
        Ok(EncodedAsset {
            bytes: self.render_and_encode(frame)?,
            mime_type: self.format.mime_type(),
        })
    }

    fn external_asset(&self, frame: &SelectedFrame) -> Result<String, LottieFrameError> {
        let directory = self.output_dir.as_ref().ok_or_else(|| {
            LottieFrameError::invalid("external assets need an output directory")
        })?;
        let bytes = self.render_and_encode(frame)?;
        let name = asset_file_name(frame.output_index, self.format.extension());
        let path = directory.join(&name);
        fs::write(&path, bytes)?;
        if let Ok(mut written) = self.written.lock() {
            written.push(path);
        }
        log::debug!(
            "Wrote asset {name} for source frame {}",
            frame.original_index
        );
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};

    use super::*;
    use crate::geometry::{CropAnchor, CropRequest, ScaleRequest, resolve_geometry};

    /// A 40x20 frame whose left half is red and right half is blue.
    fn split_frame(directory: &Path) -> Vec<Frame> {
        let image = RgbImage::from_fn(40, 20, |x, _| {
            if x < 20 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) }
        });
        let path = directory.join("split.png");
        image.save(&path).unwrap();
        vec![Frame {
            original_index: 0,
            width: 40,
            height: 20,
            path,
        }]
    }

    #[test]
    fn render_crops_then_scales() {
        let directory = tempfile::tempdir().unwrap();
        let frames = split_frame(directory.path());
        let crop = CropRequest::new(Some(20), None, CropAnchor::TopLeft);
        let geometry = resolve_geometry(40, 20, Some(&crop), Some(&ScaleRequest::width(10))).unwrap();

        let codec = ImageCodec::new(&frames, geometry, OutputFormat::Png);
        let image = codec.render(0).unwrap().to_rgb8();
        assert_eq!(image.dimensions(), (10, 10));
        let pixel = image.get_pixel(9, 5);
        assert!(pixel[0] > 250 && pixel[2] < 5, "expected red, got {pixel:?}");
    }

    #[test]
    fn encodes_png_and_webp_signatures() {
        let directory = tempfile::tempdir().unwrap();
        let frames = split_frame(directory.path());
        let geometry = resolve_geometry(40, 20, None, None).unwrap();
        let image = DynamicImage::ImageRgb8(RgbImage::new(4, 4));

        let png = ImageCodec::new(&frames, geometry, OutputFormat::Png)
            .encode(&image)
            .unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let webp = ImageCodec::new(&frames, geometry, OutputFormat::webp())
            .encode(&image)
            .unwrap();
        assert_eq!(&webp[..4], b"RIFF");
        assert_eq!(&webp[8..12], b"WEBP");
    }

    #[test]
    fn oversized_webp_is_an_error() {
        let directory = tempfile::tempdir().unwrap();
        let frames = split_frame(directory.path());
        let geometry = resolve_geometry(40, 20, None, None).unwrap();
        let image = DynamicImage::ImageRgb8(RgbImage::new(16384, 1));

        for format in [
            OutputFormat::webp(),
            OutputFormat::Webp {
                quality: 100.0,
                lossless: true,
            },
        ] {
            let result = ImageCodec::new(&frames, geometry, format).encode(&image);
            assert!(matches!(result, Err(LottieFrameError::ImageError(_))));
        }
    }

    #[test]
    fn unknown_frame_is_an_encoding_failure() {
        let directory = tempfile::tempdir().unwrap();
        let frames = split_frame(directory.path());
        let geometry = resolve_geometry(40, 20, None, None).unwrap();
        let codec = ImageCodec::new(&frames, geometry, OutputFormat::Png);

        assert!(matches!(
            codec.render(3),
            Err(LottieFrameError::AssetEncodingFailed { original_index: 3, .. })
        ));
    }

    #[test]
    fn external_assets_need_a_directory() {
        let directory = tempfile::tempdir().unwrap();
        let frames = split_frame(directory.path());
        let geometry = resolve_geometry(40, 20, None, None).unwrap();
        let frame = SelectedFrame {
            original_index: 0,
            output_index: 0,
        };

        let codec = ImageCodec::new(&frames, geometry, OutputFormat::Png);
        assert!(codec.external_asset(&frame).is_err());

        let output = directory.path().join("out");
        fs::create_dir(&output).unwrap();
        let codec = codec.with_output_dir(&output);
        assert_eq!(codec.external_asset(&frame).unwrap(), "frame_00000.png");
        assert_eq!(codec.written_assets(), vec![output.join("frame_00000.png")]);

        codec.remove_written_assets();
        assert!(!output.join("frame_00000.png").exists());
        assert!(codec.written_assets().is_empty());
        assert!(directory.path().join("split.png").exists());
    }
}
