//! End-to-end conversion.
//!
//! [`plan`] runs the pure half of a conversion (frame selection and
//! geometry resolution) and [`convert`] runs everything: acquisition,
//! planning, per-frame encoding, assembly, and writing the JSON document
//! (plus external image files) to the output directory.
//!
//! # Example
//!
//! ```no_run
//! use lottieframe::{ConversionOptions, EmbedMode, ScaleRequest};
//!
//! let options = ConversionOptions::new()
//!     .with_target_frame_rate(15.0)?
//!     .with_scale(ScaleRequest::width(320))
//!     .with_embed_mode(EmbedMode::External);
//! let summary = lottieframe::convert("clip.mp4", "out/", &options)?;
//! println!("wrote {}", summary.document_path.display());
//! # Ok::<(), lottieframe::LottieFrameError>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::acquisition::{Frame, SourceKind, list_frames};
use crate::assembly::DEFAULT_NAME;
use crate::codec::ImageCodec;
use crate::configuration::{ConversionOptions, EmbedMode};
use crate::document::AnimationDocument;
use crate::error::LottieFrameError;
use crate::geometry::{GeometrySpec, resolve_geometry};
use crate::selection::{DEFAULT_FRAME_RATE, FrameRate, SelectedFrame, select_frames};
use crate::video::extract_video_frames;

/// Which frames to keep and how to shape them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionPlan {
    pub source_width: u32,
    pub source_height: u32,
    /// Number of acquired source frames.
    pub frame_count: usize,
    #[serde(serialize_with = "serialize_rate")]
    pub original_frame_rate: FrameRate,
    #[serde(serialize_with = "serialize_rate")]
    pub output_frame_rate: FrameRate,
    pub selected: Vec<SelectedFrame>,
    pub geometry: GeometrySpec,
}

fn serialize_rate<S: serde::Serializer>(rate: &FrameRate, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(rate.as_f64())
}

/// What a finished conversion produced.
#[derive(Debug, Clone)]
pub struct ConversionSummary {
    pub document_path: PathBuf,
    /// Image files written next to the document (external mode only).
    pub asset_paths: Vec<PathBuf>,
    pub plan: ConversionPlan,
    /// Size of the JSON document in bytes.
    pub document_bytes: usize,
}

/// Work out the original and output rates.
///
/// The original rate is, in order of preference: the configured override,
/// the rate reported by the source, the configured target, or
/// [`DEFAULT_FRAME_RATE`]. The output rate defaults to the original rate.
pub fn resolve_frame_rates(
    source_rate: Option<FrameRate>,
    options: &ConversionOptions,
) -> (FrameRate, FrameRate) {
    let original = options
        .original_frame_rate()
        .or(source_rate)
        .or(options.target_frame_rate())
        .unwrap_or(DEFAULT_FRAME_RATE);
    let target = options.target_frame_rate().unwrap_or(original);
    (original, target)
}

/// Plan a conversion for a source of `frame_count` frames of
/// `width × height`.
///
/// # Errors
///
/// Returns [`LottieFrameError::InvalidConfiguration`] from frame selection
/// or geometry resolution.
pub fn plan_for_source(
    frame_count: usize,
    width: u32,
    height: u32,
    source_rate: Option<FrameRate>,
    options: &ConversionOptions,
) -> Result<ConversionPlan, LottieFrameError> {
    let (original, target) = resolve_frame_rates(source_rate, options);
    let selected = select_frames(frame_count, original, target)?;
    let geometry = resolve_geometry(width, height, options.crop(), options.scale())?;

    Ok(ConversionPlan {
        source_width: width,
        source_height: height,
        frame_count,
        original_frame_rate: original,
        output_frame_rate: target,
        selected,
        geometry,
    })
}

/// Plan a conversion for acquired frames, using the first frame's
/// dimensions.
///
/// # Errors
///
/// Returns [`LottieFrameError::InvalidConfiguration`] if `frames` is empty
/// or planning fails.
pub fn plan(
    frames: &[Frame],
    source_rate: Option<FrameRate>,
    options: &ConversionOptions,
) -> Result<ConversionPlan, LottieFrameError> {
    let first = frames
        .first()
        .ok_or_else(|| LottieFrameError::invalid("no frames to plan"))?;
    plan_for_source(frames.len(), first.width, first.height, source_rate, options)
}

/// Build the animation document for acquired frames without writing the
/// JSON anywhere. External assets are written to `asset_dir`; if the
/// document cannot be completed, the asset files written by this call are
/// removed again and any other files in `asset_dir` are left alone.
///
/// # Errors
///
/// Planning errors, [`LottieFrameError::AssetEncodingFailed`] for codec
/// failures, and [`LottieFrameError::Cancelled`].
pub fn render_document(
    frames: &[Frame],
    source_rate: Option<FrameRate>,
    asset_dir: &Path,
    options: &ConversionOptions,
) -> Result<(ConversionPlan, AnimationDocument), LottieFrameError> {
    let plan = plan(frames, source_rate, options)?;
    let codec =
        ImageCodec::new(frames, plan.geometry, options.output_format()).with_output_dir(asset_dir);

    #[cfg(feature = "rayon")]
    let result = crate::rayon::assemble_parallel(
        &plan.selected,
        &plan.geometry,
        plan.output_frame_rate,
        &codec,
        options,
    );
    #[cfg(not(feature = "rayon"))]
    let result = crate::assembly::assemble_with_options(
        &plan.selected,
        &plan.geometry,
        plan.output_frame_rate,
        &codec,
        options,
    );

    match result {
        Ok(document) => Ok((plan, document)),
        Err(error) => {
            codec.remove_written_assets();
            Err(error)
        }
    }
}

/// The document name: `name` if given, else the input's file stem, else
/// `"animation"`.
pub fn document_name(input: &Path, name: Option<&str>) -> String {
    name.map(str::to_string)
        .or_else(|| {
            input
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| DEFAULT_NAME.to_string())
}

/// Convert an image directory or video into `<out_dir>/<name>.json`.
///
/// Videos are decoded into a temporary directory that is removed when the
/// conversion finishes; failing to remove it only logs a warning.
///
/// # Errors
///
/// - [`LottieFrameError::AcquisitionFailed`] if the input cannot be read.
/// - [`LottieFrameError::InvalidConfiguration`] from planning, or when
///   external assets would be written into the input image directory.
/// - [`LottieFrameError::AssetEncodingFailed`] if a frame fails to encode.
/// - [`LottieFrameError::IoError`] if the output cannot be written.
pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    out_dir: Q,
    options: &ConversionOptions,
) -> Result<ConversionSummary, LottieFrameError> {
    let input = input.as_ref();
    let out_dir = out_dir.as_ref();

    let name = document_name(input, options.name());
    let options = options.clone().with_name(name.clone());

    let kind = SourceKind::detect(input)?;
    log::debug!("Converting {} ({kind:?}) into {}", input.display(), out_dir.display());

    if kind == SourceKind::ImageDirectory && options.embed_mode() == EmbedMode::External {
        ensure_separate_directories(input, out_dir)?;
    }

    let mut scratch = None;
    let (frames, source_rate) = match kind {
        SourceKind::ImageDirectory => (list_frames(input)?, None),
        SourceKind::Video => {
            let directory = tempfile::Builder::new()
                .prefix("lottieframe-")
                .tempdir()?;
            let extracted = extract_video_frames(input, directory.path(), &options)?;
            let frames = list_frames(directory.path())?;
            scratch = Some(directory);
            (frames, Some(extracted.frame_rate))
        }
    };

    fs::create_dir_all(out_dir)?;
    let result = write_outputs(&frames, source_rate, out_dir, &name, &options);

    if let Some(directory) = scratch {
        let path = directory.path().to_path_buf();
        if let Err(error) = directory.close() {
            log::warn!("Failed to remove scratch directory {}: {error}", path.display());
        }
    }

    result
}

/// External assets share the `frame_*` naming of many image sequences, so
/// they must not land in the directory being read.
fn ensure_separate_directories(input: &Path, out_dir: &Path) -> Result<(), LottieFrameError> {
    let Ok(out_dir) = fs::canonicalize(out_dir) else {
        return Ok(());
    };
    if fs::canonicalize(input)? == out_dir {
        return Err(LottieFrameError::invalid(format!(
            "output directory {} is the input directory; external assets would overwrite source frames",
            out_dir.display()
        )));
    }
    Ok(())
}

fn write_outputs(
    frames: &[Frame],
    source_rate: Option<FrameRate>,
    out_dir: &Path,
    name: &str,
    options: &ConversionOptions,
) -> Result<ConversionSummary, LottieFrameError> {
    let (plan, document) = render_document(frames, source_rate, out_dir, options)?;

    let json = document.to_json()?;
    let document_path = out_dir.join(format!("{name}.json"));
    fs::write(&document_path, &json)?;

    let asset_paths = match options.embed_mode() {
        EmbedMode::External => document
            .assets
            .iter()
            .map(|asset| out_dir.join(&asset.payload))
            .collect(),
        EmbedMode::Embedded => Vec::new(),
    };

    log::debug!(
        "Wrote {} ({} bytes, {} frames)",
        document_path.display(),
        json.len(),
        document.frame_count(),
    );

    Ok(ConversionSummary {
        document_path,
        asset_paths,
        plan,
        document_bytes: json.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_default_to_thirty() {
        let (original, target) = resolve_frame_rates(None, &ConversionOptions::new());
        assert_eq!(original, FrameRate::new(30, 1).unwrap());
        assert_eq!(target, original);
    }

    #[test]
    fn target_alone_keeps_every_image() {
        let options = ConversionOptions::new().with_target_frame_rate(12.0).unwrap();
        let (original, target) = resolve_frame_rates(None, &options);
        assert_eq!(original, target);
    }

    #[test]
    fn source_rate_beats_target_but_not_override() {
        let source = Some(FrameRate::new(25, 1).unwrap());
        let options = ConversionOptions::new().with_target_frame_rate(5.0).unwrap();
        let (original, _) = resolve_frame_rates(source, &options);
        assert_eq!(original, FrameRate::new(25, 1).unwrap());

        let options = options.with_original_frame_rate(50.0).unwrap();
        let (original, target) = resolve_frame_rates(source, &options);
        assert_eq!(original, FrameRate::new(50, 1).unwrap());
        assert_eq!(target, FrameRate::new(5, 1).unwrap());
    }

    #[test]
    fn plan_for_source_combines_selection_and_geometry() {
        let options = ConversionOptions::new()
            .with_target_frame_rate(15.0)
            .unwrap()
            .with_crop(crate::CropRequest::new(Some(300), Some(400), crate::CropAnchor::Center))
            .with_scale(crate::ScaleRequest::width(200));
        let plan =
            plan_for_source(121, 600, 800, Some(FrameRate::new(30, 1).unwrap()), &options).unwrap();
        assert_eq!(plan.selected.len(), 61);
        assert_eq!((plan.geometry.output_width, plan.geometry.output_height), (200, 267));
        assert_eq!(plan.output_frame_rate, FrameRate::new(15, 1).unwrap());
    }

    #[test]
    fn document_name_falls_back_to_input_stem() {
        assert_eq!(document_name(Path::new("clips/intro.mp4"), None), "intro");
        assert_eq!(document_name(Path::new("renders"), None), "renders");
        assert_eq!(document_name(Path::new("renders"), Some("logo")), "logo");
        assert_eq!(document_name(Path::new("/"), None), "animation");
    }

    #[test]
    fn plan_rejects_empty_frames() {
        assert!(matches!(
            plan(&[], None, &ConversionOptions::new()),
            Err(LottieFrameError::InvalidConfiguration(_))
        ));
    }
}
