//! Document assembly.
//!
//! [`assemble`] turns the selected frames and resolved geometry into an
//! [`AnimationDocument`]. Pixels never pass through here: an
//! [`AssetProvider`] (normally [`ImageCodec`](crate::ImageCodec)) is asked
//! once per frame for either encoded bytes, which are inlined as a data URI,
//! or the name of a file it wrote.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};

use crate::configuration::{ConversionOptions, EmbedMode};
use crate::document::{AnimationDocument, Asset, LOTTIE_VERSION, Layer, Transform};
use crate::error::LottieFrameError;
use crate::geometry::GeometrySpec;
use crate::progress::{OperationType, ProgressTracker};
use crate::selection::{FrameRate, SelectedFrame};

/// Name written to `nm` when none is configured.
pub(crate) const DEFAULT_NAME: &str = "animation";

/// Encoded image bytes tagged with their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAsset {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

/// Supplies the image behind each selected frame, already cropped and
/// scaled to the resolved geometry.
///
/// Methods take `&self` so one provider can serve several worker threads.
pub trait AssetProvider {
    /// Encoded bytes for an inlined asset.
    fn encoded_asset(&self, frame: &SelectedFrame) -> Result<EncodedAsset, LottieFrameError>;

    /// Write the asset somewhere the player can load it and return the file
    /// name to reference.
    fn external_asset(&self, frame: &SelectedFrame) -> Result<String, LottieFrameError>;
}

/// Assemble a document with default options and the given embed mode.
///
/// # Errors
///
/// See [`assemble_with_options`].
pub fn assemble<P: AssetProvider>(
    selected: &[SelectedFrame],
    geometry: &GeometrySpec,
    frame_rate: FrameRate,
    embed_mode: EmbedMode,
    provider: &P,
) -> Result<AnimationDocument, LottieFrameError> {
    let options = ConversionOptions::new().with_embed_mode(embed_mode);
    assemble_with_options(selected, geometry, frame_rate, provider, &options)
}

/// Assemble a document, taking the embed mode, name, progress callback, and
/// cancellation token from `options`.
///
/// The provider is called exactly once per selected frame, in output order.
///
/// # Errors
///
/// - [`LottieFrameError::InvalidConfiguration`] if `selected` is empty or
///   its output indices are not `0, 1, 2, ...`.
/// - [`LottieFrameError::AssetEncodingFailed`] for the first frame the
///   provider fails on. No partial document is produced.
/// - [`LottieFrameError::Cancelled`] if the token was cancelled.
pub fn assemble_with_options<P: AssetProvider>(
    selected: &[SelectedFrame],
    geometry: &GeometrySpec,
    frame_rate: FrameRate,
    provider: &P,
    options: &ConversionOptions,
) -> Result<AnimationDocument, LottieFrameError> {
    check_selection(selected)?;

    let mut tracker = ProgressTracker::new(
        options.progress.clone(),
        OperationType::AssetEncoding,
        Some(selected.len() as u64),
        options.batch_size,
    );

    let mut payloads = Vec::with_capacity(selected.len());
    for frame in selected {
        if options.is_cancelled() {
            return Err(LottieFrameError::Cancelled);
        }
        payloads.push(asset_payload(frame, options.embed_mode, provider)?);
        tracker.advance(Some(frame.original_index));
    }
    tracker.finish();

    Ok(build_document(
        selected, payloads, geometry, frame_rate, options,
    ))
}

/// Reject selections that break the `0..n` output-index invariant.
pub(crate) fn check_selection(selected: &[SelectedFrame]) -> Result<(), LottieFrameError> {
    if selected.is_empty() {
        return Err(LottieFrameError::invalid("no frames selected"));
    }
    if let Some((position, frame)) = selected
        .iter()
        .enumerate()
        .find(|(position, frame)| frame.output_index != *position)
    {
        return Err(LottieFrameError::invalid(format!(
            "selected frame at position {position} has output index {}",
            frame.output_index
        )));
    }
    Ok(())
}

/// Ask the provider for one frame and turn the answer into a `p` value.
pub(crate) fn asset_payload<P: AssetProvider + ?Sized>(
    frame: &SelectedFrame,
    embed_mode: EmbedMode,
    provider: &P,
) -> Result<String, LottieFrameError> {
    let payload = match embed_mode {
        EmbedMode::Embedded => provider.encoded_asset(frame).map(|asset| {
            format!(
                "data:{};base64,{}",
                asset.mime_type,
                BASE64_STANDARD.encode(&asset.bytes)
            )
        }),
        EmbedMode::External => provider.external_asset(frame),
    };

    payload.map_err(|error| match error {
        LottieFrameError::Cancelled | LottieFrameError::AssetEncodingFailed { .. } => error,
        other => LottieFrameError::AssetEncodingFailed {
            original_index: frame.original_index,
            reason: other.to_string(),
        },
    })
}

/// Build the document from payloads given in output order.
pub(crate) fn build_document(
    selected: &[SelectedFrame],
    payloads: Vec<String>,
    geometry: &GeometrySpec,
    frame_rate: FrameRate,
    options: &ConversionOptions,
) -> AnimationDocument {
    let (width, height) = (geometry.output_width, geometry.output_height);
    let transform = Transform::centered(width, height);

    let mut assets = Vec::with_capacity(selected.len());
    let mut layers = Vec::with_capacity(selected.len());
    for (frame, payload) in selected.iter().zip(payloads) {
        let id = Asset::id_for(frame.output_index);
        assets.push(Asset {
            id: id.clone(),
            width,
            height,
            base_path: String::new(),
            payload,
            embed_mode: options.embed_mode,
        });
        layers.push(Layer::for_frame(frame.output_index, id, transform.clone()));
    }

    log::debug!(
        "Assembled document: {} frames at {frame_rate} fps, {width}x{height}",
        layers.len(),
    );

    AnimationDocument {
        version: LOTTIE_VERSION.to_string(),
        frame_rate: frame_rate.as_f64(),
        in_point: 0,
        out_point: selected.len() as u64,
        width,
        height,
        name: options.name().unwrap_or(DEFAULT_NAME).to_string(),
        three_d: 0,
        assets,
        layers,
    }
}
