//! Parallel asset encoding.
//!
//! Encoding one frame never depends on another, so with the `rayon` feature
//! the per-frame provider calls are spread across the rayon pool. Results
//! are put back in output order before the document is built, so the output
//! is identical to [`assemble_with_options`](crate::assemble_with_options).

use std::sync::Mutex;

use ::rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::assembly::{AssetProvider, asset_payload, build_document, check_selection};
use crate::configuration::ConversionOptions;
use crate::document::AnimationDocument;
use crate::error::LottieFrameError;
use crate::geometry::GeometrySpec;
use crate::progress::{OperationType, ProgressTracker};
use crate::selection::{FrameRate, SelectedFrame};

/// Assemble a document, encoding frames on rayon worker threads.
///
/// # Errors
///
/// Same as [`assemble_with_options`](crate::assemble_with_options). When
/// several frames fail, the failure with the lowest output index is
/// reported.
pub fn assemble_parallel<P: AssetProvider + Sync>(
    selected: &[SelectedFrame],
    geometry: &GeometrySpec,
    frame_rate: FrameRate,
    provider: &P,
    options: &ConversionOptions,
) -> Result<AnimationDocument, LottieFrameError> {
    check_selection(selected)?;

    let tracker = Mutex::new(ProgressTracker::new(
        options.progress.clone(),
        OperationType::AssetEncoding,
        Some(selected.len() as u64),
        options.batch_size,
    ));

    let mut results: Vec<(usize, Result<String, LottieFrameError>)> = selected
        .par_iter()
        .map(|frame| {
            if options.is_cancelled() {
                return (frame.output_index, Err(LottieFrameError::Cancelled));
            }
            let payload = asset_payload(frame, options.embed_mode, provider);
            if payload.is_ok() {
                if let Ok(mut tracker) = tracker.lock() {
                    tracker.advance(Some(frame.original_index));
                }
            }
            (frame.output_index, payload)
        })
        .collect();

    results.sort_by_key(|(output_index, _)| *output_index);
    let payloads = results
        .into_iter()
        .map(|(_, payload)| payload)
        .collect::<Result<Vec<String>, LottieFrameError>>()?;

    if let Ok(mut tracker) = tracker.lock() {
        tracker.finish();
    }

    Ok(build_document(
        selected, payloads, geometry, frame_rate, options,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::{EncodedAsset, assemble_with_options};
    use crate::configuration::EmbedMode;
    use crate::selection::select_frames;

    /// Thread-safe provider returning the original index as its single byte.
    #[derive(Default)]
    struct SharedProvider {
        fail_on: Vec<usize>,
    }

    impl SharedProvider {
        fn check(&self, frame: &SelectedFrame) -> Result<(), LottieFrameError> {
            if self.fail_on.contains(&frame.original_index) {
                let reason = format!("frame {} is corrupt", frame.original_index);
                return Err(std::io::Error::other(reason).into());
            }
            Ok(())
        }
    }

    impl AssetProvider for SharedProvider {
        fn encoded_asset(&self, frame: &SelectedFrame) -> Result<EncodedAsset, LottieFrameError> {
            self.check(frame)?;
            Ok(EncodedAsset {
                bytes: vec![frame.original_index as u8],
                mime_type: "image/png",
            })
        }

        fn external_asset(&self, frame: &SelectedFrame) -> Result<String, LottieFrameError> {
            self.check(frame)?;
            Ok(format!("frame_{:05}.png", frame.output_index))
        }
    }

    fn geometry() -> GeometrySpec {
        GeometrySpec {
            crop_width: 64,
            crop_height: 48,
            crop_offset_x: 0,
            crop_offset_y: 0,
            output_width: 32,
            output_height: 24,
        }
    }

    fn rate(fps: f64) -> FrameRate {
        FrameRate::from_fps(fps).unwrap()
    }

    #[test]
    fn parallel_matches_sequential() {
        let selected = select_frames(90, rate(30.0), rate(12.0)).unwrap();
        let provider = SharedProvider::default();

        for mode in [EmbedMode::Embedded, EmbedMode::External] {
            let options = ConversionOptions::new()
                .with_embed_mode(mode)
                .with_name("parallel");
            let sequential =
                assemble_with_options(&selected, &geometry(), rate(12.0), &provider, &options)
                    .unwrap();
            let parallel =
                assemble_parallel(&selected, &geometry(), rate(12.0), &provider, &options).unwrap();
            assert_eq!(parallel, sequential);
        }
    }

    #[test]
    fn lowest_failing_frame_is_reported() {
        let selected = select_frames(10, rate(10.0), rate(10.0)).unwrap();
        let provider = SharedProvider {
            fail_on: vec![7, 2],
        };

        for mode in [EmbedMode::Embedded, EmbedMode::External] {
            let options = ConversionOptions::new().with_embed_mode(mode);
            let result = assemble_parallel(&selected, &geometry(), rate(10.0), &provider, &options);
            match result {
                Err(LottieFrameError::AssetEncodingFailed { original_index, .. }) => {
                    assert_eq!(original_index, 2);
                }
                other => panic!("Expected AssetEncodingFailed, got {other:?}"),
            }
        }
    }

    #[test]
    fn empty_selection_is_rejected() {
        let options = ConversionOptions::new();
        let provider = SharedProvider::default();
        let result = assemble_parallel(&[], &geometry(), rate(10.0), &provider, &options);
        assert!(matches!(result, Err(LottieFrameError::InvalidConfiguration(_))));
    }
}
