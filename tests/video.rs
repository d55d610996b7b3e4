//! Video input integration tests.
//!
//! Tests require the fixture from `tests/fixtures/generate_fixtures.sh` and
//! return early when it is missing.

mod common;

use std::path::Path;

use lottieframe::{ConversionOptions, EmbedMode, FrameRate, ScaleRequest};

use common::SAMPLE_VIDEO;

#[test]
fn probe_reports_stream_properties() {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let metadata = lottieframe::probe_video(SAMPLE_VIDEO).expect("Failed to probe video");
    assert_eq!((metadata.width, metadata.height), (160, 120));
    assert_eq!(metadata.frame_rate, FrameRate::new(30, 1).unwrap());
    assert!(metadata.estimated_frame_count > 50);

    let report = lottieframe::validate_video(&metadata, &ConversionOptions::new());
    assert!(report.is_valid(), "{report}");
}

#[test]
fn extract_writes_numbered_frames() {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let scratch = tempfile::tempdir().expect("Failed to create temp dir");
    let extracted =
        lottieframe::extract_video_frames(SAMPLE_VIDEO, scratch.path(), &ConversionOptions::new())
            .expect("Failed to extract frames");

    assert!(extracted.frame_count > 0);
    assert!(scratch.path().join("frame_000000.png").exists());

    let frames = lottieframe::list_frames(scratch.path()).expect("Failed to list frames");
    assert_eq!(frames.len(), extracted.frame_count);
    assert_eq!((frames[0].width, frames[0].height), (160, 120));
}

#[test]
fn convert_video_at_lower_rate() {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let options = ConversionOptions::new()
        .with_target_frame_rate(10.0)
        .unwrap()
        .with_scale(ScaleRequest::width(80))
        .with_embed_mode(EmbedMode::External);
    let summary =
        lottieframe::convert(SAMPLE_VIDEO, output.path(), &options).expect("Conversion failed");

    assert_eq!(summary.document_path, output.path().join("sample_video.json"));
    assert_eq!(summary.plan.original_frame_rate, FrameRate::new(30, 1).unwrap());
    assert_eq!(
        summary.plan.selected.len(),
        summary.plan.frame_count.div_ceil(3)
    );
    assert_eq!(
        (summary.plan.geometry.output_width, summary.plan.geometry.output_height),
        (80, 60)
    );
    assert!(summary.asset_paths.iter().all(|path| path.exists()));
}
