//! End-to-end conversion tests on generated image sequences.

mod common;

use std::fs;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use lottieframe::{
    CancellationToken, ConversionOptions, CropAnchor, CropRequest, EmbedMode, LottieFrameError,
    OutputFormat, ScaleRequest,
};
use serde_json::Value;

use common::{shade, write_frame, write_sequence};

fn read_document(path: &std::path::Path) -> Value {
    let json = fs::read_to_string(path).expect("Failed to read document");
    serde_json::from_str(&json).expect("Document is not valid JSON")
}

/// Replace `name` with a PNG whose header is readable but whose pixel data
/// is cut short.
fn write_truncated_frame(dir: &std::path::Path, name: &str) {
    // Noisy pixels give a large IDAT chunk, so half the file keeps the
    // header intact.
    let path = dir.join(name);
    image::RgbImage::from_fn(12, 12, |x, y| {
        let value = ((x * 97 + y * 31) * 13 % 251) as u8;
        image::Rgb([value, value.wrapping_mul(7), value.wrapping_add(91)])
    })
    .save(&path)
    .unwrap();
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
}

#[test]
fn embedded_png_document_structure() {
    let input = tempfile::tempdir().expect("Failed to create temp dir");
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    write_sequence(input.path(), 6, 40, 30);

    let options = ConversionOptions::new()
        .with_original_frame_rate(30.0)
        .unwrap()
        .with_target_frame_rate(15.0)
        .unwrap()
        .with_name("seq");
    let summary = lottieframe::convert(input.path(), output.path(), &options)
        .expect("Conversion failed");

    assert_eq!(summary.document_path, output.path().join("seq.json"));
    assert!(summary.asset_paths.is_empty());
    assert_eq!(summary.plan.frame_count, 6);

    let document = read_document(&summary.document_path);
    assert_eq!(document["v"], "5.7.4");
    assert_eq!(document["fr"], 15.0);
    assert_eq!(document["ip"], 0);
    assert_eq!(document["op"], 3);
    assert_eq!(document["w"], 40);
    assert_eq!(document["h"], 30);
    assert_eq!(document["nm"], "seq");
    assert_eq!(document["ddd"], 0);

    let assets = document["assets"].as_array().unwrap();
    let layers = document["layers"].as_array().unwrap();
    assert_eq!(assets.len(), 3);
    assert_eq!(layers.len(), 3);

    for (index, (asset, layer)) in assets.iter().zip(layers).enumerate() {
        assert_eq!(asset["id"], format!("image_{index}"));
        assert_eq!(asset["e"], 1);
        assert_eq!(asset["u"], "");
        assert_eq!(layer["refId"], asset["id"]);
        assert_eq!(layer["ty"], 2);
        assert_eq!(layer["ind"], index + 1);
        assert_eq!(layer["ip"], index);
        assert_eq!(layer["op"], index + 1);
        assert_eq!(layer["ks"]["p"]["k"], serde_json::json!([20.0, 15.0, 0.0]));

        // Output frame k shows source frame 2k.
        let payload = asset["p"].as_str().unwrap();
        let encoded = payload
            .strip_prefix("data:image/png;base64,")
            .expect("Payload should be a PNG data URI");
        let bytes = STANDARD.decode(encoded).expect("Invalid base64");
        let image = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(image.dimensions(), (40, 30));
        assert_eq!(image.get_pixel(0, 0)[0], shade(index * 2));
    }

    assert_eq!(summary.document_bytes, fs::metadata(&summary.document_path).unwrap().len() as usize);
}

#[test]
fn external_webp_with_crop_and_scale() {
    let input = tempfile::tempdir().expect("Failed to create temp dir");
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    write_sequence(input.path(), 4, 100, 80);

    let options = ConversionOptions::new()
        .with_crop(CropRequest::new(Some(50), Some(50), CropAnchor::Center))
        .with_scale(ScaleRequest::width(25))
        .with_output_format(OutputFormat::Webp {
            quality: 90.0,
            lossless: false,
        })
        .with_embed_mode(EmbedMode::External)
        .with_name("cropped");
    let summary = lottieframe::convert(input.path(), output.path(), &options)
        .expect("Conversion failed");

    let geometry = summary.plan.geometry;
    assert_eq!((geometry.crop_offset_x, geometry.crop_offset_y), (25, 15));
    assert_eq!((geometry.output_width, geometry.output_height), (25, 25));

    assert_eq!(summary.asset_paths.len(), 4);
    for (index, path) in summary.asset_paths.iter().enumerate() {
        assert_eq!(path, &output.path().join(format!("frame_{index:05}.webp")));
        let image = image::open(path).expect("Failed to open external asset");
        assert_eq!((image.width(), image.height()), (25, 25));
    }

    let document = read_document(&summary.document_path);
    assert_eq!(document["w"], 25);
    assert_eq!(document["h"], 25);
    assert_eq!(document["assets"][2]["p"], "frame_00002.webp");
    assert_eq!(document["assets"][2]["e"], 0);
}

#[test]
fn document_name_defaults_to_input_directory() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let input = root.path().join("walk_cycle");
    fs::create_dir(&input).unwrap();
    write_sequence(&input, 2, 8, 8);

    let output = root.path().join("out");
    let summary = lottieframe::convert(&input, &output, &ConversionOptions::new())
        .expect("Conversion failed");

    assert_eq!(summary.document_path, output.join("walk_cycle.json"));
    assert_eq!(read_document(&summary.document_path)["nm"], "walk_cycle");
}

#[test]
fn mixed_dimensions_are_rejected() {
    let input = tempfile::tempdir().expect("Failed to create temp dir");
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    write_frame(input.path(), "a_1.png", 20, 20, 0);
    write_frame(input.path(), "a_2.png", 20, 20, 10);
    write_frame(input.path(), "a_3.png", 24, 20, 20);

    let result = lottieframe::convert(input.path(), output.path(), &ConversionOptions::new());
    match result {
        Err(LottieFrameError::AcquisitionFailed { path, .. }) => {
            assert!(path.ends_with("a_3.png"), "Unexpected path: {}", path.display());
        }
        other => panic!("Expected AcquisitionFailed, got {other:?}"),
    }
}

#[test]
fn empty_directory_is_rejected() {
    let input = tempfile::tempdir().expect("Failed to create temp dir");
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(input.path().join("notes.txt"), "not a frame").unwrap();

    let result = lottieframe::convert(input.path(), output.path(), &ConversionOptions::new());
    assert!(matches!(result, Err(LottieFrameError::AcquisitionFailed { .. })));
}

#[test]
fn missing_input_is_rejected() {
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let result = lottieframe::convert(
        output.path().join("does-not-exist"),
        output.path(),
        &ConversionOptions::new(),
    );
    assert!(matches!(result, Err(LottieFrameError::AcquisitionFailed { .. })));
}

#[test]
fn upsampling_writes_nothing() {
    let input = tempfile::tempdir().expect("Failed to create temp dir");
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    write_sequence(input.path(), 3, 8, 8);

    let options = ConversionOptions::new()
        .with_original_frame_rate(12.0)
        .unwrap()
        .with_target_frame_rate(24.0)
        .unwrap()
        .with_embed_mode(EmbedMode::External);
    let result = lottieframe::convert(input.path(), output.path(), &options);

    assert!(matches!(result, Err(LottieFrameError::InvalidConfiguration(_))));
    assert_eq!(fs::read_dir(output.path()).unwrap().count(), 0);
}

#[test]
fn cancelled_conversion_stops() {
    let input = tempfile::tempdir().expect("Failed to create temp dir");
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    write_sequence(input.path(), 3, 8, 8);

    let token = CancellationToken::new();
    token.cancel();
    let options = ConversionOptions::new().with_cancellation(token);

    let result = lottieframe::convert(input.path(), output.path(), &options);
    assert!(matches!(result, Err(LottieFrameError::Cancelled)));
}

#[test]
fn failed_frame_leaves_no_partial_output() {
    let input = tempfile::tempdir().expect("Failed to create temp dir");
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    write_sequence(input.path(), 4, 12, 12);

    write_truncated_frame(input.path(), "frame_2.png");

    let options = ConversionOptions::new()
        .with_embed_mode(EmbedMode::External)
        .with_name("broken");
    let result = lottieframe::convert(input.path(), output.path(), &options);

    match result {
        Err(LottieFrameError::AssetEncodingFailed { original_index, .. }) => {
            assert_eq!(original_index, 2);
        }
        other => panic!("Expected AssetEncodingFailed, got {other:?}"),
    }
    assert!(!output.path().join("broken.json").exists());
    assert_eq!(fs::read_dir(output.path()).unwrap().count(), 0);
}

#[test]
fn failed_run_keeps_files_it_did_not_write() {
    let input = tempfile::tempdir().expect("Failed to create temp dir");
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    write_sequence(input.path(), 4, 12, 12);
    write_truncated_frame(input.path(), "frame_0.png");

    // Left over from an earlier export into the same directory.
    fs::write(output.path().join("frame_00000.png"), b"earlier asset 0").unwrap();
    fs::write(output.path().join("frame_00007.png"), b"earlier asset 7").unwrap();

    let options = ConversionOptions::new()
        .with_embed_mode(EmbedMode::External)
        .with_name("broken");
    let result = lottieframe::convert(input.path(), output.path(), &options);

    match result {
        Err(LottieFrameError::AssetEncodingFailed { original_index, .. }) => {
            assert_eq!(original_index, 0);
        }
        other => panic!("Expected AssetEncodingFailed, got {other:?}"),
    }

    assert_eq!(fs::read(output.path().join("frame_00000.png")).unwrap(), b"earlier asset 0");
    assert_eq!(fs::read(output.path().join("frame_00007.png")).unwrap(), b"earlier asset 7");
    for index in 1..4 {
        assert!(!output.path().join(format!("frame_{index:05}.png")).exists());
    }
    assert!(!output.path().join("broken.json").exists());
    assert_eq!(fs::read_dir(output.path()).unwrap().count(), 2);
}

#[test]
fn external_assets_into_input_directory_are_rejected() {
    let input = tempfile::tempdir().expect("Failed to create temp dir");
    write_sequence(input.path(), 3, 8, 8);
    let before = fs::read_dir(input.path()).unwrap().count();

    let options = ConversionOptions::new().with_embed_mode(EmbedMode::External);
    let result = lottieframe::convert(input.path(), input.path().join("."), &options);

    assert!(matches!(result, Err(LottieFrameError::InvalidConfiguration(_))));
    assert_eq!(fs::read_dir(input.path()).unwrap().count(), before);
}
