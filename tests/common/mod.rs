//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::path::Path;

use image::{Rgb, RgbImage};

pub const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

/// Shade used for the solid frame at `index`, so tests can tell which
/// source frame ended up in which asset.
pub fn shade(index: usize) -> u8 {
    (index * 40 % 256) as u8
}

/// Write `count` solid-colour PNGs named `frame_<n>.png` into `directory`.
pub fn write_sequence(directory: &Path, count: usize, width: u32, height: u32) {
    for index in 0..count {
        write_frame(directory, &format!("frame_{index}.png"), width, height, shade(index));
    }
}

pub fn write_frame(directory: &Path, name: &str, width: u32, height: u32, value: u8) {
    RgbImage::from_pixel(width, height, Rgb([value, 255 - value, 128]))
        .save(directory.join(name))
        .expect("Failed to write test frame");
}
