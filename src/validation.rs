//! Pre-flight validation.
//!
//! [`validate_frames`] and [`validate_video`] look at a source and the
//! requested options before any encoding happens and collect everything
//! worth telling the user into a [`ValidationReport`]. Errors in the report
//! correspond to conditions [`convert`](crate::convert) would fail on.
//!
//! # Example
//!
//! ```no_run
//! use lottieframe::ConversionOptions;
//!
//! let frames = lottieframe::scan_frames("renders/")?;
//! let report = lottieframe::validate_frames(&frames, None, &ConversionOptions::new());
//! print!("{report}");
//! # Ok::<(), lottieframe::LottieFrameError>(())
//! ```

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::acquisition::Frame;
use crate::configuration::ConversionOptions;
use crate::geometry::resolve_geometry;
use crate::pipeline::resolve_frame_rates;
use crate::selection::{FrameRate, skip_ratio};
use crate::video::VideoMetadata;

/// Canvas area above which players tend to struggle.
const LARGE_CANVAS_PIXELS: u64 = 4096 * 4096;

/// Frame count above which embedded documents get unwieldy.
const LARGE_FRAME_COUNT: usize = 1000;

/// Findings from validating a source against conversion options.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Informational notices (not problems).
    pub info: Vec<String>,
    /// Non-fatal issues that may affect the output.
    pub warnings: Vec<String>,
    /// Issues that will make conversion fail.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// `true` if no errors were found. Warnings do not count.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn issue_count(&self) -> usize {
        self.info.len() + self.warnings.len() + self.errors.len()
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for item in &self.info {
            writeln!(f, "[INFO] {item}")?;
        }
        for item in &self.warnings {
            writeln!(f, "[WARN] {item}")?;
        }
        for item in &self.errors {
            writeln!(f, "[ERROR] {item}")?;
        }
        if self.issue_count() == 0 {
            writeln!(f, "No issues found.")?;
        }
        Ok(())
    }
}

/// Validate an image sequence from [`scan_frames`](crate::scan_frames).
pub fn validate_frames(
    frames: &[Frame],
    source_rate: Option<FrameRate>,
    options: &ConversionOptions,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    let Some(first) = frames.first() else {
        report.errors.push("Source contains no frames".to_string());
        return report;
    };

    let mut sizes: BTreeMap<(u32, u32), usize> = BTreeMap::new();
    for frame in frames {
        *sizes.entry((frame.width, frame.height)).or_default() += 1;
    }
    if sizes.len() > 1 {
        let summary: Vec<String> = sizes
            .iter()
            .map(|((width, height), count)| format!("{count}×{width}x{height}"))
            .collect();
        report.errors.push(format!(
            "Frames have mixed dimensions ({}); all frames must match the first",
            summary.join(", "),
        ));
    }

    check_source(
        &mut report,
        frames.len(),
        first.width,
        first.height,
        source_rate,
        options,
    );
    report
}

/// Validate a video from [`probe_video`](crate::probe_video), using the
/// estimated frame count.
pub fn validate_video(metadata: &VideoMetadata, options: &ConversionOptions) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.info.push(format!(
        "Video: {} {}x{} @ {} fps, ~{} frames",
        metadata.codec,
        metadata.width,
        metadata.height,
        metadata.frame_rate,
        metadata.estimated_frame_count,
    ));
    if metadata.estimated_frame_count == 0 {
        report
            .warnings
            .push("Video duration is unknown; frame count will only be known after decoding".to_string());
    }
    check_source(
        &mut report,
        metadata.estimated_frame_count.max(1) as usize,
        metadata.width,
        metadata.height,
        Some(metadata.frame_rate),
        options,
    );
    report
}

fn check_source(
    report: &mut ValidationReport,
    frame_count: usize,
    width: u32,
    height: u32,
    source_rate: Option<FrameRate>,
    options: &ConversionOptions,
) {
    let (original, target) = resolve_frame_rates(source_rate, options);
    let ratio = skip_ratio(original, target);
    if ratio < 1.0 {
        report.errors.push(format!(
            "Target frame rate {target} fps exceeds the source rate {original} fps"
        ));
    } else {
        let kept = (frame_count as f64 / ratio).ceil() as usize;
        report.info.push(format!(
            "{frame_count} frames at {original} fps -> {kept} frames at {target} fps"
        ));
        if kept > LARGE_FRAME_COUNT {
            report.warnings.push(format!(
                "{kept} frames will be written; consider a lower target frame rate"
            ));
        }
    }

    if let Some(crop) = options.crop() {
        if crop.width.is_some_and(|w| w > width) || crop.height.is_some_and(|h| h > height) {
            report.warnings.push(format!(
                "Crop is larger than the {width}x{height} source and will be clamped"
            ));
        }
    }

    match resolve_geometry(width, height, options.crop(), options.scale()) {
        Ok(geometry) => {
            report.info.push(format!(
                "Canvas {}x{} (crop {}x{} at {},{})",
                geometry.output_width,
                geometry.output_height,
                geometry.crop_width,
                geometry.crop_height,
                geometry.crop_offset_x,
                geometry.crop_offset_y,
            ));
            let area = u64::from(geometry.output_width) * u64::from(geometry.output_height);
            if area > LARGE_CANVAS_PIXELS {
                report.warnings.push(format!(
                    "Canvas {}x{} is very large for a web animation",
                    geometry.output_width, geometry.output_height
                ));
            }
        }
        Err(error) => report.errors.push(error.to_string()),
    }
}
