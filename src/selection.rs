//! Temporal down-sampling.
//!
//! [`select_frames`] decides which source frames survive when an animation
//! is played back at a lower frame rate than it was captured at. Playback
//! speed is preserved: dropping from 30 fps to 15 fps keeps every second
//! frame, dropping from 30 fps to 12 fps keeps frames `0, 2, 5, 7, 10, ...`.
//!
//! Frame rates are carried as reduced rationals so that the stride is
//! computed exactly, without the drift a floating-point accumulator picks
//! up over long sequences.
//!
//! # Example
//!
//! ```
//! use lottieframe::{FrameRate, select_frames};
//!
//! let selected = select_frames(121, FrameRate::from_fps(30.0)?, FrameRate::from_fps(15.0)?)?;
//! assert_eq!(selected.len(), 61);
//! assert_eq!(selected[1].original_index, 2);
//! # Ok::<(), lottieframe::LottieFrameError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::Serialize;

use crate::error::LottieFrameError;

/// Denominator used when converting a decimal frame rate to a rational.
const FPS_PRECISION: u64 = 1000;

/// Rate assumed for image sequences when no rate is configured at all.
pub const DEFAULT_FRAME_RATE: FrameRate = FrameRate {
    numerator: 30,
    denominator: 1,
};

/// A frame rate expressed as `numerator / denominator` frames per second.
///
/// Always strictly positive and stored in lowest terms, so two equal rates
/// compare equal regardless of how they were constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRate {
    numerator: u64,
    denominator: u64,
}

impl FrameRate {
    /// Build a frame rate from an exact fraction such as `30000 / 1001`.
    ///
    /// # Errors
    ///
    /// Returns [`LottieFrameError::InvalidConfiguration`] if either part is
    /// zero.
    pub fn new(numerator: u64, denominator: u64) -> Result<Self, LottieFrameError> {
        if numerator == 0 || denominator == 0 {
            return Err(LottieFrameError::invalid(format!(
                "frame rate {numerator}/{denominator} must be positive"
            )));
        }
        let divisor = gcd(numerator, denominator);
        Ok(Self {
            numerator: numerator / divisor,
            denominator: denominator / divisor,
        })
    }

    /// Build a frame rate from a decimal value, keeping three decimal places.
    ///
    /// # Errors
    ///
    /// Returns [`LottieFrameError::InvalidConfiguration`] for values that
    /// are not finite or round to zero.
    pub fn from_fps(frames_per_second: f64) -> Result<Self, LottieFrameError> {
        if !frames_per_second.is_finite() || frames_per_second <= 0.0 {
            return Err(LottieFrameError::invalid(format!(
                "frame rate must be a positive number, got {frames_per_second}"
            )));
        }
        let scaled = (frames_per_second * FPS_PRECISION as f64).round();
        if scaled < 1.0 || scaled > u32::MAX as f64 {
            return Err(LottieFrameError::invalid(format!(
                "frame rate {frames_per_second} is out of range"
            )));
        }
        Self::new(scaled as u64, FPS_PRECISION)
    }

    pub fn numerator(self) -> u64 {
        self.numerator
    }

    pub fn denominator(self) -> u64 {
        self.denominator
    }

    /// The rate as frames per second.
    pub fn as_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

impl Display for FrameRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{:.3}", self.as_f64())
        }
    }
}

/// A source frame chosen for inclusion in the animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SelectedFrame {
    /// Position of the frame in the acquired sequence.
    pub original_index: usize,
    /// Position of the frame in the output animation.
    pub output_index: usize,
}

/// Ratio between the original and target rate (`original / target`).
pub fn skip_ratio(original: FrameRate, target: FrameRate) -> f64 {
    original.as_f64() / target.as_f64()
}

/// Choose the frames to keep when resampling `frame_count` frames from
/// `original` to `target` frames per second.
///
/// The `k`-th selected frame is `floor(k * original / target)`; selection
/// stops at the first index past the end of the sequence. Index `0` is
/// always selected and `output_index` is the rank of each pick.
///
/// # Errors
///
/// Returns [`LottieFrameError::InvalidConfiguration`] when `frame_count` is
/// zero or `target` is faster than `original`. Upsampling would repeat
/// source frames, which this tool does not do.
pub fn select_frames(
    frame_count: usize,
    original: FrameRate,
    target: FrameRate,
) -> Result<Vec<SelectedFrame>, LottieFrameError> {
    if frame_count == 0 {
        return Err(LottieFrameError::invalid("no frames to select from"));
    }

    // stride = step_numerator / step_denominator = original / target
    let step_numerator = u128::from(original.numerator) * u128::from(target.denominator);
    let step_denominator = u128::from(original.denominator) * u128::from(target.numerator);

    if step_numerator < step_denominator {
        return Err(LottieFrameError::invalid(format!(
            "target frame rate {target} exceeds the original frame rate {original}"
        )));
    }

    log::debug!(
        "Selecting frames from {frame_count} at {original} fps -> {target} fps (skip ratio {:.3})",
        skip_ratio(original, target),
    );

    let limit = frame_count as u128;
    let mut selected = Vec::new();
    let mut rank: u128 = 0;
    loop {
        let index = rank * step_numerator / step_denominator;
        if index >= limit {
            break;
        }
        selected.push(SelectedFrame {
            original_index: index as usize,
            output_index: selected.len(),
        });
        rank += 1;
    }

    Ok(selected)
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let remainder = a % b;
        a = b;
        b = remainder;
    }
    a
}
