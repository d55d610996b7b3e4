//! Error types for the `lottieframe` crate.
//!
//! [`LottieFrameError`] is returned by every fallible operation: frame
//! acquisition, planning, asset encoding, and document persistence. The
//! three domain failures ([`InvalidConfiguration`](LottieFrameError::InvalidConfiguration),
//! [`AcquisitionFailed`](LottieFrameError::AcquisitionFailed), and
//! [`AssetEncodingFailed`](LottieFrameError::AssetEncodingFailed)) are all
//! fatal; nothing in the crate retries.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use serde_json::Error as JsonError;
use thiserror::Error;

/// The unified error type for all `lottieframe` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LottieFrameError {
    /// Numeric inputs are missing, out of range, or contradict each other
    /// (zero frames, non-positive frame rates, empty crop, ...).
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The frame source is missing, unreadable, empty, or inconsistent.
    #[error("Failed to acquire frames from {path}: {reason}")]
    AcquisitionFailed {
        /// The image directory or video file that was being read.
        path: PathBuf,
        /// Underlying reason acquisition failed.
        reason: String,
    },

    /// The image codec failed to produce an asset for one frame.
    #[error("Failed to encode asset for source frame {original_index}: {reason}")]
    AssetEncodingFailed {
        /// Position of the failing frame in the acquired sequence.
        original_index: usize,
        /// Upstream codec message.
        reason: String,
    },

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The animation document could not be serialized.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] JsonError),

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<FfmpegError> for LottieFrameError {
    fn from(error: FfmpegError) -> Self {
        LottieFrameError::FfmpegError(error.to_string())
    }
}

impl LottieFrameError {
    /// Shorthand for building an [`InvalidConfiguration`](LottieFrameError::InvalidConfiguration).
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        LottieFrameError::InvalidConfiguration(message.into())
    }

    /// Shorthand for building an [`AcquisitionFailed`](LottieFrameError::AcquisitionFailed).
    pub(crate) fn acquisition(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        LottieFrameError::AcquisitionFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
