//! Frame acquisition.
//!
//! Turns an input path into an ordered list of [`Frame`]s. Image
//! directories are listed, ordered by file name (numbers compared by
//! value), and probed for dimensions without decoding pixels. Videos are
//! decoded into a scratch directory first by [`extract_video_frames`](crate::extract_video_frames)
//! and then listed the same way.
//!
//! # Example
//!
//! ```no_run
//! let frames = lottieframe::list_frames("renders/")?;
//! println!("{} frames, first is {}x{}", frames.len(), frames[0].width, frames[0].height);
//! # Ok::<(), lottieframe::LottieFrameError>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::LottieFrameError;
use crate::utilities::natural_cmp;

/// File extensions recognised as still images.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "gif", "tif", "tiff"];

/// One acquired source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Position in the acquired sequence.
    pub original_index: usize,
    pub width: u32,
    pub height: u32,
    pub path: PathBuf,
}

/// What kind of input a path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    ImageDirectory,
    Video,
}

impl SourceKind {
    /// Directories are image sequences; any other existing file is treated
    /// as a video.
    ///
    /// # Errors
    ///
    /// Returns [`LottieFrameError::AcquisitionFailed`] if the path does not
    /// exist.
    pub fn detect<P: AsRef<Path>>(path: P) -> Result<Self, LottieFrameError> {
        let path = path.as_ref();
        if path.is_dir() {
            Ok(SourceKind::ImageDirectory)
        } else if path.is_file() {
            Ok(SourceKind::Video)
        } else {
            Err(LottieFrameError::acquisition(path, "input does not exist"))
        }
    }
}

/// List and probe every image in `directory`, in natural file-name order.
///
/// Unlike [`list_frames`], frames may have differing dimensions.
///
/// # Errors
///
/// Returns [`LottieFrameError::AcquisitionFailed`] if the directory cannot
/// be read, contains no images, or an image header cannot be parsed.
pub fn scan_frames<P: AsRef<Path>>(directory: P) -> Result<Vec<Frame>, LottieFrameError> {
    let directory = directory.as_ref();
    log::debug!("Scanning frames in {}", directory.display());

    let entries = fs::read_dir(directory)
        .map_err(|error| LottieFrameError::acquisition(directory, error.to_string()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|error| LottieFrameError::acquisition(directory, error.to_string()))?;
        let path = entry.path();
        if path.is_file() && is_image_path(&path) {
            paths.push(path);
        }
    }

    if paths.is_empty() {
        return Err(LottieFrameError::acquisition(
            directory,
            "directory contains no image files",
        ));
    }

    paths.sort_by(|left, right| natural_cmp(&file_name(left), &file_name(right)));

    paths
        .into_iter()
        .enumerate()
        .map(|(original_index, path)| {
            let (width, height) = image::image_dimensions(&path)
                .map_err(|error| LottieFrameError::acquisition(&path, error.to_string()))?;
            Ok(Frame {
                original_index,
                width,
                height,
                path,
            })
        })
        .collect()
}

/// List the frames in `directory`, requiring every image to have the same
/// dimensions as the first.
///
/// Crop and scale are resolved once from the first frame, so a sequence of
/// mixed sizes is rejected here rather than producing a distorted document.
///
/// # Errors
///
/// Everything [`scan_frames`] returns, plus
/// [`LottieFrameError::AcquisitionFailed`] for mixed dimensions.
pub fn list_frames<P: AsRef<Path>>(directory: P) -> Result<Vec<Frame>, LottieFrameError> {
    let frames = scan_frames(directory)?;
    ensure_uniform_dimensions(&frames)?;
    log::debug!(
        "Acquired {} frames of {}x{}",
        frames.len(),
        frames[0].width,
        frames[0].height,
    );
    Ok(frames)
}

/// Fail on the first frame whose size differs from the first frame's.
pub(crate) fn ensure_uniform_dimensions(frames: &[Frame]) -> Result<(), LottieFrameError> {
    let Some(first) = frames.first() else {
        return Ok(());
    };
    match frames
        .iter()
        .find(|frame| (frame.width, frame.height) != (first.width, first.height))
    {
        Some(odd) => Err(LottieFrameError::acquisition(
            &odd.path,
            format!(
                "frame is {}x{} but the sequence starts at {}x{}",
                odd.width, odd.height, first.width, first.height
            ),
        )),
        None => Ok(()),
    }
}

fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(extension))
        })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
