//! Internal utility functions.
//!
//! Pixel-buffer copying, file naming, and file-name ordering shared by the
//! acquisition and codec stages.

use std::cmp::Ordering;

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

use crate::selection::FrameRate;

/// Copy pixel data from an FFmpeg video frame into a tightly-packed buffer.
///
/// FFmpeg rows are often padded (stride > width × bytes per pixel); the
/// padding is dropped so the result can go straight into
/// [`image::ImageBuffer::from_raw`].
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_length = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == row_length {
        data[..row_length * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_length * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_length]);
        }
        buffer
    }
}

/// Convert an FFmpeg rational to a frame rate, if it is positive.
pub(crate) fn rational_to_frame_rate(rate: Rational) -> Option<FrameRate> {
    let (numerator, denominator) = (rate.numerator(), rate.denominator());
    if numerator <= 0 || denominator <= 0 {
        return None;
    }
    FrameRate::new(numerator as u64, denominator as u64).ok()
}

/// File name for the `index`-th frame decoded from a video.
pub(crate) fn video_frame_name(index: usize) -> String {
    format!("frame_{index:06}.png")
}

/// File name for the external asset of the frame at `output_index`.
pub(crate) fn asset_file_name(output_index: usize, extension: &str) -> String {
    format!("frame_{output_index:05}.{extension}")
}

/// Compare file names so that embedded numbers sort by value:
/// `frame2.png` comes before `frame10.png`.
pub(crate) fn natural_cmp(left: &str, right: &str) -> Ordering {
    let mut left_chars = left.chars().peekable();
    let mut right_chars = right.chars().peekable();

    loop {
        match (left_chars.peek().copied(), right_chars.peek().copied()) {
            (None, None) => return left.cmp(right),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let left_number = take_digits(&mut left_chars);
                let right_number = take_digits(&mut right_chars);
                let left_trimmed = left_number.trim_start_matches('0');
                let right_trimmed = right_number.trim_start_matches('0');
                let ordering = left_trimmed
                    .len()
                    .cmp(&right_trimmed.len())
                    .then_with(|| left_trimmed.cmp(right_trimmed));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(l), Some(r)) => {
                if l != r {
                    return l.cmp(&r);
                }
                left_chars.next();
                right_chars.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        digits.push(c);
        chars.next();
    }
    digits
}
