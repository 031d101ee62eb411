//! Grayscale luminance planes.
//!
//! Uses ITU-R BT.601 luma weights, the convention of RGB-to-gray conversion in
//! camera pipelines, so thresholds tuned on such pipelines carry over.
//!
//! ## Bit Depth Support
//!
//! - **u8 (8-bit)**: luminance is rounded to the nearest 8-bit level, as an
//!   8-bit gray image would store it
//! - **f32 (float)**: luminance keeps full precision

use ndarray::{Array2, ArrayView3, Axis};

use super::core::check_not_empty;
use crate::error::{FilterError, Result};

/// ITU-R BT.601 luma coefficients
const LUMA_R: f64 = 0.299;
const LUMA_G: f64 = 0.587;
const LUMA_B: f64 = 0.114;

#[inline]
fn luma(r: f64, g: f64, b: f64) -> f64 {
    LUMA_R * r + LUMA_G * g + LUMA_B * b
}

fn unsupported(channels: usize) -> FilterError {
    FilterError::UnsupportedChannels {
        channels,
        expected: "1, 3 or 4",
    }
}

/// Luminance plane of a u8 image.
///
/// Grayscale input is used directly; RGB/RGBA input is weighted (alpha ignored).
pub fn gray_plane_u8(input: ArrayView3<u8>) -> Result<Array2<f64>> {
    let (height, width, channels) = input.dim();
    check_not_empty(height, width)?;

    match channels {
        1 => Ok(input.index_axis(Axis(2), 0).mapv(|v| v as f64)),
        3 | 4 => Ok(Array2::from_shape_fn((height, width), |(y, x)| {
            let r = input[[y, x, 0]] as f64;
            let g = input[[y, x, 1]] as f64;
            let b = input[[y, x, 2]] as f64;
            luma(r, g, b).round().clamp(0.0, 255.0)
        })),
        _ => Err(unsupported(channels)),
    }
}

/// Luminance plane of an f32 image.
pub fn gray_plane_f32(input: ArrayView3<f32>) -> Result<Array2<f64>> {
    let (height, width, channels) = input.dim();
    check_not_empty(height, width)?;

    match channels {
        1 => Ok(input.index_axis(Axis(2), 0).mapv(|v| v as f64)),
        3 | 4 => Ok(Array2::from_shape_fn((height, width), |(y, x)| {
            let r = input[[y, x, 0]] as f64;
            let g = input[[y, x, 1]] as f64;
            let b = input[[y, x, 2]] as f64;
            luma(r, g, b)
        })),
        _ => Err(unsupported(channels)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_gray_u8_weights_and_rounding() {
        let mut img = Array3::<u8>::zeros((1, 3, 3));
        img[[0, 0, 0]] = 255; // pure red
        img[[0, 1, 1]] = 255; // pure green
        img[[0, 2, 2]] = 255; // pure blue

        let gray = gray_plane_u8(img.view()).unwrap();
        assert_eq!(gray[[0, 0]], 76.0); // 76.245
        assert_eq!(gray[[0, 1]], 150.0); // 149.685
        assert_eq!(gray[[0, 2]], 29.0); // 29.07
    }

    #[test]
    fn test_gray_rgba_ignores_alpha() {
        let mut img = Array3::<u8>::from_elem((2, 2, 4), 100);
        img[[0, 0, 3]] = 0;
        let gray = gray_plane_u8(img.view()).unwrap();
        assert!(gray.iter().all(|&v| v == 100.0));
    }

    #[test]
    fn test_gray_single_channel_passthrough() {
        let mut img = Array3::<f32>::zeros((2, 2, 1));
        img[[1, 1, 0]] = 0.25;
        let gray = gray_plane_f32(img.view()).unwrap();
        assert_eq!(gray[[1, 1]], 0.25);
    }

    #[test]
    fn test_gray_rejects_two_channels() {
        let img = Array3::<f32>::zeros((2, 2, 2));
        assert!(gray_plane_f32(img.view()).is_err());
    }
}
