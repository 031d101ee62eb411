//! Core utilities shared by the mask filters.
//!
//! This module provides:
//! - Threshold bands
//! - Kernel construction (bump and vertical edge kernels)
//! - Row/column correlation with reflect-101 borders
//! - Response normalization
//! - Conversions between images, f64 planes and masks
//!
//! All arithmetic runs on `Array2<f64>` planes so that derivative responses
//! keep their sign and full range regardless of the input bit depth.

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{FilterError, Result};

// ============================================================================
// Threshold Bands
// ============================================================================

/// Closed threshold interval `[lo, hi]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Band {
    pub lo: f64,
    pub hi: f64,
}

impl Band {
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    /// `lo <= v <= hi`
    #[inline]
    pub fn contains(&self, v: f64) -> bool {
        v >= self.lo && v <= self.hi
    }

    /// `lo < v < hi`
    #[inline]
    pub fn contains_strict(&self, v: f64) -> bool {
        v > self.lo && v < self.hi
    }

    /// Reject bands with non-finite bounds or `lo > hi`.
    pub fn validate(&self, name: &'static str) -> Result<()> {
        if !self.lo.is_finite() || !self.hi.is_finite() || self.lo > self.hi {
            return Err(FilterError::InvalidThreshold {
                name,
                lo: self.lo,
                hi: self.hi,
            });
        }
        Ok(())
    }
}

impl From<(f64, f64)> for Band {
    fn from((lo, hi): (f64, f64)) -> Self {
        Self { lo, hi }
    }
}

// ============================================================================
// Kernels
// ============================================================================

/// Build the 1×3k bump kernel `[-1]×k, [2]×k, [-1]×k`.
///
/// Responds to stripes about `k` pixels wide that differ from both flanks.
pub fn bump_kernel(k: usize) -> Result<Vec<f64>> {
    if k == 0 {
        return Err(FilterError::InvalidKernelSize {
            ksize: k,
            reason: "bump width must be at least 1",
        });
    }

    let mut kernel = Vec::with_capacity(3 * k);
    kernel.extend(std::iter::repeat(-1.0).take(k));
    kernel.extend(std::iter::repeat(2.0).take(k));
    kernel.extend(std::iter::repeat(-1.0).take(k));
    Ok(kernel)
}

/// The 5×1 vertical edge kernel `[-1, -1, 0, 1, 1]` (applied down columns).
pub fn vertical_edge_kernel() -> [f64; 5] {
    [-1.0, -1.0, 0.0, 1.0, 1.0]
}

// ============================================================================
// Correlation
// ============================================================================

/// Reflect-101 index for border handling: `gfedcb|abcdefgh|gfedcba`.
#[inline]
pub(crate) fn reflect_101(i: isize, size: usize) -> usize {
    if size == 1 {
        return 0;
    }
    let last = size as isize - 1;
    let mut i = i;
    // Loop covers kernels longer than the image
    while i < 0 || i > last {
        if i < 0 {
            i = -i;
        }
        if i > last {
            i = 2 * last - i;
        }
    }
    i as usize
}

/// Correlate every row with a 1-D kernel (anchor at `kernel.len() / 2`).
///
/// The kernel is not flipped; for the symmetric and sign-agnostic kernels
/// used here that matches a 2-D filter call.
pub fn correlate_rows(plane: &Array2<f64>, kernel: &[f64]) -> Array2<f64> {
    let (height, width) = plane.dim();
    let anchor = (kernel.len() / 2) as isize;
    let mut output = Array2::<f64>::zeros((height, width));

    output
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(y, mut row)| {
            for x in 0..width {
                let mut sum = 0.0f64;
                for (ki, &kv) in kernel.iter().enumerate() {
                    let sx = reflect_101(x as isize + ki as isize - anchor, width);
                    sum += plane[[y, sx]] * kv;
                }
                row[x] = sum;
            }
        });

    output
}

/// Correlate every column with a 1-D kernel (anchor at `kernel.len() / 2`).
pub fn correlate_cols(plane: &Array2<f64>, kernel: &[f64]) -> Array2<f64> {
    let (height, width) = plane.dim();
    let anchor = (kernel.len() / 2) as isize;
    let mut output = Array2::<f64>::zeros((height, width));

    output
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(y, mut row)| {
            for x in 0..width {
                let mut sum = 0.0f64;
                for (ki, &kv) in kernel.iter().enumerate() {
                    let sy = reflect_101(y as isize + ki as isize - anchor, height);
                    sum += plane[[sy, x]] * kv;
                }
                row[x] = sum;
            }
        });

    output
}

/// Separable 2-D correlation: `row_kernel` along x, then `col_kernel` along y.
pub fn correlate_separable(
    plane: &Array2<f64>,
    row_kernel: &[f64],
    col_kernel: &[f64],
) -> Array2<f64> {
    let temp = correlate_rows(plane, row_kernel);
    correlate_cols(&temp, col_kernel)
}

// ============================================================================
// Normalization
// ============================================================================

/// Largest value across a set of planes (`0.0` for empty input).
pub fn max_value(planes: &[Array2<f64>]) -> f64 {
    planes
        .iter()
        .flat_map(|p| p.iter())
        .fold(0.0f64, |acc, &v| acc.max(v))
}

/// Common maximum of `planes`, usable as a normalization divisor.
///
/// Fails with `DegenerateInput` unless it is a positive finite number, so
/// flat images and `Inf` pixels are reported instead of yielding empty masks.
pub fn usable_max(planes: &[Array2<f64>], response: &'static str) -> Result<f64> {
    let max = max_value(planes);
    if !(max > 0.0 && max.is_finite()) {
        return Err(FilterError::DegenerateInput { response });
    }
    Ok(max)
}

/// Divide all planes by their common maximum.
///
/// Returns the maximum used. Fails with `DegenerateInput` when it is not a
/// positive finite number, which is the case for flat images.
pub fn normalize_planes(planes: &mut [Array2<f64>], response: &'static str) -> Result<f64> {
    let max = usable_max(planes, response)?;
    for plane in planes.iter_mut() {
        plane.mapv_inplace(|v| v / max);
    }
    Ok(max)
}

/// Divide a single plane by its maximum.
pub fn normalize_by_max(plane: Array2<f64>, response: &'static str) -> Result<Array2<f64>> {
    let mut planes = [plane];
    normalize_planes(&mut planes, response)?;
    let [plane] = planes;
    Ok(plane)
}

// ============================================================================
// Image / Plane Conversion
// ============================================================================

/// Fail with `EmptyImage` when either spatial dimension is zero.
pub fn check_not_empty(height: usize, width: usize) -> Result<()> {
    if height == 0 || width == 0 {
        return Err(FilterError::EmptyImage { height, width });
    }
    Ok(())
}

/// Number of color channels to process for a 1, 3 or 4 channel image.
///
/// Alpha (4th channel) is never part of a response.
pub fn color_channel_count(channels: usize) -> Result<usize> {
    match channels {
        1 => Ok(1),
        3 | 4 => Ok(3),
        _ => Err(FilterError::UnsupportedChannels {
            channels,
            expected: "1, 3 or 4",
        }),
    }
}

/// Split a u8 image into one f64 plane per color channel.
pub fn color_planes_u8(input: ArrayView3<u8>) -> Result<Vec<Array2<f64>>> {
    let (height, width, channels) = input.dim();
    check_not_empty(height, width)?;
    let color_channels = color_channel_count(channels)?;

    Ok((0..color_channels)
        .map(|c| input.index_axis(Axis(2), c).mapv(|v| v as f64))
        .collect())
}

/// Split an f32 image into one f64 plane per color channel.
pub fn color_planes_f32(input: ArrayView3<f32>) -> Result<Vec<Array2<f64>>> {
    let (height, width, channels) = input.dim();
    check_not_empty(height, width)?;
    let color_channels = color_channel_count(channels)?;

    Ok((0..color_channels)
        .map(|c| input.index_axis(Axis(2), c).mapv(|v| v as f64))
        .collect())
}

/// Take the only plane of a single-channel u8 image.
pub fn single_plane_u8(input: ArrayView3<u8>) -> Result<Array2<f64>> {
    let channels = input.dim().2;
    if channels != 1 {
        return Err(FilterError::UnsupportedChannels {
            channels,
            expected: "1",
        });
    }
    plane_from_u8(input.index_axis(Axis(2), 0))
}

/// Take the only plane of a single-channel f32 image.
pub fn single_plane_f32(input: ArrayView3<f32>) -> Result<Array2<f64>> {
    let channels = input.dim().2;
    if channels != 1 {
        return Err(FilterError::UnsupportedChannels {
            channels,
            expected: "1",
        });
    }
    plane_from_f32(input.index_axis(Axis(2), 0))
}

/// Convert a u8 channel to an f64 plane.
pub fn plane_from_u8(channel: ArrayView2<u8>) -> Result<Array2<f64>> {
    let (height, width) = channel.dim();
    check_not_empty(height, width)?;
    Ok(channel.mapv(|v| v as f64))
}

/// Convert an f32 channel to an f64 plane.
pub fn plane_from_f32(channel: ArrayView2<f32>) -> Result<Array2<f64>> {
    let (height, width) = channel.dim();
    check_not_empty(height, width)?;
    Ok(channel.mapv(|v| v as f64))
}

/// Build an `(height, width, channels)` image from a flat row-major buffer.
pub fn image_from_flat<T: Clone>(
    data: &[T],
    height: usize,
    width: usize,
    channels: usize,
) -> Result<Array3<T>> {
    let expected = height
        .checked_mul(width)
        .and_then(|n| n.checked_mul(channels))
        .ok_or(FilterError::ShapeMismatch {
            expected: usize::MAX,
            actual: data.len(),
        })?;
    Array3::from_shape_vec((height, width, channels), data.to_vec()).map_err(|_| {
        FilterError::ShapeMismatch {
            expected,
            actual: data.len(),
        }
    })
}

// ============================================================================
// Mask Output
// ============================================================================

/// Copy a single `{0,1}` mask into `channels` channels, scaled by `on`.
pub fn replicate_mask(mask: &Array2<u8>, channels: usize, on: u8) -> Array3<u8> {
    let (height, width) = mask.dim();
    Array3::from_shape_fn((height, width, channels), |(y, x, _)| {
        if mask[[y, x]] != 0 {
            on
        } else {
            0
        }
    })
}

/// Stack one `{0,1}` mask per channel, scaled by `on`.
pub fn stack_masks(masks: &[Array2<u8>], on: u8) -> Array3<u8> {
    let (height, width) = masks.first().map(|m| m.dim()).unwrap_or((0, 0));
    Array3::from_shape_fn((height, width, masks.len()), |(y, x, c)| {
        if masks[c][[y, x]] != 0 {
            on
        } else {
            0
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_bump_kernel_layout() {
        assert_eq!(
            bump_kernel(2).unwrap(),
            vec![-1.0, -1.0, 2.0, 2.0, -1.0, -1.0]
        );
        assert!(matches!(
            bump_kernel(0),
            Err(FilterError::InvalidKernelSize { ksize: 0, .. })
        ));
    }

    #[test]
    fn test_bump_kernel_sums_to_zero() {
        let sum: f64 = bump_kernel(4).unwrap().iter().sum();
        assert_eq!(sum, 0.0);
    }

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(6, 5), 2);
        assert_eq!(reflect_101(2, 5), 2);
        assert_eq!(reflect_101(-7, 3), 1);
        assert_eq!(reflect_101(3, 1), 0);
    }

    #[test]
    fn test_correlate_rows_flat_is_zero_for_bump() {
        let plane = Array2::<f64>::from_elem((4, 12), 7.0);
        let k = bump_kernel(3).unwrap();
        let out = correlate_rows(&plane, &k);
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_correlate_rows_centered_stripe() {
        // Stripe of width 3 at x = 4..7 in a 1x11 row
        let mut plane = Array2::<f64>::zeros((1, 11));
        for x in 4..7 {
            plane[[0, x]] = 10.0;
        }
        let out = correlate_rows(&plane, &bump_kernel(3).unwrap());
        // Kernel center (index 4) lands on x = 5; the 2s cover x = 4..7
        assert_eq!(out[[0, 5]], 60.0);
    }

    #[test]
    fn test_correlate_cols_step() {
        let plane = array![[0.0], [0.0], [0.0], [1.0], [1.0], [1.0]];
        let out = correlate_cols(&plane, &vertical_edge_kernel());
        // Rows 1..=3 straddle the step
        assert_eq!(out[[0, 0]], 0.0);
        assert_eq!(out[[2, 0]], 2.0);
        assert_eq!(out[[5, 0]], 0.0);
    }

    #[test]
    fn test_normalize_planes_uses_global_max() {
        let mut planes = vec![
            array![[1.0, 2.0], [0.0, 0.0]],
            array![[4.0, 0.0], [0.0, 0.0]],
        ];
        let max = normalize_planes(&mut planes, "test").unwrap();
        assert_eq!(max, 4.0);
        assert_eq!(planes[0][[0, 1]], 0.5);
        assert_eq!(planes[1][[0, 0]], 1.0);
    }

    #[test]
    fn test_normalize_zero_is_degenerate() {
        let plane = Array2::<f64>::zeros((3, 3));
        let err = normalize_by_max(plane, "bump").unwrap_err();
        assert_eq!(err, FilterError::DegenerateInput { response: "bump" });
    }

    #[test]
    fn test_normalize_infinite_max_is_degenerate() {
        let mut plane = Array2::<f64>::from_elem((3, 3), 2.0);
        plane[[1, 1]] = f64::INFINITY;
        let err = usable_max(&[plane], "sobel").unwrap_err();
        assert_eq!(err, FilterError::DegenerateInput { response: "sobel" });
    }

    #[test]
    fn test_color_planes_drop_alpha() {
        let img = Array3::<u8>::from_elem((2, 2, 4), 9);
        let planes = color_planes_u8(img.view()).unwrap();
        assert_eq!(planes.len(), 3);

        let two = Array3::<u8>::zeros((2, 2, 2));
        assert!(matches!(
            color_planes_u8(two.view()),
            Err(FilterError::UnsupportedChannels { channels: 2, .. })
        ));
    }

    #[test]
    fn test_empty_image_rejected() {
        let img = Array3::<f32>::zeros((0, 4, 1));
        assert_eq!(
            single_plane_f32(img.view()).unwrap_err(),
            FilterError::EmptyImage {
                height: 0,
                width: 4
            }
        );
    }

    #[test]
    fn test_image_from_flat_checks_length() {
        let ok = image_from_flat(&[1u8; 12], 2, 2, 3).unwrap();
        assert_eq!(ok.dim(), (2, 2, 3));

        let err = image_from_flat(&[1u8; 11], 2, 2, 3).unwrap_err();
        assert_eq!(
            err,
            FilterError::ShapeMismatch {
                expected: 12,
                actual: 11
            }
        );
    }

    #[test]
    fn test_image_from_flat_overflowing_dims() {
        let err = image_from_flat(&[0u8; 4], usize::MAX, 2, 3).unwrap_err();
        assert_eq!(
            err,
            FilterError::ShapeMismatch {
                expected: usize::MAX,
                actual: 4
            }
        );
    }

    #[test]
    fn test_band_bounds() {
        let band = Band::new(0.5, 1.0);
        assert!(band.contains(0.5));
        assert!(band.contains(1.0));
        assert!(!band.contains_strict(0.5));
        assert!(band.contains_strict(0.75));
        assert!(Band::new(1.0, 0.5).validate("x").is_err());
        assert!(Band::new(f64::NAN, 0.5).validate("x").is_err());
    }

    #[test]
    fn test_replicate_and_stack() {
        let mask = array![[1u8, 0], [0, 1]];
        let rep = replicate_mask(&mask, 3, 255);
        assert_eq!(rep.dim(), (2, 2, 3));
        assert_eq!(rep[[0, 0, 2]], 255);
        assert_eq!(rep[[0, 1, 1]], 0);

        let other = array![[0u8, 1], [0, 0]];
        let stacked = stack_masks(&[mask, other], 1);
        assert_eq!(stacked.dim(), (2, 2, 2));
        assert_eq!(stacked[[0, 1, 1]], 1);
        assert_eq!(stacked[[0, 1, 0]], 0);
    }
}
