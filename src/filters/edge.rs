//! Sobel gradient masks: single-axis threshold and multi-criteria band filter.
//!
//! Sobel kernels are built for any odd size from binomial smoothing, the
//! same family a `CV_64F` derivative uses:
//! - size 1: derivative `[-1, 0, 1]`, no smoothing
//! - size 3: derivative `[-1, 0, 1]`, smoothing `[1, 2, 1]`
//! - size 5: derivative `[-1, -2, 0, 2, 1]`, smoothing `[1, 4, 6, 4, 1]`
//!
//! Responses are computed in f64 with reflect-101 borders.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis, Zip};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::core::{
    correlate_separable, normalize_by_max, plane_from_f32, plane_from_u8, replicate_mask,
    usable_max, Band,
};
use super::grayscale::{gray_plane_f32, gray_plane_u8};
use crate::error::{FilterError, Result};

/// Largest supported Sobel kernel size
pub const MAX_SOBEL_KSIZE: usize = 31;

/// Gradient axis of a single-axis Sobel derivative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Orientation {
    /// d/dx, responds to vertical edges
    X,
    /// d/dy, responds to horizontal edges
    Y,
}

impl FromStr for Orientation {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "x" | "X" => Ok(Orientation::X),
            "y" | "Y" => Ok(Orientation::Y),
            other => Err(FilterError::InvalidOrientation(other.to_string())),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::X => write!(f, "x"),
            Orientation::Y => write!(f, "y"),
        }
    }
}

// ============================================================================
// Sobel Kernels
// ============================================================================

fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &av) in a.iter().enumerate() {
        for (j, &bv) in b.iter().enumerate() {
            out[i + j] += av * bv;
        }
    }
    out
}

fn binomial(len: usize) -> Vec<f64> {
    let mut k = vec![1.0];
    for _ in 1..len {
        k = poly_mul(&k, &[1.0, 1.0]);
    }
    k
}

/// First-derivative and smoothing kernels for a Sobel operator of size `ksize`.
///
/// Returns `(derivative, smoothing)`.
pub fn sobel_kernels(ksize: usize) -> Result<(Vec<f64>, Vec<f64>)> {
    if ksize % 2 == 0 || ksize > MAX_SOBEL_KSIZE {
        return Err(FilterError::InvalidKernelSize {
            ksize,
            reason: "sobel size must be odd and at most 31",
        });
    }
    if ksize == 1 {
        return Ok((vec![-1.0, 0.0, 1.0], vec![1.0]));
    }

    let derivative = poly_mul(&binomial(ksize - 1), &[-1.0, 1.0]);
    let smoothing = binomial(ksize);
    Ok((derivative, smoothing))
}

/// Signed Sobel derivative of a plane along `orientation`.
pub fn sobel_plane(
    plane: &Array2<f64>,
    orientation: Orientation,
    ksize: usize,
) -> Result<Array2<f64>> {
    let (derivative, smoothing) = sobel_kernels(ksize)?;
    Ok(match orientation {
        Orientation::X => correlate_separable(plane, &derivative, &smoothing),
        Orientation::Y => correlate_separable(plane, &smoothing, &derivative),
    })
}

// ============================================================================
// Single-Axis Threshold
// ============================================================================

fn abs_sobel_mask(
    gray: &Array2<f64>,
    orientation: Orientation,
    thresh_min: u8,
    thresh_max: u8,
) -> Result<Array3<u8>> {
    let grad = sobel_plane(gray, orientation, 3)?.mapv(f64::abs);
    let max = usable_max(std::slice::from_ref(&grad), "sobel")?;

    let (lo, hi) = (thresh_min as f64, thresh_max as f64);
    let band = Band::new(lo, hi);
    let mask = grad.mapv(|g| {
        // Truncating 8-bit scale
        let scaled = (g * 255.0 / max).floor();
        band.contains_strict(scaled) as u8
    });

    tracing::debug!(
        %orientation,
        thresh_min,
        thresh_max,
        selected = mask.iter().filter(|&&v| v != 0).count(),
        "abs sobel threshold"
    );

    Ok(mask.insert_axis(Axis(2)))
}

/// Threshold the absolute single-axis Sobel gradient - u8 version.
///
/// Converts to grayscale, takes the 3×3 Sobel derivative along `orientation`,
/// scales `|g|` to 0-255 by its maximum and keeps pixels strictly between
/// `thresh_min` and `thresh_max`.
///
/// # Arguments
/// * `input` - Image with 1, 3, or 4 channels (height, width, channels)
/// * `orientation` - Derivative axis
/// * `thresh_min` - Exclusive lower bound on the scaled gradient
/// * `thresh_max` - Exclusive upper bound on the scaled gradient
///
/// # Returns
/// Mask of shape (height, width, 1) with values 0 or 1
///
/// # Errors
/// `DegenerateInput` when the gradient is zero everywhere.
pub fn abs_sobel_thresh_u8(
    input: ArrayView3<u8>,
    orientation: Orientation,
    thresh_min: u8,
    thresh_max: u8,
) -> Result<Array3<u8>> {
    let gray = gray_plane_u8(input)?;
    abs_sobel_mask(&gray, orientation, thresh_min, thresh_max)
}

/// Threshold the absolute single-axis Sobel gradient - f32 version.
pub fn abs_sobel_thresh_f32(
    input: ArrayView3<f32>,
    orientation: Orientation,
    thresh_min: u8,
    thresh_max: u8,
) -> Result<Array3<u8>> {
    let gray = gray_plane_f32(input)?;
    abs_sobel_mask(&gray, orientation, thresh_min, thresh_max)
}

// ============================================================================
// Multi-Criteria Band Filter
// ============================================================================

/// Bands for [`sob_filter_u8`] / [`sob_filter_f32`].
///
/// Gradient bands apply to responses normalized by their maximum (0-1);
/// the angle band is in radians, `atan2(|dy|, |dx|)` in `[0, π/2]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SobelBandParams {
    pub x_thresh: Band,
    pub y_thresh: Band,
    pub angle_thresh: Band,
    pub magnitude_thresh: Band,
    pub ksize: usize,
}

impl Default for SobelBandParams {
    fn default() -> Self {
        Self {
            x_thresh: Band::new(0.8, 1.0),
            y_thresh: Band::new(0.0, 1.0),
            angle_thresh: Band::new(0.01, 1.56),
            magnitude_thresh: Band::new(0.0, 1.0),
            ksize: 9,
        }
    }
}

impl SobelBandParams {
    pub fn validate(&self) -> Result<()> {
        self.x_thresh.validate("x")?;
        self.y_thresh.validate("y")?;
        self.angle_thresh.validate("angle")?;
        self.magnitude_thresh.validate("magnitude")?;
        sobel_kernels(self.ksize).map(|_| ())
    }
}

fn sob_mask(plane: &Array2<f64>, params: &SobelBandParams) -> Result<Array3<u8>> {
    params.validate()?;

    let abs_dx = sobel_plane(plane, Orientation::X, params.ksize)?.mapv(f64::abs);
    let abs_dy = sobel_plane(plane, Orientation::Y, params.ksize)?.mapv(f64::abs);

    let scaled_dx = normalize_by_max(abs_dx.clone(), "sobel_x")?;
    let scaled_dy = normalize_by_max(abs_dy.clone(), "sobel_y")?;

    let mut magnitude = Array2::<f64>::zeros(plane.dim());
    Zip::from(&mut magnitude)
        .and(&abs_dx)
        .and(&abs_dy)
        .for_each(|m, &dx, &dy| *m = dx.hypot(dy));
    let magnitude = normalize_by_max(magnitude, "magnitude")?;

    let mut mask = Array2::<u8>::zeros(plane.dim());
    Zip::from(&mut mask)
        .and(&scaled_dx)
        .and(&scaled_dy)
        .and(&magnitude)
        .and(&abs_dx)
        .and(&abs_dy)
        .for_each(|out, &sx, &sy, &mg, &dx, &dy| {
            let angle = dy.atan2(dx);
            let keep = params.x_thresh.contains(sx)
                && params.y_thresh.contains(sy)
                && params.magnitude_thresh.contains(mg)
                && params.angle_thresh.contains(angle);
            *out = keep as u8;
        });

    tracing::debug!(
        ksize = params.ksize,
        selected = mask.iter().filter(|&&v| v != 0).count(),
        "sobel band filter"
    );

    Ok(replicate_mask(&mask, 3, 255))
}

/// Multi-criteria Sobel band filter - u8 version.
///
/// A pixel is kept when its normalized |dx|, normalized |dy|, normalized
/// gradient magnitude and gradient angle all fall inside their bands.
///
/// # Arguments
/// * `channel` - Single channel (height, width), e.g. a saturation or hue plane
/// * `params` - Bands and Sobel kernel size
///
/// # Returns
/// Mask of shape (height, width, 3) with values 0 or 255
///
/// # Errors
/// `DegenerateInput` when |dx|, |dy| or the magnitude is zero everywhere.
pub fn sob_filter_u8(channel: ArrayView2<u8>, params: &SobelBandParams) -> Result<Array3<u8>> {
    let plane = plane_from_u8(channel)?;
    sob_mask(&plane, params)
}

/// Multi-criteria Sobel band filter - f32 version.
pub fn sob_filter_f32(channel: ArrayView2<f32>, params: &SobelBandParams) -> Result<Array3<u8>> {
    let plane = plane_from_f32(channel)?;
    sob_mask(&plane, params)
}
