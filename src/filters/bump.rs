//! Bump filters: stripe detection with a second-derivative-like kernel.
//!
//! The bump kernel `[-1]×k, [2]×k, [-1]×k` runs along x and peaks on
//! vertical stripes about `k` pixels wide, which is what a lane marking
//! looks like in a bird's-eye or near-field view.
//!
//! Two filters are provided:
//! - [`bump_filter_u8`] / [`bump_filter_f32`]: threshold the normalized
//!   response into a band
//! - [`topo_parabolic_bump_filter_u8`] / [`topo_parabolic_bump_filter_f32`]:
//!   additionally reject horizontal-edge pixels, close the mask and keep only
//!   mid-sized blobs

use ndarray::{Array2, Array3, ArrayView3, Axis, Zip};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::core::{
    bump_kernel, color_planes_f32, color_planes_u8, correlate_cols, correlate_rows,
    normalize_by_max, normalize_planes, replicate_mask, single_plane_f32, single_plane_u8,
    stack_masks, vertical_edge_kernel, Band,
};
use super::morphology::close_binary;
use crate::error::Result;
use crate::selection::blobs::{paint_labels, select_blobs, BlobPolicy};
use crate::selection::components::{label_components, Connectivity};

/// Structuring element used to close the seed mask
const CLOSE_ELEMENT: (usize, usize) = (3, 3);

// ============================================================================
// Parameters
// ============================================================================

/// Parameters for [`bump_filter_u8`] / [`bump_filter_f32`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BumpParams {
    /// Inclusive band on the normalized response (0-1)
    pub thresh: Band,
    /// Width k of each kernel section
    pub ksize: usize,
}

impl Default for BumpParams {
    fn default() -> Self {
        Self {
            thresh: Band::new(0.5, 1.0),
            ksize: 3,
        }
    }
}

impl BumpParams {
    pub fn validate(&self) -> Result<()> {
        self.thresh.validate("bump")?;
        bump_kernel(self.ksize).map(|_| ())
    }
}

/// Parameters for [`topo_parabolic_bump_filter_u8`] / [`topo_parabolic_bump_filter_f32`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BumpBlobParams {
    /// Inclusive band on the normalized bump response (0-1)
    pub x_thresh: Band,
    /// Only `hi` is used: vertical edge response must be below it
    pub y_thresh: Band,
    /// Blobs must be strictly larger than this many pixels
    pub min_area: usize,
    /// Width k of each bump kernel section
    pub ksize: usize,
    /// How many of the largest regions are considered
    pub max_candidates: usize,
    /// Drop the largest region (normally the backdrop)
    pub exclude_dominant_region: bool,
    pub connectivity: Connectivity,
}

impl Default for BumpBlobParams {
    fn default() -> Self {
        Self {
            x_thresh: Band::new(0.5, 1.0),
            y_thresh: Band::new(0.0, 0.0001),
            min_area: 400,
            ksize: 3,
            max_candidates: 6,
            exclude_dominant_region: true,
            connectivity: Connectivity::Eight,
        }
    }
}

impl BumpBlobParams {
    pub fn validate(&self) -> Result<()> {
        self.x_thresh.validate("x")?;
        self.y_thresh.validate("y")?;
        bump_kernel(self.ksize).map(|_| ())
    }

    /// The blob selection part of these parameters.
    pub fn blob_policy(&self) -> BlobPolicy {
        BlobPolicy {
            max_candidates: self.max_candidates,
            exclude_dominant_region: self.exclude_dominant_region,
            min_area: self.min_area,
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Absolute bump response of a plane (not normalized).
pub fn bump_response(plane: &Array2<f64>, ksize: usize) -> Result<Array2<f64>> {
    let kernel = bump_kernel(ksize)?;
    Ok(correlate_rows(plane, &kernel).mapv(f64::abs))
}

/// Absolute response of the 5×1 vertical edge kernel.
pub fn vertical_edge_response(plane: &Array2<f64>) -> Array2<f64> {
    correlate_cols(plane, &vertical_edge_kernel()).mapv(f64::abs)
}

// ============================================================================
// Bump Filter
// ============================================================================

fn bump_mask(planes: Vec<Array2<f64>>, params: &BumpParams) -> Result<Array3<u8>> {
    params.validate()?;

    let mut responses = planes
        .iter()
        .map(|p| bump_response(p, params.ksize))
        .collect::<Result<Vec<_>>>()?;
    let max = normalize_planes(&mut responses, "bump")?;

    let masks: Vec<Array2<u8>> = responses
        .iter()
        .map(|r| r.mapv(|v| params.thresh.contains(v) as u8))
        .collect();

    tracing::debug!(
        channels = masks.len(),
        ksize = params.ksize,
        max,
        "bump filter"
    );

    Ok(if masks.len() == 1 {
        replicate_mask(&masks[0], 3, 255)
    } else {
        stack_masks(&masks, 255)
    })
}

/// Threshold the normalized bump response - u8 version.
///
/// Each color channel is filtered separately; all responses share one
/// normalizer, the largest response over every channel.
///
/// # Arguments
/// * `input` - Image with 1, 3, or 4 channels (height, width, channels); alpha is ignored
/// * `params` - Response band and kernel width
///
/// # Returns
/// Mask of shape (height, width, 3) with values 0 or 255. Grayscale input
/// yields the same mask in all three channels.
///
/// # Errors
/// `DegenerateInput` when the response is zero everywhere (flat image).
pub fn bump_filter_u8(input: ArrayView3<u8>, params: &BumpParams) -> Result<Array3<u8>> {
    bump_mask(color_planes_u8(input)?, params)
}

/// Threshold the normalized bump response - f32 version.
pub fn bump_filter_f32(input: ArrayView3<f32>, params: &BumpParams) -> Result<Array3<u8>> {
    bump_mask(color_planes_f32(input)?, params)
}

// ============================================================================
// Topological Bump Blob Filter
// ============================================================================

fn bump_blob_mask(plane: &Array2<f64>, params: &BumpBlobParams) -> Result<Array3<u8>> {
    params.validate()?;

    let bump = normalize_by_max(bump_response(plane, params.ksize)?, "bump")?;
    let vertical = vertical_edge_response(plane);

    let mut seed = Array2::<u8>::zeros(plane.dim());
    Zip::from(&mut seed)
        .and(&bump)
        .and(&vertical)
        .for_each(|out, &b, &v| {
            *out = (params.x_thresh.contains(b) && v < params.y_thresh.hi) as u8;
        });

    let closed = close_binary(&seed, CLOSE_ELEMENT, 1);
    let components = label_components(closed.view(), params.connectivity);
    let keep = select_blobs(&components, &params.blob_policy());

    tracing::debug!(
        seed = seed.iter().filter(|&&v| v != 0).count(),
        closed = closed.iter().filter(|&&v| v != 0).count(),
        components = components.component_count(),
        kept = keep.len(),
        "bump blob filter"
    );

    Ok(paint_labels(&components, &keep).insert_axis(Axis(2)))
}

/// Select mid-sized stripe-shaped blobs - u8 version.
///
/// Steps:
/// 1. Normalized bump response inside `x_thresh`, vertical edge response
///    below `y_thresh.hi`
/// 2. Closing with a 3×3 element (one dilation, one erosion)
/// 3. Connected components; the `max_candidates` largest regions are
///    considered, the largest is dropped when `exclude_dominant_region`
///    is set, and the rest are kept if larger than `min_area`
///
/// # Arguments
/// * `input` - Single-channel image (height, width, 1)
/// * `params` - Thresholds, kernel width and blob policy
///
/// # Returns
/// Mask of shape (height, width, 1) with values 0 or 1
///
/// # Errors
/// `UnsupportedChannels` for multi-channel input, `DegenerateInput` when the
/// bump response is zero everywhere.
pub fn topo_parabolic_bump_filter_u8(
    input: ArrayView3<u8>,
    params: &BumpBlobParams,
) -> Result<Array3<u8>> {
    let plane = single_plane_u8(input)?;
    bump_blob_mask(&plane, params)
}

/// Select mid-sized stripe-shaped blobs - f32 version.
pub fn topo_parabolic_bump_filter_f32(
    input: ArrayView3<f32>,
    params: &BumpBlobParams,
) -> Result<Array3<u8>> {
    let plane = single_plane_f32(input)?;
    bump_blob_mask(&plane, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilterError;

    /// Paint a vertical stripe of width 3 starting at column `x0`.
    fn paint_stripe(img: &mut Array3<f32>, x0: usize, rows: std::ops::Range<usize>) {
        for y in rows {
            for x in x0..x0 + 3 {
                img[[y, x, 0]] = 1.0;
            }
        }
    }

    /// 200x60 image with a long stripe (150 rows) and a short one (8 rows).
    fn two_stripes() -> Array3<f32> {
        let mut img = Array3::<f32>::zeros((200, 60, 1));
        paint_stripe(&mut img, 10, 20..170);
        paint_stripe(&mut img, 40, 90..98);
        img
    }

    fn count_set(mask: &Array3<u8>) -> usize {
        mask.iter().filter(|&&v| v != 0).count()
    }

    #[test]
    fn test_bump_response_profile() {
        let mut plane = Array2::<f64>::zeros((1, 20));
        for x in 8..11 {
            plane[[0, x]] = 1.0;
        }
        let r = bump_response(&plane, 3).unwrap();
        let row: Vec<f64> = (4..16).map(|x| r[[0, x]]).collect();
        // Peak on the stripe center, zero one pixel outside each edge
        assert_eq!(
            row,
            vec![1.0, 2.0, 3.0, 0.0, 3.0, 6.0, 3.0, 0.0, 3.0, 2.0, 1.0, 0.0]
        );
    }

    #[test]
    fn test_bump_filter_gray_replicates() {
        let mut img = Array3::<f32>::zeros((5, 20, 1));
        for y in 0..5 {
            for x in 8..11 {
                img[[y, x, 0]] = 1.0;
            }
        }

        let out = bump_filter_f32(img.view(), &BumpParams::default()).unwrap();

        assert_eq!(out.dim(), (5, 20, 3));
        assert!(out.iter().all(|&v| v == 0 || v == 255));
        // Normalized: 1.0 at center, 0.5 at 8, 10, 6 and 12
        for x in [6, 8, 9, 10, 12] {
            assert_eq!(out[[2, x, 0]], 255, "column {x}");
        }
        for x in [5, 7, 11, 13] {
            assert_eq!(out[[2, x, 0]], 0, "column {x}");
        }
        assert_eq!(out[[2, 9, 1]], 255);
        assert_eq!(out[[2, 9, 2]], 255);
    }

    #[test]
    fn test_bump_filter_rgb_global_max() {
        let mut img = Array3::<u8>::zeros((4, 20, 4));
        for y in 0..4 {
            for x in 8..11 {
                img[[y, x, 0]] = 200; // strong red stripe
                img[[y, x, 1]] = 60; // weak green stripe
            }
            for x in 0..20 {
                img[[y, x, 3]] = 255;
            }
        }

        let out = bump_filter_u8(img.view(), &BumpParams::default()).unwrap();

        assert_eq!(out.dim(), (4, 20, 3));
        assert_eq!(out[[1, 9, 0]], 255);
        // Green peaks at 0.3 of the shared maximum
        assert_eq!(out[[1, 9, 1]], 0);
        assert_eq!(out[[1, 9, 2]], 0);
    }

    #[test]
    fn test_bump_filter_idempotent() {
        let img = Array3::from_shape_fn((9, 24, 3), |(y, x, c)| {
            ((x * 13 + y * 5 + c * 40) % 256) as u8
        });
        let params = BumpParams {
            thresh: Band::new(0.2, 0.9),
            ksize: 2,
        };
        let a = bump_filter_u8(img.view(), &params).unwrap();
        let b = bump_filter_u8(img.view(), &params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_bump_filter_uniform_is_degenerate() {
        let img = Array3::<u8>::from_elem((8, 8, 3), 77);
        let err = bump_filter_u8(img.view(), &BumpParams::default()).unwrap_err();
        assert_eq!(err, FilterError::DegenerateInput { response: "bump" });

        let zeros = Array3::<f32>::zeros((8, 8, 1));
        assert!(bump_filter_f32(zeros.view(), &BumpParams::default())
            .unwrap_err()
            .is_degenerate());
    }

    #[test]
    fn test_bump_filter_rejects_zero_ksize() {
        let img = Array3::<f32>::zeros((4, 4, 1));
        let params = BumpParams {
            ksize: 0,
            ..Default::default()
        };
        assert!(matches!(
            bump_filter_f32(img.view(), &params),
            Err(FilterError::InvalidKernelSize { ksize: 0, .. })
        ));
    }

    #[test]
    fn test_blob_filter_keeps_long_stripe_only() {
        let img = two_stripes();
        let out = topo_parabolic_bump_filter_f32(img.view(), &BumpBlobParams::default()).unwrap();

        assert_eq!(out.dim(), (200, 60, 1));
        assert!(out.iter().all(|&v| v <= 1));

        // Long stripe survives
        assert_eq!(out[[95, 11, 0]], 1);
        assert!(count_set(&out) > 400);

        // Short stripe is below min_area
        for y in 80..110 {
            for x in 32..52 {
                assert_eq!(out[[y, x, 0]], 0, "pixel ({y}, {x})");
            }
        }

        // Backdrop is never selected
        assert_eq!(out[[5, 5, 0]], 0);
        assert_eq!(out[[190, 55, 0]], 0);
    }

    #[test]
    fn test_blob_filter_min_area_admits_short_stripe() {
        let img = two_stripes();
        let params = BumpBlobParams {
            min_area: 10,
            ..Default::default()
        };
        let out = topo_parabolic_bump_filter_f32(img.view(), &params).unwrap();
        assert_eq!(out[[95, 11, 0]], 1);
        assert_eq!(out[[94, 41, 0]], 1);
    }

    #[test]
    fn test_blob_filter_u8_matches_f32() {
        let img = two_stripes();
        let img_u8 = img.mapv(|v| (v * 255.0) as u8);
        let params = BumpBlobParams::default();

        let a = topo_parabolic_bump_filter_f32(img.view(), &params).unwrap();
        let b = topo_parabolic_bump_filter_u8(img_u8.view(), &params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_blob_filter_idempotent() {
        let img = two_stripes();
        let params = BumpBlobParams::default();
        let a = topo_parabolic_bump_filter_f32(img.view(), &params).unwrap();
        let b = topo_parabolic_bump_filter_f32(img.view(), &params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_blob_filter_uniform_is_degenerate() {
        let img = Array3::<u8>::from_elem((30, 30, 1), 40);
        let err =
            topo_parabolic_bump_filter_u8(img.view(), &BumpBlobParams::default()).unwrap_err();
        assert_eq!(err, FilterError::DegenerateInput { response: "bump" });
    }

    #[test]
    fn test_blob_filter_requires_single_channel() {
        let img = Array3::<u8>::zeros((10, 10, 3));
        assert!(matches!(
            topo_parabolic_bump_filter_u8(img.view(), &BumpBlobParams::default()),
            Err(FilterError::UnsupportedChannels { channels: 3, .. })
        ));
    }

    #[test]
    fn test_blob_policy_from_params() {
        let params = BumpBlobParams {
            min_area: 50,
            exclude_dominant_region: false,
            ..Default::default()
        };
        let policy = params.blob_policy();
        assert_eq!(policy.min_area, 50);
        assert_eq!(policy.max_candidates, 6);
        assert!(!policy.exclude_dominant_region);
    }
}
