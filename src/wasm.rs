//! WebAssembly exports for LaneStag filters.
//!
//! These functions are exposed to JavaScript via wasm-bindgen.
//!
//! Images are passed as flat row-major u8 buffers plus their dimensions;
//! masks come back the same way. Filter errors are returned as string
//! `JsValue`s so callers can surface them.

use wasm_bindgen::prelude::*;

use crate::error::FilterError;
use crate::filters::bump::{
    bump_filter_u8, topo_parabolic_bump_filter_u8, BumpBlobParams, BumpParams,
};
use crate::filters::core::{image_from_flat, Band};
use crate::filters::edge::{abs_sobel_thresh_u8, sob_filter_u8, Orientation, SobelBandParams};

fn to_js(err: FilterError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// ============================================================================
// Bump Filters
// ============================================================================

/// Select mid-sized stripe blobs from a grayscale image.
///
/// # Arguments
/// * `data` - Flat array of gray bytes (length = width * height)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
///
/// # Returns
/// Flat 0/1 mask (length = width * height)
#[wasm_bindgen]
pub fn topo_parabolic_bump_filter_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    x_lo: f64,
    x_hi: f64,
    y_hi: f64,
    min_area: usize,
    ksize: usize,
) -> Result<Vec<u8>, JsValue> {
    let input = image_from_flat(data, height, width, 1).map_err(to_js)?;
    let params = BumpBlobParams {
        x_thresh: Band::new(x_lo, x_hi),
        y_thresh: Band::new(0.0, y_hi),
        min_area,
        ksize,
        ..Default::default()
    };

    let result = topo_parabolic_bump_filter_u8(input.view(), &params).map_err(to_js)?;
    Ok(result.into_raw_vec_and_offset().0)
}

/// Threshold the normalized bump response.
///
/// # Returns
/// Flat 0/255 mask with 3 channels (length = width * height * 3)
#[wasm_bindgen]
pub fn bump_filter_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    lo: f64,
    hi: f64,
    ksize: usize,
) -> Result<Vec<u8>, JsValue> {
    let input = image_from_flat(data, height, width, channels).map_err(to_js)?;
    let params = BumpParams {
        thresh: Band::new(lo, hi),
        ksize,
    };

    let result = bump_filter_u8(input.view(), &params).map_err(to_js)?;
    Ok(result.into_raw_vec_and_offset().0)
}

// ============================================================================
// Sobel Filters
// ============================================================================

/// Single-axis Sobel threshold. `orient` is "x" or "y".
///
/// # Returns
/// Flat 0/1 mask (length = width * height)
#[wasm_bindgen]
pub fn abs_sobel_thresh_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    orient: &str,
    thresh_min: u8,
    thresh_max: u8,
) -> Result<Vec<u8>, JsValue> {
    let input = image_from_flat(data, height, width, channels).map_err(to_js)?;
    let orientation: Orientation = orient.parse().map_err(to_js)?;

    let result = abs_sobel_thresh_u8(input.view(), orientation, thresh_min, thresh_max)
        .map_err(to_js)?;
    Ok(result.into_raw_vec_and_offset().0)
}

/// Multi-criteria Sobel band filter on one gray channel.
///
/// `bands` holds 8 values: x lo/hi, y lo/hi, angle lo/hi, magnitude lo/hi.
///
/// # Returns
/// Flat 0/255 mask with 3 channels (length = width * height * 3)
#[wasm_bindgen]
pub fn sob_filter_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    bands: &[f64],
    ksize: usize,
) -> Result<Vec<u8>, JsValue> {
    if bands.len() != 8 {
        return Err(to_js(FilterError::ShapeMismatch {
            expected: 8,
            actual: bands.len(),
        }));
    }
    let input = image_from_flat(data, height, width, 1).map_err(to_js)?;
    let params = SobelBandParams {
        x_thresh: Band::new(bands[0], bands[1]),
        y_thresh: Band::new(bands[2], bands[3]),
        angle_thresh: Band::new(bands[4], bands[5]),
        magnitude_thresh: Band::new(bands[6], bands[7]),
        ksize,
    };

    let channel = input.index_axis(ndarray::Axis(2), 0);
    let result = sob_filter_u8(channel, &params).map_err(to_js)?;
    Ok(result.into_raw_vec_and_offset().0)
}
