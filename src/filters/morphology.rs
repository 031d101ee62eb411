//! Binary morphology: Dilate, Erode, Close.
//!
//! Operates on `{0,1}` masks (`Array2<u8>`, any nonzero value counts as set)
//! with a rectangular structuring element anchored at its center.
//!
//! ## Borders
//!
//! Pixels outside the image never contribute: dilation ignores them and
//! erosion treats them as set, so a blob touching the border is not eaten
//! away by the border itself.
//!
//! ## Performance
//!
//! A rectangle is separable, so each pass is a horizontal run followed by a
//! vertical run: O(n × (w + h)) instead of O(n × w × h).
//! Rows are processed in parallel with Rayon.

use ndarray::{Array2, Axis};
use rayon::prelude::*;

/// Extent of a run centered on `i` for a window of `size` (anchor `size / 2`).
#[inline]
fn window(i: usize, size: usize, len: usize) -> (usize, usize) {
    let anchor = size / 2;
    let start = i.saturating_sub(anchor);
    let end = (i + size - anchor).min(len);
    (start, end)
}

fn horizontal_pass(mask: &Array2<u8>, size: usize, dilate: bool) -> Array2<u8> {
    let (height, width) = mask.dim();
    let mut output = Array2::<u8>::zeros((height, width));

    output
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(y, mut row)| {
            for x in 0..width {
                let (x_start, x_end) = window(x, size, width);
                let hit = if dilate {
                    (x_start..x_end).any(|sx| mask[[y, sx]] != 0)
                } else {
                    (x_start..x_end).all(|sx| mask[[y, sx]] != 0)
                };
                row[x] = hit as u8;
            }
        });

    output
}

fn vertical_pass(mask: &Array2<u8>, size: usize, dilate: bool) -> Array2<u8> {
    let (height, width) = mask.dim();
    let mut output = Array2::<u8>::zeros((height, width));

    output
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(y, mut row)| {
            let (y_start, y_end) = window(y, size, height);
            for x in 0..width {
                let hit = if dilate {
                    (y_start..y_end).any(|sy| mask[[sy, x]] != 0)
                } else {
                    (y_start..y_end).all(|sy| mask[[sy, x]] != 0)
                };
                row[x] = hit as u8;
            }
        });

    output
}

fn apply(mask: &Array2<u8>, size: (usize, usize), iterations: usize, dilate: bool) -> Array2<u8> {
    let (rows, cols) = (size.0.max(1), size.1.max(1));
    let mut current = mask.mapv(|v| (v != 0) as u8);
    for _ in 0..iterations {
        let temp = horizontal_pass(&current, cols, dilate);
        current = vertical_pass(&temp, rows, dilate);
    }
    current
}

/// Dilate a binary mask.
///
/// # Arguments
/// * `mask` - Binary mask (nonzero = set)
/// * `size` - Structuring element as (rows, cols); zero extents count as 1
/// * `iterations` - Number of times the dilation is applied
///
/// # Returns
/// `{0,1}` mask of the same shape
pub fn dilate_binary(mask: &Array2<u8>, size: (usize, usize), iterations: usize) -> Array2<u8> {
    apply(mask, size, iterations, true)
}

/// Erode a binary mask.
///
/// A pixel stays set only if every in-image pixel under the element is set.
pub fn erode_binary(mask: &Array2<u8>, size: (usize, usize), iterations: usize) -> Array2<u8> {
    apply(mask, size, iterations, false)
}

/// Morphological closing: `iterations` dilations followed by as many erosions.
///
/// Merges fragments closer than the element and fills small holes.
pub fn close_binary(mask: &Array2<u8>, size: (usize, usize), iterations: usize) -> Array2<u8> {
    let dilated = dilate_binary(mask, size, iterations);
    erode_binary(&dilated, size, iterations)
}
