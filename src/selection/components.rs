//! Connected component labeling with per-component statistics.
//!
//! Labels are assigned by breadth-first flood fill in raster order of each
//! component's first pixel, so label ids are deterministic: label 1 is the
//! component containing the first set pixel met scanning rows top to bottom.
//! Label 0 is reserved for the unset (background) pixels, which get their
//! own statistics entry like every other label.

use std::collections::VecDeque;

use ndarray::{Array2, ArrayView2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pixel neighbourhood used to decide connectivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Connectivity {
    /// Edge neighbours only
    Four,
    /// Edge and diagonal neighbours
    #[default]
    Eight,
}

impl Connectivity {
    fn offsets(&self) -> &'static [(isize, isize)] {
        const FOUR: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        const EIGHT: [(isize, isize); 8] = [
            (-1, -1),
            (-1, 0),
            (-1, 1),
            (0, -1),
            (0, 1),
            (1, -1),
            (1, 0),
            (1, 1),
        ];
        match self {
            Connectivity::Four => &FOUR,
            Connectivity::Eight => &EIGHT,
        }
    }
}

/// Statistics of one labeled component.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentStats {
    pub label: u32,
    /// Number of pixels
    pub area: usize,
    /// Bounding box as (x, y, width, height); all zero for an empty label
    pub bounds: (usize, usize, usize, usize),
    /// Mean (x, y) of the component's pixels
    pub centroid: (f64, f64),
}

/// Label image plus one [`ComponentStats`] per label (index = label).
#[derive(Debug, Clone)]
pub struct ComponentLabels {
    pub labels: Array2<u32>,
    pub stats: Vec<ComponentStats>,
}

impl ComponentLabels {
    /// Number of labels including the background.
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Number of foreground components.
    pub fn component_count(&self) -> usize {
        self.stats.len().saturating_sub(1)
    }

    pub fn area(&self, label: u32) -> Option<usize> {
        self.stats.get(label as usize).map(|s| s.area)
    }
}

#[derive(Default)]
struct Accumulator {
    area: usize,
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
    sum_x: f64,
    sum_y: f64,
}

impl Accumulator {
    fn add(&mut self, x: usize, y: usize) {
        if self.area == 0 {
            self.min_x = x;
            self.min_y = y;
            self.max_x = x;
            self.max_y = y;
        } else {
            self.min_x = self.min_x.min(x);
            self.min_y = self.min_y.min(y);
            self.max_x = self.max_x.max(x);
            self.max_y = self.max_y.max(y);
        }
        self.area += 1;
        self.sum_x += x as f64;
        self.sum_y += y as f64;
    }

    fn finish(self, label: u32) -> ComponentStats {
        if self.area == 0 {
            return ComponentStats {
                label,
                area: 0,
                bounds: (0, 0, 0, 0),
                centroid: (0.0, 0.0),
            };
        }
        let n = self.area as f64;
        ComponentStats {
            label,
            area: self.area,
            bounds: (
                self.min_x,
                self.min_y,
                self.max_x - self.min_x + 1,
                self.max_y - self.min_y + 1,
            ),
            centroid: (self.sum_x / n, self.sum_y / n),
        }
    }
}

/// Label the connected components of a binary mask.
///
/// # Arguments
/// * `mask` - Binary mask (nonzero = foreground)
/// * `connectivity` - 4- or 8-connectivity
///
/// # Returns
/// Label image and statistics; `stats[0]` describes the background
pub fn label_components(mask: ArrayView2<u8>, connectivity: Connectivity) -> ComponentLabels {
    let (height, width) = mask.dim();
    let mut labels = Array2::<u32>::zeros((height, width));
    let mut background = Accumulator::default();
    let mut stats = Vec::new();
    let mut queue = VecDeque::new();
    let mut next_label = 1u32;

    for y in 0..height {
        for x in 0..width {
            if mask[[y, x]] == 0 {
                background.add(x, y);
                continue;
            }
            if labels[[y, x]] != 0 {
                continue;
            }

            // Flood fill a new component
            let label = next_label;
            next_label += 1;
            let mut acc = Accumulator::default();

            labels[[y, x]] = label;
            queue.push_back((x, y));

            while let Some((cx, cy)) = queue.pop_front() {
                acc.add(cx, cy);

                for &(dy, dx) in connectivity.offsets() {
                    let nx = cx as isize + dx;
                    let ny = cy as isize + dy;
                    if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
                        continue;
                    }
                    let (nx, ny) = (nx as usize, ny as usize);
                    if mask[[ny, nx]] != 0 && labels[[ny, nx]] == 0 {
                        labels[[ny, nx]] = label;
                        queue.push_back((nx, ny));
                    }
                }
            }

            stats.push(acc.finish(label));
        }
    }

    stats.insert(0, background.finish(0));

    ComponentLabels { labels, stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_two_squares() {
        let mut mask = Array2::<u8>::zeros((6, 8));
        for y in 1..3 {
            for x in 1..3 {
                mask[[y, x]] = 1;
            }
        }
        for y in 3..6 {
            for x in 5..8 {
                mask[[y, x]] = 1;
            }
        }

        let result = label_components(mask.view(), Connectivity::Eight);

        assert_eq!(result.len(), 3);
        assert_eq!(result.component_count(), 2);
        assert_eq!(result.area(0), Some(48 - 4 - 9));
        assert_eq!(result.area(1), Some(4));
        assert_eq!(result.area(2), Some(9));
        assert_eq!(result.stats[2].bounds, (5, 3, 3, 3));
        assert_eq!(result.stats[2].centroid, (6.0, 4.0));
        assert_eq!(result.labels[[4, 6]], 2);
        assert_eq!(result.labels[[0, 0]], 0);
    }

    #[test]
    fn test_diagonal_connectivity() {
        let mask = array![[1u8, 0, 0], [0, 1, 0], [0, 0, 1]];

        let eight = label_components(mask.view(), Connectivity::Eight);
        assert_eq!(eight.component_count(), 1);
        assert_eq!(eight.area(1), Some(3));

        let four = label_components(mask.view(), Connectivity::Four);
        assert_eq!(four.component_count(), 3);
    }

    #[test]
    fn test_raster_order_labels() {
        // A "U" shape: its first pixel comes before the lone pixel at (0, 2)
        let mask = array![
            [1u8, 0, 1, 0, 1],
            [1, 0, 0, 0, 1],
            [1, 1, 1, 1, 1],
        ];
        let result = label_components(mask.view(), Connectivity::Eight);
        assert_eq!(result.labels[[0, 0]], 1);
        assert_eq!(result.labels[[0, 4]], 1);
        assert_eq!(result.labels[[0, 2]], 2);
    }

    #[test]
    fn test_full_mask_has_empty_background() {
        let mask = Array2::<u8>::ones((3, 3));
        let result = label_components(mask.view(), Connectivity::Eight);
        assert_eq!(result.stats[0].area, 0);
        assert_eq!(result.stats[0].bounds, (0, 0, 0, 0));
        assert_eq!(result.area(1), Some(9));
    }
}
