//! Region selection on binary masks.
//!
//! - **Components**: connected component labeling with area, bounds and centroid
//! - **Blobs**: rank components by area and keep those passing a size policy
//!
//! Used by the bump blob filter to turn a noisy seed mask into whole blobs.

pub mod components;
pub mod blobs;

pub use blobs::{paint_labels, rank_by_area, select_blobs, BlobPolicy};
pub use components::{label_components, ComponentLabels, ComponentStats, Connectivity};
