//! Mask filters for lane-marking detection.
//!
//! ## Supported Formats
//!
//! Image inputs are `(height, width, channels)` arrays:
//!
//! | Format | Shape | Type | Description |
//! |--------|-------|------|-------------|
//! | Grayscale8 | (H, W, 1) | u8 | Single channel, 0-255 |
//! | Grayscale float | (H, W, 1) | f32 | Single channel, any range |
//! | RGB8 / RGB float | (H, W, 3) | u8 / f32 | Color channels |
//! | RGBA8 / RGBA float | (H, W, 4) | u8 / f32 | Color + alpha (alpha ignored) |
//!
//! Single-plane inputs (the band filter's channel) are `(H, W)` arrays.
//!
//! ## Architecture
//!
//! All filters follow these principles:
//! - **Pure** - No state between calls, identical input gives identical output
//! - **Dual precision** - u8 and f32 entry points share one f64 implementation
//! - **Explicit failures** - Flat images and bad parameters return `FilterError`
//!   instead of NaN masks
//! - **Thread-safe** - Row loops run on rayon
//!
//! ## Filters
//!
//! - **Bump**: `bump_filter`, `topo_parabolic_bump_filter` (stripe and blob masks)
//! - **Edge**: `abs_sobel_thresh`, `sob_filter` (Sobel gradient masks)
//! - **Support**: grayscale planes, binary morphology, correlation kernels

pub mod core;
pub mod grayscale;
pub mod edge;
pub mod morphology;
pub mod bump;
