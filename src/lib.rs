//! LaneStag Rust Extensions
//!
//! Mask filters for lane-marking detection, implemented in Rust with optional
//! Python bindings via PyO3 and WASM bindings for JavaScript.
//!
//! ## Image Format
//! Filters accept `ndarray` images of shape (height, width, channels):
//! - **Grayscale**: (height, width, 1) - single channel
//! - **RGB**: (height, width, 3) - 3 color channels
//! - **RGBA**: (height, width, 4) - 3 color channels + alpha (ignored)
//!
//! Both bit depths are supported:
//! - `u8`: 8-bit per channel (0-255)
//! - `f32`: Float per channel (any range)
//!
//! ## Filters
//! - [`topo_parabolic_bump_filter_u8`]: mid-sized stripe blobs, 0/1 mask (H, W, 1)
//! - [`abs_sobel_thresh_u8`]: single-axis Sobel band, 0/1 mask (H, W, 1)
//! - [`sob_filter_u8`]: multi-criteria Sobel band, 0/255 mask (H, W, 3)
//! - [`bump_filter_u8`]: bump response band, 0/255 mask (H, W, 3)
//!
//! Every filter returns [`Result`]; flat images fail with
//! [`FilterError::DegenerateInput`] rather than producing NaN masks.

pub mod error;
pub mod filters;
pub mod selection;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::{FilterError, Result};
pub use filters::bump::{
    bump_filter_f32, bump_filter_u8, topo_parabolic_bump_filter_f32,
    topo_parabolic_bump_filter_u8, BumpBlobParams, BumpParams,
};
pub use filters::core::Band;
pub use filters::edge::{
    abs_sobel_thresh_f32, abs_sobel_thresh_u8, sob_filter_f32, sob_filter_u8, Orientation,
    SobelBandParams,
};
pub use selection::{BlobPolicy, Connectivity};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use numpy::{IntoPyArray, PyArray3, PyReadonlyArray2, PyReadonlyArray3};
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;

    use crate::error::FilterError;
    use crate::filters::bump::{self, BumpBlobParams, BumpParams};
    use crate::filters::core::Band;
    use crate::filters::edge::{self, Orientation, SobelBandParams};

    impl From<FilterError> for PyErr {
        fn from(err: FilterError) -> PyErr {
            PyValueError::new_err(err.to_string())
        }
    }

    // ========================================================================
    // Bump Filters
    // ========================================================================

    /// Select mid-sized stripe blobs from a single-channel u8 image.
    ///
    /// Returns a (H, W, 1) mask with values 0/1.
    #[pyfunction]
    #[pyo3(signature = (image, x_thresh=(0.5, 1.0), y_thresh=(0.0, 0.0001), min_area=400, ksize=3, exclude_dominant_region=true))]
    pub fn topo_parabolic_bump_filter<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        x_thresh: (f64, f64),
        y_thresh: (f64, f64),
        min_area: usize,
        ksize: usize,
        exclude_dominant_region: bool,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let params = BumpBlobParams {
            x_thresh: Band::from(x_thresh),
            y_thresh: Band::from(y_thresh),
            min_area,
            ksize,
            exclude_dominant_region,
            ..Default::default()
        };
        let result = bump::topo_parabolic_bump_filter_u8(image.as_array(), &params)?;
        Ok(result.into_pyarray(py))
    }

    /// Select mid-sized stripe blobs from a single-channel f32 image.
    #[pyfunction]
    #[pyo3(signature = (image, x_thresh=(0.5, 1.0), y_thresh=(0.0, 0.0001), min_area=400, ksize=3, exclude_dominant_region=true))]
    pub fn topo_parabolic_bump_filter_f32<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, f32>,
        x_thresh: (f64, f64),
        y_thresh: (f64, f64),
        min_area: usize,
        ksize: usize,
        exclude_dominant_region: bool,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let params = BumpBlobParams {
            x_thresh: Band::from(x_thresh),
            y_thresh: Band::from(y_thresh),
            min_area,
            ksize,
            exclude_dominant_region,
            ..Default::default()
        };
        let result = bump::topo_parabolic_bump_filter_f32(image.as_array(), &params)?;
        Ok(result.into_pyarray(py))
    }

    /// Threshold the normalized bump response (u8). Returns (H, W, 3) 0/255.
    #[pyfunction]
    #[pyo3(signature = (image, thresh=(0.5, 1.0), ksize=3))]
    pub fn bump_filter<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        thresh: (f64, f64),
        ksize: usize,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let params = BumpParams {
            thresh: Band::from(thresh),
            ksize,
        };
        let result = bump::bump_filter_u8(image.as_array(), &params)?;
        Ok(result.into_pyarray(py))
    }

    #[pyfunction]
    #[pyo3(signature = (image, thresh=(0.5, 1.0), ksize=3))]
    pub fn bump_filter_f32<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, f32>,
        thresh: (f64, f64),
        ksize: usize,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let params = BumpParams {
            thresh: Band::from(thresh),
            ksize,
        };
        let result = bump::bump_filter_f32(image.as_array(), &params)?;
        Ok(result.into_pyarray(py))
    }

    // ========================================================================
    // Sobel Filters
    // ========================================================================

    /// Single-axis Sobel threshold (u8). `orient` is "x" or "y".
    #[pyfunction]
    #[pyo3(signature = (image, orient="x", thresh_min=0, thresh_max=255))]
    pub fn abs_sobel_thresh<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        orient: &str,
        thresh_min: u8,
        thresh_max: u8,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let orientation: Orientation = orient.parse()?;
        let result =
            edge::abs_sobel_thresh_u8(image.as_array(), orientation, thresh_min, thresh_max)?;
        Ok(result.into_pyarray(py))
    }

    #[pyfunction]
    #[pyo3(signature = (image, orient="x", thresh_min=0, thresh_max=255))]
    pub fn abs_sobel_thresh_f32<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, f32>,
        orient: &str,
        thresh_min: u8,
        thresh_max: u8,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let orientation: Orientation = orient.parse()?;
        let result =
            edge::abs_sobel_thresh_f32(image.as_array(), orientation, thresh_min, thresh_max)?;
        Ok(result.into_pyarray(py))
    }

    /// Multi-criteria Sobel band filter on one u8 channel. Returns (H, W, 3) 0/255.
    #[pyfunction]
    #[pyo3(signature = (channel, x_thresh=(0.8, 1.0), y_thresh=(0.0, 1.0), a_thresh=(0.01, 1.56), grad_thresh=(0.0, 1.0), ksize=9))]
    pub fn sob_filter<'py>(
        py: Python<'py>,
        channel: PyReadonlyArray2<'py, u8>,
        x_thresh: (f64, f64),
        y_thresh: (f64, f64),
        a_thresh: (f64, f64),
        grad_thresh: (f64, f64),
        ksize: usize,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let params = SobelBandParams {
            x_thresh: Band::from(x_thresh),
            y_thresh: Band::from(y_thresh),
            angle_thresh: Band::from(a_thresh),
            magnitude_thresh: Band::from(grad_thresh),
            ksize,
        };
        let result = edge::sob_filter_u8(channel.as_array(), &params)?;
        Ok(result.into_pyarray(py))
    }

    #[pyfunction]
    #[pyo3(signature = (channel, x_thresh=(0.8, 1.0), y_thresh=(0.0, 1.0), a_thresh=(0.01, 1.56), grad_thresh=(0.0, 1.0), ksize=9))]
    pub fn sob_filter_f32<'py>(
        py: Python<'py>,
        channel: PyReadonlyArray2<'py, f32>,
        x_thresh: (f64, f64),
        y_thresh: (f64, f64),
        a_thresh: (f64, f64),
        grad_thresh: (f64, f64),
        ksize: usize,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let params = SobelBandParams {
            x_thresh: Band::from(x_thresh),
            y_thresh: Band::from(y_thresh),
            angle_thresh: Band::from(a_thresh),
            magnitude_thresh: Band::from(grad_thresh),
            ksize,
        };
        let result = edge::sob_filter_f32(channel.as_array(), &params)?;
        Ok(result.into_pyarray(py))
    }

    /// LaneStag Rust extension module
    #[pymodule]
    pub fn lanestag(m: &Bound<'_, PyModule>) -> PyResult<()> {
        // Bump filters
        m.add_function(wrap_pyfunction!(topo_parabolic_bump_filter, m)?)?;
        m.add_function(wrap_pyfunction!(topo_parabolic_bump_filter_f32, m)?)?;
        m.add_function(wrap_pyfunction!(bump_filter, m)?)?;
        m.add_function(wrap_pyfunction!(bump_filter_f32, m)?)?;

        // Sobel filters
        m.add_function(wrap_pyfunction!(abs_sobel_thresh, m)?)?;
        m.add_function(wrap_pyfunction!(abs_sobel_thresh_f32, m)?)?;
        m.add_function(wrap_pyfunction!(sob_filter, m)?)?;
        m.add_function(wrap_pyfunction!(sob_filter_f32, m)?)?;

        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::lanestag;
