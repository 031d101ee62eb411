//! Error type shared by every filter.

/// Result type alias using [`FilterError`].
pub type Result<T> = std::result::Result<T, FilterError>;

/// Failure conditions of the mask filters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    /// Input has no pixels
    #[error("empty image: {height}x{width}")]
    EmptyImage { height: usize, width: usize },

    /// Channel count the filter cannot process
    #[error("unsupported channel count {channels}, expected {expected}")]
    UnsupportedChannels {
        channels: usize,
        expected: &'static str,
    },

    /// A response map has a zero maximum and cannot be normalized
    #[error("degenerate input: maximum {response} response is zero")]
    DegenerateInput { response: &'static str },

    /// Orientation string other than "x" or "y"
    #[error("invalid orientation {0:?}, expected \"x\" or \"y\"")]
    InvalidOrientation(String),

    /// Kernel size outside the supported range
    #[error("invalid kernel size {ksize}: {reason}")]
    InvalidKernelSize { ksize: usize, reason: &'static str },

    /// Threshold band with lo > hi or non-finite bounds
    #[error("invalid {name} threshold [{lo}, {hi}]")]
    InvalidThreshold { name: &'static str, lo: f64, hi: f64 },

    /// Flat buffer length does not match the declared shape
    #[error("shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
}

impl FilterError {
    /// True when the input itself is flat or empty, as opposed to a bad parameter.
    pub fn is_degenerate(&self) -> bool {
        matches!(
            self,
            FilterError::DegenerateInput { .. } | FilterError::EmptyImage { .. }
        )
    }
}
