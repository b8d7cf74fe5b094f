//! Error types for series validation, kernel configuration and preprocessing.

/// Errors from time series validation and distance kernel configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DistanceError {
    /// Returned when an empty slice is provided as a time series.
    #[error("time series must be non-empty")]
    EmptySeries,

    /// Returned when a time series contains NaN, infinity, or negative infinity.
    #[error("time series contains non-finite value at index {index}")]
    NonFiniteValue {
        /// Position of the first non-finite value found.
        index: usize,
    },

    /// Returned when a kernel parameter is negative or not finite.
    #[error("parameter `{name}` must be finite and non-negative, got {value}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Returned when a band fraction lies outside `[0, 1]`.
    #[error("band fraction must be in [0, 1], got {fraction}")]
    InvalidBandFraction {
        /// The rejected fraction.
        fraction: f64,
    },
}

/// Errors from series preprocessing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PreprocessError {
    /// Returned when z-normalizing a series whose values are all identical.
    #[error("cannot z-normalize a constant series of length {n} (value {value})")]
    ConstantSeries {
        /// Length of the series.
        n: usize,
        /// The repeated value.
        value: f64,
    },

    /// Returned when a derivative is requested for a series shorter than 3 points.
    #[error("derivative needs at least 3 points, got {len}")]
    TooShort {
        /// Length of the rejected series.
        len: usize,
    },
}

/// Reject parameters that are negative, NaN or infinite.
pub(crate) fn non_negative(name: &'static str, value: f64) -> Result<f64, DistanceError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(DistanceError::InvalidParameter { name, value })
    }
}
