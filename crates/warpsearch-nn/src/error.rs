use warpsearch_distance::{DistanceError, PreprocessError};

/// Errors from nearest-neighbour training and classification.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NnError {
    /// Returned when a dataset has no series.
    #[error("dataset has zero series")]
    EmptyDataset,

    /// Returned when the number of labels differs from the number of series.
    #[error("dataset has {n_series} series but {n_labels} labels")]
    LabelCountMismatch {
        /// Number of series provided.
        n_series: usize,
        /// Number of labels provided.
        n_labels: usize,
    },

    /// Returned when a series length differs from the first series of the dataset.
    #[error("series {index} has length {found}, expected {expected}")]
    LengthMismatch {
        /// Zero-based index of the offending series.
        index: usize,
        /// Length of the first series.
        expected: usize,
        /// Length of the offending series.
        found: usize,
    },

    /// Returned when a series has fewer than two points.
    #[error("series {index} has {len} points, need at least 2")]
    SeriesTooShort {
        /// Zero-based index of the offending series.
        index: usize,
        /// Length of the offending series.
        len: usize,
    },

    /// Returned when a query length differs from the training series length.
    #[error("query has length {found}, training series have length {expected}")]
    QueryLengthMismatch {
        /// Training series length.
        expected: usize,
        /// Query length.
        found: usize,
    },

    /// Returned when predicting before a successful `fit`.
    #[error("classifier has not been fitted")]
    NotFitted,

    /// Returned when the estimated-accuracy limit is zero.
    #[error("loocv limit must be at least 1, got {limit}")]
    InvalidLoocvLimit {
        /// The rejected limit.
        limit: usize,
    },

    /// Returned when a LOOCV limit is combined with the fast parameter search.
    #[error("loocv limit is only supported by the naive and lower-bound searches")]
    LoocvLimitUnsupported,

    /// Returned when a series or parameter fails validation in the distance crate.
    #[error(transparent)]
    Distance(#[from] DistanceError),

    /// Returned when a series transform cannot be applied.
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
}
