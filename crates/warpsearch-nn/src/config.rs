//! Search modes and series transforms.

use warpsearch_distance::{
    TimeSeries, derivative, derivative_batch, z_normalize, z_normalize_batch,
};

use crate::dataset::Dataset;
use crate::error::NnError;

/// How `fit` estimates the LOOCV accuracy of every candidate parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub enum LoocvMode {
    /// Exhaustive leave-one-out scan with exact distances.
    Naive,
    /// Leave-one-out scan pruned with lower bounds and early abandoning.
    LowerBound,
    /// One pass over all parameters sharing lazy lower bounds.
    #[default]
    FastSearch,
}

/// Transform applied to every train and query series before distances are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub enum SeriesTransform {
    /// Leave series unchanged.
    #[default]
    Identity,
    /// Keogh-Pazzani derivative (series shrink by 2 points).
    Derivative,
    /// Per-series z-normalization.
    ZNormalize,
}

impl SeriesTransform {
    /// Transform one series.
    ///
    /// # Errors
    ///
    /// Returns [`NnError::Preprocess`] if the transform is undefined for the series.
    pub fn apply_series(self, series: &TimeSeries) -> Result<TimeSeries, NnError> {
        Ok(match self {
            Self::Identity => series.clone(),
            Self::Derivative => derivative(series)?,
            Self::ZNormalize => z_normalize(series)?,
        })
    }

    /// Transform every series of a dataset, keeping labels.
    ///
    /// # Errors
    ///
    /// Returns [`NnError::Preprocess`] from a failing series, or a dataset
    /// validation error if transformed series end up shorter than 2 points.
    pub fn apply(self, dataset: &Dataset) -> Result<Dataset, NnError> {
        let series = match self {
            Self::Identity => return Ok(dataset.clone()),
            Self::Derivative => derivative_batch(dataset.all_series())?,
            Self::ZNormalize => z_normalize_batch(dataset.all_series())?,
        };
        Dataset::from_series(series, dataset.labels().to_vec())
    }
}
