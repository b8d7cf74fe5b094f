//! Outcomes of training and evaluation.

use std::time::Duration;

use crate::config::LoocvMode;
use crate::confusion::ConfusionMatrix;

/// Outcome of [`OneNearestNeighbour::fit`](crate::OneNearestNeighbour::fit).
#[derive(Debug, Clone, serde::Serialize)]
pub struct TrainingResults {
    /// LOOCV accuracy of the chosen parameter.
    pub accuracy: f64,
    /// LOOCV prediction of each training series under the chosen parameter.
    /// `None` where no neighbour was available, and past the LOOCV limit.
    pub predictions: Vec<Option<usize>>,
    /// Index of the chosen parameter in the grid.
    pub chosen_param_id: usize,
    /// Display form of the chosen parameter.
    pub params: String,
    /// LOOCV accuracy of every grid entry.
    pub param_accuracies: Vec<f64>,
    /// Exact distance computations made during the search.
    pub exact_evaluations: usize,
    /// Search that produced the accuracies.
    pub mode: LoocvMode,
    /// Wall-clock training time.
    pub elapsed: Duration,
}

/// Outcome of [`OneNearestNeighbour::evaluate`](crate::OneNearestNeighbour::evaluate).
#[derive(Debug, Clone, serde::Serialize)]
pub struct ClassificationResults {
    /// Fraction of test series classified correctly.
    pub accuracy: f64,
    /// True against predicted class counts.
    pub confusion: ConfusionMatrix,
    /// Predicted class of each test series, in input order.
    pub predictions: Vec<usize>,
    /// Wall-clock evaluation time.
    pub elapsed: Duration,
}
