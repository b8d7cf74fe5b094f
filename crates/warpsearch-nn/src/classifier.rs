//! One-nearest-neighbour classifier with LOOCV parameter selection.

use std::time::Instant;

use rayon::prelude::*;
use tracing::{info, instrument};
use warpsearch_distance::{TimeSeries, Workspace};

use crate::cache::SequenceCache;
use crate::config::{LoocvMode, SeriesTransform};
use crate::confusion::ConfusionMatrix;
use crate::dataset::Dataset;
use crate::error::NnError;
use crate::loocv;
use crate::measure::{BoundBasis, Measure};
use crate::result::{ClassificationResults, TrainingResults};
use crate::scan::{ScanOutcome, bounded_nearest, exact_nearest};

/// One-nearest-neighbour classifier under measure `M`.
///
/// [`fit`](Self::fit) estimates the leave-one-out accuracy of every entry
/// of `M`'s parameter grid and keeps the first best one. Classification
/// scans the training set; exact distance ties are settled by majority
/// vote, the lowest class index winning a vote tie.
///
/// # Defaults
///
/// | Parameter                | Default       |
/// |--------------------------|---------------|
/// | `loocv`                  | `FastSearch`  |
/// | `lower_bound_prediction` | `true`        |
/// | `transform`              | `Identity`    |
/// | `params`                 | grid search   |
/// | `loocv_limit`            | `None`        |
#[derive(Debug, Clone)]
pub struct OneNearestNeighbour<M: Measure> {
    loocv: LoocvMode,
    lower_bound_prediction: bool,
    transform: SeriesTransform,
    fixed: Option<M>,
    loocv_limit: Option<usize>,
    fitted: Option<Fitted<M>>,
}

#[derive(Debug, Clone)]
struct Fitted<M> {
    train: Dataset,
    cache: SequenceCache,
    grid: Vec<M>,
    chosen: usize,
}

impl<M: Measure> Fitted<M> {
    fn params(&self) -> &M {
        &self.grid[self.chosen]
    }
}

impl<M: Measure> Default for OneNearestNeighbour<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Measure> OneNearestNeighbour<M> {
    /// Create an unfitted classifier with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            loocv: LoocvMode::default(),
            lower_bound_prediction: true,
            transform: SeriesTransform::default(),
            fixed: None,
            loocv_limit: None,
            fitted: None,
        }
    }

    /// Set how LOOCV accuracies are computed during `fit`.
    #[must_use]
    pub fn with_loocv(mut self, loocv: LoocvMode) -> Self {
        self.loocv = loocv;
        self
    }

    /// Use lower bounds when classifying in [`evaluate`](Self::evaluate).
    #[must_use]
    pub fn with_lower_bound_prediction(mut self, enabled: bool) -> Self {
        self.lower_bound_prediction = enabled;
        self
    }

    /// Transform applied to training and query series.
    #[must_use]
    pub fn with_transform(mut self, transform: SeriesTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Fix the parameters instead of searching the grid.
    #[must_use]
    pub fn with_params(mut self, params: M) -> Self {
        self.fixed = Some(params);
        self
    }

    /// Use only the first `limit` training series as LOOCV queries.
    ///
    /// Supported by [`LoocvMode::Naive`] and [`LoocvMode::LowerBound`].
    #[must_use]
    pub fn with_loocv_limit(mut self, limit: Option<usize>) -> Self {
        self.loocv_limit = limit;
        self
    }

    /// LOOCV mode.
    #[must_use]
    pub fn loocv(&self) -> LoocvMode {
        self.loocv
    }

    /// Whether `evaluate` prunes with lower bounds.
    #[must_use]
    pub fn lower_bound_prediction(&self) -> bool {
        self.lower_bound_prediction
    }

    /// Series transform.
    #[must_use]
    pub fn transform(&self) -> SeriesTransform {
        self.transform
    }

    /// LOOCV query limit, if any.
    #[must_use]
    pub fn loocv_limit(&self) -> Option<usize> {
        self.loocv_limit
    }

    /// Whether `fit` has succeeded.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Parameters in use: the chosen grid entry once fitted, else the fixed
    /// parameters if set.
    #[must_use]
    pub fn active_params(&self) -> Option<M> {
        match &self.fitted {
            Some(fitted) => Some(*fitted.params()),
            None => self.fixed,
        }
    }

    /// Human-readable description of the active parameters.
    #[must_use]
    pub fn param_information(&self) -> String {
        match self.active_params() {
            Some(params) => format!("{}: {params}", M::NAME),
            None => format!("{}: unset", M::NAME),
        }
    }

    /// Choose parameters on `train` and keep it for classification.
    ///
    /// The training set is transformed, then every grid entry (or the fixed
    /// parameters) is scored by LOOCV. The first entry with the highest
    /// accuracy wins.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`NnError::Preprocess`] / [`NnError::SeriesTooShort`] | The transform fails on a series |
    /// | [`NnError::Distance`] | A grid parameter is rejected |
    /// | [`NnError::InvalidLoocvLimit`] | The LOOCV limit is zero |
    /// | [`NnError::LoocvLimitUnsupported`] | A LOOCV limit with the fast search |
    #[instrument(skip_all, fields(measure = M::NAME, n_series = train.len(), mode = ?self.loocv))]
    pub fn fit(&mut self, train: &Dataset) -> Result<TrainingResults, NnError> {
        let start = Instant::now();
        self.fitted = None;

        let train = self.transform.apply(train)?;
        let mut cache = SequenceCache::new(&train);
        let grid = match self.fixed {
            Some(params) => vec![params],
            None => M::grid(&train)?,
        };

        let mut outcome = loocv::run(self.loocv, &train, &mut cache, &grid, self.loocv_limit)?;
        let chosen = first_best(&outcome.param_accuracies);
        let accuracy = outcome.param_accuracies[chosen];

        cache.clear_envelopes();
        if let BoundBasis::Envelope(key) = grid[chosen].bound_basis() {
            cache.warm(key, &train);
        }

        let elapsed = start.elapsed();
        info!(
            params = %grid[chosen],
            chosen_param_id = chosen,
            accuracy,
            exact_evaluations = outcome.exact_evaluations,
            elapsed_ms = elapsed.as_millis() as u64,
            "parameters chosen"
        );

        let results = TrainingResults {
            accuracy,
            predictions: outcome.predictions.swap_remove(chosen),
            chosen_param_id: chosen,
            params: grid[chosen].to_string(),
            param_accuracies: outcome.param_accuracies,
            exact_evaluations: outcome.exact_evaluations,
            mode: self.loocv,
            elapsed,
        };
        self.fitted = Some(Fitted {
            train,
            cache,
            grid,
            chosen,
        });
        Ok(results)
    }

    /// Class of `query` by an exact scan of the training set.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`NnError::NotFitted`] | `fit` has not succeeded |
    /// | [`NnError::Distance`] | `query` is empty or not finite |
    /// | [`NnError::Preprocess`] | The transform fails on `query` |
    /// | [`NnError::QueryLengthMismatch`] | Transformed length differs from the training series |
    pub fn predict(&self, query: &[f64]) -> Result<usize, NnError> {
        let fitted = self.fitted.as_ref().ok_or(NnError::NotFitted)?;
        let query = self.prepare_query(fitted, query)?;
        let mut workspace = Workspace::with_capacity(query.len());
        let scan = exact_nearest(fitted.params(), &fitted.train, query.as_view(), None, &mut workspace);
        scan.class.ok_or(NnError::EmptyDataset)
    }

    /// Class of `query`, skipping training series whose lower bound already
    /// exceeds the best distance. Always equal to [`predict`](Self::predict).
    ///
    /// # Errors
    ///
    /// Same as [`predict`](Self::predict).
    pub fn predict_with_lower_bound(&self, query: &[f64]) -> Result<usize, NnError> {
        let fitted = self.fitted.as_ref().ok_or(NnError::NotFitted)?;
        let query = self.prepare_query(fitted, query)?;
        let mut workspace = Workspace::with_capacity(query.len());
        let scan = bounded_nearest(
            fitted.params(),
            &fitted.train,
            &fitted.cache,
            query.as_view(),
            None,
            &mut workspace,
        );
        scan.class.ok_or(NnError::EmptyDataset)
    }

    /// Classify every series of `test` in parallel.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`NnError::NotFitted`] | `fit` has not succeeded |
    /// | [`NnError::Preprocess`] / [`NnError::SeriesTooShort`] | The transform fails on a series |
    /// | [`NnError::QueryLengthMismatch`] | Test and training lengths differ |
    #[instrument(skip_all, fields(measure = M::NAME, n_series = test.len()))]
    pub fn evaluate(&self, test: &Dataset) -> Result<ClassificationResults, NnError> {
        let start = Instant::now();
        let fitted = self.fitted.as_ref().ok_or(NnError::NotFitted)?;
        let test = self.transform.apply(test)?;
        let len = fitted.train.series_len();
        if test.series_len() != len {
            return Err(NnError::QueryLengthMismatch {
                expected: len,
                found: test.series_len(),
            });
        }

        let bounded = self.lower_bound_prediction;
        let predictions: Vec<usize> = (0..test.len())
            .into_par_iter()
            .map_init(
                || Workspace::with_capacity(len),
                |workspace, i| {
                    let query = test.series(i);
                    let scan: ScanOutcome = if bounded {
                        bounded_nearest(fitted.params(), &fitted.train, &fitted.cache, query, None, workspace)
                    } else {
                        exact_nearest(fitted.params(), &fitted.train, query, None, workspace)
                    };
                    scan.class
                },
            )
            .collect::<Option<Vec<_>>>()
            .ok_or(NnError::EmptyDataset)?;

        let n_classes = fitted.train.n_classes().max(test.n_classes());
        let confusion = ConfusionMatrix::from_labels(test.labels(), &predictions, n_classes)?;
        let accuracy = confusion.accuracy();
        let elapsed = start.elapsed();
        info!(
            accuracy,
            n_series = test.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "evaluation complete"
        );

        Ok(ClassificationResults {
            accuracy,
            confusion,
            predictions,
            elapsed,
        })
    }

    fn prepare_query(&self, fitted: &Fitted<M>, query: &[f64]) -> Result<TimeSeries, NnError> {
        let query = self.transform.apply_series(&TimeSeries::new(query.to_vec())?)?;
        let expected = fitted.train.series_len();
        if query.len() != expected {
            return Err(NnError::QueryLengthMismatch {
                expected,
                found: query.len(),
            });
        }
        Ok(query)
    }
}

/// Index of the first maximum.
fn first_best(accuracies: &[f64]) -> usize {
    let mut best = 0;
    for (i, &accuracy) in accuracies.iter().enumerate() {
        if accuracy > accuracies[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use warpsearch_distance::{Dtw, Euclidean};

    use super::*;

    fn tie_train() -> Dataset {
        Dataset::new(
            vec![
                vec![1.0, 1.0, 1.0, 1.0],
                vec![-1.0, -1.0, -1.0, -1.0],
                vec![1.0, -1.0, 1.0, -1.0],
            ],
            vec![0, 1, 2],
        )
        .unwrap()
    }

    #[test]
    fn first_best_prefers_earliest() {
        assert_eq!(first_best(&[0.5, 0.9, 0.9, 0.1]), 1);
        assert_eq!(first_best(&[0.0]), 0);
    }

    #[test]
    fn unfitted_classifier_refuses_to_predict() {
        let nn = OneNearestNeighbour::<Euclidean>::new();
        assert_eq!(nn.predict(&[0.0, 1.0]).unwrap_err(), NnError::NotFitted);
        assert!(!nn.is_fitted());
        assert_eq!(nn.param_information(), "ED: unset");
    }

    #[test]
    fn equidistant_neighbours_pick_first_class() {
        let mut nn = OneNearestNeighbour::new().with_params(Dtw::unconstrained());
        nn.fit(&tie_train()).unwrap();
        let query = [0.0, 0.0, 0.0, 0.0];
        for _ in 0..3 {
            assert_eq!(nn.predict(&query).unwrap(), 0);
            assert_eq!(nn.predict_with_lower_bound(&query).unwrap(), 0);
        }
    }

    #[test]
    fn query_length_is_checked() {
        let mut nn = OneNearestNeighbour::new().with_params(Euclidean);
        nn.fit(&tie_train()).unwrap();
        assert_eq!(
            nn.predict(&[0.0, 0.0]).unwrap_err(),
            NnError::QueryLengthMismatch {
                expected: 4,
                found: 2
            }
        );
    }

    #[test]
    fn fixed_params_are_reported() {
        let mut nn = OneNearestNeighbour::new().with_params(Dtw::with_window(2));
        assert_eq!(nn.active_params(), Some(Dtw::with_window(2)));
        let results = nn.fit(&tie_train()).unwrap();
        assert_eq!(results.chosen_param_id, 0);
        assert_eq!(results.param_accuracies.len(), 1);
        assert_eq!(nn.param_information(), "DTW: window=2");
    }

    #[test]
    fn limit_with_fast_search_is_rejected() {
        let mut nn = OneNearestNeighbour::<Euclidean>::new().with_loocv_limit(Some(2));
        assert_eq!(
            nn.fit(&tie_train()).unwrap_err(),
            NnError::LoocvLimitUnsupported
        );
        assert!(!nn.is_fitted());
    }
}
