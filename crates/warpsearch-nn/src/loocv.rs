//! Leave-one-out accuracy of every candidate parameter.

use rayon::prelude::*;
use tracing::{debug, instrument};
use warpsearch_distance::Workspace;

use crate::cache::SequenceCache;
use crate::config::LoocvMode;
use crate::dataset::Dataset;
use crate::error::NnError;
use crate::measure::{BoundBasis, Measure};
use crate::scan::{ScanOutcome, bounded_nearest, exact_nearest};
use crate::search::NnTable;

/// Per-parameter LOOCV results.
#[derive(Debug, Clone)]
pub(crate) struct LoocvOutcome {
    pub(crate) param_accuracies: Vec<f64>,
    /// `predictions[p][s]`, `None` past the query limit or without a neighbour.
    pub(crate) predictions: Vec<Vec<Option<usize>>>,
    pub(crate) exact_evaluations: usize,
}

/// Run `mode` over every entry of `grid`.
///
/// With `limit = Some(k)` only the first `k` training series are used as
/// queries and accuracies are over those `k`.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`NnError::InvalidLoocvLimit`] | `limit` is `Some(0)` |
/// | [`NnError::LoocvLimitUnsupported`] | `limit` is set with [`LoocvMode::FastSearch`] |
#[instrument(skip_all, fields(measure = M::NAME, mode = ?mode, n_params = grid.len(), n_series = train.len()))]
pub(crate) fn run<M: Measure>(
    mode: LoocvMode,
    train: &Dataset,
    cache: &mut SequenceCache,
    grid: &[M],
    limit: Option<usize>,
) -> Result<LoocvOutcome, NnError> {
    let n_queries = match (limit, mode) {
        (Some(0), _) => return Err(NnError::InvalidLoocvLimit { limit: 0 }),
        (Some(_), LoocvMode::FastSearch) => return Err(NnError::LoocvLimitUnsupported),
        (Some(k), _) => k.min(train.len()),
        (None, _) => train.len(),
    };

    let outcome = match mode {
        LoocvMode::FastSearch => fast_search(train, cache, grid),
        LoocvMode::Naive => scan_each(train, grid, n_queries, |params, ws, q| {
            exact_nearest(params, train, train.series(q), Some(q), ws)
        }),
        LoocvMode::LowerBound => lower_bound(train, cache, grid, n_queries),
    };

    for (p, accuracy) in outcome.param_accuracies.iter().enumerate() {
        debug!(param = p, params = %grid[p], accuracy, "loocv accuracy");
    }
    debug!(exact_evaluations = outcome.exact_evaluations, "loocv complete");
    Ok(outcome)
}

fn fast_search<M: Measure>(train: &Dataset, cache: &mut SequenceCache, grid: &[M]) -> LoocvOutcome {
    let table = NnTable::build(train, cache, grid);
    LoocvOutcome {
        param_accuracies: (0..grid.len()).map(|p| table.accuracy(p, train.labels())).collect(),
        predictions: (0..grid.len()).map(|p| table.predictions(p)).collect(),
        exact_evaluations: table.exact_evaluations(),
    }
}

fn lower_bound<M: Measure>(train: &Dataset, cache: &mut SequenceCache, grid: &[M], n_queries: usize) -> LoocvOutcome {
    let mut outcome = empty_outcome(grid.len());
    for params in grid {
        if let BoundBasis::Envelope(key) = params.bound_basis() {
            cache.warm(key, train);
        }
        let shared: &SequenceCache = cache;
        let scans = scan_queries(train, n_queries, |ws, q| {
            bounded_nearest(params, train, shared, train.series(q), Some(q), ws)
        });
        record(&mut outcome, train, &scans);
        cache.clear_envelopes();
    }
    outcome
}

fn scan_each<M, F>(train: &Dataset, grid: &[M], n_queries: usize, scan: F) -> LoocvOutcome
where
    M: Measure,
    F: Fn(&M, &mut Workspace, usize) -> ScanOutcome + Sync,
{
    let mut outcome = empty_outcome(grid.len());
    for params in grid {
        let scans = scan_queries(train, n_queries, |ws, q| scan(params, ws, q));
        record(&mut outcome, train, &scans);
    }
    outcome
}

/// Scan the first `n_queries` training series in parallel, one workspace per worker.
fn scan_queries<F>(train: &Dataset, n_queries: usize, scan: F) -> Vec<ScanOutcome>
where
    F: Fn(&mut Workspace, usize) -> ScanOutcome + Sync,
{
    let len = train.series_len();
    (0..n_queries)
        .into_par_iter()
        .map_init(|| Workspace::with_capacity(len), |ws, q| scan(ws, q))
        .collect()
}

fn empty_outcome(n_params: usize) -> LoocvOutcome {
    LoocvOutcome {
        param_accuracies: Vec::with_capacity(n_params),
        predictions: Vec::with_capacity(n_params),
        exact_evaluations: 0,
    }
}

fn record(outcome: &mut LoocvOutcome, train: &Dataset, scans: &[ScanOutcome]) {
    let correct = scans
        .iter()
        .enumerate()
        .filter(|&(q, scan)| scan.class == Some(train.label(q)))
        .count();
    let mut predictions: Vec<Option<usize>> = scans.iter().map(|scan| scan.class).collect();
    predictions.resize(train.len(), None);

    outcome.param_accuracies.push(correct as f64 / scans.len() as f64);
    outcome.predictions.push(predictions);
    outcome.exact_evaluations += scans.iter().map(|scan| scan.exact_evaluations).sum::<usize>();
}

#[cfg(test)]
mod tests {
    use warpsearch_distance::{Dtw, Euclidean};

    use super::*;

    fn train() -> Dataset {
        Dataset::new(
            vec![
                vec![0.0, 1.0, 2.0, 1.0, 0.0],
                vec![3.0, 3.0, 2.0, 3.0, 3.0],
                vec![0.0, 1.0, 2.0, 1.5, 0.0],
                vec![3.0, 2.5, 2.0, 3.0, 3.0],
                vec![0.5, 1.0, 2.0, 1.0, 0.0],
            ],
            vec![0, 1, 0, 1, 0],
        )
        .unwrap()
    }

    #[test]
    fn modes_agree_on_separable_data() {
        let ds = train();
        let grid: Vec<Dtw> = (0..3).map(Dtw::with_window).collect();
        for mode in [LoocvMode::Naive, LoocvMode::LowerBound, LoocvMode::FastSearch] {
            let mut cache = SequenceCache::new(&ds);
            let outcome = run(mode, &ds, &mut cache, &grid, None).unwrap();
            assert_eq!(outcome.param_accuracies, vec![1.0; 3], "{mode:?}");
            assert_eq!(outcome.predictions[0].len(), ds.len());
        }
    }

    #[test]
    fn limit_restricts_queries() {
        let ds = train();
        let mut cache = SequenceCache::new(&ds);
        let outcome = run(LoocvMode::Naive, &ds, &mut cache, &[Euclidean], Some(2)).unwrap();
        assert_eq!(outcome.param_accuracies, vec![1.0]);
        assert_eq!(outcome.exact_evaluations, 2 * 4);
        assert_eq!(outcome.predictions[0][2..], [None, None, None]);
    }

    #[test]
    fn limit_is_validated() {
        let ds = train();
        let mut cache = SequenceCache::new(&ds);
        assert_eq!(
            run(LoocvMode::Naive, &ds, &mut cache, &[Euclidean], Some(0)).unwrap_err(),
            NnError::InvalidLoocvLimit { limit: 0 }
        );
        assert_eq!(
            run(LoocvMode::FastSearch, &ds, &mut cache, &[Euclidean], Some(3)).unwrap_err(),
            NnError::LoocvLimitUnsupported
        );
    }

    #[test]
    fn lower_bound_mode_leaves_cache_clear() {
        let ds = train();
        let mut cache = SequenceCache::new(&ds);
        run(LoocvMode::LowerBound, &ds, &mut cache, &[Dtw::with_window(1)], None).unwrap();
        assert_eq!(cache.envelope_count(), 0);
    }
}
