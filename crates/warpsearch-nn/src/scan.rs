//! Linear nearest-neighbour scans over a training set.

use warpsearch_distance::{TimeSeriesView, Workspace};

use crate::cache::{SequenceCache, SeriesStats};
use crate::dataset::Dataset;
use crate::lazy::pass_bound;
use crate::measure::{Counterpart, Measure};

/// Class votes of the neighbours tied at the smallest distance seen.
#[derive(Debug, Clone)]
pub(crate) struct VoteTally {
    best: f64,
    votes: Vec<usize>,
}

impl VoteTally {
    pub(crate) fn new(n_classes: usize) -> Self {
        Self {
            best: f64::INFINITY,
            votes: vec![0; n_classes],
        }
    }

    /// Distance a candidate must not exceed to count.
    pub(crate) fn threshold(&self) -> f64 {
        self.best
    }

    pub(crate) fn offer(&mut self, distance: f64, class: usize) {
        if distance < self.best {
            self.best = distance;
            self.votes.fill(0);
            self.votes[class] = 1;
        } else if distance == self.best {
            self.votes[class] += 1;
        }
    }

    /// Class with the most votes; the lowest class index wins a tie.
    pub(crate) fn winner(&self) -> Option<usize> {
        let mut best = None;
        let mut best_count = 0;
        for (class, &count) in self.votes.iter().enumerate() {
            if count > best_count {
                best = Some(class);
                best_count = count;
            }
        }
        best
    }
}

/// Result of one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScanOutcome {
    pub(crate) class: Option<usize>,
    pub(crate) exact_evaluations: usize,
}

/// Nearest-neighbour class of `query` by exact distances, abandoning each
/// one against the best distance so far. `skip` leaves one training series
/// out.
pub(crate) fn exact_nearest<M: Measure>(
    params: &M,
    train: &Dataset,
    query: TimeSeriesView<'_>,
    skip: Option<usize>,
    workspace: &mut Workspace,
) -> ScanOutcome {
    let mut tally = VoteTally::new(train.n_classes());
    let mut exact_evaluations = 0;
    for r in (0..train.len()).filter(|&r| Some(r) != skip) {
        let distance = params.distance_in(query, train.series(r), tally.threshold(), workspace);
        exact_evaluations += 1;
        tally.offer(distance, train.label(r));
    }
    ScanOutcome {
        class: tally.winner(),
        exact_evaluations,
    }
}

/// Same result as [`exact_nearest`], skipping references whose cheap bound
/// or envelope pass bound already exceeds the best distance so far.
///
/// When `skip` is `Some(i)` the query is training series `i` and its cached
/// statistics and envelopes are reused.
pub(crate) fn bounded_nearest<M: Measure>(
    params: &M,
    train: &Dataset,
    cache: &SequenceCache,
    query: TimeSeriesView<'_>,
    skip: Option<usize>,
    workspace: &mut Workspace,
) -> ScanOutcome {
    let detached_stats;
    let (query_stats, query_counterpart) = match skip {
        Some(i) => (
            cache.stats(i),
            Counterpart::cached(params, cache, i, query.as_slice()),
        ),
        None => {
            detached_stats = SeriesStats::compute(query.as_slice());
            (
                &detached_stats,
                Counterpart::detached(params, &detached_stats, query.as_slice()),
            )
        }
    };

    let mut tally = VoteTally::new(train.n_classes());
    let mut exact_evaluations = 0;
    for r in (0..train.len()).filter(|&r| Some(r) != skip) {
        let reference = train.series(r);
        let reference_stats = cache.stats(r);
        let threshold = tally.threshold();

        if params.cheap_bound(query, query_stats, reference, reference_stats) > threshold {
            continue;
        }
        let reference_counterpart = Counterpart::cached(params, cache, r, reference.as_slice());
        let bound = pass_bound(
            params,
            (query, query_stats, &query_counterpart),
            (reference, reference_stats, &reference_counterpart),
            threshold,
        );
        if bound > threshold {
            continue;
        }

        let distance = params.distance_in(query, reference, threshold, workspace);
        exact_evaluations += 1;
        tally.offer(distance, train.label(r));
    }
    ScanOutcome {
        class: tally.winner(),
        exact_evaluations,
    }
}

#[cfg(test)]
mod tests {
    use warpsearch_distance::{Dtw, Euclidean, Lcss, TimeSeries};

    use super::*;

    fn train() -> Dataset {
        Dataset::new(
            vec![
                vec![0.0, 1.0, 2.0, 1.0, 0.0, 0.0],
                vec![2.0, 2.0, 1.0, 0.0, 1.0, 2.0],
                vec![0.0, 0.5, 2.0, 1.5, 0.0, 0.0],
                vec![2.0, 1.5, 1.0, 0.5, 1.0, 2.0],
            ],
            vec![0, 1, 0, 1],
        )
        .unwrap()
    }

    #[test]
    fn tally_prefers_first_class_on_tie() {
        let mut tally = VoteTally::new(3);
        tally.offer(2.0, 2);
        tally.offer(1.0, 1);
        tally.offer(1.0, 0);
        assert_eq!(tally.winner(), Some(0));
        tally.offer(1.0, 1);
        assert_eq!(tally.winner(), Some(1));
        tally.offer(0.5, 2);
        assert_eq!(tally.winner(), Some(2));
    }

    #[test]
    fn empty_tally_has_no_winner() {
        assert_eq!(VoteTally::new(2).winner(), None);
    }

    #[test]
    fn bounded_scan_agrees_with_exact_scan() {
        let ds = train();
        let mut cache = SequenceCache::new(&ds);
        let mut ws = Workspace::new();
        let queries = [
            TimeSeries::new(vec![0.0, 1.0, 1.8, 1.2, 0.0, 0.0]).unwrap(),
            TimeSeries::new(vec![2.0, 1.8, 1.0, 0.2, 1.0, 2.2]).unwrap(),
            TimeSeries::new(vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0]).unwrap(),
        ];
        for q in &queries {
            let dtw = Dtw::with_window(1);
            let exact = exact_nearest(&dtw, &ds, q.as_view(), None, &mut ws);
            let bounded = bounded_nearest(&dtw, &ds, &cache, q.as_view(), None, &mut ws);
            assert_eq!(exact.class, bounded.class);
            assert!(bounded.exact_evaluations <= exact.exact_evaluations);

            let lcss = Lcss::new(0.3, 1).unwrap();
            let exact = exact_nearest(&lcss, &ds, q.as_view(), None, &mut ws);
            let bounded = bounded_nearest(&lcss, &ds, &cache, q.as_view(), None, &mut ws);
            assert_eq!(exact.class, bounded.class);
        }

        cache.warm(crate::cache::EnvelopeKey::window(1), &ds);
        for i in 0..ds.len() {
            let dtw = Dtw::with_window(1);
            let exact = exact_nearest(&dtw, &ds, ds.series(i), Some(i), &mut ws);
            let bounded = bounded_nearest(&dtw, &ds, &cache, ds.series(i), Some(i), &mut ws);
            assert_eq!(exact.class, bounded.class);
            assert_eq!(exact.class, Some(ds.label(i)));
        }
    }

    #[test]
    fn leave_one_out_skips_self() {
        let ds = train();
        let mut ws = Workspace::new();
        let outcome = exact_nearest(&Euclidean, &ds, ds.series(0), Some(0), &mut ws);
        assert_eq!(outcome.exact_evaluations, 3);
        assert_eq!(outcome.class, Some(0));
    }
}
