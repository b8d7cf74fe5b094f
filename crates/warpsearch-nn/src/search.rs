//! Fast parameter search: every training series' nearest neighbour under
//! every candidate parameter, in one pass over the pairs.

use tracing::{debug, instrument, warn};
use warpsearch_distance::Workspace;

use crate::cache::SequenceCache;
use crate::dataset::Dataset;
use crate::lazy::{AssessContext, LazyAssessor, Refinement};
use crate::measure::Measure;

/// How far a [`CandidateNn`] slot has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum NnStatus {
    /// No neighbour offered yet.
    Unset,
    /// Best neighbour seen so far; later series may still beat it.
    BestCandidate,
    /// True nearest neighbour among all lower-indexed series.
    ConfirmedNn,
}

/// Nearest neighbour of one series under one parameter.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct CandidateNn {
    /// Index of the neighbour, `None` while [`NnStatus::Unset`].
    pub index: Option<usize>,
    /// Distance to the neighbour, `f64::INFINITY` while unset.
    pub distance: f64,
    /// Smallest window for which `distance` stays exact, over all tied neighbours.
    pub validity: usize,
    /// Resolution state.
    pub status: NnStatus,
}

impl CandidateNn {
    const UNSET: Self = Self {
        index: None,
        distance: f64::INFINITY,
        validity: 0,
        status: NnStatus::Unset,
    };
}

/// Nearest-neighbour slots and class votes for `n_params x n_series` pairs.
///
/// Slot `(p, s)` holds the nearest neighbour of series `s` among all other
/// training series under parameter `p`. Exact distance ties accumulate one
/// class vote per tied neighbour.
#[derive(Debug, Clone)]
pub struct NnTable {
    n_params: usize,
    n_series: usize,
    n_classes: usize,
    slots: Vec<CandidateNn>,
    votes: Vec<usize>,
    exact_evaluations: usize,
}

impl NnTable {
    fn unset(n_params: usize, n_series: usize, n_classes: usize) -> Self {
        Self {
            n_params,
            n_series,
            n_classes,
            slots: vec![CandidateNn::UNSET; n_params * n_series],
            votes: vec![0; n_params * n_series * n_classes],
            exact_evaluations: 0,
        }
    }

    /// Build the table for `train` over every entry of `grid`.
    ///
    /// Pairs `(previous, current)` are visited with `current` ascending.
    /// Each pair keeps one [`LazyAssessor`] across the whole parameter
    /// schedule so bounds computed for one parameter carry over to the next.
    /// Once `current`'s neighbour is confirmed at a parameter it is copied to
    /// following parameters for which the distance provably stays exact.
    ///
    /// With fewer than two series every slot stays [`NnStatus::Unset`].
    #[instrument(skip_all, fields(measure = M::NAME, n_series = train.len(), n_params = grid.len()))]
    pub fn build<M: Measure>(train: &Dataset, cache: &mut SequenceCache, grid: &[M]) -> Self {
        let n = train.len();
        let mut table = Self::unset(grid.len(), n, train.n_classes());
        if n < 2 {
            warn!(n_series = n, "need at least two training series, nearest-neighbour table left empty");
            return table;
        }

        let len = train.series_len();
        let order = M::SCHEDULE.order(grid.len());
        let mut workspace = Workspace::with_capacity(len);
        let mut ctx = AssessContext::new(train, cache, &mut workspace);
        let mut pool: Vec<LazyAssessor<M>> = Vec::with_capacity(n);
        let mut challengers: Vec<(f64, usize)> = Vec::with_capacity(n);

        for current in 1..n {
            for previous in 0..current {
                match pool.get_mut(previous) {
                    Some(assessor) => assessor.reset(previous, current),
                    None => pool.push(LazyAssessor::new(previous, current, len)),
                }
            }
            let current_label = train.label(current);

            for (step, &p) in order.iter().enumerate() {
                let params = &grid[p];

                if table.slot(p, current).status == NnStatus::ConfirmedNn {
                    for (previous, assessor) in pool[..current].iter_mut().enumerate() {
                        let threshold = table.slot(p, previous).distance;
                        if assessor.try_to_beat(&mut ctx, threshold, params) == Refinement::NewBest {
                            let (d, v) = (assessor.distance(), assessor.validity());
                            table.offer(p, previous, current, d, v, current_label);
                        }
                    }
                    continue;
                }

                challengers.clear();
                for (previous, assessor) in pool[..current].iter_mut().enumerate() {
                    assessor.apply_params(params);
                    challengers.push((assessor.rank(), previous));
                }
                challengers.sort_by(|a, b| a.0.total_cmp(&b.0));

                for &(_, previous) in &challengers {
                    let assessor = &mut pool[previous];

                    let threshold = table.slot(p, current).distance;
                    if assessor.try_to_beat(&mut ctx, threshold, params) == Refinement::NewBest {
                        let (d, v) = (assessor.distance(), assessor.validity());
                        table.offer(p, current, previous, d, v, train.label(previous));
                    }

                    let threshold = table.slot(p, previous).distance;
                    if assessor.try_to_beat(&mut ctx, threshold, params) == Refinement::NewBest {
                        let (d, v) = (assessor.distance(), assessor.validity());
                        table.offer(p, previous, current, d, v, current_label);
                    }
                }

                table.confirm(p, current);
                let validity = table.slot(p, current).validity;
                for &next in &order[step + 1..] {
                    if !params.exact_covers(validity, &grid[next]) {
                        break;
                    }
                    table.copy_slot(p, next, current);
                }
            }
        }

        table.exact_evaluations = ctx.exact_evaluations();
        debug!(
            exact_evaluations = table.exact_evaluations,
            pairs = n * (n - 1) / 2,
            "nearest-neighbour table built"
        );
        table
    }

    /// Number of parameters.
    #[must_use]
    pub fn n_params(&self) -> usize {
        self.n_params
    }

    /// Number of training series.
    #[must_use]
    pub fn n_series(&self) -> usize {
        self.n_series
    }

    /// Exact distance computations the build needed.
    #[must_use]
    pub fn exact_evaluations(&self) -> usize {
        self.exact_evaluations
    }

    /// Slot of series `series` under parameter `param`.
    #[must_use]
    pub fn slot(&self, param: usize, series: usize) -> &CandidateNn {
        &self.slots[param * self.n_series + series]
    }

    /// Class votes of series `series` under parameter `param`.
    #[must_use]
    pub fn votes(&self, param: usize, series: usize) -> &[usize] {
        let start = (param * self.n_series + series) * self.n_classes;
        &self.votes[start..start + self.n_classes]
    }

    /// Class predicted for `series` under `param`: the highest vote count,
    /// ties going to the lowest class index as in a linear scan.
    #[must_use]
    pub fn predicted_class(&self, param: usize, series: usize) -> Option<usize> {
        self.slot(param, series).index?;
        let mut best = None;
        let mut best_count = 0;
        for (class, &count) in self.votes(param, series).iter().enumerate() {
            if count > best_count {
                best = Some(class);
                best_count = count;
            }
        }
        best
    }

    /// Like [`predicted_class`](Self::predicted_class), but a vote tie goes
    /// to the highest class index.
    #[must_use]
    pub fn predicted_class_last_max(&self, param: usize, series: usize) -> Option<usize> {
        self.slot(param, series).index?;
        let mut best = None;
        let mut best_count = 0;
        for (class, &count) in self.votes(param, series).iter().enumerate() {
            if count > 0 && count >= best_count {
                best = Some(class);
                best_count = count;
            }
        }
        best
    }

    /// Leave-one-out predictions for every series under `param`.
    #[must_use]
    pub fn predictions(&self, param: usize) -> Vec<Option<usize>> {
        (0..self.n_series)
            .map(|s| self.predicted_class(param, s))
            .collect()
    }

    /// Leave-one-out accuracy under `param`.
    #[must_use]
    pub fn accuracy(&self, param: usize, labels: &[usize]) -> f64 {
        if self.n_series == 0 {
            return 0.0;
        }
        let correct = labels
            .iter()
            .enumerate()
            .filter(|&(s, &label)| self.predicted_class(param, s) == Some(label))
            .count();
        correct as f64 / self.n_series as f64
    }

    fn offer(&mut self, param: usize, series: usize, neighbour: usize, distance: f64, validity: usize, class: usize) {
        let at = param * self.n_series + series;
        let slot = &mut self.slots[at];
        let votes = &mut self.votes[at * self.n_classes..(at + 1) * self.n_classes];
        if distance < slot.distance {
            slot.index = Some(neighbour);
            slot.distance = distance;
            slot.validity = validity;
            if slot.status == NnStatus::Unset {
                slot.status = NnStatus::BestCandidate;
            }
            votes.fill(0);
            votes[class] = 1;
        } else if distance == slot.distance {
            slot.validity = slot.validity.max(validity);
            votes[class] += 1;
        }
    }

    fn confirm(&mut self, param: usize, series: usize) {
        self.slots[param * self.n_series + series].status = NnStatus::ConfirmedNn;
    }

    fn copy_slot(&mut self, from: usize, to: usize, series: usize) {
        let (src, dst) = (from * self.n_series + series, to * self.n_series + series);
        self.slots[dst] = self.slots[src];
        let c = self.n_classes;
        self.votes.copy_within(src * c..(src + 1) * c, dst * c);
    }
}

#[cfg(test)]
mod tests {
    use warpsearch_distance::{Dtw, ElasticDistance, Euclidean};

    use super::*;

    fn toy() -> Dataset {
        Dataset::new(
            vec![
                vec![0.0, 1.0, 2.0, 1.0, 0.0],
                vec![0.0, 1.0, 2.0, 1.5, 0.0],
                vec![3.0, 3.0, 2.0, 3.0, 3.0],
                vec![3.0, 2.5, 2.0, 3.0, 3.0],
            ],
            vec![0, 0, 1, 1],
        )
        .unwrap()
    }

    #[test]
    fn single_series_gives_unset_table() {
        let ds = Dataset::new(vec![vec![1.0, 2.0, 3.0]], vec![0]).unwrap();
        let mut cache = SequenceCache::new(&ds);
        let table = NnTable::build(&ds, &mut cache, &[Euclidean]);
        assert_eq!(table.slot(0, 0).status, NnStatus::Unset);
        assert_eq!(table.predicted_class(0, 0), None);
        assert_eq!(table.accuracy(0, ds.labels()), 0.0);
    }

    #[test]
    fn slots_hold_true_nearest_neighbours() {
        let ds = toy();
        let mut cache = SequenceCache::new(&ds);
        let grid: Vec<Dtw> = (0..5).map(Dtw::with_window).collect();
        let table = NnTable::build(&ds, &mut cache, &grid);

        for (p, dtw) in grid.iter().enumerate() {
            for s in 0..ds.len() {
                let brute = (0..ds.len())
                    .filter(|&r| r != s)
                    .map(|r| dtw.distance(ds.series(s), ds.series(r)))
                    .fold(f64::INFINITY, f64::min);
                assert_eq!(table.slot(p, s).distance, brute, "param {p} series {s}");
            }
            assert_eq!(table.accuracy(p, ds.labels()), 1.0);
        }
    }

    #[test]
    fn last_series_is_confirmed() {
        let ds = toy();
        let mut cache = SequenceCache::new(&ds);
        let table = NnTable::build(&ds, &mut cache, &[Euclidean]);
        assert_eq!(table.slot(0, 3).status, NnStatus::ConfirmedNn);
        assert_eq!(table.slot(0, 3).index, Some(2));
        assert_eq!(table.slot(0, 0).index, Some(1));
    }

    #[test]
    fn equal_distances_add_votes() {
        let ds = Dataset::new(
            vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![-1.0, -1.0]],
            vec![0, 1, 2],
        )
        .unwrap();
        let mut cache = SequenceCache::new(&ds);
        let table = NnTable::build(&ds, &mut cache, &[Euclidean]);
        assert_eq!(table.votes(0, 0), &[0, 1, 1]);
        assert_eq!(table.slot(0, 0).distance, 2.0);
        assert_eq!(table.predicted_class(0, 0), Some(1));
        assert_eq!(table.predicted_class_last_max(0, 0), Some(2));
    }
}
