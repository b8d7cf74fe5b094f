//! Incrementally tightened lower bounds for one pair of training series.
//!
//! A [`LazyAssessor`] answers "can this pair beat `threshold`?" as cheaply
//! as possible. It escalates through bounds of increasing cost and keeps
//! whatever it computed, so later calls with another threshold or a tighter
//! parameter setting resume instead of starting over:
//!
//! ```text
//! Fresh ─► Kim ─► PartialForward ─► FullForward ─► PartialBackward ─► FullBackward ─► Exact
//!   ▲                                                                                   │
//!   └──── incompatible parameters            tighter parameters ─► PreviousBound/PreviousExact
//! ```

use warpsearch_distance::{TimeSeriesView, Workspace};

use crate::cache::{SequenceCache, SeriesStats};
use crate::dataset::Dataset;
use crate::measure::{Counterpart, Measure, ParamShift};

/// Which bound the assessor currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundStage {
    /// Nothing computed for the current parameters.
    Fresh,
    /// The O(1) endpoint bound.
    Kim,
    /// Part of the reference-against-query-envelope pass.
    PartialForward,
    /// The complete reference-against-query-envelope pass.
    FullForward,
    /// Part of the query-against-reference-envelope pass.
    PartialBackward,
    /// The complete query-against-reference-envelope pass.
    FullBackward,
    /// A bound carried over from looser parameters.
    PreviousBound,
    /// An exact distance from looser parameters, now only a bound.
    PreviousExact,
    /// The exact distance under the current parameters.
    Exact,
}

/// Outcome of [`LazyAssessor::try_to_beat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refinement {
    /// A lower bound already exceeds the threshold.
    PrunedWithBound,
    /// The exact distance exceeds the threshold.
    PrunedWithDistance,
    /// The exact distance is at most the threshold; read it with [`LazyAssessor::distance`].
    NewBest,
}

/// Borrowed state shared by every assessor of one search.
#[derive(Debug)]
pub struct AssessContext<'a> {
    pub(crate) dataset: &'a Dataset,
    pub(crate) cache: &'a mut SequenceCache,
    pub(crate) workspace: &'a mut Workspace,
    pub(crate) exact_evaluations: usize,
}

impl<'a> AssessContext<'a> {
    /// Bundle a dataset with its cache and a DP workspace.
    pub fn new(dataset: &'a Dataset, cache: &'a mut SequenceCache, workspace: &'a mut Workspace) -> Self {
        Self {
            dataset,
            cache,
            workspace,
            exact_evaluations: 0,
        }
    }

    /// Number of exact distance computations made through this context.
    #[must_use]
    pub fn exact_evaluations(&self) -> usize {
        self.exact_evaluations
    }
}

/// Rank weight of a bound carried over from looser parameters.
const REUSE_DISCOUNT: f64 = 0.8;

/// Lazily refined lower bound for the pair `(query, reference)`, `query < reference`.
#[derive(Debug, Clone)]
pub struct LazyAssessor<M: Measure> {
    query: usize,
    reference: usize,
    len: usize,
    stage: BoundStage,
    /// Best lower bound, or the exact distance in `Exact`.
    best: f64,
    running: f64,
    cursor: usize,
    old_cursor: usize,
    validity: usize,
    current: Option<M>,
    exact_at: Option<M>,
}

#[derive(Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

impl<M: Measure> LazyAssessor<M> {
    /// Create a fresh assessor for series of `len` points.
    #[must_use]
    pub fn new(query: usize, reference: usize, len: usize) -> Self {
        Self {
            query,
            reference,
            len,
            stage: BoundStage::Fresh,
            best: 0.0,
            running: 0.0,
            cursor: 0,
            old_cursor: 0,
            validity: 0,
            current: None,
            exact_at: None,
        }
    }

    /// Reuse this assessor for another pair, discarding all state.
    pub fn reset(&mut self, query: usize, reference: usize) {
        self.query = query;
        self.reference = reference;
        self.forget();
        self.current = None;
    }

    /// Query index.
    #[must_use]
    pub fn query(&self) -> usize {
        self.query
    }

    /// Reference index.
    #[must_use]
    pub fn reference(&self) -> usize {
        self.reference
    }

    /// Current stage.
    #[must_use]
    pub fn stage(&self) -> BoundStage {
        self.stage
    }

    /// Best lower bound held so far (the distance itself once `Exact`).
    #[must_use]
    pub fn lower_bound(&self) -> f64 {
        self.best
    }

    /// Exact distance under the current parameters.
    ///
    /// Only meaningful in [`BoundStage::Exact`].
    #[must_use]
    pub fn distance(&self) -> f64 {
        debug_assert_eq!(self.stage, BoundStage::Exact, "distance read before it was computed");
        self.best
    }

    /// Smallest window for which [`LazyAssessor::distance`] stays exact.
    ///
    /// Only meaningful in [`BoundStage::Exact`].
    #[must_use]
    pub fn validity(&self) -> usize {
        debug_assert_eq!(self.stage, BoundStage::Exact, "validity read before it was computed");
        self.validity
    }

    /// Sort key for challengers: the bound normalised by the work behind it.
    ///
    /// Lower ranks are tried first.
    #[must_use]
    pub fn rank(&self) -> f64 {
        match self.stage {
            BoundStage::Fresh => 0.0,
            BoundStage::Kim => self.best / M::KIM_OPS as f64,
            BoundStage::PartialForward | BoundStage::PartialBackward => {
                self.best / self.cursor.max(1) as f64
            }
            BoundStage::FullForward | BoundStage::FullBackward | BoundStage::Exact => {
                self.best / self.len as f64
            }
            BoundStage::PreviousBound => {
                if self.old_cursor == 0 {
                    0.0
                } else {
                    REUSE_DISCOUNT * self.best / self.old_cursor as f64
                }
            }
            BoundStage::PreviousExact => REUSE_DISCOUNT * self.best / self.len as f64,
        }
    }

    /// Move to `params`, keeping whatever stays valid.
    pub fn apply_params(&mut self, params: &M) {
        let Some(previous) = self.current else {
            self.current = Some(*params);
            return;
        };
        match previous.shift(params) {
            ParamShift::Same => {}
            ParamShift::Incompatible => self.forget(),
            ParamShift::Tighter => self.tighten(params),
        }
        self.current = Some(*params);
    }

    /// Decide whether the pair's distance under `params` is at most `threshold`.
    ///
    /// Bounds are compared strictly, so a pair whose distance equals the
    /// threshold always reaches [`BoundStage::Exact`] and is reported as
    /// [`Refinement::NewBest`].
    pub fn try_to_beat(&mut self, ctx: &mut AssessContext<'_>, threshold: f64, params: &M) -> Refinement {
        self.apply_params(params);

        if self.stage == BoundStage::Exact {
            return self.judge(threshold);
        }
        if self.best > threshold {
            return Refinement::PrunedWithBound;
        }

        if matches!(
            self.stage,
            BoundStage::Fresh | BoundStage::PreviousBound | BoundStage::PreviousExact
        ) {
            let query = ctx.dataset.series(self.query);
            let reference = ctx.dataset.series(self.reference);
            let kim = params.cheap_bound(
                query,
                ctx.cache.stats(self.query),
                reference,
                ctx.cache.stats(self.reference),
            );
            self.best = self.best.max(kim);
            self.stage = BoundStage::Kim;
            if self.best > threshold {
                return Refinement::PrunedWithBound;
            }
        }

        if self.stage == BoundStage::Kim {
            self.begin_pass(BoundStage::PartialForward);
        }
        if self.stage == BoundStage::PartialForward && self.pass(ctx, threshold, params, Direction::Forward) {
            return Refinement::PrunedWithBound;
        }

        if self.stage == BoundStage::FullForward && M::BACKWARD_PASS {
            self.begin_pass(BoundStage::PartialBackward);
        }
        if self.stage == BoundStage::PartialBackward && self.pass(ctx, threshold, params, Direction::Backward) {
            return Refinement::PrunedWithBound;
        }

        self.exact(ctx, threshold, params)
    }

    fn forget(&mut self) {
        self.stage = BoundStage::Fresh;
        self.best = 0.0;
        self.running = 0.0;
        self.cursor = 0;
        self.old_cursor = 0;
        self.validity = 0;
        self.exact_at = None;
    }

    fn tighten(&mut self, params: &M) {
        match self.stage {
            BoundStage::Fresh | BoundStage::PreviousBound | BoundStage::PreviousExact => {}
            BoundStage::Exact => {
                let covered = self
                    .exact_at
                    .is_some_and(|at| at.exact_covers(self.validity, params));
                if !covered {
                    self.stage = BoundStage::PreviousExact;
                }
            }
            BoundStage::Kim
            | BoundStage::PartialForward
            | BoundStage::FullForward
            | BoundStage::PartialBackward
            | BoundStage::FullBackward => {
                self.old_cursor = self.cursor;
                self.stage = BoundStage::PreviousBound;
            }
        }
        if self.stage != BoundStage::Exact {
            self.running = 0.0;
            self.cursor = 0;
        }
    }

    fn begin_pass(&mut self, stage: BoundStage) {
        self.stage = stage;
        self.running = 0.0;
        self.cursor = 0;
    }

    /// Advance the current pass until its bound exceeds `threshold` or it
    /// covers every point. Returns true if the pair is pruned.
    fn pass(&mut self, ctx: &mut AssessContext<'_>, threshold: f64, params: &M, direction: Direction) -> bool {
        let (own, other) = match direction {
            Direction::Forward => (self.reference, self.query),
            Direction::Backward => (self.query, self.reference),
        };
        let values = ctx.dataset.series(own).as_slice();
        let counterpart = Counterpart::resolve(params, ctx.cache, other, ctx.dataset.series(other).as_slice());

        accumulate(
            params,
            values,
            ctx.cache.stats(own),
            &counterpart,
            threshold,
            &mut self.running,
            &mut self.cursor,
        );

        self.best = self.best.max(params.bound_from_sum(self.running, self.len));
        if self.cursor == self.len {
            self.stage = match direction {
                Direction::Forward => BoundStage::FullForward,
                Direction::Backward => BoundStage::FullBackward,
            };
        }
        self.best > threshold
    }

    fn exact(&mut self, ctx: &mut AssessContext<'_>, threshold: f64, params: &M) -> Refinement {
        let query = ctx.dataset.series(self.query);
        let reference = ctx.dataset.series(self.reference);
        let ext = params.distance_ext_in(query, reference, ctx.workspace);
        ctx.exact_evaluations += 1;

        self.best = ext.distance;
        self.validity = ext.validity;
        self.stage = BoundStage::Exact;
        self.exact_at = Some(*params);
        self.judge(threshold)
    }

    fn judge(&self, threshold: f64) -> Refinement {
        if self.best > threshold {
            Refinement::PrunedWithDistance
        } else {
            Refinement::NewBest
        }
    }
}

/// Add bound terms for `values` against `counterpart` in decreasing
/// deviation order, starting at `*cursor`, while the bound stays at most
/// `threshold`.
pub(crate) fn accumulate<M: Measure>(
    params: &M,
    values: &[f64],
    stats: &SeriesStats,
    counterpart: &Counterpart<'_>,
    threshold: f64,
    running: &mut f64,
    cursor: &mut usize,
) {
    let len = values.len();
    while *cursor < len && params.bound_from_sum(*running, len) <= threshold {
        let k = stats.nth_highest_deviation(*cursor);
        let (lower, upper) = counterpart.at(k);
        *running += params.bound_term(values[k], lower, upper, len);
        *cursor += 1;
    }
}

/// Full two-way pass bound of `query` against `reference`, stopping early
/// once it exceeds `threshold`.
pub(crate) fn pass_bound<M: Measure>(
    params: &M,
    query: (TimeSeriesView<'_>, &SeriesStats, &Counterpart<'_>),
    reference: (TimeSeriesView<'_>, &SeriesStats, &Counterpart<'_>),
    threshold: f64,
) -> f64 {
    let len = query.0.len();
    let (mut running, mut cursor) = (0.0, 0);
    accumulate(params, reference.0.as_slice(), reference.1, query.2, threshold, &mut running, &mut cursor);
    let forward = params.bound_from_sum(running, len);
    if forward > threshold || !M::BACKWARD_PASS {
        return forward;
    }

    let (mut running, mut cursor) = (0.0, 0);
    accumulate(params, query.0.as_slice(), query.1, reference.2, threshold, &mut running, &mut cursor);
    forward.max(params.bound_from_sum(running, len))
}
