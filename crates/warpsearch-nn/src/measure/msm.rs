use warpsearch_distance::{Msm, TimeSeriesView, distance_to_interval};

use super::{BoundBasis, GRID_SIZE, Measure, ParamShift, Schedule};
use crate::cache::SeriesStats;
use crate::dataset::Dataset;
use crate::error::NnError;

/// Split/merge cost at grid index `p`: 25 steps each over
/// `[0.01, 0.1]`, `(0.1, 1]`, `(1, 10]` and `(10, 100]`.
pub(crate) fn msm_cost(p: usize) -> f64 {
    if p < 25 {
        return 0.01 + p as f64 * 0.00375;
    }
    let (base, step) = [(0.1, 0.036), (1.0, 0.36), (10.0, 3.6)][(p - 25) / 25];
    base + ((p - 25) % 25 + 1) as f64 * step
}

impl Measure for Msm {
    const NAME: &'static str = "MSM";
    const SCHEDULE: Schedule = Schedule::Ascending;

    fn grid(_train: &Dataset) -> Result<Vec<Self>, NnError> {
        (0..GRID_SIZE)
            .map(|p| Msm::new(msm_cost(p)).map_err(NnError::from))
            .collect()
    }

    fn shift(&self, next: &Self) -> ParamShift {
        if next.cost() == self.cost() {
            ParamShift::Same
        } else if next.cost() > self.cost() {
            ParamShift::Tighter
        } else {
            ParamShift::Incompatible
        }
    }

    fn exact_covers(&self, _validity: usize, next: &Self) -> bool {
        next == self
    }

    fn bound_basis(&self) -> BoundBasis {
        BoundBasis::Range
    }

    /// The first cell is always a move; the last is a move or costs at least `c`.
    fn cheap_bound(
        &self,
        query: TimeSeriesView<'_>,
        _query_stats: &SeriesStats,
        reference: TimeSeriesView<'_>,
        _reference_stats: &SeriesStats,
    ) -> f64 {
        (query.first() - reference.first()).abs()
            + (query.last() - reference.last()).abs().min(self.cost())
    }

    /// Each point is either moved onto a value of the other series or split off at cost `c`.
    fn bound_term(&self, value: f64, lower: f64, upper: f64, _len: usize) -> f64 {
        distance_to_interval(value, lower, upper).min(self.cost())
    }
}
