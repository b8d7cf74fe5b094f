use warpsearch_distance::{TimeSeriesView, Twe, distance_to_interval};

use super::{BoundBasis, GRID_SIZE, Measure, ParamShift, Schedule};
use crate::cache::SeriesStats;
use crate::dataset::Dataset;
use crate::error::NnError;

const STIFFNESS: [f64; 10] = [0.00001, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0];

impl Measure for Twe {
    const NAME: &'static str = "TWE";
    const SCHEDULE: Schedule = Schedule::Ascending;

    /// Index `p` uses stiffness `STIFFNESS[p / 10]` and penalty `(p % 10) / 90`.
    fn grid(_train: &Dataset) -> Result<Vec<Self>, NnError> {
        (0..GRID_SIZE)
            .map(|p| Twe::new(STIFFNESS[p / 10], (p % 10) as f64 * 0.1 / 9.0).map_err(NnError::from))
            .collect()
    }

    fn shift(&self, next: &Self) -> ParamShift {
        if next == self {
            ParamShift::Same
        } else if next.nu() >= self.nu() && next.lambda() >= self.lambda() {
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

    /// The first match is forced; the last step is a match or a deletion.
    fn cheap_bound(
        &self,
        query: TimeSeriesView<'_>,
        _query_stats: &SeriesStats,
        reference: TimeSeriesView<'_>,
        _reference_stats: &SeriesStats,
    ) -> f64 {
        (query.first() - reference.first()).abs()
            + (query.last() - reference.last())
                .abs()
                .min(self.nu() + self.lambda())
    }

    fn bound_term(&self, value: f64, lower: f64, upper: f64, _len: usize) -> f64 {
        distance_to_interval(value, lower, upper).min(self.nu() + self.lambda())
    }
}
