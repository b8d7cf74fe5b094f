use warpsearch_distance::{TimeSeriesView, Wdtw, distance_to_interval};

use super::{BoundBasis, GRID_SIZE, Measure, ParamShift, Schedule};
use crate::cache::SeriesStats;
use crate::dataset::Dataset;
use crate::error::NnError;

impl Measure for Wdtw {
    const NAME: &'static str = "WDTW";
    const SCHEDULE: Schedule = Schedule::Ascending;

    /// Steepness `p / 100` for `p` in `0..100`.
    fn grid(_train: &Dataset) -> Result<Vec<Self>, NnError> {
        (0..GRID_SIZE)
            .map(|p| Wdtw::new(p as f64 / 100.0).map_err(NnError::from))
            .collect()
    }

    /// Weights below the midpoint shrink as `g` grows, so no two settings
    /// are ordered.
    fn shift(&self, next: &Self) -> ParamShift {
        if next == self {
            ParamShift::Same
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

    /// Both corner cells sit on the diagonal and carry the smallest weight.
    fn cheap_bound(
        &self,
        query: TimeSeriesView<'_>,
        _query_stats: &SeriesStats,
        reference: TimeSeriesView<'_>,
        _reference_stats: &SeriesStats,
    ) -> f64 {
        let w0 = self.weight(0, query.len().max(reference.len()));
        w0 * ((query.first() - reference.first()).powi(2)
            + (query.last() - reference.last()).powi(2))
    }

    fn bound_term(&self, value: f64, lower: f64, upper: f64, len: usize) -> f64 {
        self.weight(0, len) * distance_to_interval(value, lower, upper).powi(2)
    }
}
