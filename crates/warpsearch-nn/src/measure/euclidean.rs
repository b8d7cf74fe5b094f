use warpsearch_distance::{Euclidean, TimeSeriesView};

use super::{BoundBasis, Measure, ParamShift, Schedule};
use crate::cache::SeriesStats;
use crate::dataset::Dataset;
use crate::error::NnError;

impl Measure for Euclidean {
    const NAME: &'static str = "ED";
    const SCHEDULE: Schedule = Schedule::Ascending;
    const BACKWARD_PASS: bool = false;

    /// A single, parameter-free entry.
    fn grid(_train: &Dataset) -> Result<Vec<Self>, NnError> {
        Ok(vec![Euclidean])
    }

    fn shift(&self, _next: &Self) -> ParamShift {
        ParamShift::Same
    }

    fn exact_covers(&self, _validity: usize, _next: &Self) -> bool {
        true
    }

    fn bound_basis(&self) -> BoundBasis {
        BoundBasis::Pointwise
    }

    fn cheap_bound(
        &self,
        query: TimeSeriesView<'_>,
        _query_stats: &SeriesStats,
        reference: TimeSeriesView<'_>,
        _reference_stats: &SeriesStats,
    ) -> f64 {
        (query.first() - reference.first()).powi(2) + (query.last() - reference.last()).powi(2)
    }

    /// The exact squared difference; `lower == upper` for pointwise counterparts.
    fn bound_term(&self, value: f64, lower: f64, _upper: f64, _len: usize) -> f64 {
        (value - lower).powi(2)
    }
}
