use warpsearch_distance::{Dtw, TimeSeriesView, distance_to_interval, window_from_percent};

use super::{BoundBasis, GRID_SIZE, Measure, ParamShift, Schedule};
use crate::cache::{EnvelopeKey, SeriesStats};
use crate::dataset::Dataset;
use crate::error::NnError;

impl Measure for Dtw {
    const NAME: &'static str = "DTW";
    const SCHEDULE: Schedule = Schedule::Descending;
    const KIM_OPS: usize = 3;

    /// Windows of 0% to 99% of the series length.
    fn grid(train: &Dataset) -> Result<Vec<Self>, NnError> {
        let len = train.series_len();
        Ok((0..GRID_SIZE)
            .map(|percent| Dtw::with_window(window_from_percent(percent, len)))
            .collect())
    }

    fn shift(&self, next: &Self) -> ParamShift {
        match next.window().cmp(&self.window()) {
            std::cmp::Ordering::Equal => ParamShift::Same,
            std::cmp::Ordering::Less => ParamShift::Tighter,
            std::cmp::Ordering::Greater => ParamShift::Incompatible,
        }
    }

    fn exact_covers(&self, validity: usize, next: &Self) -> bool {
        validity <= next.window() && next.window() <= self.window()
    }

    fn bound_basis(&self) -> BoundBasis {
        BoundBasis::Envelope(EnvelopeKey::window(self.window()))
    }

    /// LB_Kim: the first and last cells lie on every path. An extreme that
    /// sits at neither end of either series adds the larger of the min/max
    /// gaps, since its cell differs from both corner cells.
    fn cheap_bound(
        &self,
        query: TimeSeriesView<'_>,
        query_stats: &SeriesStats,
        reference: TimeSeriesView<'_>,
        reference_stats: &SeriesStats,
    ) -> f64 {
        let mut bound = (query.first() - reference.first()).powi(2)
            + (query.last() - reference.last()).powi(2);

        let mut extreme: f64 = 0.0;
        if !query_stats.min_at_endpoint() && !reference_stats.min_at_endpoint() {
            extreme = extreme.max((query_stats.min() - reference_stats.min()).powi(2));
        }
        if !query_stats.max_at_endpoint() && !reference_stats.max_at_endpoint() {
            extreme = extreme.max((query_stats.max() - reference_stats.max()).powi(2));
        }
        bound += extreme;
        bound
    }

    fn bound_term(&self, value: f64, lower: f64, upper: f64, _len: usize) -> f64 {
        distance_to_interval(value, lower, upper).powi(2)
    }
}

#[cfg(test)]
mod tests {
    use warpsearch_distance::{ElasticDistance, TimeSeries};

    use super::*;

    fn ts(values: &[f64]) -> TimeSeries {
        TimeSeries::new(values.to_vec()).unwrap()
    }

    #[test]
    fn grid_windows_descend_from_full() {
        let train = Dataset::new(vec![vec![0.0; 50], vec![1.0; 50]], vec![0, 1]).unwrap();
        let grid = Dtw::grid(&train).unwrap();
        assert_eq!(grid.len(), GRID_SIZE);
        assert_eq!(grid[0].window(), 0);
        assert_eq!(grid[1].window(), 1);
        assert_eq!(grid[99].window(), 50);
    }

    #[test]
    fn shift_and_cover() {
        let wide = Dtw::with_window(10);
        let narrow = Dtw::with_window(4);
        assert_eq!(wide.shift(&narrow), ParamShift::Tighter);
        assert_eq!(narrow.shift(&wide), ParamShift::Incompatible);
        assert_eq!(wide.shift(&wide), ParamShift::Same);
        assert!(wide.exact_covers(3, &narrow));
        assert!(!wide.exact_covers(5, &narrow));
        assert!(!narrow.exact_covers(0, &wide));
    }

    #[test]
    fn kim_never_exceeds_distance() {
        let a = ts(&[0.0, 3.0, -1.0, 2.0, 1.0]);
        let b = ts(&[1.0, -2.0, 4.0, 0.0, 0.5]);
        let sa = SeriesStats::compute(a.as_ref());
        let sb = SeriesStats::compute(b.as_ref());
        for window in 0..5 {
            let dtw = Dtw::with_window(window);
            let kim = dtw.cheap_bound(a.as_view(), &sa, b.as_view(), &sb);
            assert!(kim <= dtw.distance(a.as_view(), b.as_view()));
        }
    }

    #[test]
    fn kim_skips_extremes_at_endpoints() {
        let a = ts(&[0.0, 1.0, 2.0]);
        let b = ts(&[0.0, 5.0, 2.0]);
        let sa = SeriesStats::compute(a.as_ref());
        let sb = SeriesStats::compute(b.as_ref());
        let kim = Dtw::unconstrained().cheap_bound(a.as_view(), &sa, b.as_view(), &sb);
        assert_eq!(kim, 0.0);
    }
}
