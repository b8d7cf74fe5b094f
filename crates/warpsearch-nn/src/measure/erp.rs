use warpsearch_distance::{Erp, TimeSeriesView, distance_to_interval};

use super::{BoundBasis, GRID_SIZE, Measure, ParamShift, Schedule, quarter_band, std_fraction};
use crate::cache::{EnvelopeKey, SeriesStats};
use crate::dataset::Dataset;
use crate::error::NnError;

impl Measure for Erp {
    const NAME: &'static str = "ERP";
    const SCHEDULE: Schedule = Schedule::Descending;
    const KIM_OPS: usize = 2;

    /// 10 gap values from the training standard deviation times 10 band widths.
    /// Index `p` uses gap `p / 10` and band `p % 10`.
    fn grid(train: &Dataset) -> Result<Vec<Self>, NnError> {
        let std = train.value_std();
        let len = train.series_len();
        (0..GRID_SIZE)
            .map(|p| {
                Erp::new(std_fraction(std, p / 10), quarter_band(p % 10, len)).map_err(NnError::from)
            })
            .collect()
    }

    fn shift(&self, next: &Self) -> ParamShift {
        if next.gap() != self.gap() {
            return ParamShift::Incompatible;
        }
        match next.window().cmp(&self.window()) {
            std::cmp::Ordering::Equal => ParamShift::Same,
            std::cmp::Ordering::Less => ParamShift::Tighter,
            std::cmp::Ordering::Greater => ParamShift::Incompatible,
        }
    }

    fn exact_covers(&self, validity: usize, next: &Self) -> bool {
        next.gap() == self.gap() && validity <= next.window() && next.window() <= self.window()
    }

    fn bound_basis(&self) -> BoundBasis {
        BoundBasis::Envelope(EnvelopeKey::gap(self.window(), self.gap()))
    }

    /// The first and last steps of every alignment are each one of a match,
    /// a gap in the query or a gap in the reference.
    fn cheap_bound(
        &self,
        query: TimeSeriesView<'_>,
        _query_stats: &SeriesStats,
        reference: TimeSeriesView<'_>,
        _reference_stats: &SeriesStats,
    ) -> f64 {
        let g = self.gap();
        let step = |x: f64, y: f64| {
            (x - y)
                .powi(2)
                .min((x - g).powi(2))
                .min((y - g).powi(2))
        };
        step(query.first(), reference.first()) + step(query.last(), reference.last())
    }

    fn bound_term(&self, value: f64, lower: f64, upper: f64, _len: usize) -> f64 {
        distance_to_interval(value, lower, upper).powi(2)
    }
}

#[cfg(test)]
mod tests {
    use warpsearch_distance::{ElasticDistance, TimeSeries};

    use super::*;

    #[test]
    fn grid_layout() {
        let train = Dataset::new(vec![vec![1.0, 3.0, 1.0, 3.0]; 2], vec![0, 1]).unwrap();
        let grid = Erp::grid(&train).unwrap();
        assert_eq!(grid.len(), GRID_SIZE);
        // std = 1
        assert!((grid[0].gap() - 0.2).abs() < 1e-12);
        assert_eq!(grid[0].window(), 0);
        assert_eq!(grid[9].window(), 1);
        assert!((grid[99].gap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn gap_change_is_incompatible() {
        let a = Erp::new(0.5, 4).unwrap();
        let b = Erp::new(0.6, 2).unwrap();
        assert_eq!(a.shift(&b), ParamShift::Incompatible);
        assert!(!a.exact_covers(0, &b));
        let c = Erp::new(0.5, 2).unwrap();
        assert_eq!(a.shift(&c), ParamShift::Tighter);
        assert!(a.exact_covers(2, &c));
    }

    #[test]
    fn kim_never_exceeds_distance() {
        let a = TimeSeries::new(vec![0.0, 3.0, -1.0, 2.0, 1.0]).unwrap();
        let b = TimeSeries::new(vec![1.0, -2.0, 4.0, 0.0, 0.5]).unwrap();
        let sa = SeriesStats::compute(a.as_ref());
        let sb = SeriesStats::compute(b.as_ref());
        for window in 0..5 {
            let erp = Erp::new(0.3, window).unwrap();
            let kim = erp.cheap_bound(a.as_view(), &sa, b.as_view(), &sb);
            assert!(kim <= erp.distance(a.as_view(), b.as_view()));
        }
    }
}
