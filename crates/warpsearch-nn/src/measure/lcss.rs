use warpsearch_distance::{Lcss, TimeSeriesView, distance_to_interval};

use super::{BoundBasis, GRID_SIZE, Measure, ParamShift, Schedule, quarter_band, std_fraction};
use crate::cache::{EnvelopeKey, SeriesStats};
use crate::dataset::Dataset;
use crate::error::NnError;

impl Measure for Lcss {
    const NAME: &'static str = "LCSS";
    const SCHEDULE: Schedule = Schedule::Descending;
    const KIM_OPS: usize = 1;

    /// 10 thresholds from the training standard deviation times 10 deltas.
    /// Index `p` uses threshold `p / 10` and delta `p % 10`.
    fn grid(train: &Dataset) -> Result<Vec<Self>, NnError> {
        let std = train.value_std();
        let len = train.series_len();
        (0..GRID_SIZE)
            .map(|p| {
                Lcss::new(std_fraction(std, p / 10), quarter_band(p % 10, len)).map_err(NnError::from)
            })
            .collect()
    }

    fn shift(&self, next: &Self) -> ParamShift {
        if next == self {
            ParamShift::Same
        } else if next.epsilon() <= self.epsilon() && next.delta() <= self.delta() {
            ParamShift::Tighter
        } else {
            ParamShift::Incompatible
        }
    }

    fn exact_covers(&self, validity: usize, next: &Self) -> bool {
        next.epsilon() == self.epsilon() && validity <= next.delta() && next.delta() <= self.delta()
    }

    /// Points are compared against the plain envelope with an `epsilon`
    /// margin, which is the same subtraction the kernel's match test makes.
    fn bound_basis(&self) -> BoundBasis {
        BoundBasis::Envelope(EnvelopeKey::window(self.delta()))
    }

    /// 1 when no pair of points can ever match.
    fn cheap_bound(
        &self,
        _query: TimeSeriesView<'_>,
        query_stats: &SeriesStats,
        _reference: TimeSeriesView<'_>,
        reference_stats: &SeriesStats,
    ) -> f64 {
        let eps = self.epsilon();
        if reference_stats.min() - query_stats.max() > eps
            || query_stats.min() - reference_stats.max() > eps
        {
            1.0
        } else {
            0.0
        }
    }

    /// Counts points that cannot match anything in their band.
    fn bound_term(&self, value: f64, lower: f64, upper: f64, _len: usize) -> f64 {
        if distance_to_interval(value, lower, upper) > self.epsilon() {
            1.0
        } else {
            0.0
        }
    }

    /// Same arithmetic as the kernel's `1 - lcs / len`, with `lcs <= len - misses`.
    fn bound_from_sum(&self, sum: f64, len: usize) -> f64 {
        let len = len as f64;
        1.0 - (len - sum) / len
    }
}

#[cfg(test)]
mod tests {
    use warpsearch_distance::{ElasticDistance, TimeSeries};

    use super::*;

    #[test]
    fn shift_rules() {
        let a = Lcss::new(0.5, 4).unwrap();
        assert_eq!(a.shift(&Lcss::new(0.5, 2).unwrap()), ParamShift::Tighter);
        assert_eq!(a.shift(&Lcss::new(0.4, 9).unwrap()), ParamShift::Incompatible);
        assert_eq!(a.shift(&Lcss::new(0.4, 4).unwrap()), ParamShift::Tighter);
        assert!(a.exact_covers(1, &Lcss::new(0.5, 1).unwrap()));
        assert!(!a.exact_covers(1, &Lcss::new(0.4, 1).unwrap()));
    }

    #[test]
    fn disjoint_ranges_bound_is_one() {
        let a = TimeSeries::new(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let b = TimeSeries::new(vec![5.0, 6.0, 7.0, 8.0]).unwrap();
        let sa = SeriesStats::compute(a.as_ref());
        let sb = SeriesStats::compute(b.as_ref());
        let lcss = Lcss::new(0.5, 2).unwrap();
        assert_eq!(lcss.cheap_bound(a.as_view(), &sa, b.as_view(), &sb), 1.0);
        assert_eq!(lcss.distance(a.as_view(), b.as_view()), 1.0);
        let loose = Lcss::new(1.0, 2).unwrap();
        assert_eq!(loose.cheap_bound(a.as_view(), &sa, b.as_view(), &sb), 0.0);
    }

    #[test]
    fn bound_from_sum_matches_kernel_arithmetic() {
        let lcss = Lcss::new(0.0, 0).unwrap();
        assert_eq!(lcss.bound_from_sum(0.0, 6), 0.0);
        assert_eq!(lcss.bound_from_sum(1.0, 6), 1.0 - 5.0 / 6.0);
        assert_eq!(lcss.bound_from_sum(6.0, 6), 1.0);
    }
}
