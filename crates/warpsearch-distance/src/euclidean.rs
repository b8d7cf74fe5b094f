//! Squared Euclidean distance.

use std::fmt;

use crate::distance::{ElasticDistance, ExtendedDistance};
use crate::series::TimeSeriesView;
use crate::workspace::Workspace;

/// Lock-step squared Euclidean distance over the common prefix of two series.
///
/// Has no parameters; the validity window of every result is 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Euclidean;

impl ElasticDistance for Euclidean {
    fn distance_in(
        &self,
        a: TimeSeriesView<'_>,
        b: TimeSeriesView<'_>,
        cutoff: f64,
        _workspace: &mut Workspace,
    ) -> f64 {
        let mut total = 0.0;
        for (&x, &y) in a.as_slice().iter().zip(b.as_slice()) {
            total += (x - y).powi(2);
            if total > cutoff {
                return f64::INFINITY;
            }
        }
        total
    }

    fn distance_ext_in(
        &self,
        a: TimeSeriesView<'_>,
        b: TimeSeriesView<'_>,
        workspace: &mut Workspace,
    ) -> ExtendedDistance {
        ExtendedDistance {
            distance: self.distance_in(a, b, f64::INFINITY, workspace),
            validity: 0,
        }
    }
}

impl fmt::Display for Euclidean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "euclidean")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::series::TimeSeries;

    #[test]
    fn sum_of_squares() {
        let a = TimeSeries::new(vec![0.0, 1.0, 2.0]).unwrap();
        let b = TimeSeries::new(vec![1.0, 1.0, 0.0]).unwrap();
        let ext = Euclidean.distance_ext(a.as_view(), b.as_view());
        assert_eq!(ext.distance, 5.0);
        assert_eq!(ext.validity, 0);
    }

    #[test]
    fn cutoff_abandons_midway() {
        let a = TimeSeries::new(vec![0.0, 0.0, 0.0]).unwrap();
        let b = TimeSeries::new(vec![3.0, 3.0, 3.0]).unwrap();
        assert_eq!(
            Euclidean.distance_with_cutoff(a.as_view(), b.as_view(), 10.0),
            f64::INFINITY
        );
        assert_eq!(Euclidean.distance_with_cutoff(a.as_view(), b.as_view(), 27.0), 27.0);
    }
}
