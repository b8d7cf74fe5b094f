//! Move-split-merge distance.

use std::fmt;

use crate::distance::{ElasticDistance, ExtendedDistance, Step, cheapest};
use crate::error::{DistanceError, non_negative};
use crate::series::TimeSeriesView;
use crate::workspace::Workspace;

/// MSM distance with split/merge cost `c`.
///
/// A move costs the absolute difference of the aligned values; a split or
/// merge costs `c`, plus the distance to the nearer neighbour when the new
/// value does not lie between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Msm {
    cost: f64,
}

impl Msm {
    /// Create an MSM calculator with split/merge cost `cost`.
    ///
    /// # Errors
    ///
    /// Returns [`DistanceError::InvalidParameter`] if `cost` is negative or not finite.
    pub fn new(cost: f64) -> Result<Self, DistanceError> {
        Ok(Self {
            cost: non_negative("c", cost)?,
        })
    }

    /// Return the split/merge cost.
    #[must_use]
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Cost of inserting `new` next to `x` where the other series holds `y`.
    #[must_use]
    pub fn split_merge(&self, new: f64, x: f64, y: f64) -> f64 {
        if (x <= new && new <= y) || (y <= new && new <= x) {
            self.cost
        } else {
            self.cost + (new - x).abs().min((new - y).abs())
        }
    }

    fn run(
        &self,
        a: &[f64],
        b: &[f64],
        cutoff: f64,
        ws: &mut Workspace,
        track: bool,
    ) -> ExtendedDistance {
        let n = a.len();
        let m = b.len();

        ws.reset_rows(m, f64::INFINITY);
        if track {
            ws.reset_spans(m);
        }

        ws.curr[0] = (a[0] - b[0]).abs();
        let mut row_min = ws.curr[0];
        for j in 1..m {
            ws.curr[j] = ws.curr[j - 1] + self.split_merge(b[j], a[0], b[j - 1]);
            if track {
                ws.curr_span[j] = j;
            }
            row_min = row_min.min(ws.curr[j]);
        }
        if n > 1 && row_min > cutoff {
            return ExtendedDistance::ABANDONED;
        }
        ws.swap_rows();

        for i in 1..n {
            let x = a[i];
            ws.curr[0] = ws.prev[0] + self.split_merge(x, a[i - 1], b[0]);
            if track {
                ws.curr_span[0] = ws.prev_span[0].max(i);
            }
            let mut row_min = ws.curr[0];

            for j in 1..m {
                let y = b[j];
                let diagonal = ws.prev[j - 1] + (x - y).abs();
                let left = ws.curr[j - 1] + self.split_merge(y, x, b[j - 1]);
                let up = ws.prev[j] + self.split_merge(x, a[i - 1], y);
                let (value, step) = cheapest(diagonal, left, up);
                ws.curr[j] = value;
                if track {
                    let inherited = match step {
                        Step::Diagonal => ws.prev_span[j - 1],
                        Step::Left => ws.curr_span[j - 1],
                        Step::Up => ws.prev_span[j],
                    };
                    ws.curr_span[j] = inherited.max(i.abs_diff(j));
                }
                row_min = row_min.min(value);
            }

            if i + 1 < n && row_min > cutoff {
                return ExtendedDistance::ABANDONED;
            }
            ws.swap_rows();
        }

        let total = ws.prev[m - 1];
        if total > cutoff {
            return ExtendedDistance::ABANDONED;
        }
        ExtendedDistance {
            distance: total,
            validity: if track { ws.prev_span[m - 1] } else { 0 },
        }
    }
}

impl ElasticDistance for Msm {
    fn distance_in(
        &self,
        a: TimeSeriesView<'_>,
        b: TimeSeriesView<'_>,
        cutoff: f64,
        workspace: &mut Workspace,
    ) -> f64 {
        self.run(a.as_slice(), b.as_slice(), cutoff, workspace, false).distance
    }

    fn distance_ext_in(
        &self,
        a: TimeSeriesView<'_>,
        b: TimeSeriesView<'_>,
        workspace: &mut Workspace,
    ) -> ExtendedDistance {
        self.run(a.as_slice(), b.as_slice(), f64::INFINITY, workspace, true)
    }
}

impl fmt::Display for Msm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c={:.6}", self.cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::series::TimeSeries;

    fn ts(values: &[f64]) -> TimeSeries {
        TimeSeries::new(values.to_vec()).unwrap()
    }

    #[test]
    fn identical_series_distance_zero() {
        let a = ts(&[1.0, 3.0, 2.0, 5.0]);
        assert_eq!(Msm::new(0.5).unwrap().distance(a.as_view(), a.as_view()), 0.0);
    }

    #[test]
    fn split_merge_between_neighbours_costs_c() {
        let msm = Msm::new(0.5).unwrap();
        assert_eq!(msm.split_merge(1.5, 1.0, 2.0), 0.5);
        assert_eq!(msm.split_merge(1.5, 2.0, 1.0), 0.5);
        assert_eq!(msm.split_merge(3.0, 1.0, 2.0), 1.5);
    }

    #[test]
    fn single_points_cost_their_difference() {
        let a = ts(&[1.0]);
        let b = ts(&[4.0]);
        assert_eq!(Msm::new(0.1).unwrap().distance(a.as_view(), b.as_view()), 3.0);
    }

    #[test]
    fn symmetric_on_shifted_ramp() {
        let a = ts(&[0.0, 1.0, 2.0, 3.0, 2.0, 1.0]);
        let b = ts(&[0.0, 0.0, 1.0, 2.0, 3.0, 2.0]);
        let msm = Msm::new(0.5).unwrap();
        let ab = msm.distance(a.as_view(), b.as_view());
        let ba = msm.distance(b.as_view(), a.as_view());
        assert!((ab - 2.0).abs() < 1e-12);
        assert!((ab - ba).abs() < 1e-12);
    }

    #[test]
    fn cutoff_abandons() {
        let a = ts(&[0.0; 4]);
        let b = ts(&[9.0; 4]);
        let msm = Msm::new(1.0).unwrap();
        assert_eq!(msm.distance_with_cutoff(a.as_view(), b.as_view(), 1.0), f64::INFINITY);
    }
}
