//! Time warp edit distance.

use std::fmt;

use crate::distance::{ElasticDistance, ExtendedDistance, Step, cheapest};
use crate::error::{DistanceError, non_negative};
use crate::series::TimeSeriesView;
use crate::workspace::Workspace;

/// TWE distance with stiffness `nu` and edit penalty `lambda`.
///
/// Both series are padded with a leading zero and timestamped `1..=n`.
/// A match pays the difference of the aligned points and of their
/// predecessors plus `2 * nu * |i - j|`; a deletion pays the step to the
/// predecessor plus `nu + lambda`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Twe {
    nu: f64,
    lambda: f64,
}

impl Twe {
    /// Create a TWE calculator.
    ///
    /// # Errors
    ///
    /// Returns [`DistanceError::InvalidParameter`] if `nu` or `lambda` is
    /// negative or not finite.
    pub fn new(nu: f64, lambda: f64) -> Result<Self, DistanceError> {
        Ok(Self {
            nu: non_negative("nu", nu)?,
            lambda: non_negative("lambda", lambda)?,
        })
    }

    /// Return the stiffness.
    #[must_use]
    pub fn nu(&self) -> f64 {
        self.nu
    }

    /// Return the edit penalty.
    #[must_use]
    pub fn lambda(&self) -> f64 {
        self.lambda
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
        let width = m + 1;
        let edit = self.nu + self.lambda;

        deletion_costs(&mut ws.local_a, a, edit);
        deletion_costs(&mut ws.local_b, b, edit);
        ws.reset_rows(width, f64::INFINITY);
        if track {
            ws.reset_spans(width);
        }
        ws.prev[0] = 0.0;

        for i in 1..=n {
            let x = a[i - 1];
            let x_prev = if i > 1 { a[i - 2] } else { 0.0 };
            ws.curr[0] = f64::INFINITY;
            let mut row_min = f64::INFINITY;

            for j in 1..=m {
                let y = b[j - 1];
                let y_prev = if j > 1 { b[j - 2] } else { 0.0 };
                let offset = i.abs_diff(j);

                let diagonal = ws.prev[j - 1]
                    + (x - y).abs()
                    + (x_prev - y_prev).abs()
                    + 2.0 * self.nu * offset as f64;
                let left = ws.curr[j - 1] + ws.local_b[j];
                let up = ws.prev[j] + ws.local_a[i];

                let (value, step) = cheapest(diagonal, left, up);
                ws.curr[j] = value;
                if track {
                    let inherited = match step {
                        Step::Diagonal => ws.prev_span[j - 1],
                        Step::Left => ws.curr_span[j - 1],
                        Step::Up => ws.prev_span[j],
                    };
                    ws.curr_span[j] = inherited.max(offset);
                }
                row_min = row_min.min(value);
            }

            if i < n && row_min > cutoff {
                return ExtendedDistance::ABANDONED;
            }
            ws.swap_rows();
        }

        let total = ws.prev[m];
        if total > cutoff {
            return ExtendedDistance::ABANDONED;
        }
        ExtendedDistance {
            distance: total,
            validity: if track { ws.prev_span[m] } else { 0 },
        }
    }
}

/// `costs[i]` is the price of deleting the `i`-th point (1-based) of `series`.
fn deletion_costs(costs: &mut Vec<f64>, series: &[f64], edit: f64) {
    costs.clear();
    costs.push(0.0);
    let mut previous = 0.0;
    for &x in series {
        costs.push((x - previous).abs() + edit);
        previous = x;
    }
}

impl ElasticDistance for Twe {
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

impl fmt::Display for Twe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "nu={:.6},lambda={:.6}", self.nu, self.lambda)
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
        let a = ts(&[1.0, -2.0, 0.5, 3.0]);
        let twe = Twe::new(0.001, 0.1).unwrap();
        assert_eq!(twe.distance(a.as_view(), a.as_view()), 0.0);
    }

    #[test]
    fn deletion_costs_include_leading_zero() {
        let mut costs = Vec::new();
        deletion_costs(&mut costs, &[2.0, 5.0], 0.5);
        assert_eq!(costs, vec![0.0, 2.5, 3.5]);
    }

    #[test]
    fn equal_length_diagonal_hand_computed() {
        // Matching [1, 2] with [2, 2] along the diagonal costs
        // (|1 - 2| + |0 - 0|) + (|2 - 2| + |1 - 2|) = 2 with nu = 0.
        let a = ts(&[1.0, 2.0]);
        let b = ts(&[2.0, 2.0]);
        let twe = Twe::new(0.0, 10.0).unwrap();
        assert_eq!(twe.distance(a.as_view(), b.as_view()), 2.0);
    }

    #[test]
    fn symmetric() {
        let a = ts(&[0.0, 1.0, 2.0, 3.0, 2.0, 1.0]);
        let b = ts(&[0.0, 0.0, 1.0, 2.0, 3.0, 2.0]);
        let twe = Twe::new(0.001, 0.1).unwrap();
        let ab = twe.distance(a.as_view(), b.as_view());
        let ba = twe.distance(b.as_view(), a.as_view());
        assert!((ab - ba).abs() < 1e-12);
    }

    #[test]
    fn rejects_negative_lambda() {
        assert!(matches!(
            Twe::new(0.1, -0.5),
            Err(DistanceError::InvalidParameter { name: "lambda", .. })
        ));
    }
}
