//! Longest common subsequence distance.

use std::fmt;

use crate::constraint::{column_range, effective_window};
use crate::distance::{ElasticDistance, ExtendedDistance};
use crate::error::{DistanceError, non_negative};
use crate::series::TimeSeriesView;
use crate::workspace::Workspace;

/// LCSS distance: `1 - LCS / min(n, m)`.
///
/// Two points match when they differ by at most `epsilon` and their
/// positions by at most `delta`. The result lies in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lcss {
    epsilon: f64,
    delta: usize,
}

impl Lcss {
    /// Create an LCSS calculator with matching threshold `epsilon` and
    /// positional tolerance `delta`.
    ///
    /// # Errors
    ///
    /// Returns [`DistanceError::InvalidParameter`] if `epsilon` is negative or not finite.
    pub fn new(epsilon: f64, delta: usize) -> Result<Self, DistanceError> {
        Ok(Self {
            epsilon: non_negative("epsilon", epsilon)?,
            delta,
        })
    }

    /// Return the matching threshold.
    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Return the positional tolerance.
    #[must_use]
    pub fn delta(&self) -> usize {
        self.delta
    }

    fn run(&self, a: &[f64], b: &[f64], cutoff: f64, ws: &mut Workspace) -> ExtendedDistance {
        let n = a.len();
        let m = b.len();
        let width = m + 1;
        let delta = effective_window(self.delta, n, m);
        let len = n.min(m) as f64;

        // Column 0 is never written and stays at a count of zero.
        ws.reset_counts(width);
        ws.reset_spans(width);

        let mut prev_end = 1;
        for i in 1..=n {
            let x = a[i - 1];
            let cols = column_range(i, delta, width);
            let start = cols.start.max(1);
            let mut row_max = 0;

            for j in start..cols.end {
                let offset = i.abs_diff(j);
                let (count, span) = if (x - b[j - 1]).abs() <= self.epsilon {
                    (
                        ws.prev_count[j - 1] + 1,
                        ws.prev_span[j - 1].max(offset),
                    )
                } else {
                    let mut best = (ws.prev_count[j - 1], ws.prev_span[j - 1]);
                    if j > start {
                        best = longer(best, (ws.curr_count[j - 1], ws.curr_span[j - 1]));
                    }
                    if j < prev_end {
                        best = longer(best, (ws.prev_count[j], ws.prev_span[j]));
                    }
                    best
                };
                ws.curr_count[j] = count;
                ws.curr_span[j] = span;
                row_max = row_max.max(count);
            }

            // Each remaining row can add at most one match.
            if i < n {
                let reachable = (row_max + n - i) as f64;
                if 1.0 - reachable / len > cutoff {
                    return ExtendedDistance::ABANDONED;
                }
            }

            prev_end = cols.end;
            ws.swap_rows();
        }

        let last = column_range(n, delta, width);
        let mut best = (0, 0);
        for j in last.start.max(1)..last.end {
            if ws.prev_count[j] > best.0 {
                best = (ws.prev_count[j], ws.prev_span[j]);
            }
        }

        let distance = 1.0 - best.0 as f64 / len;
        if distance > cutoff {
            return ExtendedDistance::ABANDONED;
        }
        ExtendedDistance {
            distance,
            validity: best.1,
        }
    }
}

/// Prefer the higher count, then the narrower span.
fn longer(current: (usize, usize), candidate: (usize, usize)) -> (usize, usize) {
    match candidate.0.cmp(&current.0) {
        std::cmp::Ordering::Greater => candidate,
        std::cmp::Ordering::Equal => (current.0, current.1.min(candidate.1)),
        std::cmp::Ordering::Less => current,
    }
}

impl ElasticDistance for Lcss {
    fn distance_in(
        &self,
        a: TimeSeriesView<'_>,
        b: TimeSeriesView<'_>,
        cutoff: f64,
        workspace: &mut Workspace,
    ) -> f64 {
        self.run(a.as_slice(), b.as_slice(), cutoff, workspace).distance
    }

    fn distance_ext_in(
        &self,
        a: TimeSeriesView<'_>,
        b: TimeSeriesView<'_>,
        workspace: &mut Workspace,
    ) -> ExtendedDistance {
        self.run(a.as_slice(), b.as_slice(), f64::INFINITY, workspace)
    }
}

impl fmt::Display for Lcss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epsilon={:.6},delta={}", self.epsilon, self.delta)
    }
}
