//! Edit distance with real penalty.

use std::fmt;

use crate::constraint::{column_range, effective_window, window_from_fraction};
use crate::distance::{ElasticDistance, ExtendedDistance, Step, cheapest};
use crate::error::{DistanceError, non_negative};
use crate::series::TimeSeriesView;
use crate::workspace::Workspace;

/// ERP: an edit distance where unmatched points are charged against a gap value `g`.
///
/// Costs are squared. The recurrence runs over an `(n + 1) x (m + 1)` matrix
/// whose first row and column accumulate gap costs, restricted to the band
/// `|i - j| <= window` in matrix coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Erp {
    gap: f64,
    window: usize,
}

impl Erp {
    /// Create an ERP calculator with gap value `gap` and band `window`.
    ///
    /// # Errors
    ///
    /// Returns [`DistanceError::InvalidParameter`] if `gap` is negative or not finite.
    pub fn new(gap: f64, window: usize) -> Result<Self, DistanceError> {
        Ok(Self {
            gap: non_negative("g", gap)?,
            window,
        })
    }

    /// Create an ERP calculator whose band covers `fraction * len` positions, rounded up.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DistanceError::InvalidParameter`] | `gap` negative or not finite |
    /// | [`DistanceError::InvalidBandFraction`] | `fraction` outside `[0, 1]` |
    pub fn with_band_fraction(gap: f64, fraction: f64, len: usize) -> Result<Self, DistanceError> {
        Self::new(gap, window_from_fraction(fraction, len)?)
    }

    /// Return the gap value.
    #[must_use]
    pub fn gap(&self) -> f64 {
        self.gap
    }

    /// Return the band half-width.
    #[must_use]
    pub fn window(&self) -> usize {
        self.window
    }

    fn run(
        &self,
        a: &[f64],
        b: &[f64],
        cutoff: f64,
        ws: &mut Workspace,
        track: bool,
    ) -> ExtendedDistance {
        // The column axis is always the longer series.
        let (a, b) = if b.len() < a.len() { (b, a) } else { (a, b) };
        let n = a.len();
        let m = b.len();
        let width = m + 1;
        let window = effective_window(self.window, n, m);
        let g = self.gap;

        ws.reset_rows(width, f64::INFINITY);
        if track {
            ws.reset_spans(width);
        }

        let first = column_range(0, window, width);
        ws.prev[0] = 0.0;
        for j in 1..first.end {
            ws.prev[j] = ws.prev[j - 1] + (b[j - 1] - g).powi(2);
            if track {
                ws.prev_span[j] = j;
            }
        }
        let mut prev_end = first.end;

        for i in 1..=n {
            let x = a[i - 1];
            let delete = (x - g).powi(2);
            let cols = column_range(i, window, width);
            let mut row_min = f64::INFINITY;

            for j in cols.clone() {
                let (value, step) = if j == 0 {
                    (ws.prev[0] + delete, Step::Up)
                } else {
                    let y = b[j - 1];
                    let diagonal = ws.prev[j - 1] + (x - y).powi(2);
                    let left = if j > cols.start {
                        ws.curr[j - 1] + (y - g).powi(2)
                    } else {
                        f64::INFINITY
                    };
                    let up = if j < prev_end {
                        ws.prev[j] + delete
                    } else {
                        f64::INFINITY
                    };
                    cheapest(diagonal, left, up)
                };

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

            if i < n && row_min > cutoff {
                return ExtendedDistance::ABANDONED;
            }

            prev_end = cols.end;
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

impl ElasticDistance for Erp {
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

impl fmt::Display for Erp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g={:.6},window={}", self.gap, self.window)
    }
}
