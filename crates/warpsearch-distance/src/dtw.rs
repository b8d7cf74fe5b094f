//! Dynamic time warping with a Sakoe-Chiba window.

use std::fmt;

use crate::constraint::{UNCONSTRAINED, column_range, effective_window, window_from_fraction};
use crate::distance::{ElasticDistance, ExtendedDistance, Step, cheapest};
use crate::error::DistanceError;
use crate::series::TimeSeriesView;
use crate::workspace::Workspace;

/// DTW over squared point differences. Thread-safe and copyable.
///
/// The distance is the accumulated squared cost of the optimal alignment; no
/// square root is taken, which keeps it directly comparable with the Keogh
/// bounds. A window smaller than the length difference of the two series is
/// widened to that difference so the final cell stays reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dtw {
    window: usize,
}

impl Dtw {
    /// Create an unconstrained DTW calculator.
    #[must_use]
    pub fn unconstrained() -> Self {
        Self {
            window: UNCONSTRAINED,
        }
    }

    /// Create a DTW calculator whose alignments satisfy `|i - j| <= window`.
    #[must_use]
    pub fn with_window(window: usize) -> Self {
        Self { window }
    }

    /// Create a DTW calculator with a window of `fraction * len`, rounded up.
    ///
    /// # Errors
    ///
    /// Returns [`DistanceError::InvalidBandFraction`] if `fraction` is not in `[0, 1]`.
    pub fn with_band_fraction(fraction: f64, len: usize) -> Result<Self, DistanceError> {
        Ok(Self::with_window(window_from_fraction(fraction, len)?))
    }

    /// Return the warping window.
    #[must_use]
    pub fn window(&self) -> usize {
        self.window
    }

    /// Return true if no window applies.
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        self.window == UNCONSTRAINED
    }
}

impl ElasticDistance for Dtw {
    fn distance_in(
        &self,
        a: TimeSeriesView<'_>,
        b: TimeSeriesView<'_>,
        cutoff: f64,
        workspace: &mut Workspace,
    ) -> f64 {
        warp(a.as_slice(), b.as_slice(), self.window, None, cutoff, workspace, false).distance
    }

    fn distance_ext_in(
        &self,
        a: TimeSeriesView<'_>,
        b: TimeSeriesView<'_>,
        workspace: &mut Workspace,
    ) -> ExtendedDistance {
        warp(a.as_slice(), b.as_slice(), self.window, None, f64::INFINITY, workspace, true)
    }
}

impl fmt::Display for Dtw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unconstrained() {
            write!(f, "window=unconstrained")
        } else {
            write!(f, "window={}", self.window)
        }
    }
}

/// Rolling-row warping recurrence shared by DTW and WDTW.
///
/// Row buffers are indexed by absolute column. For row `i` only the band
/// columns are written; reads outside the current or previous band are
/// guarded rather than relying on sentinel values, since the buffers are
/// swapped and may hold stale cells from two rows back.
///
/// `weights[k]` scales the squared cost of cells with `|i - j| == k`. When
/// `track` is set the span rows record the largest offset along the chosen
/// path, which becomes the validity window.
pub(crate) fn warp(
    a: &[f64],
    b: &[f64],
    window: usize,
    weights: Option<&[f64]>,
    cutoff: f64,
    ws: &mut Workspace,
    track: bool,
) -> ExtendedDistance {
    let n = a.len();
    let m = b.len();
    let window = effective_window(window, n, m);

    ws.reset_rows(m, f64::INFINITY);
    if track {
        ws.reset_spans(m);
    }

    let mut prev_end = 0;
    for (i, &x) in a.iter().enumerate() {
        let cols = column_range(i, window, m);
        let mut row_min = f64::INFINITY;

        for j in cols.clone() {
            let offset = i.abs_diff(j);
            let mut cost = (x - b[j]).powi(2);
            if let Some(w) = weights {
                cost *= w[offset];
            }

            if i == 0 && j == 0 {
                ws.curr[0] = cost;
                if track {
                    ws.curr_span[0] = 0;
                }
                row_min = cost;
                continue;
            }

            let diagonal = if i > 0 && j > 0 {
                ws.prev[j - 1]
            } else {
                f64::INFINITY
            };
            let left = if j > cols.start {
                ws.curr[j - 1]
            } else {
                f64::INFINITY
            };
            let up = if i > 0 && j < prev_end {
                ws.prev[j]
            } else {
                f64::INFINITY
            };

            let (best, step) = cheapest(diagonal, left, up);
            let value = cost + best;
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

        // Every path crosses each row, so the row minimum bounds the final cost.
        // The last row is settled by the final-cell check below instead.
        if i + 1 < n && row_min > cutoff {
            return ExtendedDistance::ABANDONED;
        }

        prev_end = cols.end;
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
