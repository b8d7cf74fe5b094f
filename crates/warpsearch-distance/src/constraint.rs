//! Warping window arithmetic shared by the banded kernels.

use std::ops::Range;

use crate::error::DistanceError;

/// Window value that leaves the cost matrix unconstrained.
pub const UNCONSTRAINED: usize = usize::MAX;

/// Columns of row `row` that lie inside a band of half-width `window`.
///
/// Returns the intersection of `[row - window, row + window]` with `[0, n_cols)`.
pub(crate) fn column_range(row: usize, window: usize, n_cols: usize) -> Range<usize> {
    let start = row.saturating_sub(window);
    let end = row.saturating_add(window).saturating_add(1).min(n_cols);
    start..end
}

/// Widen `window` so the final cell of an `n` by `m` matrix stays reachable.
pub(crate) fn effective_window(window: usize, n: usize, m: usize) -> usize {
    window.max(n.abs_diff(m))
}

/// Convert a band fraction into a window for series of length `len`, rounding up.
///
/// # Errors
///
/// Returns [`DistanceError::InvalidBandFraction`] if `fraction` is not in `[0, 1]`.
pub fn window_from_fraction(fraction: f64, len: usize) -> Result<usize, DistanceError> {
    if !(0.0..=1.0).contains(&fraction) {
        return Err(DistanceError::InvalidBandFraction { fraction });
    }
    Ok((fraction * len as f64).ceil() as usize)
}

/// Window covering `percent`% of `len`, rounded up. Exact integer arithmetic.
#[must_use]
pub fn window_from_percent(percent: usize, len: usize) -> usize {
    (percent * len).div_ceil(100)
}
