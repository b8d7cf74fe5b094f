//! Contract shared by every distance kernel.

use std::fmt;

use tracing::instrument;

use crate::series::TimeSeriesView;
use crate::workspace::Workspace;

/// An exact distance together with the smallest window that reproduces it.
///
/// `validity` is the largest index offset `|i - j|` visited by the optimal
/// alignment. For the windowed kernels (DTW, ERP, LCSS) the same distance is
/// obtained for every window between `validity` and the window it was
/// computed with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtendedDistance {
    /// The exact distance, or `f64::INFINITY` when abandoned.
    pub distance: f64,
    /// Largest index offset used by the optimal alignment.
    pub validity: usize,
}

impl ExtendedDistance {
    /// Sentinel returned when a computation provably exceeds its cutoff.
    pub const ABANDONED: Self = Self {
        distance: f64::INFINITY,
        validity: 0,
    };
}

impl fmt::Display for ExtendedDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6} (window >= {})", self.distance, self.validity)
    }
}

/// An elastic distance between two time series.
///
/// Implementors are small `Copy` parameter holders. The two required methods
/// take a caller-owned [`Workspace`]; the provided methods allocate a fresh
/// one and are meant for one-off use.
///
/// With a finite `cutoff`, [`distance_in`][Self::distance_in] returns the exact
/// distance whenever it is at most `cutoff` and may return `f64::INFINITY` once
/// the distance provably exceeds it. It never returns an approximation.
pub trait ElasticDistance: Copy + Send + Sync {
    /// Distance between `a` and `b`, abandoning once it provably exceeds `cutoff`.
    fn distance_in(
        &self,
        a: TimeSeriesView<'_>,
        b: TimeSeriesView<'_>,
        cutoff: f64,
        workspace: &mut Workspace,
    ) -> f64;

    /// Exact distance together with its validity window.
    fn distance_ext_in(
        &self,
        a: TimeSeriesView<'_>,
        b: TimeSeriesView<'_>,
        workspace: &mut Workspace,
    ) -> ExtendedDistance;

    /// Exact distance, no early abandoning.
    #[instrument(skip_all, fields(n = a.len(), m = b.len()))]
    fn distance(&self, a: TimeSeriesView<'_>, b: TimeSeriesView<'_>) -> f64 {
        self.distance_in(a, b, f64::INFINITY, &mut Workspace::new())
    }

    /// Distance with early abandoning against `cutoff`.
    #[instrument(skip_all, fields(n = a.len(), m = b.len(), cutoff = cutoff))]
    fn distance_with_cutoff(&self, a: TimeSeriesView<'_>, b: TimeSeriesView<'_>, cutoff: f64) -> f64 {
        self.distance_in(a, b, cutoff, &mut Workspace::new())
    }

    /// Exact distance together with its validity window.
    #[instrument(skip_all, fields(n = a.len(), m = b.len()))]
    fn distance_ext(&self, a: TimeSeriesView<'_>, b: TimeSeriesView<'_>) -> ExtendedDistance {
        self.distance_ext_in(a, b, &mut Workspace::new())
    }
}

/// Predecessor chosen by a three-way warping recurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Diagonal,
    Left,
    Up,
}

/// Pick the cheapest predecessor. Ties go to the diagonal, then left, then up.
pub(crate) fn cheapest(diagonal: f64, left: f64, up: f64) -> (f64, Step) {
    if diagonal <= left && diagonal <= up {
        (diagonal, Step::Diagonal)
    } else if left <= up {
        (left, Step::Left)
    } else {
        (up, Step::Up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_prefer_diagonal_then_left() {
        assert_eq!(cheapest(1.0, 1.0, 1.0), (1.0, Step::Diagonal));
        assert_eq!(cheapest(2.0, 1.0, 1.0), (1.0, Step::Left));
        assert_eq!(cheapest(2.0, 3.0, 1.0), (1.0, Step::Up));
    }

    #[test]
    fn display_format() {
        let d = ExtendedDistance {
            distance: 1.5,
            validity: 3,
        };
        assert_eq!(format!("{d}"), "1.500000 (window >= 3)");
    }

    #[test]
    fn abandoned_is_infinite() {
        assert!(ExtendedDistance::ABANDONED.distance.is_infinite());
    }
}
