//! Weighted dynamic time warping.

use std::fmt;

use crate::constraint::UNCONSTRAINED;
use crate::distance::{ElasticDistance, ExtendedDistance};
use crate::dtw::warp;
use crate::error::{DistanceError, non_negative};
use crate::series::TimeSeriesView;
use crate::workspace::Workspace;

/// WDTW: unwindowed DTW whose cell costs are scaled by a logistic weight of
/// the offset `|i - j|`.
///
/// `g` controls how sharply off-diagonal cells are penalised; `g = 0` gives
/// a flat weight of `0.5`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wdtw {
    g: f64,
}

impl Wdtw {
    /// Create a WDTW calculator with penalty steepness `g`.
    ///
    /// # Errors
    ///
    /// Returns [`DistanceError::InvalidParameter`] if `g` is negative or not finite.
    pub fn new(g: f64) -> Result<Self, DistanceError> {
        Ok(Self {
            g: non_negative("g", g)?,
        })
    }

    /// Return the penalty steepness.
    #[must_use]
    pub fn g(&self) -> f64 {
        self.g
    }

    /// Weight of cells at offset `offset` when the longer series has `len` points.
    #[must_use]
    pub fn weight(&self, offset: usize, len: usize) -> f64 {
        let centre = len as f64 / 2.0;
        1.0 / (1.0 + (-self.g * (offset as f64 - centre)).exp())
    }

    fn run(
        &self,
        a: &[f64],
        b: &[f64],
        cutoff: f64,
        ws: &mut Workspace,
        track: bool,
    ) -> ExtendedDistance {
        let len = a.len().max(b.len());
        let mut weights = std::mem::take(&mut ws.local_a);
        weights.clear();
        weights.extend((0..len).map(|k| self.weight(k, len)));
        let result = warp(a, b, UNCONSTRAINED, Some(&weights), cutoff, ws, track);
        ws.local_a = weights;
        result
    }
}

impl ElasticDistance for Wdtw {
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

impl fmt::Display for Wdtw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g={:.6}", self.g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::dtw::Dtw;
    use crate::series::TimeSeries;

    fn ts(values: &[f64]) -> TimeSeries {
        TimeSeries::new(values.to_vec()).unwrap()
    }

    #[test]
    fn flat_weight_halves_dtw() {
        let a = ts(&[0.0, 1.0, 2.0, 3.0, 2.0, 1.0]);
        let b = ts(&[0.0, 0.0, 1.0, 2.0, 3.0, 2.0]);
        let dtw = Dtw::unconstrained().distance(a.as_view(), b.as_view());
        let wdtw = Wdtw::new(0.0).unwrap().distance(a.as_view(), b.as_view());
        assert!((wdtw - 0.5 * dtw).abs() < 1e-12);
    }

    #[test]
    fn weights_increase_with_offset() {
        let wdtw = Wdtw::new(0.3).unwrap();
        let weights: Vec<f64> = (0..10).map(|k| wdtw.weight(k, 10)).collect();
        assert!(weights.windows(2).all(|w| w[0] < w[1]));
        assert!((wdtw.weight(5, 10) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn workspace_scratch_is_restored() {
        let mut ws = Workspace::new();
        let a = ts(&[1.0, 2.0, 0.0, 4.0]);
        let b = ts(&[2.0, 1.0, 3.0, 0.0]);
        let wdtw = Wdtw::new(0.1).unwrap();
        let first = wdtw.distance_in(a.as_view(), b.as_view(), f64::INFINITY, &mut ws);
        assert_eq!(ws.local_a.len(), 4);
        let again = wdtw.distance_in(a.as_view(), b.as_view(), f64::INFINITY, &mut ws);
        assert_eq!(first, again);
    }
}
