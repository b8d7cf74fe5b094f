//! Per-measure knowledge the search needs beyond the distance itself:
//! parameter grids, how parameters relate to each other, and lower bounds.
//!
//! Each kernel of `warpsearch-distance` implements [`Measure`] in its own
//! submodule. The assessor and the scans are generic over the trait, so a
//! new measure needs a kernel plus one impl block.

use std::fmt;
use std::sync::Arc;

use warpsearch_distance::{ElasticDistance, SeriesEnvelope, TimeSeriesView};

use crate::cache::{EnvelopeKey, SequenceCache, SeriesStats};
use crate::dataset::Dataset;
use crate::error::NnError;

mod dtw;
mod erp;
mod euclidean;
mod lcss;
mod msm;
mod twe;
mod wdtw;

/// Number of entries in a full parameter grid.
pub const GRID_SIZE: usize = 100;

/// Order in which the fast search visits parameter indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// `0, 1, ..., n - 1`.
    Ascending,
    /// `n - 1, ..., 1, 0`.
    Descending,
}

impl Schedule {
    /// Parameter indices of a grid with `n` entries in visiting order.
    #[must_use]
    pub fn order(self, n: usize) -> Vec<usize> {
        match self {
            Self::Ascending => (0..n).collect(),
            Self::Descending => (0..n).rev().collect(),
        }
    }
}

/// How a parameter change affects distances already bounded or computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamShift {
    /// Identical parameters.
    Same,
    /// No distance can decrease, so earlier lower bounds stay valid.
    Tighter,
    /// Distances may decrease; earlier bounds must be discarded.
    Incompatible,
}

/// What a lower-bound pass compares each point against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundBasis {
    /// The other series' envelope for this key.
    Envelope(EnvelopeKey),
    /// The other series' global `[min, max]` range.
    Range,
    /// The other series' value at the same position.
    Pointwise,
}

/// Per-position interval a bound pass measures excursions from.
#[derive(Debug, Clone)]
pub(crate) enum Counterpart<'a> {
    Envelope(Arc<SeriesEnvelope>),
    Range { min: f64, max: f64 },
    Pointwise(&'a [f64]),
}

impl<'a> Counterpart<'a> {
    /// Counterpart of cached series `index`, memoising its envelope.
    pub(crate) fn resolve<M: Measure>(
        params: &M,
        cache: &mut SequenceCache,
        index: usize,
        values: &'a [f64],
    ) -> Self {
        match params.bound_basis() {
            BoundBasis::Envelope(key) => Self::Envelope(cache.envelope(index, key, values)),
            BoundBasis::Range => Self::Range {
                min: cache.min(index),
                max: cache.max(index),
            },
            BoundBasis::Pointwise => Self::Pointwise(values),
        }
    }

    /// Counterpart of cached series `index` without mutating the cache.
    ///
    /// Envelopes missing from the cache are computed and dropped after use.
    pub(crate) fn cached<M: Measure>(
        params: &M,
        cache: &SequenceCache,
        index: usize,
        values: &'a [f64],
    ) -> Self {
        match params.bound_basis() {
            BoundBasis::Envelope(key) => Self::Envelope(
                cache
                    .cached_envelope(index, key)
                    .unwrap_or_else(|| Arc::new(key.build(values))),
            ),
            BoundBasis::Range => Self::Range {
                min: cache.min(index),
                max: cache.max(index),
            },
            BoundBasis::Pointwise => Self::Pointwise(values),
        }
    }

    /// Counterpart of a series outside any cache.
    pub(crate) fn detached<M: Measure>(params: &M, stats: &SeriesStats, values: &'a [f64]) -> Self {
        match params.bound_basis() {
            BoundBasis::Envelope(key) => Self::Envelope(Arc::new(key.build(values))),
            BoundBasis::Range => Self::Range {
                min: stats.min(),
                max: stats.max(),
            },
            BoundBasis::Pointwise => Self::Pointwise(values),
        }
    }

    /// Interval `(lower, upper)` at position `k`.
    pub(crate) fn at(&self, k: usize) -> (f64, f64) {
        match self {
            Self::Envelope(env) => env.at(k),
            Self::Range { min, max } => (*min, *max),
            Self::Pointwise(values) => (values[k], values[k]),
        }
    }
}

/// A distance measure the nearest-neighbour search can tune and bound.
///
/// Lower bounds come in two flavours. [`Measure::cheap_bound`] is an O(1)
/// endpoint bound. The pass bound sums [`Measure::bound_term`] over the
/// points of one series against a [`Counterpart`] of the other, visiting the
/// points in decreasing deviation order, and converts the sum with
/// [`Measure::bound_from_sum`]. Every prefix of the pass is a valid bound.
pub trait Measure:
    ElasticDistance + fmt::Debug + fmt::Display + PartialEq + Send + Sync + 'static
{
    /// Short display name.
    const NAME: &'static str;

    /// Visiting order of the fast search.
    const SCHEDULE: Schedule;

    /// Whether the pass bound is also run with the roles of the series swapped.
    const BACKWARD_PASS: bool = true;

    /// Number of terms in the cheap bound, used to normalise its rank.
    const KIM_OPS: usize = 2;

    /// Candidate parameters for `train`, in grid order.
    ///
    /// # Errors
    ///
    /// Returns [`NnError::Distance`] if a derived parameter is rejected by
    /// the kernel constructor.
    fn grid(train: &Dataset) -> Result<Vec<Self>, NnError>;

    /// Relation of `next` to `self` for bound reuse.
    fn shift(&self, next: &Self) -> ParamShift;

    /// True if a distance computed at `self` with validity `validity` is
    /// also the exact distance under `next`.
    fn exact_covers(&self, validity: usize, next: &Self) -> bool;

    /// What the pass bound compares points against.
    fn bound_basis(&self) -> BoundBasis;

    /// O(1) lower bound from endpoints and extrema.
    fn cheap_bound(
        &self,
        query: TimeSeriesView<'_>,
        query_stats: &SeriesStats,
        reference: TimeSeriesView<'_>,
        reference_stats: &SeriesStats,
    ) -> f64;

    /// Contribution of one point against the interval `[lower, upper]`.
    fn bound_term(&self, value: f64, lower: f64, upper: f64, len: usize) -> f64;

    /// Convert a sum of terms over `len`-point series into a bound.
    fn bound_from_sum(&self, sum: f64, _len: usize) -> f64 {
        sum
    }
}

/// Standard deviation fraction spacing shared by the ERP and LCSS grids:
/// ten values evenly spaced over `[0.2 * std, std]`.
pub(crate) fn std_fraction(std: f64, k: usize) -> f64 {
    0.2 * std + k as f64 * (0.8 * std / 9.0)
}

/// Band widths shared by the ERP and LCSS grids: ten widths from 0 to a
/// quarter of the series length, rounded up.
pub(crate) fn quarter_band(k: usize, len: usize) -> usize {
    (k * len).div_ceil(36)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_orders() {
        assert_eq!(Schedule::Ascending.order(3), vec![0, 1, 2]);
        assert_eq!(Schedule::Descending.order(3), vec![2, 1, 0]);
    }

    #[test]
    fn std_fraction_spans_range() {
        assert!((std_fraction(2.0, 0) - 0.4).abs() < 1e-12);
        assert!((std_fraction(2.0, 9) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn quarter_band_spans_range() {
        assert_eq!(quarter_band(0, 100), 0);
        assert_eq!(quarter_band(1, 100), 3);
        assert_eq!(quarter_band(9, 100), 25);
    }

    #[test]
    fn counterpart_intervals() {
        let values = [1.0, 4.0, 2.0];
        let pointwise = Counterpart::Pointwise(&values);
        assert_eq!(pointwise.at(1), (4.0, 4.0));
        let range = Counterpart::Range { min: -1.0, max: 3.0 };
        assert_eq!(range.at(2), (-1.0, 3.0));
    }
}
