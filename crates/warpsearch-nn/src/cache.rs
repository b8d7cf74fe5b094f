//! Per-dataset statistics and memoised envelopes.

use std::collections::HashMap;
use std::sync::Arc;

use warpsearch_distance::SeriesEnvelope;

use crate::dataset::Dataset;

/// Summary statistics of one series, computed in a single pass plus one sort.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesStats {
    min: f64,
    max: f64,
    min_first: bool,
    min_last: bool,
    max_first: bool,
    max_last: bool,
    order: Vec<usize>,
}

impl SeriesStats {
    /// Compute the statistics of `values`. `values` must be non-empty.
    #[must_use]
    pub fn compute(values: &[f64]) -> Self {
        let n = values.len();
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for &x in values {
            min = min.min(x);
            max = max.max(x);
            sum += x;
        }
        let mean = sum / n as f64;

        // Stable sort keeps earlier positions first among equal deviations.
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&i, &j| {
            let di = (values[i] - mean).abs();
            let dj = (values[j] - mean).abs();
            dj.total_cmp(&di)
        });

        Self {
            min,
            max,
            min_first: values[0] == min,
            min_last: values[n - 1] == min,
            max_first: values[0] == max,
            max_last: values[n - 1] == max,
            order,
        }
    }

    /// Smallest value.
    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Largest value.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// True if the first value equals the minimum.
    #[must_use]
    pub fn is_min_first(&self) -> bool {
        self.min_first
    }

    /// True if the last value equals the minimum.
    #[must_use]
    pub fn is_min_last(&self) -> bool {
        self.min_last
    }

    /// True if the first value equals the maximum.
    #[must_use]
    pub fn is_max_first(&self) -> bool {
        self.max_first
    }

    /// True if the last value equals the maximum.
    #[must_use]
    pub fn is_max_last(&self) -> bool {
        self.max_last
    }

    /// True if the minimum occurs at the first or last position.
    #[must_use]
    pub fn min_at_endpoint(&self) -> bool {
        self.min_first || self.min_last
    }

    /// True if the maximum occurs at the first or last position.
    #[must_use]
    pub fn max_at_endpoint(&self) -> bool {
        self.max_first || self.max_last
    }

    /// Position with the `k`-th largest absolute deviation from the mean (0-based `k`).
    #[must_use]
    pub fn nth_highest_deviation(&self, k: usize) -> usize {
        self.order[k]
    }
}

/// Identifies an envelope variant of a series.
///
/// Floating-point parameters are stored as bit patterns so keys can be hashed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeKey {
    /// Plain Sakoe-Chiba envelope (DTW, LCSS).
    Window {
        /// Window half-width.
        radius: usize,
    },
    /// Envelope stretched to include the ERP gap value.
    Gap {
        /// Band half-width.
        radius: usize,
        /// `f64::to_bits` of the gap value.
        gap_bits: u64,
    },
}

impl EnvelopeKey {
    /// Key for a plain envelope.
    #[must_use]
    pub fn window(radius: usize) -> Self {
        Self::Window { radius }
    }

    /// Key for an envelope that also admits `gap` at every position.
    #[must_use]
    pub fn gap(radius: usize, gap: f64) -> Self {
        Self::Gap {
            radius,
            gap_bits: gap.to_bits(),
        }
    }

    /// Compute the envelope of `values` this key describes.
    #[must_use]
    pub fn build(&self, values: &[f64]) -> SeriesEnvelope {
        match *self {
            Self::Window { radius } => SeriesEnvelope::compute(values, radius),
            Self::Gap { radius, gap_bits } => {
                SeriesEnvelope::compute(values, radius).with_gap(f64::from_bits(gap_bits))
            }
        }
    }
}

/// Statistics for every series of a dataset plus envelopes memoised per
/// `(series, key)`.
///
/// Envelopes are computed on first request and shared afterwards, so the
/// result never depends on the order of requests.
#[derive(Debug, Clone, Default)]
pub struct SequenceCache {
    stats: Vec<SeriesStats>,
    envelopes: Vec<HashMap<EnvelopeKey, Arc<SeriesEnvelope>>>,
}

impl SequenceCache {
    /// Compute the statistics of every series of `dataset`.
    #[must_use]
    pub fn new(dataset: &Dataset) -> Self {
        let stats: Vec<SeriesStats> = dataset
            .all_series()
            .iter()
            .map(|s| SeriesStats::compute(s.as_ref()))
            .collect();
        let envelopes = vec![HashMap::new(); stats.len()];
        Self { stats, envelopes }
    }

    /// Number of cached series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    /// True if no series are cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Statistics of series `index`.
    #[must_use]
    pub fn stats(&self, index: usize) -> &SeriesStats {
        &self.stats[index]
    }

    /// Minimum of series `index`.
    #[must_use]
    pub fn min(&self, index: usize) -> f64 {
        self.stats[index].min
    }

    /// Maximum of series `index`.
    #[must_use]
    pub fn max(&self, index: usize) -> f64 {
        self.stats[index].max
    }

    /// True if series `index` starts at its minimum.
    #[must_use]
    pub fn is_min_first(&self, index: usize) -> bool {
        self.stats[index].min_first
    }

    /// True if series `index` ends at its minimum.
    #[must_use]
    pub fn is_min_last(&self, index: usize) -> bool {
        self.stats[index].min_last
    }

    /// True if series `index` starts at its maximum.
    #[must_use]
    pub fn is_max_first(&self, index: usize) -> bool {
        self.stats[index].max_first
    }

    /// True if series `index` ends at its maximum.
    #[must_use]
    pub fn is_max_last(&self, index: usize) -> bool {
        self.stats[index].max_last
    }

    /// Position of the `k`-th largest deviation from the mean in series `index`.
    #[must_use]
    pub fn index_nth_highest_deviation(&self, index: usize, k: usize) -> usize {
        self.stats[index].order[k]
    }

    /// Envelope of series `index` for `key`, computing it from `values` on first use.
    ///
    /// `values` must be the series the cache was built from.
    pub fn envelope(&mut self, index: usize, key: EnvelopeKey, values: &[f64]) -> Arc<SeriesEnvelope> {
        Arc::clone(
            self.envelopes[index]
                .entry(key)
                .or_insert_with(|| Arc::new(key.build(values))),
        )
    }

    /// Envelope of series `index` for `key` if it has already been computed.
    #[must_use]
    pub fn cached_envelope(&self, index: usize, key: EnvelopeKey) -> Option<Arc<SeriesEnvelope>> {
        self.envelopes[index].get(&key).cloned()
    }

    /// Compute the `key` envelope of every series of `dataset`.
    pub fn warm(&mut self, key: EnvelopeKey, dataset: &Dataset) {
        for index in 0..self.len() {
            self.envelope(index, key, dataset.series(index).as_slice());
        }
    }

    /// Drop every memoised envelope, keeping the statistics.
    pub fn clear_envelopes(&mut self) {
        self.envelopes.iter_mut().for_each(HashMap::clear);
    }

    /// Total number of memoised envelopes.
    #[must_use]
    pub fn envelope_count(&self) -> usize {
        self.envelopes.iter().map(HashMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        Dataset::new(
            vec![vec![3.0, 1.0, 2.0, 0.0], vec![0.0, 5.0, 1.0, 5.0]],
            vec![0, 1],
        )
        .unwrap()
    }

    #[test]
    fn stats_flags() {
        let cache = SequenceCache::new(&dataset());
        assert_eq!(cache.min(0), 0.0);
        assert_eq!(cache.max(0), 3.0);
        assert!(cache.is_max_first(0));
        assert!(cache.is_min_last(0));
        assert!(!cache.is_min_first(0));
        assert!(cache.is_min_first(1));
        assert!(cache.is_max_last(1));
        assert!(!cache.is_max_first(1));
    }

    #[test]
    fn deviation_order_is_descending_and_stable() {
        // mean 1.5: deviations 1.5, 0.5, 0.5, 1.5
        let cache = SequenceCache::new(&dataset());
        let order: Vec<usize> = (0..4).map(|k| cache.index_nth_highest_deviation(0, k)).collect();
        assert_eq!(order, vec![0, 3, 1, 2]);
    }

    #[test]
    fn envelopes_are_memoised() {
        let ds = dataset();
        let mut cache = SequenceCache::new(&ds);
        let key = EnvelopeKey::window(1);
        let first = cache.envelope(0, key, ds.series(0).as_slice());
        let second = cache.envelope(0, key, ds.series(0).as_slice());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.envelope_count(), 1);
        assert_eq!(first.upper(), &[3.0, 3.0, 2.0, 2.0]);
        assert_eq!(first.lower(), &[1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn gap_key_widens_to_gap() {
        let ds = dataset();
        let mut cache = SequenceCache::new(&ds);
        let env = cache.envelope(1, EnvelopeKey::gap(0, 2.5), ds.series(1).as_slice());
        assert_eq!(env.upper(), &[2.5, 5.0, 2.5, 5.0]);
        assert_eq!(env.lower(), &[0.0, 2.5, 1.0, 2.5]);
    }

    #[test]
    fn warm_and_clear() {
        let ds = dataset();
        let mut cache = SequenceCache::new(&ds);
        cache.warm(EnvelopeKey::window(2), &ds);
        assert_eq!(cache.envelope_count(), 2);
        assert!(cache.cached_envelope(1, EnvelopeKey::window(2)).is_some());
        assert!(cache.cached_envelope(1, EnvelopeKey::window(3)).is_none());
        cache.clear_envelopes();
        assert_eq!(cache.envelope_count(), 0);
    }
}
