//! Sakoe-Chiba envelopes and the Keogh lower bound.

use std::collections::VecDeque;

/// Upper and lower envelope of a series under a warping window.
///
/// `upper[i]` is the maximum of `series[j]` over `|i - j| <= radius` and
/// `lower[i]` the minimum. ERP bounds use the variant built with
/// [`SeriesEnvelope::with_gap`].
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesEnvelope {
    upper: Vec<f64>,
    lower: Vec<f64>,
}

impl SeriesEnvelope {
    /// Compute the envelope of `series` for a window of half-width `radius`.
    ///
    /// Runs in O(n) using monotonic deques. A radius of at least `n` gives the
    /// global maximum and minimum at every position.
    #[must_use]
    pub fn compute(series: &[f64], radius: usize) -> Self {
        let n = series.len();
        let mut upper = Vec::with_capacity(n);
        let mut lower = Vec::with_capacity(n);

        // Front of `maxima` holds the index of the window maximum, values
        // decreasing towards the back. `minima` mirrors it for the minimum.
        let mut maxima: VecDeque<usize> = VecDeque::new();
        let mut minima: VecDeque<usize> = VecDeque::new();
        let mut pending = 0;

        for i in 0..n {
            let hi = i.saturating_add(radius).min(n - 1);
            while pending <= hi {
                let value = series[pending];
                while maxima.back().is_some_and(|&k| series[k] <= value) {
                    maxima.pop_back();
                }
                while minima.back().is_some_and(|&k| series[k] >= value) {
                    minima.pop_back();
                }
                maxima.push_back(pending);
                minima.push_back(pending);
                pending += 1;
            }

            let lo = i.saturating_sub(radius);
            while maxima.front().is_some_and(|&k| k < lo) {
                maxima.pop_front();
            }
            while minima.front().is_some_and(|&k| k < lo) {
                minima.pop_front();
            }

            // Index `i` is always inside its own window.
            let top = maxima.front().map_or(series[i], |&k| series[k]);
            let bottom = minima.front().map_or(series[i], |&k| series[k]);
            upper.push(top);
            lower.push(bottom);
        }

        Self { upper, lower }
    }

    /// Stretch the envelope so every position also admits `gap`.
    #[must_use]
    pub fn with_gap(mut self, gap: f64) -> Self {
        for (u, l) in self.upper.iter_mut().zip(self.lower.iter_mut()) {
            *u = u.max(gap);
            *l = l.min(gap);
        }
        self
    }

    /// Return the upper envelope values.
    #[must_use]
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Return the lower envelope values.
    #[must_use]
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Bounds at position `i` as `(lower, upper)`.
    #[must_use]
    pub fn at(&self, i: usize) -> (f64, f64) {
        (self.lower[i], self.upper[i])
    }

    /// Return the length of the envelope (same as the input series).
    #[must_use]
    pub fn len(&self) -> usize {
        self.upper.len()
    }

    /// Return true if the envelope is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.upper.is_empty()
    }
}

/// Distance from `value` to the closed interval `[lower, upper]`. Zero inside.
#[must_use]
pub fn distance_to_interval(value: f64, lower: f64, upper: f64) -> f64 {
    if value > upper {
        value - upper
    } else if value < lower {
        lower - value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force(series: &[f64], radius: usize) -> (Vec<f64>, Vec<f64>) {
        let n = series.len();
        (0..n)
            .map(|i| {
                let window = &series[i.saturating_sub(radius)..(i + radius + 1).min(n)];
                let lo = window.iter().copied().fold(f64::INFINITY, f64::min);
                let hi = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                (lo, hi)
            })
            .unzip()
    }

    #[test]
    fn matches_brute_force_for_several_radii() {
        let data = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0, 5.0, 3.0];
        for radius in [0, 1, 2, 3, 9, 20] {
            let env = SeriesEnvelope::compute(&data, radius);
            let (lower, upper) = brute_force(&data, radius);
            assert_eq!(env.lower(), lower.as_slice(), "lower, radius {radius}");
            assert_eq!(env.upper(), upper.as_slice(), "upper, radius {radius}");
        }
    }

    #[test]
    fn radius_zero_equals_series() {
        let data = [3.0, 1.0, 4.0, 1.0];
        let env = SeriesEnvelope::compute(&data, 0);
        assert_eq!(env.upper(), &data);
        assert_eq!(env.lower(), &data);
    }

    #[test]
    fn unconstrained_radius_is_global_extremes() {
        let data = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
        let env = SeriesEnvelope::compute(&data, crate::constraint::UNCONSTRAINED);
        assert!(env.upper().iter().all(|&u| u == 9.0));
        assert!(env.lower().iter().all(|&l| l == 1.0));
    }

    #[test]
    fn gap_is_always_admitted() {
        let env = SeriesEnvelope::compute(&[1.0, 2.0, 3.0], 0).with_gap(2.5);
        assert_eq!(env.lower(), &[1.0, 2.0, 2.5]);
        assert_eq!(env.upper(), &[2.5, 2.5, 3.0]);
    }

    #[test]
    fn interval_distance() {
        assert_eq!(distance_to_interval(5.0, 1.0, 3.0), 2.0);
        assert_eq!(distance_to_interval(-1.0, 1.0, 3.0), 2.0);
        assert_eq!(distance_to_interval(2.0, 1.0, 3.0), 0.0);
    }
}
