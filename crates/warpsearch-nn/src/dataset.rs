//! Labelled collections of equal-length series.

use warpsearch_distance::{TimeSeries, TimeSeriesView};

use crate::error::NnError;

/// An immutable set of labelled series of one common length.
///
/// Labels are class indices `0..n_classes`; `n_classes` is one more than
/// the largest label, so classes without members are allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    series: Vec<TimeSeries>,
    labels: Vec<usize>,
    n_classes: usize,
}

impl Dataset {
    /// Build a dataset from raw values and labels.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`NnError::EmptyDataset`] | No series |
    /// | [`NnError::LabelCountMismatch`] | `labels.len() != values.len()` |
    /// | [`NnError::Distance`] | A series contains NaN or infinity |
    /// | [`NnError::SeriesTooShort`] | A series has fewer than 2 points |
    /// | [`NnError::LengthMismatch`] | Series lengths differ |
    pub fn new(values: Vec<Vec<f64>>, labels: Vec<usize>) -> Result<Self, NnError> {
        let series = values
            .into_iter()
            .map(TimeSeries::new)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_series(series, labels)
    }

    /// Build a dataset from validated series and labels.
    ///
    /// # Errors
    ///
    /// Same as [`Dataset::new`], except series values are already validated.
    pub fn from_series(series: Vec<TimeSeries>, labels: Vec<usize>) -> Result<Self, NnError> {
        if series.is_empty() {
            return Err(NnError::EmptyDataset);
        }
        if series.len() != labels.len() {
            return Err(NnError::LabelCountMismatch {
                n_series: series.len(),
                n_labels: labels.len(),
            });
        }

        let expected = series[0].len();
        for (index, s) in series.iter().enumerate() {
            if s.len() < 2 {
                return Err(NnError::SeriesTooShort {
                    index,
                    len: s.len(),
                });
            }
            if s.len() != expected {
                return Err(NnError::LengthMismatch {
                    index,
                    expected,
                    found: s.len(),
                });
            }
        }

        let n_classes = labels.iter().max().map_or(0, |&max| max + 1);
        Ok(Self {
            series,
            labels,
            n_classes,
        })
    }

    /// Number of series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Always false: construction rejects empty datasets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Borrow series `index`.
    #[must_use]
    pub fn series(&self, index: usize) -> TimeSeriesView<'_> {
        self.series[index].as_view()
    }

    /// Borrow all series.
    #[must_use]
    pub fn all_series(&self) -> &[TimeSeries] {
        &self.series
    }

    /// Class label of series `index`.
    #[must_use]
    pub fn label(&self, index: usize) -> usize {
        self.labels[index]
    }

    /// All labels, in series order.
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Number of classes (largest label plus one).
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Common length of every series.
    #[must_use]
    pub fn series_len(&self) -> usize {
        self.series[0].len()
    }

    /// Population standard deviation over every value of every series.
    #[must_use]
    pub fn value_std(&self) -> f64 {
        let count = (self.len() * self.series_len()) as f64;
        let values = || self.series.iter().flat_map(|s| s.as_ref().iter().copied());
        let mean = values().sum::<f64>() / count;
        let variance = values().map(|x| (x - mean).powi(2)).sum::<f64>() / count;
        variance.sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_and_counts_classes() {
        let ds = Dataset::new(vec![vec![0.0, 1.0], vec![2.0, 3.0]], vec![0, 2]).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.n_classes(), 3);
        assert_eq!(ds.series_len(), 2);
        assert_eq!(ds.label(1), 2);
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(Dataset::new(vec![], vec![]), Err(NnError::EmptyDataset));
    }

    #[test]
    fn rejects_label_mismatch() {
        let err = Dataset::new(vec![vec![0.0, 1.0]], vec![0, 1]).unwrap_err();
        assert_eq!(
            err,
            NnError::LabelCountMismatch {
                n_series: 1,
                n_labels: 2
            }
        );
    }

    #[test]
    fn rejects_short_series() {
        let err = Dataset::new(vec![vec![0.0, 1.0], vec![1.0]], vec![0, 1]).unwrap_err();
        assert_eq!(err, NnError::SeriesTooShort { index: 1, len: 1 });
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = Dataset::new(vec![vec![0.0, 1.0], vec![1.0, 2.0, 3.0]], vec![0, 1]).unwrap_err();
        assert_eq!(
            err,
            NnError::LengthMismatch {
                index: 1,
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn rejects_nan() {
        let err = Dataset::new(vec![vec![0.0, f64::NAN]], vec![0]).unwrap_err();
        assert!(matches!(err, NnError::Distance(_)));
    }

    #[test]
    fn value_std_is_population() {
        let ds = Dataset::new(vec![vec![1.0, 3.0], vec![1.0, 3.0]], vec![0, 1]).unwrap();
        assert!((ds.value_std() - 1.0).abs() < 1e-12);
    }
}
