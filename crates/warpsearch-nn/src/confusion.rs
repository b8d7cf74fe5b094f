//! Confusion matrix and per-class metrics for test-set evaluation.

use std::fmt;

use crate::error::NnError;

/// Counts of true class (rows) against predicted class (columns).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ConfusionMatrix {
    n_classes: usize,
    counts: Vec<usize>,
}

/// Precision, recall and F1 of one class.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ClassMetrics {
    /// The class index.
    pub class: usize,
    /// `tp / (tp + fp)`, or 0.0 when the class was never predicted.
    pub precision: f64,
    /// `tp / (tp + fn)`, or 0.0 when the class has no true members.
    pub recall: f64,
    /// Harmonic mean of precision and recall, 0.0 when both are zero.
    pub f1: f64,
    /// Number of true members.
    pub support: usize,
}

impl ConfusionMatrix {
    /// Tally `predicted` against `true_labels` pairwise.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`NnError::EmptyDataset`] | No labels |
    /// | [`NnError::LabelCountMismatch`] | `predicted` and `true_labels` differ in length |
    pub fn from_labels(true_labels: &[usize], predicted: &[usize], n_classes: usize) -> Result<Self, NnError> {
        if true_labels.is_empty() {
            return Err(NnError::EmptyDataset);
        }
        if predicted.len() != true_labels.len() {
            return Err(NnError::LabelCountMismatch {
                n_series: predicted.len(),
                n_labels: true_labels.len(),
            });
        }
        let mut counts = vec![0; n_classes * n_classes];
        for (&t, &p) in true_labels.iter().zip(predicted) {
            counts[t * n_classes + p] += 1;
        }
        Ok(Self { n_classes, counts })
    }

    /// Number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Number of series of class `truth` predicted as `predicted`.
    #[must_use]
    pub fn count(&self, truth: usize, predicted: usize) -> usize {
        self.counts[truth * self.n_classes + predicted]
    }

    /// Counts for true class `truth`, indexed by predicted class.
    #[must_use]
    pub fn row(&self, truth: usize) -> &[usize] {
        &self.counts[truth * self.n_classes..(truth + 1) * self.n_classes]
    }

    /// Total number of predictions.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Fraction of predictions on the diagonal.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let correct: usize = (0..self.n_classes).map(|c| self.count(c, c)).sum();
        correct as f64 / total as f64
    }

    /// Metrics of every class in index order.
    #[must_use]
    pub fn class_metrics(&self) -> Vec<ClassMetrics> {
        (0..self.n_classes)
            .map(|class| {
                let tp = self.count(class, class);
                let predicted: usize = (0..self.n_classes).map(|t| self.count(t, class)).sum();
                let support: usize = self.row(class).iter().sum();
                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1 = if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };
                ClassMetrics {
                    class,
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect()
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8}", "")?;
        for p in 0..self.n_classes {
            write!(f, " pred_{p:>3}")?;
        }
        writeln!(f)?;
        for t in 0..self.n_classes {
            write!(f, "true_{t:>3}")?;
            for count in self.row(t) {
                write!(f, " {count:>8}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
