//! Series transforms applied before distance computation: z-normalization
//! and the Keogh-Pazzani derivative.

use crate::error::PreprocessError;
use crate::series::TimeSeries;

/// Mean and population standard deviation.
fn moments(data: &[f64]) -> (f64, f64) {
    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    let variance = data.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Shift and scale a series to zero mean and unit population variance.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`PreprocessError::ConstantSeries`] | Zero variance |
#[must_use = "returns a new normalized series; the input is unchanged"]
pub fn z_normalize(series: &TimeSeries) -> Result<TimeSeries, PreprocessError> {
    let data = series.as_ref();
    let (mean, std) = moments(data);
    if std == 0.0 {
        return Err(PreprocessError::ConstantSeries {
            n: data.len(),
            value: data[0],
        });
    }
    Ok(TimeSeries::from_validated(
        data.iter().map(|&x| (x - mean) / std).collect(),
    ))
}

/// Z-normalize every series of a batch independently.
///
/// # Errors
///
/// Returns the first [`PreprocessError`] encountered.
#[must_use = "returns a new vector of normalized series"]
pub fn z_normalize_batch(series: &[TimeSeries]) -> Result<Vec<TimeSeries>, PreprocessError> {
    series.iter().map(z_normalize).collect()
}

/// Keogh-Pazzani first derivative of a time series.
///
/// For interior points: `d[i] = ((x[i] - x[i-1]) + (x[i+1] - x[i-1]) / 2) / 2`.
/// The output drops the first and last points, so it has length `n - 2`.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`PreprocessError::TooShort`] | Series has fewer than 3 points |
#[must_use = "returns a new derivative series; the input is unchanged"]
pub fn derivative(series: &TimeSeries) -> Result<TimeSeries, PreprocessError> {
    let data = series.as_ref();
    let n = data.len();

    if n < 3 {
        return Err(PreprocessError::TooShort { len: n });
    }

    Ok(TimeSeries::from_validated(
        data.windows(3)
            .map(|w| ((w[1] - w[0]) + (w[2] - w[0]) / 2.0) / 2.0)
            .collect(),
    ))
}

/// Derivative of every series of a batch.
///
/// # Errors
///
/// Returns the first [`PreprocessError`] encountered.
#[must_use = "returns a new vector of derivative series"]
pub fn derivative_batch(series: &[TimeSeries]) -> Result<Vec<TimeSeries>, PreprocessError> {
    series.iter().map(derivative).collect()
}
