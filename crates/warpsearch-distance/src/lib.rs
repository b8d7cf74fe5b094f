//! Elastic distance kernels for time series.
//!
//! Pure math library, no I/O. Provides exact DTW, ERP, LCSS, MSM, TWE, WDTW
//! and Euclidean distances. Every kernel supports early abandoning against a
//! cutoff and an extended form that also reports the smallest warping window
//! for which the computed distance stays exact. Dynamic programming rows live
//! in a caller-owned [`Workspace`] so repeated evaluations never allocate.

mod constraint;
mod distance;
mod dtw;
mod envelope;
mod erp;
mod error;
mod euclidean;
mod lcss;
mod msm;
mod preprocess;
mod series;
mod twe;
mod wdtw;
mod workspace;

pub use constraint::{UNCONSTRAINED, window_from_fraction, window_from_percent};
pub use distance::{ElasticDistance, ExtendedDistance};
pub use dtw::Dtw;
pub use envelope::{SeriesEnvelope, distance_to_interval};
pub use erp::Erp;
pub use error::{DistanceError, PreprocessError};
pub use euclidean::Euclidean;
pub use lcss::Lcss;
pub use msm::Msm;
pub use preprocess::{derivative, derivative_batch, z_normalize, z_normalize_batch};
pub use series::{TimeSeries, TimeSeriesView};
pub use twe::Twe;
pub use wdtw::Wdtw;
pub use workspace::Workspace;
