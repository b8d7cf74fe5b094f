//! One-nearest-neighbour time series classification under elastic distances.
//!
//! Builds on the kernels of `warpsearch-distance`. Parameter selection runs
//! leave-one-out cross-validation over a 100-entry grid per measure; the
//! fast search shares lazily tightened lower bounds across the whole grid so
//! the full accuracy curve costs about as much as one exhaustive search.

mod cache;
mod classifier;
mod config;
mod confusion;
mod dataset;
mod error;
mod lazy;
mod loocv;
mod measure;
mod result;
mod scan;
mod search;

pub use cache::{EnvelopeKey, SequenceCache, SeriesStats};
pub use classifier::OneNearestNeighbour;
pub use config::{LoocvMode, SeriesTransform};
pub use confusion::{ClassMetrics, ConfusionMatrix};
pub use dataset::Dataset;
pub use error::NnError;
pub use lazy::{AssessContext, BoundStage, LazyAssessor, Refinement};
pub use measure::{BoundBasis, GRID_SIZE, Measure, ParamShift, Schedule};
pub use result::{ClassificationResults, TrainingResults};
pub use search::{CandidateNn, NnStatus, NnTable};
