//! On-demand price estimation
//!
//! Per request: generate a synthetic corpus of comparable cars, train a
//! throwaway gradient-boosted regressor on it, score the subject car and
//! report `price ± MAE`. Nothing is persisted between requests.
//!
//! - [`generator`] - synthetic corpus from a [`TextGenerator`](crate::types::TextGenerator)
//! - [`corpus`] - column vocabulary and value coercion
//! - [`gbm`] - least-absolute-deviation gradient boosting
//! - [`trainer`] - split, encode, fit, measure
//! - [`estimator`] - completeness gate and the end-to-end estimate

pub mod corpus;
pub mod estimator;
pub mod gbm;
pub mod generator;
pub mod trainer;

pub use corpus::SyntheticCorpus;
pub use estimator::{PriceEstimator, PriceOutcome, PriceQuote};
pub use generator::{RetryPolicy, SyntheticDataGenerator};
pub use trainer::{PriceModelTrainer, TrainedPriceModel};

use thiserror::Error;

/// Why a price could not be produced
///
/// The display text is the reason reported to the client, verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    /// Synthetic corpus could not be obtained
    #[error("{0}")]
    Generation(String),

    /// Corpus unusable for training
    #[error("{0}")]
    Training(String),

    /// Pricing task panicked or was cancelled
    #[error("price estimation task failed: {0}")]
    Scheduling(String),
}
