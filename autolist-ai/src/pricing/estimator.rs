//! Price estimator
//!
//! **Algorithm:**
//! 1. Completeness check; an incomplete record returns its missing fields
//!    without touching the generator
//! 2. Generate the synthetic corpus
//! 3. Train on the blocking pool and score the subject
//! 4. Report `suggested ± MAE`, floored at zero and saturating at the top

use super::generator::SyntheticDataGenerator;
use super::trainer::{PriceModelTrainer, TrainingParams};
use super::PricingError;
use crate::models::{FeatureRecord, PriceEstimation};
use crate::types::TextGenerator;
use autolist_common::config::PricingConfig;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, warn};

/// Successful estimate
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub suggested_price: i64,
    pub min_price: i64,
    pub max_price: i64,
    /// Held-out MAE rounded to whole roubles
    pub mae: f64,
    pub generated_rows: Vec<Map<String, Value>>,
}

impl PriceQuote {
    /// Derive the range from a raw prediction and MAE
    ///
    /// The MAE is rounded first so the range is symmetric in whole units
    /// unless the lower bound is floored at zero.
    pub fn from_prediction(
        predicted: f64,
        mae: f64,
        generated_rows: Vec<Map<String, Value>>,
    ) -> Self {
        // Float to int casts saturate; NaN becomes 0
        let suggested_price = (predicted.round() as i64).max(0);
        let mae = mae.round().max(0.0);
        let spread = mae as i64;
        Self {
            suggested_price,
            min_price: suggested_price.saturating_sub(spread).max(0),
            max_price: suggested_price.saturating_add(spread),
            mae,
            generated_rows,
        }
    }
}

/// Result of one estimate; exactly one kind of answer by construction
#[derive(Debug, Clone, PartialEq)]
pub enum PriceOutcome {
    Estimated(PriceQuote),
    /// Required fields that were empty or invalid, in declared order
    MissingFields(Vec<String>),
    Failed(PricingError),
}

impl PriceOutcome {
    pub fn suggested_price(&self) -> Option<i64> {
        match self {
            PriceOutcome::Estimated(quote) => Some(quote.suggested_price),
            _ => None,
        }
    }

    /// Whether the price is unknown because of missing data or an error
    pub fn is_unresolved(&self) -> bool {
        match self {
            PriceOutcome::Estimated(_) => false,
            PriceOutcome::MissingFields(fields) => !fields.is_empty(),
            PriceOutcome::Failed(_) => true,
        }
    }
}

impl From<PriceOutcome> for PriceEstimation {
    fn from(outcome: PriceOutcome) -> Self {
        match outcome {
            PriceOutcome::Estimated(quote) => PriceEstimation {
                min_price: Some(quote.min_price),
                max_price: Some(quote.max_price),
                suggested_price: Some(quote.suggested_price),
                mae: Some(quote.mae),
                missing_fields: Vec::new(),
                error_message: None,
                generated_rows: Some(quote.generated_rows),
            },
            PriceOutcome::MissingFields(missing_fields) => PriceEstimation {
                missing_fields,
                ..PriceEstimation::default()
            },
            PriceOutcome::Failed(error) => PriceEstimation {
                error_message: Some(error.to_string()),
                ..PriceEstimation::default()
            },
        }
    }
}

/// End-to-end price estimation for one feature record
#[derive(Clone)]
pub struct PriceEstimator {
    generator: SyntheticDataGenerator,
    trainer: PriceModelTrainer,
}

impl PriceEstimator {
    pub fn new(text_generator: Arc<dyn TextGenerator>, config: &PricingConfig) -> Self {
        Self {
            generator: SyntheticDataGenerator::new(text_generator, config),
            trainer: PriceModelTrainer::new(TrainingParams::from(config)),
        }
    }

    pub fn with_generator(mut self, generator: SyntheticDataGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub async fn estimate(&self, record: FeatureRecord) -> PriceOutcome {
        let missing = record.missing_fields();
        if !missing.is_empty() {
            info!(?missing, "Price estimate skipped: required fields missing");
            return PriceOutcome::MissingFields(missing.into_iter().map(String::from).collect());
        }

        let corpus = match self.generator.generate(&record.brand, &record.model).await {
            Ok(corpus) => corpus,
            Err(e) => {
                warn!(error = %e, "Synthetic corpus generation failed");
                return PriceOutcome::Failed(e);
            }
        };

        let trainer = self.trainer.clone();
        let trained = tokio::task::spawn_blocking(move || {
            let model = trainer.train(&corpus)?;
            let predicted = model.predict(&record);
            Ok::<_, PricingError>((predicted, model.mae(), corpus.into_rows()))
        })
        .await;

        match trained {
            Ok(Ok((predicted, mae, rows))) if predicted.is_finite() && mae.is_finite() => {
                let quote = PriceQuote::from_prediction(predicted, mae, rows);
                info!(
                    suggested_price = quote.suggested_price,
                    mae = quote.mae,
                    "Price estimated"
                );
                PriceOutcome::Estimated(quote)
            }
            Ok(Ok(_)) => PriceOutcome::Failed(PricingError::Training(
                "model produced a non-finite price".to_string(),
            )),
            Ok(Err(e)) => {
                warn!(error = %e, "Price model training failed");
                PriceOutcome::Failed(e)
            }
            Err(join_error) => {
                warn!(error = %join_error, "Price model training task failed");
                PriceOutcome::Failed(PricingError::Scheduling(join_error.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_range_is_symmetric() {
        let quote = PriceQuote::from_prediction(1_234_567.4, 85_000.6, Vec::new());
        assert_eq!(quote.suggested_price, 1_234_567);
        assert_eq!(quote.mae, 85_001.0);
        assert_eq!(quote.min_price, 1_149_566);
        assert_eq!(quote.max_price, 1_319_568);
        assert_eq!(
            quote.max_price - quote.suggested_price,
            quote.suggested_price - quote.min_price
        );
    }

    #[test]
    fn test_quote_floor_at_zero() {
        let quote = PriceQuote::from_prediction(40_000.0, 90_000.0, Vec::new());
        assert_eq!(quote.min_price, 0);
        assert_eq!(quote.max_price, 130_000);
    }

    #[test]
    fn test_quote_saturates_on_extreme_values() {
        let quote = PriceQuote::from_prediction(9.0e18, 9.0e18, Vec::new());
        assert_eq!(quote.min_price, 0);
        assert_eq!(quote.max_price, i64::MAX);
        assert!(quote.suggested_price <= quote.max_price);

        let quote = PriceQuote::from_prediction(-25_000.0, 10_000.0, Vec::new());
        assert_eq!(quote.suggested_price, 0);
        assert_eq!(quote.min_price, 0);
        assert_eq!(quote.max_price, 10_000);
    }

    #[test]
    fn test_outcome_wire_shape_is_exclusive() {
        let missing: PriceEstimation =
            PriceOutcome::MissingFields(vec!["mileage".to_string()]).into();
        assert_eq!(missing.suggested_price, None);
        assert_eq!(missing.missing_fields, vec!["mileage"]);
        assert_eq!(missing.error_message, None);

        let failed: PriceEstimation =
            PriceOutcome::Failed(PricingError::Generation("too few rows".to_string())).into();
        assert_eq!(failed.suggested_price, None);
        assert_eq!(failed.error_message.as_deref(), Some("too few rows"));

        let estimated: PriceEstimation =
            PriceOutcome::Estimated(PriceQuote::from_prediction(100.0, 10.0, Vec::new())).into();
        assert_eq!(estimated.suggested_price, Some(100));
        assert!(estimated.missing_fields.is_empty());
        assert_eq!(estimated.error_message, None);
    }

    #[test]
    fn test_unresolved() {
        assert!(PriceOutcome::MissingFields(vec!["year".to_string()]).is_unresolved());
        assert!(PriceOutcome::Failed(PricingError::Training("x".to_string())).is_unresolved());
        assert!(!PriceOutcome::Estimated(PriceQuote::from_prediction(1.0, 0.0, Vec::new()))
            .is_unresolved());
    }
}
