//! Synthetic comparable-car corpus
//!
//! One completion request per attempt asks for exactly `target_rows` records
//! of the subject's brand and model. Replies with fewer than `min_rows`
//! objects, or that do not parse as a JSON array, are retried at the next
//! temperature of the [`RetryPolicy`].

use super::corpus::SyntheticCorpus;
use super::PricingError;
use crate::agents::json_text::extract_json_array;
use crate::types::{CompletionRequest, TextGenerator};
use autolist_common::config::PricingConfig;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Attempt schedule: one sampling temperature per attempt
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    temperatures: Vec<f32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            temperatures: vec![0.7, 0.9],
        }
    }
}

impl RetryPolicy {
    /// An empty schedule falls back to the default one
    pub fn new(temperatures: Vec<f32>) -> Self {
        if temperatures.is_empty() {
            Self::default()
        } else {
            Self { temperatures }
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.temperatures.len()
    }

    pub fn temperatures(&self) -> &[f32] {
        &self.temperatures
    }
}

/// Build the generation prompt for one (brand, model) pair
pub fn build_prompt(brand: &str, model: &str, n_rows: usize) -> String {
    format!(
        r#"You are a generator of synthetic used-car market data. Return DATA ONLY.

Generate EXACTLY {n_rows} records for ONE car model:
brand = "{brand}"
model = "{model}"

Every record is a separate car (different year, mileage, condition, defects and price).

Use STRICTLY these fields: brand, model, body_type, color, steering_wheel_position ("left"|"right"), year (integer), engine_capacity (number, litres), transmission ("manual"|"automatic"|"robot"|"cvt"), drive_type ("fwd"|"rwd"|"awd"|"4wd"), mileage (integer, km), damage_flag ("не битый"|"битый"|"не определено"), visual_condition_score (0.3-1.0), inspection_reliability_score (0.5-1.0), defects_cnt, defects_severity_weak_cnt, defects_severity_moderate_cnt, defects_severity_strong_cnt, price (roubles, integer).

Rules: higher mileage and older year lower the price; better condition raises it. Prices must be realistic for the Russian market.
defects_cnt = defects_severity_weak_cnt + defects_severity_moderate_cnt + defects_severity_strong_cnt.

Return ONLY a valid JSON array of {n_rows} objects, with no text before or after it.
The array must contain exactly {n_rows} objects. Returning an empty array [] is forbidden."#
    )
}

/// Requests and validates synthetic corpora
#[derive(Clone)]
pub struct SyntheticDataGenerator {
    generator: Arc<dyn TextGenerator>,
    policy: RetryPolicy,
    target_rows: usize,
    min_rows: usize,
    max_tokens: u32,
}

impl SyntheticDataGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>, config: &PricingConfig) -> Self {
        Self {
            generator,
            policy: RetryPolicy::new(config.temperatures.clone()),
            target_rows: config.target_rows,
            min_rows: config.min_rows,
            max_tokens: config.max_tokens,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Generate a corpus of at least `min_rows` rows
    ///
    /// # Errors
    /// `PricingError::Generation` with the last attempt's reason: "empty data",
    /// "too few rows", "failed to parse synthetic data", or the transport error.
    pub async fn generate(&self, brand: &str, model: &str) -> Result<SyntheticCorpus, PricingError> {
        let prompt = build_prompt(brand, model, self.target_rows);
        let mut last_error = "empty data".to_string();

        for (attempt, &temperature) in self.policy.temperatures().iter().enumerate() {
            let attempt = attempt + 1;
            debug!(
                generator = self.generator.name(),
                attempt, temperature, "Requesting synthetic corpus"
            );

            let request = CompletionRequest {
                prompt: prompt.clone(),
                temperature: Some(temperature),
                max_tokens: self.max_tokens,
            };

            let reply = match self.generator.complete(request).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(attempt, error = %e, "Synthetic data request failed");
                    last_error = e.to_string();
                    continue;
                }
            };

            let corpus = match extract_json_array(&reply) {
                Ok(values) => SyntheticCorpus::from_values(values),
                Err(e) => {
                    warn!(attempt, error = %e, "Synthetic data did not parse");
                    last_error = "failed to parse synthetic data".to_string();
                    continue;
                }
            };

            if corpus.len() >= self.min_rows {
                info!(
                    brand,
                    model,
                    rows = corpus.len(),
                    attempt,
                    "Synthetic corpus generated"
                );
                return Ok(corpus);
            }

            last_error = if corpus.is_empty() {
                "empty data".to_string()
            } else {
                "too few rows".to_string()
            };
            warn!(
                attempt,
                rows = corpus.len(),
                min_rows = self.min_rows,
                "Synthetic corpus too small"
            );
        }

        Err(PricingError::Generation(last_error))
    }
}
