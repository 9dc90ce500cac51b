//! Price model training
//!
//! Splits the corpus with a fixed seed, target-encodes the categorical
//! columns on the training split, fits the boosted regressor and measures
//! MAE on the held-out rows. CPU-bound; callers run it on the blocking pool.

use super::corpus::{
    feature_value, FeatureValue, SyntheticCorpus, CATEGORICAL_FEATURES, FEATURE_COLUMNS,
};
use super::gbm::{BoostingParams, GradientBoostedRegressor};
use super::PricingError;
use crate::models::FeatureRecord;
use autolist_common::config::PricingConfig;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

/// Weight of the prior in the smoothed category mean
const PRIOR_WEIGHT: f64 = 1.0;

/// Training hyperparameters
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingParams {
    pub boosting: BoostingParams,
    pub seed: u64,
    pub test_fraction: f64,
    pub min_rows: usize,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self::from(&PricingConfig::default())
    }
}

impl From<&PricingConfig> for TrainingParams {
    fn from(config: &PricingConfig) -> Self {
        Self {
            boosting: BoostingParams {
                iterations: config.iterations,
                learning_rate: config.learning_rate,
                max_depth: config.depth,
                min_samples_leaf: 2,
            },
            seed: config.seed,
            test_fraction: config.test_fraction,
            min_rows: config.min_rows,
        }
    }
}

/// Per-column category statistics from the training split
#[derive(Debug, Clone, Default)]
struct CategoryEncoder {
    /// category -> (sum of prices, count)
    stats: HashMap<String, (f64, f64)>,
}

impl CategoryEncoder {
    fn fit<'a>(categories: impl Iterator<Item = (&'a str, f64)>) -> Self {
        let mut stats: HashMap<String, (f64, f64)> = HashMap::new();
        for (category, price) in categories {
            let entry = stats.entry(category.to_string()).or_default();
            entry.0 += price;
            entry.1 += 1.0;
        }
        Self { stats }
    }

    /// Smoothed mean price of a category; unknown categories get the prior
    fn encode(&self, category: &str, prior: f64) -> f64 {
        match self.stats.get(category) {
            Some((sum, count)) => (sum + prior * PRIOR_WEIGHT) / (count + PRIOR_WEIGHT),
            None => prior,
        }
    }

    /// Same, with the row's own price left out (training rows only)
    fn encode_excluding(&self, category: &str, own_price: f64, prior: f64) -> f64 {
        match self.stats.get(category) {
            Some((sum, count)) => {
                (sum - own_price + prior * PRIOR_WEIGHT) / (count - 1.0 + PRIOR_WEIGHT)
            }
            None => prior,
        }
    }
}

/// Category encoders for every categorical column plus the shared prior
#[derive(Debug, Clone)]
struct FeatureEncoding {
    encoders: HashMap<&'static str, CategoryEncoder>,
    prior: f64,
}

impl FeatureEncoding {
    fn fit(train: &[(&Map<String, Value>, f64)]) -> Self {
        let prior = train.iter().map(|(_, price)| price).sum::<f64>() / train.len() as f64;
        let encoders = CATEGORICAL_FEATURES
            .iter()
            .map(|&column| {
                let categories: Vec<(String, f64)> = train
                    .iter()
                    .filter_map(|(row, price)| match feature_value(row, column) {
                        FeatureValue::Category(category) => Some((category, *price)),
                        FeatureValue::Numeric(_) => None,
                    })
                    .collect();
                let encoder =
                    CategoryEncoder::fit(categories.iter().map(|(c, p)| (c.as_str(), *p)));
                (column, encoder)
            })
            .collect();
        Self { encoders, prior }
    }

    /// Feature vector for a row; `own_price` enables leave-one-out encoding
    fn encode_row(&self, row: &Map<String, Value>, own_price: Option<f64>) -> Vec<f64> {
        FEATURE_COLUMNS
            .iter()
            .map(|column| match feature_value(row, column) {
                FeatureValue::Numeric(value) => value,
                FeatureValue::Category(category) => {
                    match (self.encoders.get(column), own_price) {
                        (Some(encoder), Some(price)) => {
                            encoder.encode_excluding(&category, price, self.prior)
                        }
                        (Some(encoder), None) => encoder.encode(&category, self.prior),
                        (None, _) => self.prior,
                    }
                }
            })
            .collect()
    }
}

/// Fitted model plus its held-out error; discarded after one prediction
#[derive(Debug, Clone)]
pub struct TrainedPriceModel {
    regressor: GradientBoostedRegressor,
    encoding: FeatureEncoding,
    mae: f64,
    train_rows: usize,
    test_rows: usize,
}

impl TrainedPriceModel {
    /// Mean absolute error on the held-out split
    pub fn mae(&self) -> f64 {
        self.mae
    }

    pub fn train_rows(&self) -> usize {
        self.train_rows
    }

    pub fn test_rows(&self) -> usize {
        self.test_rows
    }

    /// Predict the price of a corpus-style row
    pub fn predict_row(&self, row: &Map<String, Value>) -> f64 {
        self.regressor.predict(&self.encoding.encode_row(row, None))
    }

    pub fn predict(&self, record: &FeatureRecord) -> f64 {
        self.predict_row(&record.to_row())
    }
}

/// Test-set size: `ceil(n * fraction)`, leaving at least one row on each side
pub fn test_size(n: usize, fraction: f64) -> usize {
    let raw = (n as f64 * fraction).ceil() as usize;
    raw.clamp(1, n.saturating_sub(1).max(1))
}

fn select<'a>(
    priced: &[(&'a Map<String, Value>, i64)],
    indices: &[usize],
) -> Vec<(&'a Map<String, Value>, f64)> {
    indices
        .iter()
        .map(|&i| (priced[i].0, priced[i].1 as f64))
        .collect()
}

/// Trains one throwaway model per estimate
#[derive(Debug, Clone, Default)]
pub struct PriceModelTrainer {
    params: TrainingParams,
}

impl PriceModelTrainer {
    pub fn new(params: TrainingParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TrainingParams {
        &self.params
    }

    pub fn train(&self, corpus: &SyntheticCorpus) -> Result<TrainedPriceModel, PricingError> {
        let min_rows = self.params.min_rows;
        if !corpus.has_price_column() || corpus.len() < min_rows {
            return Err(PricingError::Training(
                "no price column or too few rows".to_string(),
            ));
        }

        let priced = corpus.priced_rows();
        if priced.len() < min_rows {
            return Err(PricingError::Training("too few valid prices".to_string()));
        }

        // Seeded shuffle, then the first n_test rows are held out
        let mut order: Vec<usize> = (0..priced.len()).collect();
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        order.shuffle(&mut rng);
        let n_test = test_size(priced.len(), self.params.test_fraction);
        let (test_idx, train_idx) = order.split_at(n_test);

        let train = select(&priced, train_idx);
        let test = select(&priced, test_idx);

        let encoding = FeatureEncoding::fit(&train);
        let x_train: Vec<Vec<f64>> = train
            .iter()
            .map(|(row, price)| encoding.encode_row(row, Some(*price)))
            .collect();
        let y_train: Vec<f64> = train.iter().map(|(_, price)| *price).collect();
        let regressor = GradientBoostedRegressor::fit(&x_train, &y_train, &self.params.boosting);

        let mut model = TrainedPriceModel {
            regressor,
            encoding,
            mae: 0.0,
            train_rows: train.len(),
            test_rows: test.len(),
        };
        let abs_errors: f64 = test
            .iter()
            .map(|(row, price)| (model.predict_row(row) - price).abs())
            .sum();
        model.mae = abs_errors / test.len() as f64;

        debug!(
            train_rows = model.train_rows,
            test_rows = model.test_rows,
            trees = model.regressor.n_trees(),
            mae = model.mae,
            "Price model trained"
        );
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn corpus(n: usize) -> SyntheticCorpus {
        SyntheticCorpus::from_values(
            (0..n)
                .map(|i| {
                    json!({
                        "brand": "Lada",
                        "model": "Vesta",
                        "color": if i % 2 == 0 { "white" } else { "black" },
                        "year": 2015 + (i % 8) as i64,
                        "mileage": 200_000 - (i as i64) * 5_000,
                        "price": 700_000 + (i as i64 % 8) * 50_000,
                    })
                })
                .collect(),
        )
    }

    #[test]
    fn test_test_size() {
        assert_eq!(test_size(50, 0.2), 10);
        assert_eq!(test_size(12, 0.2), 3);
        assert_eq!(test_size(10, 0.2), 2);
        assert_eq!(test_size(2, 0.9), 1);
    }

    #[test]
    fn test_rejects_missing_price_column() {
        let rows = SyntheticCorpus::from_values((0..12).map(|i| json!({"year": i})).collect());
        let err = PriceModelTrainer::default().train(&rows).unwrap_err();
        assert_eq!(err.to_string(), "no price column or too few rows");
    }

    #[test]
    fn test_rejects_too_few_valid_prices() {
        let mut values: Vec<Value> = (0..6).map(|i| json!({"price": 100 + i})).collect();
        values.extend((0..6).map(|_| json!({"price": "call me"})));
        let err = PriceModelTrainer::default()
            .train(&SyntheticCorpus::from_values(values))
            .unwrap_err();
        assert_eq!(err, PricingError::Training("too few valid prices".to_string()));
    }

    #[test]
    fn test_trains_and_reports_mae() {
        let trainer = PriceModelTrainer::default();
        let model = trainer.train(&corpus(40)).unwrap();

        assert_eq!(model.test_rows(), 8);
        assert_eq!(model.train_rows(), 32);
        assert!(model.mae().is_finite());
        assert!(model.mae() >= 0.0);

        let row = corpus(1).into_rows().remove(0);
        let predicted = model.predict_row(&row);
        assert!(predicted > 600_000.0 && predicted < 1_100_000.0);
    }

    #[test]
    fn test_same_seed_same_model() {
        let trainer = PriceModelTrainer::default();
        let a = trainer.train(&corpus(30)).unwrap();
        let b = trainer.train(&corpus(30)).unwrap();
        assert_eq!(a.mae(), b.mae());
    }

    #[test]
    fn test_unknown_category_uses_prior() {
        let encoder = CategoryEncoder::fit([("white", 10.0), ("white", 20.0)].into_iter());
        assert_eq!(encoder.encode("red", 7.0), 7.0);
        assert_eq!(encoder.encode("white", 15.0), 15.0);
        assert_eq!(encoder.encode_excluding("white", 10.0, 14.0), 17.0);
    }
}
