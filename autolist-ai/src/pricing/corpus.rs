//! Synthetic corpus and its column vocabulary

use crate::models::lenient::{number_of, text_of};
use serde_json::{Map, Value};

/// Model inputs, in matrix column order
pub const FEATURE_COLUMNS: [&str; 15] = [
    "body_type",
    "color",
    "steering_wheel_position",
    "year",
    "engine_capacity",
    "transmission",
    "drive_type",
    "mileage",
    "damage_flag",
    "visual_condition_score",
    "inspection_reliability_score",
    "defects_cnt",
    "defects_severity_weak_cnt",
    "defects_severity_moderate_cnt",
    "defects_severity_strong_cnt",
];

/// Feature columns treated as categories rather than numbers
pub const CATEGORICAL_FEATURES: [&str; 6] = [
    "color",
    "steering_wheel_position",
    "body_type",
    "transmission",
    "drive_type",
    "damage_flag",
];

/// Target column
pub const PRICE_COLUMN: &str = "price";

/// Prices above this are treated as generator noise
pub const MAX_PLAUSIBLE_PRICE: i64 = 1_000_000_000_000;

pub fn is_categorical(column: &str) -> bool {
    CATEGORICAL_FEATURES.contains(&column)
}

/// One cell of the feature matrix before encoding
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Numeric(f64),
    Category(String),
}

/// Read a feature from a row
///
/// Absent or unreadable cells take the neutral value: 0 for numeric
/// columns, the empty category for categorical ones. Categories are
/// compared case-insensitively.
pub fn feature_value(row: &Map<String, Value>, column: &str) -> FeatureValue {
    let cell = row.get(column).unwrap_or(&Value::Null);
    if is_categorical(column) {
        FeatureValue::Category(text_of(cell).to_lowercase())
    } else {
        FeatureValue::Numeric(number_of(cell).unwrap_or(0.0))
    }
}

/// Integer price from a number or numeric string, truncated toward zero
///
/// Non-positive prices and prices above [`MAX_PLAUSIBLE_PRICE`] are rejected.
pub fn coerce_price(value: &Value) -> Option<i64> {
    number_of(value)
        .map(f64::trunc)
        .filter(|price| *price >= 1.0 && *price <= MAX_PLAUSIBLE_PRICE as f64)
        .map(|price| price as i64)
}

/// Rows generated for one (brand, model) pair
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyntheticCorpus {
    rows: Vec<Map<String, Value>>,
}

impl SyntheticCorpus {
    /// Keep only the JSON objects of a generated array
    pub fn from_values(values: Vec<Value>) -> Self {
        let rows = values
            .into_iter()
            .filter_map(|value| match value {
                Value::Object(row) => Some(row),
                _ => None,
            })
            .collect();
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Map<String, Value>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Map<String, Value>> {
        self.rows
    }

    /// Whether any row carries a price
    pub fn has_price_column(&self) -> bool {
        self.rows.iter().any(|row| row.contains_key(PRICE_COLUMN))
    }

    /// Rows whose price coerces to an integer, with that price
    pub fn priced_rows(&self) -> Vec<(&Map<String, Value>, i64)> {
        self.rows
            .iter()
            .filter_map(|row| {
                row.get(PRICE_COLUMN)
                    .and_then(coerce_price)
                    .map(|price| (row, price))
            })
            .collect()
    }
}
