//! Pricing feature record
//!
//! One vehicle's attributes in the column vocabulary shared with the synthetic
//! corpus. The coordinator builds a record from phase-1 output (or from the
//! edited form on recalculation) and hands copies to the price estimator and
//! the description writer.

use super::listing::{CarIdentity, Severity};
use serde_json::{json, Map, Value};

/// Fields that must be filled before a price can be estimated, in report order
pub const REQUIRED_FOR_PRICING: [&str; 11] = [
    "brand",
    "model",
    "body_type",
    "color",
    "steering_wheel_position",
    "year",
    "engine_capacity",
    "transmission",
    "drive_type",
    "mileage",
    "damage_flag",
];

/// Defect counts by severity
///
/// The total is always derived, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefectCounts {
    pub weak: u32,
    pub moderate: u32,
    pub strong: u32,
}

impl DefectCounts {
    /// Count severities; `None` entries (unrecognized severity) are not counted
    pub fn tally<I>(severities: I) -> Self
    where
        I: IntoIterator<Item = Option<Severity>>,
    {
        severities
            .into_iter()
            .flatten()
            .fold(Self::default(), |mut counts, severity| {
                match severity {
                    Severity::Weak => counts.weak += 1,
                    Severity::Moderate => counts.moderate += 1,
                    Severity::Strong => counts.strong += 1,
                }
                counts
            })
    }

    pub fn total(&self) -> u32 {
        self.weak + self.moderate + self.strong
    }
}

/// Complete pricing input for one vehicle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRecord {
    pub brand: String,
    pub model: String,
    pub body_type: String,
    pub color: String,
    pub steering_wheel_position: String,
    pub year: Option<i32>,
    pub engine_capacity: Option<f64>,
    pub transmission: String,
    pub drive_type: String,
    pub mileage: Option<i64>,
    pub damage_flag: String,
    pub visual_condition_score: f64,
    pub inspection_reliability_score: f64,
    pub defects: DefectCounts,
}

impl FeatureRecord {
    /// Build from listing identity plus condition data; text fields are trimmed
    pub fn from_identity(
        identity: &CarIdentity,
        visual_condition_score: f64,
        inspection_reliability_score: f64,
        defects: DefectCounts,
    ) -> Self {
        Self {
            brand: identity.brand.trim().to_string(),
            model: identity.model.trim().to_string(),
            body_type: identity.body_type.trim().to_string(),
            color: identity.color.trim().to_string(),
            steering_wheel_position: identity.steering_wheel_position.trim().to_string(),
            year: identity.year,
            engine_capacity: identity.engine_capacity,
            transmission: identity.transmission.trim().to_string(),
            drive_type: identity.drive_type.trim().to_string(),
            mileage: identity.mileage,
            damage_flag: identity.damage_flag.trim().to_string(),
            visual_condition_score,
            inspection_reliability_score,
            defects,
        }
    }

    /// Total defect count, always the sum of the severity counts
    pub fn defects_cnt(&self) -> u32 {
        self.defects.total()
    }

    /// Names of required fields that are empty or invalid, in
    /// [`REQUIRED_FOR_PRICING`] order. Empty means the record can be priced.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        REQUIRED_FOR_PRICING
            .into_iter()
            .filter(|field| !self.field_is_valid(field))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    fn field_is_valid(&self, field: &str) -> bool {
        let filled = |s: &str| !s.trim().is_empty();
        match field {
            "brand" => filled(&self.brand),
            "model" => filled(&self.model),
            "body_type" => filled(&self.body_type),
            "color" => filled(&self.color),
            "steering_wheel_position" => {
                matches!(self.steering_wheel_position.trim(), "left" | "right")
            }
            "year" => self.year.is_some(),
            "engine_capacity" => self.engine_capacity.is_some_and(f64::is_finite),
            "transmission" => filled(&self.transmission),
            "drive_type" => filled(&self.drive_type),
            "mileage" => self.mileage.is_some(),
            "damage_flag" => filled(&self.damage_flag),
            _ => true,
        }
    }

    /// Record as a corpus-style row keyed by column name
    pub fn to_row(&self) -> Map<String, Value> {
        let row = json!({
            "brand": self.brand,
            "model": self.model,
            "body_type": self.body_type,
            "color": self.color,
            "steering_wheel_position": self.steering_wheel_position,
            "year": self.year,
            "engine_capacity": self.engine_capacity,
            "transmission": self.transmission,
            "drive_type": self.drive_type,
            "mileage": self.mileage,
            "damage_flag": self.damage_flag,
            "visual_condition_score": self.visual_condition_score,
            "inspection_reliability_score": self.inspection_reliability_score,
            "defects_cnt": self.defects_cnt(),
            "defects_severity_weak_cnt": self.defects.weak,
            "defects_severity_moderate_cnt": self.defects.moderate,
            "defects_severity_strong_cnt": self.defects.strong,
        });
        match row {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}
