//! Canonical response assembly
//!
//! Maps agent reports onto the listing contract. Fields no agent can see in
//! a photo (year, engine, mileage, drive type, generation) stay empty for
//! the user to fill in.

use super::defects::{count_raw_severities, map_defects};
use super::resolver::Resolution;
use crate::models::{
    AnalysisResponse, CarIdentity, FeatureRecord, TechnicalAssumptions, VisualCondition,
    DAMAGE_DAMAGED, DAMAGE_UNDETERMINED,
};
use crate::pricing::PriceOutcome;
use crate::types::{ClassificationReport, PerceptionReport};
use serde_json::Value;

/// Inspection reliability assumed when the perception agent gave none
pub const DEFAULT_INSPECTION_RELIABILITY: f64 = 0.5;

pub fn car_identity(
    classification: &ClassificationReport,
    perception: &PerceptionReport,
) -> CarIdentity {
    let damage_flag = match perception.damage_flag.trim() {
        "" => DAMAGE_UNDETERMINED.to_string(),
        flag => flag.to_string(),
    };
    CarIdentity {
        brand: classification.brand.trim().to_string(),
        model: classification.model.trim().to_string(),
        body_type: classification.body_type.trim().to_string(),
        color: classification.color.trim().to_string(),
        steering_wheel_position: classification.steering_wheel_position.trim().to_string(),
        transmission: classification.transmission.trim().to_string(),
        damage_flag,
        ..CarIdentity::default()
    }
}

pub fn visual_condition(perception: &PerceptionReport) -> VisualCondition {
    VisualCondition {
        overall_score: perception.visual_condition_score.unwrap_or(0.0),
        defects: map_defects(&perception.defects),
    }
}

pub fn technical_assumptions(identity: &CarIdentity) -> TechnicalAssumptions {
    TechnicalAssumptions {
        accident_signs: identity.damage_flag.trim().to_lowercase() == DAMAGE_DAMAGED,
        repaint_probability: 0.0,
    }
}

/// Pricing input derived from phase-1 output
pub fn feature_record(identity: &CarIdentity, perception: &PerceptionReport) -> FeatureRecord {
    FeatureRecord::from_identity(
        identity,
        perception.visual_condition_score.unwrap_or(0.0),
        perception
            .inspection_reliability_score
            .unwrap_or(DEFAULT_INSPECTION_RELIABILITY),
        count_raw_severities(&perception.defects),
    )
}

/// Everything the assembler needs after both phases
pub struct AssemblyInput {
    pub identity: CarIdentity,
    pub visual_condition: VisualCondition,
    pub price: PriceOutcome,
    pub description: String,
    pub resolution: Resolution,
    pub perception_raw: Value,
}

pub fn assemble(input: AssemblyInput) -> AnalysisResponse {
    let technical_assumptions = technical_assumptions(&input.identity);
    let vision_result = match input.perception_raw {
        Value::Object(_) => input.perception_raw,
        _ => Value::Object(Default::default()),
    };
    AnalysisResponse {
        car_identity: input.identity,
        visual_condition: input.visual_condition,
        technical_assumptions,
        price_estimation: input.price.into(),
        generated_description: input.description,
        confidence_warnings: input.resolution.warnings,
        status: input.resolution.status,
        vision_result,
    }
}
