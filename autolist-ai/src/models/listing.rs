//! Canonical listing contract
//!
//! Every analysis endpoint returns JSON of exactly this shape, whatever the
//! individual agents managed to produce. Field names are part of the public
//! API consumed by the listing editor front-end.

use super::lenient;
use crate::workflow::defects::{normalize_defect_type, severity_from_label};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Damage flag value for a car with accident damage
pub const DAMAGE_DAMAGED: &str = "битый";
/// Damage flag value for an undamaged car
pub const DAMAGE_NOT_DAMAGED: &str = "не битый";
/// Damage flag value when photos do not allow a conclusion
pub const DAMAGE_UNDETERMINED: &str = "не определено";

/// Vehicle identity as shown (and edited) in the listing form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarIdentity {
    #[serde(deserialize_with = "lenient::string")]
    pub brand: String,
    #[serde(deserialize_with = "lenient::string")]
    pub model: String,
    #[serde(deserialize_with = "lenient::string")]
    pub generation: String,
    #[serde(deserialize_with = "lenient::opt_i32")]
    pub year: Option<i32>,
    #[serde(deserialize_with = "lenient::string")]
    pub body_type: String,
    #[serde(deserialize_with = "lenient::string")]
    pub color: String,
    /// "left" or "right"
    #[serde(deserialize_with = "lenient::string")]
    pub steering_wheel_position: String,
    /// Engine displacement in litres
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub engine_capacity: Option<f64>,
    #[serde(deserialize_with = "lenient::string")]
    pub transmission: String,
    #[serde(deserialize_with = "lenient::string")]
    pub drive_type: String,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub mileage: Option<i64>,
    /// One of [`DAMAGE_DAMAGED`], [`DAMAGE_NOT_DAMAGED`], [`DAMAGE_UNDETERMINED`]
    #[serde(deserialize_with = "lenient::string")]
    pub damage_flag: String,
}

/// Defect category in the listing contract
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum DefectType {
    #[default]
    Scratch,
    Dent,
    Chip,
    Corrosion,
    Replaced,
    Painted,
}

impl DefectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefectType::Scratch => "scratch",
            DefectType::Dent => "dent",
            DefectType::Chip => "chip",
            DefectType::Corrosion => "corrosion",
            DefectType::Replaced => "replaced",
            DefectType::Painted => "painted",
        }
    }
}

impl From<String> for DefectType {
    fn from(label: String) -> Self {
        normalize_defect_type(&label)
    }
}

/// Defect severity in the listing contract
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Severity {
    #[default]
    Weak,
    Moderate,
    Strong,
}

impl From<String> for Severity {
    fn from(label: String) -> Self {
        severity_from_label(&label).unwrap_or_default()
    }
}

/// A single visible defect
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefectItem {
    #[serde(rename = "type")]
    pub defect_type: DefectType,
    pub severity: Severity,
    #[serde(deserialize_with = "lenient::string")]
    pub location: String,
    /// Body diagram key (hood, front_door_left, rear_bumper, ...)
    #[serde(deserialize_with = "lenient::string")]
    pub body_part: String,
}

/// Overall visual condition with the defect list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualCondition {
    /// 0.0-1.0
    #[serde(deserialize_with = "lenient::f64_or_zero")]
    pub overall_score: f64,
    pub defects: Vec<DefectItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalAssumptions {
    pub accident_signs: bool,
    #[serde(deserialize_with = "lenient::f64_or_zero")]
    pub repaint_probability: f64,
}

/// Price range as returned to the client
///
/// `suggested_price` is set only when the estimate succeeded; otherwise
/// `missing_fields` or `error_message` explains why not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceEstimation {
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub suggested_price: Option<i64>,
    /// Mean absolute error of the throwaway model; range is price ± MAE
    pub mae: Option<f64>,
    pub missing_fields: Vec<String>,
    pub error_message: Option<String>,
    /// Synthetic rows the model was trained on, for display
    pub generated_rows: Option<Vec<Map<String, Value>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl FromStr for ConfidenceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(ConfidenceLevel::High),
            "medium" => Ok(ConfidenceLevel::Medium),
            "low" => Ok(ConfidenceLevel::Low),
            other => Err(format!("unknown confidence level: {}", other)),
        }
    }
}

/// Advisory note about a field the client should double-check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceWarning {
    pub field: String,
    pub confidence: ConfidenceLevel,
    pub reason: String,
}

impl ConfidenceWarning {
    pub fn low(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            confidence: ConfidenceLevel::Low,
            reason: reason.into(),
        }
    }

    pub fn medium(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            confidence: ConfidenceLevel::Medium,
            reason: reason.into(),
        }
    }
}

/// Overall analysis status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    #[default]
    Ok,
    NeedsUserInput,
    Error,
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AnalysisStatus::Ok => "ok",
            AnalysisStatus::NeedsUserInput => "needs_user_input",
            AnalysisStatus::Error => "error",
        };
        f.write_str(label)
    }
}

/// Full result of `POST /api/analyze`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisResponse {
    pub car_identity: CarIdentity,
    pub visual_condition: VisualCondition,
    pub technical_assumptions: TechnicalAssumptions,
    pub price_estimation: PriceEstimation,
    pub generated_description: String,
    pub confidence_warnings: Vec<ConfidenceWarning>,
    pub status: AnalysisStatus,
    /// Raw perception output, echoed back on description regeneration
    pub vision_result: Value,
}

impl Default for AnalysisResponse {
    fn default() -> Self {
        Self {
            car_identity: CarIdentity::default(),
            visual_condition: VisualCondition::default(),
            technical_assumptions: TechnicalAssumptions::default(),
            price_estimation: PriceEstimation::default(),
            generated_description: String::new(),
            confidence_warnings: Vec::new(),
            status: AnalysisStatus::Ok,
            vision_result: Value::Object(Map::new()),
        }
    }
}

impl AnalysisResponse {
    /// Response carrying only a status and one explanatory warning
    pub fn early_exit(status: AnalysisStatus, warning: ConfidenceWarning) -> Self {
        Self {
            status,
            confidence_warnings: vec![warning],
            ..Self::default()
        }
    }
}

/// Body of `POST /api/recalculate-price`
#[derive(Debug, Clone, Deserialize)]
pub struct RecalculatePriceBody {
    pub car_identity: CarIdentity,
    pub visual_condition: VisualCondition,
    pub technical_assumptions: TechnicalAssumptions,
}

/// Body of `POST /api/regenerate-description`
#[derive(Debug, Clone, Deserialize)]
pub struct RegenerateDescriptionBody {
    pub car_identity: CarIdentity,
    #[serde(default)]
    pub vision_result: Value,
    #[serde(default)]
    pub extra_params: Map<String, Value>,
    #[serde(default)]
    pub images_base64: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegenerateDescriptionResponse {
    pub generated_description: String,
}

/// Body of `POST /api/photo-recommendations`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PhotoRecommendationsBody {
    pub images_base64: Vec<String>,
    /// Short context for the prompt, e.g. "Toyota Camry"
    pub car_context: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoVerdict {
    AllOk,
    #[default]
    HasRecommendations,
}

impl FromStr for PhotoVerdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all_ok" => Ok(PhotoVerdict::AllOk),
            "has_recommendations" => Ok(PhotoVerdict::HasRecommendations),
            other => Err(format!("unknown verdict: {}", other)),
        }
    }
}

/// Photo quality critique and missing-shot list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoRecommendations {
    pub verdict: PhotoVerdict,
    pub quality_issues: Vec<String>,
    pub recommendations: Vec<String>,
    pub missing_photo_types: Vec<String>,
    pub summary: String,
}

impl PhotoRecommendations {
    /// Answer given when there is nothing to look at or the critique failed
    pub fn fallback(summary: impl Into<String>) -> Self {
        Self {
            verdict: PhotoVerdict::HasRecommendations,
            summary: summary.into(),
            ..Self::default()
        }
    }

    /// Canned answer for an empty photo set
    pub fn no_photos() -> Self {
        Self {
            verdict: PhotoVerdict::HasRecommendations,
            quality_issues: Vec::new(),
            recommendations: vec!["Add at least one photo of the car.".to_string()],
            missing_photo_types: vec!["Any photo of the car".to_string()],
            summary: "No photos uploaded.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenerationsQuery {
    pub brand: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationsResponse {
    pub generations: Vec<String>,
}

/// Kind of photo edit a request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AugmentMode {
    /// Sharpness, exposure and contrast only
    Improve,
    /// Add exactly one physically plausible object
    Augment,
}

impl FromStr for AugmentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "improve" => Ok(AugmentMode::Improve),
            "augment" => Ok(AugmentMode::Augment),
            other => Err(format!("unknown mode: {}", other)),
        }
    }
}

/// Reply of `POST /api/augment-image`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentationResult {
    pub success: bool,
    pub image_base64: Option<String>,
    pub error: Option<String>,
    pub mode: Option<AugmentMode>,
}

impl AugmentationResult {
    pub fn edited(image_base64: String, mode: AugmentMode) -> Self {
        Self {
            success: true,
            image_base64: Some(image_base64),
            error: None,
            mode: Some(mode),
        }
    }

    pub fn rejected(error: impl Into<String>, mode: Option<AugmentMode>) -> Self {
        Self {
            success: false,
            image_base64: None,
            error: Some(error.into()),
            mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identity_accepts_form_strings() {
        let identity: CarIdentity = serde_json::from_value(json!({
            "brand": "Toyota",
            "model": "Camry",
            "year": "2018",
            "engine_capacity": "2,5",
            "mileage": null,
            "color": null,
        }))
        .unwrap();

        assert_eq!(identity.year, Some(2018));
        assert_eq!(identity.engine_capacity, Some(2.5));
        assert_eq!(identity.mileage, None);
        assert_eq!(identity.color, "");
    }

    #[test]
    fn test_defect_item_normalizes_labels() {
        let item: DefectItem = serde_json::from_value(json!({
            "type": "Вмятина на двери",
            "severity": "умеренная",
            "location": "left side",
        }))
        .unwrap();

        assert_eq!(item.defect_type, DefectType::Dent);
        assert_eq!(item.severity, Severity::Moderate);
        assert_eq!(item.body_part, "");

        let out = serde_json::to_value(&item).unwrap();
        assert_eq!(out["type"], "dent");
        assert_eq!(out["severity"], "moderate");
    }

    #[test]
    fn test_default_response_shape() {
        let value = serde_json::to_value(AnalysisResponse::default()).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["vision_result"], json!({}));
        assert_eq!(value["price_estimation"]["missing_fields"], json!([]));
        assert!(value["price_estimation"]["suggested_price"].is_null());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_value(AnalysisStatus::NeedsUserInput).unwrap(),
            json!("needs_user_input")
        );
        assert_eq!(AnalysisStatus::Error.to_string(), "error");
    }
}
