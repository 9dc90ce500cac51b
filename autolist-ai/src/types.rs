//! Core types and trait definitions for autolist-ai
//!
//! Every remote capability the pipeline depends on sits behind one of the
//! async traits below:
//! - **Phase 1:** [`VisualInspector`], [`VehicleClassifier`]
//! - **Phase 2:** [`DescriptionWriter`], [`TextGenerator`] (synthetic corpus)
//! - **Auxiliary endpoints:** [`PhotoAdvisor`], [`GenerationCatalog`], [`ImageEditor`]
//!
//! Production implementations live in [`crate::agents`]; tests substitute
//! doubles. Failures are values (`Result<_, AgentError>`), never panics.

use crate::models::lenient;
use crate::models::{CarIdentity, ConfidenceLevel, PhotoRecommendations};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// Common Types
// ============================================================================

/// Immutable base64 snapshot of the uploaded images, shared across tasks
pub type ImageSet = Arc<[String]>;

/// Remote capability failure
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AgentError {
    /// Transport failure (connect, timeout, body read)
    #[error("Network error: {0}")]
    Network(String),

    /// Endpoint answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response could not be understood
    #[error("Parse error: {0}")]
    Parse(String),

    /// No credentials configured
    #[error("Agent not configured: {0}")]
    NotConfigured(String),
}

// ============================================================================
// Phase 1: Perception and Classification
// ============================================================================

/// Defect as described by the perception agent, before normalization
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawDefect {
    #[serde(rename = "type", deserialize_with = "lenient::string")]
    pub defect_type: String,
    #[serde(deserialize_with = "lenient::string")]
    pub severity: String,
    #[serde(deserialize_with = "lenient::string")]
    pub location: String,
    #[serde(deserialize_with = "lenient::string")]
    pub body_part: String,
}

/// Visual inspection output
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PerceptionReport {
    /// Overall condition, 0.0-1.0
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub visual_condition_score: Option<f64>,
    /// How much of the car the photos actually show, 0.0-1.0
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub inspection_reliability_score: Option<f64>,
    #[serde(deserialize_with = "lenient::string")]
    pub damage_flag: String,
    /// Non-object entries are dropped
    #[serde(deserialize_with = "lenient::objects")]
    pub defects: Vec<RawDefect>,
    /// Free-text summary; carries the rejection phrases
    #[serde(deserialize_with = "lenient::string")]
    pub raw_text_description: String,
    /// Agent output exactly as received
    #[serde(skip)]
    pub raw: Value,
}

impl PerceptionReport {
    /// Interpret a parsed JSON object, keeping the original alongside
    pub fn from_value(value: Value) -> Result<Self, AgentError> {
        if !value.is_object() {
            return Err(AgentError::Parse(
                "perception result is not a JSON object".to_string(),
            ));
        }
        let mut report: Self = serde_json::from_value(value.clone())
            .map_err(|e| AgentError::Parse(format!("perception result: {}", e)))?;
        report.raw = value;
        Ok(report)
    }
}

/// Outcome reported by the classification agent itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationStatus {
    Success,
    Failed,
}

impl FromStr for ClassificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "success" | "ok" => Ok(ClassificationStatus::Success),
            "failed" | "failure" => Ok(ClassificationStatus::Failed),
            other => Err(format!("unknown classification status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClassificationConfidence {
    #[serde(deserialize_with = "lenient::opt_from_str")]
    pub category: Option<ConfidenceLevel>,
    #[serde(deserialize_with = "lenient::opt_from_str")]
    pub subcategory: Option<ConfidenceLevel>,
}

/// Vehicle classification output
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClassificationReport {
    #[serde(deserialize_with = "lenient::string")]
    pub brand: String,
    #[serde(deserialize_with = "lenient::string")]
    pub model: String,
    #[serde(deserialize_with = "lenient::string")]
    pub body_type: String,
    #[serde(deserialize_with = "lenient::string")]
    pub color: String,
    #[serde(deserialize_with = "lenient::string")]
    pub steering_wheel_position: String,
    #[serde(deserialize_with = "lenient::string")]
    pub transmission: String,
    #[serde(deserialize_with = "lenient::opt_from_str")]
    pub status: Option<ClassificationStatus>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub failure_reason: Option<String>,
    #[serde(deserialize_with = "lenient::object_or_default")]
    pub classification_confidence: ClassificationConfidence,
}

/// Remote visual inspection of the car's condition
///
/// # Example
/// ```rust,ignore
/// use autolist_ai::types::{AgentError, ImageSet, PerceptionReport, VisualInspector};
///
/// struct CleanCar;
///
/// #[async_trait::async_trait]
/// impl VisualInspector for CleanCar {
///     fn name(&self) -> &'static str { "CleanCar" }
///
///     async fn inspect(&self, _images: ImageSet) -> Result<PerceptionReport, AgentError> {
///         PerceptionReport::from_value(serde_json::json!({
///             "visual_condition_score": 0.9,
///             "damage_flag": "не битый",
///         }))
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait VisualInspector: Send + Sync {
    fn name(&self) -> &'static str;

    async fn inspect(&self, images: ImageSet) -> Result<PerceptionReport, AgentError>;
}

/// Remote brand/model/body classification
#[async_trait::async_trait]
pub trait VehicleClassifier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn classify(&self, images: ImageSet) -> Result<ClassificationReport, AgentError>;
}

// ============================================================================
// Phase 2: Description and Synthetic Data
// ============================================================================

/// Everything the description writer sees
#[derive(Debug, Clone)]
pub struct DescriptionRequest {
    pub images: ImageSet,
    pub identity: CarIdentity,
    /// Raw perception output
    pub perception: Value,
    /// Listing details keyed by field name (feature row plus user edits)
    pub details: Map<String, Value>,
}

/// Remote listing-text generation
#[async_trait::async_trait]
pub trait DescriptionWriter: Send + Sync {
    fn name(&self) -> &'static str;

    async fn describe(&self, request: DescriptionRequest) -> Result<String, AgentError>;
}

/// Single text completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    /// `None` leaves sampling to the endpoint default
    pub temperature: Option<f32>,
    pub max_tokens: u32,
}

/// Plain-text generative service used for the synthetic corpus
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn complete(&self, request: CompletionRequest) -> Result<String, AgentError>;
}

// ============================================================================
// Auxiliary Capabilities
// ============================================================================

/// Photo set critique
#[async_trait::async_trait]
pub trait PhotoAdvisor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn recommend(
        &self,
        images: ImageSet,
        car_context: Option<String>,
    ) -> Result<PhotoRecommendations, AgentError>;
}

/// Generation (model years / facelift) lookup for a brand and model
#[async_trait::async_trait]
pub trait GenerationCatalog: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generations(&self, brand: &str, model: &str) -> Result<Vec<String>, AgentError>;
}

/// One photo plus the edit instructions for it
#[derive(Debug, Clone, PartialEq)]
pub struct ImageEditRequest {
    pub image: Vec<u8>,
    /// Declared MIME type of `image`
    pub content_type: String,
    pub prompt: String,
}

/// Image-to-image editing; returns the edited photo as base64
#[async_trait::async_trait]
pub trait ImageEditor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn edit(&self, request: ImageEditRequest) -> Result<String, AgentError>;
}
