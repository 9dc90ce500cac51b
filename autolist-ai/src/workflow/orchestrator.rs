//! Analysis Orchestrator
//!
//! Runs the two-phase analysis of one photo set and the two follow-up
//! operations the listing editor calls after the user corrects fields.
//!
//! # Architecture
//! - **Phase 1**: visual inspection and classification, concurrently
//! - **Phase 2**: price estimation and description writing, concurrently,
//!   both fed by the joined phase-1 output
//! - **Resolution**: status and warnings from all four results
//!
//! # Error Handling
//! - An agent error is a value: the response still gets assembled and the
//!   status reports it
//! - A phase-1 task that cannot be joined ends the request with `error`
//! - A phase-2 task that cannot be joined degrades to an error-carrying
//!   price estimate and an empty description
//!
//! # Example
//! ```rust,ignore
//! let orchestrator = AnalysisOrchestrator::new(&agents, &config.pricing);
//! let response = orchestrator.analyze(vec![jpeg_bytes]).await;
//! ```

use super::assembler::{self, AssemblyInput};
use super::defects::count_listed_severities;
use super::resolver;
use crate::agents::AgentSet;
use crate::models::{
    AnalysisResponse, AnalysisStatus, CarIdentity, ConfidenceWarning, FeatureRecord,
    PriceEstimation, TechnicalAssumptions, VisualCondition, DAMAGE_DAMAGED, DAMAGE_NOT_DAMAGED,
};
use crate::pricing::{PriceEstimator, PriceOutcome, PricingError};
use crate::types::{
    AgentError, ClassificationReport, DescriptionRequest, DescriptionWriter, ImageSet,
    PerceptionReport, VehicleClassifier, VisualInspector,
};
use autolist_common::config::PricingConfig;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Inspection reliability assumed for a user-corrected listing
pub const RECALCULATION_RELIABILITY: f64 = 0.7;

/// Coordinates the agents and the price estimator for one service
#[derive(Clone)]
pub struct AnalysisOrchestrator {
    inspector: Arc<dyn VisualInspector>,
    classifier: Arc<dyn VehicleClassifier>,
    writer: Arc<dyn DescriptionWriter>,
    estimator: PriceEstimator,
}

impl AnalysisOrchestrator {
    pub fn new(agents: &AgentSet, pricing: &PricingConfig) -> Self {
        Self::from_parts(
            agents.inspector.clone(),
            agents.classifier.clone(),
            agents.writer.clone(),
            PriceEstimator::new(agents.text_generator.clone(), pricing),
        )
    }

    pub fn from_parts(
        inspector: Arc<dyn VisualInspector>,
        classifier: Arc<dyn VehicleClassifier>,
        writer: Arc<dyn DescriptionWriter>,
        estimator: PriceEstimator,
    ) -> Self {
        Self {
            inspector,
            classifier,
            writer,
            estimator,
        }
    }

    /// Analyze raw image bytes
    pub async fn analyze(&self, images: Vec<Vec<u8>>) -> AnalysisResponse {
        let encoded: ImageSet = images.iter().map(|bytes| STANDARD.encode(bytes)).collect();
        self.analyze_encoded(encoded).await
    }

    /// Analyze images that are already base64 encoded
    pub async fn analyze_encoded(&self, images: ImageSet) -> AnalysisResponse {
        let request_id = Uuid::new_v4();
        let span = info_span!("analysis", %request_id, images = images.len());
        self.run_analysis(images).instrument(span).await
    }

    async fn run_analysis(&self, images: ImageSet) -> AnalysisResponse {
        if images.is_empty() {
            info!("Analysis skipped: no images");
            return AnalysisResponse::early_exit(
                AnalysisStatus::NeedsUserInput,
                ConfidenceWarning::low("images", "Upload at least one photo of the car"),
            );
        }

        // ====================================================================
        // Phase 1: inspection and classification
        // ====================================================================

        let inspector = Arc::clone(&self.inspector);
        let inspect_images = Arc::clone(&images);
        let perception_task =
            tokio::spawn(async move { inspector.inspect(inspect_images).await }.in_current_span());

        let classifier = Arc::clone(&self.classifier);
        let classify_images = Arc::clone(&images);
        let classification_task = tokio::spawn(
            async move { classifier.classify(classify_images).await }.in_current_span(),
        );

        let (perception, classification) =
            match tokio::join!(perception_task, classification_task) {
                (Ok(perception), Ok(classification)) => (perception, classification),
                (Err(join_error), _) | (_, Err(join_error)) => {
                    error!(error = %join_error, "Phase 1 task failed");
                    return AnalysisResponse::early_exit(
                        AnalysisStatus::Error,
                        ConfidenceWarning::low(
                            "agents",
                            format!("Agent execution failed: {}", join_error),
                        ),
                    );
                }
            };

        self.log_agent_error(self.inspector.name(), &perception);
        self.log_agent_error(self.classifier.name(), &classification);

        let no_perception = PerceptionReport::default();
        let no_classification = ClassificationReport::default();
        let perception_report = perception.as_ref().unwrap_or(&no_perception);
        let classification_report = classification.as_ref().unwrap_or(&no_classification);

        let identity = assembler::car_identity(classification_report, perception_report);
        let visual_condition = assembler::visual_condition(perception_report);
        let record = assembler::feature_record(&identity, perception_report);
        let perception_raw = perception_report.raw.clone();

        // ====================================================================
        // Phase 2: price and description
        // ====================================================================

        let request = DescriptionRequest {
            images: Arc::clone(&images),
            identity: identity.clone(),
            perception: perception_raw.clone(),
            details: record.to_row(),
        };
        let writer = Arc::clone(&self.writer);
        let description_task =
            tokio::spawn(async move { writer.describe(request).await }.in_current_span());

        let estimator = self.estimator.clone();
        let price_task =
            tokio::spawn(async move { estimator.estimate(record).await }.in_current_span());

        let (price, description) = match tokio::join!(price_task, description_task) {
            (Ok(price), Ok(description)) => {
                let description = description.unwrap_or_else(|e| {
                    warn!(agent = self.writer.name(), error = %e, "Description failed");
                    String::new()
                });
                (price, description)
            }
            (Err(join_error), _) | (_, Err(join_error)) => {
                error!(error = %join_error, "Phase 2 task failed");
                (
                    PriceOutcome::Failed(PricingError::Scheduling(join_error.to_string())),
                    String::new(),
                )
            }
        };

        let resolution = resolver::resolve(&perception, &classification, &price);
        let response = assembler::assemble(AssemblyInput {
            identity,
            visual_condition,
            price,
            description,
            resolution,
            perception_raw,
        });

        info!(
            status = %response.status,
            warnings = response.confidence_warnings.len(),
            suggested_price = ?response.price_estimation.suggested_price,
            "Analysis complete"
        );
        response
    }

    fn log_agent_error<T>(&self, agent: &str, result: &Result<T, AgentError>) {
        if let Err(e) = result {
            warn!(agent, error = %e, "Agent failed");
        }
    }

    /// Re-price a listing after the user edited it
    ///
    /// Confirmed accident signs override the damage flag; an empty flag
    /// means the user saw no damage.
    pub async fn recalculate_price(
        &self,
        mut identity: CarIdentity,
        visual_condition: VisualCondition,
        technical: TechnicalAssumptions,
    ) -> PriceEstimation {
        identity.damage_flag = if technical.accident_signs {
            DAMAGE_DAMAGED.to_string()
        } else {
            match identity.damage_flag.trim() {
                "" => DAMAGE_NOT_DAMAGED.to_string(),
                flag => flag.to_string(),
            }
        };

        let record = FeatureRecord::from_identity(
            &identity,
            visual_condition.overall_score,
            RECALCULATION_RELIABILITY,
            count_listed_severities(&visual_condition.defects),
        );
        self.estimator.estimate(record).await.into()
    }

    /// Rewrite the listing text from user-corrected fields
    ///
    /// `extra_params` override anything derived from the identity.
    pub async fn regenerate_description(
        &self,
        images: Vec<String>,
        identity: CarIdentity,
        vision_result: Value,
        extra_params: Map<String, Value>,
    ) -> Result<String, AgentError> {
        let details = description_details(&identity, extra_params);
        let perception = match vision_result {
            Value::Object(_) => vision_result,
            _ => Value::Object(Map::new()),
        };
        self.writer
            .describe(DescriptionRequest {
                images: images.into(),
                identity,
                perception,
                details,
            })
            .await
    }
}

fn description_details(identity: &CarIdentity, extra_params: Map<String, Value>) -> Map<String, Value> {
    let mut details = Map::new();
    details.insert("brand".to_string(), Value::from(identity.brand.as_str()));
    details.insert("model".to_string(), Value::from(identity.model.as_str()));
    details.insert("body_type".to_string(), Value::from(identity.body_type.as_str()));
    details.insert("color".to_string(), Value::from(identity.color.as_str()));
    details.insert(
        "year".to_string(),
        identity.year.map(Value::from).unwrap_or(Value::Null),
    );
    details.insert(
        "mileage".to_string(),
        identity.mileage.map(Value::from).unwrap_or(Value::Null),
    );
    details.extend(extra_params);
    details
}
