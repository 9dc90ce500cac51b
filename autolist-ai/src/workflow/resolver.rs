//! Status and confidence resolution
//!
//! Pure functions over the joined agent outputs. Status precedence, first
//! match wins:
//! 1. `error` - either phase-1 agent failed
//! 2. `needs_user_input` - the photos were rejected, classification gave up,
//!    or neither brand nor model is known
//! 3. `ok`
//!
//! Warnings are computed independently of the status and never fail.

use crate::models::{AnalysisStatus, ConfidenceLevel, ConfidenceWarning};
use crate::pricing::PriceOutcome;
use crate::types::{AgentError, ClassificationReport, ClassificationStatus, PerceptionReport};

/// Phrases in the perception summary that mean the photos cannot be analyzed
pub const REJECTION_PHRASES: [&str; 3] = [
    "анализ невозможен",
    "не содержит автомобиль",
    "не соответствует задаче",
];

/// Inspection reliability below this earns a visibility warning
pub const LOW_RELIABILITY_THRESHOLD: f64 = 0.6;

/// Overall status plus advisory warnings
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub status: AnalysisStatus,
    pub warnings: Vec<ConfidenceWarning>,
}

pub fn resolve(
    perception: &Result<PerceptionReport, AgentError>,
    classification: &Result<ClassificationReport, AgentError>,
    price: &PriceOutcome,
) -> Resolution {
    let no_perception = PerceptionReport::default();
    let no_classification = ClassificationReport::default();

    Resolution {
        status: decide_status(perception, classification),
        warnings: confidence_warnings(
            perception.as_ref().unwrap_or(&no_perception),
            classification.as_ref().unwrap_or(&no_classification),
            price,
        ),
    }
}

pub fn decide_status(
    perception: &Result<PerceptionReport, AgentError>,
    classification: &Result<ClassificationReport, AgentError>,
) -> AnalysisStatus {
    let (perception, classification) = match (perception, classification) {
        (Ok(p), Ok(c)) => (p, c),
        _ => return AnalysisStatus::Error,
    };

    if is_rejected(&perception.raw_text_description) {
        return AnalysisStatus::NeedsUserInput;
    }
    if classification.status == Some(ClassificationStatus::Failed)
        && classification.failure_reason.is_some()
    {
        return AnalysisStatus::NeedsUserInput;
    }
    if classification.brand.trim().is_empty() && classification.model.trim().is_empty() {
        return AnalysisStatus::NeedsUserInput;
    }
    AnalysisStatus::Ok
}

/// Whether a perception summary contains a rejection phrase
pub fn is_rejected(summary: &str) -> bool {
    let summary = summary.to_lowercase();
    REJECTION_PHRASES
        .iter()
        .any(|phrase| summary.contains(phrase))
}

pub fn confidence_warnings(
    perception: &PerceptionReport,
    classification: &ClassificationReport,
    price: &PriceOutcome,
) -> Vec<ConfidenceWarning> {
    let mut warnings = Vec::new();

    let confidence = &classification.classification_confidence;
    if confidence.category == Some(ConfidenceLevel::Low)
        || confidence.subcategory == Some(ConfidenceLevel::Low)
    {
        warnings.push(ConfidenceWarning::low(
            "model",
            "Low confidence in visual classification",
        ));
    }

    if classification.brand.trim().is_empty() || classification.model.trim().is_empty() {
        warnings.push(ConfidenceWarning::low(
            "model",
            "Brand or model could not be determined from the photos",
        ));
    }

    if perception
        .inspection_reliability_score
        .is_some_and(|score| score < LOW_RELIABILITY_THRESHOLD)
    {
        warnings.push(ConfidenceWarning::medium(
            "visual_condition",
            "Limited visibility in the photos",
        ));
    }

    if price.is_unresolved() {
        warnings.push(ConfidenceWarning::low(
            "price_estimation",
            "Not enough data to estimate the price",
        ));
    }

    warnings
}
