//! Data models for autolist-ai
//!
//! - Listing contract returned to the client
//! - Pricing feature record
//! - Lenient deserializers for model output and form input

pub mod feature_record;
pub mod lenient;
pub mod listing;

pub use feature_record::{DefectCounts, FeatureRecord, REQUIRED_FOR_PRICING};
pub use listing::{
    AnalysisResponse, AnalysisStatus, AugmentMode, AugmentationResult, CarIdentity, ConfidenceLevel, ConfidenceWarning,
    DefectItem, DefectType, GenerationsQuery, GenerationsResponse, PhotoRecommendations,
    PhotoRecommendationsBody, PhotoVerdict, PriceEstimation, RecalculatePriceBody,
    RegenerateDescriptionBody, RegenerateDescriptionResponse, Severity, TechnicalAssumptions,
    VisualCondition, DAMAGE_DAMAGED, DAMAGE_NOT_DAMAGED, DAMAGE_UNDETERMINED,
};
