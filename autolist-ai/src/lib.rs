//! autolist-ai library interface
//!
//! Vehicle-photo analysis: concurrent AI agents describe the car, a
//! per-request gradient-boosted model prices it.

pub mod agents;
pub mod api;
pub mod error;
pub mod models;
pub mod pricing;
pub mod types;
pub mod workflow;

pub use crate::error::{ApiError, ApiResult};

use agents::{AgentSet, ImageAugmenter};
use autolist_common::config::{LimitsConfig, TomlConfig};
use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use types::{GenerationCatalog, PhotoAdvisor};
use workflow::AnalysisOrchestrator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AnalysisOrchestrator>,
    pub advisor: Arc<dyn PhotoAdvisor>,
    pub catalog: Arc<dyn GenerationCatalog>,
    pub augmenter: Arc<ImageAugmenter>,
    pub limits: LimitsConfig,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(agents: &AgentSet, config: &TomlConfig) -> Self {
        Self::from_parts(
            AnalysisOrchestrator::new(agents, &config.pricing),
            agents.advisor.clone(),
            agents.catalog.clone(),
            ImageAugmenter::new(agents.text_generator.clone(), agents.image_editor.clone()),
            config.limits.clone(),
        )
    }

    pub fn from_parts(
        orchestrator: AnalysisOrchestrator,
        advisor: Arc<dyn PhotoAdvisor>,
        catalog: Arc<dyn GenerationCatalog>,
        augmenter: ImageAugmenter,
        limits: LimitsConfig,
    ) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            advisor,
            catalog,
            augmenter: Arc::new(augmenter),
            limits,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.limits.max_request_bytes;

    Router::new()
        .merge(api::health_routes())
        .merge(api::analyze_routes())
        .merge(api::listing_routes())
        .merge(api::advisor_routes())
        .merge(api::augment_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
