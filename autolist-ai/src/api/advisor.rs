//! Photo advice and generation lookup endpoints
//!
//! Both degrade to a usable answer instead of an error status.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use tracing::warn;

use crate::models::{
    GenerationsQuery, GenerationsResponse, PhotoRecommendations, PhotoRecommendationsBody,
};
use crate::AppState;

/// POST /api/photo-recommendations
pub async fn photo_recommendations(
    State(state): State<AppState>,
    Json(body): Json<PhotoRecommendationsBody>,
) -> Json<PhotoRecommendations> {
    if body.images_base64.is_empty() {
        return Json(PhotoRecommendations::no_photos());
    }

    match state
        .advisor
        .recommend(body.images_base64.into(), body.car_context)
        .await
    {
        Ok(recommendations) => Json(recommendations),
        Err(e) => {
            warn!(agent = state.advisor.name(), error = %e, "Photo recommendations failed");
            Json(PhotoRecommendations::fallback("Could not get recommendations."))
        }
    }
}

/// GET /api/generations?brand=&model=
pub async fn generations(
    State(state): State<AppState>,
    Query(query): Query<GenerationsQuery>,
) -> Json<GenerationsResponse> {
    let (brand, model) = (query.brand.trim(), query.model.trim());
    if brand.is_empty() || model.is_empty() {
        return Json(GenerationsResponse {
            generations: Vec::new(),
        });
    }

    let generations = state
        .catalog
        .generations(brand, model)
        .await
        .unwrap_or_else(|e| {
            warn!(brand, model, error = %e, "Generations lookup failed");
            Vec::new()
        });
    Json(GenerationsResponse { generations })
}

/// Build advisor routes
pub fn advisor_routes() -> Router<AppState> {
    Router::new()
        .route("/api/photo-recommendations", post(photo_recommendations))
        .route("/api/generations", get(generations))
}
