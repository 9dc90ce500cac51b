//! Listing editor endpoints
//!
//! Follow-up operations after the user has corrected the analyzed fields.

use axum::{extract::State, routing::post, Json, Router};

use crate::error::ApiResult;
use crate::models::{
    PriceEstimation, RecalculatePriceBody, RegenerateDescriptionBody,
    RegenerateDescriptionResponse,
};
use crate::AppState;

/// POST /api/recalculate-price
///
/// Missing fields and pricing failures are reported in the body, never as
/// an HTTP error.
pub async fn recalculate_price(
    State(state): State<AppState>,
    Json(body): Json<RecalculatePriceBody>,
) -> Json<PriceEstimation> {
    Json(
        state
            .orchestrator
            .recalculate_price(
                body.car_identity,
                body.visual_condition,
                body.technical_assumptions,
            )
            .await,
    )
}

/// POST /api/regenerate-description
pub async fn regenerate_description(
    State(state): State<AppState>,
    Json(body): Json<RegenerateDescriptionBody>,
) -> ApiResult<Json<RegenerateDescriptionResponse>> {
    let generated_description = state
        .orchestrator
        .regenerate_description(
            body.images_base64,
            body.car_identity,
            body.vision_result,
            body.extra_params,
        )
        .await?;
    Ok(Json(RegenerateDescriptionResponse {
        generated_description,
    }))
}

/// Build listing editor routes
pub fn listing_routes() -> Router<AppState> {
    Router::new()
        .route("/api/recalculate-price", post(recalculate_price))
        .route("/api/regenerate-description", post(regenerate_description))
}
