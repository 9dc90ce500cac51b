//! Photo augmentation endpoint
//!
//! Multipart upload with one `file` part (the photo) and a `prompt` text
//! part. Screening and edit failures come back as an unsuccessful
//! [`AugmentationResult`], not as an error status.

use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use tracing::info;

use super::analyze::is_image;
use crate::error::{ApiError, ApiResult};
use crate::models::AugmentationResult;
use crate::AppState;

/// Multipart field carrying the photo
pub const FILE_FIELD: &str = "file";
/// Multipart field carrying the edit instruction
pub const PROMPT_FIELD: &str = "prompt";

/// POST /api/augment-image
pub async fn augment_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<AugmentationResult>> {
    let mut image = None;
    let mut prompt = String::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(FILE_FIELD) => {
                if !is_image(field.content_type()) {
                    return Err(ApiError::BadRequest("Expected an image file".to_string()));
                }
                let bytes = field.bytes().await?;
                if bytes.len() > state.limits.max_image_bytes {
                    return Err(ApiError::BadRequest("Image too large".to_string()));
                }
                image = Some(bytes.to_vec());
            }
            Some(PROMPT_FIELD) => prompt = field.text().await?,
            _ => continue,
        }
    }

    let Some(bytes) = image.filter(|bytes| !bytes.is_empty()) else {
        return Err(ApiError::BadRequest("Missing image file".to_string()));
    };

    info!(size = bytes.len(), "Photo augmentation requested");
    Ok(Json(state.augmenter.augment(bytes, &prompt).await))
}

/// Build augmentation routes
pub fn augment_routes() -> Router<AppState> {
    Router::new().route("/api/augment-image", post(augment_image))
}
