//! Photo analysis endpoint
//!
//! Accepts a multipart upload with one or more `files` parts and runs the
//! full two-phase analysis on the usable images.

use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::models::AnalysisResponse;
use crate::AppState;

/// Multipart field carrying the photos
pub const FILES_FIELD: &str = "files";

/// Whether a part's declared content type is an image
pub fn is_image(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"))
}

/// POST /api/analyze
pub async fn analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<AnalysisResponse>> {
    let mut images = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("").to_string();
        if !is_image(field.content_type()) {
            info!(file_name = %file_name, content_type = ?field.content_type(), "Skipping non-image part");
            continue;
        }

        let bytes = field.bytes().await?;
        if bytes.is_empty() {
            continue;
        }
        if bytes.len() > state.limits.max_image_bytes {
            warn!(
                file_name = %file_name,
                size = bytes.len(),
                limit = state.limits.max_image_bytes,
                "Skipping oversized image"
            );
            continue;
        }
        images.push(bytes.to_vec());
    }

    if images.is_empty() {
        return Err(ApiError::BadRequest(
            "No usable images: upload at least one JPEG or PNG photo".to_string(),
        ));
    }

    info!(images = images.len(), "Analysis requested");
    Ok(Json(state.orchestrator.analyze(images).await))
}

/// Build analysis routes
pub fn analyze_routes() -> Router<AppState> {
    Router::new().route("/api/analyze", post(analyze))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_image() {
        assert!(is_image(Some("image/jpeg")));
        assert!(is_image(Some("Image/PNG")));
        assert!(!is_image(Some("application/pdf")));
        assert!(!is_image(None));
    }
}
