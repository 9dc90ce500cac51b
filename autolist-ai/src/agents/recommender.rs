//! Photo advisor agent
//!
//! Critiques photo quality and lists the shots a complete listing still needs.

use super::json_text::extract_json_object;
use super::openai_client::{prompt_with_images, OpenAiClient};
use crate::models::lenient;
use crate::models::{PhotoRecommendations, PhotoVerdict};
use crate::types::{AgentError, ImageSet, PhotoAdvisor};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const MAX_TOKENS: u32 = 2048;

const ADVISOR_PROMPT: &str = r#"You are an expert in photographing cars for classified listings (Drom, Avito).

For the photos of ONE car, assess:
1. Photo quality: blur, lighting (too dark, overexposed), resolution, reflections on body or glass, objects blocking the view.
2. Angles: which shots work and which angles should be retaken (front, side, rear, interior, dashboard, odometer, VIN plate, engine bay, trunk, wheels).
3. Missing shots for a complete listing. Usually useful: front, side and rear views, front and rear seats, dashboard and odometer, VIN plate, engine bay, trunk, wheels.

Rules:
- If the photos are good and complete, say there is nothing to improve.
- Be specific: not "add interior photos" but "add a photo of the front seats and steering wheel".
- Do not invent defects of the car; judge only the photos.

Return STRICTLY one JSON object, with no text before or after it. Write all strings in Russian:
{
  "verdict": "all_ok" | "has_recommendations",
  "quality_issues": ["..."],
  "recommendations": ["..."],
  "missing_photo_types": ["..."],
  "summary": "one short sentence"
}
Use empty arrays where there is nothing to report."#;

/// Loosely typed advisor reply
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AdvisorReply {
    #[serde(deserialize_with = "lenient::opt_from_str")]
    verdict: Option<PhotoVerdict>,
    #[serde(deserialize_with = "lenient::strings")]
    quality_issues: Vec<String>,
    #[serde(deserialize_with = "lenient::strings")]
    recommendations: Vec<String>,
    #[serde(deserialize_with = "lenient::strings")]
    missing_photo_types: Vec<String>,
    #[serde(deserialize_with = "lenient::string")]
    summary: String,
}

impl From<AdvisorReply> for PhotoRecommendations {
    fn from(reply: AdvisorReply) -> Self {
        let summary = if reply.summary.is_empty() {
            "Analysis complete.".to_string()
        } else {
            reply.summary
        };
        Self {
            verdict: reply.verdict.unwrap_or_default(),
            quality_issues: reply.quality_issues,
            recommendations: reply.recommendations,
            missing_photo_types: reply.missing_photo_types,
            summary,
        }
    }
}

/// Interpret the advisor's JSON object
pub fn parse_reply(value: Value) -> Result<PhotoRecommendations, AgentError> {
    serde_json::from_value::<AdvisorReply>(value)
        .map(PhotoRecommendations::from)
        .map_err(|e| AgentError::Parse(format!("photo recommendations: {}", e)))
}

pub struct PhotoAdvisorAgent {
    client: Arc<OpenAiClient>,
    max_images: usize,
}

impl PhotoAdvisorAgent {
    pub fn new(client: Arc<OpenAiClient>, max_images: usize) -> Self {
        Self { client, max_images }
    }
}

#[async_trait::async_trait]
impl PhotoAdvisor for PhotoAdvisorAgent {
    fn name(&self) -> &'static str {
        "PhotoAdvisorAgent"
    }

    async fn recommend(
        &self,
        images: ImageSet,
        car_context: Option<String>,
    ) -> Result<PhotoRecommendations, AgentError> {
        if images.is_empty() {
            return Ok(PhotoRecommendations::no_photos());
        }

        let mut prompt = ADVISOR_PROMPT.to_string();
        if let Some(context) = car_context.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            prompt.push_str(&format!("\n\nContext: the car is a {}.", context));
        }

        let shown = images.len().min(self.max_images);
        let content = prompt_with_images(prompt, &images[..shown]);
        let reply = self.client.chat(content, None, MAX_TOKENS).await?;
        parse_reply(extract_json_object(&reply)?)
    }
}
