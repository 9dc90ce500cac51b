//! Vehicle classification agent
//!
//! Identifies brand, model and the body attributes a buyer filters by.

use super::json_text::extract_json_object;
use super::openai_client::{prompt_with_images, OpenAiClient};
use crate::types::{AgentError, ClassificationReport, ImageSet, VehicleClassifier};
use std::sync::Arc;
use tracing::debug;

const MAX_TOKENS: u32 = 2048;

const CLASSIFICATION_PROMPT: &str = r#"You identify cars from photos for a used-car listing. All photos show ONE vehicle.

Determine:
- brand and model (as written on the Russian market, e.g. "Toyota", "Camry"; "Lada", "Vesta")
- body_type: "sedan" | "hatchback" | "wagon" | "suv" | "crossover" | "coupe" | "minivan" | "pickup" | "van" | "convertible"
- color: main body color in English, lowercase ("white", "black", "silver", ...)
- steering_wheel_position: "left" | "right" (only if the interior or the driver's side is visible; otherwise "")
- transmission: "manual" | "automatic" | "robot" | "cvt" (only if the gear selector is visible; otherwise "")

Return STRICTLY one JSON object, with no text before or after it:
{
  "brand": "...",
  "model": "...",
  "body_type": "...",
  "color": "...",
  "steering_wheel_position": "...",
  "transmission": "...",
  "status": "success" | "failed",
  "failure_reason": "why identification failed, or empty string",
  "classification_confidence": {"category": "high" | "medium" | "low", "subcategory": "high" | "medium" | "low"}
}

"category" is your confidence in the brand, "subcategory" in the model.
Leave a field as an empty string rather than guessing. If no car is visible, set status to "failed" and explain in failure_reason."#;

pub struct ClassificationAgent {
    client: Arc<OpenAiClient>,
}

impl ClassificationAgent {
    pub fn new(client: Arc<OpenAiClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl VehicleClassifier for ClassificationAgent {
    fn name(&self) -> &'static str {
        "ClassificationAgent"
    }

    async fn classify(&self, images: ImageSet) -> Result<ClassificationReport, AgentError> {
        let content = prompt_with_images(CLASSIFICATION_PROMPT, &images);
        let reply = self.client.chat(content, None, MAX_TOKENS).await?;
        let report: ClassificationReport = serde_json::from_value(extract_json_object(&reply)?)
            .map_err(|e| AgentError::Parse(format!("classification result: {}", e)))?;

        debug!(brand = %report.brand, model = %report.model, "Classification complete");
        Ok(report)
    }
}
