//! Visual inspection agent
//!
//! Sends every photo to the chat model and asks for a condition report:
//! scores, damage flag, defect list and a short Russian summary. The
//! summary carries fixed rejection phrases the status resolver looks for.

use super::json_text::extract_json_object;
use super::openai_client::{prompt_with_images, OpenAiClient};
use crate::types::{AgentError, ImageSet, PerceptionReport, VisualInspector};
use std::sync::Arc;
use tracing::debug;

const MAX_TOKENS: u32 = 4096;

const INSPECTION_PROMPT: &str = r#"You are an experienced used-car inspector. All photos show ONE vehicle offered for sale.

Assess only what is actually visible:
1. Overall visual condition of body, paint, glass, wheels and interior.
2. Every visible defect: scratches, dents, chips, corrosion, repainted or replaced panels.
3. Whether there are signs of accident damage.
4. How much of the car the photos let you inspect (angles covered, lighting, sharpness).

Return STRICTLY one JSON object, with no text before or after it:
{
  "visual_condition_score": number from 0.0 (wreck) to 1.0 (showroom),
  "inspection_reliability_score": number from 0.0 (nothing visible) to 1.0 (every side clearly shown),
  "damage_flag": "битый" | "не битый" | "не определено",
  "defects": [
    {
      "type": "царапина" | "вмятина" | "скол" | "коррозия" | "окрашена" | "заменена",
      "severity": "слабая" | "умеренная" | "сильная",
      "location": "short description of where, in Russian",
      "body_part": one of "hood", "roof", "trunk", "front_bumper", "rear_bumper", "front_fender_left", "front_fender_right", "rear_fender_left", "rear_fender_right", "front_door_left", "front_door_right", "rear_door_left", "rear_door_right", "windshield", "wheel", "interior"
    }
  ],
  "raw_text_description": "two or three sentences in Russian summarizing the condition"
}

Rules:
- Use "не определено" when the photos do not allow a conclusion about accident damage.
- An empty "defects" array is correct for a car without visible defects.
- If the photos do not show a car at all, set raw_text_description to "Изображения не содержит автомобиль, анализ невозможен".
- If the photos show a car but cannot be used for inspection, include the phrase "анализ невозможен" in raw_text_description.
- If the request is not about inspecting a car for sale, include "не соответствует задаче" in raw_text_description.
- Never invent defects that are not visible."#;

pub struct VisionAgent {
    client: Arc<OpenAiClient>,
}

impl VisionAgent {
    pub fn new(client: Arc<OpenAiClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl VisualInspector for VisionAgent {
    fn name(&self) -> &'static str {
        "VisionAgent"
    }

    async fn inspect(&self, images: ImageSet) -> Result<PerceptionReport, AgentError> {
        let content = prompt_with_images(INSPECTION_PROMPT, &images);
        let reply = self.client.chat(content, None, MAX_TOKENS).await?;
        let report = PerceptionReport::from_value(extract_json_object(&reply)?)?;

        debug!(
            defects = report.defects.len(),
            damage_flag = %report.damage_flag,
            "Visual inspection complete"
        );
        Ok(report)
    }
}
