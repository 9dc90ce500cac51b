//! Listing description agent

use super::json_text::strip_code_fence;
use super::openai_client::{prompt_with_images, OpenAiClient};
use crate::types::{AgentError, DescriptionRequest, DescriptionWriter};
use serde_json::{json, Value};
use std::sync::Arc;

const MAX_TOKENS: u32 = 2048;

const DESCRIPTION_PROMPT: &str = r#"You write used-car listings for Russian classified sites (Drom, Avito).

Write the listing text in Russian, 5-10 sentences, for the car in the photos. Use the data below; the "details" values come from the seller and override anything you infer.
Mention condition honestly, including the listed defects, without exaggerating. Do not invent equipment, service history or numbers that are not given.
Return only the listing text: no title, no markdown, no price."#;

/// Prompt text with the structured data appended
pub fn build_prompt(request: &DescriptionRequest) -> String {
    let context = json!({
        "car": {
            "brand": request.identity.brand,
            "model": request.identity.model,
            "generation": request.identity.generation,
            "body_type": request.identity.body_type,
            "color": request.identity.color,
        },
        "details": Value::Object(request.details.clone()),
        "inspection": request.perception,
    });
    let context = serde_json::to_string_pretty(&context).unwrap_or_else(|_| context.to_string());
    format!("{}\n\nData:\n{}", DESCRIPTION_PROMPT, context)
}

pub struct DescriptionAgent {
    client: Arc<OpenAiClient>,
}

impl DescriptionAgent {
    pub fn new(client: Arc<OpenAiClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl DescriptionWriter for DescriptionAgent {
    fn name(&self) -> &'static str {
        "DescriptionAgent"
    }

    async fn describe(&self, request: DescriptionRequest) -> Result<String, AgentError> {
        let content = prompt_with_images(build_prompt(&request), &request.images);
        let reply = self.client.chat(content, None, MAX_TOKENS).await?;
        Ok(strip_code_fence(&reply).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CarIdentity;
    use serde_json::Map;

    #[test]
    fn test_prompt_carries_details() {
        let mut details = Map::new();
        details.insert("mileage".to_string(), json!(120_000));
        let request = DescriptionRequest {
            images: Arc::from(Vec::<String>::new()),
            identity: CarIdentity {
                brand: "Kia".to_string(),
                model: "Rio".to_string(),
                ..CarIdentity::default()
            },
            perception: json!({"damage_flag": "не битый"}),
            details,
        };

        let prompt = build_prompt(&request);

        assert!(prompt.contains("\"brand\": \"Kia\""));
        assert!(prompt.contains("\"mileage\": 120000"));
        assert!(prompt.contains("не битый"));
    }
}
