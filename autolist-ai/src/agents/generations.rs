//! Generations lookup agent
//!
//! Lists the generations (body codes, facelifts) known for a brand and model,
//! oldest first, for the listing editor's drop-down.

use super::json_text::extract_json_array;
use super::openai_client::{ContentPart, OpenAiClient};
use crate::models::lenient::text_of;
use crate::types::{AgentError, GenerationCatalog};
use std::sync::Arc;

const MAX_TOKENS: u32 = 1024;
const MAX_GENERATIONS: usize = 20;

pub fn build_prompt(brand: &str, model: &str) -> String {
    format!(
        r#"You are a car expert. List the generations (including facelifts) that exist for this car model.

Brand: {brand}
Model: {model}

Use the names customary on the Russian car market: a body code or a generation name (for example E90, F30, G20 for the BMW 3 Series; "I", "II рестайлинг" for other models).
Return ONLY a JSON array of strings, no explanations. Example: ["E46", "E90", "F30", "G20"].
Between 1 and {MAX_GENERATIONS} items, oldest first where possible.
If the brand or model is unknown, return an empty array: []."#
    )
}

pub struct GenerationsAgent {
    client: Arc<OpenAiClient>,
}

impl GenerationsAgent {
    pub fn new(client: Arc<OpenAiClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl GenerationCatalog for GenerationsAgent {
    fn name(&self) -> &'static str {
        "GenerationsAgent"
    }

    async fn generations(&self, brand: &str, model: &str) -> Result<Vec<String>, AgentError> {
        let (brand, model) = (brand.trim(), model.trim());
        if brand.is_empty() || model.is_empty() {
            return Ok(Vec::new());
        }

        let content = vec![ContentPart::text(build_prompt(brand, model))];
        let reply = self.client.chat(content, None, MAX_TOKENS).await?;
        Ok(extract_json_array(&reply)?
            .iter()
            .map(text_of)
            .filter(|name| !name.is_empty())
            .take(MAX_GENERATIONS)
            .collect())
    }
}
