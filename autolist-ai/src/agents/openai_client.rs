//! OpenAI-compatible chat-completions client
//!
//! Shared by every agent. One user message per request: a text part with the
//! prompt, followed by one `image_url` part per photo (base64 data URLs).
//! Photo edits go to the images endpoint as a multipart upload.

use crate::types::{AgentError, CompletionRequest, ImageEditRequest, ImageEditor, TextGenerator};
use autolist_common::config::OpenAiConfig;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Longest API error body echoed into an error message
const MAX_ERROR_BODY: usize = 500;

/// Output size requested from the image-edit endpoint
const EDIT_SIZE: &str = "1024x1024";

/// One part of a multimodal user message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    /// Image part from raw base64 (assumed JPEG) or an existing data URL
    pub fn image(base64: &str) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: image_data_url(base64),
            },
        }
    }
}

pub fn image_data_url(base64: &str) -> String {
    if base64.starts_with("data:") {
        base64.to_string()
    } else {
        format!("data:image/jpeg;base64,{}", base64)
    }
}

/// Prompt text followed by the given images
pub fn prompt_with_images(prompt: impl Into<String>, images: &[String]) -> Vec<ContentPart> {
    std::iter::once(ContentPart::text(prompt))
        .chain(images.iter().map(|image| ContentPart::image(image)))
        .collect()
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImagesResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImageData {
    b64_json: Option<String>,
    url: Option<String>,
}

/// Where the edited image can be found
#[derive(Debug, PartialEq)]
enum EditedImage {
    Inline(String),
    Remote(String),
}

impl ImagesResponse {
    fn into_edited_image(self) -> Result<EditedImage, AgentError> {
        let first = self
            .data
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Parse("image response carried no data".to_string()))?;
        match (first.b64_json, first.url) {
            (Some(b64), _) if !b64.is_empty() => Ok(EditedImage::Inline(b64)),
            (_, Some(url)) if !url.is_empty() => Ok(EditedImage::Remote(url)),
            _ => Err(AgentError::Parse("unknown image response format".to_string())),
        }
    }
}

/// File name for the upload, so the endpoint can sniff the format
fn upload_file_name(content_type: &str) -> &'static str {
    let content_type = content_type.to_ascii_lowercase();
    if content_type.contains("png") {
        "input.png"
    } else if content_type.contains("webp") {
        "input.webp"
    } else {
        "input.jpg"
    }
}

/// Map a non-2xx response to [`AgentError::Api`]
async fn ensure_success(response: Response) -> Result<Response, AgentError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    Err(AgentError::Api {
        status: status.as_u16(),
        message: text.chars().take(MAX_ERROR_BODY).collect(),
    })
}

/// Chat-completions client
pub struct OpenAiClient {
    http: Client,
    api_base: String,
    model: String,
    image_model: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    /// Build a client from configuration
    ///
    /// A missing API key is not an error here; every request then fails
    /// with [`AgentError::NotConfigured`].
    pub fn new(config: &OpenAiConfig) -> Result<Self, AgentError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AgentError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            image_model: config.image_model.clone(),
            api_key: config.api_key().map(str::to_string),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn image_model(&self) -> &str {
        &self.image_model
    }

    fn require_key(&self) -> Result<&str, AgentError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AgentError::NotConfigured("OPENAI_API_KEY is not set".to_string()))
    }

    /// Send one user message; returns the first choice's text (empty if none)
    pub async fn chat(
        &self,
        content: Vec<ContentPart>,
        temperature: Option<f32>,
        max_tokens: u32,
    ) -> Result<String, AgentError> {
        let api_key = self.require_key()?;

        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
            max_completion_tokens: max_tokens,
            temperature,
        };
        let url = format!("{}/chat/completions", self.api_base);

        debug!(
            model = %self.model,
            parts = body.messages[0].content.len(),
            ?temperature,
            "Sending chat completion request"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Network(e.to_string()))?;

        let parsed: ChatResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| AgentError::Parse(format!("chat completion response: {}", e)))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default()
            .trim()
            .to_string())
    }

    /// Edit one photo; returns the result as base64
    ///
    /// A result delivered by URL is downloaded and encoded.
    pub async fn edit_image(&self, request: ImageEditRequest) -> Result<String, AgentError> {
        let api_key = self.require_key()?;

        let part = Part::bytes(request.image)
            .file_name(upload_file_name(&request.content_type))
            .mime_str(&request.content_type)
            .map_err(|e| AgentError::Parse(format!("image content type: {}", e)))?;
        let form = Form::new()
            .text("model", self.image_model.clone())
            .text("prompt", request.prompt)
            .text("size", EDIT_SIZE)
            .part("image", part);
        let url = format!("{}/images/edits", self.api_base);

        debug!(model = %self.image_model, "Sending image edit request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AgentError::Network(e.to_string()))?;

        let parsed: ImagesResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| AgentError::Parse(format!("image edit response: {}", e)))?;

        match parsed.into_edited_image()? {
            EditedImage::Inline(b64) => Ok(b64),
            EditedImage::Remote(url) => self.download_base64(&url).await,
        }
    }

    async fn download_base64(&self, url: &str) -> Result<String, AgentError> {
        debug!(url, "Downloading edited image");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AgentError::Network(e.to_string()))?;
        let bytes = ensure_success(response)
            .await?
            .bytes()
            .await
            .map_err(|e| AgentError::Network(format!("edited image download: {}", e)))?;
        Ok(STANDARD.encode(&bytes))
    }
}

#[async_trait::async_trait]
impl TextGenerator for OpenAiClient {
    fn name(&self) -> &'static str {
        "OpenAiTextGenerator"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, AgentError> {
        self.chat(
            vec![ContentPart::text(request.prompt)],
            request.temperature,
            request.max_tokens,
        )
        .await
    }
}

#[async_trait::async_trait]
impl ImageEditor for OpenAiClient {
    fn name(&self) -> &'static str {
        "OpenAiImageEditor"
    }

    async fn edit(&self, request: ImageEditRequest) -> Result<String, AgentError> {
        self.edit_image(request).await
    }
}
