//! Photo augmentation agent
//!
//! Two remote steps per request:
//! 1. A chat completion screens the user's instruction: it must concern the
//!    car, describe a realistic scene, and pick a mode
//! 2. The photo is re-encoded as an RGB JPEG and goes to the image editor
//!    with a mode-specific prompt
//!
//! Every outcome is an [`AugmentationResult`]; failures carry a message
//! instead of an error status.

use super::json_text::extract_json_object;
use crate::models::lenient;
use crate::models::{AugmentMode, AugmentationResult};
use crate::types::{AgentError, CompletionRequest, ImageEditRequest, ImageEditor, TextGenerator};
use image::codecs::jpeg::JpegEncoder;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

const SCREENING_MAX_TOKENS: u32 = 256;
const JPEG_QUALITY: u8 = 95;

pub const EMPTY_PROMPT: &str = "The request is empty.";
pub const NOT_ABOUT_CAR: &str = "Request rejected: it is not about the car.";
pub const UNREALISTIC_SCENE: &str = "Request rejected: the scene is not realistic.";
pub const UNKNOWN_MODE: &str = "Unsupported processing mode.";

fn screening_prompt(user_prompt: &str) -> String {
    format!(
        r#"You screen user requests sent to an agent that edits photos of cars.

Perform THREE checks.

1. DOMAIN CHECK
The request is acceptable ONLY if it concerns the car and a visual change to the photo of the car.

2. REALISM CHECK
Only realistic, physically possible scenes are acceptable.
ALLOWED:
- adding temporary items (a suitcase, a coffee cup, a bag)
- items may stand ON or NEXT TO the car
- the scene looks like an ordinary photo
FORBIDDEN:
- fantasy scenes, artistic renders, illustrations
- toy scale
- changing the geometry of the car
- changing the weather, time of day or surroundings

3. MODE DETECTION
- "improve": improve photo quality WITHOUT adding objects
- "augment": add ONE object without changing the scene

Answer STRICTLY with one JSON object and nothing else:
{{"domain": "car" | "not_car", "realism": "acceptable" | "unacceptable", "mode": "improve" | "augment"}}

User request:
{user_prompt}"#
    )
}

fn edit_prompt(mode: AugmentMode, user_prompt: &str) -> String {
    match mode {
        AugmentMode::Improve => format!(
            r#"You improve photos of cars for classified listings.

TASK: improve the quality of the supplied photo.

STRICT RULES:
- Use ONLY the supplied image
- Do NOT add new objects
- Do NOT change the shape, color or geometry of the car
- Do NOT hide or mask defects
- Allowed: sharper detail, better exposure, slightly better contrast
- No artistic styles or renders; the result must look like a real photo

USER REQUEST:
{user_prompt}"#
        ),
        AugmentMode::Augment => format!(
            r#"You make one local addition to a photo of a car.

TASK: add ONE physically plausible object to the original photo.

STRICT RULES:
- The image must remain a PHOTOGRAPH
- Do not change the lighting, color temperature, weather, background or style
- Do not redraw or enhance the car or the scene
- No cinematic effects or artistic styles

ALLOWED:
- Add exactly one object that looks genuinely placed there
- Realistic scale, perspective and shadows
- The result looks like an ordinary phone photo

OBJECT TO ADD:
{user_prompt}"#
        ),
    }
}

/// Screening verdict as returned by the model
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Screening {
    #[serde(deserialize_with = "lenient::string")]
    domain: String,
    #[serde(deserialize_with = "lenient::string")]
    realism: String,
    #[serde(deserialize_with = "lenient::string")]
    mode: String,
}

impl Screening {
    /// Accepted mode, or the rejection message
    fn verdict(&self) -> Result<AugmentMode, &'static str> {
        if self.domain.trim() != "car" {
            return Err(NOT_ABOUT_CAR);
        }
        if self.realism.trim() != "acceptable" {
            return Err(UNREALISTIC_SCENE);
        }
        self.mode.parse().map_err(|_| UNKNOWN_MODE)
    }
}

/// Decode any supported format and re-encode it as an RGB JPEG
pub fn to_rgb_jpeg(bytes: &[u8]) -> Result<Vec<u8>, image::ImageError> {
    let rgb = image::load_from_memory(bytes)?.to_rgb8();
    let mut out = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY))?;
    Ok(out)
}

/// Screens the instruction, then edits the photo
#[derive(Clone)]
pub struct ImageAugmenter {
    screener: Arc<dyn TextGenerator>,
    editor: Arc<dyn ImageEditor>,
}

impl ImageAugmenter {
    pub fn new(screener: Arc<dyn TextGenerator>, editor: Arc<dyn ImageEditor>) -> Self {
        Self { screener, editor }
    }

    pub async fn augment(&self, image: Vec<u8>, user_prompt: &str) -> AugmentationResult {
        let user_prompt = user_prompt.trim();
        if user_prompt.is_empty() {
            return AugmentationResult::rejected(EMPTY_PROMPT, None);
        }

        let mode = match self.screen(user_prompt).await {
            Ok(Ok(mode)) => mode,
            Ok(Err(rejection)) => {
                info!(reason = rejection, "Augmentation request rejected");
                return AugmentationResult::rejected(rejection, None);
            }
            Err(e) => {
                warn!(agent = self.screener.name(), error = %e, "Augmentation screening failed");
                return AugmentationResult::rejected(
                    format!("Request analysis failed: {}", e),
                    None,
                );
            }
        };

        let jpeg = match tokio::task::spawn_blocking(move || to_rgb_jpeg(&image)).await {
            Ok(Ok(jpeg)) => jpeg,
            Ok(Err(e)) => {
                warn!(error = %e, "Uploaded photo could not be decoded");
                return AugmentationResult::rejected(
                    format!("Could not read the image: {}", e),
                    Some(mode),
                );
            }
            Err(join_error) => {
                warn!(error = %join_error, "Photo conversion task failed");
                return AugmentationResult::rejected(
                    format!("Could not read the image: {}", join_error),
                    Some(mode),
                );
            }
        };

        let request = ImageEditRequest {
            image: jpeg,
            content_type: "image/jpeg".to_string(),
            prompt: edit_prompt(mode, user_prompt),
        };
        match self.editor.edit(request).await {
            Ok(image_base64) => {
                info!(?mode, "Photo edited");
                AugmentationResult::edited(image_base64, mode)
            }
            Err(e) => {
                warn!(agent = self.editor.name(), ?mode, error = %e, "Photo edit failed");
                AugmentationResult::rejected(e.to_string(), Some(mode))
            }
        }
    }

    async fn screen(
        &self,
        user_prompt: &str,
    ) -> Result<Result<AugmentMode, &'static str>, AgentError> {
        let reply = self
            .screener
            .complete(CompletionRequest {
                prompt: screening_prompt(user_prompt),
                temperature: None,
                max_tokens: SCREENING_MAX_TOKENS,
            })
            .await?;
        let screening: Screening = serde_json::from_value(extract_json_object(&reply)?)
            .map_err(|e| AgentError::Parse(format!("request screening: {}", e)))?;
        Ok(screening.verdict())
    }
}
