//! Remote analysis agents
//!
//! Thin clients over one OpenAI-compatible chat-completions endpoint, one
//! per capability trait in [`crate::types`].

pub mod augmentation;
pub mod classification;
pub mod description;
pub mod generations;
pub mod json_text;
pub mod openai_client;
pub mod recommender;
pub mod vision;

pub use augmentation::ImageAugmenter;
pub use classification::ClassificationAgent;
pub use description::DescriptionAgent;
pub use generations::GenerationsAgent;
pub use openai_client::OpenAiClient;
pub use recommender::PhotoAdvisorAgent;
pub use vision::VisionAgent;

use crate::types::{
    AgentError, DescriptionWriter, GenerationCatalog, ImageEditor, PhotoAdvisor, TextGenerator,
    VehicleClassifier, VisualInspector,
};
use autolist_common::config::TomlConfig;
use std::sync::Arc;
use tracing::{info, warn};

/// Every capability the service needs, behind its trait
#[derive(Clone)]
pub struct AgentSet {
    pub inspector: Arc<dyn VisualInspector>,
    pub classifier: Arc<dyn VehicleClassifier>,
    pub writer: Arc<dyn DescriptionWriter>,
    pub text_generator: Arc<dyn TextGenerator>,
    pub advisor: Arc<dyn PhotoAdvisor>,
    pub catalog: Arc<dyn GenerationCatalog>,
    pub image_editor: Arc<dyn ImageEditor>,
}

impl AgentSet {
    /// Production agents sharing one HTTP client
    pub fn from_config(config: &TomlConfig) -> Result<Self, AgentError> {
        let client = Arc::new(OpenAiClient::new(&config.openai)?);
        if client.is_configured() {
            info!(
                model = client.model(),
                image_model = client.image_model(),
                "Models configured"
            );
        } else {
            warn!("OPENAI_API_KEY not configured; agent calls will fail until it is set");
        }

        Ok(Self {
            inspector: Arc::new(VisionAgent::new(client.clone())),
            classifier: Arc::new(ClassificationAgent::new(client.clone())),
            writer: Arc::new(DescriptionAgent::new(client.clone())),
            advisor: Arc::new(PhotoAdvisorAgent::new(
                client.clone(),
                config.limits.max_advisor_images,
            )),
            catalog: Arc::new(GenerationsAgent::new(client.clone())),
            image_editor: client.clone(),
            text_generator: client,
        })
    }
}
