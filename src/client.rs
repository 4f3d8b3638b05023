//! Video client trait.

use crate::error::Result;
use crate::types::{AiResponse, GenerationOptions, Provider, VideoArtifact};
use async_trait::async_trait;

/// Trait implemented by every provider client.
#[async_trait]
pub trait VideoClient: Send + Sync {
    /// Generates one or more videos from `prompt`.
    ///
    /// Options are forwarded to the vendor; unrecognized entries are not
    /// rejected locally.
    async fn generate_content(
        &self,
        prompt: &str,
        options: GenerationOptions,
    ) -> Result<AiResponse<Vec<VideoArtifact>>>;

    /// Provider this client talks to.
    fn provider(&self) -> Provider;

    /// Resolved model identifier.
    fn model(&self) -> &str;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str {
        match self.provider() {
            Provider::Replicate => "Replicate",
            Provider::Google => "Veo (Google)",
            _ => self.provider().as_str(),
        }
    }
}

/// Constructor arguments forwarded by the factory.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Model identifier. Required for Replicate, optional for Google.
    pub model: Option<String>,
}

impl ClientOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the model identifier.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}
