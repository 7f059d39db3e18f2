//! Text generation through Ollama `/api/generate`.

use crate::config::{GenerationSettings, OllamaSettings};
use crate::error::{Result, VidragError};
use crate::ollama::OllamaClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Turns a fully rendered prompt into an answer.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a single, non-streamed completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model name, for logs.
    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Generator backed by a local Ollama server.
pub struct OllamaGenerator {
    client: OllamaClient,
    model: String,
}

impl OllamaGenerator {
    /// Create a generator for `llama3.2` on the default local server.
    pub fn new() -> Result<Self> {
        Self::with_config(&OllamaSettings::default(), &GenerationSettings::default())
    }

    pub fn with_config(ollama: &OllamaSettings, generation: &GenerationSettings) -> Result<Self> {
        Ok(Self::with_client(OllamaClient::with_config(ollama)?, &generation.model))
    }

    pub fn with_client(client: OllamaClient, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response: GenerateResponse = self
            .client
            .post_json("api/generate", &request, VidragError::GenerationService)
            .await?;

        debug!("Generated {} chars", response.response.len());
        Ok(response.response)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
