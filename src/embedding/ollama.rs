//! Ollama `/api/embed` implementation.

use super::Embedder;
use crate::config::{EmbeddingSettings, OllamaSettings};
use crate::error::{Result, VidragError};
use crate::ollama::OllamaClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embedder backed by a local Ollama server.
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
}

impl OllamaEmbedder {
    /// Create an embedder for `bge-m3` on the default local server.
    pub fn new() -> Result<Self> {
        Self::with_config(&OllamaSettings::default(), &EmbeddingSettings::default())
    }

    /// Create an embedder from settings.
    pub fn with_config(ollama: &OllamaSettings, embedding: &EmbeddingSettings) -> Result<Self> {
        Ok(Self::with_client(OllamaClient::with_config(ollama)?, &embedding.model))
    }

    /// Create an embedder sharing an existing client.
    pub fn with_client(client: OllamaClient, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    #[instrument(skip(self, texts), fields(count = texts.len(), model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let response: EmbedResponse = self
            .client
            .post_json("api/embed", &request, VidragError::EmbeddingService)
            .await?;

        debug!("Generated {} embeddings", response.embeddings.len());
        Ok(response.embeddings)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn embedder_for(server: &MockServer) -> OllamaEmbedder {
        let settings = OllamaSettings {
            base_url: server.uri(),
            timeout_seconds: 5,
        };
        OllamaEmbedder::with_config(&settings, &EmbeddingSettings::default()).unwrap()
    }

    #[tokio::test]
    async fn test_embed_batch_sends_model_and_input() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .and(body_json(json!({"model": "bge-m3", "input": ["html", "css"]})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"embeddings": [[0.5, 0.25], [0.125, 1.0]]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let embedder = embedder_for(&server).await;
        let texts = vec!["html".to_string(), "css".to_string()];
        let embeddings = embedder.embed_batch(&texts).await.unwrap();

        assert_eq!(embeddings, vec![vec![0.5, 0.25], vec![0.125, 1.0]]);
    }

    #[tokio::test]
    async fn test_server_error_is_embedding_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not found"))
            .mount(&server)
            .await;

        let embedder = embedder_for(&server).await;
        let err = embedder.embed("query").await.unwrap_err();

        match err {
            VidragError::EmbeddingService(msg) => assert!(msg.contains("model not found")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_embeddings_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "oops"})))
            .mount(&server)
            .await;

        let embedder = embedder_for(&server).await;
        assert!(matches!(
            embedder.embed("query").await,
            Err(VidragError::EmbeddingService(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        let server = MockServer::start().await;
        let embedder = embedder_for(&server).await;

        assert!(embedder.embed_batch(&[]).await.unwrap().is_empty());
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
