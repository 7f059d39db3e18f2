//! Embedding generation for semantic search and retrieval.

mod ollama;

pub use ollama::OllamaEmbedder;

use crate::error::{Result, VidragError};
use async_trait::async_trait;

/// Trait for embedding generation.
///
/// `embed_batch` returns one vector per input text, in input order.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embeddings for multiple texts.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Generate an embedding for a single text (a batch of one).
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = embed_checked(self, &[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| VidragError::EmbeddingService("Empty embedding response".to_string()))
    }

    /// Model name, for logs and table metadata.
    fn model(&self) -> &str;
}

/// Call `embed_batch` and verify the response is index-aligned with the request.
///
/// A response with a different number of vectors than texts cannot be
/// matched back to its inputs, so it is rejected instead of zipped.
pub async fn embed_checked<E: Embedder + ?Sized>(embedder: &E, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    let embeddings = embedder.embed_batch(texts).await?;

    if embeddings.len() != texts.len() {
        return Err(VidragError::EmbeddingService(format!(
            "Requested {} embeddings, received {}",
            texts.len(),
            embeddings.len()
        )));
    }

    Ok(embeddings)
}
