//! Top-K retrieval over the vector table.
//!
//! Every row is scored against the query with cosine similarity; there is
//! no index, so a query costs one pass over the table.

use crate::embedding::Embedder;
use crate::error::{Result, VidragError};
use crate::vector_table::{cosine_similarity, Chunk, VectorTable};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// A retrieved chunk with its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Cosine similarity in [-1, 1].
    pub score: f32,
}

/// Rank every row of `table` against `query_embedding` and keep the best `k`.
///
/// Results are ordered by descending score; equal scores keep table order.
/// `k` larger than the table returns every row.
pub fn rank(table: &VectorTable, query_embedding: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
    if table.is_empty() {
        return Err(VidragError::EmptyTable);
    }
    if k == 0 {
        return Err(VidragError::InvalidInput("k must be at least 1".to_string()));
    }
    if query_embedding.len() != table.dimensions() {
        return Err(VidragError::DimensionMismatch {
            expected: table.dimensions(),
            actual: query_embedding.len(),
        });
    }

    let mut scored: Vec<(usize, f32)> = table
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| (i, cosine_similarity(query_embedding, &row.embedding)))
        .collect();

    // sort_by is stable, so ties stay in table order.
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(k);

    Ok(scored
        .into_iter()
        .map(|(i, score)| ScoredChunk {
            chunk: table.rows()[i].clone(),
            score,
        })
        .collect())
}

/// Answers "which chunks are closest to this question?".
pub struct RetrievalEngine {
    table: Arc<VectorTable>,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
    min_score: Option<f32>,
}

impl RetrievalEngine {
    /// Create a new retrieval engine returning 5 chunks per query.
    pub fn new(table: Arc<VectorTable>, embedder: Arc<dyn Embedder>) -> Self {
        if let Some(model) = table.embedding_model() {
            if model != embedder.model() {
                warn!(
                    "Table was built with '{}' but queries use '{}'",
                    model,
                    embedder.model()
                );
            }
        }

        Self {
            table,
            embedder,
            top_k: 5,
            min_score: None,
        }
    }

    /// Set the number of chunks to return.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Drop results scoring below `min_score`.
    pub fn with_min_score(mut self, min_score: Option<f32>) -> Self {
        self.min_score = min_score;
        self
    }

    /// Embed `query` and return the closest chunks.
    #[instrument(skip(self), fields(query = %query, k = self.top_k))]
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredChunk>> {
        if self.table.is_empty() {
            return Err(VidragError::EmptyTable);
        }
        if query.trim().is_empty() {
            return Err(VidragError::InvalidInput("query is empty".to_string()));
        }
        if self.top_k == 0 {
            return Err(VidragError::InvalidInput("k must be at least 1".to_string()));
        }

        let query_embedding = self.embedder.embed(query).await?;
        let mut results = rank(&self.table, &query_embedding, self.top_k)?;

        if let Some(min_score) = self.min_score {
            results.retain(|r| r.score >= min_score);
        }

        info!("Retrieved {} of {} chunks", results.len(), self.table.len());
        debug!(
            "Top score: {:?}",
            results.first().map(|r| r.score)
        );
        Ok(results)
    }
}
