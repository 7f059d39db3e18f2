//! The vector table: every embedded transcript chunk, held in memory.
//!
//! A table is built in one pass by [`TableBuilder`], persisted as a single
//! SQLite file, and loaded read-only for retrieval. It is never updated in
//! place; rebuilding replaces the whole file.

mod builder;
mod sqlite;

pub use builder::{BuildReport, ChunkIdGenerator, TableBuilder};
pub use sqlite::TableMeta;

use crate::error::{Result, VidragError};
use crate::transcription::format_timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One embedded unit of transcribed speech.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique across the table, assigned in build order.
    pub chunk_id: u64,
    /// Lesson number of the source video.
    pub video_number: String,
    /// Lesson title of the source video.
    pub video_title: String,
    /// Start time in the video (seconds).
    pub start: f64,
    /// End time in the video (seconds).
    pub end: f64,
    /// Transcribed text.
    pub text: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
}

impl Chunk {
    /// Format the start timestamp for display.
    pub fn format_timestamp(&self) -> String {
        format_timestamp(self.start)
    }
}

/// Per-video summary of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSummary {
    pub video_number: String,
    pub video_title: String,
    pub chunk_count: usize,
    /// Latest chunk end time, in seconds.
    pub duration_seconds: f64,
}

/// Immutable, validated collection of chunks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VectorTable {
    rows: Vec<Chunk>,
    dimensions: usize,
    embedding_model: Option<String>,
}

impl VectorTable {
    /// Build a table from rows, checking that every embedding has the same
    /// non-zero length and that chunk ids are unique.
    pub fn new(rows: Vec<Chunk>) -> Result<Self> {
        let dimensions = rows.first().map(|c| c.embedding.len()).unwrap_or(0);

        if !rows.is_empty() && dimensions == 0 {
            return Err(VidragError::MalformedInput(format!(
                "chunk {} has an empty embedding",
                rows[0].chunk_id
            )));
        }

        let mut seen = HashSet::with_capacity(rows.len());
        for row in &rows {
            if row.embedding.len() != dimensions {
                return Err(VidragError::DimensionMismatch {
                    expected: dimensions,
                    actual: row.embedding.len(),
                });
            }
            if !seen.insert(row.chunk_id) {
                return Err(VidragError::VectorTable(format!(
                    "duplicate chunk_id {}",
                    row.chunk_id
                )));
            }
        }

        Ok(Self {
            rows,
            dimensions,
            embedding_model: None,
        })
    }

    /// Record which model produced the embeddings.
    pub fn with_embedding_model(mut self, model: &str) -> Self {
        self.embedding_model = Some(model.to_string());
        self
    }

    pub fn rows(&self) -> &[Chunk] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Embedding length shared by every row (0 for an empty table).
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn embedding_model(&self) -> Option<&str> {
        self.embedding_model.as_deref()
    }

    /// Summarize rows per video, in order of first appearance.
    pub fn videos(&self) -> Vec<VideoSummary> {
        let mut videos: Vec<VideoSummary> = Vec::new();

        for row in &self.rows {
            let existing = videos
                .iter_mut()
                .find(|v| v.video_number == row.video_number && v.video_title == row.video_title);

            match existing {
                Some(video) => {
                    video.chunk_count += 1;
                    video.duration_seconds = video.duration_seconds.max(row.end);
                }
                None => videos.push(VideoSummary {
                    video_number: row.video_number.clone(),
                    video_title: row.video_title.clone(),
                    chunk_count: 1,
                    duration_seconds: row.end,
                }),
            }
        }

        videos
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 when the lengths differ or either vector has zero norm.
/// Never returns -0.0, so every zero score compares equal when ranked.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0) + 0.0
}

#[cfg(test)]
pub(crate) fn test_chunk(chunk_id: u64, embedding: Vec<f32>) -> Chunk {
    Chunk {
        chunk_id,
        video_number: "1".to_string(),
        video_title: "Intro".to_string(),
        start: chunk_id as f64 * 10.0,
        end: chunk_id as f64 * 10.0 + 10.0,
        text: format!("chunk {}", chunk_id),
        embedding,
    }
}
