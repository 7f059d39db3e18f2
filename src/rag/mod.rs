//! RAG (Retrieval-Augmented Generation) for question answering with sources.
//!
//! A question is embedded, the closest transcript chunks are retrieved from
//! the vector table, and a local model answers from those chunks alone.

mod composer;
mod generation;
mod retrieval;

pub use composer::AnswerComposer;
pub use generation::{Generator, OllamaGenerator};
pub use retrieval::{rank, RetrievalEngine, ScoredChunk};

use crate::error::Result;
use tracing::{info, instrument};

/// An answer with the chunks it was grounded on.
#[derive(Debug, Clone)]
pub struct Answer {
    /// The generated answer, verbatim.
    pub text: String,
    /// Retrieved chunks, best first.
    pub sources: Vec<ScoredChunk>,
}

impl Answer {
    /// Format the answer for display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.text.trim().to_string();

        if !self.sources.is_empty() {
            output.push_str("\n\n--- Sources ---\n");
            for source in &self.sources {
                output.push_str(&format!(
                    "\n#{} {} @ {} (score: {:.2})",
                    source.chunk.video_number,
                    source.chunk.video_title,
                    source.chunk.format_timestamp(),
                    source.score
                ));
            }
        }

        output
    }
}

/// Retrieval plus generation.
pub struct RagEngine {
    retrieval: RetrievalEngine,
    composer: AnswerComposer,
}

impl RagEngine {
    pub fn new(retrieval: RetrievalEngine, composer: AnswerComposer) -> Self {
        Self { retrieval, composer }
    }

    /// Ask a single question and get an answer with its sources.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        info!("Processing question: {}", question);

        let sources = self.retrieval.retrieve(question).await?;
        let text = self.composer.compose(question, &sources).await?;

        Ok(Answer { text, sources })
    }
}
