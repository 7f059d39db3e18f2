//! Prompt assembly and answer generation.

use super::generation::Generator;
use super::retrieval::ScoredChunk;
use crate::config::Prompts;
use crate::error::Result;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// The subset of a chunk shown to the model.
#[derive(Debug, Serialize)]
struct PromptChunk<'a> {
    title: &'a str,
    number: &'a str,
    start: f64,
    end: f64,
    text: &'a str,
}

/// Renders the answer prompt and hands it to a [`Generator`].
pub struct AnswerComposer {
    generator: Arc<dyn Generator>,
    prompts: Prompts,
}

impl AnswerComposer {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Render the prompt for `question` over `chunks`, keeping their order.
    pub fn build_prompt(&self, question: &str, chunks: &[ScoredChunk]) -> Result<String> {
        let records: Vec<PromptChunk<'_>> = chunks
            .iter()
            .map(|c| PromptChunk {
                title: &c.chunk.video_title,
                number: &c.chunk.video_number,
                start: c.chunk.start,
                end: c.chunk.end,
                text: &c.chunk.text,
            })
            .collect();

        let mut vars = HashMap::new();
        vars.insert("chunks".to_string(), serde_json::to_string_pretty(&records)?);
        vars.insert("question".to_string(), question.to_string());

        Ok(self
            .prompts
            .render_with_custom(&self.prompts.answer.template, &vars))
    }

    /// Generate an answer grounded on `chunks`.
    #[instrument(skip(self, chunks), fields(question = %question, chunks = chunks.len()))]
    pub async fn compose(&self, question: &str, chunks: &[ScoredChunk]) -> Result<String> {
        let prompt = self.build_prompt(question, chunks)?;
        debug!("Prompt is {} chars", prompt.len());
        self.generator.generate(&prompt).await
    }
}
