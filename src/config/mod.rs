//! Configuration module for vidrag.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AnswerPrompts, Prompts};
pub use settings::{
    EmbeddingSettings, GeneralSettings, GenerationSettings, OllamaSettings, PathSettings,
    PromptSettings, RetrievalSettings, Settings, TranscriptionSettings, TranscriptionTask,
};
