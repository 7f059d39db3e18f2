//! vidrag - Retrieval-augmented answers over a video course
//!
//! A local-first CLI tool that turns a folder of lesson videos into a
//! question-answering assistant that cites lesson numbers and timestamps.
//!
//! # Overview
//!
//! The pipeline runs in stages, each reading the previous stage's output
//! from disk:
//!
//! 1. `media` extracts MP3 audio from `<title> ｜ <series> #<n>` videos
//! 2. `transcription` turns audio into timestamped transcript JSON (Whisper)
//! 3. `vector_table` embeds every transcript chunk (Ollama) into one SQLite file
//! 4. `rag` retrieves the closest chunks for a question and has a local
//!    model answer from them
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `media` - Filename grammar and ffmpeg audio extraction
//! - `transcription` - Speech-to-text and transcript files
//! - `embedding` - Embedding generation
//! - `vector_table` - In-memory chunk table, builder and persistence
//! - `rag` - Retrieval, prompt composition and generation
//! - `pipeline` - Stage coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use vidrag::config::Settings;
//! use vidrag::pipeline::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pipeline = Pipeline::new(Settings::load()?)?;
//!
//!     pipeline.index().await?;
//!     let answer = pipeline.rag_engine(None, None)?.ask("Where is flexbox taught?").await?;
//!     println!("{}", answer.format_for_display());
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod media;
pub mod ollama;
pub mod openai;
pub mod pipeline;
pub mod rag;
pub mod transcription;
pub mod vector_table;

pub use error::{Result, VidragError};
