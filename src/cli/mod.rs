//! CLI module for vidrag.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// vidrag - ask questions about a video course
///
/// Extracts audio from lesson videos, transcribes it, embeds the transcript
/// chunks with a local Ollama model, and answers questions by pointing to the
/// lessons and timestamps where a topic is taught.
#[derive(Parser, Debug)]
#[command(name = "vidrag")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "VIDRAG_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract MP3 audio from every lesson video
    Extract {
        /// Re-extract even if the audio file already exists
        #[arg(short, long)]
        force: bool,
    },

    /// Transcribe every extracted audio file with Whisper
    Transcribe {
        /// Re-transcribe even if the transcript already exists
        #[arg(short, long)]
        force: bool,
    },

    /// Embed all transcripts and rebuild the vector table
    Index,

    /// Search for relevant transcript chunks
    Search {
        /// Search query
        query: String,

        /// Number of results (defaults to retrieval.top_k)
        #[arg(short, long)]
        k: Option<usize>,

        /// Minimum similarity score (-1.0 to 1.0)
        #[arg(short, long)]
        min_score: Option<f32>,
    },

    /// Ask a question about the course
    Ask {
        /// The question to ask (read from stdin if omitted)
        question: Option<String>,

        /// Number of chunks to retrieve (defaults to retrieval.top_k)
        #[arg(short, long)]
        k: Option<usize>,

        /// Ollama model to use for answer generation
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List indexed videos
    List,

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
