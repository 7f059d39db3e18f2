//! Index command implementation.

use crate::cli::Output;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the index command.
pub async fn run_index(pipeline: &Pipeline) -> Result<()> {
    let settings = pipeline.settings();
    Output::info(&format!(
        "Embedding transcripts in {} with {}",
        settings.transcripts_dir().display(),
        settings.embedding.model
    ));

    let spinner = Output::spinner("Creating embeddings...");
    let result = pipeline.index().await;
    spinner.finish_and_clear();

    match result {
        Ok(result) => {
            Output::success(&format!(
                "Indexed {} chunks from {} transcripts",
                result.chunks, result.files
            ));
            Output::kv("Dimensions", &result.dimensions.to_string());
            Output::kv("Table", &settings.table_path().display().to_string());
        }
        Err(e) => {
            Output::error(&format!("Indexing failed: {}", e));
            Output::info("The previous table, if any, was left untouched.");
            return Err(e.into());
        }
    }

    Ok(())
}
