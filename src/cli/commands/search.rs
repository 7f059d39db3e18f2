//! Search command implementation.

use crate::cli::Output;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    query: &str,
    k: Option<usize>,
    min_score: Option<f32>,
    pipeline: &Pipeline,
) -> Result<()> {
    let engine = pipeline.retrieval_engine(k, min_score)?;

    let spinner = Output::spinner("Searching...");
    let results = engine.retrieve(query).await;
    spinner.finish_and_clear();

    match results {
        Ok(results) => {
            if results.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", results.len()));

                for result in &results {
                    Output::search_result(
                        &result.chunk.video_number,
                        &result.chunk.video_title,
                        &result.chunk.format_timestamp(),
                        result.score,
                        &result.chunk.text,
                    );
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
