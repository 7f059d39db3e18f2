//! List command implementation.

use crate::cli::Output;
use crate::pipeline::Pipeline;
use crate::vector_table::VectorTable;
use anyhow::Result;

/// Run the list command.
pub fn run_list(pipeline: &Pipeline) -> Result<()> {
    let table_path = pipeline.settings().table_path();
    if !table_path.exists() {
        Output::info("Nothing indexed yet. Run 'vidrag index' after transcribing.");
        return Ok(());
    }

    let table = pipeline.load_table()?;
    let meta = VectorTable::read_meta(&table_path)?;
    let videos = table.videos();

    Output::header(&format!("Indexed Videos ({})", videos.len()));
    println!();

    for video in &videos {
        Output::video_info(
            &video.video_number,
            &video.video_title,
            video.chunk_count,
            video.duration_seconds,
        );
    }

    println!();
    Output::kv("Total chunks", &meta.rows.to_string());
    Output::kv("Dimensions", &meta.dimensions.to_string());
    if let Some(model) = &meta.embedding_model {
        Output::kv("Embedding model", model);
    }
    if let Some(built_at) = &meta.built_at {
        Output::kv("Built at", &built_at.to_rfc3339());
    }

    Ok(())
}
