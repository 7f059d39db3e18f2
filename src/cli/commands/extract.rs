//! Extract command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the extract command.
pub async fn run_extract(force: bool, pipeline: &Pipeline) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Extract) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vidrag doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let videos_dir = pipeline.settings().videos_dir();
    Output::info(&format!("Extracting audio from {}", videos_dir.display()));

    let spinner = Output::spinner("Running ffmpeg...");
    let result = pipeline.extract(force).await;
    spinner.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            Output::error(&format!("Extraction failed: {}", e));
            return Err(e.into());
        }
    };

    for (path, reason) in &report.rejected {
        Output::warning(&format!("Skipped {}: {}", path.display(), reason));
    }
    if !report.skipped.is_empty() {
        Output::info(&format!(
            "{} audio files already exist. Use --force to re-extract.",
            report.skipped.len()
        ));
    }
    Output::success(&format!(
        "Extracted {} audio files to {}",
        report.extracted.len(),
        pipeline.settings().audios_dir().display()
    ));

    Ok(())
}
