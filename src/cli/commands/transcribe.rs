//! Transcribe command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the transcribe command.
pub async fn run_transcribe(force: bool, pipeline: &Pipeline) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Transcribe) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vidrag doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let settings = pipeline.settings();
    Output::info(&format!(
        "Transcribing {} ({}, task: {})",
        settings.audios_dir().display(),
        settings.transcription.model,
        settings.transcription.task
    ));

    let spinner = Output::spinner("Transcribing audio...");
    let result = pipeline.transcribe(force).await;
    spinner.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            Output::error(&format!("Transcription failed: {}", e));
            return Err(e.into());
        }
    };

    for (path, reason) in &report.rejected {
        Output::warning(&format!("Skipped {}: {}", path.display(), reason));
    }
    if !report.skipped.is_empty() {
        Output::info(&format!(
            "{} transcripts already exist. Use --force to re-transcribe.",
            report.skipped.len()
        ));
    }
    Output::success(&format!(
        "Wrote {} transcripts to {}",
        report.written.len(),
        settings.transcripts_dir().display()
    ));

    Ok(())
}
