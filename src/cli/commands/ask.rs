//! Ask command implementation.

use crate::cli::Output;
use crate::pipeline::Pipeline;
use anyhow::{Context, Result};
use std::io::{BufRead, Read};

/// Run the ask command.
///
/// With no question argument, the question is read from stdin.
pub async fn run_ask(
    question: Option<&str>,
    k: Option<usize>,
    model: Option<&str>,
    pipeline: &Pipeline,
) -> Result<()> {
    let question = match question {
        Some(q) => q.to_string(),
        None => read_question_from_stdin()?,
    };

    let engine = pipeline.rag_engine(k, model)?;

    let spinner = Output::spinner("Searching the course...");
    let result = engine.ask(&question).await;
    spinner.finish_and_clear();

    match result {
        Ok(answer) => {
            println!("\n{}\n", answer.text.trim());

            if !answer.sources.is_empty() {
                Output::header("Sources");
                for source in &answer.sources {
                    Output::search_result(
                        &source.chunk.video_number,
                        &source.chunk.video_title,
                        &source.chunk.format_timestamp(),
                        source.score,
                        &source.chunk.text,
                    );
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

fn read_question_from_stdin() -> Result<String> {
    let interactive = console::user_attended();
    if interactive {
        Output::info("Ask a question:");
    }
    read_question(std::io::stdin().lock(), interactive)
}

/// Read one line at a terminal, or everything when input is piped.
fn read_question<R: BufRead>(mut reader: R, interactive: bool) -> Result<String> {
    let mut question = String::new();
    if interactive {
        reader.read_line(&mut question)
    } else {
        reader.read_to_string(&mut question)
    }
    .context("Failed to read question from stdin")?;
    Ok(question.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_interactive_reads_one_line() {
        let input = Cursor::new("what is flexbox?\nleftover input\n");
        assert_eq!(read_question(input, true).unwrap(), "what is flexbox?");
    }

    #[test]
    fn test_piped_reads_all_input() {
        let input = Cursor::new("  where is\nthe grid lesson?\n");
        assert_eq!(read_question(input, false).unwrap(), "where is\nthe grid lesson?");
    }
}
