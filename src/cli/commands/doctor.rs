//! Doctor command - verify that every pipeline stage can run.

use crate::cli::Output;
use crate::config::Settings;
use crate::ollama::OllamaClient;
use crate::pipeline::Pipeline;
use crate::vector_table::VectorTable;
use console::style;
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Status {
    Ok,
    Warning,
    Error,
}

/// Outcome of one diagnostic.
#[derive(Debug)]
struct Check {
    name: &'static str,
    status: Status,
    message: String,
    hint: Option<&'static str>,
}

impl Check {
    fn pass(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            status: Status::Ok,
            message: message.into(),
            hint: None,
        }
    }

    fn warn(name: &'static str, message: impl Into<String>, hint: &'static str) -> Self {
        Self {
            name,
            status: Status::Warning,
            message: message.into(),
            hint: Some(hint),
        }
    }

    fn fail(name: &'static str, message: impl Into<String>, hint: &'static str) -> Self {
        Self {
            name,
            status: Status::Error,
            message: message.into(),
            hint: Some(hint),
        }
    }
}

fn print_section(title: &str, checks: &[Check]) {
    println!("{}", style(title).bold());
    for check in checks {
        let icon = match check.status {
            Status::Ok => style("✓").green(),
            Status::Warning => style("!").yellow(),
            Status::Error => style("✗").red(),
        };
        println!("  {} {} - {}", icon, style(check.name).bold(), check.message);
        if let Some(hint) = check.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
    println!();
}

/// Run all diagnostic checks.
pub async fn run_doctor(pipeline: &Pipeline, config_path: &Path) -> anyhow::Result<()> {
    let settings = pipeline.settings();

    Output::header("vidrag Doctor");
    println!();

    let sections = [
        ("Extraction", vec![check_ffmpeg()]),
        ("Services", vec![check_openai_api_key(), check_ollama(settings).await]),
        ("Directories", check_directories(settings)),
        ("Vector Table", vec![check_table(settings)]),
        ("Configuration", vec![check_config_file(config_path)]),
    ];

    let mut errors = 0;
    let mut warnings = 0;
    for (title, checks) in &sections {
        print_section(title, checks);
        errors += checks.iter().filter(|c| c.status == Status::Error).count();
        warnings += checks.iter().filter(|c| c.status == Status::Warning).count();
    }

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using vidrag.",
            errors
        ));
        anyhow::bail!("doctor found {} error(s)", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! vidrag is ready to use.");
    }

    Ok(())
}

/// `vidrag extract` shells out to ffmpeg.
fn check_ffmpeg() -> Check {
    let hint = if cfg!(target_os = "macos") {
        "Install with: brew install ffmpeg"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install ffmpeg (or your package manager)"
    } else {
        "Install from: https://ffmpeg.org/download.html"
    };

    match Command::new("ffmpeg").arg("-version").output() {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let version = stdout
                .split_whitespace()
                .nth(2)
                .unwrap_or("installed")
                .to_string();
            Check::pass("ffmpeg", version)
        }
        Ok(_) => Check::fail("ffmpeg", "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Check::fail("ffmpeg", "not found", hint),
        Err(e) => Check::fail("ffmpeg", format!("error: {}", e), hint),
    }
}

/// Only transcription needs the OpenAI key, so a missing key is a warning.
fn check_openai_api_key() -> Check {
    const HINT: &str = "Needed for 'vidrag transcribe'. Set with: export OPENAI_API_KEY='sk-...'";

    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if key.trim().is_empty() => Check::warn("OPENAI_API_KEY", "empty", HINT),
        Ok(key) => {
            let tail = key.char_indices().rev().nth(3).map_or(0, |(i, _)| i);
            Check::pass("OPENAI_API_KEY", format!("configured (...{})", &key[tail..]))
        }
        Err(_) => Check::warn("OPENAI_API_KEY", "not set", HINT),
    }
}

/// Check that the Ollama server answers.
async fn check_ollama(settings: &Settings) -> Check {
    let client = match OllamaClient::with_config(&settings.ollama) {
        Ok(client) => client,
        Err(e) => return Check::fail("Ollama", e.to_string(), "Fix ollama.base_url in the config file"),
    };

    match client.ping().await {
        Ok(true) => Check::pass(
            "Ollama",
            format!(
                "{} (embedding: {}, generation: {})",
                client.base_url(),
                settings.embedding.model,
                settings.generation.model
            ),
        ),
        _ => Check::fail(
            "Ollama",
            format!("{} not reachable", client.base_url()),
            "Start it with: ollama serve",
        ),
    }
}

/// One check per stage directory, counting the files each holds.
fn check_directories(settings: &Settings) -> Vec<Check> {
    let stages = [
        ("Data", settings.data_dir(), "Created on first use"),
        ("Videos", settings.videos_dir(), "Put the lesson videos here"),
        ("Audio", settings.audios_dir(), "Created by 'vidrag extract'"),
        ("Transcripts", settings.transcripts_dir(), "Created by 'vidrag transcribe'"),
    ];

    stages
        .into_iter()
        .map(|(name, dir, hint)| match std::fs::read_dir(&dir) {
            Ok(entries) => {
                let count = entries.filter_map(|e| e.ok()).count();
                Check::pass(name, format!("{} ({} entries)", dir.display(), count))
            }
            Err(_) => Check::warn(name, format!("{} (missing)", dir.display()), hint),
        })
        .collect()
}

/// Check the persisted vector table and the model it was built with.
fn check_table(settings: &Settings) -> Check {
    const REBUILD: &str = "Rebuild with: vidrag index";

    let table_path = settings.table_path();
    if !table_path.exists() {
        return Check::warn(
            "Table",
            format!("{} (not built yet)", table_path.display()),
            "Build it with: vidrag index",
        );
    }

    let meta = match VectorTable::read_meta(&table_path) {
        Ok(meta) => meta,
        Err(e) => return Check::fail("Table", e.to_string(), REBUILD),
    };

    let model = meta.embedding_model.as_deref().unwrap_or("unknown model");
    if model != settings.embedding.model {
        return Check::warn(
            "Table",
            format!("built with {}, configured model is {}", model, settings.embedding.model),
            REBUILD,
        );
    }

    Check::pass(
        "Table",
        format!(
            "{} ({} chunks, {} dims, {})",
            table_path.display(),
            meta.rows,
            meta.dimensions,
            model
        ),
    )
}

fn check_config_file(config_path: &Path) -> Check {
    if config_path.exists() {
        Check::pass("Config file", config_path.display().to_string())
    } else {
        Check::warn(
            "Config file",
            format!("{} (using defaults)", config_path.display()),
            "Create with: vidrag config edit",
        )
    }
}
