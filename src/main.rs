//! vidrag CLI entry point.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vidrag::cli::{commands, Cli, Commands};
use vidrag::config::Settings;
use vidrag::pipeline::Pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_deref()
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);
    let settings = Settings::load_from(Some(&config_path))?;

    // -v flags override general.log_level; RUST_LOG overrides both.
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("vidrag={}", log_level)),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    std::fs::create_dir_all(settings.data_dir())?;

    // Config commands must work even when prompts fail to load.
    let pipeline = || Pipeline::new(settings.clone());

    match &cli.command {
        Commands::Extract { force } => {
            commands::run_extract(*force, &pipeline()?).await?;
        }

        Commands::Transcribe { force } => {
            commands::run_transcribe(*force, &pipeline()?).await?;
        }

        Commands::Index => {
            commands::run_index(&pipeline()?).await?;
        }

        Commands::Search { query, k, min_score } => {
            commands::run_search(query, *k, *min_score, &pipeline()?).await?;
        }

        Commands::Ask { question, k, model } => {
            commands::run_ask(question.as_deref(), *k, model.as_deref(), &pipeline()?).await?;
        }

        Commands::List => {
            commands::run_list(&pipeline()?)?;
        }

        Commands::Doctor => {
            commands::run_doctor(&pipeline()?, &config_path).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, &settings, &config_path)?;
        }
    }

    Ok(())
}

