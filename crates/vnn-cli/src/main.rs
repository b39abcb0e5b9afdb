//! vnn-events entry point.

use std::process::ExitCode;

use chrono::Utc;
use clap::Parser;
use tracing::error;

use vnn_cli::cli::{Cli, Command, ConfigAction};
use vnn_cli::commands;
use vnn_cli::config::PipelineConfig;
use vnn_cli::error::{CliError, CliResult};
use vnn_cli::pipeline;
use vnn_core::init_tracing;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match init_tracing(cli.tracing_config()) {
        Ok(()) => run(cli).await,
        Err(e) => Err(CliError::from(e)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(exit_code = e.exit_code(), "{}", e);
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(PipelineConfig::default_path);
    let mut config = if cli.config.is_some() {
        PipelineConfig::load_from(&config_path)?
    } else {
        PipelineConfig::load()?
    };
    cli.apply_overrides(&mut config);

    match cli.command {
        Some(Command::Config { action }) => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config_path),
        },
        Some(Command::Run) | None => {
            config.validate()?;
            let sources = pipeline::build_sources(&config);
            let report = pipeline::run(&config, &sources, Utc::now()).await?;
            println!(
                "Published {} events to {} and {}",
                report.unique,
                report.json_path.display(),
                report.ics_path.display()
            );
            Ok(())
        }
    }
}
