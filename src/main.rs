//! bundlepack - Bundler buildpack build step
//!
//! CLI entry point that dispatches to subcommands.

use bundlepack::cli::{commands, Cli, Commands, LogFormat};
use bundlepack::config::ConfigManager;
use bundlepack::error::BuildpackResult;
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> BuildpackResult<()> {
    let cli = Cli::parse();

    // 0 = warn, 1 = info, 2+ = debug; stdout is reserved for the build log
    let filter = match cli.verbose {
        0 => EnvFilter::new("bundlepack=warn"),
        1 => EnvFilter::new("bundlepack=info"),
        _ => EnvFilter::new("bundlepack=debug"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();
    match cli.log_format {
        LogFormat::Text => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }

    // Completions don't need the descriptor
    if let Commands::Completions { shell } = cli.command {
        return commands::completions(shell);
    }

    let config_manager = ConfigManager::new(&cli.buildpack_dir);
    debug!("Buildpack descriptor: {}", config_manager.path().display());

    match cli.command {
        Commands::Completions { .. } => unreachable!("Completions handled above"),
        Commands::Build(args) => {
            let config = config_manager.load_required().await?;
            commands::build(args, config).await
        }
        Commands::Resolve(args) => {
            let config = config_manager.load().await?;
            commands::resolve(args, &config).await
        }
        Commands::Inspect(args) => commands::inspect(args).await,
    }
}
