//! Kiln - incremental build orchestrator for Maven multi-module projects
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use kiln::cli::commands::CommandContext;
use kiln::cli::{Cli, Commands};
use kiln::config::ConfigManager;
use kiln::error::{KilnError, KilnResult};
use std::process::ExitCode;
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

async fn run() -> KilnResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("kiln=warn"),
        1 => EnvFilter::new("kiln=info"),
        _ => EnvFilter::new("kiln=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let root = match cli.project {
        Some(path) => path,
        None => {
            std::env::current_dir().map_err(|e| KilnError::io("getting current directory", e))?
        }
    };
    let root = root
        .canonicalize()
        .map_err(|e| KilnError::io(format!("resolving project root {}", root.display()), e))?;
    if !root.join("pom.xml").exists() {
        return Err(KilnError::ProjectRootInvalid(root));
    }

    let config = match cli.config {
        Some(path) => ConfigManager::with_path(path).load_required().await?,
        None => ConfigManager::for_project(&root).load().await?,
    };

    let ctx = CommandContext {
        root,
        config,
        repository: cli.repository,
    };

    match cli.command {
        Commands::Build(args) => kiln::cli::commands::build(args, &ctx).await,
        Commands::Status(args) => kiln::cli::commands::status(args, &ctx).await,
        Commands::Gc(args) => kiln::cli::commands::gc(args, &ctx).await,
    }
}
