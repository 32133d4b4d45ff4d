use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod config;
mod descriptor;
mod error;
mod infrastructure;
mod probe;
mod prompt;
mod tools;
mod ui;

use cli::{Cli, Commands};
use commands::deploy::DeployOptions;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with LOGGING env var support
    // LOGGING=debug,info,warn,error or just LOGGING=debug
    let log_level = std::env::var("LOGGING")
        .or_else(|_| std::env::var("LOG_LEVEL"))
        .unwrap_or_else(|_| {
            if cli.verbose {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(false)
        .init();

    match cli.command {
        Commands::Deploy {
            project,
            region,
            target,
            backend_dir,
            frontend_dir,
            skip_smoke_test,
        } => {
            commands::deploy::execute(DeployOptions {
                project,
                region,
                target,
                backend_dir,
                frontend_dir,
                skip_smoke_test,
            })
            .await?;
        }
        Commands::Verify {
            backend_url,
            frontend_url,
            project,
            region,
        } => {
            commands::verify::execute(backend_url, frontend_url, project, region).await?;
        }
    }

    Ok(())
}
