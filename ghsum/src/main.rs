use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use ghsum::app::SetupError;
use ghsum::cli::{Cli, Commands, UtilsCommands};
use ghsum::config::Config;
use ghsum::handlers::{self, CommandContext};

#[tokio::main]
async fn main() -> ExitCode {
    // .env is optional
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match Config::load_from_path(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", SetupError::from(e));
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = ghsum_common::init_tracing(&config.log_level, cli.verbose) {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }

    let ctx = CommandContext::new(cli.config.clone(), cli.verbose, config);
    match dispatch(&ctx, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.is::<SetupError>() {
                eprintln!("Setup error: {:#}", e);
            } else {
                eprintln!("Error: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(ctx: &CommandContext, command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            repos,
            save_json,
            save_markdown,
            skip_summary,
            max_concurrent,
        } => {
            handlers::run_summaries(ctx, repos, save_json, save_markdown, skip_summary, max_concurrent)
                .await
        }
        Commands::Schedule => handlers::run_schedule(ctx).await,
        Commands::Serve { host, port } => handlers::run_serve(ctx, host, port).await,
        Commands::Utils { command } => match command {
            UtilsCommands::ValidateConfig => handlers::run_validate_config(ctx),
            UtilsCommands::Labels { repo } => handlers::run_labels(ctx, repo).await,
        },
    }
}
