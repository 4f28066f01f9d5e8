//! CLI argument definitions
//!
//! Contains the main CLI struct and Commands enum for clap parsing.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use github_activity::RepositoryId;

use crate::config::DEFAULT_CONFIG_PATH;

#[derive(Parser)]
#[command(name = "ghsum")]
#[command(about = "Summarize recent GitHub repository activity")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the TOML configuration file
    #[arg(short, long, env = "GHSUM_CONFIG_PATH", default_value = DEFAULT_CONFIG_PATH, global = true)]
    pub config: PathBuf,

    /// Increase verbosity (-v info, -vv debug, -vvv trace). Default comes from the config.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch, summarize and publish activity once
    Run {
        /// Only process these repositories (owner/name, repeatable)
        #[arg(long = "repo")]
        repos: Vec<RepositoryId>,
        /// Save the filtered activity as JSON
        #[arg(long)]
        save_json: bool,
        /// Save summaries as markdown
        #[arg(long)]
        save_markdown: bool,
        /// Skip LLM summaries
        #[arg(long)]
        skip_summary: bool,
        /// Maximum repositories processed concurrently
        #[arg(long)]
        max_concurrent: Option<usize>,
    },
    /// Run configured schedules in the foreground until Ctrl+C
    Schedule,
    /// Serve the output directory and run schedules in the background
    Serve {
        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },
    /// Configuration and repository helpers
    Utils {
        #[command(subcommand)]
        command: UtilsCommands,
    },
}

#[derive(Subcommand)]
pub enum UtilsCommands {
    /// Load and validate the configuration, then print an overview
    ValidateConfig,
    /// List the labels defined on a repository
    Labels {
        /// Repository (owner/name)
        #[arg(long)]
        repo: RepositoryId,
    },
}
