//! Incremental GitHub activity summarizer
//!
//! Collects recent repository activity, optionally summarizes it with an
//! LLM, and publishes markdown/JSON reports and an RSS feed.

pub mod app;
pub mod cli;
pub mod config;
pub mod handlers;
pub mod llm;
pub mod orchestrator;
pub mod output;
pub mod scheduler;
pub mod state;
pub mod stores;
pub mod summarizer;
pub mod web;

pub use app::{App, RunOptions, SetupError};
pub use config::Config;
pub use orchestrator::{Orchestrator, RunResult};
