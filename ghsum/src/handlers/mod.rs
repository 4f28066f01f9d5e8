//! Command handlers module
//!
//! One handler per CLI command. [`CommandContext`] carries the resolved
//! configuration shared by all of them.

use std::path::PathBuf;

use crate::app::App;
use crate::config::Config;

pub mod run;
pub mod schedule;
pub mod serve;
pub mod utils;

pub use run::run_summaries;
pub use schedule::run_schedule;
pub use serve::run_serve;
pub use utils::{run_labels, run_validate_config};

// =============================================================================
// CommandContext - shared state for handlers
// =============================================================================

/// Shared context for command handlers
pub struct CommandContext {
    pub config_path: PathBuf,
    pub verbose: u8,
    pub config: Config,
}

impl CommandContext {
    pub fn new(config_path: PathBuf, verbose: u8, config: Config) -> Self {
        Self {
            config_path,
            verbose,
            config,
        }
    }

    /// An [`App`] over the loaded configuration
    pub fn app(&self) -> App {
        App::new(self.config.clone())
    }

    /// Check if verbose mode is enabled (any -v flag)
    pub fn is_verbose(&self) -> bool {
        self.verbose >= 1
    }
}
