//! CLI module
//!
//! Argument definitions for the `ghsum` binary.

pub mod args;

pub use args::{Cli, Commands, UtilsCommands};
