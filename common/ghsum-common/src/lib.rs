//! ghsum common - shared utilities for the ghsum workspace
//!
//! - **Initialization**: [`init_tracing`] for consistent log setup across binaries
//! - **Files**: [`write_atomic`] / [`write_atomic_blocking`] for crash-safe output files
//!
//! # Example
//!
//! ```rust,ignore
//! use ghsum_common::{init_tracing, write_atomic};
//!
//! init_tracing("info", 0)?;
//! write_atomic("output/report.json".into(), bytes).await?;
//! ```

pub mod fs;
pub mod init;

pub use fs::{write_atomic, write_atomic_blocking};
pub use init::{init_tracing, level_for_verbosity};
