//! Serve command handler
//!
//! Start the web server with the scheduler in the background.

use anyhow::Result;

use super::CommandContext;
use crate::web::{self, WebConfig};

/// Handle the `serve` command
pub async fn run_serve(ctx: &CommandContext, host: String, port: u16) -> Result<()> {
    let config = WebConfig {
        host,
        port,
        config_path: ctx.config_path.clone(),
    };
    web::serve(config, &ctx.config).await
}
