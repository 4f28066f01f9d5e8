//! Schedule command handler

use anyhow::Result;

use super::CommandContext;
use crate::scheduler::Scheduler;

/// Handle the `schedule` command - run jobs until Ctrl+C
pub async fn run_schedule(ctx: &CommandContext) -> Result<()> {
    let scheduler = Scheduler::new(&ctx.config_path, &ctx.config)?;
    if scheduler.jobs().is_empty() {
        println!("No schedules configured.");
        return Ok(());
    }

    println!("Running {} scheduled job(s). Press Ctrl+C to stop.", scheduler.jobs().len());
    tokio::select! {
        _ = scheduler.run() => {}
        signal = tokio::signal::ctrl_c() => {
            signal?;
            println!("Scheduler stopped");
        }
    }
    Ok(())
}
