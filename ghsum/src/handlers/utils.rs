//! Utility command handlers

use anyhow::Result;
use github_activity::{DataType, RepositoryId};

use super::CommandContext;

/// Handle `utils validate-config`
pub fn run_validate_config(ctx: &CommandContext) -> Result<()> {
    let config = &ctx.config;
    println!("Configuration OK: {}", ctx.config_path.display());
    println!("  output dir:   {}", config.output_dir.display());
    println!("  state file:   {}", config.state_file.display());
    println!(
        "  tracking:     {} (fallback {} days)",
        if config.since_last_run { "on" } else { "off" },
        config.fallback_lookback_days
    );
    println!(
        "  summaries:    {}",
        config
            .llm
            .as_ref()
            .map_or("disabled".to_string(), |llm| llm.model_name.clone())
    );
    println!(
        "  rss:          {}",
        config
            .rss
            .as_ref()
            .map_or("disabled".to_string(), |rss| rss.filename.clone())
    );
    println!(
        "  schedule:     {}",
        config
            .schedule
            .as_ref()
            .map_or("none".to_string(), |s| format!("cron \"{}\"", s.cron))
    );
    println!("  repositories: {}", config.repositories.len());

    for repo in &config.repositories {
        let enabled: Vec<&str> = DataType::ALL
            .iter()
            .filter(|t| repo.includes(**t))
            .map(|t| t.as_str())
            .collect();
        let schedule = repo
            .schedule
            .as_ref()
            .map(|s| {
                format!(
                    ", cron \"{}\" ({})",
                    s.cron,
                    s.timezone.as_deref().unwrap_or("local")
                )
            })
            .unwrap_or_default();
        println!("    - {} [{}]{}", repo.name, enabled.join(", "), schedule);
    }
    Ok(())
}

/// Handle `utils labels`
pub async fn run_labels(ctx: &CommandContext, repo: RepositoryId) -> Result<()> {
    let client = ctx.app().github_client()?;
    let labels = client.fetch_labels(&repo).await?;

    if labels.is_empty() {
        println!("{} has no labels", repo);
        return Ok(());
    }
    println!("Labels in {}:", repo);
    for label in labels {
        println!("  {}", label);
    }
    Ok(())
}
