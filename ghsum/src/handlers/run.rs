//! Run command handler
//!
//! One pass over the selected repositories.

use anyhow::Result;
use github_activity::RepositoryId;

use super::CommandContext;
use crate::app::RunOptions;
use crate::orchestrator::RunResult;

/// Handle the `run` command
pub async fn run_summaries(
    ctx: &CommandContext,
    repos: Vec<RepositoryId>,
    save_json: bool,
    save_markdown: bool,
    skip_summary: bool,
    max_concurrent: Option<usize>,
) -> Result<()> {
    let options = RunOptions {
        repositories: (!repos.is_empty()).then_some(repos),
        save_json,
        save_markdown,
        max_concurrency: max_concurrent,
        skip_summary,
    };

    let results = ctx.app().run(&options).await?;
    print_results(&results, ctx.is_verbose());
    Ok(())
}

fn print_results(results: &[RunResult], verbose: bool) {
    for result in results {
        match &result.error {
            None => {
                println!("✓ {} ({} items)", result.repo, result.dataset.total());
                if verbose && !result.summary.is_empty() {
                    println!("\n{}\n", result.summary);
                }
            }
            Some(error) => println!("✗ {}: {}", result.repo, error),
        }
    }

    let failed = results.iter().filter(|r| !r.is_success()).count();
    println!(
        "\n{} repositories processed, {} failed",
        results.len(),
        failed
    );
}
