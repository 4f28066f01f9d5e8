//! Activity summarization
//!
//! [`Summarizer`] turns one repository's filtered dataset into prose.
//! [`LlmSummarizer`] does it with an [`Llm`] backend, limiting how many
//! calls are in flight and retrying failed or timed-out calls with linear
//! backoff.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use github_activity::{RepoDataset, RepositoryId};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::config::LlmConfig;
use crate::llm::{Llm, Message};

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        repo: &RepositoryId,
        dataset: &RepoDataset,
        since: DateTime<Utc>,
    ) -> Result<String>;
}

pub struct LlmSummarizer {
    llm: Arc<dyn Llm>,
    system_prompt: String,
    language: Option<String>,
    attempts: u32,
    retry_delay: Duration,
    call_timeout: Duration,
    permits: Arc<Semaphore>,
}

impl LlmSummarizer {
    pub fn new(llm: Arc<dyn Llm>, config: &LlmConfig, max_concurrent: usize) -> Self {
        Self {
            llm,
            system_prompt: config.system_prompt.clone(),
            language: config.language.clone(),
            attempts: config.retries.max(1),
            retry_delay: Duration::from_secs(config.retry_delay_secs),
            call_timeout: Duration::from_secs(config.timeout_secs),
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    fn build_messages(
        &self,
        repo: &RepositoryId,
        dataset: &RepoDataset,
        since: DateTime<Utc>,
    ) -> Result<Vec<Message>> {
        let mut system = self.system_prompt.trim().to_string();
        if let Some(language) = &self.language {
            system.push_str(&format!("\n\nRespond in {}.", language));
        }

        let payload = serde_json::to_string_pretty(&dataset.snapshot(repo))
            .context("failed to serialize dataset")?;
        let user = format!(
            "Activity for {} since {}:\n\n```json\n{}\n```",
            repo,
            since.to_rfc3339_opts(SecondsFormat::Secs, true),
            payload
        );

        Ok(vec![Message::system(system), Message::user(user)])
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(
        &self,
        repo: &RepositoryId,
        dataset: &RepoDataset,
        since: DateTime<Utc>,
    ) -> Result<String> {
        if dataset.is_empty() {
            info!(repo = %repo, "no new activity, skipping summary");
            return Ok(String::new());
        }

        let messages = self.build_messages(repo, dataset, since)?;
        info!(repo = %repo, model = self.llm.model(), "generating summary");

        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = {
                let _permit = self.permits.acquire().await.context("LLM limiter closed")?;
                match tokio::time::timeout(self.call_timeout, self.llm.chat(&messages)).await {
                    Ok(reply) => reply,
                    Err(_) => Err(anyhow!("LLM call timed out after {:?}", self.call_timeout)),
                }
            };

            match result {
                Ok(text) => {
                    debug!(repo = %repo, chars = text.len(), "summary generated");
                    return Ok(text.trim().to_string());
                }
                Err(e) if attempt < self.attempts => {
                    let delay = self.retry_delay * attempt;
                    warn!(
                        repo = %repo,
                        attempt,
                        error = %e,
                        "LLM call failed, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    return Err(e.context(format!(
                        "summary for {} failed after {} attempts",
                        repo, attempt
                    )));
                }
            }
        }
    }
}
