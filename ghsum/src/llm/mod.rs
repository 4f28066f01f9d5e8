//! LLM abstraction layer
//!
//! [`Llm`] is the capability the summarizer depends on. The backend is
//! picked once from config by [`create_llm`].

mod ollama;
mod openai;

pub use ollama::OllamaClient;
pub use openai::{OpenAiClient, OPENAI_API_URL};

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;

use crate::config::{LlmConfig, LlmProvider};

/// Message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Trait for LLM backends
#[async_trait]
pub trait Llm: Send + Sync {
    /// Send a conversation and get the assistant's reply
    async fn chat(&self, messages: &[Message]) -> Result<String>;

    /// Get the model name
    fn model(&self) -> &str;
}

/// Build the backend selected by `config.provider`
pub fn create_llm(config: &LlmConfig) -> Result<Arc<dyn Llm>> {
    match config.provider {
        LlmProvider::OpenAi => {
            let api_key = config
                .resolved_api_key()
                .context("llm.api_key or OPENAI_API_KEY is required for the openai provider")?;
            let base_url = config.base_url.as_deref().unwrap_or(OPENAI_API_URL);
            let timeout = Duration::from_secs(config.timeout_secs);
            Ok(Arc::new(OpenAiClient::new(
                &api_key,
                base_url,
                &config.model_name,
                timeout,
            )?))
        }
        LlmProvider::Ollama => {
            let url = config
                .base_url
                .as_deref()
                .unwrap_or(ollama::DEFAULT_OLLAMA_URL);
            Ok(Arc::new(OllamaClient::new(url, &config.model_name)))
        }
    }
}
