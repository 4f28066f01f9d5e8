//! Ollama LLM implementation

use anyhow::Result;
use async_trait::async_trait;
use ollama_rs::{
    generation::chat::{request::ChatMessageRequest, ChatMessage},
    Ollama,
};

use super::{Llm, Message, Role};

pub(crate) const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Ollama client wrapper
pub struct OllamaClient {
    client: Ollama,
    model: String,
}

impl OllamaClient {
    /// Create a new Ollama client from a server URL like `http://host:11434`
    pub fn new(url: &str, model: &str) -> Self {
        let (host, port) = split_url(url);
        Self {
            client: Ollama::new(format!("http://{}", host), port),
            model: model.to_string(),
        }
    }
}

fn split_url(url: &str) -> (String, u16) {
    match url::Url::parse(url) {
        Ok(parsed) => (
            parsed.host_str().unwrap_or("localhost").to_string(),
            parsed.port().unwrap_or(11434),
        ),
        Err(_) => ("localhost".to_string(), 11434),
    }
}

#[async_trait]
impl Llm for OllamaClient {
    async fn chat(&self, messages: &[Message]) -> Result<String> {
        let messages: Vec<ChatMessage> = messages
            .iter()
            .map(|m| match m.role {
                Role::System => ChatMessage::system(m.content.clone()),
                Role::User => ChatMessage::user(m.content.clone()),
                Role::Assistant => ChatMessage::assistant(m.content.clone()),
            })
            .collect();

        let request = ChatMessageRequest::new(self.model.clone(), messages);
        let response = self.client.send_chat_messages(request).await?;

        Ok(response.message.content)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
