//! GraphQL transport
//!
//! [`GraphqlTransport`] is one request/response round trip against a
//! GraphQL endpoint. [`HttpTransport`] implements it over reqwest with a
//! per-call timeout; tests substitute scripted transports.
//!
//! # Example
//!
//! ```rust,ignore
//! let transport = HttpTransport::new(token, DEFAULT_API_URL, Duration::from_secs(30))?;
//! let data = transport.execute(query, &variables).await?;
//! ```

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, error, instrument};

use crate::error::{GithubError, GithubResult};

/// Public GitHub GraphQL endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com/graphql";

const USER_AGENT: &str = concat!("ghsum/", env!("CARGO_PKG_VERSION"));

/// Executes GraphQL queries and returns the `data` object
#[async_trait]
pub trait GraphqlTransport: Send + Sync {
    async fn execute(&self, query: &str, variables: &Map<String, Value>) -> GithubResult<Value>;

    /// Most recently observed rate-limit budget, if the transport tracks one
    fn rate_limit(&self) -> Option<RateLimit> {
        None
    }
}

/// Rate-limit budget reported by the API response headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    /// Unix timestamp at which the budget resets
    pub reset: u64,
}

impl RateLimit {
    fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let read = |name: &str| -> Option<u64> { headers.get(name)?.to_str().ok()?.parse().ok() };
        Some(Self {
            limit: read("x-ratelimit-limit")?,
            remaining: read("x-ratelimit-remaining")?,
            reset: read("x-ratelimit-reset")?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphqlErrorEntry>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorEntry {
    message: String,
}

/// reqwest-backed transport
///
/// The underlying connection pool is released when the transport is dropped.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    rate_limit: Mutex<Option<RateLimit>>,
}

impl HttpTransport {
    pub fn new(
        token: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> GithubResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token: token.into(),
            rate_limit: Mutex::new(None),
        })
    }

    fn record_rate_limit(&self, headers: &HeaderMap) {
        let Some(observed) = RateLimit::from_headers(headers) else {
            return;
        };
        debug!(
            remaining = observed.remaining,
            limit = observed.limit,
            reset = observed.reset,
            "GitHub rate limit"
        );
        if let Ok(mut slot) = self.rate_limit.lock() {
            *slot = Some(observed);
        }
    }
}

#[async_trait]
impl GraphqlTransport for HttpTransport {
    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    async fn execute(&self, query: &str, variables: &Map<String, Value>) -> GithubResult<Value> {
        let body = json!({ "query": query, "variables": variables });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        self.record_rate_limit(response.headers());

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            error!("GitHub rejected the token");
            return Err(GithubError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "GitHub request failed");
            return Err(GithubError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: GraphqlResponse = response.json().await?;
        if let Some(errors) = envelope.errors.filter(|e| !e.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(GithubError::Graphql(messages.join("; ")));
        }

        envelope.data.ok_or(GithubError::MissingData)
    }

    fn rate_limit(&self) -> Option<RateLimit> {
        self.rate_limit.lock().ok().and_then(|slot| *slot)
    }
}
