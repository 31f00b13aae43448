//! HTTP client for the remote RAG backend
//!
//! One POST per query, bounded by the configured timeout. Status codes are
//! authoritative: the body is only parsed for 2xx responses.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

use crate::config::RagConfig;
use crate::error::{RagError, Result};
use crate::rag::types::{Credentials, QueryRequest, QueryResult};

/// Longest body excerpt carried by an `Upstream` error
const BODY_EXCERPT_CHARS: usize = 500;

/// Anything that can answer a RAG query
#[async_trait]
pub trait RagBackend: Send + Sync {
    async fn query(&self, credentials: &Credentials, request: &QueryRequest) -> Result<QueryResult>;
}

/// Settings for the HTTP client
#[derive(Debug, Clone)]
pub struct RagClientConfig {
    pub query_path: String,
    pub timeout: Duration,
}

impl Default for RagClientConfig {
    fn default() -> Self {
        Self::from(&RagConfig::default())
    }
}

impl From<&RagConfig> for RagClientConfig {
    fn from(config: &RagConfig) -> Self {
        Self {
            query_path: config.query_path.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }
}

/// reqwest-backed `RagBackend`
pub struct RagClient {
    client: Client,
    config: RagClientConfig,
}

impl RagClient {
    pub fn new(config: RagClientConfig) -> Result<Self> {
        if config.timeout.is_zero() {
            return Err(RagError::Config("timeout must be greater than zero".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RagError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Full URL the query is posted to
    pub fn endpoint(&self, base_url: &str) -> String {
        join_endpoint(base_url, &self.config.query_path)
    }

    fn classify_send_error(&self, e: reqwest::Error) -> RagError {
        if e.is_timeout() {
            RagError::BackendUnavailable(format!("request timed out after {}ms", self.config.timeout.as_millis()))
        } else if e.is_builder() {
            RagError::Validation(format!("invalid request to RAG backend: {}", e))
        } else {
            RagError::BackendUnavailable(format!("request failed: {}", e))
        }
    }
}

#[async_trait]
impl RagBackend for RagClient {
    async fn query(&self, credentials: &Credentials, request: &QueryRequest) -> Result<QueryResult> {
        let url = self.endpoint(&credentials.base_url);
        log::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, credentials.bearer())
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;

        let status = response.status().as_u16();

        if is_success(status) {
            // Body read shares the client timeout
            let body = response.text().await.map_err(|e| self.classify_send_error(e))?;
            return QueryResult::from_body(&body);
        }

        // The status decides the error kind; a failed body read only loses the excerpt
        let body = if carries_excerpt(status) {
            response.text().await.unwrap_or_default()
        } else {
            String::new()
        };
        log::error!("RAG backend error {}: {}", status, excerpt(&body));
        Err(status_error(status, &body))
    }
}

/// Map a non-2xx status to its error. `None` means success.
pub fn classify_status(status: u16, body: &str) -> Option<RagError> {
    if is_success(status) {
        None
    } else {
        Some(status_error(status, body))
    }
}

fn is_success(status: u16) -> bool {
    (200..=299).contains(&status)
}

/// Only statuses reported as `Upstream` carry the body
fn carries_excerpt(status: u16) -> bool {
    !matches!(status, 200..=299 | 401 | 403 | 500..=599)
}

fn status_error(status: u16, body: &str) -> RagError {
    match status {
        401 | 403 => RagError::Authentication { status },
        500..=599 => RagError::BackendUnavailable(format!("backend returned status {}", status)),
        _ => RagError::Upstream {
            status,
            body: excerpt(body),
        },
    }
}

fn join_endpoint(base_url: &str, query_path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let path = query_path.trim_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, path)
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() > BODY_EXCERPT_CHARS {
        let cut: String = trimmed.chars().take(BODY_EXCERPT_CHARS).collect();
        format!("{}...", cut)
    } else {
        trimmed.to_string()
    }
}
