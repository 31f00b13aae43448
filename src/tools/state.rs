//! Shared connection state for the RAG tools
//!
//! One `SharedConfig` is created at startup and handed to both tools.
//! `configure_rag` is the only writer; `rag_docs` takes a snapshot per call,
//! so a reconfiguration never changes a request already in flight.

use std::sync::{Arc, PoisonError, RwLock};

use reqwest::Url;

use crate::config::{Config, DEFAULT_BASE_URL};
use crate::error::{RagError, Result};
use crate::rag::Credentials;

/// Lifecycle: `Unconfigured` until the first successful configure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Unconfigured,
    Configured(Credentials),
}

#[derive(Debug, Clone)]
pub struct SharedConfig {
    inner: Arc<RwLock<ConnectionState>>,
    default_base_url: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedConfig {
    /// Unconfigured, with the placeholder default base URL
    pub fn new() -> Self {
        Self::with_default_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_default_base_url(default_base_url: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ConnectionState::Unconfigured)),
            default_base_url: default_base_url.into(),
        }
    }

    /// Start state from loaded config: configured when a token is present
    pub fn from_config(config: &Config) -> Result<Self> {
        let shared = Self::with_default_base_url(config.rag.base_url.clone());
        if let Some(token) = config.startup_token() {
            shared.configure(token, None)?;
            log::info!("RAG tools pre-configured from environment, base URL: {}", shared.default_base_url);
        }
        Ok(shared)
    }

    /// Validate and store new credentials, replacing any previous ones
    pub fn configure(&self, api_token: &str, base_url: Option<&str>) -> Result<Credentials> {
        let api_token = api_token.trim();
        if api_token.is_empty() {
            return Err(RagError::Validation("api_token parameter is required".to_string()));
        }

        let base_url = match base_url.map(str::trim).filter(|u| !u.is_empty()) {
            Some(url) => url,
            None => self.default_base_url.as_str(),
        };
        validate_base_url(base_url)?;

        let credentials = Credentials::new(api_token, base_url);
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *state = ConnectionState::Configured(credentials.clone());
        Ok(credentials)
    }

    /// Snapshot of the current credentials
    pub fn credentials(&self) -> Result<Credentials> {
        match self.state() {
            ConnectionState::Configured(credentials) => Ok(credentials),
            ConnectionState::Unconfigured => Err(RagError::NotConfigured),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_configured(&self) -> bool {
        matches!(self.state(), ConnectionState::Configured(_))
    }

    pub fn default_base_url(&self) -> &str {
        &self.default_base_url
    }
}

fn validate_base_url(base_url: &str) -> Result<()> {
    let url = Url::parse(base_url).map_err(|e| RagError::Validation(format!("invalid base_url '{}': {}", base_url, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(RagError::Validation(format!(
            "base_url must use http or https, got '{}'",
            other
        ))),
    }
}
