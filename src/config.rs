use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Placeholder used when neither config nor `configure_rag` names a backend
pub const DEFAULT_BASE_URL: &str = "https://your-rag-service.com/api-path";

pub const ENV_API_TOKEN: &str = "RAG_API_TOKEN";
pub const ENV_BASE_URL: &str = "RAG_BASE_URL";
pub const ENV_TIMEOUT_MS: &str = "RAG_TIMEOUT_MS";
pub const ENV_QUERY_PATH: &str = "RAG_QUERY_PATH";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub rag: RagConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub api_token: Option<String>,
    pub base_url: String,
    pub query_path: String,
    pub timeout_ms: u64,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            query_path: "query".to_string(),
            timeout_ms: 30000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub name: String,
    pub protocol_version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            protocol_version: "2025-06-18".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            rag: RagConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain, then overlay the environment
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file(config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn load_file(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Overlay `RAG_*` settings. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(token) = get(ENV_API_TOKEN) {
            self.rag.api_token = Some(token);
        }
        if let Some(url) = get(ENV_BASE_URL) {
            self.rag.base_url = url;
        }
        if let Some(path) = get(ENV_QUERY_PATH) {
            self.rag.query_path = path;
        }
        if let Some(raw) = get(ENV_TIMEOUT_MS) {
            match raw.parse::<u64>() {
                Ok(ms) => self.rag.timeout_ms = ms,
                Err(_) => log::warn!("Ignoring non-numeric {}={}", ENV_TIMEOUT_MS, raw),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.rag.timeout_ms == 0 {
            return Err(eyre!("rag.timeout_ms must be greater than zero"));
        }
        Ok(())
    }

    /// Token from config or environment, if any
    pub fn startup_token(&self) -> Option<&str> {
        self.rag.api_token.as_deref().filter(|t| !t.trim().is_empty())
    }
}
