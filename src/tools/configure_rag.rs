//! configure_rag tool - Store the API token and base URL for later queries

use async_trait::async_trait;
use serde_json::json;

use super::{ParamSpec, ParamType, SharedConfig, Tool, ToolArgs, ToolOutput, optional_str, required_str};
use crate::error::Result;

pub struct ConfigureRagTool {
    config: SharedConfig,
}

impl ConfigureRagTool {
    pub fn new(config: SharedConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Tool for ConfigureRagTool {
    fn name(&self) -> &'static str {
        "configure_rag"
    }

    fn description(&self) -> &'static str {
        "Configure RAG tools with API token and base URL"
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required("api_token", ParamType::String, "RAG API token for authentication"),
            ParamSpec::optional(
                "base_url",
                ParamType::String,
                "Base URL for RAG API (optional, defaults to the configured RAG_BASE_URL)",
            )
            .with_default(self.config.default_base_url()),
        ]
    }

    async fn invoke(&self, args: ToolArgs) -> Result<ToolOutput> {
        let api_token = required_str(&args, "api_token")?;
        let base_url = optional_str(&args, "base_url")?;

        let credentials = self.config.configure(api_token, base_url)?;
        log::info!("RAG tools configured with base URL: {}", credentials.base_url);

        Ok(ToolOutput::new(
            json!({
                "status": "configured",
                "base_url": credentials.base_url,
            }),
            format!("RAG tools configured successfully with base URL: {}", credentials.base_url),
        ))
    }
}
