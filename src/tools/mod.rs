//! Tool system exposed to the host runtime
//!
//! Every tool has a unique name, a declared parameter list and an async
//! `invoke`. The registry dispatches by name and turns any error into a
//! structured `ToolFailure`, so nothing escapes the invocation boundary.

mod configure_rag;
mod rag_docs;
mod registry;
pub mod state;

pub use configure_rag::ConfigureRagTool;
pub use rag_docs::{RagDocsTool, render_query_result};
pub use registry::ToolRegistry;
pub use state::{ConnectionState, SharedConfig};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::{ErrorKind, RagError, Result};

/// Argument mapping handed to `Tool::invoke`
pub type ToolArgs = Map<String, Value>;

/// A tool the host can call
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (matches the host's tool call name)
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// Declared parameters
    fn params(&self) -> Vec<ParamSpec>;

    /// JSON Schema for input parameters
    fn input_schema(&self) -> Value {
        schema_from_params(&self.params())
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }

    /// Execute the tool
    async fn invoke(&self, args: ToolArgs) -> Result<ToolOutput>;
}

/// JSON type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
}

/// One named parameter in a tool's schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub param_type: ParamType,
    pub required: bool,
    pub description: &'static str,
    pub default: Option<String>,
}

impl ParamSpec {
    pub fn required(name: &'static str, param_type: ParamType, description: &'static str) -> Self {
        Self {
            name,
            param_type,
            required: true,
            description,
            default: None,
        }
    }

    pub fn optional(name: &'static str, param_type: ParamType, description: &'static str) -> Self {
        Self {
            name,
            param_type,
            required: false,
            description,
            default: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Build an object schema from a parameter list
pub fn schema_from_params(params: &[ParamSpec]) -> Value {
    let mut properties = Map::new();
    for p in params {
        let mut prop = json!({
            "type": p.param_type,
            "description": p.description,
        });
        if let Some(default) = &p.default {
            prop["default"] = json!(default);
        }
        properties.insert(p.name.to_string(), prop);
    }

    let required: Vec<&str> = params.iter().filter(|p| p.required).map(|p| p.name).collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Tool definition as listed to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Successful tool output
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// Tool-specific structured data
    pub payload: Value,
    /// Human-readable rendering of the payload
    pub text: String,
}

impl ToolOutput {
    pub fn new(payload: Value, text: impl Into<String>) -> Self {
        Self {
            payload,
            text: text.into(),
        }
    }
}

/// Structured failure returned to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolFailure {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl From<&RagError> for ToolFailure {
    fn from(err: &RagError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            status: err.status(),
        }
    }
}

/// Result from tool invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    Success(ToolOutput),
    Failure(ToolFailure),
}

impl ToolResult {
    pub fn from_error(err: &RagError) -> Self {
        ToolResult::Failure(ToolFailure::from(err))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolResult::Failure(_))
    }

    pub fn failure(&self) -> Option<&ToolFailure> {
        match self {
            ToolResult::Failure(f) => Some(f),
            ToolResult::Success(_) => None,
        }
    }

    /// Text shown to the end user or calling agent
    pub fn text(&self) -> String {
        match self {
            ToolResult::Success(output) => output.text.clone(),
            ToolResult::Failure(f) => format!("{}: {}", f.kind, f.message),
        }
    }

    /// Machine-readable payload (success data or `{kind, message, status?}`)
    pub fn structured(&self) -> Value {
        match self {
            ToolResult::Success(output) => output.payload.clone(),
            ToolResult::Failure(f) => serde_json::to_value(f).unwrap_or(Value::Null),
        }
    }
}

impl From<Result<ToolOutput>> for ToolResult {
    fn from(result: Result<ToolOutput>) -> Self {
        match result {
            Ok(output) => ToolResult::Success(output),
            Err(e) => ToolResult::Failure(ToolFailure::from(&e)),
        }
    }
}

/// Fetch a required string argument
pub fn required_str<'a>(args: &'a ToolArgs, name: &str) -> Result<&'a str> {
    match args.get(name) {
        None | Some(Value::Null) => Err(RagError::Validation(format!("{} parameter is required", name))),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(RagError::Validation(format!("{} must be a string", name))),
    }
}

/// Fetch an optional string argument
pub fn optional_str<'a>(args: &'a ToolArgs, name: &str) -> Result<Option<&'a str>> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(RagError::Validation(format!("{} must be a string", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: Value) -> ToolArgs {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_schema_from_params() {
        let schema = schema_from_params(&[
            ParamSpec::required("api_token", ParamType::String, "token"),
            ParamSpec::optional("base_url", ParamType::String, "url").with_default("http://x"),
        ]);

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["api_token"]["type"], "string");
        assert_eq!(schema["properties"]["base_url"]["default"], "http://x");
        assert_eq!(schema["required"], json!(["api_token"]));
    }

    #[test]
    fn test_required_str() {
        let a = args(json!({"query": "hi", "n": 3, "nothing": null}));
        assert_eq!(required_str(&a, "query").unwrap(), "hi");
        assert!(matches!(required_str(&a, "n"), Err(RagError::Validation(_))));
        assert!(matches!(required_str(&a, "nothing"), Err(RagError::Validation(_))));
        assert!(matches!(required_str(&a, "absent"), Err(RagError::Validation(_))));
    }

    #[test]
    fn test_optional_str() {
        let a = args(json!({"base_url": "http://h", "n": 1}));
        assert_eq!(optional_str(&a, "base_url").unwrap(), Some("http://h"));
        assert_eq!(optional_str(&a, "absent").unwrap(), None);
        assert!(optional_str(&a, "n").is_err());
    }

    #[test]
    fn test_tool_result_success() {
        let result = ToolResult::Success(ToolOutput::new(json!({"status": "configured"}), "done"));
        assert!(!result.is_error());
        assert_eq!(result.text(), "done");
        assert_eq!(result.structured()["status"], "configured");
    }

    #[test]
    fn test_tool_result_failure() {
        let err = RagError::Upstream {
            status: 404,
            body: "missing".to_string(),
        };
        let result = ToolResult::from(Err::<ToolOutput, _>(err));

        assert!(result.is_error());
        assert!(result.text().starts_with("UpstreamError: "));
        let structured = result.structured();
        assert_eq!(structured["kind"], "UpstreamError");
        assert_eq!(structured["status"], 404);
    }

    #[test]
    fn test_failure_omits_absent_status() {
        let result = ToolResult::from(Err::<ToolOutput, _>(RagError::NotConfigured));
        let structured = result.structured();
        assert_eq!(structured["kind"], "NotConfiguredError");
        assert!(structured.get("status").is_none());
    }
}
