//! Tool registry - manages tool registration and dispatch

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::{ConfigureRagTool, RagDocsTool, SharedConfig, Tool, ToolArgs, ToolDefinition, ToolResult};
use crate::error::RagError;
use crate::rag::RagBackend;

/// Name-keyed dispatch over the registered tools
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Registry with `configure_rag` and `rag_docs` sharing one config
    pub fn standard(config: SharedConfig, backend: Arc<dyn RagBackend>) -> Self {
        let mut registry = Self::new();
        registry.add_tool(Box::new(ConfigureRagTool::new(config.clone())));
        registry.add_tool(Box::new(RagDocsTool::new(config, backend)));
        registry
    }

    /// Create an empty registry (for custom tool sets)
    pub fn new() -> Self {
        Self { tools: HashMap::new() }
    }

    pub fn add_tool(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Definitions sorted by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().map(|t| t.definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Invoke a tool by name. Never fails: errors become `ToolResult::Failure`.
    pub async fn invoke(&self, name: &str, args: Value) -> ToolResult {
        let Some(tool) = self.tools.get(name) else {
            log::warn!("Unknown tool requested: {}", name);
            return ToolResult::from_error(&RagError::UnknownTool(format!(
                "'{}'. Available tools: {}",
                name,
                self.tool_names().join(", ")
            )));
        };

        let args = match args {
            Value::Object(map) => map,
            Value::Null => ToolArgs::new(),
            other => {
                return ToolResult::from_error(&RagError::Validation(format!(
                    "arguments must be an object, got {}",
                    json_type(&other)
                )));
            }
        };

        let result = ToolResult::from(tool.invoke(args).await);
        if let Some(failure) = result.failure() {
            log::error!("Tool {} failed: {}: {}", name, failure.kind, failure.message);
        }
        result
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Sorted tool names
    pub fn tool_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
