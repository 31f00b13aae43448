//! MCP method routing
//!
//! Maps JSON-RPC methods onto the tool registry and the static docs
//! resource. Tool failures are reported inside a successful `tools/call`
//! result with `isError: true`; JSON-RPC errors are reserved for protocol
//! problems.

use serde::Deserialize;
use serde_json::{Value, json};

use super::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::config::ServerConfig;
use crate::tools::{ToolRegistry, ToolResult};

pub const DOCS_URI: &str = "rag://docs";

const DOCS_TEXT: &str = "# RAG MCP Server

This MCP server provides access to RAG (Retrieval-Augmented Generation) features.

## Available Tools

### configure_rag
Stores the API token and base URL used by rag_docs.
Parameters:
- api_token (string, required): Bearer token for the RAG backend
- base_url (string, optional): Backend base URL

### rag_docs
Executes a RAG query and returns the answer with its source documents.
Parameters:
- query (string, required): The question to ask the RAG system

## Configuration
1. Set RAG_API_TOKEN to start pre-configured, or call configure_rag
2. Optionally set RAG_BASE_URL, RAG_QUERY_PATH and RAG_TIMEOUT_MS
3. The server speaks JSON-RPC over stdio
";

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct ReadResourceParams {
    uri: String,
}

pub struct McpHandler {
    registry: ToolRegistry,
    server: ServerConfig,
}

impl McpHandler {
    pub fn new(registry: ToolRegistry, server: ServerConfig) -> Self {
        Self { registry, server }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Handle one message. Notifications return `None`.
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            log::debug!("Notification: {}", request.method);
            return None;
        }

        let id = request.id.clone();
        let response = match request.method.as_str() {
            "initialize" => Ok(self.initialize(&request.params)),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.list_tools()),
            "tools/call" => self.call_tool(request.params).await,
            "resources/list" => Ok(self.list_resources()),
            "resources/read" => self.read_resource(request.params),
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Some(match response {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    fn initialize(&self, params: &Value) -> Value {
        let protocol_version = params["protocolVersion"]
            .as_str()
            .unwrap_or(&self.server.protocol_version);
        log::info!("Initializing session, protocol version {}", protocol_version);

        json!({
            "protocolVersion": protocol_version,
            "capabilities": {
                "tools": {},
                "resources": {},
            },
            "serverInfo": {
                "name": self.server.name,
                "version": env!("CARGO_PKG_VERSION"),
            },
        })
    }

    fn list_tools(&self) -> Value {
        log::info!("Listing available tools");
        json!({ "tools": self.registry.definitions() })
    }

    async fn call_tool(&self, params: Value) -> Result<Value, JsonRpcError> {
        let params: CallToolParams = serde_json::from_value(params)
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid tools/call params: {}", e)))?;

        log::info!("Handling tool call: {}", params.name);
        let result = self.registry.invoke(&params.name, params.arguments).await;
        Ok(call_result(&result))
    }

    fn list_resources(&self) -> Value {
        json!({
            "resources": [{
                "uri": DOCS_URI,
                "name": "RAG MCP Server Documentation",
                "description": "Documentation for using the RAG MCP server",
                "mimeType": "text/plain",
            }]
        })
    }

    fn read_resource(&self, params: Value) -> Result<Value, JsonRpcError> {
        let params: ReadResourceParams = serde_json::from_value(params)
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid resources/read params: {}", e)))?;

        log::info!("Reading resource: {}", params.uri);
        if params.uri != DOCS_URI {
            return Err(JsonRpcError::invalid_params(format!("Resource not found: {}", params.uri)));
        }

        Ok(json!({
            "contents": [{
                "uri": DOCS_URI,
                "mimeType": "text/plain",
                "text": DOCS_TEXT,
            }]
        }))
    }
}

fn call_result(result: &ToolResult) -> Value {
    json!({
        "content": [{ "type": "text", "text": result.text() }],
        "structuredContent": result.structured(),
        "isError": result.is_error(),
    })
}
