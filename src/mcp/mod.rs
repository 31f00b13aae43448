//! Host transport - JSON-RPC over stdio
//!
//! The host runtime discovers tools with `tools/list` and invokes them with
//! `tools/call`. Everything else here is session plumbing.

pub mod handler;
pub mod protocol;
pub mod server;

pub use handler::{DOCS_URI, McpHandler};
pub use protocol::{ErrorCode, JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId};
pub use server::StdioServer;
