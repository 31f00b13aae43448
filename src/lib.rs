//! rag-mcp - RAG document queries as host-callable tools
//!
//! Exposes `configure_rag` and `rag_docs` over a JSON-RPC stdio transport.
//! Queries are forwarded to a remote RAG backend with bearer authentication;
//! every backend response or failure is mapped onto a typed result.

pub mod config;
pub mod error;
pub mod mcp;
pub mod rag;
pub mod tools;

pub use error::{ErrorKind, RagError, Result};
