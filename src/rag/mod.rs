//! RAG backend layer
//!
//! This module provides:
//! - Value types for queries, answers and cited sources
//! - RagBackend trait for backend abstraction
//! - RagClient, the HTTP implementation

pub mod client;
pub mod types;

pub use client::{RagBackend, RagClient, RagClientConfig, classify_status};
pub use types::{Credentials, QueryRequest, QueryResult, SourceRef};
