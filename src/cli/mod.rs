//! CLI module for rag-mcp - command-line interface and subcommands.
//!
//! Serving over stdio is the default; `query` and `tools` are for poking at
//! a backend by hand.

pub mod commands;

pub use commands::{Cli, Commands};
