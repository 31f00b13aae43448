//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - serve: run the stdio tool server (default)
//! - query: run one rag_docs query and print the answer
//! - tools: print the tool definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rag-mcp - RAG document queries as host-callable tools
#[derive(Parser, Debug)]
#[command(name = "rag-mcp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Serve tools over stdio (default)
    Serve,

    /// Run a single query against the configured backend
    Query {
        /// The question to ask
        text: String,
    },

    /// Print tool definitions as JSON
    Tools,
}
