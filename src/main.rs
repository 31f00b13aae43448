use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

mod cli;

use cli::{Cli, Commands};
use rag_mcp::config::Config;
use rag_mcp::mcp::{McpHandler, StdioServer};
use rag_mcp::rag::{RagClient, RagClientConfig};
use rag_mcp::tools::{SharedConfig, ToolRegistry, ToolResult};

fn setup_logging(verbose: bool) -> Result<()> {
    let mut builder = env_logger::Builder::new();
    let rust_log = std::env::var("RUST_LOG").ok();
    match &rust_log {
        Some(filters) => {
            builder.parse_filters(filters);
        }
        None => {
            // Effective level is set through log::set_max_level below
            builder.filter_level(log::LevelFilter::Trace);
        }
    }

    // Stdout carries the protocol, so logs go to a file
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rag-mcp")
        .join("logs");
    let log_file = log_dir.join("rag-mcp.log");

    let file = fs::create_dir_all(&log_dir)
        .and_then(|_| fs::OpenOptions::new().create(true).append(true).open(&log_file));
    let destination = match file {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
            log_file.display().to_string()
        }
        Err(_) => {
            builder.target(env_logger::Target::Stderr);
            "stderr".to_string()
        }
    };

    builder.try_init().context("Failed to initialize logger")?;
    if rust_log.is_none() {
        log::set_max_level(if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        });
    }

    info!("Logging initialized, writing to: {}", destination);
    Ok(())
}

/// Config `log_level` applies only when neither RUST_LOG nor --verbose chose one
fn apply_config_log_level(cli: &Cli, config: &Config) {
    if cli.is_verbose() || std::env::var("RUST_LOG").is_ok() {
        return;
    }
    if let Some(level) = config.log_level.as_deref() {
        match log::LevelFilter::from_str(level) {
            Ok(filter) => log::set_max_level(filter),
            Err(_) => log::warn!("Ignoring unknown log_level '{}'", level),
        }
    }
}

fn build_registry(config: &Config) -> Result<ToolRegistry> {
    let shared = SharedConfig::from_config(config).context("Invalid RAG settings in config")?;
    let client = RagClient::new(RagClientConfig::from(&config.rag)).context("Failed to create RAG client")?;
    Ok(ToolRegistry::standard(shared, Arc::new(client)))
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    let registry = build_registry(config)?;

    match &cli.command {
        None | Some(Commands::Serve) => handle_serve_command(registry, config).await,
        Some(Commands::Query { text }) => handle_query_command(&registry, text).await,
        Some(Commands::Tools) => handle_tools_command(&registry),
    }
}

async fn handle_serve_command(registry: ToolRegistry, config: &Config) -> Result<()> {
    info!("Starting RAG MCP server on stdio");
    let server = StdioServer::new(McpHandler::new(registry, config.server.clone()));
    server.serve_stdio().await.context("Server failed")?;
    info!("Server stopped");
    Ok(())
}

async fn handle_query_command(registry: &ToolRegistry, text: &str) -> Result<()> {
    info!("One-shot query: {}", text);
    let result = registry.invoke("rag_docs", serde_json::json!({ "query": text })).await;

    match &result {
        ToolResult::Success(output) => {
            println!("{}", "RAG answer".green().bold());
            println!("{}", output.text);
            Ok(())
        }
        ToolResult::Failure(failure) => {
            eprintln!("{} {}", failure.kind.to_string().red().bold(), failure.message);
            Err(eyre!("Query failed: {}", failure.kind))
        }
    }
}

fn handle_tools_command(registry: &ToolRegistry) -> Result<()> {
    let defs = registry.definitions();
    println!("{}", serde_json::to_string_pretty(&defs)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging before anything else logs
    setup_logging(cli.is_verbose()).context("Failed to setup logging")?;

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    apply_config_log_level(&cli, &config);

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
