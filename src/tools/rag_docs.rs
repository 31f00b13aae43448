//! rag_docs tool - Query the RAG backend and return the answer with its sources

use std::sync::Arc;

use async_trait::async_trait;

use super::{ParamSpec, ParamType, SharedConfig, Tool, ToolArgs, ToolOutput, required_str};
use crate::error::Result;
use crate::rag::{QueryRequest, QueryResult, RagBackend, SourceRef};

/// Source content longer than this is cut in the text rendering
const CONTENT_PREVIEW_CHARS: usize = 200;

pub struct RagDocsTool {
    config: SharedConfig,
    backend: Arc<dyn RagBackend>,
}

impl RagDocsTool {
    pub fn new(config: SharedConfig, backend: Arc<dyn RagBackend>) -> Self {
        Self { config, backend }
    }
}

#[async_trait]
impl Tool for RagDocsTool {
    fn name(&self) -> &'static str {
        "rag_docs"
    }

    fn description(&self) -> &'static str {
        "Performs an intelligent query on the RAG document database. \
         Searches documents and answers from their actual content, including references to the source documents."
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required(
            "query",
            ParamType::String,
            "The question to ask the RAG system",
        )]
    }

    async fn invoke(&self, args: ToolArgs) -> Result<ToolOutput> {
        // Configuration is checked before anything else, including input
        let credentials = self.config.credentials()?;
        let request = QueryRequest::new(required_str(&args, "query")?)?;

        log::info!("Executing RAG docs query: {}", request.query);
        let result = self.backend.query(&credentials, &request).await?;
        log::debug!("RAG docs query returned {} sources", result.sources.len());

        let text = render_query_result(&result, &request.query);
        Ok(ToolOutput::new(serde_json::to_value(&result)?, text))
    }
}

/// Human-readable rendering of an answer and its sources
pub fn render_query_result(result: &QueryResult, query: &str) -> String {
    let mut lines = vec![format!("Response: {}", result.answer)];

    if !result.sources.is_empty() {
        lines.push("Source Documents:".to_string());
        for (i, source) in result.sources.iter().enumerate() {
            lines.push(render_source(i + 1, source));
        }
    }

    lines.push(format!("Query: {}", query));
    lines.join("\n")
}

fn render_source(number: usize, source: &SourceRef) -> String {
    // Plain-text sources have neither a document name nor a score
    if source.document.is_empty() && !source.scored {
        return format!("  {}. {}", number, preview(&source.content));
    }

    let mut details = Vec::new();
    if !source.document.is_empty() {
        details.push(format!("Document: {}", source.document));
    }
    if source.scored {
        details.push(format!("(Score: {:.3})", source.score));
    }

    let mut entry = format!("  {}. {}", number, details.join(" "));
    if !source.content.is_empty() {
        entry.push_str(&format!("\n     Content: {}", preview(&source.content)));
    }
    entry
}

fn preview(content: &str) -> String {
    if content.chars().count() > CONTENT_PREVIEW_CHARS {
        let cut: String = content.chars().take(CONTENT_PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        content.to_string()
    }
}
