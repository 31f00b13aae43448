//! Value types exchanged with the RAG backend
//!
//! `QueryRequest` is what goes out, `QueryResult` is what comes back. The
//! backend body is parsed through private raw types so tolerant decoding
//! (aliases, bare-string sources) stays out of the public shape.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Token and endpoint used for one outbound call
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_token: String,
    pub base_url: String,
}

impl Credentials {
    pub fn new(api_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            base_url: base_url.into(),
        }
    }

    /// Value for the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.api_token)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Body of the outbound POST
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

impl QueryRequest {
    /// Build a request, rejecting empty or whitespace-only queries
    pub fn new(query: &str) -> Result<Self> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(RagError::Validation("query must not be empty".to_string()));
        }
        Ok(Self {
            query: trimmed.to_string(),
        })
    }
}

/// A cited document fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub document: String,
    /// Relevance in [0,1] as reported by the backend; never rescored here
    pub score: f64,
    pub content: String,
    /// False when the backend sent no score and `score` is the 0.0 fill-in
    #[serde(skip_serializing, default = "score_present")]
    pub scored: bool,
}

fn score_present() -> bool {
    true
}

impl SourceRef {
    pub fn new(document: impl Into<String>, score: f64, content: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            score,
            content: content.into(),
            scored: true,
        }
    }
}

/// Answer plus sources, in backend order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

impl QueryResult {
    /// Decode a 2xx body. Missing or null `sources` is an empty list.
    pub fn from_body(body: &str) -> Result<Self> {
        let raw: RawResponse =
            serde_json::from_str(body).map_err(|e| RagError::BadResponse(format!("{}", e)))?;

        let sources = raw
            .sources
            .unwrap_or_default()
            .into_iter()
            .map(SourceRef::from)
            .collect();

        Ok(Self {
            answer: raw.answer,
            sources,
        })
    }
}

#[derive(Deserialize)]
struct RawResponse {
    #[serde(alias = "response")]
    answer: String,
    #[serde(default)]
    sources: Option<Vec<RawSource>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSource {
    Text(String),
    Ref {
        #[serde(default)]
        document: String,
        #[serde(default)]
        score: Option<f64>,
        #[serde(default)]
        content: String,
    },
}

impl From<RawSource> for SourceRef {
    fn from(raw: RawSource) -> Self {
        match raw {
            RawSource::Text(content) => SourceRef {
                document: String::new(),
                score: 0.0,
                content,
                scored: false,
            },
            RawSource::Ref {
                document,
                score,
                content,
            } => SourceRef {
                document,
                score: score.unwrap_or_default(),
                content,
                scored: score.is_some(),
            },
        }
    }
}
