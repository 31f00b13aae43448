//! Stdio server - newline-delimited JSON-RPC over any async reader/writer
//!
//! Provides:
//! - Line reader that parses requests and routes them to the handler
//! - One task per request, so a slow query never blocks `ping` or `configure_rag`
//! - `notifications/cancelled` support: the task is aborted and no response is sent
//! - A single writer task that serializes responses
//! - On EOF or a read failure, pending requests run to completion before the server returns

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{Mutex, mpsc};
use tokio::task::{AbortHandle, JoinSet};

use super::handler::McpHandler;
use super::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId};
use crate::error::Result;

const CANCELLED_METHOD: &str = "notifications/cancelled";

/// Channel capacity for outgoing responses
const RESPONSE_CHANNEL_CAPACITY: usize = 64;

type InFlight = Arc<Mutex<HashMap<RequestId, AbortHandle>>>;

pub struct StdioServer {
    handler: Arc<McpHandler>,
}

impl StdioServer {
    pub fn new(handler: McpHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    /// Serve on the process stdin/stdout
    pub async fn serve_stdio(&self) -> Result<()> {
        self.run(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve until the reader hits EOF or fails
    pub async fn run<R, W>(&self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<JsonRpcResponse>(RESPONSE_CHANNEL_CAPACITY);
        let writer_task = tokio::spawn(write_responses(writer, rx));
        let in_flight: InFlight = Arc::new(Mutex::new(HashMap::new()));
        let mut tasks = JoinSet::new();

        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        let read_result = loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break Ok(()),
                Ok(_) => {}
                Err(e) => {
                    log::error!("Failed to read input: {}", e);
                    break Err(e);
                }
            }
            while tasks.try_join_next().is_some() {}

            let request = match decode_line(&buf) {
                Decoded::Empty => continue,
                Decoded::Request(request) => request,
                Decoded::Reject(response) => {
                    if tx.send(response).await.is_err() {
                        break Ok(());
                    }
                    continue;
                }
            };

            if request.method == CANCELLED_METHOD {
                cancel(&in_flight, &request).await;
                continue;
            }

            let Some(id) = request.id.clone() else {
                // Notifications are handled inline and never answered
                let _ = self.handler.handle(request).await;
                continue;
            };

            let handler = Arc::clone(&self.handler);
            let tx = tx.clone();
            let registry = Arc::clone(&in_flight);
            let task_id = id.clone();

            // Lock across spawn+insert so the task cannot remove itself first
            let mut guard = in_flight.lock().await;
            let handle = tasks.spawn(async move {
                let response = handler.handle(request).await;
                release(&mut *registry.lock().await, &task_id);
                if let Some(response) = response {
                    let _ = tx.send(response).await;
                }
            });
            if let Some(previous) = guard.insert(id.clone(), handle) {
                log::warn!("Request id {} reused while still in flight", id);
                previous.abort();
            }
            drop(guard);
        };

        // In-flight calls are bounded by the backend timeout
        log::info!("Input closed, waiting for {} in-flight requests", tasks.len());
        while tasks.join_next().await.is_some() {}

        drop(tx);
        let written = match writer_task.await {
            Ok(result) => result,
            Err(e) => {
                log::error!("Writer task failed: {}", e);
                Ok(())
            }
        };
        read_result?;
        written
    }
}

enum Decoded {
    Empty,
    Request(JsonRpcRequest),
    Reject(JsonRpcResponse),
}

/// Turn one raw input line into a request or the error reply it deserves
fn decode_line(raw: &[u8]) -> Decoded {
    let text = match std::str::from_utf8(raw) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("Input line is not UTF-8: {}", e);
            return Decoded::Reject(JsonRpcResponse::error(
                None,
                JsonRpcError::parse_error(format!("Parse error: {}", e)),
            ));
        }
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Decoded::Empty;
    }

    let value = match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Unparseable message: {}", e);
            return Decoded::Reject(JsonRpcResponse::error(
                None,
                JsonRpcError::parse_error(format!("Parse error: {}", e)),
            ));
        }
    };

    let id = value
        .get("id")
        .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());
    match serde_json::from_value::<JsonRpcRequest>(value) {
        Ok(request) => Decoded::Request(request),
        Err(e) => {
            log::warn!("Invalid request: {}", e);
            Decoded::Reject(JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request(format!("Invalid request: {}", e)),
            ))
        }
    }
}

/// Drop the in-flight entry for `id` if it still belongs to the calling task
fn release(in_flight: &mut HashMap<RequestId, AbortHandle>, id: &RequestId) {
    let owned = match (in_flight.get(id), tokio::task::try_id()) {
        (Some(handle), Some(current)) => handle.id() == current,
        _ => false,
    };
    if owned {
        in_flight.remove(id);
    }
}

async fn cancel(in_flight: &InFlight, request: &JsonRpcRequest) {
    let Ok(id) = serde_json::from_value::<RequestId>(request.params["requestId"].clone()) else {
        log::warn!("Cancellation without a usable requestId");
        return;
    };

    match in_flight.lock().await.remove(&id) {
        Some(handle) => {
            log::info!("Cancelling request {}", id);
            handle.abort();
        }
        None => log::debug!("Cancellation for unknown or finished request {}", id),
    }
}

async fn write_responses<W>(mut writer: W, mut rx: mpsc::Receiver<JsonRpcResponse>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut line = serde_json::to_string(&response)?;
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::error::Result as RagResult;
    use crate::rag::{Credentials, QueryRequest, QueryResult, RagBackend};
    use crate::tools::{SharedConfig, ToolRegistry};
    use async_trait::async_trait;
    use serde_json::Value;
    use tokio::io::AsyncReadExt;

    struct NeverBackend;

    #[async_trait]
    impl RagBackend for NeverBackend {
        async fn query(&self, _credentials: &Credentials, _request: &QueryRequest) -> RagResult<QueryResult> {
            std::future::pending().await
        }
    }

    fn server() -> StdioServer {
        let shared = SharedConfig::new();
        shared.configure("tok", None).unwrap();
        let registry = ToolRegistry::standard(shared, Arc::new(NeverBackend));
        StdioServer::new(McpHandler::new(registry, ServerConfig::default()))
    }

    async fn run_script(script: &str) -> Vec<Value> {
        run_bytes(script.as_bytes()).await
    }

    async fn run_bytes(input: &[u8]) -> Vec<Value> {
        let (mut client, server_io) = tokio::io::duplex(64 * 1024);
        server().run(input, server_io).await.unwrap();

        let mut output = String::new();
        client.read_to_string(&mut output).await.unwrap();
        output.lines().map(|l| serde_json::from_str(l).unwrap()).collect()
    }

    #[tokio::test]
    async fn test_ping_and_notification() {
        let replies = run_script(concat!(
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n",
        ))
        .await;

        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0]["id"], 1);
        assert!(replies[0]["result"].is_object());
    }

    #[tokio::test]
    async fn test_parse_error() {
        let replies = run_script("this is not json\n\n").await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0]["id"], Value::Null);
        assert_eq!(replies[0]["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn test_non_utf8_line_gets_parse_error_and_server_continues() {
        let replies = run_bytes(b"\xff\xfe garbage\n{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n").await;

        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["id"], Value::Null);
        assert_eq!(replies[0]["error"]["code"], -32700);
        assert_eq!(replies[1]["id"], 1);
        assert!(replies[1]["result"].is_object());
    }

    #[tokio::test]
    async fn test_json_without_method_is_invalid_request() {
        let replies = run_script(concat!(
            r#"{"jsonrpc":"2.0","id":5}"#,
            "\n",
            r#"[1,2,3]"#,
            "\n",
        ))
        .await;

        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["id"], 5);
        assert_eq!(replies[0]["error"]["code"], -32600);
        assert_eq!(replies[1]["id"], Value::Null);
        assert_eq!(replies[1]["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn test_read_failure_still_drains_in_flight() {
        struct FailingReader {
            script: &'static [u8],
        }

        impl AsyncRead for FailingReader {
            fn poll_read(
                mut self: std::pin::Pin<&mut Self>,
                _cx: &mut std::task::Context<'_>,
                buf: &mut tokio::io::ReadBuf<'_>,
            ) -> std::task::Poll<std::io::Result<()>> {
                if self.script.is_empty() {
                    return std::task::Poll::Ready(Err(std::io::Error::other("pipe broke")));
                }
                let n = self.script.len().min(buf.remaining());
                buf.put_slice(&self.script[..n]);
                self.script = &self.script[n..];
                std::task::Poll::Ready(Ok(()))
            }
        }

        let reader = FailingReader {
            script: b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n",
        };
        let (mut client, server_io) = tokio::io::duplex(64 * 1024);
        let result = server().run(reader, server_io).await;
        assert!(matches!(result, Err(crate::error::RagError::Io(_))));

        let mut output = String::new();
        client.read_to_string(&mut output).await.unwrap();
        let reply: Value = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(reply["id"], 1);
    }

    #[tokio::test]
    async fn test_release_keeps_entry_owned_by_another_task() {
        let in_flight: InFlight = Arc::new(Mutex::new(HashMap::new()));
        let id = RequestId::Number(1);

        let newer = tokio::spawn(std::future::pending::<()>());
        in_flight.lock().await.insert(id.clone(), newer.abort_handle());

        let map = Arc::clone(&in_flight);
        let stale_id = id.clone();
        tokio::spawn(async move { release(&mut *map.lock().await, &stale_id) })
            .await
            .unwrap();
        assert!(in_flight.lock().await.contains_key(&id));

        let map = Arc::clone(&in_flight);
        let own_id = id.clone();
        let mut guard = in_flight.lock().await;
        let own = tokio::spawn(async move { release(&mut *map.lock().await, &own_id) });
        guard.insert(id.clone(), own.abort_handle());
        drop(guard);
        own.await.unwrap();
        assert!(!in_flight.lock().await.contains_key(&id));

        newer.abort();
    }

    #[tokio::test]
    async fn test_cancelled_call_gets_no_response() {
        let replies = run_script(concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"rag_docs","arguments":{"query":"x"}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/cancelled","params":{"requestId":1}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
            "\n",
        ))
        .await;

        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0]["id"], 2);
    }

    #[tokio::test]
    async fn test_cancel_for_unknown_request_is_ignored() {
        let replies = run_script(concat!(
            r#"{"jsonrpc":"2.0","method":"notifications/cancelled","params":{"requestId":"zzz"}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":"a","method":"ping"}"#,
            "\n",
        ))
        .await;

        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0]["id"], "a");
    }
}
