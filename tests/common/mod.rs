//! In-process mock RAG backend shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// What the backend saw
#[derive(Clone, Default)]
pub struct Captured {
    hits: Arc<AtomicUsize>,
    auth_headers: Arc<Mutex<Vec<String>>>,
    bodies: Arc<Mutex<Vec<Value>>>,
}

impl Captured {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn auth_headers(&self) -> Vec<String> {
        self.auth_headers.lock().unwrap().clone()
    }

    pub fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }
}

#[derive(Clone)]
struct Reply {
    captured: Captured,
    status: StatusCode,
    body: String,
    delay: Duration,
}

async fn handle(State(reply): State<Reply>, headers: HeaderMap, body: String) -> (StatusCode, String) {
    reply.captured.hits.fetch_add(1, Ordering::SeqCst);
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        reply.captured.auth_headers.lock().unwrap().push(auth.to_string());
    }
    if let Ok(json) = serde_json::from_str::<Value>(&body) {
        reply.captured.bodies.lock().unwrap().push(json);
    }

    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }
    (reply.status, reply.body.clone())
}

pub struct MockBackend {
    pub base_url: String,
    pub captured: Captured,
}

impl MockBackend {
    /// Serve `POST /query` with a fixed reply
    pub async fn start(status: u16, body: &str) -> Self {
        Self::start_delayed(status, body, Duration::ZERO).await
    }

    pub async fn start_delayed(status: u16, body: &str, delay: Duration) -> Self {
        let captured = Captured::default();
        let reply = Reply {
            captured: captured.clone(),
            status: StatusCode::from_u16(status).unwrap(),
            body: body.to_string(),
            delay,
        };

        let app = Router::new().route("/query", post(handle)).with_state(reply);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            captured,
        }
    }
}

/// Sends a status line and headers promising a body, then never sends it
pub struct StalledBackend {
    pub base_url: String,
}

impl StalledBackend {
    pub async fn start(status_line: &str) -> Self {
        let head = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n{{",
            status_line
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let head = head.clone();
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let _ = socket.read(&mut buf).await;
                    let _ = socket.write_all(head.as_bytes()).await;
                    let _ = socket.flush().await;
                    tokio::time::sleep(Duration::from_secs(30)).await;
                });
            }
        });

        Self {
            base_url: format!("http://{}", addr),
        }
    }
}

pub const SAMPLE_ANSWER: &str = r#"{"answer":"A","sources":[{"document":"d.pdf","score":0.9,"content":"c"}]}"#;
