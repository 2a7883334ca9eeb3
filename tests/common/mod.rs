//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use genai_broker::config::{BrokerConfig, SecretSource};
use genai_broker::observability::{Instrumentation, MemorySink, NoopProbe};
use genai_broker::secrets::names;
use genai_broker::Broker;

pub const GEMINI_KEY: &str = "gemini-test-key";
pub const SEARCH_KEY: &str = "search-test-key";
pub const ENGINE_ID: &str = "engine-test-id";
pub const YOUTUBE_KEY: &str = "youtube-test-key";

/// A mock upstream and the request lines it has received.
pub struct MockBackend {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Request lines (`GET /path?query HTTP/1.1`) in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// Start a mock backend answering every request with a fixed response.
pub async fn start_mock_backend(status: u16, body: &'static str) -> MockBackend {
    start_programmable_backend(move |_| async move { (status, body.to_string()) }).await
}

/// Start a programmable mock backend; `f` sees the request line.
pub async fn start_programmable_backend<F, Fut>(f: F) -> MockBackend
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let seen = requests.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let seen = seen.clone();
                    tokio::spawn(async move {
                        let Some(request_line) = read_request(&mut socket).await else {
                            return;
                        };
                        seen.lock().unwrap().push(request_line.clone());
                        let (status, body) = f(request_line).await;
                        let response = format!(
                            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            reason(status),
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockBackend { addr, requests }
}

/// Read the head and any declared body; returns the request line.
async fn read_request(socket: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < head_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    head.lines().next().map(str::to_string)
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Port that refuses connections.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn write_secrets(dir: &Path) {
    for (name, value) in [
        (names::GEMINI_API_KEY, GEMINI_KEY),
        (names::SEARCH_API_KEY, SEARCH_KEY),
        (names::SEARCH_ENGINE_ID, ENGINE_ID),
        (names::YOUTUBE_API_KEY, YOUTUBE_KEY),
    ] {
        std::fs::write(dir.join(name), format!("{}\n", value)).unwrap();
    }
}

/// Config pointing every upstream at `base_url`, with short backoff.
pub fn test_config(base_url: &str, secrets_dir: &Path) -> BrokerConfig {
    let mut config = BrokerConfig::default();
    config.upstream.gemini_base_url = base_url.to_string();
    config.upstream.custom_search_url = format!("{}/customsearch/v1", base_url);
    config.upstream.youtube_base_url = format!("{}/youtube/v3", base_url);
    config.upstream.request_timeout_secs = 5;
    config.upstream.connect_timeout_secs = 1;
    config.secrets.source = SecretSource::Dir;
    config.secrets.dir = Some(secrets_dir.to_string_lossy().into_owned());
    config.retries.min_timeout_ms = 10;
    config.retries.max_timeout_ms = 50;
    config
}

/// Broker whose structured records land in the returned sink.
pub fn recording_broker(config: &BrokerConfig) -> (Broker, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let instrumentation = Arc::new(Instrumentation::new(sink.clone(), Arc::new(NoopProbe)));
    let broker = Broker::with_instrumentation(config, instrumentation).unwrap();
    (broker, sink)
}
