//! Shared utilities for integration tests.
//!
//! Backends are raw TCP listeners on ephemeral ports that speak just enough
//! HTTP/1.1 to record what the proxy sent and answer with a scripted response.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use edge_proxy::config::ProxyConfig;
use edge_proxy::http::HttpServer;
use edge_proxy::lifecycle::Shutdown;
use edge_proxy::load_balancer::Target;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A request as seen by a mock backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub target: String,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

/// What a mock backend does with one request.
pub enum Reply {
    Respond { status: u16, body: String },
    /// Close the socket without answering.
    Drop,
}

pub struct MockBackend {
    pub addr: SocketAddr,
    pub calls: Arc<AtomicUsize>,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn recorded(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a backend whose reply depends on the zero-based call index.
pub async fn spawn_backend<F>(reply: F) -> MockBackend
where
    F: Fn(usize, &RecordedRequest) -> Reply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));
    let reply = Arc::new(reply);

    let (task_calls, task_requests) = (calls.clone(), requests.clone());
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let (calls, requests, reply) = (task_calls.clone(), task_requests.clone(), reply.clone());
            tokio::spawn(async move {
                handle(socket, calls, requests, reply).await;
            });
        }
    });

    MockBackend {
        addr,
        calls,
        requests,
    }
}

/// Start a backend that always answers `200` with `body`.
pub async fn spawn_ok_backend(body: &'static str) -> MockBackend {
    spawn_backend(move |_, _| Reply::Respond {
        status: 200,
        body: body.to_string(),
    })
    .await
}

async fn handle<F>(
    mut socket: TcpStream,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    reply: Arc<F>,
) where
    F: Fn(usize, &RecordedRequest) -> Reply,
{
    let Some(request) = read_request(&mut socket).await else {
        return;
    };
    let index = calls.fetch_add(1, Ordering::SeqCst);
    requests.lock().unwrap().push(request.clone());

    match reply(index, &request) {
        Reply::Drop => drop(socket),
        Reply::Respond { status, body } => {
            // HEAD answers advertise the length but carry no payload.
            let payload = if request.method == "HEAD" { "" } else { body.as_str() };
            let response = format!(
                "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
                reason(status),
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = socket.read(&mut buf).await.ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buf[..n]);
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split(' ');
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();

    let headers: BTreeMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let mut body = data[header_end..].to_vec();
    while body.len() < length {
        let n = socket.read(&mut buf).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&buf[..n]);
    }

    Some(RecordedRequest {
        method,
        target,
        headers,
        body,
    })
}

/// An address nothing is listening on.
pub async fn unreachable_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Config with fast retries so failure paths finish quickly.
pub fn fast_retry_config() -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.retries.base_delay_ms = 5;
    config.retries.max_delay_ms = 50;
    config.timeouts.attempt_ms = 2_000;
    config
}

/// Serve the proxy on an ephemeral port with the given target URLs.
pub async fn start_proxy(config: ProxyConfig, urls: &[String]) -> (SocketAddr, Shutdown) {
    let targets = urls
        .iter()
        .enumerate()
        .map(|(i, url)| Arc::new(Target::parse(format!("BACKEND_{}", i + 1), url).unwrap()))
        .collect();

    let server = HttpServer::with_targets(config, targets);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
