//! Scripted HTTP backend for exercising `BackendClient` over a real socket.
//!
//! Each route (`"GET /api/files"`, `"POST /api/chat"`, ...) owns a queue of
//! responses served in order; the last one repeats once the queue runs out.
//! Unknown routes get a 404. Every request is recorded when it is read, so
//! requests the client abandoned (timeouts) are counted too.
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use reqwest::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct MockResponse {
    status: u16,
    content_type: String,
    body: String,
    delay: Duration,
}

impl MockResponse {
    pub fn json(status: u16, body: &str) -> Self {
        Self::text(status, "application/json", body)
    }

    pub fn text(status: u16, content_type: &str, body: &str) -> Self {
        Self {
            status,
            content_type: content_type.to_string(),
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    /// Hold the response back for `delay` after the request was read.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

impl RecordedRequest {
    fn route(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

#[derive(Debug, Default)]
struct Script {
    routes: HashMap<String, (Vec<MockResponse>, usize)>,
    requests: Vec<RecordedRequest>,
}

impl Script {
    fn respond(&mut self, request: RecordedRequest) -> MockResponse {
        let route = request.route();
        self.requests.push(request);
        match self.routes.get_mut(&route) {
            Some((queue, next)) if !queue.is_empty() => {
                let index = (*next).min(queue.len() - 1);
                *next += 1;
                queue[index].clone()
            }
            _ => MockResponse::json(404, r#"{"error": "no such route"}"#),
        }
    }
}

pub struct MockBackend {
    addr: SocketAddr,
    script: Arc<Mutex<Script>>,
    task: JoinHandle<()>,
}

impl MockBackend {
    pub async fn start(routes: Vec<(&str, Vec<MockResponse>)>) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let script = Arc::new(Mutex::new(Script {
            routes: routes
                .into_iter()
                .map(|(route, queue)| (route.to_string(), (queue, 0)))
                .collect(),
            requests: Vec::new(),
        }));

        let shared = Arc::clone(&script);
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let script = Arc::clone(&shared);
                tokio::spawn(async move {
                    // The client may hang up first (timeouts); nothing to report.
                    let _ = serve_connection(stream, script).await;
                });
            }
        });

        Ok(Self { addr, script, task })
    }

    /// Base URL to hand to `BackendClientConfig::new`.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Number of requests received for `route`, e.g. `"POST /api/chat"`.
    pub fn hits(&self, route: &str) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.route() == route)
            .count()
    }

    /// Poll until `route` has been hit `count` times, giving up after two seconds.
    pub async fn wait_for_hits(&self, route: &str, count: usize) -> bool {
        for _ in 0..400 {
            if self.hits(route) >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        false
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve_connection(mut stream: TcpStream, script: Arc<Mutex<Script>>) -> io::Result<()> {
    let request = read_request(&mut stream).await?;
    let response = script
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .respond(request);

    if !response.delay.is_zero() {
        tokio::time::sleep(response.delay).await;
    }

    let reason = StatusCode::from_u16(response.status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown");
    let head = format!(
        "HTTP/1.1 {} {reason}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        response.content_type,
        response.body.len()
    );
    stream.write_all(head.as_bytes()).await?;
    stream.write_all(response.body.as_bytes()).await?;
    stream.shutdown().await
}

async fn read_request(stream: &mut TcpStream) -> io::Result<RecordedRequest> {
    let mut buf: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let mut request_line = head.lines().next().unwrap_or("").split_whitespace();
    let method = request_line.next().unwrap_or("").to_string();
    let path = request_line.next().unwrap_or("").to_string();
    let body = String::from_utf8_lossy(&buf[header_end..header_end + content_length]).into_owned();

    Ok(RecordedRequest { method, path, body })
}
