//! Test utilities & fixtures.
//! An in-memory scripted backend and a minimal in-process HTTP stub.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use lantern::adventure::{StoryBackend, TurnError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Backend returning queued replies in order and recording every call.
#[allow(dead_code)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, TurnError>>>,
    calls: Mutex<Vec<(String, String)>>,
    delay: Duration,
}

#[allow(dead_code)]
impl ScriptedBackend {
    pub fn new(replies: Vec<Result<String, TurnError>>) -> Arc<Self> {
        Self::with_delay(replies, Duration::ZERO)
    }

    pub fn with_delay(replies: Vec<Result<String, TurnError>>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
            delay,
        })
    }

    /// `(initData, action)` for every request received so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StoryBackend for ScriptedBackend {
    async fn step(&self, init_data: &str, action: &str) -> Result<String, TurnError> {
        self.calls
            .lock()
            .unwrap()
            .push((init_data.to_string(), action.to_string()));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TurnError::Transport("script exhausted".into())))
    }
}

/// What the HTTP stub answers with.
#[allow(dead_code)]
#[derive(Clone)]
pub enum StubReply {
    Json { status: u16, body: String },
    /// Accept the connection and never answer.
    Hang,
}

/// Serve `reply` to every connection on a random local port.
/// Returns the base URL and the captured request bodies.
#[allow(dead_code)]
pub async fn spawn_http_stub(reply: StubReply) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().unwrap();
    let bodies = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&bodies);

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let reply = reply.clone();
            let captured = Arc::clone(&captured);
            tokio::spawn(async move {
                let body = read_request_body(&mut socket).await;
                captured.lock().unwrap().push(body);
                match reply {
                    StubReply::Json { status, body } => {
                        let response = format!(
                            "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    }
                    StubReply::Hang => {
                        tokio::time::sleep(Duration::from_secs(30)).await;
                    }
                }
            });
        }
    });

    (format!("http://{}", addr), bodies)
}

async fn read_request_body(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return String::new(),
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let content_length = headers
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let end = buf.len().min(header_end + content_length);
    String::from_utf8_lossy(&buf[header_end..end]).into_owned()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
