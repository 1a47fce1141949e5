//! In-process HTTP stand-in for the backend, used by async tests.

use crate::core::client::ResiliaClient;
use crate::core::gateway::RequestGateway;
use crate::core::session::{MemoryStorage, PersistentSession, SessionStore};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// A request as the mock server received it.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body should be JSON")
    }
}

/// Canned response served for one request.
#[derive(Debug, Clone)]
pub struct MockResponse {
    status: u16,
    reason: &'static str,
    body: String,
}

impl MockResponse {
    pub fn json(body: serde_json::Value) -> Self {
        Self {
            status: 200,
            reason: "OK",
            body: body.to_string(),
        }
    }

    pub fn status(status: u16, reason: &'static str, body: &str) -> Self {
        Self {
            status,
            reason,
            body: body.to_string(),
        }
    }
}

/// Serves `responses` in order, one connection per request, then stops.
pub struct MockServer {
    pub base_url: String,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
    task: JoinHandle<Result<(), String>>,
}

impl MockServer {
    pub async fn start(responses: Vec<MockResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let addr = listener.local_addr().expect("local addr should resolve");
        let captured = Arc::new(Mutex::new(Vec::new()));
        let captured_for_server = Arc::clone(&captured);

        let task = tokio::spawn(async move {
            for response in responses {
                let (mut stream, _) = listener.accept().await.map_err(|err| err.to_string())?;
                let request = read_http_request(&mut stream).await?;
                captured_for_server
                    .lock()
                    .map_err(|err| err.to_string())?
                    .push(request);

                let raw = format!(
                    "HTTP/1.1 {} {}\r\ncontent-type: application/json\r\nconnection: close\r\ncontent-length: {}\r\n\r\n{}",
                    response.status,
                    response.reason,
                    response.body.len(),
                    response.body
                );
                stream
                    .write_all(raw.as_bytes())
                    .await
                    .map_err(|err| err.to_string())?;
                stream.shutdown().await.map_err(|err| err.to_string())?;
            }
            Ok::<(), String>(())
        });

        Self {
            base_url: format!("http://{addr}/api"),
            captured,
            task,
        }
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().expect("capture lock").clone()
    }

    /// Waits until every canned response has been served.
    pub async fn finish(mut self) -> Vec<CapturedRequest> {
        (&mut self.task)
            .await
            .expect("mock server task should join")
            .expect("mock server should succeed");
        self.requests()
    }
}

/// Session on in-memory storage plus a gateway pointed at `base_url`.
pub fn memory_backend(base_url: &str) -> (Arc<MemoryStorage>, Arc<dyn SessionStore>, RequestGateway) {
    let storage = Arc::new(MemoryStorage::new());
    let session: Arc<dyn SessionStore> = Arc::new(PersistentSession::new(storage.clone()));
    let client = reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("client should build");
    let gateway = RequestGateway::with_client(client, base_url)
        .with_interceptor(crate::core::gateway::BearerAuth::new(Arc::clone(&session)));
    (storage, session, gateway)
}

/// A full client on in-memory storage, for command-level tests.
pub fn memory_client(base_url: &str) -> (Arc<MemoryStorage>, ResiliaClient) {
    let (storage, session, gateway) = memory_backend(base_url);
    let client = ResiliaClient::from_parts(gateway, session, storage.clone());
    (storage, client)
}

async fn read_http_request(stream: &mut TcpStream) -> Result<CapturedRequest, String> {
    let mut buffer = Vec::new();
    let mut header_end = None;
    while header_end.is_none() {
        let mut chunk = [0_u8; 1024];
        let read = stream
            .read(&mut chunk)
            .await
            .map_err(|err| err.to_string())?;
        if read == 0 {
            return Err("Unexpected EOF while reading HTTP headers".to_string());
        }
        buffer.extend_from_slice(&chunk[..read]);
        header_end = buffer
            .windows(4)
            .position(|window| window == b"\r\n\r\n")
            .map(|index| index + 4);
    }

    let header_end = header_end.expect("header end should exist");
    let header_text =
        std::str::from_utf8(&buffer[..header_end]).map_err(|err| err.to_string())?;
    let mut lines = header_text.split("\r\n").filter(|line| !line.is_empty());
    let request_line = lines
        .next()
        .ok_or_else(|| "Missing HTTP request line".to_string())?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut headers = Vec::new();
    let mut content_length = 0_usize;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().to_string();
        if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse::<usize>().map_err(|err| err.to_string())?;
        }
        headers.push((name.to_string(), value));
    }

    let mut body = buffer[header_end..].to_vec();
    while body.len() < content_length {
        let mut chunk = vec![0_u8; content_length - body.len()];
        let read = stream
            .read(&mut chunk)
            .await
            .map_err(|err| err.to_string())?;
        if read == 0 {
            return Err("Unexpected EOF while reading HTTP body".to_string());
        }
        body.extend_from_slice(&chunk[..read]);
    }
    body.truncate(content_length);

    Ok(CapturedRequest {
        method,
        path,
        headers,
        body,
    })
}
