#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use pht_services::clients::catalog::CatalogClient;
use pht_services::error::{PhtError, PhtResult};
use pht_services::models::coordinates::SexagesimalPosition;
use pht_services::services::clock::{Clock, FixedClock};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Instant all fixed-clock tests run at.
pub fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 1, 17, 10, 30, 0).unwrap()))
}

/// Catalog answering from a fixed table, or failing every query.
pub struct StubCatalog {
    name: String,
    entries: HashMap<String, SexagesimalPosition>,
    unreachable: bool,
}

impl StubCatalog {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: HashMap::new(),
            unreachable: false,
        }
    }

    pub fn with(mut self, object: &str, ra: &str, dec: &str) -> Self {
        self.entries
            .insert(object.to_string(), SexagesimalPosition::new(ra, dec));
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }
}

#[async_trait]
impl CatalogClient for StubCatalog {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query_object(&self, name: &str) -> PhtResult<Option<SexagesimalPosition>> {
        if self.unreachable {
            return Err(PhtError::upstream(format!("{} is unreachable", self.name)));
        }
        Ok(self.entries.get(name).cloned())
    }
}

/// Local HTTP server answering every connection with one canned reply and
/// recording the request line of each request it saw.
pub struct CannedServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl CannedServer {
    pub async fn start(status: u16, body: &str) -> Self {
        Self::start_at(status, body, "").await
    }

    /// Like [`CannedServer::start`], with `prefix` appended to the base URL.
    pub async fn start_at(status: u16, body: &str, prefix: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();
        let reply = format!(
            "HTTP/1.1 {} Canned\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let head = read_request_head(&mut stream).await;
                if let Some(line) = head.lines().next() {
                    seen.lock().unwrap().push(line.to_string());
                }
                let _ = stream.write_all(reply.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });
        Self {
            base_url: format!("http://{}{}", addr, prefix),
            requests,
        }
    }

    pub fn request_lines(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Read the request head, then drain a `content-length` body so the client
/// never sees a reset.
async fn read_request_head(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return String::from_utf8_lossy(&buf).into_owned(),
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };
    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let length = head
        .lines()
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < head_end + length {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    head
}

/// Base URL of a port nothing listens on.
pub async fn refused_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
