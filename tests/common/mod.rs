//! Shared test infrastructure: a scripted HTTP file server for flaky-network scenarios
//! and catalog fixtures.

#![allow(dead_code)]

use ccpkg::config::Endpoints;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// What the server does with one incoming request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Read the request and close the connection without answering
    Drop,
    /// Answer as `Serve` would, but close after this many body bytes
    Truncate(usize),
    /// Answer with this status and an empty body
    Status(u16),
    /// Serve the file, honouring `Range`
    Serve,
    /// Answer 200 with the whole file, even for a range request
    IgnoreRange,
}

/// File server that follows a script of steps, one per request, then serves normally
pub struct ScriptedServer {
    addr: SocketAddr,
    ranges: Arc<Mutex<Vec<Option<u64>>>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl ScriptedServer {
    pub async fn start(content: Vec<u8>, script: Vec<Step>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let content = Arc::new(content);
        let script = Arc::new(Mutex::new(VecDeque::from(script)));
        let ranges = Arc::new(Mutex::new(Vec::new()));
        let recorded = ranges.clone();

        let handle = tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let Some(range) = read_request(&mut stream).await else {
                    continue;
                };
                recorded.lock().unwrap().push(range);
                let step = script.lock().unwrap().pop_front().unwrap_or(Step::Serve);
                let _ = respond(&mut stream, &content, range, step).await;
            }
        });

        Self {
            addr,
            ranges,
            _handle: handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Range start of every request received so far (`None` when no `Range` header was sent)
    pub fn ranges(&self) -> Vec<Option<u64>> {
        self.ranges.lock().unwrap().clone()
    }

    pub fn requests(&self) -> usize {
        self.ranges.lock().unwrap().len()
    }
}

/// Read request headers and return the `Range` start offset, if any
async fn read_request(stream: &mut TcpStream) -> Option<Option<u64>> {
    let mut request = Vec::new();
    let mut buffer = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buffer).await.ok()?;
        if n == 0 {
            return None;
        }
        request.extend_from_slice(&buffer[..n]);
    }

    let text = String::from_utf8_lossy(&request).to_ascii_lowercase();
    let range = text
        .lines()
        .find_map(|line| line.strip_prefix("range:"))
        .and_then(|value| value.trim().strip_prefix("bytes="))
        .and_then(|value| value.trim_end_matches('-').parse().ok());
    Some(range)
}

async fn respond(
    stream: &mut TcpStream,
    content: &[u8],
    range: Option<u64>,
    step: Step,
) -> std::io::Result<()> {
    let len = content.len();
    let start = range.map_or(0, |r| r as usize);

    let (head, body): (String, &[u8]) = match step {
        Step::Drop => return stream.shutdown().await,
        Step::Status(code) => (
            format!("HTTP/1.1 {} Scripted\r\nContent-Length: 0\r\nConnection: close\r\n\r\n", code),
            &[],
        ),
        Step::IgnoreRange => (
            format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n", len),
            content,
        ),
        Step::Serve | Step::Truncate(_) if range.is_some() && start >= len => (
            format!(
                "HTTP/1.1 416 Range Not Satisfiable\r\nContent-Range: bytes */{}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                len
            ),
            &[],
        ),
        Step::Serve | Step::Truncate(_) if range.is_some() => (
            format!(
                "HTTP/1.1 206 Partial Content\r\nContent-Range: bytes {}-{}/{}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                start,
                len - 1,
                len,
                len - start
            ),
            &content[start..],
        ),
        Step::Serve | Step::Truncate(_) => (
            format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n", len),
            content,
        ),
    };

    let body = match step {
        Step::Truncate(n) => &body[..n.min(body.len())],
        _ => body,
    };

    stream.write_all(head.as_bytes()).await?;
    stream.write_all(body).await?;
    stream.flush().await?;
    stream.shutdown().await
}

/// Deterministic file content of `len` bytes
pub fn content(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// One `<product>` element for a catalog fixture
pub fn product_xml(
    id: &str,
    version: &str,
    name: &str,
    platform: &str,
    guid: &str,
    deps: &[(&str, &str)],
) -> String {
    let deps: String = deps
        .iter()
        .map(|(sap, ver)| {
            format!(
                "<dependency><sapCode>{}</sapCode><baseVersion>{}</baseVersion></dependency>",
                sap, ver
            )
        })
        .collect();
    format!(
        r#"<product id="{id}" version="{version}">
  <displayName>{name}</displayName>
  <platforms><platform id="{platform}">
    <languageSet buildGuid="{guid}"><dependencies>{deps}</dependencies></languageSet>
  </platform></platforms>
</product>"#
    )
}

/// Catalog document with a primary `ccm` channel and a secondary `sti` channel
pub fn catalog_xml(cdn: &str, ccm: &[String], sti: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<root>
  <channel name="ccm">
    <cdn><secure>{cdn}</secure></cdn>
    <products>{}</products>
  </channel>
  <channel name="sti">
    <cdn><secure>{cdn}</secure></cdn>
    <products>{}</products>
  </channel>
</root>"#,
        ccm.concat(),
        sti.concat()
    )
}

/// Endpoints pointing at a mock server
pub fn endpoints(base_url: &str) -> Endpoints {
    Endpoints {
        catalog_url: format!("{}/core/v5/products/all", base_url),
        manifest_url: format!("{}/core/v3/applications", base_url),
        ..Endpoints::default()
    }
}
