//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use mockgate::config::DirStore;
use mockgate::engine::Engine;
use mockgate::http::HttpServer;
use mockgate::lifecycle::Shutdown;

/// What an upstream saw for one request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    /// All values of a header, case-insensitive.
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.header_values(name).into_iter().next()
    }
}

pub type Recorder = Arc<Mutex<Vec<RecordedRequest>>>;

/// Start an upstream that records request heads and answers every request
/// with `body` plus the raw `extra_headers` lines.
pub async fn start_recording_backend(extra_headers: &'static str, body: &'static str) -> (SocketAddr, Recorder) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorded: Recorder = Arc::new(Mutex::new(Vec::new()));
    let sink = recorded.clone();

    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else { break };
            let sink = sink.clone();
            tokio::spawn(async move {
                let mut reader = BufReader::new(socket);

                let mut line = String::new();
                if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                    return;
                }
                let mut parts = line.split_whitespace();
                let method = parts.next().unwrap_or_default().to_string();
                let target = parts.next().unwrap_or_default().to_string();

                let mut headers = Vec::new();
                loop {
                    let mut header = String::new();
                    if reader.read_line(&mut header).await.unwrap_or(0) == 0 {
                        break;
                    }
                    let header = header.trim_end();
                    if header.is_empty() {
                        break;
                    }
                    if let Some((k, v)) = header.split_once(':') {
                        headers.push((k.trim().to_string(), v.trim().to_string()));
                    }
                }
                sink.lock().unwrap().push(RecordedRequest { method, target, headers });

                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n{}",
                    body.len(),
                    extra_headers,
                    body
                );
                let mut socket = reader.into_inner();
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, recorded)
}

/// Read an HTTP message head, up to and including the blank line.
pub async fn read_head<R: AsyncRead + Unpin>(reader: &mut R) -> String {
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        if reader.read(&mut byte).await.unwrap() == 0 {
            break;
        }
        head.push(byte[0]);
    }
    String::from_utf8(head).unwrap()
}

/// Start an upstream that accepts any upgrade with `101` and then echoes
/// every byte it receives. Records the request head it saw.
pub async fn start_upgrade_backend() -> (SocketAddr, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let heads = Arc::new(Mutex::new(Vec::new()));
    let sink = heads.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else { break };
            let sink = sink.clone();
            tokio::spawn(async move {
                let head = read_head(&mut socket).await;
                sink.lock().unwrap().push(head);

                let response = "HTTP/1.1 101 Switching Protocols\r\nConnection: Upgrade\r\nUpgrade: echo\r\n\r\n";
                if socket.write_all(response.as_bytes()).await.is_err() {
                    return;
                }

                let mut buf = [0u8; 1024];
                loop {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            if socket.write_all(&buf[..n]).await.is_err() {
                                break;
                            }
                        }
                    }
                }
            });
        }
    });

    (addr, heads)
}

/// An address nothing is listening on.
pub fn dead_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

pub fn response(status: u16, body: Value, delay: u64) -> Value {
    json!({ "status": status, "headers": { "X-Mock": "true" }, "body": body, "delay": delay })
}

/// The `users` feature used by most tests.
pub fn users_feature() -> Value {
    json!({
        "feature": "users",
        "endpoints": [
            {
                "id": "get-user",
                "method": "GET",
                "path": "/api/users/:id",
                "active": true,
                "defaultResponse": "ok",
                "responses": {
                    "ok": response(200, json!({"id": "{{params.id}}", "name": "User {{params.id}}", "at": "{{now}}"}), 0),
                    "missing": response(404, json!({"error": "no such user"}), 0)
                }
            },
            {
                "id": "list-users",
                "method": "GET",
                "path": "/api/users",
                "active": false,
                "defaultResponse": "ok",
                "responses": { "ok": response(200, json!([]), 0) }
            },
            {
                "id": "slow",
                "method": "GET",
                "path": "/api/slow",
                "active": true,
                "defaultResponse": "ok",
                "responses": { "ok": response(200, json!({"slow": true}), 300) }
            },
            {
                "id": "broken",
                "method": "GET",
                "path": "/api/broken/:id",
                "active": true,
                "defaultResponse": "ok",
                "responses": { "ok": response(200, json!({"value": "{{params.missing}}"}), 0) }
            }
        ]
    })
}

pub fn write_global(dir: &Path, target: &str, change_origin: bool, api_key: &str) {
    let config = format!(
        r#"[server]
host = "127.0.0.1"
port = 0

[proxy]
target = "{target}"
change_origin = {change_origin}
timeout_secs = 5

[[proxy.path_rewrite]]
pattern = "^/api"
replacement = ""

[admin]
enabled = true
bind_address = "127.0.0.1:0"
api_key = "{api_key}"
"#
    );
    std::fs::write(dir.join("config.toml"), config).unwrap();
}

pub fn write_feature(dir: &Path, feature: &Value) {
    let name = feature["feature"].as_str().unwrap();
    std::fs::write(
        dir.join(format!("{}.json", name)),
        serde_json::to_string_pretty(feature).unwrap(),
    )
    .unwrap();
}

/// Temp config directory with the `users` feature proxying to `target`.
pub fn config_dir(target: &str, change_origin: bool, api_key: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_global(dir.path(), target, change_origin, api_key);
    write_feature(dir.path(), &users_feature());
    dir
}

pub fn open_engine(dir: &Path) -> Arc<Engine> {
    let store = DirStore::open(dir).unwrap();
    Arc::new(Engine::open(Arc::new(store)).unwrap())
}

/// Start the public server on an ephemeral port.
pub async fn start_server(engine: Arc<Engine>, shutdown: &Shutdown) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(engine);
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    addr
}

/// Start the admin API on an ephemeral port.
pub async fn start_admin(engine: Arc<Engine>, shutdown: &Shutdown) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = mockgate::admin::serve(engine, listener, rx).await;
    });
    addr
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
