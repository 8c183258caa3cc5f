//! Query server: the read-only HTTP surface a paired device polls for the
//! shared clipboard. Mutation from the network side exists only behind the
//! `allow_remote_write` configuration flag.

use std::{
    io::Read,
    net::UdpSocket,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tiny_http::{Header, Method, Request, Response, Server};

use crate::clipboard::{ClipboardKind, SharedClipboard};

const RECV_POLL: Duration = Duration::from_millis(200);
const MAX_UPLOAD_BYTES: u64 = 4 * 1024 * 1024;

#[derive(Serialize)]
struct IpReply {
    ip: String,
}

#[derive(Serialize)]
struct UploadReply {
    status: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ErrorReply {
    status: &'static str,
    message: String,
}

#[derive(Deserialize)]
struct UploadBody {
    text: Option<String>,
}

#[derive(Debug, Error)]
enum UploadError {
    #[error("failed to read request body: {0}")]
    Io(#[from] std::io::Error),
    #[error("request body is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("no usable payload in upload")]
    Empty,
}

#[derive(Debug)]
pub struct QueryServer {
    port: u16,
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl QueryServer {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for QueryServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Bind the query server and serve requests on a background thread until
/// stopped. Binding failure is fatal; per-request failures are logged.
pub fn start_query_server(
    port: u16,
    allow_remote_write: bool,
    clipboard: SharedClipboard,
) -> Result<QueryServer> {
    let server = Server::http(("0.0.0.0", port))
        .map_err(|err| anyhow!("failed to bind query server on port {port}: {err}"))?;
    let bound_port = server
        .server_addr()
        .to_ip()
        .map(|addr| addr.port())
        .unwrap_or(port);

    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();

    let handle = thread::spawn(move || {
        while !stop_flag.load(Ordering::Relaxed) {
            let request = match server.recv_timeout(RECV_POLL) {
                Ok(Some(request)) => request,
                Ok(None) => continue,
                Err(err) => {
                    log::warn!("query server receive failed: {err}");
                    continue;
                }
            };
            handle_request(request, &clipboard, allow_remote_write);
        }
    });

    Ok(QueryServer {
        port: bound_port,
        stop,
        handle: Some(handle),
    })
}

fn handle_request(mut request: Request, clipboard: &SharedClipboard, allow_remote_write: bool) {
    let method = request.method().clone();
    let url = request.url().to_string();

    let response = match (&method, url.as_str()) {
        (Method::Get, "/get_clipboard") => json_response(200, &clipboard.read()),
        (Method::Get, "/ip") => json_response(200, &IpReply { ip: local_ip() }),
        (Method::Post, "/upload_clipboard") if allow_remote_write => {
            match accept_upload(&mut request, clipboard) {
                Ok(reply) => json_response(200, &reply),
                Err(err) => json_response(
                    400,
                    &ErrorReply {
                        status: "error",
                        message: err.to_string(),
                    },
                ),
            }
        }
        _ => json_response(
            404,
            &ErrorReply {
                status: "error",
                message: "not found".to_string(),
            },
        ),
    };

    if let Err(err) = request.respond(response) {
        log::warn!("failed to answer {method} {url}: {err}");
    }
}

fn accept_upload(
    request: &mut Request,
    clipboard: &SharedClipboard,
) -> Result<UploadReply, UploadError> {
    let mut body = String::new();
    request
        .as_reader()
        .take(MAX_UPLOAD_BYTES)
        .read_to_string(&mut body)?;

    let upload: UploadBody = serde_json::from_str(&body)?;
    let text = upload.text.filter(|text| !text.is_empty()).ok_or(UploadError::Empty)?;

    log::info!("remote upload accepted ({} bytes of text)", text.len());
    clipboard.write(ClipboardKind::Text, text);
    Ok(UploadReply {
        status: "ok",
        kind: "text",
    })
}

fn json_response<T: Serialize>(status: u16, body: &T) -> Response<std::io::Cursor<Vec<u8>>> {
    let payload = serde_json::to_string(body).unwrap_or_else(|err| {
        log::error!("failed to serialize response body: {err}");
        "{}".to_string()
    });
    let mut response = Response::from_string(payload).with_status_code(status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        response = response.with_header(header);
    }
    response
}

/// The address a device on the same network can reach this host at,
/// discovered with a UDP connect probe (no packet is sent). Falls back to
/// the loopback address.
pub fn local_ip() -> String {
    let probe = || -> std::io::Result<String> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect("8.8.8.8:80")?;
        Ok(socket.local_addr()?.ip().to_string())
    };
    probe().unwrap_or_else(|_| "127.0.0.1".to_string())
}
