//! Minimal HTTP/1.1 Transport
//!
//! Endpoints:
//! - GET  /health          - Liveness probe
//! - GET  /resources       - Resource and template catalog (JSON)
//! - GET  /tools           - Tool catalog (JSON)
//! - GET  /isa/<path>      - Read `isa://<path>`
//! - POST /tools/<name>    - Call a tool; body is the JSON argument object
//!
//! Connections are accepted on the calling thread and handed to a fixed pool
//! of workers over a bounded channel. Every response closes the connection.

use crossbeam_channel::{bounded, Receiver};
use serde_json::{json, Value};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::resolver::ErrorKind;
use crate::service::{IsaService, Reply, Request};

/// Pending connections per worker before `accept` blocks.
const QUEUE_DEPTH_PER_WORKER: usize = 16;
/// Largest request body accepted.
const MAX_BODY_BYTES: usize = 64 * 1024;
const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP server bound to a listener.
pub struct HttpServer {
    listener: TcpListener,
    service: IsaService,
    workers: usize,
}

impl HttpServer {
    /// Bind to `addr` with `workers` connection handlers.
    pub fn bind(addr: &str, service: IsaService, workers: usize) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        Ok(Self {
            listener,
            service,
            workers: workers.max(1),
        })
    }

    pub fn local_addr(&self) -> io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until the listener fails.
    pub fn run(self) -> io::Result<()> {
        let (tx, rx) = bounded::<TcpStream>(self.workers * QUEUE_DEPTH_PER_WORKER);
        let handles: Vec<JoinHandle<()>> = (0..self.workers)
            .map(|id| spawn_worker(id, rx.clone(), self.service.clone()))
            .collect::<io::Result<_>>()?;
        drop(rx);

        tracing::info!(
            addr = %self.listener.local_addr()?,
            workers = self.workers,
            "HTTP server listening"
        );

        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    if tx.send(stream).is_err() {
                        tracing::error!("All HTTP workers exited");
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Connection error");
                }
            }
        }

        drop(tx);
        for handle in handles {
            let _ = handle.join();
        }
        Ok(())
    }
}

fn spawn_worker(
    id: usize,
    rx: Receiver<TcpStream>,
    service: IsaService,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("isa-docs-http-{}", id))
        .spawn(move || {
            for stream in rx.iter() {
                if let Err(e) = handle_connection(stream, &service) {
                    tracing::debug!(worker = id, error = %e, "Connection dropped");
                }
            }
        })
}

/// Parsed request line, headers and body.
struct HttpRequest {
    method: String,
    path: String,
    body: Vec<u8>,
}

/// What came off the wire.
enum Incoming {
    Request(HttpRequest),
    Malformed(String),
    TooLarge(usize),
}

/// Read one CRLF-terminated line; `None` when it is not UTF-8.
fn read_text_line<R: BufRead>(reader: &mut R, line: &mut String) -> io::Result<Option<usize>> {
    let mut raw = Vec::new();
    let n = reader.read_until(b'\n', &mut raw)?;
    match String::from_utf8(raw) {
        Ok(text) => {
            *line = text;
            Ok(Some(n))
        }
        Err(_) => Ok(None),
    }
}

fn read_request(stream: &TcpStream) -> io::Result<Option<Incoming>> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    match read_text_line(&mut reader, &mut request_line)? {
        Some(0) => return Ok(None),
        Some(_) => {}
        None => {
            return Ok(Some(Incoming::Malformed(
                "Request line is not valid UTF-8".to_string(),
            )))
        }
    }
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() < 2 {
        return Ok(Some(Incoming::Malformed("Invalid request line".to_string())));
    }
    let method = parts[0].to_string();
    let path = parts[1].to_string();

    // Headers: only Content-Length matters
    let mut content_length: usize = 0;
    loop {
        let mut header = String::new();
        match read_text_line(&mut reader, &mut header)? {
            Some(0) => break,
            Some(_) => {}
            None => {
                return Ok(Some(Incoming::Malformed(
                    "Header is not valid UTF-8".to_string(),
                )))
            }
        }
        let header = header.trim();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    if content_length > MAX_BODY_BYTES {
        return Ok(Some(Incoming::TooLarge(content_length)));
    }
    let mut body = vec![0u8; content_length];
    if content_length > 0 {
        reader.read_exact(&mut body)?;
    }

    Ok(Some(Incoming::Request(HttpRequest { method, path, body })))
}

fn handle_connection(mut stream: TcpStream, service: &IsaService) -> io::Result<()> {
    stream.set_read_timeout(Some(READ_TIMEOUT))?;

    let request = match read_request(&stream)? {
        Some(Incoming::Request(request)) => request,
        Some(Incoming::Malformed(message)) => {
            return send_response(&mut stream, 400, "text/plain", &message);
        }
        Some(Incoming::TooLarge(length)) => {
            let message = format!(
                "Request body of {} bytes exceeds the {} byte limit",
                length, MAX_BODY_BYTES
            );
            return send_response(&mut stream, 413, "text/plain", &message);
        }
        None => {
            return send_response(&mut stream, 400, "text/plain", "Invalid request line");
        }
    };

    // Drop any query string
    let path = request.path.split('?').next().unwrap_or("");
    tracing::debug!(method = %request.method, path = %path, "HTTP request");

    match (request.method.as_str(), path) {
        ("GET", "/health") => send_response(&mut stream, 200, "text/plain", "healthy"),
        ("GET", "/resources") => {
            let body = json!({
                "resources": IsaService::resources(),
                "resourceTemplates": IsaService::resource_templates(),
            });
            send_response(&mut stream, 200, "application/json", &body.to_string())
        }
        ("GET", "/tools") => {
            let body = json!({ "tools": IsaService::tools() });
            send_response(&mut stream, 200, "application/json", &body.to_string())
        }
        ("GET", p) if p.starts_with("/isa/") => {
            let uri = format!("isa://{}", &p["/isa/".len()..]);
            send_reply(&mut stream, &service.handle(&Request::read(uri)))
        }
        ("POST", p) if p.starts_with("/tools/") => {
            let name = &p["/tools/".len()..];
            let arguments = if request.body.iter().all(u8::is_ascii_whitespace) {
                Value::Null
            } else {
                match serde_json::from_slice::<Value>(&request.body) {
                    Ok(value) => value,
                    Err(e) => {
                        let message = format!("Request body is not valid JSON: {}", e);
                        return send_response(&mut stream, 400, "text/plain", &message);
                    }
                }
            };
            send_reply(&mut stream, &service.handle(&Request::call(name, arguments)))
        }
        _ => send_response(&mut stream, 404, "text/plain", "Endpoint not found"),
    }
}

/// HTTP status for a service reply.
pub fn status_for(reply: &Reply) -> u16 {
    match reply.error {
        None => 200,
        Some(ErrorKind::NotFound) => 404,
        Some(ErrorKind::InvalidQuery)
        | Some(ErrorKind::InvalidFilter)
        | Some(ErrorKind::UnknownArchitecture)
        | Some(ErrorKind::BadRequest) => 400,
        Some(ErrorKind::Timeout) => 503,
        Some(ErrorKind::DataAccessFailure) | Some(ErrorKind::Internal) => 500,
    }
}

fn send_reply(stream: &mut TcpStream, reply: &Reply) -> io::Result<()> {
    send_response(stream, status_for(reply), reply.mime_type(), &reply.text)
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

fn send_response(
    stream: &mut TcpStream,
    status: u16,
    content_type: &str,
    body: &str,
) -> io::Result<()> {
    let response = format!(
        "HTTP/1.1 {} {}\r\n\
         Content-Type: {}; charset=utf-8\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Access-Control-Allow-Methods: GET, POST\r\n\
         \r\n\
         {}",
        status,
        status_text(status),
        content_type,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes())?;
    stream.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(error: Option<ErrorKind>) -> Reply {
        Reply {
            text: String::new(),
            error,
            json: false,
        }
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&reply(None)), 200);
        assert_eq!(status_for(&reply(Some(ErrorKind::NotFound))), 404);
        assert_eq!(status_for(&reply(Some(ErrorKind::InvalidFilter))), 400);
        assert_eq!(status_for(&reply(Some(ErrorKind::Timeout))), 503);
        assert_eq!(status_for(&reply(Some(ErrorKind::DataAccessFailure))), 500);
    }
}
