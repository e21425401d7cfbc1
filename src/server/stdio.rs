//! JSON-RPC 2.0 over stdio
//!
//! One message per line in each direction. Requests carry an `id` and get
//! exactly one response line; notifications (no `id`) get none. Resource and
//! tool failures are reported inside a normal result so the calling agent
//! sees the message; protocol problems use JSON-RPC error objects.

use serde::Deserialize;
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};

use crate::resolver::ErrorKind;
use crate::service::{IsaService, Request};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Deserialize)]
struct RpcMessage {
    #[serde(default)]
    jsonrpc: Option<String>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Deserialize)]
struct ReadParams {
    uri: String,
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Serve JSON-RPC from `input` to `output` until `input` is exhausted.
/// A line that is not UTF-8 gets a parse error; only I/O failures end the loop.
pub fn serve<R: BufRead, W: Write>(
    service: &IsaService,
    mut input: R,
    mut output: W,
) -> io::Result<()> {
    tracing::info!("stdio transport ready");
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let response = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => handle_line(service, line),
            Err(e) => {
                tracing::debug!(error = %e, "Non-UTF-8 JSON-RPC message");
                let message = format!("Parse error: {}", e);
                Some(error_response(Value::Null, PARSE_ERROR, &message))
            }
        };
        if let Some(response) = response {
            writeln!(output, "{}", response)?;
            output.flush()?;
        }
    }
    tracing::info!("stdio transport closed");
    Ok(())
}

/// Handle one line; `None` for notifications.
pub fn handle_line(service: &IsaService, line: &str) -> Option<Value> {
    let message: RpcMessage = match serde_json::from_str(line) {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!(error = %e, "Unparseable JSON-RPC message");
            let message = format!("Parse error: {}", e);
            return Some(error_response(Value::Null, PARSE_ERROR, &message));
        }
    };

    let Some(method) = message.method.as_deref() else {
        let id = message.id.unwrap_or(Value::Null);
        return Some(error_response(id, INVALID_REQUEST, "Missing method"));
    };
    if message.jsonrpc.as_deref() != Some("2.0") {
        tracing::debug!(method, "Message without jsonrpc 2.0 marker");
    }

    let Some(id) = message.id else {
        tracing::debug!(method, "Notification");
        return None;
    };

    Some(match dispatch(service, method, message.params) {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        Err((code, msg)) => error_response(id, code, &msg),
    })
}

fn dispatch(service: &IsaService, method: &str, params: Value) -> Result<Value, (i64, String)> {
    match method {
        "initialize" => Ok(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "resources": {}, "tools": {} },
            "serverInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            }
        })),
        "ping" => Ok(json!({})),
        "resources/list" => Ok(json!({ "resources": IsaService::resources() })),
        "resources/templates/list" => Ok(json!({
            "resourceTemplates": IsaService::resource_templates()
        })),
        "tools/list" => Ok(json!({ "tools": IsaService::tools() })),
        "resources/read" => {
            let params: ReadParams = serde_json::from_value(params)
                .map_err(|e| (INVALID_PARAMS, format!("Invalid params: {}", e)))?;
            let reply = service.handle(&Request::read(params.uri.as_str()));
            if reply.error == Some(ErrorKind::BadRequest) {
                return Err((INVALID_PARAMS, reply.text));
            }
            Ok(json!({
                "contents": [{
                    "uri": params.uri,
                    "mimeType": reply.mime_type(),
                    "text": reply.text,
                }]
            }))
        }
        "tools/call" => {
            let params: CallParams = serde_json::from_value(params)
                .map_err(|e| (INVALID_PARAMS, format!("Invalid params: {}", e)))?;
            let reply = service.handle(&Request::call(params.name, params.arguments));
            if reply.error == Some(ErrorKind::BadRequest) {
                return Err((INVALID_PARAMS, reply.text));
            }
            Ok(json!({
                "content": [{ "type": "text", "text": reply.text }],
                "isError": reply.is_error(),
            }))
        }
        other => Err((METHOD_NOT_FOUND, format!("Method not found: {}", other))),
    }
}

fn error_response(id: Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message }
    })
}
