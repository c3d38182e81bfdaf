#![forbid(unsafe_code)]

use crate::auth::CallContext;
use crate::envelope::callable_error;
use crate::error::CallableError;
use crate::server::FunctionsServer;
use hub_core::clock::now_ms;
use hub_core::identity::CallerIdentity;
use serde::Deserialize;
use serde_json::{Value, json};
use std::io::{self, BufRead, Read as _, Write};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct CallRequest {
    #[serde(default)]
    id: Option<Value>,
    function: String,
    #[serde(default)]
    auth: Option<CallAuth>,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct CallAuth {
    uid: String,
    #[serde(default)]
    role: Option<String>,
}

pub(crate) fn run_stdio(
    server: &mut FunctionsServer,
    max_request_bytes: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = std::io::stdin();
    let reader = stdin.lock();
    let mut stdout = std::io::stdout().lock();
    serve_lines(server, reader, &mut stdout, max_request_bytes)
}

/// One request per line in, one response per line out, until EOF. Lines that cannot be
/// read as a request get an error response and the loop keeps serving.
fn serve_lines<R: BufRead, W: Write>(
    server: &mut FunctionsServer,
    mut reader: R,
    out: &mut W,
    max_request_bytes: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        let resp = match read_request_line(&mut reader, max_request_bytes)? {
            RequestLine::Eof => break,
            RequestLine::Blank => continue,
            RequestLine::Text(line) => handle_line(server, &line),
            RequestLine::Rejected(err) => {
                warn!(error = %err, "request line rejected");
                json!({ "id": Value::Null, "result": callable_error(&err) })
            }
        };
        writeln!(out, "{}", serde_json::to_string(&resp)?)?;
        out.flush()?;
    }
    debug!("stdin closed");
    Ok(())
}

#[derive(Debug)]
enum RequestLine {
    Eof,
    Blank,
    Text(String),
    Rejected(CallableError),
}

/// Reads one newline-terminated request of at most `max_bytes` bytes. An oversized line is
/// drained up to its newline so the next request starts on a clean boundary.
fn read_request_line<R: BufRead>(reader: &mut R, max_bytes: usize) -> io::Result<RequestLine> {
    let limit = u64::try_from(max_bytes)
        .unwrap_or(u64::MAX)
        .saturating_add(1);
    let mut buf = Vec::new();
    if reader.by_ref().take(limit).read_until(b'\n', &mut buf)? == 0 {
        return Ok(RequestLine::Eof);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    } else if buf.len() > max_bytes {
        discard_through_newline(reader)?;
        return Ok(RequestLine::Rejected(CallableError::invalid(format!(
            "Request line exceeds {max_bytes} bytes"
        ))));
    }

    match String::from_utf8(buf) {
        Ok(line) if line.trim().is_empty() => Ok(RequestLine::Blank),
        Ok(line) => Ok(RequestLine::Text(line)),
        Err(err) => Ok(RequestLine::Rejected(CallableError::invalid(format!(
            "Request line is not valid UTF-8: {}",
            err.utf8_error()
        )))),
    }
}

fn discard_through_newline<R: BufRead>(reader: &mut R) -> io::Result<()> {
    loop {
        let available = match reader.fill_buf() {
            Ok(available) => available,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        if available.is_empty() {
            return Ok(());
        }
        match available.iter().position(|b| *b == b'\n') {
            Some(pos) => {
                reader.consume(pos + 1);
                return Ok(());
            }
            None => {
                let len = available.len();
                reader.consume(len);
            }
        }
    }
}

fn handle_line(server: &mut FunctionsServer, line: &str) -> Value {
    let request = match serde_json::from_str::<CallRequest>(line) {
        Ok(request) => request,
        Err(err) => {
            let err = CallableError::invalid(format!("Malformed request: {err}"));
            return json!({ "id": Value::Null, "result": callable_error(&err) });
        }
    };
    let id = request.id.unwrap_or(Value::Null);

    let caller = match request.auth {
        Some(auth) => match CallerIdentity::try_new(auth.uid, auth.role) {
            Ok(caller) => Some(caller),
            Err(err) => {
                let err = CallableError::Unauthenticated(format!("Invalid caller: {err}"));
                return json!({ "id": id, "result": callable_error(&err) });
            }
        },
        None => None,
    };
    let ctx = CallContext {
        caller,
        now_ms: now_ms(),
    };

    debug!(function = %request.function, "callable invoked");
    let result = server.dispatch_callable(
        &request.function,
        &ctx,
        request.data.unwrap_or(Value::Null),
    );
    json!({ "id": id, "result": result })
}
