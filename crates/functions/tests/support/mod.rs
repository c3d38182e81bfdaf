#![forbid(unsafe_code)]
#![allow(dead_code)]

use serde_json::{Value, json};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

pub(crate) struct Server {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    storage_dir: PathBuf,
    cleanup_storage: bool,
    next_id: i64,
}

impl Server {
    pub(crate) fn start(test_name: &str) -> Self {
        Self::start_with_args(test_name, &[])
    }

    pub(crate) fn start_with_args(test_name: &str, extra_args: &[&str]) -> Self {
        Self::start_with_storage_dir(temp_dir(test_name), extra_args, true)
    }

    pub(crate) fn start_with_storage_dir(
        storage_dir: PathBuf,
        extra_args: &[&str],
        cleanup_storage: bool,
    ) -> Self {
        std::fs::create_dir_all(&storage_dir).expect("create storage dir");
        let mut child = Command::new(env!("CARGO_BIN_EXE_hub_functions"))
            .arg("--storage-dir")
            .arg(&storage_dir)
            .args(extra_args)
            .env("HUB_LOG", "warn")
            .env("HUB_UPLOAD_SECRET", "test-secret")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn hub_functions");

        let stdin = child.stdin.take().expect("stdin");
        let stdout = BufReader::new(child.stdout.take().expect("stdout"));

        Self {
            child,
            stdin,
            stdout,
            storage_dir,
            cleanup_storage,
            next_id: 1,
        }
    }

    pub(crate) fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub(crate) fn send_line(&mut self, line: &str) {
        writeln!(self.stdin, "{line}").expect("write request");
        self.stdin.flush().expect("flush request");
    }

    pub(crate) fn send_bytes(&mut self, bytes: &[u8]) {
        self.stdin.write_all(bytes).expect("write request bytes");
        self.stdin.flush().expect("flush request");
    }

    pub(crate) fn send(&mut self, req: Value) {
        self.send_line(&req.to_string());
    }

    pub(crate) fn recv(&mut self) -> Value {
        let mut line = String::new();
        self.stdout.read_line(&mut line).expect("read response");
        assert!(!line.trim().is_empty(), "empty response line");
        serde_json::from_str(&line).expect("parse response json")
    }

    pub(crate) fn request(&mut self, req: Value) -> Value {
        self.send(req);
        self.recv()
    }

    /// Calls `function` and returns the response envelope, checking the echoed request id.
    pub(crate) fn call(&mut self, function: &str, auth: Value, data: Value) -> Value {
        let id = self.next_id;
        self.next_id += 1;
        let resp = self.request(json!({
            "id": id,
            "function": function,
            "auth": auth,
            "data": data
        }));
        assert_eq!(resp.get("id"), Some(&json!(id)), "response id mismatch: {resp}");
        resp.get("result").cloned().expect("result")
    }

    pub(crate) fn call_as_editor(&mut self, function: &str, data: Value) -> Value {
        self.call(function, editor(), data)
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        if self.cleanup_storage {
            let _ = std::fs::remove_dir_all(&self.storage_dir);
        }
    }
}

pub(crate) fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("hub_functions_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

pub(crate) fn editor() -> Value {
    json!({ "uid": "editor-1", "role": "editor" })
}

pub(crate) fn error_code(result: &Value) -> &str {
    assert_eq!(result.get("success"), Some(&json!(false)), "expected failure: {result}");
    result
        .get("error")
        .and_then(|v| v.get("code"))
        .and_then(|v| v.as_str())
        .expect("error.code")
}

pub(crate) fn news_id(result: &Value) -> i64 {
    assert_eq!(result.get("success"), Some(&json!(true)), "expected success: {result}");
    result
        .get("newsId")
        .and_then(|v| v.as_i64())
        .expect("newsId")
}
