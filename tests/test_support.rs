#![allow(dead_code)]

use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

pub const ADMIN_SESSION_ID: &str = "OUTING-ADMIN";
pub const ADMIN_MOBILE: &str = "9000000000";
pub const ADMIN_ANSWER: &str = "campus";

pub fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

pub struct Sidecar {
    pub child: Child,
    pub stdin: ChildStdin,
    pub reader: BufReader<ChildStdout>,
    next_id: u64,
}

impl Drop for Sidecar {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub fn spawn_sidecar() -> Sidecar {
    let exe = env!("CARGO_BIN_EXE_outingd");
    let mut child = Command::new(exe)
        .env_remove("OUTINGD_WORKSPACE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn outingd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    Sidecar {
        child,
        stdin,
        reader: BufReader::new(stdout),
        next_id: 0,
    }
}

impl Sidecar {
    pub fn request(&mut self, method: &str, params: serde_json::Value) -> serde_json::Value {
        self.next_id += 1;
        let id = self.next_id.to_string();
        let payload = json!({
            "id": id,
            "method": method,
            "params": params,
        });
        writeln!(self.stdin, "{}", payload).expect("write request");
        self.stdin.flush().expect("flush request");

        let mut line = String::new();
        self.reader.read_line(&mut line).expect("read response line");
        assert!(!line.trim().is_empty(), "empty response for {}", method);
        let value: serde_json::Value =
            serde_json::from_str(line.trim()).expect("parse response json");
        assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id.as_str()));
        value
    }

    pub fn request_ok(&mut self, method: &str, params: serde_json::Value) -> serde_json::Value {
        let value = self.request(method, params);
        assert!(
            value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
            "{} failed: {}",
            method,
            value
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error")
        );
        value.get("result").cloned().unwrap_or_else(|| json!({}))
    }

    /// Expects a failure and returns the error code.
    pub fn request_err(&mut self, method: &str, params: serde_json::Value) -> String {
        let value = self.request(method, params);
        assert_eq!(
            value.get("ok").and_then(|v| v.as_bool()),
            Some(false),
            "{} unexpectedly succeeded: {}",
            method,
            value
        );
        value
            .pointer("/error/code")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }

    pub fn select_workspace(&mut self, path: &std::path::Path) -> serde_json::Value {
        self.request_ok(
            "workspace.select",
            json!({ "path": path.to_string_lossy() }),
        )
    }

    pub fn login(&mut self) {
        self.request_ok(
            "admin.login",
            json!({
                "sessionId": ADMIN_SESSION_ID,
                "mobile": ADMIN_MOBILE,
                "answer": ADMIN_ANSWER
            }),
        );
    }

    pub fn enter_pin(&mut self, pin: &str) -> serde_json::Value {
        let mut last = serde_json::Value::Null;
        for c in pin.chars() {
            last = self.request("pin.enterDigit", json!({ "digit": c.to_string() }));
        }
        last
    }
}

pub fn student(name: &str, id: &str, gender: &str, pin: Option<&str>) -> serde_json::Value {
    let mut v = json!({
        "name": name,
        "id": id,
        "gender": gender,
        "program": "Computer Science",
        "batch": "2024-2028",
        "signature": format!("signatures/{id}.png"),
        "parents": [
            { "name": format!("Father of {name}"), "email": "father@example.com", "phone": "9000000001" },
            { "name": format!("Mother of {name}"), "email": "mother@example.com", "phone": "9000000002" },
            { "name": name, "email": "student@example.edu", "phone": "9000000003" }
        ]
    });
    if let Some(p) = pin {
        v["pin"] = json!(p);
    }
    v
}

/// Writes a `data.js` holding exactly the given records, so the workspace
/// seeds from it instead of the built-in dataset.
pub fn write_dataset(workspace: &std::path::Path, records: &[serde_json::Value]) {
    let text = format!(
        "window.students = {};\n",
        serde_json::to_string_pretty(records).expect("serialize dataset")
    );
    std::fs::write(workspace.join("data.js"), text).expect("write data.js");
}
