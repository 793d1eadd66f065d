mod asset_cache;
mod backup;
mod config;
mod controller;
mod db;
mod document;
mod error;
mod gate;
mod ipc;
mod model;
mod roster;
mod snapshot;
mod store;
mod workspace;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

const WORKSPACE_ENV: &str = "OUTINGD_WORKSPACE";

fn init_tracing() {
    // stdout carries the IPC stream, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn main() {
    init_tracing();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "outingd starting");

    let mut state = ipc::AppState::default();

    if let Some(path) = std::env::var_os(WORKSPACE_ENV).map(PathBuf::from) {
        match workspace::Workspace::open(&path) {
            Ok(ws) => state.workspace = Some(ws),
            Err(e) => tracing::warn!(
                workspace = %path.to_string_lossy(),
                error = %e,
                "could not open workspace from environment"
            ),
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    tracing::info!("stdin closed; outingd exiting");
}
