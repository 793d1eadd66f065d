use crate::ipc::error::{domain_err, err, ok};
use crate::ipc::types::{AppState, Request};
use crate::workspace::Workspace;
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state
                .workspace
                .as_ref()
                .map(|ws| ws.path.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    // Close the previous workspace before opening the next one.
    state.workspace = None;
    match Workspace::open(&path) {
        Ok(ws) => {
            let students = ws.roster.len();
            let admin = ws.admin.state();
            state.workspace = Some(ws);
            ok(
                &req.id,
                json!({
                    "workspacePath": path.to_string_lossy(),
                    "studentCount": students,
                    "admin": admin
                }),
            )
        }
        Err(e) => domain_err(&req.id, &e, Some(json!({ "stage": "workspace_open" }))),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
