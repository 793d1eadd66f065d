use serde_json::{json, Value};

use crate::config::{self, SetupSection, UpdateError};
use crate::ipc::error::{domain_err, err, no_workspace, ok};
use crate::ipc::types::{AppState, Request};

fn handle_setup_get(state: &mut AppState, req: &Request) -> Value {
    let Some(ws) = state.workspace.as_ref() else {
        return no_workspace(&req.id);
    };
    match config::public_setup(&ws.conn) {
        Ok(v) => ok(&req.id, v),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_setup_update(state: &mut AppState, req: &Request) -> Value {
    let Some(ws) = state.workspace.as_mut() else {
        return no_workspace(&req.id);
    };
    if let Err(e) = ws.admin.require() {
        return domain_err(&req.id, &e, None);
    }
    let Some(section_raw) = req.params.get("section").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing section", None);
    };
    let Some(section) = SetupSection::parse(section_raw) else {
        return err(&req.id, "bad_params", "unknown section", None);
    };
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    match config::update_section(&ws.conn, section, patch_obj) {
        Ok(_) => {}
        Err(UpdateError::Invalid(msg)) => return err(&req.id, "bad_params", msg, None),
        Err(UpdateError::Storage(e)) => {
            return err(&req.id, "db_update_failed", e.to_string(), None)
        }
    }
    if let Err(e) = ws.reload_settings() {
        return domain_err(&req.id, &e, None);
    }
    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "setup.get" => Some(handle_setup_get(state, req)),
        "setup.update" => Some(handle_setup_update(state, req)),
        _ => None,
    }
}
