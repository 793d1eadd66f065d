use serde_json::{json, Value};

use crate::ipc::error::{domain_err, no_workspace, ok};
use crate::ipc::params::required_str;
use crate::ipc::types::{AppState, Request};

fn handle_admin_status(state: &mut AppState, req: &Request) -> Value {
    let Some(ws) = state.workspace.as_ref() else {
        return no_workspace(&req.id);
    };
    ok(
        &req.id,
        json!({ "state": ws.admin.state(), "loggedIn": ws.admin.is_logged_in() }),
    )
}

fn handle_admin_login(state: &mut AppState, req: &Request) -> Value {
    let Some(ws) = state.workspace.as_mut() else {
        return no_workspace(&req.id);
    };
    let session_id = match required_str(&req.id, &req.params, "sessionId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let mobile = match required_str(&req.id, &req.params, "mobile") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let answer = match required_str(&req.id, &req.params, "answer") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match ws.admin.verify(session_id, mobile, answer) {
        Ok(()) => ok(&req.id, json!({ "state": ws.admin.state() })),
        Err(e) => domain_err(&req.id, &e, None),
    }
}

fn handle_admin_logout(state: &mut AppState, req: &Request) -> Value {
    let Some(ws) = state.workspace.as_mut() else {
        return no_workspace(&req.id);
    };
    match ws.admin.logout() {
        Ok(()) => ok(&req.id, json!({ "state": ws.admin.state() })),
        Err(e) => domain_err(&req.id, &e, None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "admin.status" => Some(handle_admin_status(state, req)),
        "admin.login" => Some(handle_admin_login(state, req)),
        "admin.logout" => Some(handle_admin_logout(state, req)),
        _ => None,
    }
}
