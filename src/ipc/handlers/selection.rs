use serde_json::{json, Value};
use std::time::Instant;

use crate::gate::PIN_LENGTH;
use crate::ipc::error::{domain_err, err, no_workspace, ok};
use crate::ipc::params::optional_str;
use crate::ipc::types::{AppState, Request};
use crate::workspace::Workspace;

fn pin_view(ws: &Workspace) -> Value {
    let gate = ws.selection.pin_gate();
    let reset_in_ms = gate
        .reset_due()
        .map(|due| due.saturating_duration_since(Instant::now()).as_millis() as u64);
    json!({
        "status": gate.status(),
        "entered": gate.entered_len(),
        "length": PIN_LENGTH,
        "resetInMs": reset_in_ms
    })
}

fn selection_view(ws: &Workspace) -> Value {
    let student = ws
        .selection
        .selected_record(&ws.roster)
        .ok()
        .map(|s| json!({ "uid": s.uid, "label": s.display_label() }));
    json!({
        "value": ws.selection.selection_value(),
        "index": ws.selection.selected_index(),
        "student": student,
        "pin": pin_view(ws),
        "fieldsEnabled": ws.selection.fields_enabled()
    })
}

fn parse_digit(v: &Value) -> Option<char> {
    if let Some(n) = v.as_u64() {
        return char::from_digit(u32::try_from(n).ok()?, 10);
    }
    let s = v.as_str()?;
    let mut chars = s.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    Some(c)
}

fn handle_selection_set(state: &mut AppState, req: &Request) -> Value {
    let Some(ws) = state.workspace.as_mut() else {
        return no_workspace(&req.id);
    };
    let result = if let Some(uid) = optional_str(&req.params, "uid") {
        match ws.roster.position_of_uid(uid) {
            Some(index) => ws.selection.select_index(index, &ws.roster).map(Some),
            None => return err(&req.id, "not_found", "student not found", None),
        }
    } else {
        let Some(value) = req.params.get("value").and_then(|v| v.as_u64()) else {
            return err(&req.id, "bad_params", "missing value or uid", None);
        };
        ws.selection.select_value(value as usize, &ws.roster)
    };
    match result {
        Ok(_) => ok(&req.id, selection_view(ws)),
        Err(e) => domain_err(&req.id, &e, None),
    }
}

fn handle_selection_get(state: &mut AppState, req: &Request) -> Value {
    let Some(ws) = state.workspace.as_ref() else {
        return no_workspace(&req.id);
    };
    ok(&req.id, selection_view(ws))
}

fn handle_pin_enter_digit(state: &mut AppState, req: &Request) -> Value {
    let Some(ws) = state.workspace.as_mut() else {
        return no_workspace(&req.id);
    };
    let Some(digit) = req.params.get("digit").and_then(parse_digit) else {
        return err(&req.id, "bad_params", "digit must be a single character", None);
    };
    match ws.selection.enter_digit(digit, &ws.roster, Instant::now()) {
        Ok(_) => ok(&req.id, selection_view(ws)),
        Err(e) => domain_err(&req.id, &e, Some(json!({ "pin": pin_view(ws) }))),
    }
}

fn handle_pin_backspace(state: &mut AppState, req: &Request) -> Value {
    let Some(ws) = state.workspace.as_mut() else {
        return no_workspace(&req.id);
    };
    ws.selection.backspace();
    ok(&req.id, selection_view(ws))
}

fn handle_pin_status(state: &mut AppState, req: &Request) -> Value {
    let Some(ws) = state.workspace.as_ref() else {
        return no_workspace(&req.id);
    };
    ok(&req.id, pin_view(ws))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "selection.set" => Some(handle_selection_set(state, req)),
        "selection.get" => Some(handle_selection_get(state, req)),
        "pin.enterDigit" => Some(handle_pin_enter_digit(state, req)),
        "pin.backspace" => Some(handle_pin_backspace(state, req)),
        "pin.status" => Some(handle_pin_status(state, req)),
        _ => None,
    }
}
