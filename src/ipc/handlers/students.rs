use serde_json::{json, Value};

use crate::ipc::error::{domain_err, err, no_workspace, ok};
use crate::ipc::params::required_index;
use crate::ipc::types::{AppState, Request};
use crate::model::StudentRecord;

fn parse_student(req: &Request) -> Result<StudentRecord, Value> {
    let Some(raw) = req.params.get("student") else {
        return Err(err(&req.id, "bad_params", "missing student", None));
    };
    serde_json::from_value(raw.clone()).map_err(|e| {
        err(
            &req.id,
            "bad_params",
            format!("invalid student: {}", e),
            None,
        )
    })
}

fn handle_students_list(state: &mut AppState, req: &Request) -> Value {
    let Some(ws) = state.workspace.as_ref() else {
        return no_workspace(&req.id);
    };
    let students = ws.roster.list();
    // Dropdown options: value 0 is the placeholder, so entries start at 1.
    let options: Vec<Value> = students
        .iter()
        .enumerate()
        .map(|(i, s)| json!({ "value": i + 1, "label": s.display_label(), "uid": s.uid }))
        .collect();
    ok(
        &req.id,
        json!({
            "students": students,
            "options": options,
            "count": students.len()
        }),
    )
}

fn handle_students_get(state: &mut AppState, req: &Request) -> Value {
    let Some(ws) = state.workspace.as_ref() else {
        return no_workspace(&req.id);
    };
    let index = match required_index(&req.id, &req.params, "index") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match ws.roster.get(index) {
        Ok(student) => ok(&req.id, json!({ "index": index, "student": student })),
        Err(e) => domain_err(&req.id, &e, None),
    }
}

fn handle_students_create(state: &mut AppState, req: &Request) -> Value {
    let Some(ws) = state.workspace.as_mut() else {
        return no_workspace(&req.id);
    };
    if let Err(e) = ws.admin.require() {
        return domain_err(&req.id, &e, None);
    }
    let student = match parse_student(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match ws.roster.add(student) {
        Ok(index) => {
            let uid = ws.roster.list()[index].uid.clone();
            ok(
                &req.id,
                json!({ "index": index, "value": index + 1, "uid": uid }),
            )
        }
        Err(e) => domain_err(&req.id, &e, None),
    }
}

fn handle_students_update(state: &mut AppState, req: &Request) -> Value {
    let Some(ws) = state.workspace.as_mut() else {
        return no_workspace(&req.id);
    };
    if let Err(e) = ws.admin.require() {
        return domain_err(&req.id, &e, None);
    }
    let index = match required_index(&req.id, &req.params, "index") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let student = match parse_student(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if let Err(e) = ws.roster.edit(index, student) {
        return domain_err(&req.id, &e, None);
    }
    if ws.selection.selected_index() == Some(index) {
        ws.selection.restart_challenge();
    }
    ok(&req.id, json!({ "index": index }))
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> Value {
    let Some(ws) = state.workspace.as_mut() else {
        return no_workspace(&req.id);
    };
    if let Err(e) = ws.admin.require() {
        return domain_err(&req.id, &e, None);
    }
    let index = match required_index(&req.id, &req.params, "index") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match ws.roster.delete(index) {
        Ok(removed) => {
            // Every index after `index` shifted; nothing held is trustworthy.
            ws.selection.clear();
            ok(
                &req.id,
                json!({ "removedUid": removed.uid, "count": ws.roster.len() }),
            )
        }
        Err(e) => domain_err(&req.id, &e, None),
    }
}

fn handle_students_export_snapshot(state: &mut AppState, req: &Request) -> Value {
    let Some(ws) = state.workspace.as_ref() else {
        return no_workspace(&req.id);
    };
    if let Err(e) = ws.admin.require() {
        return domain_err(&req.id, &e, None);
    }
    match ws.roster.export_snapshot() {
        Ok(text) => ok(
            &req.id,
            json!({ "snapshot": text, "fileName": crate::store::DATASET_FILE_NAME }),
        ),
        Err(e) => domain_err(&req.id, &e, None),
    }
}

fn handle_students_reset(state: &mut AppState, req: &Request) -> Value {
    let Some(ws) = state.workspace.as_mut() else {
        return no_workspace(&req.id);
    };
    if let Err(e) = ws.admin.require() {
        return domain_err(&req.id, &e, None);
    }
    ws.selection.clear();
    match ws.roster.reset() {
        Ok(()) => ok(&req.id, json!({ "count": ws.roster.len() })),
        Err(e) => domain_err(&req.id, &e, None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.get" => Some(handle_students_get(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        "students.exportSnapshot" => Some(handle_students_export_snapshot(state, req)),
        "students.reset" => Some(handle_students_reset(state, req)),
        _ => None,
    }
}
