use serde_json::{json, Value};
use std::path::PathBuf;

use crate::backup;
use crate::ipc::error::{domain_err, err, no_workspace, ok};
use crate::ipc::params::required_str;
use crate::ipc::types::{AppState, Request};
use crate::workspace::Workspace;

fn handle_backup_export(state: &mut AppState, req: &Request) -> Value {
    let Some(ws) = state.workspace.as_ref() else {
        return no_workspace(&req.id);
    };
    if let Err(e) = ws.admin.require() {
        return domain_err(&req.id, &e, None);
    }
    let out_path = match required_str(&req.id, &req.params, "outPath") {
        Ok(v) => PathBuf::from(v),
        Err(resp) => return resp,
    };
    let snapshot = match ws.roster.export_snapshot() {
        Ok(v) => v,
        Err(e) => return domain_err(&req.id, &e, None),
    };
    match backup::export_workspace_bundle(&ws.path, &snapshot, &out_path) {
        Ok(summary) => ok(
            &req.id,
            json!({
                "bundleFormat": summary.bundle_format,
                "entryCount": summary.entry_count,
                "dbSha256": summary.db_sha256,
                "outPath": out_path.to_string_lossy()
            }),
        ),
        Err(e) => err(&req.id, "backup_export_failed", format!("{e:#}"), None),
    }
}

fn handle_backup_import(state: &mut AppState, req: &Request) -> Value {
    let Some(ws) = state.workspace.as_ref() else {
        return no_workspace(&req.id);
    };
    if let Err(e) = ws.admin.require() {
        return domain_err(&req.id, &e, None);
    }
    let in_path = match required_str(&req.id, &req.params, "inPath") {
        Ok(v) => PathBuf::from(v),
        Err(resp) => return resp,
    };
    let workspace_path = ws.path.clone();

    // Every connection to the database has to be closed before it is replaced.
    state.workspace = None;
    let imported = backup::import_workspace_bundle(&in_path, &workspace_path);

    // Reopen either way; after a failed import this is the old database.
    match Workspace::open(&workspace_path) {
        Ok(ws) => {
            let students = ws.roster.len();
            state.workspace = Some(ws);
            match imported {
                Ok(summary) => ok(
                    &req.id,
                    json!({
                        "bundleFormatDetected": summary.bundle_format_detected,
                        "studentCount": students
                    }),
                ),
                Err(e) => err(&req.id, "backup_import_failed", format!("{e:#}"), None),
            }
        }
        Err(e) => domain_err(&req.id, &e, Some(json!({ "stage": "workspace_reopen" }))),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "backup.exportBundle" => Some(handle_backup_export(state, req)),
        "backup.importBundle" => Some(handle_backup_import(state, req)),
        _ => None,
    }
}
