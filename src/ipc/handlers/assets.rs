use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};

use crate::asset_cache::DirFetcher;
use crate::ipc::error::{err, no_workspace, ok};
use crate::ipc::params::{optional_str, required_str};
use crate::ipc::types::{AppState, Request};

fn handle_assets_install(state: &mut AppState, req: &Request) -> Value {
    let Some(ws) = state.workspace.as_ref() else {
        return no_workspace(&req.id);
    };
    let (cache, default_origin) = match ws.asset_cache() {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let files = match ws.asset_files() {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let origin = match optional_str(&req.params, "originDir") {
        Some(dir) => match DirFetcher::within(&ws.path, dir) {
            Ok(v) => v,
            Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
        },
        None => default_origin,
    };

    match cache.install(&files, &origin) {
        Ok(count) => ok(
            &req.id,
            json!({ "cacheName": cache.name(), "installed": count }),
        ),
        Err(e) => err(&req.id, "asset_install_failed", format!("{e:#}"), None),
    }
}

fn handle_assets_fetch(state: &mut AppState, req: &Request) -> Value {
    let Some(ws) = state.workspace.as_ref() else {
        return no_workspace(&req.id);
    };
    let path = match required_str(&req.id, &req.params, "path") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let (cache, default_origin) = match ws.asset_cache() {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let origin = match optional_str(&req.params, "originDir") {
        Some(dir) => match DirFetcher::within(&ws.path, dir) {
            Ok(v) => v,
            Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
        },
        None => default_origin,
    };

    match cache.fetch(path, &origin) {
        Ok(asset) => ok(
            &req.id,
            json!({
                "path": asset.path,
                "source": asset.source,
                "sha256": asset.sha256,
                "size": asset.body.len(),
                "encoding": "base64",
                "body": BASE64.encode(&asset.body)
            }),
        ),
        Err(e) => err(&req.id, "asset_fetch_failed", format!("{e:#}"), None),
    }
}

fn handle_assets_list(state: &mut AppState, req: &Request) -> Value {
    let Some(ws) = state.workspace.as_ref() else {
        return no_workspace(&req.id);
    };
    let (cache, _) = match ws.asset_cache() {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    match cache.list() {
        Ok(assets) => ok(
            &req.id,
            json!({ "cacheName": cache.name(), "assets": assets }),
        ),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "assets.install" => Some(handle_assets_install(state, req)),
        "assets.fetch" => Some(handle_assets_fetch(state, req)),
        "assets.list" => Some(handle_assets_list(state, req)),
        _ => None,
    }
}
