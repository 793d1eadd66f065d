use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::json;

mod test_support;

use test_support::{spawn_sidecar, temp_dir};

fn write_app_shell(workspace: &std::path::Path) {
    let app = workspace.join("app");
    std::fs::create_dir_all(&app).expect("create app dir");
    std::fs::write(app.join("index.html"), "<html>outing</html>").expect("index");
    std::fs::write(app.join("script.js"), "console.log('outing');").expect("script");
    std::fs::write(app.join("data.js"), "window.students = [];\n").expect("data");
    std::fs::write(app.join("manifest.json"), "{\"name\":\"Outing\"}").expect("manifest");
}

fn decode_body(resp: &serde_json::Value) -> Vec<u8> {
    BASE64
        .decode(resp["body"].as_str().expect("body"))
        .expect("base64 body")
}

#[test]
fn install_caches_shell_and_serves_cache_first() {
    let workspace = temp_dir("outingd-assets");
    write_app_shell(&workspace);

    let mut sidecar = spawn_sidecar();
    sidecar.select_workspace(&workspace);

    let before = sidecar.request_ok("assets.fetch", json!({ "path": "./index.html" }));
    assert_eq!(before["source"], "network");

    let installed = sidecar.request_ok("assets.install", json!({}));
    assert_eq!(installed["cacheName"], "outing-app");
    // "./" and "./index.html" are the same entry.
    assert_eq!(installed["installed"], 4);

    let listed = sidecar.request_ok("assets.list", json!({}));
    let paths: Vec<&str> = listed["assets"]
        .as_array()
        .expect("assets")
        .iter()
        .filter_map(|a| a["path"].as_str())
        .collect();
    assert_eq!(paths, vec!["data.js", "index.html", "manifest.json", "script.js"]);

    // Cached copy wins even after the origin changes.
    std::fs::write(workspace.join("app").join("index.html"), "<html>v2</html>").expect("rewrite");
    let root = sidecar.request_ok("assets.fetch", json!({ "path": "./" }));
    assert_eq!(root["source"], "cache");
    assert_eq!(root["encoding"], "base64");
    assert_eq!(decode_body(&root), b"<html>outing</html>");

    assert_eq!(
        sidecar.request_err("assets.fetch", json!({ "path": "../secret.txt" })),
        "asset_fetch_failed"
    );

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn failed_install_keeps_nothing() {
    let workspace = temp_dir("outingd-assets-partial");
    write_app_shell(&workspace);
    std::fs::remove_file(workspace.join("app").join("manifest.json")).expect("remove manifest");

    let mut sidecar = spawn_sidecar();
    sidecar.select_workspace(&workspace);
    assert_eq!(
        sidecar.request_err("assets.install", json!({})),
        "asset_install_failed"
    );
    let listed = sidecar.request_ok("assets.list", json!({}));
    assert_eq!(listed["assets"].as_array().map(|a| a.len()), Some(0));

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn binary_assets_are_served_byte_for_byte() {
    let workspace = temp_dir("outingd-assets-binary");
    write_app_shell(&workspace);
    let logo: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0xFF, 0xFE, 0x00, 0x80];
    std::fs::write(workspace.join("app").join("logo.png"), logo).expect("write logo");

    let mut sidecar = spawn_sidecar();
    sidecar.select_workspace(&workspace);
    sidecar.login();
    sidecar.request_ok(
        "setup.update",
        json!({ "section": "assets", "patch": { "files": ["./", "./logo.png"] } }),
    );
    sidecar.request_ok("assets.install", json!({}));

    let fetched = sidecar.request_ok("assets.fetch", json!({ "path": "./logo.png" }));
    assert_eq!(fetched["source"], "cache");
    assert_eq!(fetched["size"], 8);
    assert_eq!(decode_body(&fetched), logo);

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn origin_dir_outside_the_workspace_is_rejected() {
    let workspace = temp_dir("outingd-assets-origin");
    write_app_shell(&workspace);

    let mut sidecar = spawn_sidecar();
    sidecar.select_workspace(&workspace);
    for dir in ["/", "/etc", "..", "app/../.."] {
        assert_eq!(
            sidecar.request_err(
                "assets.fetch",
                json!({ "path": "etc/hostname", "originDir": dir })
            ),
            "bad_params",
            "originDir {dir} was accepted"
        );
        assert_eq!(
            sidecar.request_err("assets.install", json!({ "originDir": dir })),
            "bad_params"
        );
    }

    sidecar.login();
    assert_eq!(
        sidecar.request_err(
            "setup.update",
            json!({ "section": "assets", "patch": { "originDir": "/" } })
        ),
        "bad_params"
    );
    let fetched = sidecar.request_ok("assets.fetch", json!({ "path": "./script.js", "originDir": "app" }));
    assert_eq!(fetched["source"], "network");

    let _ = std::fs::remove_dir_all(workspace);
}
