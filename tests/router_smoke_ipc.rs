use serde_json::json;

mod test_support;

use test_support::{spawn_sidecar, temp_dir};

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("outingd-router-smoke");
    let bundle_out = workspace.join("smoke-backup.outing.zip");

    let mut sidecar = spawn_sidecar();
    sidecar.select_workspace(&workspace);
    sidecar.login();

    let calls = [
        ("health", json!({})),
        ("students.list", json!({})),
        ("students.get", json!({ "index": 0 })),
        ("students.exportSnapshot", json!({})),
        ("admin.status", json!({})),
        ("selection.set", json!({ "value": 1 })),
        ("selection.get", json!({})),
        ("pin.enterDigit", json!({ "digit": "0" })),
        ("pin.backspace", json!({})),
        ("pin.status", json!({})),
        ("outing.generate", json!({})),
        ("setup.get", json!({})),
        ("assets.list", json!({})),
        ("assets.fetch", json!({ "path": "./" })),
        ("backup.exportBundle", json!({ "outPath": bundle_out.to_string_lossy() })),
        ("backup.importBundle", json!({ "inPath": bundle_out.to_string_lossy() })),
        ("students.reset", json!({})),
        ("admin.logout", json!({})),
    ];
    for (method, params) in calls {
        let resp = sidecar.request(method, params);
        assert_ne!(
            resp.pointer("/error/code").and_then(|v| v.as_str()),
            Some("not_implemented"),
            "unexpected unknown method for {}",
            method
        );
    }

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn malformed_request_lines_get_bad_json_and_the_loop_continues() {
    use std::io::{BufRead, Write};

    let mut sidecar = spawn_sidecar();
    writeln!(sidecar.stdin, "{{not json").expect("write");
    sidecar.stdin.flush().expect("flush");
    let mut line = String::new();
    sidecar.reader.read_line(&mut line).expect("read");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse");
    assert_eq!(value["error"]["code"], "bad_json");

    let health = sidecar.request_ok("health", json!({}));
    assert!(health["version"].is_string());
}
