use serde_json::json;

use crate::error::OutingError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub fn domain_err(
    id: &str,
    e: &OutingError,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let details = match (e, details) {
        (_, Some(d)) => Some(d),
        (OutingError::IndexOutOfRange { index, len }, None) => {
            Some(json!({ "index": index, "len": len }))
        }
        (OutingError::MissingField(field), None) => Some(json!({ "field": field })),
        _ => None,
    };
    err(id, e.code(), e.to_string(), details)
}

pub fn no_workspace(id: &str) -> serde_json::Value {
    err(id, "no_workspace", "select a workspace first", None)
}
