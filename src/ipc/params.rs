use serde_json::Value;

use crate::ipc::error::err;

pub fn required_str<'a>(id: &str, params: &'a Value, key: &str) -> Result<&'a str, Value> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| err(id, "bad_params", format!("missing {}", key), None))
}

pub fn optional_str<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

pub fn required_index(id: &str, params: &Value, key: &str) -> Result<usize, Value> {
    params
        .get(key)
        .and_then(|v| v.as_u64())
        .map(|n| n as usize)
        .ok_or_else(|| {
            err(
                id,
                "bad_params",
                format!("{} must be a non-negative integer", key),
                None,
            )
        })
}

/// Form fields may be absent, which the form controller reports itself.
pub fn form_str(params: &Value, key: &str) -> String {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}
