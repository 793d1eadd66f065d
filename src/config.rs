//! Workspace settings sections, stored as JSON in the `settings` table and
//! merged over compiled defaults. Each field is validated on the way in;
//! malformed saved values fall back to the default for that section.

use rusqlite::Connection;
use serde_json::{json, Map, Value};
use std::path::Path;
use std::time::Duration;

use crate::asset_cache::stays_inside;
use crate::db;
use crate::gate::AdminCredentials;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetupSection {
    Admin,
    Pin,
    Assets,
}

impl SetupSection {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "pin" => Some(Self::Pin),
            "assets" => Some(Self::Assets),
            _ => None,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Admin => "setup.admin",
            Self::Pin => "setup.pin",
            Self::Assets => "setup.assets",
        }
    }
}

fn default_section(section: SetupSection) -> Value {
    match section {
        SetupSection::Admin => json!({
            "sessionId": "OUTING-ADMIN",
            "mobile": "9000000000",
            "answer": "campus"
        }),
        SetupSection::Pin => json!({
            "retryDelayMs": 1000
        }),
        SetupSection::Assets => json!({
            "cacheName": "outing-app",
            "originDir": "app",
            "files": ["./", "./index.html", "./script.js", "./data.js", "./manifest.json"]
        }),
    }
}

fn parse_i64_range(v: &Value, key: &str, min: i64, max: i64) -> Result<i64, String> {
    let n = v
        .as_i64()
        .ok_or_else(|| format!("{} must be integer", key))?;
    if !(min..=max).contains(&n) {
        return Err(format!("{} must be in {}..={}", key, min, max));
    }
    Ok(n)
}

fn parse_string_max(v: &Value, key: &str, max_len: usize) -> Result<String, String> {
    let s = v.as_str().ok_or_else(|| format!("{} must be string", key))?;
    let s = s.trim();
    if s.len() > max_len {
        return Err(format!("{} length must be <= {}", key, max_len));
    }
    Ok(s.to_string())
}

fn parse_non_empty(v: &Value, key: &str, max_len: usize) -> Result<String, String> {
    let s = parse_string_max(v, key, max_len)?;
    if s.is_empty() {
        return Err(format!("{} must not be empty", key));
    }
    Ok(s)
}

fn merge_section_patch(
    section: SetupSection,
    current: &mut Value,
    patch: &Map<String, Value>,
) -> Result<(), String> {
    let obj = current
        .as_object_mut()
        .ok_or_else(|| "internal setup object must be a JSON object".to_string())?;
    for (k, v) in patch {
        match section {
            SetupSection::Admin => match k.as_str() {
                "sessionId" | "mobile" | "answer" => {
                    obj.insert(k.clone(), Value::String(parse_non_empty(v, k, 128)?));
                }
                _ => return Err(format!("unknown admin field: {}", k)),
            },
            SetupSection::Pin => match k.as_str() {
                "retryDelayMs" => {
                    obj.insert(k.clone(), Value::from(parse_i64_range(v, k, 0, 60_000)?));
                }
                _ => return Err(format!("unknown pin field: {}", k)),
            },
            SetupSection::Assets => match k.as_str() {
                "cacheName" => {
                    obj.insert(k.clone(), Value::String(parse_non_empty(v, k, 256)?));
                }
                "originDir" => {
                    let dir = parse_non_empty(v, k, 256)?;
                    if !stays_inside(Path::new(&dir)) {
                        return Err("originDir must be a relative path inside the workspace".into());
                    }
                    obj.insert(k.clone(), Value::String(dir));
                }
                "files" => {
                    let items = v
                        .as_array()
                        .ok_or_else(|| "files must be an array of strings".to_string())?;
                    let mut files = Vec::with_capacity(items.len());
                    for item in items {
                        files.push(Value::String(parse_non_empty(item, "files[]", 512)?));
                    }
                    obj.insert(k.clone(), Value::Array(files));
                }
                _ => return Err(format!("unknown assets field: {}", k)),
            },
        }
    }
    Ok(())
}

pub fn load_section(conn: &Connection, section: SetupSection) -> anyhow::Result<Value> {
    let mut current = default_section(section);
    if let Some(saved) = db::settings_get_json(conn, section.key())? {
        if let Some(saved_obj) = saved.as_object() {
            let mut merged = current.clone();
            if merge_section_patch(section, &mut merged, saved_obj).is_ok() {
                current = merged;
            }
        }
    }
    Ok(current)
}

#[derive(Debug)]
pub enum UpdateError {
    Invalid(String),
    Storage(anyhow::Error),
}

/// Validates `patch` against `section` and persists the merged result.
pub fn update_section(
    conn: &Connection,
    section: SetupSection,
    patch: &Map<String, Value>,
) -> Result<Value, UpdateError> {
    let mut current = load_section(conn, section).map_err(UpdateError::Storage)?;
    merge_section_patch(section, &mut current, patch).map_err(UpdateError::Invalid)?;
    db::settings_set_json(conn, section.key(), &current).map_err(UpdateError::Storage)?;
    Ok(current)
}

fn str_field(v: &Value, key: &str) -> String {
    v.get(key)
        .and_then(|s| s.as_str())
        .unwrap_or_default()
        .to_string()
}

pub fn admin_credentials(conn: &Connection) -> anyhow::Result<AdminCredentials> {
    let v = load_section(conn, SetupSection::Admin)?;
    Ok(AdminCredentials {
        session_id: str_field(&v, "sessionId"),
        mobile: str_field(&v, "mobile"),
        answer: str_field(&v, "answer"),
    })
}

pub fn pin_retry_delay(conn: &Connection) -> anyhow::Result<Duration> {
    let v = load_section(conn, SetupSection::Pin)?;
    let ms = v.get("retryDelayMs").and_then(|n| n.as_u64()).unwrap_or(1000);
    Ok(Duration::from_millis(ms))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSettings {
    pub cache_name: String,
    pub origin_dir: String,
    pub files: Vec<String>,
}

pub fn asset_settings(conn: &Connection) -> anyhow::Result<AssetSettings> {
    let v = load_section(conn, SetupSection::Assets)?;
    let files = v
        .get("files")
        .and_then(|f| f.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    Ok(AssetSettings {
        cache_name: str_field(&v, "cacheName"),
        origin_dir: str_field(&v, "originDir"),
        files,
    })
}

/// All sections for display. The admin answer is never echoed back.
pub fn public_setup(conn: &Connection) -> anyhow::Result<Value> {
    Ok(json!({
        "admin": redact_admin(load_section(conn, SetupSection::Admin)?),
        "pin": load_section(conn, SetupSection::Pin)?,
        "assets": load_section(conn, SetupSection::Assets)?,
    }))
}

fn redact_admin(mut admin: Value) -> Value {
    if let Some(obj) = admin.as_object_mut() {
        let configured = obj
            .remove("answer")
            .and_then(|v| v.as_str().map(|s| !s.trim().is_empty()))
            .unwrap_or(false);
        obj.insert("answerConfigured".into(), Value::Bool(configured));
    }
    admin
}
