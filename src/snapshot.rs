use crate::error::{OutingError, Result};
use crate::model::StudentRecord;

const ASSIGNMENT_TARGET: &str = "window.students";

/// Built-in default dataset, used when the workspace has no `data.js`.
pub const BUILTIN_DATASET: &str = include_str!("../data/students.js");

/// Renders the roster as a static-dataset file: an assignment statement
/// wrapping a JSON array.
pub fn render_snapshot(records: &[StudentRecord]) -> Result<String> {
    let body = serde_json::to_string_pretty(records)
        .map_err(|e| OutingError::BadSnapshot(e.to_string()))?;
    Ok(format!("{} = {};\n", ASSIGNMENT_TARGET, body))
}

/// Accepts `window.students = [...];` or a bare JSON array.
pub fn parse_snapshot(text: &str) -> Result<Vec<StudentRecord>> {
    let trimmed = text.trim();
    let payload = if trimmed.starts_with('[') {
        trimmed
    } else {
        let Some(rest) = trimmed.strip_prefix(ASSIGNMENT_TARGET) else {
            return Err(OutingError::BadSnapshot(format!(
                "expected `{} = [...]` or a JSON array",
                ASSIGNMENT_TARGET
            )));
        };
        let Some(rest) = rest.trim_start().strip_prefix('=') else {
            return Err(OutingError::BadSnapshot(format!(
                "missing `=` after {}",
                ASSIGNMENT_TARGET
            )));
        };
        rest.trim().trim_end_matches(';').trim_end()
    };
    serde_json::from_str(payload).map_err(|e| OutingError::BadSnapshot(e.to_string()))
}
