use chrono::{Local, NaiveDate};
use serde_json::{json, Value};

use crate::controller::TripForm;
use crate::document::{ConsentModelRenderer, DocumentRenderer};
use crate::ipc::error::{domain_err, err, no_workspace, ok};
use crate::ipc::params::{form_str, optional_str};
use crate::ipc::types::{AppState, Request};

fn handle_outing_generate(state: &mut AppState, req: &Request) -> Value {
    let Some(ws) = state.workspace.as_ref() else {
        return no_workspace(&req.id);
    };
    let form = TripForm {
        out_date: form_str(&req.params, "outDate"),
        in_date: form_str(&req.params, "inDate"),
        outing_type: form_str(&req.params, "outingType"),
    };
    // `today` is only overridden by callers that need a fixed date stamp.
    let today = match optional_str(&req.params, "today") {
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(d) => d,
            Err(_) => return err(&req.id, "bad_params", "today must be YYYY-MM-DD", None),
        },
        None => Local::now().date_naive(),
    };

    match ws.selection.generate(&form, &ws.roster, today) {
        Ok(input) => {
            let document = ConsentModelRenderer.render(&input);
            ok(&req.id, json!({ "document": document }))
        }
        Err(e) => domain_err(&req.id, &e, None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "outing.generate" => Some(handle_outing_generate(state, req)),
        _ => None,
    }
}
