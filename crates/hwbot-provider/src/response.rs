use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::ApiError,
    models::{Latest, WorkItem},
};

/// Picks the most recent work item out of a raw `homework_statuses` payload.
///
/// Checks run in order and the first failure wins. An empty `homeworks`
/// list is not an error: it yields [`Latest::NoNewStatus`].
pub fn extract_latest(raw: &Value) -> Result<Latest, ApiError> {
    let Some(response) = raw.as_object() else {
        return Err(ApiError::MalformedResponse(format!(
            "expected a json object, got {}",
            json_type(raw)
        )));
    };

    if !response.contains_key("homeworks") && !response.contains_key("current_time") {
        return Err(ApiError::MissingField("homeworks".into()));
    }

    let homeworks = match response.get("homeworks") {
        Some(Value::Array(homeworks)) => homeworks,
        Some(other) => {
            return Err(ApiError::MalformedResponse(format!(
                "expected homeworks to be a list, got {}",
                json_type(other)
            )))
        }
        None => return Err(ApiError::MissingField("homeworks".into())),
    };

    let Some(first) = homeworks.first() else {
        return Ok(Latest::NoNewStatus);
    };

    if !first.is_object() {
        return Err(ApiError::MalformedResponse(format!(
            "expected homework to be a json object, got {}",
            json_type(first)
        )));
    }

    let item = WorkItem::deserialize(first)
        .map_err(|e| ApiError::MalformedResponse(format!("invalid homework record: {e}")))?;

    Ok(Latest::Item(item))
}

/// The server's `current_time`, used as the next `from_date`.
pub fn server_time(raw: &Value) -> Option<i64> {
    raw.get("current_time").and_then(Value::as_i64)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
