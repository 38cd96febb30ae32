// Error types for backend calls and the message each one shows the user.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Anything that can go wrong talking to the backend. `Display` is the
/// single human-readable message put in the form's error banner.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network failure, timeout or a request that could not be built.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response, already reduced to its best message.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// 2xx response without the data the caller needs.
    #[error("{0}")]
    MalformedResponse(String),
}

impl ApiError {
    /// Build the error for a non-2xx response. The message is picked in
    /// this order: backend `detail`, a generic `message`/`error` field,
    /// then `"<action> failed: <status line>"`.
    pub fn rejected(action: &str, status: StatusCode, body: &str) -> Self {
        let message = message_from_body(body).unwrap_or_else(|| format!("{} failed: {}", action, status));
        ApiError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

/// Pull the most specific message out of an error body, if it is JSON.
pub fn message_from_body(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    detail_message(&value).or_else(|| {
        ["message", "error"]
            .iter()
            .find_map(|key| non_empty_str(value.get(*key)))
    })
}

// `detail` is a string for application errors, or a list of
// `{loc, msg, type}` objects for request validation errors.
fn detail_message(value: &Value) -> Option<String> {
    match value.get("detail")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(|item| non_empty_str(item.get("msg"))),
        _ => None,
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}
