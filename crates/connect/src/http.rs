//! Shared HTTP plumbing: client construction, error classification and
//! response parsing.

use std::time::Duration;

use log::debug;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use brokersync_core::errors::{Error, Result};

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Builds a `reqwest` client with the given request timeout.
pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Configuration(format!("Failed to initialize HTTP client: {}", e)))
}

/// Maps a transport-level failure to an engine error.
pub(crate) fn transport_error(context: &str, err: reqwest::Error) -> Error {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        Error::TransientNetwork(format!("{}: {}", context, err))
    } else if err.is_builder() {
        Error::Configuration(format!("{}: {}", context, err))
    } else {
        Error::Unexpected(format!("{}: {}", context, err))
    }
}

/// Maps a non-success HTTP status to an engine error.
pub fn classify_status(context: &str, status: StatusCode, body: &str) -> Error {
    let message = format!("{} ({}): {}", context, status, error_message(body));
    match status.as_u16() {
        401 | 403 => Error::Authentication(message),
        408 | 429 => Error::TransientNetwork(message),
        400 | 422 => Error::Validation(message),
        404 => Error::NotFound(message),
        s if (500..600).contains(&s) => Error::TransientNetwork(message),
        _ => Error::Unexpected(message),
    }
}

/// Pulls a readable message out of an error body.
///
/// Understands `{"message": "..."}`, `{"message": ["...", "..."]}` and
/// `{"error": "..."}`; anything else is truncated raw text.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        match value.get("message") {
            Some(serde_json::Value::String(s)) => return s.clone(),
            Some(serde_json::Value::Array(items)) => {
                return items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join("; ")
            }
            _ => {}
        }
        if let Some(s) = value.get("error").and_then(|v| v.as_str()) {
            return s.to_string();
        }
    }
    body.chars().take(200).collect()
}

/// Reads the body of a response, converting error statuses.
pub(crate) async fn read_body(context: &str, response: reqwest::Response) -> Result<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(context, e))?;

    if !status.is_success() {
        debug!("{} failed with {}: {}", context, status, body);
        return Err(classify_status(context, status, &body));
    }
    Ok(body)
}

/// Parses a JSON response, converting error statuses.
pub(crate) async fn parse_response<T: DeserializeOwned>(
    context: &str,
    response: reqwest::Response,
) -> Result<T> {
    let body = read_body(context, response).await?;
    serde_json::from_str(&body).map_err(|e| {
        Error::Unexpected(format!(
            "{}: failed to parse response: {} - {}",
            context,
            e,
            body.chars().take(200).collect::<String>()
        ))
    })
}
