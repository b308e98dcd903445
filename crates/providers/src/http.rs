//! HTTP helpers shared by the REST providers.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use veridian_core::error::ProviderError;

/// Longest provider error body carried into an error message.
const MAX_ERROR_BODY: usize = 300;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A client whose whole request, body included, is bounded by `request_timeout`.
pub(crate) fn client(request_timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT.min(request_timeout))
        .timeout(request_timeout)
        .build()
        .unwrap_or_default()
}

/// Convert a `reqwest` failure, dropping the request URL from the message.
pub(crate) fn transport_error(err: reqwest::Error) -> ProviderError {
    let err = err.without_url();
    if err.is_timeout() {
        ProviderError::Timeout(err.to_string())
    } else if err.is_decode() {
        ProviderError::MalformedResponse(err.to_string())
    } else {
        ProviderError::Network(err.to_string())
    }
}

/// Classify a non-success HTTP status.
pub(crate) fn status_error(status: StatusCode, headers: &HeaderMap, body: &str) -> ProviderError {
    match status.as_u16() {
        429 => ProviderError::RateLimited {
            retry_after_secs: headers
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(5),
        },
        401 | 403 => ProviderError::AuthenticationFailed(
            "Invalid API key or insufficient permissions".into(),
        ),
        code => ProviderError::ApiError {
            status_code: code,
            message: error_message(body),
        },
    }
}

/// Pull `error.message` out of a JSON error body, or fall back to the raw text.
fn error_message(body: &str) -> String {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.trim().to_string());
    if message.chars().count() > MAX_ERROR_BODY {
        let truncated: String = message.chars().take(MAX_ERROR_BODY).collect();
        format!("{truncated}…")
    } else {
        message
    }
}
