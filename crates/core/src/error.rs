//! Error types for the Veridian domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error type; the chat orchestrator folds
//! all of them into a single `ChatResult`.

use thiserror::Error;

/// Transport-level failures reported by a `GenerationService` implementation.
///
/// Messages must never carry the API key or a URL containing it.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

/// The closed failure taxonomy of the generation invoker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// No usable credential at process start; persists until restart.
    #[error("AI service is not configured or available")]
    ServiceUnavailable,

    /// The provider call failed (HTTP error, network, timeout).
    #[error("AI service call failed: {0}")]
    UpstreamCallFailed(String),

    /// Anything else that went wrong while talking to the provider.
    #[error("An unexpected error occurred with the AI service: {0}")]
    UpstreamUnexpectedFailure(String),
}

impl From<ProviderError> for GenerationError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::MalformedResponse(detail) => {
                GenerationError::UpstreamUnexpectedFailure(detail)
            }
            other => GenerationError::UpstreamCallFailed(other.to_string()),
        }
    }
}

/// Failure to assemble a user's context. "No data" is not an error.
#[derive(Debug, Clone, Error)]
pub enum ContextError {
    #[error("Context unavailable: {0}")]
    Unavailable(String),
}

/// Storage-level faults from a `DocumentStore` backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Corrupt document {document}: {reason}")]
    Corrupt { document: String, reason: String },
}

impl From<StoreError> for ContextError {
    fn from(err: StoreError) -> Self {
        ContextError::Unavailable(err.to_string())
    }
}
