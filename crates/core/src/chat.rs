//! Chat request, context, and outcome types.
//!
//! These are the value objects that flow through the chat pipeline:
//! request → admission → context → prompt → reply. All of them are
//! request-local and never shared between tasks.

use serde::{Deserialize, Serialize};

use crate::record::Record;

/// An inbound chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Opaque caller identity, used as the rate-limit key
    pub user_id: String,

    /// Untrusted free text from the user
    pub message: String,
}

impl ChatRequest {
    pub fn new(user_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            message: message.into(),
        }
    }
}

/// Profile and latest audit answers for one user, fetched fresh per request.
#[derive(Debug, Clone, PartialEq)]
pub struct UserContext {
    pub profile: Record,
    pub latest_audit: Record,
}

impl UserContext {
    pub fn new(profile: Option<Record>, latest_audit: Option<Record>) -> Self {
        Self {
            profile: profile.unwrap_or_else(Record::profile_not_found),
            latest_audit: latest_audit.unwrap_or_default(),
        }
    }
}

/// The single outcome of a chat request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatResult {
    /// Generated, non-blank reply
    Reply(String),
    /// The caller exceeded its request budget for the current window
    RateLimited,
    /// The generation service was never configured
    ServiceUnavailable,
    /// The generation call failed; detail is safe to show
    UpstreamError(String),
    /// The generation call succeeded but returned nothing usable
    EmptyUpstreamResponse,
    /// Context retrieval or orchestration fault; detail is for logs only
    InternalError(String),
}

impl ChatResult {
    /// Stable machine-readable name of the outcome.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatResult::Reply(_) => "reply",
            ChatResult::RateLimited => "rate_limited",
            ChatResult::ServiceUnavailable => "service_unavailable",
            ChatResult::UpstreamError(_) => "upstream_error",
            ChatResult::EmptyUpstreamResponse => "empty_reply",
            ChatResult::InternalError(_) => "internal_error",
        }
    }

    pub fn is_reply(&self) -> bool {
        matches!(self, ChatResult::Reply(_))
    }
}
