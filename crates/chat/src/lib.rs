//! The chat pipeline.
//!
//! Every request runs the same sequence:
//!
//! 1. **Admit** the caller against its sliding rate-limit window
//! 2. **Fetch context** (profile + latest audit) off the async workers
//! 3. **Build the prompt** from the directive, context, and message
//! 4. **Generate** a reply through the configured service
//!
//! Each stage can end the request; the final outcome is always exactly one
//! `ChatResult`.

pub mod context;
pub mod orchestrator;
pub mod prompt;
pub mod rate_limiter;

pub use context::ContextFetcher;
pub use orchestrator::ChatOrchestrator;
pub use prompt::{DEFAULT_DIRECTIVE, PromptBuilder};
pub use rate_limiter::RateLimiter;
