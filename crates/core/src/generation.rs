//! GenerationService trait: the abstraction over text-generation backends.
//!
//! A service takes a fully composed prompt and returns the generated text.
//! It knows nothing about users, rate limits, or prompt layout.
//!
//! Implementations: Gemini, OpenAI-compatible endpoints.

use async_trait::async_trait;

use crate::error::ProviderError;

/// The core GenerationService trait.
///
/// The chat pipeline calls `generate_text()` without knowing which provider
/// is behind it. An empty string is a valid success value; deciding whether
/// an empty reply is acceptable is the caller's business.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// A human-readable name for this provider (e.g., "gemini", "openrouter").
    fn name(&self) -> &str;

    /// Generate text for a single prompt.
    async fn generate_text(&self, prompt: &str) -> Result<String, ProviderError>;
}
