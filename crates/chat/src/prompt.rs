//! Prompt composition.
//!
//! Order is fixed: directive, profile, latest audit, quoted user message.
//! Records render key-sorted, so equal inputs give byte-equal prompts.

use veridian_core::chat::UserContext;

pub const DEFAULT_DIRECTIVE: &str = "You are Veridian, a friendly AI home energy advisor.
- Provide concise, positive, safe, and actionable advice based on the user's data.
- Focus ONLY on home energy efficiency, sustainability, and related savings.
- Politely decline any requests that are off-topic.";

#[derive(Debug, Clone)]
pub struct PromptBuilder {
    directive: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_DIRECTIVE)
    }
}

impl PromptBuilder {
    pub fn new(directive: impl Into<String>) -> Self {
        Self {
            directive: directive.into(),
        }
    }

    /// Builder with the configured directive, or the built-in one.
    pub fn from_override(directive: Option<&str>) -> Self {
        match directive.map(str::trim).filter(|d| !d.is_empty()) {
            Some(d) => Self::new(d),
            None => Self::default(),
        }
    }

    pub fn directive(&self) -> &str {
        &self.directive
    }

    pub fn build(&self, context: &UserContext, message: &str) -> String {
        build(&self.directive, context, message)
    }
}

pub fn build(directive: &str, context: &UserContext, message: &str) -> String {
    format!(
        "{directive}\n\nUser Profile: {}\nLatest Home Audit: {}\n\nUser message: \"{message}\"",
        context.profile, context.latest_audit
    )
}
