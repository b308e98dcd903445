//! Provider selection: builds the generation invoker from configuration.

use std::sync::Arc;
use std::time::Duration;

use tracing::error;
use veridian_config::GenerationConfig;
use veridian_core::generation::GenerationService;

use crate::gemini::{DEFAULT_BASE_URL as GEMINI_BASE_URL, GeminiProvider};
use crate::invoker::GenerationInvoker;
use crate::openai_compat::OpenAiCompatProvider;

/// Build the invoker for the configured provider.
///
/// Without an API key the invoker is permanently unconfigured. An
/// OpenAI-compatible provider with no known endpoint and no `api_url` is
/// treated the same way.
pub fn build_from_config(config: &GenerationConfig) -> GenerationInvoker {
    let timeout = Duration::from_secs(config.timeout_secs);
    let Some(base_url) = endpoint(config) else {
        error!(
            provider = %config.provider,
            "Failed to configure AI service: unknown provider and no api_url set; chat replies are disabled"
        );
        return GenerationInvoker::unconfigured();
    };
    GenerationInvoker::configure(config.api_key.as_deref(), timeout, |key| {
        build_service(config, base_url, key, timeout)
    })
}

/// The endpoint to call: `api_url` if set, else the provider's well-known one.
fn endpoint(config: &GenerationConfig) -> Option<String> {
    config
        .api_url
        .clone()
        .or_else(|| default_base_url(&config.provider).map(String::from))
}

fn build_service(
    config: &GenerationConfig,
    base_url: String,
    api_key: &str,
    timeout: Duration,
) -> Arc<dyn GenerationService> {
    if config.provider == "gemini" {
        return Arc::new(
            GeminiProvider::new(api_key, &config.model)
                .with_base_url(base_url)
                .with_timeout(timeout),
        );
    }

    Arc::new(
        OpenAiCompatProvider::new(&config.provider, base_url, api_key, &config.model)
            .with_timeout(timeout),
    )
}

/// Default base URL for the providers Veridian knows by name.
fn default_base_url(provider_name: &str) -> Option<&'static str> {
    match provider_name {
        "gemini" => Some(GEMINI_BASE_URL),
        "openrouter" => Some("https://openrouter.ai/api/v1"),
        "openai" => Some("https://api.openai.com/v1"),
        "ollama" => Some("http://localhost:11434/v1"),
        "groq" => Some("https://api.groq.com/openai/v1"),
        "together" => Some("https://api.together.xyz/v1"),
        "vllm" => Some("http://localhost:8000/v1"),
        _ => None,
    }
}
