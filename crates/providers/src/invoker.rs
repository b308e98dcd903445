//! Generation invoker: the chat pipeline's only door to the AI service.
//!
//! Wraps an optional `GenerationService` and normalizes every failure into
//! `GenerationError`. The service is decided once at startup: without a
//! credential the invoker stays unconfigured for the life of the process and
//! answers `ServiceUnavailable` without touching the network.
//!
//! Each call runs as its own spawned task bounded by the configured timeout,
//! whether or not the caller is still waiting for it.
//! Timeouts and panics inside the provider surface as `GenerationError`s.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use veridian_core::error::GenerationError;
use veridian_core::generation::GenerationService;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

pub struct GenerationInvoker {
    service: Option<Arc<dyn GenerationService>>,
    timeout: Duration,
}

impl GenerationInvoker {
    /// An invoker backed by `service`.
    pub fn new(service: Arc<dyn GenerationService>, timeout: Duration) -> Self {
        Self {
            service: Some(service),
            timeout,
        }
    }

    /// An invoker that rejects every call with `ServiceUnavailable`.
    pub fn unconfigured() -> Self {
        Self {
            service: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Build the service from `api_key` if one is present and non-blank.
    ///
    /// `build` is never called when the key is missing.
    pub fn configure<F>(api_key: Option<&str>, timeout: Duration, build: F) -> Self
    where
        F: FnOnce(&str) -> Arc<dyn GenerationService>,
    {
        match api_key.map(str::trim).filter(|k| !k.is_empty()) {
            Some(key) => {
                let service = build(key);
                info!(provider = service.name(), timeout = ?timeout, "AI service configured");
                Self::new(service, timeout)
            }
            None => {
                error!("Failed to configure AI service: no API key set; chat replies are disabled");
                Self {
                    service: None,
                    timeout,
                }
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.service.is_some()
    }

    pub fn provider_name(&self) -> Option<&str> {
        self.service.as_deref().map(|s| s.name())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Generate text for `prompt`. Empty text is returned as-is.
    pub async fn generate(&self, prompt: String) -> Result<String, GenerationError> {
        let Some(service) = self.service.clone() else {
            return Err(GenerationError::ServiceUnavailable);
        };
        let provider = service.name().to_string();

        let timeout = self.timeout;
        // The deadline lives inside the task so it ends even if the caller is dropped.
        let task = tokio::spawn(async move {
            tokio::time::timeout(timeout, service.generate_text(&prompt)).await
        });

        match task.await {
            Err(join_error) => {
                error!(provider = %provider, error = %join_error, "Generation task failed");
                Err(GenerationError::UpstreamUnexpectedFailure(
                    "generation task aborted".into(),
                ))
            }
            Ok(Err(_elapsed)) => {
                warn!(provider = %provider, timeout = ?timeout, "Generation call timed out");
                Err(GenerationError::UpstreamCallFailed(format!(
                    "request timed out after {timeout:?}"
                )))
            }
            Ok(Ok(Err(provider_error))) => {
                error!(provider = %provider, error = %provider_error, "Generation call failed");
                Err(provider_error.into())
            }
            Ok(Ok(Ok(text))) => Ok(text),
        }
    }
}
