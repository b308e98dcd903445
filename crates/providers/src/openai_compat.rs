//! OpenAI-compatible provider implementation.
//!
//! Works with: OpenAI, OpenRouter, Ollama, vLLM, Together AI, Groq, and any
//! endpoint exposing `/v1/chat/completions`. The prompt is sent as a single
//! user message.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use veridian_core::error::ProviderError;
use veridian_core::generation::GenerationService;

use crate::http;

/// An OpenAI-compatible chat-completions client.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client: http::client(crate::invoker::DEFAULT_TIMEOUT),
        }
    }

    /// Bound every HTTP request this provider makes by `timeout`.
    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.client = http::client(timeout);
        self
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "stream": false,
        })
    }
}

fn extract_text(response: ApiResponse) -> Result<String, ProviderError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::MalformedResponse("No choices in response".into()))?;
    Ok(choice.message.content.unwrap_or_default())
}

#[async_trait]
impl GenerationService for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!(provider = %self.name, model = %self.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(http::transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            return Err(http::status_error(status, &headers, &body));
        }

        let api_response: ApiResponse = response.json().await.map_err(|e| {
            ProviderError::MalformedResponse(format!(
                "Failed to parse response: {}",
                e.without_url()
            ))
        })?;

        extract_text(api_response)
    }
}

// --- OpenAI API types ---

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_is_single_user_message() {
        let provider = OpenAiCompatProvider::new("openai", "https://api.openai.com/v1/", "k", "gpt-4o");
        let body = provider.request_body("Insulate the attic?");
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Insulate the attic?");
        assert_eq!(provider.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn extracts_first_choice() {
        let resp: ApiResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Seal drafts."}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(resp).unwrap(), "Seal drafts.");
    }

    #[test]
    fn null_content_is_empty_success() {
        let resp: ApiResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert_eq!(extract_text(resp).unwrap(), "");
    }

    #[test]
    fn no_choices_is_malformed() {
        let resp: ApiResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            extract_text(resp),
            Err(ProviderError::MalformedResponse(_))
        ));
    }
}
