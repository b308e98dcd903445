//! Chat orchestrator: runs one request through the pipeline.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use veridian_config::AppConfig;
use veridian_core::chat::{ChatRequest, ChatResult};
use veridian_core::error::GenerationError;
use veridian_core::store::DocumentStore;
use veridian_providers::GenerationInvoker;

use crate::context::ContextFetcher;
use crate::prompt::PromptBuilder;
use crate::rate_limiter::RateLimiter;

/// Shared by every request; all fields are safe for concurrent use.
pub struct ChatOrchestrator {
    limiter: Arc<RateLimiter>,
    fetcher: ContextFetcher,
    prompts: PromptBuilder,
    invoker: GenerationInvoker,
}

impl ChatOrchestrator {
    pub fn new(
        limiter: Arc<RateLimiter>,
        fetcher: ContextFetcher,
        prompts: PromptBuilder,
        invoker: GenerationInvoker,
    ) -> Self {
        Self {
            limiter,
            fetcher,
            prompts,
            invoker,
        }
    }

    /// Wire the pipeline from configuration around an existing store and invoker.
    pub fn from_config(
        config: &AppConfig,
        store: Arc<dyn DocumentStore>,
        invoker: GenerationInvoker,
    ) -> Self {
        Self::new(
            Arc::new(RateLimiter::from_config(&config.chat)),
            ContextFetcher::new(store, config.chat.max_concurrent_fetches),
            PromptBuilder::from_override(config.chat.system_directive.as_deref()),
            invoker,
        )
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn invoker(&self) -> &GenerationInvoker {
        &self.invoker
    }

    pub async fn handle(&self, request: &ChatRequest) -> ChatResult {
        self.handle_at(request, Utc::now()).await
    }

    /// Run the pipeline with an explicit admission time.
    pub async fn handle_at(&self, request: &ChatRequest, now: DateTime<Utc>) -> ChatResult {
        let user_id = request.user_id.as_str();

        if !self.limiter.admit(user_id, now) {
            warn!(user_id, "Rate limit exceeded");
            return ChatResult::RateLimited;
        }

        let context = match self.fetcher.fetch(user_id).await {
            Ok(context) => context,
            Err(e) => {
                error!(user_id, error = %e, "Failed to fetch user context");
                return ChatResult::InternalError(e.to_string());
            }
        };

        let prompt = self.prompts.build(&context, &request.message);

        let result = match self.invoker.generate(prompt).await {
            Ok(text) if text.trim().is_empty() => ChatResult::EmptyUpstreamResponse,
            Ok(text) => ChatResult::Reply(text),
            Err(GenerationError::ServiceUnavailable) => ChatResult::ServiceUnavailable,
            Err(
                GenerationError::UpstreamCallFailed(detail)
                | GenerationError::UpstreamUnexpectedFailure(detail),
            ) => ChatResult::UpstreamError(detail),
        };

        info!(user_id, outcome = result.kind(), "Chat request finished");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeDelta;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use veridian_core::error::{ProviderError, StoreError};
    use veridian_core::generation::GenerationService;
    use veridian_core::record::Record;
    use veridian_core::store::AuditRecord;
    use veridian_store::InMemoryStore;

    /// Replays a fixed outcome and remembers every prompt it was sent.
    struct ScriptedService {
        outcome: Result<String, ProviderError>,
        prompts: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedService {
        fn new(outcome: Result<String, ProviderError>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                prompts: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl GenerationService for ScriptedService {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate_text(&self, prompt: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.outcome.clone()
        }
    }

    struct FailingStore;

    impl DocumentStore for FailingStore {
        fn name(&self) -> &str {
            "failing"
        }

        fn get_profile(&self, _user_id: &str) -> Result<Option<Record>, StoreError> {
            Err(StoreError::Storage("deadline exceeded".into()))
        }

        fn get_latest_audit(&self, _user_id: &str) -> Result<Option<AuditRecord>, StoreError> {
            Err(StoreError::Storage("deadline exceeded".into()))
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn orchestrator(
        store: Arc<dyn DocumentStore>,
        service: Option<Arc<ScriptedService>>,
        max_requests: usize,
    ) -> ChatOrchestrator {
        let invoker = match service {
            Some(s) => GenerationInvoker::new(s, Duration::from_secs(15)),
            None => GenerationInvoker::unconfigured(),
        };
        ChatOrchestrator::new(
            Arc::new(RateLimiter::new(max_requests, TimeDelta::seconds(60))),
            ContextFetcher::new(store, 4),
            PromptBuilder::default(),
            invoker,
        )
    }

    #[tokio::test]
    async fn reply_uses_profile_and_audit() {
        let store = InMemoryStore::new();
        store.put_profile("u2", Record::new().with("home_size_sqft", 2000i64));
        store.add_audit(AuditRecord {
            user_id: "u2".into(),
            timestamp: at(0),
            answers: Record::new().with("led_bulbs", false),
        });
        let service = ScriptedService::new(Ok("Switch to LED bulbs.".into()));
        let chat = orchestrator(Arc::new(store), Some(service.clone()), 5);

        let result = chat
            .handle_at(&ChatRequest::new("u2", "How do I save energy?"), at(1))
            .await;
        assert_eq!(result, ChatResult::Reply("Switch to LED bulbs.".into()));

        let prompts = service.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("home_size_sqft: 2000"));
        assert!(prompts[0].contains("led_bulbs: false"));
        assert!(prompts[0].ends_with("User message: \"How do I save energy?\""));
    }

    #[tokio::test]
    async fn over_limit_requests_never_reach_the_service() {
        let service = ScriptedService::new(Ok("ok".into()));
        let chat = orchestrator(Arc::new(InMemoryStore::new()), Some(service.clone()), 2);
        let req = ChatRequest::new("u1", "hi");

        assert!(chat.handle_at(&req, at(0)).await.is_reply());
        assert!(chat.handle_at(&req, at(10)).await.is_reply());
        assert_eq!(chat.handle_at(&req, at(20)).await, ChatResult::RateLimited);
        assert!(chat.handle_at(&req, at(65)).await.is_reply());
        assert_eq!(service.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn unconfigured_service_is_unavailable() {
        let chat = orchestrator(Arc::new(InMemoryStore::new()), None, 5);
        let result = chat.handle(&ChatRequest::new("u1", "hi")).await;
        assert_eq!(result, ChatResult::ServiceUnavailable);
    }

    #[tokio::test]
    async fn blank_reply_is_empty_upstream_response() {
        for text in ["", "   \n\t"] {
            let service = ScriptedService::new(Ok(text.into()));
            let chat = orchestrator(Arc::new(InMemoryStore::new()), Some(service), 5);
            let result = chat.handle(&ChatRequest::new("u1", "hi")).await;
            assert_eq!(result, ChatResult::EmptyUpstreamResponse);
        }
    }

    #[tokio::test]
    async fn upstream_failures_carry_detail() {
        let service = ScriptedService::new(Err(ProviderError::RateLimited {
            retry_after_secs: 30,
        }));
        let chat = orchestrator(Arc::new(InMemoryStore::new()), Some(service), 5);
        match chat.handle(&ChatRequest::new("u1", "hi")).await {
            ChatResult::UpstreamError(detail) => assert!(detail.contains("30")),
            other => panic!("unexpected: {other:?}"),
        }

        let service = ScriptedService::new(Err(ProviderError::MalformedResponse(
            "no candidates".into(),
        )));
        let chat = orchestrator(Arc::new(InMemoryStore::new()), Some(service), 5);
        assert!(matches!(
            chat.handle(&ChatRequest::new("u1", "hi")).await,
            ChatResult::UpstreamError(_)
        ));
    }

    #[tokio::test]
    async fn store_fault_is_internal_error_and_skips_generation() {
        let service = ScriptedService::new(Ok("unused".into()));
        let chat = orchestrator(Arc::new(FailingStore), Some(service.clone()), 5);
        match chat.handle(&ChatRequest::new("u1", "hi")).await {
            ChatResult::InternalError(detail) => assert!(detail.contains("deadline exceeded")),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_requests_still_consume_budget() {
        let chat = orchestrator(Arc::new(FailingStore), None, 1);
        let req = ChatRequest::new("u1", "hi");
        assert!(matches!(
            chat.handle_at(&req, at(0)).await,
            ChatResult::InternalError(_)
        ));
        assert_eq!(chat.handle_at(&req, at(1)).await, ChatResult::RateLimited);
    }
}
