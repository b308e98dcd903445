//! Route handlers and the outward error format.
//!
//! Every failure is answered with `{"error": <code>, "message": <text>}`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use veridian_core::carbon::{Emissions, calculate_emissions};
use veridian_core::chat::{ChatRequest, ChatResult};
use veridian_core::error::StoreError;

use crate::SharedState;

const INTERNAL_MESSAGE: &str = "An internal error occurred. Please try again later.";

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// A failed request: status plus a stable machine-readable code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", INTERNAL_MESSAGE)
    }

    fn not_found(message: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    fn invalid_request(rejection: &JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.code.to_string(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

/// Map a pipeline outcome to its HTTP response.
pub fn chat_response(result: ChatResult) -> Response {
    let rejected = match result {
        ChatResult::Reply(reply) => return Json(ChatReply { reply }).into_response(),
        ChatResult::RateLimited => ApiError::new(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "Too many requests. Please wait a minute before trying again.",
        ),
        ChatResult::ServiceUnavailable => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "service_unavailable",
            "AI service is not configured or available.",
        ),
        ChatResult::UpstreamError(detail) => ApiError::new(
            StatusCode::BAD_GATEWAY,
            "upstream_error",
            format!("The AI service failed to respond: {detail}"),
        ),
        ChatResult::EmptyUpstreamResponse => ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "empty_reply",
            "The AI service returned an empty reply. Please rephrase your question.",
        ),
        ChatResult::InternalError(_) => ApiError::internal(),
    };
    rejected.into_response()
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub version: &'static str,
}

pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Veridian API is running",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn chat_handler(
    State(state): State<SharedState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(error = %rejection, "Rejected malformed chat request");
            return ApiError::invalid_request(&rejection).into_response();
        }
    };

    info!(
        user_id = %request.user_id,
        message_len = request.message.len(),
        "Chat request received"
    );

    chat_response(state.chat.handle(&request).await)
}

pub async fn user_handler(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Result<Json<veridian_core::Record>, ApiError> {
    let store = state.store.clone();
    let lookup = user_id.clone();
    let profile = run_blocking(move || store.get_profile(&lookup)).await?;

    match profile {
        Some(profile) => Ok(Json(profile)),
        None => {
            info!(user_id = %user_id, "Profile not found");
            Err(ApiError::not_found("User not found"))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CarbonRequest {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct CarbonResponse {
    pub emissions: Emissions,
}

pub async fn carbon_handler(
    State(state): State<SharedState>,
    body: Result<Json<CarbonRequest>, JsonRejection>,
) -> Result<Json<CarbonResponse>, ApiError> {
    let Json(request) = body.map_err(|r| ApiError::invalid_request(&r))?;

    let store = state.store.clone();
    let lookup = request.user_id.clone();
    let audit = run_blocking(move || store.get_latest_audit(&lookup)).await?;

    let Some(audit) = audit else {
        return Err(ApiError::not_found("No audit found for this user."));
    };

    Ok(Json(CarbonResponse {
        emissions: calculate_emissions(&audit.answers),
    }))
}

/// Run a blocking store call off the async workers; faults become 500s.
async fn run_blocking<T, F>(lookup: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(lookup).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            error!(error = %e, "Document store lookup failed");
            Err(ApiError::internal())
        }
        Err(e) => {
            error!(error = %e, "Document store task failed");
            Err(ApiError::internal())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{TimeDelta, Utc};
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use veridian_chat::{ChatOrchestrator, ContextFetcher, PromptBuilder, RateLimiter};
    use veridian_core::error::ProviderError;
    use veridian_core::generation::GenerationService;
    use veridian_core::record::Record;
    use veridian_core::store::{AuditRecord, DocumentStore};
    use veridian_providers::GenerationInvoker;
    use veridian_store::InMemoryStore;

    use crate::{GatewayState, build_router};

    struct FixedReply(Result<String, ProviderError>);

    #[async_trait]
    impl GenerationService for FixedReply {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn generate_text(&self, _prompt: &str) -> Result<String, ProviderError> {
            self.0.clone()
        }
    }

    struct DownStore;

    impl DocumentStore for DownStore {
        fn name(&self) -> &str {
            "down"
        }

        fn get_profile(&self, _user_id: &str) -> Result<Option<Record>, StoreError> {
            Err(StoreError::Storage("unreachable".into()))
        }

        fn get_latest_audit(&self, _user_id: &str) -> Result<Option<AuditRecord>, StoreError> {
            Err(StoreError::Storage("unreachable".into()))
        }
    }

    fn seeded_store() -> Arc<InMemoryStore> {
        let store = InMemoryStore::new();
        store.put_profile(
            "test-user",
            Record::new()
                .with("email", "test@veridian.com")
                .with("family_size", 4i64),
        );
        store.add_audit(AuditRecord {
            user_id: "test-user".into(),
            timestamp: Utc::now(),
            answers: Record::new()
                .with("fridge_age", "old")
                .with("insulation", "poor")
                .with("has_solar", true),
        });
        Arc::new(store)
    }

    fn app(
        store: Arc<dyn DocumentStore>,
        reply: Option<Result<String, ProviderError>>,
        max_requests: usize,
    ) -> axum::Router {
        let invoker = match reply {
            Some(outcome) => {
                GenerationInvoker::new(Arc::new(FixedReply(outcome)), Duration::from_secs(15))
            }
            None => GenerationInvoker::unconfigured(),
        };
        let chat = ChatOrchestrator::new(
            Arc::new(RateLimiter::new(max_requests, TimeDelta::seconds(60))),
            ContextFetcher::new(store.clone(), 4),
            PromptBuilder::default(),
            invoker,
        );
        build_router(Arc::new(GatewayState::new(Arc::new(chat), store)))
    }

    fn chat_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn root_reports_running() {
        let app = app(seeded_store(), None, 5);
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Veridian API is running");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn chat_returns_reply() {
        let app = app(seeded_store(), Some(Ok("Switch to LED bulbs.".into())), 5);
        let response = app
            .oneshot(chat_request(
                r#"{"user_id":"test-user","message":"How do I save energy?"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["reply"], "Switch to LED bulbs.");
    }

    #[tokio::test]
    async fn trailing_slash_route_is_served() {
        let app = app(seeded_store(), Some(Ok("ok".into())), 5);
        let req = Request::builder()
            .method("POST")
            .uri("/chat/")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"user_id":"u","message":"hi"}"#))
            .unwrap();
        assert_eq!(app.oneshot(req).await.unwrap().status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn third_request_in_window_is_429() {
        let app = app(seeded_store(), Some(Ok("ok".into())), 2);
        let body = r#"{"user_id":"u1","message":"hi"}"#;
        for _ in 0..2 {
            let response = app.clone().oneshot(chat_request(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        let response = app.oneshot(chat_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json_body(response).await["error"], "rate_limited");
    }

    #[tokio::test]
    async fn unconfigured_service_is_503() {
        let app = app(seeded_store(), None, 5);
        let response = app
            .oneshot(chat_request(r#"{"user_id":"u1","message":"hi"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(response).await["error"], "service_unavailable");
    }

    #[tokio::test]
    async fn upstream_failure_is_502_with_detail() {
        let failure = ProviderError::ApiError {
            status_code: 500,
            message: "model overloaded".into(),
        };
        let app = app(seeded_store(), Some(Err(failure)), 5);
        let response = app
            .oneshot(chat_request(r#"{"user_id":"u1","message":"hi"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert_eq!(body["error"], "upstream_error");
        assert!(body["message"].as_str().unwrap().contains("model overloaded"));
    }

    #[tokio::test]
    async fn blank_reply_is_422() {
        let app = app(seeded_store(), Some(Ok("  ".into())), 5);
        let response = app
            .oneshot(chat_request(r#"{"user_id":"u1","message":"hi"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(response).await["error"], "empty_reply");
    }

    #[tokio::test]
    async fn store_fault_is_500_without_detail() {
        let app = app(Arc::new(DownStore), Some(Ok("unused".into())), 5);
        let response = app
            .oneshot(chat_request(r#"{"user_id":"u1","message":"hi"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"], "internal_error");
        assert!(!body["message"].as_str().unwrap().contains("unreachable"));
    }

    /// Counts ERROR events from Veridian crates seen on the current thread.
    struct ErrorCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for ErrorCounter {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let meta = event.metadata();
            if *meta.level() == tracing::Level::ERROR && meta.target().starts_with("veridian") {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[tokio::test]
    async fn store_fault_is_logged_once() {
        use tracing_subscriber::layer::SubscriberExt;

        let errors = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(ErrorCounter(errors.clone()));
        let _guard = tracing::subscriber::set_default(subscriber);

        let app = app(Arc::new(DownStore), Some(Ok("unused".into())), 5);
        let response = app
            .oneshot(chat_request(r#"{"user_id":"u1","message":"hi"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_chat_body_is_400() {
        let app = app(seeded_store(), Some(Ok("ok".into())), 5);
        let response = app
            .oneshot(chat_request(r#"{"user_id":"u1"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "invalid_request");
    }

    #[tokio::test]
    async fn user_profile_lookup() {
        let app = app(seeded_store(), None, 5);
        let req = Request::builder()
            .uri("/users/test-user")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["email"], "test@veridian.com");

        let req = Request::builder()
            .uri("/users/ghost")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"], "not_found");
    }

    #[tokio::test]
    async fn carbon_calculation_from_latest_audit() {
        let app = app(seeded_store(), None, 5);
        let req = Request::builder()
            .method("POST")
            .uri("/carbon/calculate")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"user_id":"test-user"}"#))
            .unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let emissions = &json_body(response).await["emissions"];
        assert_eq!(emissions["appliances"], 450.0);
        assert_eq!(emissions["solar"], -2000.0);

        let req = Request::builder()
            .method("POST")
            .uri("/carbon/calculate")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"user_id":"ghost"}"#))
            .unwrap();
        assert_eq!(app.oneshot(req).await.unwrap().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn every_outcome_has_a_distinct_status() {
        let outcomes = [
            ChatResult::Reply("ok".into()),
            ChatResult::RateLimited,
            ChatResult::ServiceUnavailable,
            ChatResult::UpstreamError("boom".into()),
            ChatResult::EmptyUpstreamResponse,
            ChatResult::InternalError("disk".into()),
        ];
        let mut statuses: Vec<u16> = outcomes
            .into_iter()
            .map(|r| chat_response(r).status().as_u16())
            .collect();
        assert_eq!(statuses, vec![200, 429, 503, 502, 422, 500]);
        statuses.sort_unstable();
        statuses.dedup();
        assert_eq!(statuses.len(), 6);
    }
}
