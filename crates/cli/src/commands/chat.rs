//! `veridian chat`: Run one message through the chat pipeline.

use veridian_chat::ChatOrchestrator;
use veridian_config::AppConfig;
use veridian_core::chat::{ChatRequest, ChatResult};

pub async fn run(user: String, message: String) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let store = veridian_store::build_from_config(&config.store);
    let invoker = veridian_providers::build_from_config(&config.generation);
    let chat = ChatOrchestrator::from_config(&config, store, invoker);

    match chat.handle(&ChatRequest::new(user, message)).await {
        ChatResult::Reply(reply) => {
            println!("{reply}");
            Ok(())
        }
        ChatResult::UpstreamError(detail) => Err(format!("upstream_error: {detail}").into()),
        ChatResult::InternalError(detail) => Err(format!("internal_error: {detail}").into()),
        other => Err(other.kind().into()),
    }
}
