//! `veridian serve`: Start the HTTP API server.

use veridian_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("🌿 Veridian API");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!(
        "   Rate limit: {} requests / {}s",
        config.chat.max_requests, config.chat.timeframe_seconds
    );
    if !config.has_api_key() {
        println!("   ⚠️  No API key set (GEMINI_API_KEY); chat will answer 503");
    }

    veridian_gateway::start(config).await?;

    Ok(())
}
