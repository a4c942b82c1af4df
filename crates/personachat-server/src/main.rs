#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::sync::Arc;

use personachat_relay::GroqClient;
use personachat_server::{AppCore, build_router, config::ServerConfig};

#[tokio::main]
async fn main() {
    // Initialize tracing logger
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,personachat_server=debug".into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting PersonaChat backend server");

    let config = ServerConfig::load().expect("Failed to load server configuration");

    let api_key = std::env::var("GROQ_API_KEY").unwrap_or_else(|_| {
        tracing::warn!("GROQ_API_KEY is not set; chat relay requests will be rejected upstream");
        String::new()
    });

    let mut relay = GroqClient::new(api_key);
    if let Some(base_url) = &config.relay_base_url {
        relay = relay.with_base_url(base_url);
    }
    if let Some(model) = &config.relay_model {
        relay = relay.with_model(model);
    }

    let core = Arc::new(
        AppCore::new(&config.db_path, Arc::new(relay)).expect("Failed to initialize app core"),
    );

    let app = build_router(core);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {}: {}", addr, e));

    tracing::info!("PersonaChat running on http://{}", addr);

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
