use std::sync::Arc;

use anyhow::Context;

use intent_gateway::config::{GatewayConfig, llm_config_from_env};
use intent_gateway::dispatch::{Dispatcher, HttpForwarder, gateway_routes};
use intent_gateway::intent::IntentClassifier;
use intent_gateway::llm::create_provider;
use intent_gateway::routing::RouteTable;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Install rustls crypto provider before any TLS usage. An error only
    // means another provider is already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = GatewayConfig::from_env();
    let llm_config = llm_config_from_env()?;

    eprintln!("🧭 Intent Gateway v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {} ({:?})", llm_config.model, llm_config.backend);
    eprintln!("   Listen: http://{}/orchestrate", config.listen_addr());
    eprintln!("   RAG: {}", config.handlers.rag);
    eprintln!("   PDF: {}", config.handlers.pdf_analysis);
    eprintln!("   Shopping: {}\n", config.handlers.shopping);

    let llm = create_provider(&llm_config)?;
    let classifier = IntentClassifier::new(llm).with_timeout(config.classify_timeout);
    let routes = Arc::new(RouteTable::new(&config.handlers));
    let forwarder = Arc::new(
        HttpForwarder::new(config.forward_timeout).context("Failed to build HTTP client")?,
    );

    let dispatcher = Arc::new(Dispatcher::new(classifier, routes, forwarder));
    let app = gateway_routes(dispatcher, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr()))?;
    tracing::info!(addr = %config.listen_addr(), "Intent gateway started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
