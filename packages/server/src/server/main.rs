// Main entry point for API server

use std::sync::Arc;

use anyhow::{Context, Result};
use api_core::config::Config;
use api_core::domains::auth::JwtService;
use api_core::domains::chat::{ChatHub, ChatService, InMemoryMessageStore, MessageStore};
use api_core::domains::location::{HttpLocationResolver, LocationResolver, NullLocationResolver};
use api_core::domains::sessions::{InMemorySessionStore, SessionService, SessionStore};
use api_core::kernel::events::QueueEventSink;
use api_core::server::{build_app, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,api_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Courtside API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Reverse geocoding degrades to unresolved addresses when unconfigured
    let resolver: Arc<dyn LocationResolver> = match (
        config.reverse_geocode_endpoint.clone(),
        config.reverse_geocode_api_key.clone(),
    ) {
        (Some(endpoint), Some(api_key)) => Arc::new(
            HttpLocationResolver::new(endpoint, api_key)
                .context("Failed to create reverse geocoder")?,
        ),
        _ => {
            tracing::warn!("No reverse-geocode provider configured, addresses stay unresolved");
            Arc::new(NullLocationResolver)
        }
    };

    // Wire stores, event sink and services
    let session_store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let message_store: Arc<dyn MessageStore> = Arc::new(InMemoryMessageStore::new());
    let events = QueueEventSink::spawn();
    let hub = ChatHub::new();
    let jwt_service = Arc::new(JwtService::new(&config.jwt_secret, config.jwt_issuer.clone()));

    let sessions = Arc::new(SessionService::new(
        session_store.clone(),
        message_store.clone(),
        resolver,
        events,
        hub.clone(),
    ));
    let chat = Arc::new(ChatService::new(session_store, message_store, hub));

    let app = build_app(AppState {
        sessions,
        chat,
        jwt_service,
    });

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
