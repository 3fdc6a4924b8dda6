//! Darkroom API Server
//!
//! Main entry point for the darkroom media service.

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use darkroom_api::{AppState, create_router};
use darkroom_core::storage::StorageRoot;
use darkroom_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "darkroom=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");
    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Create application state; this creates and canonicalizes the
    // storage roots.
    let state = AppState::new(config)?;
    info!(
        originals = %state.layout.root(StorageRoot::Originals).display(),
        cache = %state.layout.root(StorageRoot::Cache).display(),
        thumbnails = %state.layout.root(StorageRoot::Thumbnails).display(),
        "Storage roots initialized"
    );
    if state.config.auth.api_key.is_none() {
        warn!("No API key configured; mutating endpoints accept unauthenticated requests");
    }

    // Create router
    let app = create_router(state);

    // Start server
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
