//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - Derivative serving routes (resize, thumbnail, video frame, PDF page)
//! - Upload, info, listing, and delete routes over the originals library
//! - API-key middleware for the mutating route set

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use darkroom_core::derivative::DerivativeService;
use darkroom_core::library::LibraryService;
use darkroom_core::render::{FfmpegExtractor, MediaRenderer, PopplerRasterizer};
use darkroom_core::storage::{FsCacheStore, StorageError, StorageLayout};
use darkroom_shared::AppConfig;

/// The concrete derivative service the HTTP layer is wired with: filesystem
/// cache store, ffmpeg frame extraction, poppler rasterization.
pub type Derivatives =
    DerivativeService<FsCacheStore, MediaRenderer<FfmpegExtractor, Arc<PopplerRasterizer>>>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<AppConfig>,
    /// Canonical storage roots.
    pub layout: Arc<StorageLayout>,
    /// Serve-or-generate orchestration over the cache.
    pub derivatives: Arc<Derivatives>,
    /// Upload intake and originals browsing.
    pub library: Arc<LibraryService>,
    /// PDF probe shared with the renderer, used for info enrichment.
    pub rasterizer: Arc<PopplerRasterizer>,
}

impl AppState {
    /// Builds the full service graph from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a storage root cannot be created or
    /// canonicalized.
    pub fn new(config: AppConfig) -> Result<Self, StorageError> {
        let layout = Arc::new(StorageLayout::init(&config.storage)?);
        let rasterizer = Arc::new(PopplerRasterizer::new(config.render.clone()));
        let renderer = MediaRenderer::new(
            FfmpegExtractor::new(config.render.clone()),
            Arc::clone(&rasterizer),
        );
        let derivatives = Arc::new(DerivativeService::new(
            Arc::clone(&layout),
            FsCacheStore::new(),
            renderer,
        ));
        let library = Arc::new(LibraryService::new(Arc::clone(&layout)));

        Ok(Self {
            config: Arc::new(config),
            layout,
            derivatives,
            library,
            rasterizer,
        })
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let max_body = state.config.upload.max_bytes;
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(DefaultBodyLimit::max(max_body))
        .with_state(state)
}
