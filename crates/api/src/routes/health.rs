//! Health check endpoint.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use darkroom_core::storage::StorageRoot;
use darkroom_shared::types::media::{DOCUMENT_EXTENSIONS, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};

use crate::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Whether each storage root exists on disk.
    pub storage: StorageHealth,
    /// Extension sets accepted for upload and processing.
    pub supported_formats: SupportedFormats,
}

/// Per-root existence checks.
#[derive(Serialize)]
pub struct StorageHealth {
    /// Originals root exists.
    pub originals: bool,
    /// Cache root exists.
    pub cache: bool,
    /// Thumbnails root exists.
    pub thumbnails: bool,
}

/// Accepted extension sets, by media family.
#[derive(Serialize)]
pub struct SupportedFormats {
    /// Image extensions.
    pub images: &'static [&'static str],
    /// Video extensions.
    pub videos: &'static [&'static str],
    /// Document extensions.
    pub documents: &'static [&'static str],
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "darkroom",
        version: env!("CARGO_PKG_VERSION"),
        storage: StorageHealth {
            originals: state.layout.root(StorageRoot::Originals).is_dir(),
            cache: state.layout.root(StorageRoot::Cache).is_dir(),
            thumbnails: state.layout.root(StorageRoot::Thumbnails).is_dir(),
        },
        supported_formats: SupportedFormats {
            images: IMAGE_EXTENSIONS,
            videos: VIDEO_EXTENSIONS,
            documents: DOCUMENT_EXTENSIONS,
        },
    })
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
