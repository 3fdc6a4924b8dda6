//! Video frame derivative route.

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::get;
use serde::Deserialize;

use darkroom_core::derivative::{FrameTimestamp, TransformSpec};

use crate::AppState;
use crate::error::ApiError;

use super::{require_dimensions, serve_derivative};

/// Query parameters for `GET /video/thumbnail/{path}`.
#[derive(Debug, Deserialize)]
pub struct FrameParams {
    /// Target width in pixels.
    #[serde(default = "default_dimension")]
    pub width: u32,
    /// Target height in pixels.
    #[serde(default = "default_dimension")]
    pub height: u32,
    /// Seek position, `HH:MM:SS`.
    #[serde(default)]
    pub timestamp: Option<String>,
}

fn default_dimension() -> u32 {
    300
}

/// GET `/video/thumbnail/{path}` - one frame grabbed at a timestamp.
///
/// The path may arrive double-encoded; when the literal path does not
/// exist the original is located by probing the stem against the known
/// video extensions.
async fn video_thumbnail(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(params): Query<FrameParams>,
) -> Result<Response, ApiError> {
    let (width, height) = require_dimensions(params.width, params.height)?;
    let timestamp = match params.timestamp.as_deref() {
        None => FrameTimestamp::default(),
        Some(raw) => FrameTimestamp::parse(raw)
            .map_err(|err| ApiError::validation(err.to_string()))?,
    };

    let spec = TransformSpec::VideoFrame {
        width,
        height,
        timestamp,
    };
    serve_derivative(&state, &path, &spec).await
}

/// Creates video derivative routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/video/thumbnail/{*path}", get(video_thumbnail))
}
