//! API route definitions.

use axum::Router;
use axum::http::header;
use axum::middleware;
use axum::response::{IntoResponse, Response};

use darkroom_core::derivative::TransformSpec;

use crate::error::ApiError;
use crate::{AppState, middleware::require_api_key};

pub mod files;
pub mod health;
pub mod images;
pub mod pdfs;
pub mod videos;

/// Cache header on every derivative response. Derivatives are immutable for
/// a given key, so clients may hold them for a year.
const DERIVATIVE_CACHE_CONTROL: &str = "public, max-age=31536000";

/// Creates the API router. Mutating routes (upload, delete, listing,
/// sections) sit behind the API-key middleware; derivative serving, info,
/// and health stay public.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .merge(files::protected_routes())
        .layer(middleware::from_fn_with_state(state, require_api_key));

    Router::new()
        .merge(health::routes())
        .merge(images::routes())
        .merge(videos::routes())
        .merge(pdfs::routes())
        .merge(files::routes())
        .merge(protected)
}

/// Serves a derivative, rendering on a cache miss.
pub(crate) async fn serve_derivative(
    state: &AppState,
    asset_path: &str,
    spec: &TransformSpec,
) -> Result<Response, ApiError> {
    let derivative = state.derivatives.get_derivative(asset_path, spec).await?;
    Ok((
        [
            (header::CONTENT_TYPE, derivative.media_type),
            (header::CACHE_CONTROL, DERIVATIVE_CACHE_CONTROL),
        ],
        derivative.bytes,
    )
        .into_response())
}

pub(crate) fn require_dimensions(width: u32, height: u32) -> Result<(u32, u32), ApiError> {
    if width == 0 || height == 0 {
        return Err(ApiError::validation("width and height must be positive"));
    }
    Ok((width, height))
}

pub(crate) fn require_quality(quality: u8) -> Result<u8, ApiError> {
    if !(1..=100).contains(&quality) {
        return Err(ApiError::validation("quality must be between 1 and 100"));
    }
    Ok(quality)
}
