//! Image derivative routes: exact resize and center-cropped thumbnail.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use darkroom_core::derivative::{DEFAULT_QUALITY, OutputFormat, TransformSpec};

use crate::AppState;
use crate::error::ApiError;

use super::{require_dimensions, require_quality, serve_derivative};

/// Query parameters for `GET /process/{path}`.
#[derive(Debug, Deserialize)]
pub struct ResizeParams {
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
    /// Encode quality, 1..=100.
    #[serde(default = "default_quality")]
    pub quality: u8,
    /// Output format: webp (default), jpeg, or png.
    #[serde(default)]
    pub format: Option<String>,
}

/// Query parameters for `GET /thumbnail/{path}`.
#[derive(Debug, Deserialize)]
pub struct ThumbnailParams {
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
    /// Encode quality, 1..=100.
    #[serde(default = "default_quality")]
    pub quality: u8,
}

fn default_quality() -> u8 {
    DEFAULT_QUALITY
}

fn parse_format(raw: Option<&str>) -> Result<OutputFormat, ApiError> {
    match raw {
        None => Ok(OutputFormat::default()),
        Some(value) => OutputFormat::parse(value).ok_or_else(|| {
            ApiError::validation(format!(
                "unknown format '{value}': expected webp, jpeg, or png"
            ))
        }),
    }
}

/// GET `/process/{path}` - exact-size resize with format conversion.
async fn process_image(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(params): Query<ResizeParams>,
) -> Result<Response, ApiError> {
    let (width, height) = require_dimensions(params.width, params.height)?;
    let quality = require_quality(params.quality)?;
    let format = parse_format(params.format.as_deref())?;

    let spec = TransformSpec::Resize {
        width,
        height,
        quality,
        format,
    };
    serve_derivative(&state, &path, &spec).await
}

/// GET `/thumbnail/{path}` - aspect-preserving center-cropped WebP.
async fn thumbnail(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(params): Query<ThumbnailParams>,
) -> Result<Response, ApiError> {
    let (width, height) = require_dimensions(params.width, params.height)?;
    let quality = require_quality(params.quality)?;

    let spec = TransformSpec::Thumbnail {
        width,
        height,
        quality,
    };
    serve_derivative(&state, &path, &spec).await
}

/// Creates image derivative routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/process/{*path}", get(process_image))
        .route("/thumbnail/{*path}", get(thumbnail))
}

#[cfg(test)]
mod tests {
    use axum::http::{StatusCode, header};
    use tower::ServiceExt;

    use darkroom_core::storage::StorageRoot;

    use crate::test_support::{get, get_json, put_png_original, router};

    #[tokio::test]
    async fn test_resize_serves_webp_with_cache_headers() {
        let (_dir, state, router) = router();
        put_png_original(&state, "products/photo.png", 40, 20);

        let request = axum::http::Request::builder()
            .uri("/api/v1/process/products/photo.png?width=10&height=10")
            .body(axum::body::Body::empty())
            .expect("request");
        let response = router.oneshot(request).await.expect("send");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/webp"
        );
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "public, max-age=31536000"
        );

        let cached = state
            .layout
            .root(StorageRoot::Cache)
            .join("products/10x10_80_photo.webp");
        assert!(cached.is_file(), "derivative not committed to cache");
    }

    #[tokio::test]
    async fn test_thumbnail_lands_in_thumbnails_root() {
        let (_dir, state, router) = router();
        put_png_original(&state, "products/photo.png", 40, 20);

        let (status, body) = get(
            router,
            "/api/v1/thumbnail/products/photo.png?width=8&height=8",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..4], b"RIFF");
        assert!(
            state
                .layout
                .root(StorageRoot::Thumbnails)
                .join("products/thumb_8x8_photo.webp")
                .is_file()
        );
    }

    #[tokio::test]
    async fn test_jpeg_format_conversion() {
        let (_dir, state, router) = router();
        put_png_original(&state, "products/photo.png", 16, 16);

        let request = axum::http::Request::builder()
            .uri("/api/v1/process/products/photo.png?width=8&height=8&format=jpeg&quality=90")
            .body(axum::body::Body::empty())
            .expect("request");
        let response = router.oneshot(request).await.expect("send");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/jpeg"
        );
    }

    #[tokio::test]
    async fn test_unknown_format_is_rejected() {
        let (_dir, state, router) = router();
        put_png_original(&state, "products/photo.png", 16, 16);

        let (status, json) = get_json(
            router,
            "/api/v1/process/products/photo.png?width=8&height=8&format=bmp",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_out_of_range_quality_is_rejected() {
        let (_dir, state, router) = router();
        put_png_original(&state, "products/photo.png", 16, 16);

        let (status, _) = get(
            router,
            "/api/v1/thumbnail/products/photo.png?width=8&height=8&quality=0",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_original_is_not_found() {
        let (_dir, _state, router) = router();

        let (status, json) = get_json(
            router,
            "/api/v1/process/products/missing.png?width=8&height=8",
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_traversal_path_is_forbidden() {
        let (_dir, _state, router) = router();

        let (status, json) = get_json(
            router,
            "/api/v1/process/%2e%2e%2f%2e%2e%2fetc%2fpasswd?width=8&height=8",
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["error"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_repeat_request_serves_identical_bytes() {
        let (_dir, state, router) = router();
        put_png_original(&state, "products/photo.png", 32, 32);

        let uri = "/api/v1/process/products/photo.png?width=10&height=10";
        let (status_a, first) = get(router.clone(), uri).await;
        let (status_b, second) = get(router, uri).await;

        assert_eq!(status_a, StatusCode::OK);
        assert_eq!(status_b, StatusCode::OK);
        assert_eq!(first, second);
    }
}
