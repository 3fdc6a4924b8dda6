//! PDF derivative routes: single page render and multi-page preview.

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::get;
use serde::Deserialize;

use darkroom_core::derivative::TransformSpec;

use crate::AppState;
use crate::error::ApiError;

use super::{require_dimensions, serve_derivative};

/// Query parameters for `GET /pdf/thumbnail/{path}`.
#[derive(Debug, Deserialize)]
pub struct PdfPageParams {
    /// Canvas width in pixels.
    #[serde(default = "default_page_width")]
    pub width: u32,
    /// Canvas height in pixels.
    #[serde(default = "default_page_height")]
    pub height: u32,
    /// Zero-based page index.
    #[serde(default)]
    pub page: u32,
}

/// Query parameters for `GET /pdf/preview/{path}`.
#[derive(Debug, Deserialize)]
pub struct PdfPreviewParams {
    /// Canvas width in pixels.
    #[serde(default = "default_preview_dimension")]
    pub width: u32,
    /// Canvas height in pixels.
    #[serde(default = "default_preview_dimension")]
    pub height: u32,
    /// Comma-separated zero-based page indices.
    #[serde(default = "default_pages")]
    pub pages: String,
}

fn default_page_width() -> u32 {
    300
}

fn default_page_height() -> u32 {
    400
}

fn default_preview_dimension() -> u32 {
    300
}

fn default_pages() -> String {
    "0".to_string()
}

fn parse_pages(raw: &str) -> Result<Vec<u32>, ApiError> {
    raw.split(',')
        .map(|part| part.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| {
            ApiError::validation(format!(
                "pages must be comma-separated page numbers, got '{raw}'"
            ))
        })
}

/// GET `/pdf/thumbnail/{path}` - one page centered on a white canvas.
async fn pdf_thumbnail(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(params): Query<PdfPageParams>,
) -> Result<Response, ApiError> {
    let (width, height) = require_dimensions(params.width, params.height)?;

    let spec = TransformSpec::PdfPage {
        width,
        height,
        page: params.page,
    };
    serve_derivative(&state, &path, &spec).await
}

/// GET `/pdf/preview/{path}` - preview of a page list.
///
/// Only the first requested page that exists in the document is rendered;
/// the full list still shapes the cache key.
async fn pdf_preview(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(params): Query<PdfPreviewParams>,
) -> Result<Response, ApiError> {
    let (width, height) = require_dimensions(params.width, params.height)?;
    let pages = parse_pages(&params.pages)?;

    let spec = TransformSpec::PdfPreview {
        width,
        height,
        pages,
    };
    serve_derivative(&state, &path, &spec).await
}

/// Creates PDF derivative routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pdf/thumbnail/{*path}", get(pdf_thumbnail))
        .route("/pdf/preview/{*path}", get(pdf_preview))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::test_support::{get, get_json, put_original, router};

    use super::parse_pages;

    #[test]
    fn test_parse_pages() {
        assert_eq!(parse_pages("0").unwrap(), vec![0]);
        assert_eq!(parse_pages("2, 0, 2").unwrap(), vec![2, 0, 2]);
        assert!(parse_pages("").is_err());
        assert!(parse_pages("1,x").is_err());
        assert!(parse_pages("1,").is_err());
    }

    #[tokio::test]
    async fn test_missing_document_is_not_found() {
        let (_dir, _state, router) = router();

        let (status, _) = get(router, "/api/v1/pdf/thumbnail/docs/manual.pdf").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_pages_parameter_is_rejected() {
        let (_dir, state, router) = router();
        put_original(&state, "docs/manual.pdf", b"%PDF-1.4");

        let (status, json) = get_json(
            router,
            "/api/v1/pdf/preview/docs/manual.pdf?pages=1,x",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "VALIDATION_ERROR");
    }

    #[cfg(unix)]
    mod with_fake_poppler {
        use std::os::unix::fs::PermissionsExt;
        use std::path::{Path, PathBuf};

        use axum::http::{StatusCode, header};
        use tower::ServiceExt;

        use darkroom_core::storage::StorageRoot;

        use crate::test_support::{get_json, put_original, test_config, test_state_from};
        use crate::{AppState, create_router};

        fn script(path: &Path, body: &str) -> PathBuf {
            std::fs::write(path, body).expect("write script");
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
                .expect("chmod");
            path.to_path_buf()
        }

        /// State whose pdfinfo reports `pages` pages and whose pdftoppm
        /// emits a fixed red PNG on stdout.
        fn poppler_state(dir: &Path, pages: u32) -> AppState {
            let png_path = dir.join("page.png");
            image::RgbImage::from_pixel(30, 60, image::Rgb([200, 0, 0]))
                .save(&png_path)
                .expect("save png");

            let pdftoppm = script(
                &dir.join("fake-pdftoppm"),
                &format!("#!/bin/sh\ncat \"{}\"\n", png_path.display()),
            );
            let pdfinfo = script(
                &dir.join("fake-pdfinfo"),
                &format!("#!/bin/sh\necho \"Pages: {pages}\"\n"),
            );

            let mut config = test_config(dir);
            config.render.pdftoppm = Some(pdftoppm.to_string_lossy().into_owned());
            config.render.pdfinfo = Some(pdfinfo.to_string_lossy().into_owned());
            test_state_from(config)
        }

        #[tokio::test]
        async fn test_page_render_fills_requested_canvas() {
            let dir = tempfile::tempdir().expect("tempdir");
            let state = poppler_state(dir.path(), 3);
            let router = create_router(state.clone());
            put_original(&state, "docs/manual.pdf", b"%PDF-1.4");

            let request = axum::http::Request::builder()
                .uri("/api/v1/pdf/thumbnail/docs/manual.pdf?width=100&height=100&page=1")
                .body(axum::body::Body::empty())
                .expect("request");
            let response = router.oneshot(request).await.expect("send");

            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                response.headers().get(header::CONTENT_TYPE).unwrap(),
                "image/jpeg"
            );

            let body = http_body_util::BodyExt::collect(response.into_body())
                .await
                .expect("body")
                .to_bytes();
            let rendered = image::load_from_memory(&body).expect("decode jpeg");
            assert_eq!(rendered.width(), 100);
            assert_eq!(rendered.height(), 100);

            assert!(
                state
                    .layout
                    .root(StorageRoot::Cache)
                    .join("pdf_thumb_100x100_docs/manual.pdf_page1.jpg")
                    .is_file()
            );
        }

        #[tokio::test]
        async fn test_page_beyond_document_is_rejected() {
            let dir = tempfile::tempdir().expect("tempdir");
            let state = poppler_state(dir.path(), 3);
            let router = create_router(state.clone());
            put_original(&state, "docs/manual.pdf", b"%PDF-1.4");

            let (status, json) = get_json(
                router,
                "/api/v1/pdf/thumbnail/docs/manual.pdf?page=9",
            )
            .await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["error"], "VALIDATION_ERROR");
            assert!(
                json["message"]
                    .as_str()
                    .expect("message")
                    .contains("page 9 out of range")
            );
        }

        #[tokio::test]
        async fn test_preview_skips_invalid_pages() {
            let dir = tempfile::tempdir().expect("tempdir");
            let state = poppler_state(dir.path(), 2);
            let router = create_router(state.clone());
            put_original(&state, "docs/manual.pdf", b"%PDF-1.4");

            // Page 7 does not exist; the preview falls through to page 0.
            let (status, _) = crate::test_support::get(
                router,
                "/api/v1/pdf/preview/docs/manual.pdf?pages=7,0&width=80&height=80",
            )
            .await;

            assert_eq!(status, StatusCode::OK);
            assert!(
                state
                    .layout
                    .root(StorageRoot::Cache)
                    .join("pdf_preview_80x80_docs/manual.pdf_pages7_0.jpg")
                    .is_file()
            );
        }
    }
}
