//! Upload, metadata, listing, and delete routes over the originals library.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use darkroom_core::library::{FileEntry, FileInfo, StoredUpload};
use darkroom_core::render::PdfRasterizer;
use darkroom_core::storage::PathResolver;
use darkroom_shared::types::pagination::PageMeta;
use darkroom_shared::types::{MediaKind, PageRequest};

use crate::AppState;
use crate::error::ApiError;

/// Links a client can follow for one asset.
#[derive(Debug, Serialize)]
pub struct AssetUrls {
    /// Metadata endpoint.
    pub info: String,
    /// Delete endpoint.
    pub delete: String,
    /// Kind-appropriate derivative endpoint, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,
    /// Thumbnail endpoint, for images.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

fn asset_urls(base: &str, path: &str, kind: MediaKind) -> AssetUrls {
    let base = base.trim_end_matches('/');
    let process = match kind {
        MediaKind::Image => Some(format!(
            "{base}/api/v1/process/{path}?width=800&height=600"
        )),
        MediaKind::Video => Some(format!(
            "{base}/api/v1/video/thumbnail/{path}?width=300&height=300"
        )),
        MediaKind::Pdf => Some(format!(
            "{base}/api/v1/pdf/thumbnail/{path}?width=300&height=400&page=0"
        )),
        MediaKind::Document | MediaKind::Unknown => None,
    };
    let thumbnail = match kind {
        MediaKind::Image => Some(format!(
            "{base}/api/v1/thumbnail/{path}?width=300&height=300"
        )),
        _ => None,
    };
    AssetUrls {
        info: format!("{base}/api/v1/info/{path}"),
        delete: format!("{base}/api/v1/files/{path}"),
        process,
        thumbnail,
    }
}

/// Response for a stored upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Human-readable outcome.
    pub message: &'static str,
    /// The stored file.
    #[serde(flatten)]
    pub file: StoredUpload,
    /// Follow-up links.
    pub urls: AssetUrls,
}

/// Response for file metadata.
#[derive(Debug, Serialize)]
pub struct FileInfoResponse {
    /// The metadata itself.
    #[serde(flatten)]
    pub info: FileInfo,
    /// Follow-up links.
    pub urls: AssetUrls,
}

/// One listed file with its links.
#[derive(Debug, Serialize)]
pub struct FileEntryResponse {
    /// The listing entry.
    #[serde(flatten)]
    pub entry: FileEntry,
    /// Follow-up links.
    pub urls: AssetUrls,
}

/// Response for a section listing.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    /// Decoded section path.
    pub section: String,
    /// Files in this page, newest first.
    pub files: Vec<FileEntryResponse>,
    /// Pagination metadata.
    pub meta: PageMeta,
}

/// POST `/upload/{section}` - multipart upload of one original.
async fn upload(
    State(state): State<AppState>,
    Path(section): Path<String>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(|err| {
        ApiError::validation(format!("malformed multipart body: {err}"))
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let Some(file_name) = field.file_name().map(ToOwned::to_owned) else {
            return Err(ApiError::validation("file field carries no filename"));
        };
        let bytes = field.bytes().await.map_err(|err| {
            ApiError::validation(format!("failed to read upload body: {err}"))
        })?;

        let stored = state.library.store_upload(&section, &file_name, &bytes).await?;
        info!(path = %stored.relative_path, kind = stored.kind.as_str(), "Upload stored");

        let urls = asset_urls(
            &state.config.server.public_base_url,
            &stored.relative_path,
            stored.kind,
        );
        let response = UploadResponse {
            message: "Upload successful",
            file: stored,
            urls,
        };
        return Ok((StatusCode::CREATED, Json(response)).into_response());
    }
    Err(ApiError::validation("multipart body has no 'file' field"))
}

/// GET `/info/{path}` - metadata for one original.
async fn file_info(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Json<FileInfoResponse>, ApiError> {
    let mut info = state.library.info(&path).await?;
    if info.kind == MediaKind::Pdf {
        // Best-effort enrichment; a missing poppler install leaves the
        // count out rather than failing the request.
        if let Ok(document) = state.library.resolve_original(&path, true) {
            info.page_count = state.rasterizer.page_count(&document).await.ok();
        }
    }

    let urls = asset_urls(
        &state.config.server.public_base_url,
        &info.file_path,
        info.kind,
    );
    Ok(Json(FileInfoResponse { info, urls }))
}

/// DELETE `/files/{path}` - remove an original and sweep its derivatives.
async fn delete_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = state.derivatives.delete_original(&path).await?;
    info!(path = %path, deleted, "Original deleted with derivatives");

    Ok(Json(json!({
        "message": "Delete successful",
        "deleted_cache_files": deleted,
    })))
}

/// GET `/files/{section}` - paginated listing of a section.
async fn list_files(
    State(state): State<AppState>,
    Path(section): Path<String>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ListResponse>, ApiError> {
    let listing = state.library.list_section(&section, &page).await?;

    let base = &state.config.server.public_base_url;
    let files = listing
        .data
        .into_iter()
        .map(|entry| {
            let urls = asset_urls(base, &entry.full_path, entry.kind);
            FileEntryResponse { entry, urls }
        })
        .collect();

    Ok(Json(ListResponse {
        section: PathResolver::decode(&section).trim_matches('/').to_string(),
        files,
        meta: listing.meta,
    }))
}

/// GET `/sections` - summary of every top-level section.
async fn list_sections(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let sections = state.library.sections().await?;
    Ok(Json(json!({
        "total_sections": sections.len(),
        "sections": sections,
    })))
}

/// Public file routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/info/{*path}", get(file_info))
}

/// Routes behind the API-key check.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/upload/{*section}", axum::routing::post(upload))
        .route("/files/{*path}", get(list_files).delete(delete_file))
        .route("/sections", get(list_sections))
}
