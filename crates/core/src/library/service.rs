//! Upload intake and originals browsing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::DateTime;
use tracing::info;
use uuid::Uuid;
use walkdir::WalkDir;

use darkroom_shared::types::{MediaKind, PageRequest, PageResponse};

use crate::storage::{PathResolver, StorageLayout, StorageRoot};

use super::error::LibraryError;
use super::types::{
    to_kb, to_mb, FileEntry, FileInfo, ImageDimensions, SectionSummary, StoredUpload,
};

/// Manages uploaded originals: intake, metadata, and section listings.
///
/// Derivative computation and invalidation live in
/// [`DerivativeService`](crate::derivative::DerivativeService); this service
/// only ever touches the originals root.
#[derive(Debug, Clone)]
pub struct LibraryService {
    layout: Arc<StorageLayout>,
    resolver: PathResolver,
}

impl LibraryService {
    /// Creates a service over the configured storage layout.
    #[must_use]
    pub fn new(layout: Arc<StorageLayout>) -> Self {
        let resolver = PathResolver::new(Arc::clone(&layout));
        Self { layout, resolver }
    }

    /// Persists an upload under `section` with a collision-proof name.
    ///
    /// The stored name is `{uuid}_{client name}`, where the client name is
    /// reduced to its final path component. The section directory is created
    /// on demand.
    ///
    /// # Errors
    ///
    /// - `LibraryError::UnsupportedFormat` if the extension is not accepted
    /// - `LibraryError::Forbidden` if the section escapes the originals root
    /// - `LibraryError::Io` if the write fails
    pub async fn store_upload(
        &self,
        section: &str,
        client_name: &str,
        bytes: &[u8],
    ) -> Result<StoredUpload, LibraryError> {
        // Client-supplied names may carry directory components.
        let base_name = client_name.rsplit(['/', '\\']).next().unwrap_or(client_name);
        let kind = MediaKind::from_path(Path::new(base_name));
        if !kind.is_uploadable() {
            let extension = Path::new(base_name)
                .extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or("")
                .to_ascii_lowercase();
            return Err(LibraryError::UnsupportedFormat { extension });
        }

        let section_dir = self
            .resolver
            .resolve(StorageRoot::Originals, section, false)?;
        tokio::fs::create_dir_all(&section_dir).await?;

        let file_name = format!("{}_{base_name}", Uuid::new_v4().simple());
        tokio::fs::write(section_dir.join(&file_name), bytes).await?;

        let section = PathResolver::decode(section).trim_matches('/').to_string();
        let relative_path = if section.is_empty() {
            file_name.clone()
        } else {
            format!("{section}/{file_name}")
        };
        info!(path = %relative_path, size = bytes.len(), "Stored upload");

        Ok(StoredUpload {
            file_name,
            relative_path,
            section,
            kind,
            size: bytes.len() as u64,
        })
    }

    /// Resolves a request path to an absolute path inside the originals
    /// root.
    ///
    /// # Errors
    ///
    /// - `LibraryError::Forbidden` if the path escapes the root
    /// - `LibraryError::NotFound` if `must_exist` is set and nothing is there
    pub fn resolve_original(
        &self,
        file_path: &str,
        must_exist: bool,
    ) -> Result<PathBuf, LibraryError> {
        Ok(self
            .resolver
            .resolve(StorageRoot::Originals, file_path, must_exist)?)
    }

    /// Returns metadata for one original.
    ///
    /// Image dimensions are probed best-effort; an unreadable image still
    /// gets its filesystem metadata. PDF page counts need a subprocess and
    /// are left to callers that hold a rasterizer.
    ///
    /// # Errors
    ///
    /// - `LibraryError::Forbidden` if the path escapes the root
    /// - `LibraryError::NotFound` if the file does not exist
    pub async fn info(&self, file_path: &str) -> Result<FileInfo, LibraryError> {
        let decoded = PathResolver::decode(file_path);
        let resolved = self
            .resolver
            .resolve_decoded(StorageRoot::Originals, &decoded, true)?;
        let meta = tokio::fs::metadata(&resolved).await?;

        let kind = MediaKind::from_path(Path::new(&decoded));
        let dimensions = if kind == MediaKind::Image {
            let probe = resolved.clone();
            tokio::task::spawn_blocking(move || read_dimensions(&probe))
                .await
                .unwrap_or_default()
        } else {
            None
        };

        let file_name = resolved
            .file_name()
            .map_or_else(String::new, |name| name.to_string_lossy().into_owned());

        Ok(FileInfo {
            file_name,
            file_path: decoded.trim_matches('/').to_string(),
            kind,
            size: meta.len(),
            size_mb: to_mb(meta.len()),
            created: meta.created().ok().map(DateTime::from),
            modified: meta.modified().ok().map(DateTime::from),
            dimensions,
            page_count: None,
        })
    }

    /// Lists the files under a section, newest first, paginated.
    ///
    /// The walk is recursive; files in nested directories appear with their
    /// path relative to the section.
    ///
    /// # Errors
    ///
    /// - `LibraryError::Forbidden` if the section escapes the root
    /// - `LibraryError::NotFound` if the section does not exist or is a file
    pub async fn list_section(
        &self,
        section: &str,
        page: &PageRequest,
    ) -> Result<PageResponse<FileEntry>, LibraryError> {
        let decoded = PathResolver::decode(section);
        let section_dir = self
            .resolver
            .resolve_decoded(StorageRoot::Originals, &decoded, true)?;
        if !section_dir.is_dir() {
            return Err(LibraryError::NotFound(format!(
                "section '{decoded}' is not a directory"
            )));
        }

        let request = page.normalized();
        let section_label = decoded.trim_matches('/').to_string();
        let entries =
            tokio::task::spawn_blocking(move || collect_entries(&section_dir, &section_label))
                .await
                .map_err(join_error)?;

        let total = entries.len() as u64;
        let data: Vec<FileEntry> = entries
            .into_iter()
            .skip(request.offset())
            .take(request.limit())
            .collect();
        Ok(PageResponse::new(data, request.page, request.per_page, total))
    }

    /// Summarizes every top-level section directory, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Io` if the originals root cannot be read.
    pub async fn sections(&self) -> Result<Vec<SectionSummary>, LibraryError> {
        let root = self.layout.root(StorageRoot::Originals).to_path_buf();
        tokio::task::spawn_blocking(move || collect_sections(&root))
            .await
            .map_err(join_error)?
    }
}

fn join_error(err: tokio::task::JoinError) -> LibraryError {
    LibraryError::Io(std::io::Error::other(err.to_string()))
}

fn read_dimensions(path: &Path) -> Option<ImageDimensions> {
    image::image_dimensions(path)
        .ok()
        .map(|(width, height)| ImageDimensions { width, height })
}

fn collect_entries(section_dir: &Path, section: &str) -> Vec<FileEntry> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(section_dir)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(section_dir) else {
            continue;
        };
        // Unreadable files are skipped rather than failing the listing.
        let Ok(meta) = entry.metadata() else {
            continue;
        };

        let path = relative.to_string_lossy().replace('\\', "/");
        let full_path = if section.is_empty() {
            path.clone()
        } else {
            format!("{section}/{path}")
        };
        let kind = MediaKind::from_path(entry.path());
        let dimensions = if kind == MediaKind::Image {
            read_dimensions(entry.path())
        } else {
            None
        };

        entries.push(FileEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            path,
            full_path,
            kind,
            size: meta.len(),
            size_mb: to_mb(meta.len()),
            size_kb: to_kb(meta.len()),
            created: meta.created().ok().map(DateTime::from),
            modified: meta.modified().ok().map(DateTime::from),
            dimensions,
        });
    }
    // Newest first; files without a modification time sort last.
    entries.sort_by(|a, b| b.modified.cmp(&a.modified));
    entries
}

fn collect_sections(root: &Path) -> Result<Vec<SectionSummary>, LibraryError> {
    let mut sections = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }

        let mut file_count = 0u64;
        let mut size_bytes = 0u64;
        for file in WalkDir::new(entry.path())
            .into_iter()
            .filter_map(Result::ok)
        {
            if file.file_type().is_file() {
                file_count += 1;
                size_bytes += file.metadata().map_or(0, |meta| meta.len());
            }
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        sections.push(SectionSummary {
            path: name.clone(),
            name,
            file_count,
            size_bytes,
            size_mb: to_mb(size_bytes),
        });
    }
    sections.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(sections)
}
