//! Deterministic mapping from (asset path, transform) to cache keys.
//!
//! Keys embed the decoded original-relative path together with the
//! transform parameters, so a request for the same derivative always
//! lands on the same file. The invalidation sweep reverses parts of this
//! encoding, which is why the thumbnail layout is parseable here too.

use std::path::{Path, PathBuf};

use darkroom_shared::types::media::VIDEO_EXTENSIONS;

use super::types::TransformSpec;
use crate::storage::{StorageLayout, StorageRoot};

/// Extensions swapped into a deleted path when collecting sweep patterns.
pub(crate) const CACHE_EXTENSIONS: &[&str] = &["webp", "jpg", "png"];

/// A derivative's storage location: a root plus a path relative to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    root: StorageRoot,
    relative: PathBuf,
}

impl CacheKey {
    /// Derives the cache key for a decoded asset path and a transform.
    ///
    /// Pure function over its inputs. Distinct parameter sets can collide
    /// (a thumbnail key does not embed quality, and `a_b/c` keys overlap
    /// with `a` `b/c` keys under some transforms); the layout is kept
    /// stable rather than reworked around those corners.
    #[must_use]
    pub fn build(asset_path: &str, spec: &TransformSpec) -> Self {
        let (root, relative) = match spec {
            TransformSpec::Resize {
                width,
                height,
                quality,
                format,
            } => (
                StorageRoot::Cache,
                PathBuf::from(format!("{width}x{height}_{quality}_{asset_path}"))
                    .with_extension(format.extension()),
            ),
            TransformSpec::Thumbnail { width, height, .. } => (
                StorageRoot::Thumbnails,
                PathBuf::from(format!("thumb_{width}x{height}_{asset_path}"))
                    .with_extension("webp"),
            ),
            TransformSpec::VideoFrame { width, height, .. } => (
                StorageRoot::Cache,
                PathBuf::from(format!(
                    "video_thumb_{width}x{height}_{stem}.jpg",
                    stem = video_stem(asset_path)
                )),
            ),
            TransformSpec::PdfPage {
                width,
                height,
                page,
            } => (
                StorageRoot::Cache,
                PathBuf::from(format!(
                    "pdf_thumb_{width}x{height}_{asset_path}_page{page}.jpg"
                )),
            ),
            TransformSpec::PdfPreview {
                width,
                height,
                pages,
            } => {
                let joined = pages
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("_");
                (
                    StorageRoot::Cache,
                    PathBuf::from(format!(
                        "pdf_preview_{width}x{height}_{asset_path}_pages{joined}.jpg"
                    )),
                )
            }
        };
        Self { root, relative }
    }

    /// The storage root the key lives under.
    #[must_use]
    pub const fn root(&self) -> StorageRoot {
        self.root
    }

    /// The key path relative to its root.
    #[must_use]
    pub fn relative_path(&self) -> &Path {
        &self.relative
    }

    /// Absolute path of the key under `layout`.
    #[must_use]
    pub fn locate(&self, layout: &StorageLayout) -> PathBuf {
        layout.root(self.root).join(&self.relative)
    }
}

/// Strips a known video extension (case-insensitive), returning the stem
/// embedded in video frame keys. Paths without a recognized video
/// extension are returned unchanged.
#[must_use]
pub fn video_stem(asset_path: &str) -> &str {
    let lower = asset_path.to_ascii_lowercase();
    for ext in VIDEO_EXTENSIONS {
        let suffix = format!(".{ext}");
        if lower.ends_with(&suffix) {
            return &asset_path[..asset_path.len() - suffix.len()];
        }
    }
    asset_path
}

/// Parsed form of a thumbnail key, `thumb_{w}x{h}_{asset}.webp`.
///
/// The sweep uses this to match thumbnails against a deleted original by
/// exact stem comparison instead of substring containment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailKey {
    /// Width embedded in the key.
    pub width: u32,
    /// Height embedded in the key.
    pub height: u32,
    /// Embedded original-relative path. The key layout replaced the
    /// original's extension with `.webp`, so this is extension-less.
    pub asset_stem: String,
}

impl ThumbnailKey {
    /// Parses a thumbnail-root relative path. Returns `None` when the
    /// path does not follow the thumbnail key layout.
    #[must_use]
    pub fn parse(relative: &str) -> Option<Self> {
        let rest = relative.strip_prefix("thumb_")?;
        let rest = rest.strip_suffix(".webp")?;
        let (dims, asset) = rest.split_once('_')?;
        let (width, height) = dims.split_once('x')?;
        Some(Self {
            width: width.parse().ok()?,
            height: height.parse().ok()?,
            asset_stem: asset.trim_matches('/').to_string(),
        })
    }
}
