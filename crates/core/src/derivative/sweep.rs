//! Cascading invalidation of derivatives when an original is deleted.
//!
//! The cache sweep matches by substring against a pattern set built from
//! the deleted path, which intentionally over-matches so parameter-varying
//! keys (different size or quality prefixes) sharing the same path suffix
//! are all caught. The thumbnail sweep is stricter: keys are parsed with
//! the same encoding the key builder uses and compared exactly.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;
use walkdir::WalkDir;

use super::error::DerivativeError;
use super::key::{video_stem, ThumbnailKey, CACHE_EXTENSIONS};
use crate::storage::{StorageLayout, StorageRoot};

/// Deletes an original and every derivative whose key could have been
/// derived from it, pruning directories left empty along the way.
#[derive(Debug, Clone)]
pub struct InvalidationSweeper {
    layout: Arc<StorageLayout>,
}

impl InvalidationSweeper {
    /// Creates a sweeper over the configured roots.
    #[must_use]
    pub fn new(layout: Arc<StorageLayout>) -> Self {
        Self { layout }
    }

    /// Removes `original` (an already-resolved absolute path) and sweeps
    /// both derivative roots for files derived from `decoded`, the
    /// original-relative path. Returns the number of derivative files
    /// deleted.
    ///
    /// Only the original's own removal can fail the operation. Every
    /// per-file error during the sweep is logged and swallowed so one
    /// locked or corrupt file never blocks cleanup of the rest.
    ///
    /// # Errors
    ///
    /// Returns [`DerivativeError::DeleteFailed`] if the original cannot be
    /// removed.
    pub fn sweep(&self, original: &Path, decoded: &str) -> Result<usize, DerivativeError> {
        let parent = original.parent().map(Path::to_path_buf);
        std::fs::remove_file(original)
            .map_err(|err| DerivativeError::DeleteFailed(err.to_string()))?;
        if let Some(parent) = parent {
            prune_empty_parents(&parent, self.layout.root(StorageRoot::Originals));
        }

        Ok(self.sweep_cache(decoded) + self.sweep_thumbnails(decoded))
    }

    fn sweep_cache(&self, decoded: &str) -> usize {
        let root = self.layout.root(StorageRoot::Cache);
        let patterns = sweep_patterns(decoded);
        let mut deleted = 0;
        for entry in WalkDir::new(root).into_iter().filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(relative) = relative_str(entry.path(), root) else {
                continue;
            };
            if patterns.iter().any(|p| relative.contains(p.as_str())) {
                deleted += remove_counted(entry.path(), root);
            }
        }
        deleted
    }

    fn sweep_thumbnails(&self, decoded: &str) -> usize {
        let root = self.layout.root(StorageRoot::Thumbnails);
        let deleted_stem = strip_extension(decoded);
        let deleted_stem = deleted_stem.trim_matches('/');
        let mut deleted = 0;
        for entry in WalkDir::new(root).into_iter().filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(relative) = relative_str(entry.path(), root) else {
                continue;
            };
            let matches = match ThumbnailKey::parse(&relative) {
                Some(key) => key.asset_stem == deleted_stem,
                None => relative.contains(deleted_stem),
            };
            if matches {
                deleted += remove_counted(entry.path(), root);
            }
        }
        deleted
    }
}

/// Substring patterns a cache file must contain to count as derived from
/// `decoded`: the raw path, the path with each cache extension swapped in,
/// and the video-frame filename built from the stem.
fn sweep_patterns(decoded: &str) -> Vec<String> {
    let mut patterns = vec![decoded.to_string()];
    for ext in CACHE_EXTENSIONS {
        patterns.push(swap_extension(decoded, ext));
    }
    patterns.push(format!("{}.jpg", video_stem(decoded)));
    patterns
}

fn swap_extension(path: &str, ext: &str) -> String {
    Path::new(path)
        .with_extension(ext)
        .to_string_lossy()
        .into_owned()
}

fn strip_extension(path: &str) -> String {
    Path::new(path)
        .with_extension("")
        .to_string_lossy()
        .into_owned()
}

fn relative_str(path: &Path, root: &Path) -> Option<String> {
    path.strip_prefix(root)
        .ok()
        .map(|p| p.to_string_lossy().into_owned())
}

/// Deletes one matched derivative, returning 1 on success and 0 on failure
/// so the caller can keep counting.
fn remove_counted(path: &Path, root: &Path) -> usize {
    match std::fs::remove_file(path) {
        Ok(()) => {
            if let Some(parent) = path.parent() {
                prune_empty_parents(parent, root);
            }
            1
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Failed to delete derivative");
            0
        }
    }
}

/// Removes empty directories from `start` upward, stopping at `stop`.
/// Any error stops the climb silently.
fn prune_empty_parents(start: &Path, stop: &Path) {
    let mut current = start.to_path_buf();
    while current != stop && current.starts_with(stop) && current.is_dir() {
        match std::fs::read_dir(&current) {
            Ok(mut entries) => {
                if entries.next().is_some() {
                    break;
                }
            }
            Err(_) => break,
        }
        if std::fs::remove_dir(&current).is_err() {
            break;
        }
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }
}
