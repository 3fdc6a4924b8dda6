//! Traversal-safe resolution of request paths into storage roots.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use percent_encoding::percent_decode_str;

use super::error::StorageError;
use super::roots::{StorageLayout, StorageRoot};

/// Resolves untrusted relative paths to absolute paths inside a storage root.
///
/// The canonical-prefix check here is the sole control against directory
/// traversal. Every path derived from request input goes through it,
/// including paths rebuilt after extension stripping.
#[derive(Debug, Clone)]
pub struct PathResolver {
    layout: Arc<StorageLayout>,
}

impl PathResolver {
    /// Create a resolver over the configured roots.
    #[must_use]
    pub fn new(layout: Arc<StorageLayout>) -> Self {
        Self { layout }
    }

    /// Percent-decodes a request path at most twice.
    ///
    /// Double decoding defends against double-encoded traversal sequences
    /// such as `%252e%252e%252f`. Sequences that are not valid escapes pass
    /// through unchanged.
    #[must_use]
    pub fn decode(user_path: &str) -> String {
        let once = percent_decode_str(user_path).decode_utf8_lossy();
        percent_decode_str(&once).decode_utf8_lossy().into_owned()
    }

    /// Resolves `user_path` inside `root`.
    ///
    /// The decoded path is joined onto the root and canonicalized; the
    /// result must remain a descendant of the root or the request is
    /// rejected, never silently corrected.
    ///
    /// # Errors
    ///
    /// - `StorageError::Forbidden` if the canonical path escapes the root
    /// - `StorageError::NotFound` if `must_exist` is set and nothing exists
    ///   at the resolved path
    pub fn resolve(
        &self,
        root: StorageRoot,
        user_path: &str,
        must_exist: bool,
    ) -> Result<PathBuf, StorageError> {
        self.resolve_decoded(root, &Self::decode(user_path), must_exist)
    }

    /// Same as [`resolve`](Self::resolve) for a path that has already been
    /// percent-decoded. Paths rebuilt from a decoded path (extension probes,
    /// stem rewrites) go through this so they are not decoded again.
    ///
    /// # Errors
    ///
    /// Same as [`resolve`](Self::resolve).
    pub fn resolve_decoded(
        &self,
        root: StorageRoot,
        decoded: &str,
        must_exist: bool,
    ) -> Result<PathBuf, StorageError> {
        let base = self.layout.root(root);
        let resolved = canonicalize_lenient(&base.join(decoded));

        if !resolved.starts_with(base) {
            return Err(StorageError::forbidden(decoded));
        }
        if must_exist && !resolved.exists() {
            return Err(StorageError::not_found(decoded));
        }
        Ok(resolved)
    }
}

/// Canonicalizes existing paths. For paths that do not exist yet, `.` and
/// `..` components are folded lexically and the deepest existing ancestor is
/// canonicalized so symlinks in it still resolve.
fn canonicalize_lenient(path: &Path) -> PathBuf {
    let normalized = normalize(path);
    if let Ok(canonical) = std::fs::canonicalize(&normalized) {
        return canonical;
    }

    let mut remainder = Vec::new();
    let mut ancestor = normalized.as_path();
    while let Some(parent) = ancestor.parent() {
        if let Some(name) = ancestor.file_name() {
            remainder.push(name.to_os_string());
        }
        ancestor = parent;
        if let Ok(canonical) = std::fs::canonicalize(ancestor) {
            return remainder
                .iter()
                .rev()
                .fold(canonical, |acc, part| acc.join(part));
        }
    }
    normalized
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    out
}
