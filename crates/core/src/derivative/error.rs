//! Derivative pipeline errors.

use thiserror::Error;

use crate::render::RenderError;
use crate::storage::StorageError;

/// Errors from derivative resolution, rendering, and invalidation.
///
/// Deliberately flat: callers map each variant straight to a response
/// status without digging through nested sources.
#[derive(Debug, Error)]
pub enum DerivativeError {
    /// Requested path escapes its storage root.
    #[error("access denied: {0}")]
    ForbiddenPath(String),

    /// Original file does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// External renderer binary could not be located.
    #[error("{0}")]
    ToolNotFound(String),

    /// Original bytes could not be decoded.
    #[error("failed to decode source: {0}")]
    Decode(String),

    /// Derivative could not be encoded with the requested parameters.
    #[error("failed to encode derivative: {0}")]
    Encode(String),

    /// Requested page index is outside the document.
    #[error("page {page} out of range: document has {page_count} pages")]
    PageOutOfRange {
        /// Zero-based page index that was requested.
        page: u32,
        /// Total pages in the document.
        page_count: u32,
    },

    /// Rendering failed; diagnostic text from the renderer is preserved.
    #[error("render failed: {0}")]
    Render(String),

    /// External renderer exceeded its timeout.
    #[error("render timed out after {0}s")]
    RenderTimeout(u64),

    /// The original file could not be deleted.
    #[error("failed to delete original: {0}")]
    DeleteFailed(String),
}

impl From<StorageError> for DerivativeError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Forbidden { path } => Self::ForbiddenPath(path),
            StorageError::NotFound { path } => Self::NotFound(path),
            StorageError::Io(source) => Self::Render(format!("storage failure: {source}")),
        }
    }
}

impl From<RenderError> for DerivativeError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::ToolNotFound(message) => Self::ToolNotFound(message),
            RenderError::Decode(message) => Self::Decode(message),
            RenderError::Encode(message) => Self::Encode(message),
            RenderError::PageOutOfRange { page, page_count } => {
                Self::PageOutOfRange { page, page_count }
            }
            RenderError::Failed { tool, stderr } => Self::Render(format!("{tool}: {stderr}")),
            RenderError::Timeout { secs, .. } => Self::RenderTimeout(secs),
            RenderError::Io(source) => Self::Render(format!("io failure: {source}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_errors_flatten() {
        let err: DerivativeError = StorageError::forbidden("../etc/passwd").into();
        assert!(matches!(err, DerivativeError::ForbiddenPath(_)));

        let err: DerivativeError = StorageError::not_found("sec/missing.png").into();
        assert!(matches!(err, DerivativeError::NotFound(_)));
    }

    #[test]
    fn test_render_errors_flatten() {
        let err: DerivativeError = RenderError::PageOutOfRange {
            page: 9,
            page_count: 3,
        }
        .into();
        assert!(matches!(
            err,
            DerivativeError::PageOutOfRange { page: 9, page_count: 3 }
        ));

        let err: DerivativeError = RenderError::Timeout {
            tool: "ffmpeg".to_string(),
            secs: 30,
        }
        .into();
        assert!(matches!(err, DerivativeError::RenderTimeout(30)));
    }

    #[test]
    fn test_display_messages() {
        let err = DerivativeError::PageOutOfRange {
            page: 5,
            page_count: 2,
        };
        assert_eq!(
            err.to_string(),
            "page 5 out of range: document has 2 pages"
        );
    }
}
