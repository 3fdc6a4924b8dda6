//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Path escapes its storage root.
    #[error("path escapes storage root: {path}")]
    Forbidden {
        /// The offending request path.
        path: String,
    },

    /// File not found in storage.
    #[error("file not found: {path}")]
    NotFound {
        /// The path that was not found.
        path: String,
    },

    /// Underlying filesystem operation failed.
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Create a forbidden path error.
    #[must_use]
    pub fn forbidden(path: impl Into<String>) -> Self {
        Self::Forbidden { path: path.into() }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }
}
