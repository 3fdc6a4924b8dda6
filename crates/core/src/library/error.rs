//! Library service errors.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors from upload, metadata, and listing operations.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Upload rejected because the extension is not supported.
    #[error("unsupported file format: .{extension}")]
    UnsupportedFormat {
        /// The rejected extension, lowercase, without the dot.
        extension: String,
    },

    /// Requested path escapes the originals root.
    #[error("access denied: {0}")]
    Forbidden(String),

    /// File or section does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Underlying filesystem operation failed.
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for LibraryError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Forbidden { path } => Self::Forbidden(path),
            StorageError::NotFound { path } => Self::NotFound(path),
            StorageError::Io(source) => Self::Io(source),
        }
    }
}
