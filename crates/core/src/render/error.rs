//! Errors raised while producing derivative bytes.

use thiserror::Error;

/// Rendering failures, from decode problems to external tool crashes.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Required external binary is not installed or not executable.
    #[error("{0}")]
    ToolNotFound(String),

    /// Source bytes could not be decoded.
    #[error("{0}")]
    Decode(String),

    /// Output could not be encoded.
    #[error("{0}")]
    Encode(String),

    /// Requested page index is outside the document.
    #[error("page {page} out of range: document has {page_count} pages")]
    PageOutOfRange {
        /// Zero-based page index that was requested.
        page: u32,
        /// Total pages in the document.
        page_count: u32,
    },

    /// External tool exited non-zero.
    #[error("{tool} failed: {stderr}")]
    Failed {
        /// Tool name for diagnostics.
        tool: String,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// External tool ran past its deadline and was killed.
    #[error("{tool} timed out after {secs}s")]
    Timeout {
        /// Tool name for diagnostics.
        tool: String,
        /// Deadline in seconds.
        secs: u64,
    },

    /// Filesystem failure while staging tool input or output.
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// Decode failure with a formatted cause.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Encode failure with a formatted cause.
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode(message.into())
    }
}
