//! Media kind classification by file extension.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Image extensions accepted for upload and processing (lowercase, no dot).
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "gif", "bmp", "tiff", "tif", "svg",
];

/// Video extensions recognized for frame extraction (lowercase, no dot).
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mov", "avi", "mkv", "webm", "flv", "wmv", "m4v", "3gp",
];

/// Document extensions accepted for upload (lowercase, no dot).
pub const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "txt", "rtf"];

/// What kind of media a file holds, judged by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Raster or vector image.
    Image,
    /// Video container.
    Video,
    /// PDF document.
    Pdf,
    /// Non-PDF document (doc, docx, txt, rtf).
    Document,
    /// Anything else.
    Unknown,
}

impl MediaKind {
    /// Classifies a path by its extension (case-insensitive).
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return Self::Unknown;
        };
        let ext = ext.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Self::Image
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Self::Video
        } else if ext == "pdf" {
            Self::Pdf
        } else if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
            Self::Document
        } else {
            Self::Unknown
        }
    }

    /// Returns the lowercase name used in API responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Pdf => "pdf",
            Self::Document => "document",
            Self::Unknown => "unknown",
        }
    }

    /// Whether files of this kind may be uploaded.
    #[must_use]
    pub const fn is_uploadable(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}
