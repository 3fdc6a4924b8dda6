//! Upload, metadata, and listing types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use darkroom_shared::types::MediaKind;

/// Pixel dimensions of an image original.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageDimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Result of persisting an uploaded file.
#[derive(Debug, Clone, Serialize)]
pub struct StoredUpload {
    /// Name on disk, unique per upload.
    pub file_name: String,
    /// Path relative to the originals root, with the section prefix.
    pub relative_path: String,
    /// Section the file was stored under. Empty for the root section.
    pub section: String,
    /// Media kind judged from the extension.
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// File size in bytes.
    pub size: u64,
}

/// Detailed metadata for a single original.
#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    /// File name without the section prefix.
    pub file_name: String,
    /// Decoded path relative to the originals root.
    pub file_path: String,
    /// Media kind judged from the extension.
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// File size in bytes.
    pub size: u64,
    /// File size in megabytes, rounded to two decimals.
    pub size_mb: f64,
    /// Creation time, where the filesystem reports one.
    pub created: Option<DateTime<Utc>>,
    /// Last modification time.
    pub modified: Option<DateTime<Utc>>,
    /// Pixel dimensions, populated for readable images.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<ImageDimensions>,
    /// PDF page count, populated by callers that can probe the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
}

/// One file in a section listing.
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    /// File name.
    pub name: String,
    /// Path relative to the section directory.
    pub path: String,
    /// Path relative to the originals root, usable in process URLs.
    pub full_path: String,
    /// Media kind judged from the extension.
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// File size in bytes.
    pub size: u64,
    /// File size in megabytes, rounded to two decimals.
    pub size_mb: f64,
    /// File size in kilobytes, rounded to two decimals.
    pub size_kb: f64,
    /// Creation time, where the filesystem reports one.
    pub created: Option<DateTime<Utc>>,
    /// Last modification time.
    pub modified: Option<DateTime<Utc>>,
    /// Pixel dimensions, populated for readable images.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<ImageDimensions>,
}

/// Aggregate numbers for one top-level section directory.
#[derive(Debug, Clone, Serialize)]
pub struct SectionSummary {
    /// Directory name.
    pub name: String,
    /// Path relative to the originals root. Equal to `name` for
    /// top-level sections.
    pub path: String,
    /// Number of files, counted recursively.
    pub file_count: u64,
    /// Total size of those files in bytes.
    pub size_bytes: u64,
    /// Total size in megabytes, rounded to two decimals.
    pub size_mb: f64,
}

/// Converts bytes to megabytes rounded to two decimals.
#[must_use]
pub fn to_mb(bytes: u64) -> f64 {
    round2(bytes as f64 / (1024.0 * 1024.0))
}

/// Converts bytes to kilobytes rounded to two decimals.
#[must_use]
pub fn to_kb(bytes: u64) -> f64 {
    round2(bytes as f64 / 1024.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
