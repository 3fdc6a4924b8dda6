//! Transform specifications and their fixed output formats.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::StorageRoot;

/// Default encode quality when a request does not specify one.
pub const DEFAULT_QUALITY: u8 = 80;

/// Output format for resize derivatives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossy WebP.
    #[default]
    Webp,
    /// JPEG.
    Jpeg,
    /// PNG (quality parameter ignored, maximum compression).
    Png,
}

impl OutputFormat {
    /// Canonical file extension (`jpeg` maps to `jpg`).
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    /// Media type served for this format.
    #[must_use]
    pub const fn media_type(self) -> &'static str {
        match self {
            Self::Webp => "image/webp",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// Parses the request-parameter spelling (`webp`, `jpeg`, `png`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "webp" => Some(Self::Webp),
            "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }
}

/// Error for a timestamp that is not `HH:MM:SS`.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid timestamp '{0}': expected HH:MM:SS")]
pub struct InvalidTimestamp(pub String);

/// Video seek position in `HH:MM:SS` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameTimestamp(String);

impl FrameTimestamp {
    /// Parses and validates an `HH:MM:SS` timestamp.
    ///
    /// Hours are unbounded two-digit values; minutes and seconds must be
    /// below 60.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTimestamp`] if the value does not match the format.
    pub fn parse(value: &str) -> Result<Self, InvalidTimestamp> {
        let invalid = || InvalidTimestamp(value.to_string());
        let mut parts = value.split(':');
        let (hours, minutes, seconds) = (
            parts.next().ok_or_else(invalid)?,
            parts.next().ok_or_else(invalid)?,
            parts.next().ok_or_else(invalid)?,
        );
        if parts.next().is_some() {
            return Err(invalid());
        }
        for part in [hours, minutes, seconds] {
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
        }
        for part in [minutes, seconds] {
            if part.parse::<u8>().map_err(|_| invalid())? >= 60 {
                return Err(invalid());
            }
        }
        Ok(Self(value.to_string()))
    }

    /// The validated `HH:MM:SS` string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for FrameTimestamp {
    fn default() -> Self {
        Self("00:00:01".to_string())
    }
}

/// How a derivative is produced from its original.
///
/// Together with the asset path, each variant maps to exactly one cache
/// key; the mapping is a pure function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformSpec {
    /// Exact-size resize with format conversion. Scales each axis
    /// independently, so the output may be stretched.
    Resize {
        /// Target width in pixels.
        width: u32,
        /// Target height in pixels.
        height: u32,
        /// Encode quality, 1..=100.
        quality: u8,
        /// Output format.
        format: OutputFormat,
    },
    /// Aspect-preserving, center-cropped thumbnail, always WebP.
    Thumbnail {
        /// Target width in pixels.
        width: u32,
        /// Target height in pixels.
        height: u32,
        /// Encode quality, 1..=100.
        quality: u8,
    },
    /// Single video frame grabbed at a timestamp, always JPEG.
    VideoFrame {
        /// Target width in pixels.
        width: u32,
        /// Target height in pixels.
        height: u32,
        /// Seek position.
        timestamp: FrameTimestamp,
    },
    /// One rasterized PDF page fitted and centered on a white canvas,
    /// always JPEG.
    PdfPage {
        /// Canvas width in pixels.
        width: u32,
        /// Canvas height in pixels.
        height: u32,
        /// Zero-based page index.
        page: u32,
    },
    /// Preview of a PDF page list, always JPEG.
    ///
    /// Only the first valid requested page is rendered; the full list is
    /// still embedded in the cache key in request order.
    PdfPreview {
        /// Canvas width in pixels.
        width: u32,
        /// Canvas height in pixels.
        height: u32,
        /// Zero-based page indices, request order, no dedup.
        pages: Vec<u32>,
    },
}

impl TransformSpec {
    /// The storage root this derivative is cached under.
    #[must_use]
    pub const fn root(&self) -> StorageRoot {
        match self {
            Self::Thumbnail { .. } => StorageRoot::Thumbnails,
            _ => StorageRoot::Cache,
        }
    }

    /// Media type of the derivative, fixed by the transform rather than
    /// sniffed from content.
    #[must_use]
    pub const fn media_type(&self) -> &'static str {
        match self {
            Self::Resize { format, .. } => format.media_type(),
            Self::Thumbnail { .. } => "image/webp",
            Self::VideoFrame { .. } | Self::PdfPage { .. } | Self::PdfPreview { .. } => {
                "image/jpeg"
            }
        }
    }
}
