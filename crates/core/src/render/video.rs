//! Video frame extraction through an external ffmpeg process.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tokio::process::Command;
use uuid::Uuid;

use darkroom_shared::config::RenderConfig;

use super::error::RenderError;
use super::tool::{resolve_tool_cached, run_tool};

/// Capability port for grabbing a single frame from a video.
///
/// Wrapping the subprocess behind this trait keeps the rest of the
/// pipeline testable without ffmpeg installed.
pub trait FrameExtractor: Send + Sync {
    /// Extracts one frame at `timestamp` (`HH:MM:SS`), scaled with
    /// aspect-preserving enlarge-then-crop to `(width, height)` and
    /// encoded as JPEG.
    fn extract(
        &self,
        video: &Path,
        timestamp: &str,
        width: u32,
        height: u32,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, RenderError>> + Send;
}

/// ffmpeg-backed extractor. The binary is resolved once per process and
/// the outcome is cached, including a resolution failure.
pub struct FfmpegExtractor {
    config: RenderConfig,
    binary: OnceLock<Result<PathBuf, String>>,
}

impl FfmpegExtractor {
    /// Creates an extractor; the binary is not resolved until first use.
    #[must_use]
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            binary: OnceLock::new(),
        }
    }

    fn binary(&self) -> Result<PathBuf, RenderError> {
        resolve_tool_cached(&self.binary, self.config.ffmpeg.as_deref(), "ffmpeg")
    }
}

impl FrameExtractor for FfmpegExtractor {
    async fn extract(
        &self,
        video: &Path,
        timestamp: &str,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        let binary = self.binary()?;
        let output =
            std::env::temp_dir().join(format!("darkroom_frame_{}.jpg", Uuid::new_v4().simple()));

        let mut command = Command::new(&binary);
        command
            .arg("-i")
            .arg(video)
            .arg("-ss")
            .arg(timestamp)
            .arg("-vframes")
            .arg("1")
            .arg("-vf")
            .arg(format!(
                "scale={width}:{height}:force_original_aspect_ratio=increase,crop={width}:{height}"
            ))
            .arg("-qscale:v")
            .arg("2")
            .arg("-y")
            .arg(&output);

        let run = run_tool("ffmpeg", command, self.config.timeout_secs).await;
        let frame = match run {
            Ok(_) => tokio::fs::read(&output).await.map_err(RenderError::from),
            Err(err) => Err(err),
        };
        let _ = tokio::fs::remove_file(&output).await;
        frame
    }
}

impl<V: FrameExtractor> FrameExtractor for std::sync::Arc<V> {
    async fn extract(
        &self,
        video: &Path,
        timestamp: &str,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        (**self).extract(video, timestamp, width, height).await
    }
}
