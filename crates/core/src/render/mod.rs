//! Rendering engines behind the derivative pipeline.
//!
//! [`MediaRenderer`] dispatches each transform kind to its engine: the
//! in-process image pipeline, an external frame extractor for video, and
//! an external rasterizer for PDF. Image work runs on the blocking pool
//! so decode and resample never stall the request executor.

pub mod error;
pub mod image;
pub mod pdf;
pub mod tool;
pub mod video;

pub use error::RenderError;
pub use pdf::{PdfRasterizer, PopplerRasterizer, PAGE_DPI, PREVIEW_DPI};
pub use video::{FfmpegExtractor, FrameExtractor};

use std::path::Path;

use ::image::DynamicImage;

use self::image::{encode, load, resize_exact, resize_to_fill};
use crate::derivative::{DerivativeError, DerivativeRenderer, OutputFormat, TransformSpec};

/// Production renderer wiring all three engines together.
pub struct MediaRenderer<V: FrameExtractor, P: PdfRasterizer> {
    extractor: V,
    rasterizer: P,
}

impl<V: FrameExtractor, P: PdfRasterizer> MediaRenderer<V, P> {
    /// Creates a renderer over the given extractor and rasterizer.
    pub fn new(extractor: V, rasterizer: P) -> Self {
        Self {
            extractor,
            rasterizer,
        }
    }
}

impl<V: FrameExtractor, P: PdfRasterizer> DerivativeRenderer for MediaRenderer<V, P> {
    async fn produce(
        &self,
        original: &Path,
        spec: &TransformSpec,
    ) -> Result<Vec<u8>, DerivativeError> {
        match spec {
            TransformSpec::Resize {
                width,
                height,
                quality,
                format,
            } => {
                let (width, height, quality, format) = (*width, *height, *quality, *format);
                render_image(original, move |source| {
                    encode(&resize_exact(source, width, height), format, quality)
                })
                .await
            }
            TransformSpec::Thumbnail {
                width,
                height,
                quality,
            } => {
                let (width, height, quality) = (*width, *height, *quality);
                render_image(original, move |source| {
                    encode(
                        &resize_to_fill(source, width, height),
                        OutputFormat::Webp,
                        quality,
                    )
                })
                .await
            }
            TransformSpec::VideoFrame {
                width,
                height,
                timestamp,
            } => Ok(self
                .extractor
                .extract(original, timestamp.as_str(), *width, *height)
                .await?),
            TransformSpec::PdfPage {
                width,
                height,
                page,
            } => Ok(pdf::render_page(
                &self.rasterizer,
                original,
                *page,
                *width,
                *height,
                PAGE_DPI,
            )
            .await?),
            TransformSpec::PdfPreview {
                width,
                height,
                pages,
            } => Ok(
                pdf::render_preview(&self.rasterizer, original, pages, *width, *height).await?,
            ),
        }
    }
}

async fn render_image<F>(original: &Path, op: F) -> Result<Vec<u8>, DerivativeError>
where
    F: FnOnce(&DynamicImage) -> Result<Vec<u8>, RenderError> + Send + 'static,
{
    let path = original.to_path_buf();
    let bytes = tokio::task::spawn_blocking(move || {
        let source = load(&path)?;
        op(&source)
    })
    .await
    .map_err(|err| DerivativeError::Render(format!("render task failed: {err}")))??;
    Ok(bytes)
}
