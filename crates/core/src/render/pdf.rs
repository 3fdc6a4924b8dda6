//! PDF page rendering through poppler utilities.
//!
//! `pdfinfo` reports the page count, `pdftoppm` rasterizes a single page
//! to PNG on stdout, and the result is fitted onto a white canvas and
//! encoded as JPEG.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tokio::process::Command;

use darkroom_shared::config::RenderConfig;

use super::error::RenderError;
use super::image::{encode, fit_on_white_canvas};
use super::tool::{resolve_tool_cached, run_tool};
use crate::derivative::OutputFormat;

/// Rasterization DPI for single-page renders (2x the 72 DPI base).
pub const PAGE_DPI: u32 = 144;
/// Rasterization DPI for preview renders (1.5x the 72 DPI base).
pub const PREVIEW_DPI: u32 = 108;
/// JPEG quality for PDF-derived output.
pub const PDF_JPEG_QUALITY: u8 = 85;

/// Capability port for reading and rasterizing PDF documents.
pub trait PdfRasterizer: Send + Sync {
    /// Number of pages in the document.
    fn page_count(
        &self,
        document: &Path,
    ) -> impl std::future::Future<Output = Result<u32, RenderError>> + Send;

    /// Rasterizes one zero-based page to PNG bytes at the given DPI.
    fn rasterize_page(
        &self,
        document: &Path,
        page: u32,
        dpi: u32,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, RenderError>> + Send;
}

/// poppler-utils backed rasterizer.
pub struct PopplerRasterizer {
    config: RenderConfig,
    pdftoppm: OnceLock<Result<PathBuf, String>>,
    pdfinfo: OnceLock<Result<PathBuf, String>>,
}

impl PopplerRasterizer {
    /// Creates a rasterizer; binaries are not resolved until first use.
    #[must_use]
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            pdftoppm: OnceLock::new(),
            pdfinfo: OnceLock::new(),
        }
    }
}

impl PdfRasterizer for PopplerRasterizer {
    async fn page_count(&self, document: &Path) -> Result<u32, RenderError> {
        let binary =
            resolve_tool_cached(&self.pdfinfo, self.config.pdfinfo.as_deref(), "pdfinfo")?;
        let mut command = Command::new(&binary);
        command.arg(document);

        let stdout = run_tool("pdfinfo", command, self.config.timeout_secs).await?;
        parse_page_count(&stdout)
    }

    async fn rasterize_page(
        &self,
        document: &Path,
        page: u32,
        dpi: u32,
    ) -> Result<Vec<u8>, RenderError> {
        let binary =
            resolve_tool_cached(&self.pdftoppm, self.config.pdftoppm.as_deref(), "pdftoppm")?;
        // pdftoppm numbers pages from one.
        let printable = page + 1;
        let mut command = Command::new(&binary);
        command
            .arg("-png")
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg(printable.to_string())
            .arg("-l")
            .arg(printable.to_string())
            .arg(document);

        run_tool("pdftoppm", command, self.config.timeout_secs).await
    }
}

// The rasterizer is shared between the render pipeline and metadata
// endpoints, so a shared handle must satisfy the port too.
impl<P: PdfRasterizer> PdfRasterizer for std::sync::Arc<P> {
    async fn page_count(&self, document: &Path) -> Result<u32, RenderError> {
        (**self).page_count(document).await
    }

    async fn rasterize_page(
        &self,
        document: &Path,
        page: u32,
        dpi: u32,
    ) -> Result<Vec<u8>, RenderError> {
        (**self).rasterize_page(document, page, dpi).await
    }
}

fn parse_page_count(stdout: &[u8]) -> Result<u32, RenderError> {
    let text = String::from_utf8_lossy(stdout);
    text.lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .and_then(|rest| rest.trim().parse().ok())
        .ok_or_else(|| RenderError::decode("pdfinfo output has no page count"))
}

/// Renders one zero-based page fitted and centered on a white
/// `(width, height)` canvas, encoded as JPEG.
///
/// # Errors
///
/// Returns [`RenderError::PageOutOfRange`] when `page` is not below the
/// document's page count, or any rasterization or encoding failure.
pub async fn render_page<P: PdfRasterizer>(
    rasterizer: &P,
    document: &Path,
    page: u32,
    width: u32,
    height: u32,
    dpi: u32,
) -> Result<Vec<u8>, RenderError> {
    let page_count = rasterizer.page_count(document).await?;
    if page >= page_count {
        return Err(RenderError::PageOutOfRange { page, page_count });
    }
    compose(rasterizer, document, page, width, height, dpi).await
}

/// Renders a preview for a page list. Out-of-range pages are skipped
/// rather than rejected; only the first valid page is rendered even when
/// several are requested, a documented simplification.
///
/// # Errors
///
/// Returns [`RenderError::PageOutOfRange`] when no requested page is
/// inside the document.
pub async fn render_preview<P: PdfRasterizer>(
    rasterizer: &P,
    document: &Path,
    pages: &[u32],
    width: u32,
    height: u32,
) -> Result<Vec<u8>, RenderError> {
    let page_count = rasterizer.page_count(document).await?;
    let Some(page) = pages.iter().copied().find(|page| *page < page_count) else {
        return Err(RenderError::PageOutOfRange {
            page: pages.first().copied().unwrap_or(0),
            page_count,
        });
    };
    compose(rasterizer, document, page, width, height, PREVIEW_DPI).await
}

async fn compose<P: PdfRasterizer>(
    rasterizer: &P,
    document: &Path,
    page: u32,
    width: u32,
    height: u32,
    dpi: u32,
) -> Result<Vec<u8>, RenderError> {
    let png = rasterizer.rasterize_page(document, page, dpi).await?;
    let rendered = image::load_from_memory(&png)
        .map_err(|err| RenderError::decode(format!("rasterized page: {err}")))?;
    let canvas = fit_on_white_canvas(&rendered, width, height);
    encode(&canvas, OutputFormat::Jpeg, PDF_JPEG_QUALITY)
}
