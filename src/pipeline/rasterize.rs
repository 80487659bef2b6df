//! PDF rasterisation: render every page of a file to a `DynamicImage`.
//!
//! The session talks to a [`PageRasterizer`] rather than to pdfium directly so
//! tests can count invocations and run without a native library.
//! [`PdfiumRasterizer`] is the production implementation.
//!
//! ## Why bind per call?
//!
//! pdfium keeps process-global state behind its bindings. Binding inside the
//! blocking task that renders keeps the `Pdfium` handle on one thread and
//! lets the rasterizer itself be a plain `Send + Sync` value.

use crate::config::PdfOcrConfig;
use crate::error::PdfOcrError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// An ordered page sequence: index + 1 is the page number.
pub type PageImages = Arc<Vec<DynamicImage>>;

/// Converts a PDF on disk into one image per page, in page order.
///
/// Implementations block; callers run them on a blocking thread.
pub trait PageRasterizer: Send + Sync {
    fn rasterize(&self, pdf_path: &Path) -> Result<Vec<DynamicImage>, PdfOcrError>;
}

/// pdfium-backed rasterizer.
#[derive(Debug, Clone)]
pub struct PdfiumRasterizer {
    toolchain_path: Option<PathBuf>,
    dpi: u32,
    max_pixels: u32,
}

impl PdfiumRasterizer {
    pub fn new(config: &PdfOcrConfig) -> Self {
        Self {
            toolchain_path: config.rasterizer_toolchain_path.clone(),
            dpi: config.dpi,
            max_pixels: config.max_rendered_pixels,
        }
    }

    /// Bind the configured library, or the system one when none is set.
    fn bind(&self) -> Result<Pdfium, PdfOcrError> {
        let bindings = match &self.toolchain_path {
            Some(path) => {
                let lib = library_path(path);
                debug!("Binding pdfium from {}", lib.display());
                Pdfium::bind_to_library(&lib)
            }
            None => {
                debug!("Binding system pdfium");
                Pdfium::bind_to_system_library()
            }
        }
        .map_err(|e| PdfOcrError::RasterizerUnavailable(format!("{:?}", e)))?;

        Ok(Pdfium::new(bindings))
    }

    fn render_config(&self) -> PdfRenderConfig {
        PdfRenderConfig::new()
            .scale_page_by_factor(self.dpi as f32 / 72.0)
            .set_maximum_width(self.max_pixels as i32)
            .set_maximum_height(self.max_pixels as i32)
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn rasterize(&self, pdf_path: &Path) -> Result<Vec<DynamicImage>, PdfOcrError> {
        let start = Instant::now();
        let pdfium = self.bind()?;

        let document = pdfium
            .load_pdf_from_file(pdf_path, None)
            .map_err(|e| PdfOcrError::RasterizationFailed {
                page: None,
                detail: format!("{:?}", e),
            })?;

        let pages = document.pages();
        let total_pages = pages.len() as usize;
        let render_config = self.render_config();
        let mut images = Vec::with_capacity(total_pages);

        for (idx, page) in pages.iter().enumerate() {
            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                PdfOcrError::RasterizationFailed {
                    page: Some(idx + 1),
                    detail: format!("{:?}", e),
                }
            })?;

            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px",
                idx + 1,
                image.width(),
                image.height()
            );
            images.push(image);
        }

        info!(
            "Rasterised {} pages at {} DPI in {}ms",
            images.len(),
            self.dpi,
            start.elapsed().as_millis()
        );
        Ok(images)
    }
}

/// Resolve a toolchain location to the library file: a directory gets the
/// platform library name appended, anything else is used as is.
fn library_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        Pdfium::pdfium_platform_library_name_at_path(path)
    } else {
        path.to_path_buf()
    }
}

/// Run `rasterizer` on a blocking thread.
pub async fn rasterize_blocking(
    rasterizer: Arc<dyn PageRasterizer>,
    pdf_path: PathBuf,
) -> Result<PageImages, PdfOcrError> {
    tokio::task::spawn_blocking(move || rasterizer.rasterize(&pdf_path))
        .await
        .map_err(|e| PdfOcrError::Internal(format!("Render task panicked: {}", e)))?
        .map(Arc::new)
}
