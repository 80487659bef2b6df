//! Image packaging: `DynamicImage` → PNG bytes plus a download filename.
//!
//! PNG is lossless, so the bytes handed to OCR and offered for download
//! decode back to exactly the rendered pixels. The same bytes double as the
//! OCR cache key.

use crate::error::PdfOcrError;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub const PNG_MIME: &str = "image/png";

/// A page image ready to be downloaded or fed to OCR.
#[derive(Debug, Clone)]
pub struct PackagedImage {
    pub bytes: Arc<Vec<u8>>,
    pub filename: String,
    pub mime_type: &'static str,
}

impl PackagedImage {
    /// Write the image into `dir` under its filename, returning the full path.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf, PdfOcrError> {
        let path = dir.join(&self.filename);
        std::fs::write(&path, self.bytes.as_slice()).map_err(|source| {
            PdfOcrError::OutputWriteFailed {
                path: path.clone(),
                source,
            }
        })?;
        debug!("Saved {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }
}

/// Download filename for a 1-indexed page number.
pub fn page_filename(page_number: usize) -> String {
    format!("page_{page_number}.png")
}

/// Encode `img` as PNG under `filename`.
pub fn package_page(img: &DynamicImage, filename: impl Into<String>) -> Result<PackagedImage, PdfOcrError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    let filename = filename.into();
    debug!("Packaged {} → {} bytes PNG", filename, buf.len());

    Ok(PackagedImage {
        bytes: Arc::new(buf),
        filename,
        mime_type: PNG_MIME,
    })
}

/// Run [`package_page`] on a blocking thread.
pub async fn package_blocking(
    pages: crate::pipeline::rasterize::PageImages,
    index: usize,
    filename: String,
) -> Result<PackagedImage, PdfOcrError> {
    tokio::task::spawn_blocking(move || {
        let img = pages.get(index).ok_or(PdfOcrError::PageOutOfRange {
            page: index + 1,
            total: pages.len(),
        })?;
        package_page(img, filename)
    })
    .await
    .map_err(|e| PdfOcrError::Internal(format!("Encode task panicked: {}", e)))?
}
