//! Error types for the edgequake-pdfocr library.
//!
//! Every fallible operation returns [`PdfOcrError`]. The presentation layer
//! (the `pdfocr` binary, or any embedding UI) catches these at its top-level
//! boundary and renders them inline: nothing here is retried and nothing is
//! fatal to a running [`crate::session::Session`].
//!
//! The three failures users actually meet are:
//!
//! * [`PdfOcrError::EncryptedDocument`]: detected while materializing the
//!   upload; the document never reaches the rasterizer.
//! * [`PdfOcrError::RasterizationFailed`]: pdfium could not render the file.
//! * [`PdfOcrError::OcrFailed`]: tesseract could not read a page image.
//!
//! The remaining variants cover input validation, configuration and I/O.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-pdfocr library.
#[derive(Debug, Error)]
pub enum PdfOcrError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The upload was read, but is not a PDF.
    #[error("Upload '{name}' is not a PDF file (first bytes: {magic:?})")]
    NotAPdf { name: String, magic: Vec<u8> },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The PDF is encrypted; it is rejected before rasterization.
    #[error("The PDF is encrypted and cannot be processed.")]
    EncryptedDocument { path: PathBuf },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// Requested page number is outside `1..=total`.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// A page was requested before any document was uploaded.
    #[error("No document has been uploaded yet")]
    NoDocument,

    // ── Rasterizer errors ─────────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Point --pdfium-path (or PDFOCR_PDFIUM_PATH) at the directory that contains\n\
libpdfium, or at the library file itself.\n\
Pre-built libraries: https://github.com/bblanchon/pdfium-binaries/releases\n"
    )]
    RasterizerUnavailable(String),

    /// pdfium failed to open or render the document.
    #[error("Rasterisation failed{}: {detail}", page_suffix(.page))]
    RasterizationFailed { page: Option<usize>, detail: String },

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The OCR executable could not be started.
    #[error("OCR engine '{binary}' could not be started: {reason}\nSet --tesseract (or PDFOCR_TESSERACT) to the tesseract executable.")]
    OcrEngineUnavailable { binary: PathBuf, reason: String },

    /// The OCR engine ran but failed to extract text.
    #[error("OCR failed: {detail}")]
    OcrFailed { detail: String },

    // ── Image errors ──────────────────────────────────────────────────────
    /// PNG encoding of a rendered page failed.
    #[error("Failed to encode page image: {0}")]
    ImageEncoding(#[from] image::ImageError),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the temporary copy of the upload.
    #[error("Failed to create temporary file: {0}")]
    TempFile(#[source] std::io::Error),

    /// Could not write the downloaded page image.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (e.g. a blocking task panicked).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PdfOcrError {
    /// True for the one error users are expected to fix themselves by
    /// supplying a different file; the CLI prints it without the
    /// "unexpected error" prefix.
    pub fn is_encrypted(&self) -> bool {
        matches!(self, PdfOcrError::EncryptedDocument { .. })
    }
}

fn page_suffix(page: &Option<usize>) -> String {
    page.map(|p| format!(" for page {p}")).unwrap_or_default()
}
