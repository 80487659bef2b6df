//! # edgequake-pdfocr
//!
//! Page through a PDF as rendered images and read the OCR text of each page.
//!
//! The crate does no PDF parsing, rendering or character recognition of its
//! own. It ties three external capabilities together and caches their results:
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (PDF bytes)
//!  │
//!  ├─ 1. Materialize  temp .pdf file, reject encrypted documents (lopdf)
//!  ├─ 2. Rasterize    every page → image via pdfium (spawn_blocking)
//!  ├─ 3. Select       user-chosen page number, bounds-checked
//!  ├─ 4. Package      page image → PNG bytes + `page_N.png`
//!  ├─ 5. OCR          PNG → text via tesseract
//!  └─ 6. View         image, download target and text side by side
//! ```
//!
//! Uploads, page sequences and OCR text are memoised per [`Session`] in
//! content-addressed LRU caches, so paging back and forth never re-renders or
//! re-runs OCR.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdfocr::{PdfOcrConfig, Session, Upload};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PdfOcrConfig::builder()
//!         .rasterizer_toolchain_path("/opt/pdfium/lib")
//!         .ocr_engine_path("/usr/bin/tesseract")
//!         .build()?;
//!     let mut session = Session::new(config);
//!
//!     let upload = Upload::from_path("document.pdf")?;
//!     let pages = session.upload(&upload).await?;
//!     let view = session.select_page(1).await?;
//!     println!("{} of {pages}\n{}", view.caption, view.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfocr` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cache;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cache::{CacheStats, ContentCache, ContentKey};
pub use config::{PdfOcrConfig, PdfOcrConfigBuilder};
pub use error::PdfOcrError;
pub use output::{DocumentInfo, PageView};
pub use pipeline::materialize::{inspect, materialize, materialize_in, MaterializedFile, Upload};
pub use pipeline::ocr::{OcrEngine, TesseractEngine};
pub use pipeline::package::{package_page, page_filename, PackagedImage};
pub use pipeline::rasterize::{PageImages, PageRasterizer, PdfiumRasterizer};
pub use session::{PageSelector, Session, SessionPhase, SessionStats};
