//! Pipeline stages for one page view.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and the external engines can be swapped behind their
//! traits.
//!
//! ## Data Flow
//!
//! ```text
//! materialize ──▶ rasterize ──▶ package ──▶ ocr ──▶ postprocess
//!  (temp .pdf)     (pdfium)      (PNG)    (tesseract) (cleanup)
//! ```
//!
//! 1. [`materialize`] : write the upload to a temp file, reject encrypted PDFs
//! 2. [`rasterize`]   : render all pages; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`package`]     : PNG-encode the selected page with its download name
//! 4. [`ocr`]         : pipe the PNG through tesseract
//! 5. [`postprocess`] : normalise the raw engine output

pub mod materialize;
pub mod ocr;
pub mod package;
pub mod postprocess;
pub mod rasterize;
