//! Configuration for a previewer [`crate::session::Session`].
//!
//! Everything environment-specific lives in [`PdfOcrConfig`]: where the
//! pdfium library sits, which tesseract executable to run, rendering
//! resolution and how large the per-session caches may grow. The binary fills
//! it from CLI flags (with environment-variable fallbacks) once at startup and
//! hands it to the session; nothing reads global state afterwards.

use crate::error::PdfOcrError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for rendering and OCR.
///
/// Built via [`PdfOcrConfig::builder()`] or using [`PdfOcrConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_pdfocr::PdfOcrConfig;
///
/// let config = PdfOcrConfig::builder()
///     .rasterizer_toolchain_path("/opt/pdfium/lib")
///     .ocr_engine_path("/usr/bin/tesseract")
///     .dpi(200)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 200);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfOcrConfig {
    /// Directory containing the platform pdfium library, or the library file
    /// itself. `None` binds the system library.
    pub rasterizer_toolchain_path: Option<PathBuf>,

    /// Tesseract executable. Default: `tesseract` (resolved through `PATH`).
    pub ocr_engine_path: PathBuf,

    /// Rendering DPI. Range: 72–400. Default: 200.
    ///
    /// 200 DPI is what poppler-based converters use by default and is
    /// comfortably above the ~150 DPI tesseract needs for body text.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 4000.
    ///
    /// Caps oversized pages (posters, drawings) independently of DPI.
    pub max_rendered_pixels: u32,

    /// Tesseract language code(s), e.g. `eng` or `deu+eng`.
    /// `None` leaves the choice to the engine.
    pub ocr_language: Option<String>,

    /// Exported as `TESSDATA_PREFIX` for the OCR process when set.
    pub tessdata_dir: Option<PathBuf>,

    /// Distinct uploads kept materialized per session. Default: 4.
    pub upload_cache_capacity: usize,

    /// Rendered documents kept in memory per session. Default: 4.
    ///
    /// Each entry holds every page of a document as a decoded bitmap, so this
    /// is the knob that bounds memory.
    pub page_cache_capacity: usize,

    /// OCR results kept per session. Default: 256.
    pub text_cache_capacity: usize,

    /// Leave temporary copies of uploads on disk after the session ends.
    /// Default: false.
    pub keep_temp_files: bool,

    /// Directory for the temporary copies of uploads. `None` uses the
    /// system temp directory.
    pub temp_dir: Option<PathBuf>,
}

impl Default for PdfOcrConfig {
    fn default() -> Self {
        Self {
            rasterizer_toolchain_path: None,
            ocr_engine_path: PathBuf::from("tesseract"),
            dpi: 200,
            max_rendered_pixels: 4000,
            ocr_language: None,
            tessdata_dir: None,
            upload_cache_capacity: 4,
            page_cache_capacity: 4,
            text_cache_capacity: 256,
            keep_temp_files: false,
            temp_dir: None,
        }
    }
}

impl PdfOcrConfig {
    /// Create a new builder for `PdfOcrConfig`.
    pub fn builder() -> PdfOcrConfigBuilder {
        PdfOcrConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PdfOcrConfig`].
#[derive(Debug)]
pub struct PdfOcrConfigBuilder {
    config: PdfOcrConfig,
}

impl PdfOcrConfigBuilder {
    pub fn rasterizer_toolchain_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.rasterizer_toolchain_path = Some(path.into());
        self
    }

    pub fn ocr_engine_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.ocr_engine_path = path.into();
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = Some(lang.into());
        self
    }

    pub fn tessdata_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.tessdata_dir = Some(dir.into());
        self
    }

    pub fn upload_cache_capacity(mut self, n: usize) -> Self {
        self.config.upload_cache_capacity = n;
        self
    }

    pub fn page_cache_capacity(mut self, n: usize) -> Self {
        self.config.page_cache_capacity = n;
        self
    }

    pub fn text_cache_capacity(mut self, n: usize) -> Self {
        self.config.text_cache_capacity = n;
        self
    }

    pub fn keep_temp_files(mut self, v: bool) -> Self {
        self.config.keep_temp_files = v;
        self
    }

    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = Some(dir.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PdfOcrConfig, PdfOcrError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(PdfOcrError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        if c.ocr_engine_path.as_os_str().is_empty() {
            return Err(PdfOcrError::InvalidConfig(
                "OCR engine path must not be empty".into(),
            ));
        }
        if c.upload_cache_capacity == 0 || c.page_cache_capacity == 0 || c.text_cache_capacity == 0
        {
            return Err(PdfOcrError::InvalidConfig(
                "Cache capacities must be ≥ 1".into(),
            ));
        }
        if let Some(lang) = &c.ocr_language {
            if lang.trim().is_empty() {
                return Err(PdfOcrError::InvalidConfig(
                    "OCR language must not be blank".into(),
                ));
            }
        }
        Ok(self.config)
    }
}
