//! The presentation flow: one user, one document at a time.
//!
//! A [`Session`] walks the states
//!
//! ```text
//! Idle ──upload──▶ FileUploaded ──rasterize──▶ PagesReady ──select──▶ PageSelected
//!  ▲                    │                                                │    ▲
//!  └──── on error ──────┘                                                └────┘
//!                                                                  page change
//! ```
//!
//! Every step is memoised in a [`ContentCache`]: uploads by their bytes,
//! page sequences by the materialized path, OCR text by the page's PNG bytes.
//! Re-running the whole flow with the same inputs ([`Session::run`]) therefore
//! costs only cache lookups and one PNG encode.
//!
//! Errors are returned to the caller for inline display. A failed upload
//! leaves the session `Idle`; a failed OCR leaves it `PagesReady`, so the user
//! can pick another page or upload again.

use crate::cache::{CacheStats, ContentCache, ContentKey};
use crate::config::PdfOcrConfig;
use crate::error::PdfOcrError;
use crate::output::PageView;
use crate::pipeline::materialize::{materialize_in, MaterializedFile, Upload};
use crate::pipeline::ocr::{recognize_blocking, OcrEngine, TesseractEngine};
use crate::pipeline::package::{package_blocking, page_filename};
use crate::pipeline::rasterize::{rasterize_blocking, PageImages, PageRasterizer, PdfiumRasterizer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Coarse session state, for callers that only need to know where they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Idle,
    FileUploaded,
    PagesReady,
    PageSelected,
}

enum State {
    Idle,
    FileUploaded {
        document: Arc<MaterializedFile>,
    },
    PagesReady {
        document: Arc<MaterializedFile>,
        pages: PageImages,
    },
    PageSelected {
        document: Arc<MaterializedFile>,
        pages: PageImages,
        index: usize,
    },
}

/// The page-number input control.
///
/// Page numbers are 1-indexed on the way in and converted to a 0-indexed
/// position that is always valid for the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSelector {
    total: usize,
}

impl PageSelector {
    pub fn new(total: usize) -> Self {
        Self { total }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Strict selection: anything outside `1..=total` is rejected.
    pub fn select(&self, page_number: usize) -> Result<usize, PdfOcrError> {
        if page_number >= 1 && page_number <= self.total {
            Ok(page_number - 1)
        } else {
            Err(PdfOcrError::PageOutOfRange {
                page: page_number,
                total: self.total,
            })
        }
    }

    /// Lenient selection: pull the number into `1..=total` first.
    pub fn clamp(&self, page_number: usize) -> Result<usize, PdfOcrError> {
        if self.total == 0 {
            return Err(PdfOcrError::PageOutOfRange {
                page: page_number,
                total: 0,
            });
        }
        Ok(page_number.clamp(1, self.total) - 1)
    }
}

/// Counters exposed for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub uploads: CacheStats,
    pub pages: CacheStats,
    pub texts: CacheStats,
    /// Times the rasterizer actually ran.
    pub rasterizations: u64,
    /// Times the OCR engine actually ran.
    pub ocr_runs: u64,
}

/// Upload → page images → per-page OCR, with caching.
pub struct Session {
    config: PdfOcrConfig,
    rasterizer: Arc<dyn PageRasterizer>,
    ocr: Arc<dyn OcrEngine>,
    uploads: ContentCache<Arc<MaterializedFile>>,
    pages: ContentCache<PageImages>,
    texts: ContentCache<String>,
    state: State,
    rasterizations: u64,
    ocr_runs: u64,
}

impl Session {
    /// Session backed by pdfium and tesseract as configured.
    pub fn new(config: PdfOcrConfig) -> Self {
        let rasterizer = Arc::new(PdfiumRasterizer::new(&config));
        let ocr = Arc::new(TesseractEngine::new(&config));
        Self::with_engines(config, rasterizer, ocr)
    }

    /// Session with caller-supplied engines.
    pub fn with_engines(
        config: PdfOcrConfig,
        rasterizer: Arc<dyn PageRasterizer>,
        ocr: Arc<dyn OcrEngine>,
    ) -> Self {
        Self {
            uploads: ContentCache::new(config.upload_cache_capacity),
            pages: ContentCache::new(config.page_cache_capacity),
            texts: ContentCache::new(config.text_cache_capacity),
            config,
            rasterizer,
            ocr,
            state: State::Idle,
            rasterizations: 0,
            ocr_runs: 0,
        }
    }

    pub fn config(&self) -> &PdfOcrConfig {
        &self.config
    }

    pub fn phase(&self) -> SessionPhase {
        match self.state {
            State::Idle => SessionPhase::Idle,
            State::FileUploaded { .. } => SessionPhase::FileUploaded,
            State::PagesReady { .. } => SessionPhase::PagesReady,
            State::PageSelected { .. } => SessionPhase::PageSelected,
        }
    }

    /// The current document, once materialized.
    pub fn document(&self) -> Option<&MaterializedFile> {
        match &self.state {
            State::Idle => None,
            State::FileUploaded { document }
            | State::PagesReady { document, .. }
            | State::PageSelected { document, .. } => Some(document.as_ref()),
        }
    }

    /// Number of rendered pages, once rasterized.
    pub fn page_count(&self) -> Option<usize> {
        match &self.state {
            State::PagesReady { pages, .. } | State::PageSelected { pages, .. } => Some(pages.len()),
            _ => None,
        }
    }

    /// The selected page, 1-indexed.
    pub fn selected_page(&self) -> Option<usize> {
        match &self.state {
            State::PageSelected { index, .. } => Some(index + 1),
            _ => None,
        }
    }

    /// Materialize and rasterize `upload`; returns the page count.
    ///
    /// Identical bytes reuse the earlier temp file and its rendered pages.
    pub async fn upload(&mut self, upload: &Upload) -> Result<usize, PdfOcrError> {
        self.state = State::Idle;
        match self.load(upload).await {
            Ok(total) => Ok(total),
            Err(e) => {
                warn!("Upload '{}' failed: {}", upload.name(), e);
                self.state = State::Idle;
                Err(e)
            }
        }
    }

    async fn load(&mut self, upload: &Upload) -> Result<usize, PdfOcrError> {
        let upload_key = upload.content_key();
        let document = match self.uploads.get(&upload_key) {
            Some(document) => {
                debug!("Upload cache hit {}", upload_key.short());
                document
            }
            None => {
                let owned = upload.clone();
                let keep = self.config.keep_temp_files;
                let dir = self
                    .config
                    .temp_dir
                    .clone()
                    .unwrap_or_else(std::env::temp_dir);
                let document =
                    tokio::task::spawn_blocking(move || materialize_in(&owned, &dir, keep))
                        .await
                        .map_err(|e| {
                            PdfOcrError::Internal(format!("Materialize task panicked: {}", e))
                        })??;
                let document = Arc::new(document);
                self.uploads.insert(upload_key, document.clone());
                document
            }
        };
        self.state = State::FileUploaded {
            document: document.clone(),
        };

        let pages_key = ContentKey::of_path(document.path());
        let pages = match self.pages.get(&pages_key) {
            Some(pages) => {
                debug!("Page cache hit for {}", document.path().display());
                pages
            }
            None => {
                self.rasterizations += 1;
                let pages =
                    rasterize_blocking(self.rasterizer.clone(), document.path().to_path_buf())
                        .await?;
                if pages.is_empty() {
                    return Err(PdfOcrError::RasterizationFailed {
                        page: None,
                        detail: "document has no pages".into(),
                    });
                }
                self.pages.insert(pages_key, pages.clone());
                pages
            }
        };

        let total = pages.len();
        info!("'{}' ready: {} pages", upload.name(), total);
        self.state = State::PagesReady { document, pages };
        Ok(total)
    }

    /// Show page `page_number` (1-indexed); out-of-range numbers are rejected.
    pub async fn select_page(&mut self, page_number: usize) -> Result<PageView, PdfOcrError> {
        let (document, pages) = self.loaded()?;
        let index = PageSelector::new(pages.len()).select(page_number)?;
        self.show(document, pages, index).await
    }

    /// Show page `page_number`, clamped into the document's range.
    pub async fn select_page_clamped(
        &mut self,
        page_number: usize,
    ) -> Result<PageView, PdfOcrError> {
        let (document, pages) = self.loaded()?;
        let index = PageSelector::new(pages.len()).clamp(page_number)?;
        if index + 1 != page_number {
            debug!("Page {} clamped to {}", page_number, index + 1);
        }
        self.show(document, pages, index).await
    }

    /// Re-run the whole flow for `upload` and `page_number`.
    pub async fn run(
        &mut self,
        upload: &Upload,
        page_number: usize,
    ) -> Result<PageView, PdfOcrError> {
        self.upload(upload).await?;
        self.select_page(page_number).await
    }

    fn loaded(&self) -> Result<(Arc<MaterializedFile>, PageImages), PdfOcrError> {
        match &self.state {
            State::PagesReady { document, pages } | State::PageSelected { document, pages, .. } => {
                Ok((document.clone(), pages.clone()))
            }
            _ => Err(PdfOcrError::NoDocument),
        }
    }

    async fn show(
        &mut self,
        document: Arc<MaterializedFile>,
        pages: PageImages,
        index: usize,
    ) -> Result<PageView, PdfOcrError> {
        self.state = State::PagesReady {
            document: document.clone(),
            pages: pages.clone(),
        };

        let page_number = index + 1;
        let total_pages = pages.len();
        let (width, height) = (pages[index].width(), pages[index].height());
        let packaged = package_blocking(pages.clone(), index, page_filename(page_number)).await?;

        let text_key = ContentKey::of_bytes(&packaged.bytes);
        let (text, text_from_cache) = match self.texts.get(&text_key) {
            Some(text) => {
                debug!("OCR cache hit for page {}", page_number);
                (text, true)
            }
            None => {
                self.ocr_runs += 1;
                let text = recognize_blocking(self.ocr.clone(), packaged.bytes.clone()).await?;
                self.texts.insert(text_key, text.clone());
                (text, false)
            }
        };

        self.state = State::PageSelected {
            document,
            pages,
            index,
        };

        Ok(PageView {
            page_number,
            total_pages,
            caption: format!("Page {page_number}"),
            download_label: format!("Download Page {page_number}"),
            filename: packaged.filename,
            mime_type: packaged.mime_type,
            width,
            height,
            image_png: packaged.bytes,
            text,
            text_from_cache,
        })
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            uploads: self.uploads.stats(),
            pages: self.pages.stats(),
            texts: self.texts.stats(),
            rasterizations: self.rasterizations,
            ocr_runs: self.ocr_runs,
        }
    }

    /// Forget the current document, empty every cache and delete the
    /// session's temp files.
    ///
    /// Every file is attempted; the first failure is returned.
    pub fn cleanup(&mut self) -> Result<(), PdfOcrError> {
        self.state = State::Idle;
        self.pages.clear();
        self.texts.clear();

        let mut first_error = None;
        for document in self.uploads.drain() {
            // Still shared means a caller holds it; the last drop removes it.
            if let Ok(file) = Arc::try_unwrap(document) {
                let path = file.path().to_path_buf();
                if let Err(e) = file.cleanup() {
                    warn!("Could not remove {}: {}", path.display(), e);
                    first_error.get_or_insert(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
