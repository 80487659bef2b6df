//! Materialization: persist an upload to a temporary `.pdf` file.
//!
//! pdfium wants a file-system path, so every upload is written to a named
//! temp file first. Before the path is handed on, the file is opened with
//! lopdf and rejected if its trailer carries an `/Encrypt` dictionary; an
//! encrypted document never reaches the rasterizer.
//!
//! The temp file is owned by [`MaterializedFile`] and removed when the last
//! handle is dropped (or on [`MaterializedFile::cleanup`]), unless the caller
//! asked to keep it.

use crate::cache::ContentKey;
use crate::error::PdfOcrError;
use crate::output::DocumentInfo;
use lopdf::Document;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{debug, info, warn};

/// Raw PDF bytes supplied by the user, with the name they were uploaded as.
#[derive(Clone)]
pub struct Upload {
    name: String,
    bytes: Vec<u8>,
}

impl std::fmt::Debug for Upload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upload")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a local file as an upload.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PdfOcrError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => PdfOcrError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => PdfOcrError::FileNotFound {
                path: path.to_path_buf(),
            },
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.pdf".to_string());
        debug!("Read upload '{}' ({} bytes)", name, bytes.len());
        Ok(Self { name, bytes })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Cache key over the PDF bytes; the name does not participate.
    pub fn content_key(&self) -> ContentKey {
        ContentKey::of_bytes(&self.bytes)
    }

    /// Reject anything that does not start with the `%PDF` magic.
    fn ensure_pdf(&self) -> Result<(), PdfOcrError> {
        if self.bytes.starts_with(b"%PDF") {
            Ok(())
        } else {
            Err(PdfOcrError::NotAPdf {
                name: self.name.clone(),
                magic: self.bytes.iter().take(4).copied().collect(),
            })
        }
    }
}

/// A temporary on-disk copy of an [`Upload`].
#[derive(Debug)]
pub struct MaterializedFile {
    path: PathBuf,
    /// `None` once the file has been persisted with `keep_temp_files`.
    temp: Option<TempPath>,
    info: DocumentInfo,
}

impl MaterializedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Page count and version as read by lopdf.
    pub fn info(&self) -> &DocumentInfo {
        &self.info
    }

    /// Whether the file will be removed when this handle goes away.
    pub fn is_scoped(&self) -> bool {
        self.temp.is_some()
    }

    /// Delete the temp file now, reporting any I/O error.
    pub fn cleanup(mut self) -> Result<(), PdfOcrError> {
        match self.temp.take() {
            Some(temp) => temp.close().map_err(PdfOcrError::TempFile),
            None => Ok(()),
        }
    }
}

/// Write `upload` to a temp file and verify it is an unencrypted PDF.
///
/// With `keep` set the file outlives the returned handle; otherwise it is
/// deleted on drop.
pub fn materialize(upload: &Upload, keep: bool) -> Result<MaterializedFile, PdfOcrError> {
    materialize_in(upload, &std::env::temp_dir(), keep)
}

/// [`materialize`] into `dir` instead of the system temp directory.
pub fn materialize_in(
    upload: &Upload,
    dir: &Path,
    keep: bool,
) -> Result<MaterializedFile, PdfOcrError> {
    upload.ensure_pdf()?;

    let mut file = tempfile::Builder::new()
        .prefix("pdfocr-")
        .suffix(".pdf")
        .tempfile_in(dir)
        .map_err(PdfOcrError::TempFile)?;
    file.write_all(upload.bytes())
        .and_then(|_| file.flush())
        .map_err(PdfOcrError::TempFile)?;
    let temp = file.into_temp_path();
    let path = temp.to_path_buf();
    debug!("Materialized '{}' → {}", upload.name(), path.display());

    // On error `temp` is dropped here and the file goes with it.
    let info = probe(&path, upload)?;

    let temp = if keep {
        let kept = temp
            .keep()
            .map_err(|e| PdfOcrError::TempFile(e.error))?;
        debug!("Keeping temp file {}", kept.display());
        None
    } else {
        Some(temp)
    };

    info!(
        "Materialized '{}': {} pages, PDF {}",
        upload.name(),
        info.page_count,
        info.pdf_version
    );
    Ok(MaterializedFile { path, temp, info })
}

/// Read document info from an upload without writing it anywhere.
///
/// Unlike [`materialize`], an encrypted document is reported rather than
/// rejected.
pub fn inspect(upload: &Upload) -> Result<DocumentInfo, PdfOcrError> {
    upload.ensure_pdf()?;

    match Document::load_mem(upload.bytes()) {
        Ok(doc) => {
            let is_encrypted = doc.is_encrypted();
            Ok(document_info(upload, &doc, is_encrypted))
        }
        Err(e) if mentions_encryption(&e.to_string()) => {
            Ok(DocumentInfo {
                name: upload.name().to_string(),
                page_count: 0,
                pdf_version: header_version(upload.bytes()),
                is_encrypted: true,
                file_size: upload.len() as u64,
            })
        }
        Err(e) => Err(PdfOcrError::CorruptPdf {
            path: PathBuf::from(upload.name()),
            detail: e.to_string(),
        }),
    }
}

/// Open the materialized file with lopdf and apply the encryption check.
fn probe(path: &Path, upload: &Upload) -> Result<DocumentInfo, PdfOcrError> {
    let doc = match Document::load(path) {
        Ok(doc) => doc,
        Err(e) => {
            let detail = e.to_string();
            if mentions_encryption(&detail) {
                warn!("Rejecting encrypted PDF '{}'", upload.name());
                return Err(PdfOcrError::EncryptedDocument {
                    path: path.to_path_buf(),
                });
            }
            return Err(PdfOcrError::CorruptPdf {
                path: path.to_path_buf(),
                detail,
            });
        }
    };

    if doc.is_encrypted() {
        warn!("Rejecting encrypted PDF '{}'", upload.name());
        return Err(PdfOcrError::EncryptedDocument {
            path: path.to_path_buf(),
        });
    }

    Ok(document_info(upload, &doc, false))
}

fn document_info(upload: &Upload, doc: &Document, is_encrypted: bool) -> DocumentInfo {
    DocumentInfo {
        name: upload.name().to_string(),
        page_count: doc.get_pages().len(),
        pdf_version: doc.version.clone(),
        is_encrypted,
        file_size: upload.len() as u64,
    }
}

fn mentions_encryption(detail: &str) -> bool {
    let lower = detail.to_lowercase();
    lower.contains("encrypt") || lower.contains("decrypt") || lower.contains("password")
}

/// Version from the `%PDF-x.y` header line, for documents lopdf refused.
fn header_version(bytes: &[u8]) -> String {
    bytes
        .get(5..8)
        .and_then(|v| std::str::from_utf8(v).ok())
        .unwrap_or("unknown")
        .to_string()
}
