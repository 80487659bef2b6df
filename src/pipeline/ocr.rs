//! OCR: PNG bytes of one page → plain text.
//!
//! [`TesseractEngine`] drives the tesseract command-line binary. The image is
//! piped over stdin (`tesseract stdin stdout`) so no second temp file is
//! needed, and the recognised text is read back from stdout.

use crate::config::PdfOcrConfig;
use crate::error::PdfOcrError;
use crate::pipeline::postprocess;
use image::ImageReader;
use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Extracts text from an encoded page image.
///
/// Implementations block; callers run them on a blocking thread.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, png_bytes: &[u8]) -> Result<String, PdfOcrError>;
}

/// Tesseract CLI wrapper.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: PathBuf,
    language: Option<String>,
    tessdata_dir: Option<PathBuf>,
}

impl TesseractEngine {
    pub fn new(config: &PdfOcrConfig) -> Self {
        Self {
            binary: config.ocr_engine_path.clone(),
            language: config.ocr_language.clone(),
            tessdata_dir: config.tessdata_dir.clone(),
        }
    }

    /// Version line reported by `tesseract --version`.
    pub fn version(&self) -> Result<String, PdfOcrError> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .map_err(|e| self.unavailable(e))?;
        // Older releases print the banner on stderr.
        let text = if output.stdout.is_empty() {
            String::from_utf8_lossy(&output.stderr).into_owned()
        } else {
            String::from_utf8_lossy(&output.stdout).into_owned()
        };
        Ok(text.lines().next().unwrap_or_default().trim().to_string())
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("stdin").arg("stdout");
        if let Some(lang) = &self.language {
            cmd.arg("-l").arg(lang);
        }
        if let Some(dir) = &self.tessdata_dir {
            cmd.env("TESSDATA_PREFIX", dir);
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    fn unavailable(&self, e: std::io::Error) -> PdfOcrError {
        PdfOcrError::OcrEngineUnavailable {
            binary: self.binary.clone(),
            reason: e.to_string(),
        }
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, png_bytes: &[u8]) -> Result<String, PdfOcrError> {
        let start = Instant::now();
        let (width, height) = image_dimensions(png_bytes)?;

        let mut child = self.command().spawn().map_err(|e| self.unavailable(e))?;

        // Feed stdin from its own thread so a chatty stderr cannot deadlock us.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| PdfOcrError::Internal("tesseract stdin was not piped".into()))?;
        let input = png_bytes.to_vec();
        let writer = std::thread::spawn(move || stdin.write_all(&input));

        let output = child.wait_with_output().map_err(|e| PdfOcrError::OcrFailed {
            detail: format!("waiting for tesseract: {e}"),
        })?;
        let written = writer
            .join()
            .map_err(|_| PdfOcrError::Internal("tesseract stdin writer panicked".into()))?;

        // A failed exit explains a broken stdin pipe better than the pipe does.
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PdfOcrError::OcrFailed {
                detail: format!("tesseract exited with {}: {}", output.status, stderr.trim()),
            });
        }
        written.map_err(|e| PdfOcrError::OcrFailed {
            detail: format!("writing image to tesseract: {e}"),
        })?;

        let text = postprocess::clean_ocr_text(&String::from_utf8_lossy(&output.stdout));
        info!(
            "OCR {}x{} px → {} chars in {}ms",
            width,
            height,
            text.len(),
            start.elapsed().as_millis()
        );
        Ok(text)
    }
}

/// Decode just enough of the image to know it is one.
pub fn image_dimensions(bytes: &[u8]) -> Result<(u32, u32), PdfOcrError> {
    let dims = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PdfOcrError::OcrFailed {
            detail: format!("reading image: {e}"),
        })?
        .into_dimensions()
        .map_err(|e| PdfOcrError::OcrFailed {
            detail: format!("undecodable image: {e}"),
        })?;
    debug!("OCR input is {}x{} px", dims.0, dims.1);
    Ok(dims)
}

/// Run `engine` on a blocking thread.
pub async fn recognize_blocking(
    engine: Arc<dyn OcrEngine>,
    png_bytes: Arc<Vec<u8>>,
) -> Result<String, PdfOcrError> {
    tokio::task::spawn_blocking(move || engine.recognize(&png_bytes))
        .await
        .map_err(|e| PdfOcrError::Internal(format!("OCR task panicked: {}", e)))?
}
