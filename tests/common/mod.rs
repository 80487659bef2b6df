//! Shared fixtures for the integration tests: PDFs built with lopdf and
//! engine fakes that count how often they run.

#![allow(dead_code)]

use edgequake_pdfocr::{OcrEngine, PageRasterizer, PdfOcrError, Upload};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ── PDF fixtures ─────────────────────────────────────────────────────────────

/// A PDF with one page per entry, each showing that line of text.
pub fn pdf_with_pages(lines: &[&str]) -> Vec<u8> {
    build_pdf(lines, false)
}

/// A one-page PDF whose trailer declares standard-handler encryption.
pub fn encrypted_pdf() -> Vec<u8> {
    build_pdf(&["secret"], true)
}

pub fn upload(name: &str, lines: &[&str]) -> Upload {
    Upload::new(name, pdf_with_pages(lines))
}

fn build_pdf(lines: &[&str], encrypted: bool) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(lines.len());
    for line in lines {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*line)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode page content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if encrypted {
        let key = Object::String(vec![0u8; 32], StringFormat::Hexadecimal);
        let encrypt_id = doc.add_object(dictionary! {
            "Filter" => "Standard",
            "V" => 1,
            "R" => 2,
            "O" => key.clone(),
            "U" => key,
            "P" => -4,
        });
        doc.trailer.set("Encrypt", encrypt_id);
    }

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("serialize fixture PDF");
    bytes
}

// ── Engine fakes ─────────────────────────────────────────────────────────────

/// Rasterizer that reads the page count with lopdf and paints page `n` as a
/// solid 8x8 image whose red channel is `n`.
#[derive(Default)]
pub struct FakeRasterizer {
    calls: AtomicUsize,
}

impl FakeRasterizer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PageRasterizer for FakeRasterizer {
    fn rasterize(&self, pdf_path: &Path) -> Result<Vec<DynamicImage>, PdfOcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let doc = Document::load(pdf_path).map_err(|e| PdfOcrError::RasterizationFailed {
            page: None,
            detail: e.to_string(),
        })?;
        Ok((1..=doc.get_pages().len())
            .map(|n| {
                DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([n as u8, 0, 0, 255])))
            })
            .collect())
    }
}

/// OCR engine that decodes the PNG and reports which page it saw.
#[derive(Default)]
pub struct FakeOcr {
    calls: AtomicUsize,
    fail: bool,
}

impl FakeOcr {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// An engine whose every run fails.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: true,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OcrEngine for FakeOcr {
    fn recognize(&self, png_bytes: &[u8]) -> Result<String, PdfOcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(PdfOcrError::OcrFailed {
                detail: "engine crashed".into(),
            });
        }
        let img = image::load_from_memory(png_bytes).map_err(|e| PdfOcrError::OcrFailed {
            detail: e.to_string(),
        })?;
        let page = img.get_pixel(0, 0)[0];
        Ok(format!("Hello from page {page}\n"))
    }
}
