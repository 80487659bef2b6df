//! Output types: what the presentation layer displays.

use crate::pipeline::package::PackagedImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize, Serializer};
use std::sync::Arc;

/// Facts about a PDF read without rendering it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// Name the document was uploaded as.
    pub name: String,
    /// Number of pages; 0 when an encrypted document could not be opened.
    pub page_count: usize,
    /// Header version, e.g. `1.7`.
    pub pdf_version: String,
    pub is_encrypted: bool,
    /// Size of the upload in bytes.
    pub file_size: u64,
}

/// Everything shown for the selected page: the image with its caption and
/// download control on one side, the extracted text on the other.
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    /// 1-indexed.
    pub page_number: usize,
    pub total_pages: usize,
    /// `Page N`
    pub caption: String,
    /// `Download Page N`
    pub download_label: String,
    /// `page_N.png`
    pub filename: String,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
    /// PNG-encoded page image; base64 in JSON.
    #[serde(rename = "image_png_base64", serialize_with = "serialize_base64")]
    pub image_png: Arc<Vec<u8>>,
    /// OCR text for the page.
    pub text: String,
    /// True when the text was served from the session cache.
    pub text_from_cache: bool,
}

impl PageView {
    /// The extracted text as a fenced block, the way it is shown next to the
    /// page image.
    pub fn text_block(&self) -> String {
        let body = self.text.trim_end_matches('\n');
        format!("### Extracted Text\n```\n{body}\n```\n")
    }

    /// The download control: the page PNG under its `page_N.png` name.
    pub fn download(&self) -> PackagedImage {
        PackagedImage {
            bytes: self.image_png.clone(),
            filename: self.filename.clone(),
            mime_type: self.mime_type,
        }
    }
}

fn serialize_base64<S: Serializer>(bytes: &Arc<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&STANDARD.encode(bytes.as_slice()))
}
