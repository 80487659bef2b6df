//! Session flow tests: upload → pages → selection → OCR, with fake engines so
//! neither pdfium nor tesseract needs to be installed.

mod common;

use common::{encrypted_pdf, upload, FakeOcr, FakeRasterizer};
use edgequake_pdfocr::{
    inspect, materialize, PdfOcrConfig, PdfOcrError, Session, SessionPhase, Upload,
};
use std::path::Path;
use std::sync::Arc;

fn session_with(
    config: PdfOcrConfig,
) -> (Session, Arc<FakeRasterizer>, Arc<FakeOcr>) {
    let rasterizer = FakeRasterizer::new();
    let ocr = FakeOcr::new();
    let session = Session::with_engines(config, rasterizer.clone(), ocr.clone());
    (session, rasterizer, ocr)
}

fn session() -> (Session, Arc<FakeRasterizer>, Arc<FakeOcr>) {
    session_with(PdfOcrConfig::default())
}

// ── Upload and rasterisation ─────────────────────────────────────────────────

#[tokio::test]
async fn upload_renders_every_page_in_order() {
    let (mut session, rasterizer, ocr) = session();
    let total = session
        .upload(&upload("three.pdf", &["one", "two", "three"]))
        .await
        .unwrap();

    assert_eq!(total, 3);
    assert_eq!(session.phase(), SessionPhase::PagesReady);
    assert_eq!(session.page_count(), Some(3));
    assert_eq!(rasterizer.calls(), 1);
    assert_eq!(ocr.calls(), 0, "no OCR before a page is selected");

    let doc = session.document().unwrap();
    assert_eq!(doc.info().page_count, 3);
    assert!(doc.path().exists());
    assert_eq!(doc.path().extension().unwrap(), "pdf");
}

#[tokio::test]
async fn pages_come_back_in_document_order() {
    let (mut session, _, _) = session();
    session
        .upload(&upload("three.pdf", &["one", "two", "three"]))
        .await
        .unwrap();

    for n in 1..=3 {
        let view = session.select_page(n).await.unwrap();
        assert_eq!(view.text, format!("Hello from page {n}\n"));
    }
}

#[tokio::test]
async fn encrypted_upload_never_reaches_the_rasterizer() {
    let (mut session, rasterizer, ocr) = session();
    let err = session
        .upload(&Upload::new("locked.pdf", encrypted_pdf()))
        .await
        .unwrap_err();

    assert!(err.is_encrypted(), "got {err:?}");
    assert_eq!(err.to_string(), "The PDF is encrypted and cannot be processed.");
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert_eq!(rasterizer.calls(), 0);
    assert_eq!(ocr.calls(), 0);
}

#[tokio::test]
async fn encrypt_token_in_page_text_is_not_encryption() {
    let (mut session, rasterizer, _) = session();
    let notes = upload(
        "notes.pdf",
        &["trailer has /Encrypt 5 0 R", "see /Encrypt<< in the manual"],
    );

    let total = session.upload(&notes).await.unwrap();
    assert_eq!(total, 2);
    assert_eq!(rasterizer.calls(), 1);

    let file = materialize(&notes, false).unwrap();
    assert!(!file.info().is_encrypted);
    assert!(!inspect(&notes).unwrap().is_encrypted);
}

#[tokio::test]
async fn non_pdf_upload_resets_to_idle() {
    let (mut session, rasterizer, _) = session();
    session
        .upload(&upload("ok.pdf", &["fine"]))
        .await
        .unwrap();

    let err = session
        .upload(&Upload::new("notes.txt", b"plain text".to_vec()))
        .await
        .unwrap_err();
    assert!(matches!(err, PdfOcrError::NotAPdf { .. }), "got {err:?}");
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert!(session.document().is_none());
    assert_eq!(rasterizer.calls(), 1);
}

// ── Page selection ───────────────────────────────────────────────────────────

#[tokio::test]
async fn selecting_page_two_yields_named_png_and_text() {
    let (mut session, _, ocr) = session();
    session
        .upload(&upload("three.pdf", &["one", "two", "three"]))
        .await
        .unwrap();

    let view = session.select_page(2).await.unwrap();
    assert_eq!(view.page_number, 2);
    assert_eq!(view.total_pages, 3);
    assert_eq!(view.caption, "Page 2");
    assert_eq!(view.download_label, "Download Page 2");
    assert_eq!(view.filename, "page_2.png");
    assert_eq!(view.mime_type, "image/png");
    assert_eq!((view.width, view.height), (8, 8));
    assert!(view.image_png.starts_with(b"\x89PNG"));
    assert_eq!(view.text, "Hello from page 2\n");
    assert!(!view.text_from_cache);
    assert_eq!(ocr.calls(), 1);

    assert_eq!(session.phase(), SessionPhase::PageSelected);
    assert_eq!(session.selected_page(), Some(2));

    let decoded = image::load_from_memory(&view.image_png).unwrap();
    assert_eq!(decoded.to_rgba8().get_pixel(3, 3).0, [2, 0, 0, 255]);
}

#[tokio::test]
async fn reselecting_a_page_serves_cached_text() {
    let (mut session, _, ocr) = session();
    session
        .upload(&upload("two.pdf", &["a", "b"]))
        .await
        .unwrap();

    let first = session.select_page(1).await.unwrap();
    session.select_page(2).await.unwrap();
    let again = session.select_page(1).await.unwrap();

    assert_eq!(first.text, again.text);
    assert!(again.text_from_cache);
    assert_eq!(ocr.calls(), 2);
    assert_eq!(session.stats().ocr_runs, 2);
    assert_eq!(session.stats().texts.hits, 1);
}

#[tokio::test]
async fn out_of_range_pages_are_rejected_without_ocr() {
    let (mut session, _, ocr) = session();
    session
        .upload(&upload("three.pdf", &["one", "two", "three"]))
        .await
        .unwrap();

    for page in [0, 4] {
        let err = session.select_page(page).await.unwrap_err();
        assert!(
            matches!(err, PdfOcrError::PageOutOfRange { total: 3, .. }),
            "page {page}: got {err:?}"
        );
    }
    assert_eq!(ocr.calls(), 0);
    assert_eq!(session.phase(), SessionPhase::PagesReady);
}

#[tokio::test]
async fn clamped_selection_stays_inside_the_document() {
    let (mut session, _, _) = session();
    session
        .upload(&upload("three.pdf", &["one", "two", "three"]))
        .await
        .unwrap();

    assert_eq!(session.select_page_clamped(0).await.unwrap().page_number, 1);
    assert_eq!(session.select_page_clamped(99).await.unwrap().page_number, 3);
    assert_eq!(session.selected_page(), Some(3));
}

#[tokio::test]
async fn ocr_failure_leaves_pages_ready() {
    let rasterizer = FakeRasterizer::new();
    let ocr = FakeOcr::failing();
    let mut session = Session::with_engines(PdfOcrConfig::default(), rasterizer, ocr.clone());
    session
        .upload(&upload("one.pdf", &["only"]))
        .await
        .unwrap();

    let err = session.select_page(1).await.unwrap_err();
    assert!(matches!(err, PdfOcrError::OcrFailed { .. }), "got {err:?}");
    assert_eq!(session.phase(), SessionPhase::PagesReady);
    assert_eq!(session.page_count(), Some(1));

    // Failures are not cached; the next attempt runs the engine again.
    session.select_page(1).await.unwrap_err();
    assert_eq!(ocr.calls(), 2);
}

// ── Caching across reruns ────────────────────────────────────────────────────

#[tokio::test]
async fn rerunning_with_identical_bytes_hits_every_cache() {
    let (mut session, rasterizer, ocr) = session();
    let first = upload("report.pdf", &["one", "two"]);
    // Same bytes under another name.
    let second = Upload::new("copy-of-report.pdf", first.bytes().to_vec());

    let a = session.run(&first, 2).await.unwrap();
    let path = session.document().unwrap().path().to_path_buf();
    let b = session.run(&second, 2).await.unwrap();

    assert_eq!(a.image_png, b.image_png);
    assert_eq!(a.text, b.text);
    assert!(b.text_from_cache);
    assert_eq!(session.document().unwrap().path(), path);

    let stats = session.stats();
    assert_eq!(rasterizer.calls(), 1);
    assert_eq!(ocr.calls(), 1);
    assert_eq!(stats.rasterizations, 1);
    assert_eq!(stats.uploads.hits, 1);
    assert_eq!(stats.pages.hits, 1);
}

#[tokio::test]
async fn evicted_upload_is_deleted_and_rendered_again() {
    let config = PdfOcrConfig::builder()
        .upload_cache_capacity(1)
        .build()
        .unwrap();
    let (mut session, rasterizer, _) = session_with(config);
    let a = upload("a.pdf", &["a"]);
    let b = upload("b.pdf", &["b", "b"]);

    session.upload(&a).await.unwrap();
    let a_path = session.document().unwrap().path().to_path_buf();
    session.upload(&b).await.unwrap();
    assert!(!a_path.exists(), "evicted temp file should be removed");

    session.upload(&a).await.unwrap();
    assert_eq!(rasterizer.calls(), 3);
    assert_eq!(session.page_count(), Some(1));
}

// ── Temp file lifecycle ──────────────────────────────────────────────────────

#[tokio::test]
async fn cleanup_deletes_temp_files() {
    let (mut session, _, _) = session();
    session.run(&upload("a.pdf", &["a"]), 1).await.unwrap();
    let path = session.document().unwrap().path().to_path_buf();
    assert!(path.exists());

    session.cleanup().unwrap();
    assert!(!path.exists());
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert!(matches!(
        session.select_page(1).await,
        Err(PdfOcrError::NoDocument)
    ));
}

#[tokio::test]
async fn dropping_the_session_deletes_temp_files() {
    let (mut session, _, _) = session();
    session.upload(&upload("a.pdf", &["a"])).await.unwrap();
    let path = session.document().unwrap().path().to_path_buf();
    drop(session);
    assert!(!path.exists());
}

#[tokio::test]
async fn keep_temp_files_survives_cleanup() {
    let config = PdfOcrConfig::builder().keep_temp_files(true).build().unwrap();
    let (mut session, _, _) = session_with(config);
    session.upload(&upload("a.pdf", &["a"])).await.unwrap();
    let path = session.document().unwrap().path().to_path_buf();
    assert!(!session.document().unwrap().is_scoped());

    session.cleanup().unwrap();
    assert!(path.exists());
    std::fs::remove_file(path).unwrap();
}

fn temp_copies(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with("pdfocr-"))
        .count()
}

#[tokio::test]
async fn rejected_encrypted_upload_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = PdfOcrConfig::builder().temp_dir(dir.path()).build().unwrap();
    let (mut session, _, _) = session_with(config);

    let err = session
        .upload(&Upload::new("locked.pdf", encrypted_pdf()))
        .await
        .unwrap_err();
    assert!(err.is_encrypted(), "got {err:?}");
    assert_eq!(temp_copies(dir.path()), 0);

    session.upload(&upload("a.pdf", &["a"])).await.unwrap();
    assert_eq!(temp_copies(dir.path()), 1);
    assert!(session.document().unwrap().path().starts_with(dir.path()));

    session.cleanup().unwrap();
    assert_eq!(temp_copies(dir.path()), 0);
}

// ── Download and inspect ─────────────────────────────────────────────────────

#[tokio::test]
async fn download_writes_page_png() {
    let (mut session, _, _) = session();
    let view = session
        .run(&upload("two.pdf", &["a", "b"]), 2)
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let saved = view.download().save_to(dir.path()).unwrap();
    assert_eq!(saved, dir.path().join("page_2.png"));
    assert_eq!(std::fs::read(saved).unwrap(), *view.image_png);
}

#[test]
fn inspect_reports_encryption_instead_of_failing() {
    let info = inspect(&Upload::new("locked.pdf", encrypted_pdf())).unwrap();
    assert!(info.is_encrypted);
    assert_eq!(info.name, "locked.pdf");

    let info = inspect(&upload("plain.pdf", &["x", "y"])).unwrap();
    assert!(!info.is_encrypted);
    assert_eq!(info.page_count, 2);
    assert_eq!(info.pdf_version, "1.5");
}
