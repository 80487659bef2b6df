//! CLI binary for edgequake-pdfocr.
//!
//! A thin shim over the library crate: flags map to `PdfOcrConfig`, the PDF
//! becomes an `Upload`, and a `Session` produces the page view that is printed
//! here. `--interactive` keeps the session open and reads page numbers from
//! stdin, so paging reuses the rendered pages and cached OCR text.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdfocr::{inspect, PageView, PdfOcrConfig, PdfOcrError, Session, Upload};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # OCR the first page
  pdfocr document.pdf

  # Page 3, and save the page image as ./out/page_3.png
  pdfocr --page 3 --save out/ document.pdf

  # Page through interactively (type a page number, s to save, q to quit)
  pdfocr -i document.pdf

  # JSON output (page image embedded as base64)
  pdfocr --json --page 2 document.pdf > page2.json

  # Page count / encryption check only
  pdfocr --inspect-only document.pdf

INTERACTIVE COMMANDS:
  <N>        show page N (clamped to the document)
  n / p      next / previous page
  s          save the current page image
  r          reload the file from disk
  q          quit

ENVIRONMENT VARIABLES:
  PDFOCR_PDFIUM_PATH   Directory holding libpdfium (or the library file itself)
  PDFOCR_TESSERACT     Tesseract executable (default: tesseract on PATH)
  PDFOCR_LANG          Tesseract language, e.g. eng or deu+eng
  TESSDATA_PREFIX      Tesseract language data directory
  RUST_LOG             Override the log filter
"#;

/// View PDF pages as images and read their OCR text.
#[derive(Parser, Debug)]
#[command(
    name = "pdfocr",
    version,
    about = "View PDF pages as images and read their OCR text",
    long_about = "Render a PDF with pdfium, select a page, and extract its text with tesseract. \
The page image can be saved as page_N.png. Encrypted PDFs are rejected.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file to open.
    input: PathBuf,

    /// Page to show (1-indexed).
    #[arg(short, long, env = "PDFOCR_PAGE", default_value_t = 1)]
    page: usize,

    /// Keep the document open and read page numbers from stdin.
    #[arg(short, long)]
    interactive: bool,

    /// Save the shown page image as page_N.png into this directory.
    #[arg(short, long, env = "PDFOCR_SAVE_DIR")]
    save: Option<PathBuf>,

    /// Directory containing libpdfium, or the library file itself.
    #[arg(long, env = "PDFOCR_PDFIUM_PATH")]
    pdfium_path: Option<PathBuf>,

    /// Tesseract executable.
    #[arg(long, env = "PDFOCR_TESSERACT", default_value = "tesseract")]
    tesseract: PathBuf,

    /// Tesseract language (engine default if unset).
    #[arg(long, env = "PDFOCR_LANG")]
    lang: Option<String>,

    /// Tesseract language data directory.
    #[arg(long, env = "TESSDATA_PREFIX")]
    tessdata: Option<PathBuf>,

    /// Rendering DPI (72–400).
    #[arg(long, env = "PDFOCR_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Longest rendered edge in pixels.
    #[arg(long, env = "PDFOCR_MAX_PIXELS", default_value_t = 4000)]
    max_pixels: u32,

    /// Directory for the temporary copy of the PDF.
    #[arg(long, env = "PDFOCR_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Leave the temporary copy of the PDF on disk.
    #[arg(long, env = "PDFOCR_KEEP_TEMP")]
    keep_temp: bool,

    /// Output the page view as JSON.
    #[arg(long)]
    json: bool,

    /// Print page count and encryption status only.
    #[arg(long)]
    inspect_only: bool,

    /// Disable the spinner.
    #[arg(long, env = "PDFOCR_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFOCR_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFOCR_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let upload = Upload::from_path(&cli.input)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let info = inspect(&upload).context("Failed to inspect PDF")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("Failed to serialize document info")?
            );
        } else {
            println!("File:         {}", info.name);
            println!("Pages:        {}", info.page_count);
            println!("PDF Version:  {}", info.pdf_version);
            println!("Encrypted:    {}", info.is_encrypted);
            println!("Size:         {} bytes", info.file_size);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config = build_config(&cli)?;
    let mut session = Session::new(config);

    let code = if cli.interactive {
        run_interactive(&mut session, upload, &cli, show_progress).await?
    } else {
        run_once(&mut session, &upload, &cli, show_progress).await?
    };

    if let Err(e) = session.cleanup() {
        eprintln!("{} {}", cyan("⚠"), dim(&e.to_string()));
    }
    Ok(code)
}

/// Map CLI args to `PdfOcrConfig`.
fn build_config(cli: &Cli) -> Result<PdfOcrConfig> {
    let mut builder = PdfOcrConfig::builder()
        .ocr_engine_path(&cli.tesseract)
        .dpi(cli.dpi)
        .max_rendered_pixels(cli.max_pixels)
        .keep_temp_files(cli.keep_temp);

    if let Some(ref path) = cli.pdfium_path {
        builder = builder.rasterizer_toolchain_path(path);
    }
    if let Some(ref lang) = cli.lang {
        builder = builder.ocr_language(lang);
    }
    if let Some(ref dir) = cli.tessdata {
        builder = builder.tessdata_dir(dir);
    }
    if let Some(ref dir) = cli.temp_dir {
        builder = builder.temp_dir(dir);
    }

    builder.build().context("Invalid configuration")
}

/// One file, one page.
async fn run_once(
    session: &mut Session,
    upload: &Upload,
    cli: &Cli,
    show_progress: bool,
) -> Result<ExitCode> {
    let bar = spinner(show_progress, format!("Rendering {}…", upload.name()));
    let result = session.run(upload, cli.page).await;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    match result {
        Ok(view) => {
            present(&view, cli)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            report_error(&e);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Read commands from stdin until `q` or EOF. Errors are shown and the
/// session stays open.
async fn run_interactive(
    session: &mut Session,
    mut upload: Upload,
    cli: &Cli,
    show_progress: bool,
) -> Result<ExitCode> {
    let bar = spinner(show_progress, format!("Rendering {}…", upload.name()));
    let uploaded = session.upload(&upload).await;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    if let Err(e) = uploaded {
        report_error(&e);
    }

    let mut current = if session.page_count().is_some() {
        show(session, cli.page, cli, show_progress).await
    } else {
        None
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt(session.page_count());
        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };
        let cmd = line.trim().to_lowercase();

        match cmd.as_str() {
            "" => {
                if let Some(ref view) = current {
                    present(view, cli)?;
                }
            }
            "q" | "quit" | "exit" => break,
            "s" | "save" => match current {
                Some(ref view) => {
                    let dir = cli.save.as_deref().unwrap_or(Path::new("."));
                    if let Err(e) = save(view, dir) {
                        eprintln!("{} {e:#}", red("✘"));
                    }
                }
                None => eprintln!("{} nothing to save yet", cyan("⚠")),
            },
            "r" | "reload" => {
                match Upload::from_path(&cli.input) {
                    Ok(fresh) => upload = fresh,
                    Err(e) => {
                        report_error(&e);
                        continue;
                    }
                }
                let bar = spinner(show_progress, format!("Rendering {}…", upload.name()));
                let uploaded = session.upload(&upload).await;
                if let Some(bar) = bar {
                    bar.finish_and_clear();
                }
                current = match uploaded {
                    Ok(_) => show(session, 1, cli, show_progress).await,
                    Err(e) => {
                        report_error(&e);
                        None
                    }
                };
            }
            "n" | "next" | "p" | "prev" => {
                let Some(selected) = session.selected_page() else {
                    eprintln!("{} no page selected", cyan("⚠"));
                    continue;
                };
                let target = if cmd.starts_with('n') {
                    selected + 1
                } else {
                    selected.saturating_sub(1)
                };
                current = show(session, target, cli, show_progress).await.or(current);
            }
            other => match other.parse::<usize>() {
                Ok(page) => {
                    current = show(session, page, cli, show_progress).await.or(current);
                }
                Err(_) => eprintln!("{} unknown command '{}'", cyan("⚠"), other),
            },
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Select `page` (clamped) and print it; errors are reported inline.
async fn show(
    session: &mut Session,
    page: usize,
    cli: &Cli,
    show_progress: bool,
) -> Option<PageView> {
    if session.page_count().is_none() {
        eprintln!("{} no document loaded; use r to reload", cyan("⚠"));
        return None;
    }
    let bar = spinner(show_progress, format!("Reading page {page}…"));
    let result = session.select_page_clamped(page).await;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    match result {
        Ok(view) => {
            if view.page_number != page {
                eprintln!(
                    "{} page {} is out of range, showing page {}",
                    cyan("⚠"),
                    page,
                    view.page_number
                );
            }
            if let Err(e) = present(&view, cli) {
                eprintln!("{} {e:#}", red("✗"));
            }
            Some(view)
        }
        Err(e) => {
            report_error(&e);
            None
        }
    }
}

/// Print a page view (and save it when `--save` is set).
fn present(view: &PageView, cli: &Cli) -> Result<()> {
    if cli.json {
        let json = serde_json::to_string_pretty(view).context("Failed to serialise page view")?;
        println!("{json}");
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(
            handle,
            "{}  {}",
            bold(&format!("{} of {}", view.caption, view.total_pages)),
            dim(&format!("{}x{} px", view.width, view.height)),
        )
        .context("Failed to write to stdout")?;
        if !cli.quiet {
            writeln!(
                handle,
                "{}  {}{}",
                view.download_label,
                dim(&view.filename),
                if view.text_from_cache {
                    dim("  (cached text)")
                } else {
                    String::new()
                }
            )
            .context("Failed to write to stdout")?;
        }
        handle
            .write_all(view.text_block().as_bytes())
            .context("Failed to write to stdout")?;
    }

    if let Some(ref dir) = cli.save {
        save(view, dir)?;
    }
    Ok(())
}

fn save(view: &PageView, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = view
        .download()
        .save_to(dir)
        .context("Failed to save page image")?;
    eprintln!("{} saved {}", green("✔"), bold(&path.display().to_string()));
    Ok(())
}

/// Inline error display: encryption is a user-facing condition, anything
/// else is unexpected.
fn report_error(e: &PdfOcrError) {
    if e.is_encrypted() {
        eprintln!("{} {}", red("✘"), e);
    } else {
        eprintln!("{} An unexpected error occurred: {}", red("✘"), e);
    }
}

fn prompt(page_count: Option<usize>) {
    match page_count {
        Some(total) => eprint!("{} ", cyan(&format!("page [1-{total}], s, r, q >"))),
        None => eprint!("{} ", cyan("r, q >")),
    }
    io::stderr().flush().ok();
}

fn spinner(enabled: bool, message: String) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
    bar.set_style(style);
    bar.set_prefix("pdfocr");
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(80));
    Some(bar)
}
