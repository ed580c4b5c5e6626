//! PDF printing: hand the assembled HTML to a headless browser.
//!
//! ## Why spawn_blocking?
//!
//! `headless_chrome` drives the browser over a synchronous DevTools
//! connection and blocks the calling thread while Chrome loads and prints.
//! `tokio::task::spawn_blocking` moves that work onto the blocking pool so
//! the Tokio worker threads keep serving file I/O.
//!
//! ## Why a temp file instead of a data URL?
//!
//! Large documents with inlined images exceed what Chrome accepts in a URL,
//! and `file://` navigation gives a reliable "navigated" signal once the
//! whole page (fonts, data-URI images) has loaded.

use crate::config::PageSetup;
use crate::error::Md2PdfError;
use headless_chrome::{types::PrintToPdfOptions, Browser, LaunchOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Turns a complete HTML document into PDF bytes.
///
/// Implementations are called from the blocking pool and must not assume a
/// Tokio runtime on the current thread.
pub trait PdfRenderer: Send + Sync {
    fn render_pdf(&self, html: &str, page: &PageSetup) -> Result<Vec<u8>, Md2PdfError>;
}

/// Headless Chrome/Chromium engine. A fresh browser process is launched for
/// every call and torn down when the call returns, on success or failure.
#[derive(Debug, Clone)]
pub struct ChromePdfRenderer {
    pub chrome_path: Option<PathBuf>,
    pub timeout: Duration,
}

impl Default for ChromePdfRenderer {
    fn default() -> Self {
        Self {
            chrome_path: None,
            timeout: Duration::from_secs(60),
        }
    }
}

impl ChromePdfRenderer {
    pub fn new(chrome_path: Option<PathBuf>, timeout: Duration) -> Self {
        Self {
            chrome_path,
            timeout,
        }
    }

    fn launch_options(&self) -> Result<LaunchOptions<'static>, Md2PdfError> {
        LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .path(self.chrome_path.clone())
            .idle_browser_timeout(self.timeout)
            .build()
            .map_err(|e| Md2PdfError::BrowserLaunchFailed(e.to_string()))
    }

    fn launch(&self) -> Result<Browser, Md2PdfError> {
        Browser::new(self.launch_options()?)
            .map_err(|e| Md2PdfError::BrowserLaunchFailed(e.to_string()))
    }
}

/// Chrome print options for a page setup.
pub fn print_options(page: &PageSetup) -> PrintToPdfOptions {
    let (width, height) = page.paper.dimensions_in();
    let margin = page.margin_in();
    PrintToPdfOptions {
        landscape: Some(false),
        display_header_footer: Some(false),
        print_background: Some(true),
        scale: Some(1.0),
        paper_width: Some(width),
        paper_height: Some(height),
        margin_top: Some(margin),
        margin_bottom: Some(margin),
        margin_left: Some(margin),
        margin_right: Some(margin),
        prefer_css_page_size: Some(false),
        ..Default::default()
    }
}

fn render_failed(stage: &str, e: impl std::fmt::Display) -> Md2PdfError {
    Md2PdfError::RenderFailed {
        detail: format!("{stage}: {e}"),
    }
}

impl PdfRenderer for ChromePdfRenderer {
    fn render_pdf(&self, html: &str, page: &PageSetup) -> Result<Vec<u8>, Md2PdfError> {
        let mut page_file = tempfile::Builder::new()
            .prefix("md2pdf-")
            .suffix(".html")
            .tempfile()
            .map_err(|e| render_failed("temp HTML file", e))?;
        page_file
            .write_all(html.as_bytes())
            .and_then(|_| page_file.flush())
            .map_err(|e| render_failed("temp HTML file", e))?;

        let browser = self.launch()?;
        let tab = browser.new_tab().map_err(|e| render_failed("new tab", e))?;
        // Navigation and printing wait on the tab, not the browser.
        tab.set_default_timeout(self.timeout);

        let url = format!("file://{}", page_file.path().display());
        debug!("Navigating to {}", url);
        tab.navigate_to(&url)
            .map_err(|e| render_failed("navigate", e))?
            .wait_until_navigated()
            .map_err(|e| render_failed("wait for navigation", e))?;

        let bytes = tab
            .print_to_pdf(Some(print_options(page)))
            .map_err(|e| render_failed("print", e))?;
        info!("Printed PDF: {} bytes", bytes.len());

        // Browser and temp file drop here (or on any early return above).
        Ok(bytes)
    }
}

/// Run a renderer on the blocking pool.
pub async fn render_pdf(
    renderer: &Arc<dyn PdfRenderer>,
    html: String,
    page: PageSetup,
) -> Result<Vec<u8>, Md2PdfError> {
    let renderer = Arc::clone(renderer);
    tokio::task::spawn_blocking(move || renderer.render_pdf(&html, &page))
        .await
        .map_err(|e| Md2PdfError::Internal(format!("Render task panicked: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PaperSize;

    struct EchoRenderer;

    impl PdfRenderer for EchoRenderer {
        fn render_pdf(&self, html: &str, _page: &PageSetup) -> Result<Vec<u8>, Md2PdfError> {
            Ok(html.as_bytes().to_vec())
        }
    }

    #[test]
    fn print_options_follow_page_setup() {
        let opts = print_options(&PageSetup {
            paper: PaperSize::Letter,
            margin_cm: 2.54,
        });
        assert_eq!(opts.paper_width, Some(8.5));
        assert_eq!(opts.paper_height, Some(11.0));
        assert_eq!(opts.print_background, Some(true));
        let m = opts.margin_left.unwrap();
        assert!((m - 1.0).abs() < 1e-9);
    }

    #[test]
    fn launch_options_carry_timeout_and_path() {
        let renderer = ChromePdfRenderer::new(
            Some(PathBuf::from("/opt/chrome/chrome")),
            Duration::from_secs(7),
        );
        let opts = renderer.launch_options().unwrap();
        assert_eq!(opts.idle_browser_timeout, Duration::from_secs(7));
        assert_eq!(opts.path, Some(PathBuf::from("/opt/chrome/chrome")));
        assert!(opts.headless);
        assert!(!opts.sandbox);
    }

    #[tokio::test]
    async fn async_wrapper_runs_renderer() {
        let renderer: Arc<dyn PdfRenderer> = Arc::new(EchoRenderer);
        let bytes = render_pdf(&renderer, "<p>x</p>".into(), PageSetup::default())
            .await
            .unwrap();
        assert_eq!(bytes, b"<p>x</p>");
    }
}
