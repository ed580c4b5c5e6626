//! Configuration types for Markdown-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. A [`crate::MarkdownConverter`] takes
//! the config once and derives its immutable state from it (stylesheet,
//! highlighter, rendering engine), so nothing here is process-global.

use crate::error::Md2PdfError;
use crate::pipeline::highlight::CodeHighlighter;
use crate::pipeline::render::PdfRenderer;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for a Markdown-to-PDF conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_md2pdf::{ConversionConfig, FontSize, PaperSize};
///
/// let config = ConversionConfig::builder()
///     .font_size(FontSize::Large)
///     .paper(PaperSize::Letter)
///     .page_break(false)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Font-size preset used by the stylesheet. Default: [`FontSize::Medium`].
    pub font_size: FontSize,

    /// Insert a page break between documents in merge mode. Default: true.
    ///
    /// When false, merged documents are separated by a blank line only and
    /// flow onto the same page.
    pub page_break: bool,

    /// Expand `[TOC]` markers into a linked table of contents. Default: true.
    pub toc: bool,

    /// Deepest heading level listed in the table of contents. Range: 2–6. Default: 3.
    ///
    /// Level-1 headings are document titles and never listed.
    pub toc_max_level: u8,

    /// Inline local images as base64 data URIs. Default: true.
    ///
    /// The browser loads the page from a temp file, so relative image paths
    /// would otherwise resolve against the temp directory and break.
    pub embed_images: bool,

    /// Write the assembled HTML next to the PDF as `<name>.debug.html`. Default: false.
    pub debug_html: bool,

    /// Paper size of the printed PDF. Default: [`PaperSize::A4`].
    pub paper: PaperSize,

    /// Uniform page margin in centimetres. Range: 0–10. Default: 2.0.
    pub margin_cm: f64,

    /// `syntect` theme used for fenced code blocks. Default: "InspiredGitHub".
    pub highlight_theme: String,

    /// Explicit Chrome/Chromium binary. If None, the browser is auto-detected.
    pub chrome_path: Option<PathBuf>,

    /// Idle timeout for the headless browser in seconds. Default: 60.
    pub render_timeout_secs: u64,

    /// `<title>` of the generated HTML document. Default: "Markdown to PDF".
    pub document_title: String,

    /// `lang` attribute of the generated HTML document. Default: "en".
    pub document_lang: String,

    /// Pre-constructed PDF engine. Takes precedence over the built-in Chrome engine.
    pub renderer: Option<Arc<dyn PdfRenderer>>,

    /// Pre-constructed code highlighter. Takes precedence over `highlight_theme`.
    pub highlighter: Option<Arc<dyn CodeHighlighter>>,

    /// Receives per-file events during batch conversion.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            font_size: FontSize::default(),
            page_break: true,
            toc: true,
            toc_max_level: 3,
            embed_images: true,
            debug_html: false,
            paper: PaperSize::default(),
            margin_cm: 2.0,
            highlight_theme: "InspiredGitHub".to_string(),
            chrome_path: None,
            render_timeout_secs: 60,
            document_title: "Markdown to PDF".to_string(),
            document_lang: "en".to_string(),
            renderer: None,
            highlighter: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("font_size", &self.font_size)
            .field("page_break", &self.page_break)
            .field("toc", &self.toc)
            .field("toc_max_level", &self.toc_max_level)
            .field("embed_images", &self.embed_images)
            .field("debug_html", &self.debug_html)
            .field("paper", &self.paper)
            .field("margin_cm", &self.margin_cm)
            .field("highlight_theme", &self.highlight_theme)
            .field("chrome_path", &self.chrome_path)
            .field("render_timeout_secs", &self.render_timeout_secs)
            .field("renderer", &self.renderer.as_ref().map(|_| "<dyn PdfRenderer>"))
            .field(
                "highlighter",
                &self.highlighter.as_ref().map(|_| "<dyn CodeHighlighter>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Page geometry handed to the PDF engine.
    pub fn page_setup(&self) -> PageSetup {
        PageSetup {
            paper: self.paper,
            margin_cm: self.margin_cm,
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn font_size(mut self, size: FontSize) -> Self {
        self.config.font_size = size;
        self
    }

    pub fn page_break(mut self, v: bool) -> Self {
        self.config.page_break = v;
        self
    }

    pub fn toc(mut self, v: bool) -> Self {
        self.config.toc = v;
        self
    }

    pub fn toc_max_level(mut self, level: u8) -> Self {
        self.config.toc_max_level = level.clamp(2, 6);
        self
    }

    pub fn embed_images(mut self, v: bool) -> Self {
        self.config.embed_images = v;
        self
    }

    pub fn debug_html(mut self, v: bool) -> Self {
        self.config.debug_html = v;
        self
    }

    pub fn paper(mut self, paper: PaperSize) -> Self {
        self.config.paper = paper;
        self
    }

    pub fn margin_cm(mut self, cm: f64) -> Self {
        self.config.margin_cm = cm;
        self
    }

    pub fn highlight_theme(mut self, theme: impl Into<String>) -> Self {
        self.config.highlight_theme = theme.into();
        self
    }

    pub fn chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chrome_path = Some(path.into());
        self
    }

    pub fn render_timeout_secs(mut self, secs: u64) -> Self {
        self.config.render_timeout_secs = secs.max(1);
        self
    }

    pub fn document_title(mut self, title: impl Into<String>) -> Self {
        self.config.document_title = title.into();
        self
    }

    pub fn document_lang(mut self, lang: impl Into<String>) -> Self {
        self.config.document_lang = lang.into();
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn PdfRenderer>) -> Self {
        self.config.renderer = Some(renderer);
        self
    }

    pub fn highlighter(mut self, highlighter: Arc<dyn CodeHighlighter>) -> Self {
        self.config.highlighter = Some(highlighter);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Md2PdfError> {
        let c = &self.config;
        if !c.margin_cm.is_finite() || c.margin_cm < 0.0 || c.margin_cm > 10.0 {
            return Err(Md2PdfError::InvalidConfig(format!(
                "Margin must be 0–10 cm, got {}",
                c.margin_cm
            )));
        }
        if c.highlight_theme.trim().is_empty() {
            return Err(Md2PdfError::InvalidConfig(
                "Highlight theme must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Font-size preset for body text, headings and code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

/// CSS font sizes for one [`FontSize`] preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontSizes {
    pub base: &'static str,
    pub h1: &'static str,
    pub h2: &'static str,
    pub h3: &'static str,
    pub h4: &'static str,
    pub code: &'static str,
}

impl FontSize {
    /// Look up the size table for this preset.
    pub fn sizes(self) -> FontSizes {
        match self {
            FontSize::Small => FontSizes {
                base: "10px",
                h1: "20px",
                h2: "16px",
                h3: "14px",
                h4: "12px",
                code: "9px",
            },
            FontSize::Medium => FontSizes {
                base: "12px",
                h1: "24px",
                h2: "20px",
                h3: "18px",
                h4: "16px",
                code: "11px",
            },
            FontSize::Large => FontSizes {
                base: "14px",
                h1: "28px",
                h2: "24px",
                h3: "22px",
                h4: "20px",
                code: "13px",
            },
        }
    }
}

/// Paper sizes supported by the PDF engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaperSize {
    #[default]
    A4,
    Letter,
    Legal,
}

impl PaperSize {
    /// (width, height) in inches, as expected by the Chrome print API.
    pub fn dimensions_in(self) -> (f64, f64) {
        match self {
            PaperSize::A4 => (8.27, 11.69),
            PaperSize::Letter => (8.5, 11.0),
            PaperSize::Legal => (8.5, 14.0),
        }
    }

    /// Name used in the CSS `@page { size: … }` rule.
    pub fn css_name(self) -> &'static str {
        match self {
            PaperSize::A4 => "A4",
            PaperSize::Letter => "letter",
            PaperSize::Legal => "legal",
        }
    }
}

/// Page geometry for one print job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSetup {
    pub paper: PaperSize,
    pub margin_cm: f64,
}

impl PageSetup {
    /// Margin converted to inches.
    pub fn margin_in(&self) -> f64 {
        self.margin_cm / 2.54
    }
}

impl Default for PageSetup {
    fn default() -> Self {
        ConversionConfig::default().page_setup()
    }
}
