//! Conversion entry points: Markdown files → PDF files.
//!
//! [`MarkdownConverter`] owns everything derived from the configuration
//! (stylesheet, highlighter, PDF engine) and runs the per-document pipeline:
//!
//! ```text
//! read ─▶ [TOC] ─▶ shield fences ─▶ render ─▶ postprocess ─▶ wrap
//!      ─▶ debug HTML ─▶ embed images ─▶ print ─▶ atomic write
//! ```
//!
//! The free functions at the bottom are one-shot conveniences that build a
//! converter per call.

use crate::config::ConversionConfig;
use crate::error::Md2PdfError;
use crate::output::{
    BatchReport, ConversionOutput, ConversionStats, DocumentStats, FileOutcome, RenderedDocument,
};
use crate::pipeline::highlight::{CodeHighlighter, SyntectHighlighter};
use crate::pipeline::render::{ChromePdfRenderer, PdfRenderer};
use crate::pipeline::{embed, input, markdown, placeholder, postprocess, render, toc};
use crate::stylesheet::{build_stylesheet, wrap_document};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Converts Markdown documents to PDF with one fixed configuration.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct MarkdownConverter {
    config: ConversionConfig,
    stylesheet: String,
    highlighter: Arc<dyn CodeHighlighter>,
    renderer: Arc<dyn PdfRenderer>,
}

impl std::fmt::Debug for MarkdownConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkdownConverter")
            .field("config", &self.config)
            .field("stylesheet_bytes", &self.stylesheet.len())
            .finish()
    }
}

impl MarkdownConverter {
    /// Build a converter. Loads the highlight theme unless a highlighter was
    /// injected; the browser is not started until the first PDF is printed.
    pub fn new(config: ConversionConfig) -> Result<Self, Md2PdfError> {
        let highlighter: Arc<dyn CodeHighlighter> = match &config.highlighter {
            Some(h) => Arc::clone(h),
            None => Arc::new(SyntectHighlighter::new(&config.highlight_theme)?),
        };
        let renderer: Arc<dyn PdfRenderer> = match &config.renderer {
            Some(r) => Arc::clone(r),
            None => Arc::new(ChromePdfRenderer::new(
                config.chrome_path.clone(),
                Duration::from_secs(config.render_timeout_secs),
            )),
        };
        let stylesheet = build_stylesheet(config.font_size, config.page_setup());
        debug!("Converter ready: {:?}", config);

        Ok(Self {
            config,
            stylesheet,
            highlighter,
            renderer,
        })
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Run the text stages on one Markdown string and return the complete
    /// HTML document (images not yet embedded).
    pub fn markdown_to_html(&self, markdown_text: &str) -> RenderedDocument {
        // ── Step 1: Expand [TOC] ─────────────────────────────────────────────
        let (text, toc_entries) = if self.config.toc {
            toc::expand_toc(markdown_text, self.config.toc_max_level)
        } else {
            (markdown_text.to_string(), Vec::new())
        };

        // ── Step 2: Shield nested fences ─────────────────────────────────────
        let protected = placeholder::protect_nested_fences(&text);

        // ── Step 3: Render Markdown ──────────────────────────────────────────
        let fragment = markdown::render_markdown(&protected.text, self.highlighter.as_ref());

        // ── Step 4: Restore placeholders and rewrite HTML ────────────────────
        let body = postprocess::postprocess_html(&fragment);

        // ── Step 5: Wrap into a styled document ──────────────────────────────
        let html = wrap_document(
            &body,
            &self.stylesheet,
            &self.config.document_title,
            &self.config.document_lang,
        );

        let stats = DocumentStats {
            fence_pairs: protected.pairs.len(),
            substituted_lines: protected.substituted_lines,
            toc_entries: toc_entries.len(),
            html_bytes: html.len(),
        };
        debug!("Rendered HTML: {:?}", stats);
        RenderedDocument { html, stats }
    }

    /// Convert one Markdown file. Output defaults to `<dir>/<stem>.pdf`.
    pub async fn convert_file(
        &self,
        input_path: impl AsRef<Path>,
        output_path: Option<&Path>,
    ) -> Result<ConversionOutput, Md2PdfError> {
        let start = Instant::now();
        let path = input::resolve_input(input_path.as_ref())?;
        info!("Converting: {}", path.display());

        let output_path = output_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| input::default_output_path(&path));
        let text = input::read_markdown(&path).await?;

        self.produce(vec![path], &text, output_path, start).await
    }

    /// Merge several Markdown files into one PDF, in the given order.
    ///
    /// Aborts on the first input that fails validation or cannot be read.
    /// Output defaults to `<dir of first>/<stem of first>_merged.pdf`.
    pub async fn merge_files<P: AsRef<Path>>(
        &self,
        inputs: &[P],
        output_path: Option<&Path>,
    ) -> Result<ConversionOutput, Md2PdfError> {
        let start = Instant::now();
        if inputs.is_empty() {
            return Err(Md2PdfError::NoInputs);
        }

        let mut paths = Vec::with_capacity(inputs.len());
        let mut documents = Vec::with_capacity(inputs.len());
        for p in inputs {
            let path = input::resolve_input(p.as_ref())?;
            documents.push(input::read_markdown(&path).await?);
            paths.push(path);
        }
        info!("Merging {} files", paths.len());

        let output_path = match output_path {
            Some(p) => p.to_path_buf(),
            None => input::default_merged_output_path(&paths[0]),
        };
        let merged = input::combine_documents(&documents, self.config.page_break);

        self.produce(paths, &merged, output_path, start).await
    }

    /// Convert each input to its own PDF, one after another.
    ///
    /// A failing file is recorded in the report and the batch moves on.
    pub async fn convert_batch<P: AsRef<Path>>(&self, inputs: &[P]) -> BatchReport {
        let start = Instant::now();
        let total = inputs.len();
        let cb = self.config.progress_callback.as_ref();

        if let Some(cb) = cb {
            cb.on_batch_start(total);
        }

        let mut outcomes = Vec::with_capacity(total);
        for (i, p) in inputs.iter().enumerate() {
            let input_path = p.as_ref();
            let index = i + 1;
            if let Some(cb) = cb {
                cb.on_file_start(index, total, input_path);
            }

            match self.convert_file(input_path, None).await {
                Ok(output) => {
                    if let Some(cb) = cb {
                        cb.on_file_complete(index, total, input_path, &output.output_path);
                    }
                    outcomes.push(FileOutcome::Converted {
                        input: input_path.to_path_buf(),
                        output,
                    });
                }
                Err(e) => {
                    warn!("Failed to convert {}: {}", input_path.display(), e);
                    let error = e.to_string();
                    if let Some(cb) = cb {
                        cb.on_file_error(index, total, input_path, &error);
                    }
                    outcomes.push(FileOutcome::Failed {
                        input: input_path.to_path_buf(),
                        error,
                    });
                }
            }
        }

        let report = BatchReport {
            outcomes,
            total_duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            "Batch complete: {}/{} converted in {}ms",
            report.success_count(),
            total,
            report.total_duration_ms
        );
        if let Some(cb) = cb {
            cb.on_batch_complete(total, report.success_count());
        }
        report
    }

    /// Shared tail of the pipeline: HTML → (debug file) → images → PDF → disk.
    async fn produce(
        &self,
        inputs: Vec<PathBuf>,
        markdown_text: &str,
        output_path: PathBuf,
        start: Instant,
    ) -> Result<ConversionOutput, Md2PdfError> {
        let doc = self.markdown_to_html(markdown_text);

        // ── Debug HTML (before images are inlined) ───────────────────────────
        let debug_html_path = if self.config.debug_html {
            let path = input::debug_html_path(&output_path);
            write_atomic(&path, doc.html.as_bytes()).await?;
            info!("Debug HTML written: {}", path.display());
            Some(path)
        } else {
            None
        };

        // ── Inline local images ──────────────────────────────────────────────
        let (html, embedded_images, warnings) = if self.config.embed_images {
            let base_dir = inputs
                .first()
                .and_then(|p| p.parent())
                .map(Path::to_path_buf)
                .unwrap_or_default();
            let embedded = embed::embed_local_images(&doc.html, &base_dir).await;
            (embedded.html, embedded.embedded, embedded.errors)
        } else {
            (doc.html, 0, Vec::new())
        };

        // ── Print ────────────────────────────────────────────────────────────
        let render_start = Instant::now();
        let pdf = render::render_pdf(&self.renderer, html, self.config.page_setup()).await?;
        let render_duration_ms = render_start.elapsed().as_millis() as u64;

        // ── Write ────────────────────────────────────────────────────────────
        write_atomic(&output_path, &pdf).await?;

        let stats = ConversionStats {
            fence_pairs: doc.stats.fence_pairs,
            substituted_lines: doc.stats.substituted_lines,
            toc_entries: doc.stats.toc_entries,
            embedded_images,
            failed_images: warnings.len(),
            html_bytes: doc.stats.html_bytes,
            pdf_bytes: pdf.len(),
            total_duration_ms: start.elapsed().as_millis() as u64,
            render_duration_ms,
        };
        info!(
            "PDF written: {} ({} bytes, {}ms)",
            output_path.display(),
            stats.pdf_bytes,
            stats.total_duration_ms
        );

        Ok(ConversionOutput {
            inputs,
            output_path,
            debug_html_path,
            stats,
            warnings,
        })
    }
}

/// Convert one Markdown file to PDF.
///
/// # Example
/// ```rust,no_run
/// use edgequake_md2pdf::{convert_to_pdf, ConversionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let output = convert_to_pdf("README.md", None, &ConversionConfig::default()).await?;
/// println!("wrote {}", output.output_path.display());
/// # Ok(())
/// # }
/// ```
pub async fn convert_to_pdf(
    input_path: impl AsRef<Path>,
    output_path: Option<&Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Md2PdfError> {
    MarkdownConverter::new(config.clone())?
        .convert_file(input_path, output_path)
        .await
}

/// Synchronous wrapper around [`convert_to_pdf`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_path: impl AsRef<Path>,
    output_path: Option<&Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Md2PdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Md2PdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_to_pdf(input_path, output_path, config))
}

/// Render Markdown text to a complete HTML document without printing it.
pub fn render_html(
    markdown_text: &str,
    config: &ConversionConfig,
) -> Result<RenderedDocument, Md2PdfError> {
    Ok(MarkdownConverter::new(config.clone())?.markdown_to_html(markdown_text))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Write via a sibling temp file and rename, so readers never see a
/// partial file.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Md2PdfError> {
    let write_err = |e| Md2PdfError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp_path = PathBuf::from(tmp);

    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::highlight::PlainHighlighter;

    fn converter() -> MarkdownConverter {
        let config = ConversionConfig::builder()
            .highlighter(Arc::new(PlainHighlighter))
            .build()
            .unwrap();
        MarkdownConverter::new(config).unwrap()
    }

    #[test]
    fn nested_fence_document_renders_one_pre() {
        let md = "````\nouter text\n```\ninner fenced block\n```\nmore outer text\n````";
        let doc = converter().markdown_to_html(md);
        assert_eq!(doc.html.matches("<pre>").count(), 1, "{}", doc.html);
        assert!(doc
            .html
            .contains("outer text\n```\ninner fenced block\n```\nmore outer text"));
        assert!(!doc.html.contains("NESTED"));
        assert_eq!(doc.stats.substituted_lines, 2);
    }

    #[test]
    fn toc_links_match_heading_ids() {
        let doc = converter().markdown_to_html("[TOC]\n\n# Title\n\n## A\n\n## B\n");
        assert!(doc.html.contains(r##"<a href="#a">A</a>"##), "{}", doc.html);
        assert!(doc.html.contains(r#"<h2 id="a">A</h2>"#));
        assert!(doc.html.contains(r#"<h2 id="b">B</h2>"#));
        assert!(!doc.html.contains(r##"href="#title""##));
        assert_eq!(doc.stats.toc_entries, 2);
    }

    #[test]
    fn toc_links_follow_setext_and_quoted_headings() {
        let doc = converter().markdown_to_html("[TOC]\n\nIntro\n=====\n\n## Intro\n");
        assert!(doc.html.contains(r##"<a href="#intro-1">Intro</a>"##), "{}", doc.html);
        assert!(doc.html.contains(r#"<h2 id="intro-1">Intro</h2>"#), "{}", doc.html);

        let doc = converter().markdown_to_html("[TOC]\n\n> ## Usage\n\n## Usage\n");
        assert!(doc.html.contains(r##"<a href="#usage-1">Usage</a>"##), "{}", doc.html);
        assert!(doc.html.contains(r#"<h2 id="usage-1">Usage</h2>"#), "{}", doc.html);
    }

    #[test]
    fn toc_ignores_tilde_fenced_headings() {
        let doc = converter().markdown_to_html("[TOC]\n\n~~~md\n## Fake\n~~~\n\n## Real\n");
        assert!(!doc.html.contains(r##"href="#fake""##), "{}", doc.html);
        assert!(doc.html.contains(r##"<a href="#real">Real</a>"##), "{}", doc.html);
        assert_eq!(doc.stats.toc_entries, 1);
    }

    #[test]
    fn toc_marker_in_code_sample_is_kept() {
        let doc = converter().markdown_to_html("## A\n\n```md\n[TOC]\n```\n");
        assert!(doc.html.contains("[TOC]\n</code></pre>"), "{}", doc.html);
        assert!(!doc.html.contains(r##"href="#a""##), "{}", doc.html);
    }

    #[test]
    fn toc_disabled_leaves_marker() {
        let config = ConversionConfig::builder()
            .highlighter(Arc::new(PlainHighlighter))
            .toc(false)
            .build()
            .unwrap();
        let doc = MarkdownConverter::new(config)
            .unwrap()
            .markdown_to_html("[TOC]\n\n## A");
        assert!(doc.html.contains("[TOC]"));
    }

    #[test]
    fn document_is_wrapped_with_stylesheet() {
        let doc = converter().markdown_to_html("hello");
        assert!(doc.html.starts_with("<!DOCTYPE html>"));
        assert!(doc.html.contains("<style>"));
        assert!(doc.html.contains("<p>hello</p>"));
        assert_eq!(doc.stats.html_bytes, doc.html.len());
    }

    #[test]
    fn unknown_theme_fails_construction() {
        let config = ConversionConfig::builder()
            .highlight_theme("nope")
            .build()
            .unwrap();
        assert!(matches!(
            MarkdownConverter::new(config).unwrap_err(),
            Md2PdfError::InvalidConfig(_)
        ));
    }

    #[tokio::test]
    async fn atomic_write_creates_parents_and_leaves_no_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested/out.pdf");
        write_atomic(&target, b"%PDF").await.unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"%PDF");
        assert!(!dir.path().join("nested/out.pdf.tmp").exists());
    }

    #[tokio::test]
    async fn merge_with_no_inputs_is_an_error() {
        let empty: [&str; 0] = [];
        let err = converter().merge_files(&empty, None).await.unwrap_err();
        assert!(matches!(err, Md2PdfError::NoInputs));
    }
}
