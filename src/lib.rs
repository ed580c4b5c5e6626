//! # edgequake-md2pdf
//!
//! Convert Markdown documents to print-ready PDF through headless Chrome.
//!
//! ## Why this crate?
//!
//! Markdown renderers close a fenced code block at the first fence-looking
//! line, so documentation that *shows* Markdown (a README snippet inside a
//! tutorial, a fenced example inside a fenced example) comes out mangled.
//! This crate pairs fences with an explicit stack first, shields the inner
//! ones behind a placeholder while the renderer runs, and restores them in
//! the HTML, so nested blocks print exactly as written.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Markdown
//!  │
//!  ├─ 1. Input    validate paths, expand globs, merge files
//!  ├─ 2. TOC      expand [TOC] markers into linked heading lists
//!  ├─ 3. Shield   pair fences, replace interior ``` with a placeholder
//!  ├─ 4. Render   pulldown-cmark + syntect highlighting
//!  ├─ 5. Polish   restore placeholders, strikethrough, task lists
//!  ├─ 6. Embed    inline local images as data URIs
//!  └─ 7. Print    headless Chrome (spawn_blocking) → atomic PDF write
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_md2pdf::{ConversionConfig, MarkdownConverter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let converter = MarkdownConverter::new(ConversionConfig::default())?;
//!     let output = converter.convert_file("guide.md", None).await?;
//!     eprintln!("{} ({} bytes)", output.output_path.display(), output.stats.pdf_bytes);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `md2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! edgequake-md2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stylesheet;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, FontSize, PageSetup, PaperSize};
pub use convert::{convert_sync, convert_to_pdf, render_html, MarkdownConverter};
pub use error::{AssetError, Md2PdfError};
pub use output::{
    BatchReport, ConversionOutput, ConversionStats, DocumentStats, FileOutcome, RenderedDocument,
};
pub use pipeline::highlight::{CodeHighlighter, PlainHighlighter, SyntectHighlighter};
pub use pipeline::placeholder::{protect_nested_fences, restore_placeholders, PLACEHOLDER};
pub use pipeline::render::{ChromePdfRenderer, PdfRenderer};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
