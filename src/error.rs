//! Error types for the edgequake-md2pdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Md2PdfError`]: **fatal** for one document, meaning the conversion cannot
//!   proceed (missing file, wrong extension, browser failed to print).
//!   Returned as `Err(Md2PdfError)` from the `convert_*` / `merge_*` entry
//!   points. In batch mode it is caught per file and recorded in the
//!   [`crate::output::BatchReport`].
//!
//! * [`AssetError`]: **non-fatal**, a referenced local image could not be
//!   read. The reference is left in place and the warning is stored
//!   in [`crate::output::ConversionOutput::warnings`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-md2pdf library.
#[derive(Debug, Error)]
pub enum Md2PdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input path does not resolve to a regular file.
    #[error("Input file not found: '{path}'\nCheck the path exists and is a regular file.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but is not a Markdown file.
    #[error("Input file must be a Markdown file (.md or .markdown): '{path}'")]
    InvalidExtension { path: PathBuf },

    /// Glob expansion produced no Markdown files.
    #[error("No Markdown files matched: {}", patterns.join(", "))]
    NoMatches { patterns: Vec<String> },

    /// A merge was requested with an empty input list.
    #[error("No input files were given")]
    NoInputs,

    /// The file could not be read as UTF-8 text.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Rendering errors ──────────────────────────────────────────────────
    /// Could not start the headless browser.
    #[error(
        "Failed to launch headless browser: {0}\n\n\
A Chrome or Chromium installation is required to print PDFs.\n\
  • Install Chrome/Chromium and make sure it is on PATH.\n\
  • Or pass --chrome /path/to/chrome (env MD2PDF_CHROME).\n"
    )]
    BrowserLaunchFailed(String),

    /// The browser failed to load the page or print it.
    #[error("PDF rendering failed: {detail}")]
    RenderFailed { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file (PDF or debug HTML).
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Some files in a batch converted but at least one failed.
    ///
    /// Returned by [`crate::output::BatchReport::into_result`] when the
    /// caller wants to treat any file failure as an error.
    #[error("{failed}/{total} files failed to convert")]
    BatchFailure { failed: usize, total: usize },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single referenced asset.
///
/// The document still converts; the unresolved reference is kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum AssetError {
    /// A local image could not be read from disk.
    #[error("Image '{path}' could not be read: {detail}")]
    ImageReadFailed { path: PathBuf, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_failure_display() {
        let e = Md2PdfError::BatchFailure {
            failed: 1,
            total: 4,
        };
        assert!(e.to_string().contains("1/4"), "got: {e}");
    }

    #[test]
    fn no_matches_lists_patterns() {
        let e = Md2PdfError::NoMatches {
            patterns: vec!["docs/*.md".into(), "README.md".into()],
        };
        let msg = e.to_string();
        assert!(msg.contains("docs/*.md, README.md"), "got: {msg}");
    }

    #[test]
    fn invalid_extension_mentions_path() {
        let e = Md2PdfError::InvalidExtension {
            path: PathBuf::from("notes.txt"),
        };
        assert!(e.to_string().contains("notes.txt"));
        assert!(e.to_string().contains(".markdown"));
    }

    #[test]
    fn asset_error_serialises() {
        let e = AssetError::ImageReadFailed {
            path: PathBuf::from("img/missing.png"),
            detail: "No such file or directory".into(),
        };
        let json = serde_json::to_string(&e).expect("serialise");
        assert!(json.contains("ImageReadFailed"));
        assert!(e.to_string().contains("img/missing.png"));
    }
}
