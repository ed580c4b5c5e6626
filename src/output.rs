//! Result types returned by the conversion entry points.

use crate::error::{AssetError, Md2PdfError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What the Markdown → HTML stage found in one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    /// Code-block pairs found by the fence pairing engine.
    pub fence_pairs: usize,
    /// Lines whose interior fences were replaced by the placeholder.
    pub substituted_lines: usize,
    /// Entries listed in the generated table of contents.
    pub toc_entries: usize,
    /// Size of the wrapped HTML document.
    pub html_bytes: usize,
}

/// A complete HTML document, stylesheet inlined, before image embedding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedDocument {
    pub html: String,
    pub stats: DocumentStats,
}

/// Aggregate statistics for one produced PDF.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub fence_pairs: usize,
    pub substituted_lines: usize,
    pub toc_entries: usize,
    pub embedded_images: usize,
    pub failed_images: usize,
    pub html_bytes: usize,
    pub pdf_bytes: usize,
    /// Wall time from first read to the PDF landing on disk.
    pub total_duration_ms: u64,
    /// Time spent in the PDF engine.
    pub render_duration_ms: u64,
}

/// One produced PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Source files, in merge order (one entry unless merged).
    pub inputs: Vec<PathBuf>,
    pub output_path: PathBuf,
    /// Set when debug HTML output was enabled.
    pub debug_html_path: Option<PathBuf>,
    pub stats: ConversionStats,
    /// Non-fatal asset problems; the PDF was still produced.
    pub warnings: Vec<AssetError>,
}

/// Outcome for one file in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Converted {
        input: PathBuf,
        output: ConversionOutput,
    },
    Failed {
        input: PathBuf,
        error: String,
    },
}

impl FileOutcome {
    pub fn input(&self) -> &PathBuf {
        match self {
            FileOutcome::Converted { input, .. } | FileOutcome::Failed { input, .. } => input,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FileOutcome::Converted { .. })
    }
}

/// Ordered per-file outcomes of a batch conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
    pub total_duration_ms: u64,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.total() - self.success_count()
    }

    /// `Err(BatchFailure)` when any file failed.
    pub fn into_result(self) -> Result<Self, Md2PdfError> {
        match self.failure_count() {
            0 => Ok(self),
            failed => Err(Md2PdfError::BatchFailure {
                failed,
                total: self.total(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converted(name: &str) -> FileOutcome {
        FileOutcome::Converted {
            input: PathBuf::from(name),
            output: ConversionOutput {
                inputs: vec![PathBuf::from(name)],
                output_path: PathBuf::from(name).with_extension("pdf"),
                debug_html_path: None,
                stats: ConversionStats::default(),
                warnings: vec![],
            },
        }
    }

    #[test]
    fn counts_and_result() {
        let report = BatchReport {
            outcomes: vec![
                converted("a.md"),
                FileOutcome::Failed {
                    input: PathBuf::from("b.md"),
                    error: "boom".into(),
                },
                converted("c.md"),
            ],
            total_duration_ms: 5,
        };
        assert_eq!(report.success_count(), 2);
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.outcomes[1].input(), &PathBuf::from("b.md"));
        let err = report.into_result().unwrap_err();
        assert!(matches!(
            err,
            Md2PdfError::BatchFailure {
                failed: 1,
                total: 3
            }
        ));
    }

    #[test]
    fn all_success_is_ok() {
        let report = BatchReport {
            outcomes: vec![converted("a.md")],
            total_duration_ms: 1,
        };
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn outcome_serialises_with_status_tag() {
        let json = serde_json::to_value(FileOutcome::Failed {
            input: PathBuf::from("x.md"),
            error: "nope".into(),
        })
        .unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "nope");
    }
}
