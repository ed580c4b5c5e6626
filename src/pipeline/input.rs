//! Input resolution: expand patterns, validate Markdown paths, read text.
//!
//! ## Why validate before reading?
//!
//! A merge aborts on the first bad input, and a batch reports each bad input
//! as its own failure. Checking existence, file type, permission and
//! extension up front gives each of those cases a precise error instead of a
//! generic I/O failure halfway through a render.

use crate::error::Md2PdfError;
use globset::GlobBuilder;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Accepted Markdown extensions (compared case-insensitively).
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Separator inserted between merged documents when page breaks are on.
pub const PAGE_BREAK_SEPARATOR: &str = "\n\n<div class=\"page-break\"></div>\n\n";

/// Check if the path has a Markdown extension.
pub fn is_markdown_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            MARKDOWN_EXTENSIONS
                .iter()
                .any(|m| e.eq_ignore_ascii_case(m))
        })
        .unwrap_or(false)
}

fn has_glob_meta(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

/// Split a pattern into the literal directory to walk and how deep the
/// glob part reaches (`None` when it contains `**`).
fn walk_plan(pattern: &str) -> (PathBuf, Option<usize>) {
    let mut base = PathBuf::new();
    let mut depth = 0usize;
    let mut recursive = false;
    for comp in Path::new(pattern).components() {
        let part = comp.as_os_str().to_string_lossy();
        if depth == 0 && !has_glob_meta(&part) {
            base.push(comp);
        } else {
            depth += 1;
            recursive |= part.contains("**");
        }
    }
    (base, (!recursive).then_some(depth))
}

fn glob_markdown(pattern: &str) -> Result<Vec<PathBuf>, globset::Error> {
    let matcher = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()?
        .compile_matcher();
    let (base, depth) = walk_plan(pattern);
    let root = if base.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        base.clone()
    };

    let mut walker = WalkDir::new(&root).min_depth(1).follow_links(true);
    if let Some(depth) = depth {
        walker = walker.max_depth(depth);
    }

    let mut found = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping unreadable entry for '{}': {}", pattern, e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let candidate = if base.as_os_str().is_empty() {
            path.strip_prefix(".").unwrap_or(path)
        } else {
            path
        };
        if matcher.is_match(candidate) && is_markdown_path(candidate) {
            found.push(candidate.to_path_buf());
        }
    }
    found.sort();
    Ok(found)
}

/// Expand CLI arguments into an ordered, de-duplicated list of paths.
///
/// Plain paths pass through unchanged so that a missing or mis-typed file
/// surfaces later as a precise per-file error. Glob patterns keep only
/// Markdown files, sorted by path. Patterns that fail to parse are logged
/// and skipped.
pub fn expand_patterns(patterns: &[String]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for pattern in patterns {
        if !has_glob_meta(pattern) {
            let path = PathBuf::from(pattern);
            if seen.insert(path.clone()) {
                out.push(path);
            }
            continue;
        }

        let matches = match glob_markdown(pattern) {
            Ok(paths) => paths,
            Err(e) => {
                warn!("Skipping invalid pattern '{}': {}", pattern, e);
                continue;
            }
        };
        debug!("Pattern '{}' matched {} Markdown file(s)", pattern, matches.len());
        for path in matches {
            if seen.insert(path.clone()) {
                out.push(path);
            }
        }
    }

    out
}

/// Validate that `path` is a readable Markdown file.
pub fn resolve_input(path: &Path) -> Result<PathBuf, Md2PdfError> {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Md2PdfError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(Md2PdfError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    };
    if !metadata.is_file() {
        return Err(Md2PdfError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    if !is_markdown_path(path) {
        return Err(Md2PdfError::InvalidExtension {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Md2PdfError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(Md2PdfError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            });
        }
    }

    debug!("Resolved Markdown input: {}", path.display());
    Ok(path.to_path_buf())
}

/// Read a Markdown file as UTF-8 text.
pub async fn read_markdown(path: &Path) -> Result<String, Md2PdfError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Md2PdfError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Join documents for merge mode: each is trimmed, then separated by a
/// page-break div (or a blank line when `page_break` is false).
pub fn combine_documents<S: AsRef<str>>(documents: &[S], page_break: bool) -> String {
    let separator = if page_break {
        PAGE_BREAK_SEPARATOR
    } else {
        "\n\n"
    };
    documents
        .iter()
        .map(|d| d.as_ref().trim())
        .collect::<Vec<_>>()
        .join(separator)
}

/// `<dir>/<stem>.pdf` for a single input.
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("pdf")
}

/// `<dir of first>/<stem of first>_merged.pdf` for a merge.
pub fn default_merged_output_path(first: &Path) -> PathBuf {
    let stem = first
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    first.with_file_name(format!("{stem}_merged.pdf"))
}

/// Debug HTML sibling of an output PDF: `report.pdf` → `report.debug.html`.
pub fn debug_html_path(output: &Path) -> PathBuf {
    output.with_extension("debug.html")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn markdown_extensions_case_insensitive() {
        assert!(is_markdown_path(Path::new("a.md")));
        assert!(is_markdown_path(Path::new("a.MD")));
        assert!(is_markdown_path(Path::new("dir/a.Markdown")));
        assert!(!is_markdown_path(Path::new("a.txt")));
        assert!(!is_markdown_path(Path::new("md")));
    }

    #[test]
    fn resolve_missing_file() {
        let err = resolve_input(Path::new("/definitely/not/here.md")).unwrap_err();
        assert!(matches!(err, Md2PdfError::FileNotFound { .. }));
    }

    #[test]
    fn resolve_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("notes.md");
        fs::create_dir(&sub).unwrap();
        assert!(matches!(
            resolve_input(&sub).unwrap_err(),
            Md2PdfError::FileNotFound { .. }
        ));
    }

    #[test]
    fn resolve_wrong_extension() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("notes.txt");
        fs::write(&p, "# hi").unwrap();
        assert!(matches!(
            resolve_input(&p).unwrap_err(),
            Md2PdfError::InvalidExtension { .. }
        ));
    }

    #[test]
    fn resolve_ok() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("notes.MD");
        fs::write(&p, "# hi").unwrap();
        assert_eq!(resolve_input(&p).unwrap(), p);
    }

    #[test]
    fn expand_globs_filters_and_dedupes() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.md", "a.md", "c.txt", "d.markdown"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        let pattern = format!("{}/*", dir.path().display());
        let literal = dir.path().join("a.md").display().to_string();

        let paths = expand_patterns(&[pattern, literal]);
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.md", "b.md", "d.markdown"]);
    }

    #[test]
    fn literal_paths_pass_through() {
        let paths = expand_patterns(&["missing.md".to_string(), "notes.txt".to_string()]);
        assert_eq!(
            paths,
            vec![PathBuf::from("missing.md"), PathBuf::from("notes.txt")]
        );
    }

    #[test]
    fn double_star_recurses() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("top.md"), "x").unwrap();
        fs::write(dir.path().join("a/b/deep.md"), "x").unwrap();

        let shallow = expand_patterns(&[format!("{}/*.md", dir.path().display())]);
        assert_eq!(shallow.len(), 1);
        let deep = expand_patterns(&[format!("{}/**/*.md", dir.path().display())]);
        assert!(deep.iter().any(|p| p.ends_with("a/b/deep.md")), "{deep:?}");
    }

    #[test]
    fn walk_plan_splits_literal_prefix() {
        assert_eq!(walk_plan("docs/*.md"), (PathBuf::from("docs"), Some(1)));
        assert_eq!(walk_plan("*.md"), (PathBuf::new(), Some(1)));
        assert_eq!(walk_plan("docs/**/*.md"), (PathBuf::from("docs"), None));
    }

    #[test]
    fn invalid_pattern_is_skipped() {
        assert!(expand_patterns(&["[".to_string()]).is_empty());
    }

    #[test]
    fn combine_with_and_without_page_breaks() {
        let docs = ["  # One\n\n", "\n# Two  "];
        assert_eq!(
            combine_documents(&docs, true),
            "# One\n\n<div class=\"page-break\"></div>\n\n# Two"
        );
        assert_eq!(combine_documents(&docs, false), "# One\n\n# Two");
    }

    #[test]
    fn output_names() {
        assert_eq!(
            default_output_path(Path::new("docs/guide.md")),
            PathBuf::from("docs/guide.pdf")
        );
        assert_eq!(
            default_merged_output_path(Path::new("docs/intro.markdown")),
            PathBuf::from("docs/intro_merged.pdf")
        );
        assert_eq!(
            debug_html_path(Path::new("out/report.pdf")),
            PathBuf::from("out/report.debug.html")
        );
    }

    #[tokio::test]
    async fn read_markdown_reports_missing() {
        let err = read_markdown(Path::new("/nope/missing.md")).await.unwrap_err();
        assert!(matches!(err, Md2PdfError::ReadFailed { .. }));
    }
}
