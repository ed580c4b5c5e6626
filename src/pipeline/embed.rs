//! Local image embedding: `src="img.png"` → `src="data:image/png;base64,…"`.
//!
//! The browser loads the page from a temp file, so relative references
//! would resolve against the temp directory. Inlining them as data URIs
//! makes the HTML self-contained before it is printed.

use crate::error::AssetError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

static RE_SRC: Lazy<Regex> = Lazy::new(|| Regex::new(r#"src="([^"]+)""#).unwrap());

/// Result of an embedding pass.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedHtml {
    pub html: String,
    /// Number of distinct sources inlined.
    pub embedded: usize,
    /// Sources that could not be read; their `src` is left unchanged.
    pub errors: Vec<AssetError>,
}

/// True when the source points somewhere other than the local filesystem
/// relative to the document (remote, inline or explicit file URL).
pub fn is_external_source(src: &str) -> bool {
    src.starts_with("http") || src.starts_with("data:") || src.starts_with("file:")
}

/// MIME type for an image path, by extension. Unknown extensions map to
/// `image/png`.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("bmp") => "image/bmp",
        other => {
            warn!(
                "Unknown image extension {:?} for {}, treating as PNG",
                other.unwrap_or(""),
                path.display()
            );
            "image/png"
        }
    }
}

/// Resolve an HTML `src` attribute value to a filesystem path.
pub fn resolve_source(src: &str, base_dir: &Path) -> PathBuf {
    let unescaped = html_escape::decode_html_entities(src);
    let decoded = percent_decode_str(&unescaped).decode_utf8_lossy();
    base_dir.join(decoded.as_ref())
}

/// Inline every local image referenced by `html`, resolving relative paths
/// against `base_dir`.
pub async fn embed_local_images(html: &str, base_dir: &Path) -> EmbeddedHtml {
    let mut sources: Vec<&str> = RE_SRC
        .captures_iter(html)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .filter(|src| !is_external_source(src))
        .collect();
    sources.sort_unstable();
    sources.dedup();

    if sources.is_empty() {
        return EmbeddedHtml {
            html: html.to_string(),
            ..Default::default()
        };
    }
    debug!("Found {} local image reference(s)", sources.len());

    let mut data_uris: HashMap<&str, String> = HashMap::with_capacity(sources.len());
    let mut errors = Vec::new();
    for src in sources {
        let path = resolve_source(src, base_dir);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let uri = format!("data:{};base64,{}", mime_for_path(&path), STANDARD.encode(&bytes));
                debug!("Embedded {} ({} bytes)", path.display(), bytes.len());
                data_uris.insert(src, uri);
            }
            Err(e) => {
                warn!("Could not read image {}: {}", path.display(), e);
                errors.push(AssetError::ImageReadFailed {
                    path,
                    detail: e.to_string(),
                });
            }
        }
    }

    let out = RE_SRC.replace_all(html, |caps: &Captures| match data_uris.get(&caps[1]) {
        Some(uri) => format!("src=\"{uri}\""),
        None => caps[0].to_string(),
    });

    EmbeddedHtml {
        html: out.into_owned(),
        embedded: data_uris.len(),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn mime_table() {
        assert_eq!(mime_for_path(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("a.svg")), "image/svg+xml");
        assert_eq!(mime_for_path(Path::new("a.tiff")), "image/png");
        assert_eq!(mime_for_path(Path::new("noext")), "image/png");
    }

    #[test]
    fn external_sources_skipped() {
        assert!(is_external_source("https://x/y.png"));
        assert!(is_external_source("data:image/png;base64,AAAA"));
        assert!(is_external_source("file:///tmp/a.png"));
        assert!(!is_external_source("img/a.png"));
    }

    #[test]
    fn source_is_decoded_before_resolving() {
        let p = resolve_source("my%20pics/a&amp;b.png", Path::new("/docs"));
        assert_eq!(p, PathBuf::from("/docs/my pics/a&b.png"));
    }

    #[test]
    fn embeds_existing_image() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("dot.gif"), b"GIF89a").unwrap();
        let html = r#"<p><img src="dot.gif" alt="x" /><img src="dot.gif" /></p>"#;

        let out = tokio_test::block_on(embed_local_images(html, dir.path()));
        assert_eq!(out.embedded, 1);
        assert!(out.errors.is_empty());
        let expected = format!("src=\"data:image/gif;base64,{}\"", STANDARD.encode(b"GIF89a"));
        assert_eq!(out.html.matches(&expected).count(), 2, "got: {}", out.html);
    }

    #[test]
    fn missing_image_is_left_and_reported() {
        let dir = tempfile::tempdir().unwrap();
        let html = r#"<img src="missing.png" /><img src="https://example.com/a.png" />"#;

        let out = tokio_test::block_on(embed_local_images(html, dir.path()));
        assert_eq!(out.html, html);
        assert_eq!(out.embedded, 0);
        assert_eq!(out.errors.len(), 1);
        let AssetError::ImageReadFailed { path, .. } = &out.errors[0];
        assert!(path.ends_with("missing.png"));
    }

    #[test]
    fn no_images_is_noop() {
        let out = tokio_test::block_on(embed_local_images("<p>hi</p>", Path::new(".")));
        assert_eq!(out.html, "<p>hi</p>");
        assert_eq!(out.embedded, 0);
    }
}
