//! Syntax highlighting for fenced code blocks.
//!
//! [`CodeHighlighter`] is the seam between the Markdown renderer and whatever
//! colours the code. The default [`SyntectHighlighter`] emits inline-styled
//! `<span>`s so the printed PDF needs no external stylesheet.

use crate::error::Md2PdfError;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use tracing::{debug, warn};

/// Turns code text into the inner HTML of a `<code>` element.
///
/// Implementations must return HTML-safe output: every `<`, `>` and `&` in
/// `code` has to come back escaped or inside markup.
pub trait CodeHighlighter: Send + Sync {
    /// `lang` is the first word of the fence info string, if any.
    fn highlight(&self, code: &str, lang: Option<&str>) -> String;
}

/// Escapes code without colouring it.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainHighlighter;

impl CodeHighlighter for PlainHighlighter {
    fn highlight(&self, code: &str, _lang: Option<&str>) -> String {
        html_escape::encode_text(code).into_owned()
    }
}

/// `syntect`-backed highlighter using the bundled syntax and theme sets.
pub struct SyntectHighlighter {
    syntaxes: SyntaxSet,
    theme: Theme,
}

impl std::fmt::Debug for SyntectHighlighter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntectHighlighter")
            .field("theme", &self.theme.name)
            .finish()
    }
}

impl SyntectHighlighter {
    /// Load the default syntaxes and the named theme.
    ///
    /// Fails with [`Md2PdfError::InvalidConfig`] when the theme is not one
    /// of `syntect`'s bundled themes.
    pub fn new(theme: &str) -> Result<Self, Md2PdfError> {
        let mut themes = ThemeSet::load_defaults();
        let theme = themes.themes.remove(theme).ok_or_else(|| {
            let mut known: Vec<_> = ThemeSet::load_defaults().themes.into_keys().collect();
            known.sort();
            Md2PdfError::InvalidConfig(format!(
                "Unknown highlight theme '{theme}'. Available: {}",
                known.join(", ")
            ))
        })?;
        Ok(Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
            theme,
        })
    }

    fn try_highlight(&self, code: &str, lang: &str) -> Option<String> {
        let syntax = self.syntaxes.find_syntax_by_token(lang)?;
        let mut lines = HighlightLines::new(syntax, &self.theme);
        let mut out = String::with_capacity(code.len() * 2);
        for line in LinesWithEndings::from(code) {
            let regions = lines.highlight_line(line, &self.syntaxes).ok()?;
            let html = styled_line_to_highlighted_html(&regions[..], IncludeBackground::No).ok()?;
            out.push_str(&html);
        }
        Some(out)
    }
}

impl CodeHighlighter for SyntectHighlighter {
    fn highlight(&self, code: &str, lang: Option<&str>) -> String {
        let Some(lang) = lang.filter(|l| !l.is_empty()) else {
            return PlainHighlighter.highlight(code, None);
        };
        match self.try_highlight(code, lang) {
            Some(html) => html,
            None => {
                if self.syntaxes.find_syntax_by_token(lang).is_none() {
                    debug!("No syntax for language '{}', rendering plain", lang);
                } else {
                    warn!("Highlighting failed for language '{}', rendering plain", lang);
                }
                PlainHighlighter.highlight(code, None)
            }
        }
    }
}
