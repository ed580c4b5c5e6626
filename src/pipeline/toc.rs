//! Heading anchors and `[TOC]` expansion.
//!
//! [`expand_toc`] and the Markdown renderer both parse the fence-shielded
//! text with the same pulldown-cmark options and hand every heading to
//! [`Slugger::heading_id`] in document order, so the links in the generated
//! table of contents match the rendered ids for ATX, setext, quoted and
//! list-nested headings alike.

use crate::pipeline::markdown::markdown_options;
use crate::pipeline::placeholder::protect_nested_fences;
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Marker line replaced by the generated table of contents.
pub const TOC_MARKER: &str = "[TOC]";

/// Generate a heading slug from text.
///
/// Lowercases, keeps Unicode alphanumerics, turns whitespace runs into a
/// single hyphen and trims hyphens from both ends.
///
/// ```
/// use edgequake_md2pdf::pipeline::toc::slugify;
///
/// assert_eq!(slugify("Getting Started!"), "getting-started");
/// assert_eq!(slugify("  Nested   Fences  "), "nested-fences");
/// assert_eq!(slugify("安装 指南"), "安装-指南");
/// ```
pub fn slugify(text: &str) -> String {
    text.chars()
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c.to_lowercase().collect::<String>())
            } else if c.is_whitespace() || c == '-' {
                Some("-".to_string())
            } else {
                None
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Assigns unique heading ids across one document.
#[derive(Debug, Default)]
pub struct Slugger {
    seen: HashMap<String, usize>,
    headings: usize,
}

impl Slugger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for the next heading with `text`.
    ///
    /// Empty slugs become `section-{n}` where n is the 1-based heading
    /// ordinal; repeats get `-1`, `-2`, … suffixes.
    pub fn slug(&mut self, text: &str) -> String {
        self.headings += 1;
        let mut base = slugify(text);
        if base.is_empty() {
            base = format!("section-{}", self.headings);
        }
        match self.seen.get_mut(&base) {
            Some(count) => {
                *count += 1;
                let id = format!("{base}-{count}");
                self.seen.insert(id.clone(), 0);
                id
            }
            None => {
                self.seen.insert(base.clone(), 0);
                base
            }
        }
    }

    /// Count a heading that carries an explicit id, keeping ordinals aligned.
    pub fn reserve(&mut self, id: &str) {
        self.headings += 1;
        self.seen.entry(id.to_string()).or_insert(0);
    }

    /// Id for the next heading: the explicit `{#id}` when present,
    /// otherwise a slug of its text.
    pub fn heading_id(&mut self, explicit: Option<&str>, text: &str) -> String {
        match explicit {
            Some(id) => {
                self.reserve(id);
                id.to_string()
            }
            None => self.slug(text),
        }
    }
}

/// One line of the generated table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub level: u8,
    pub text: String,
    pub id: String,
}

fn level_number(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

// Backslash-escape characters that would turn entry text back into markup.
fn escape_link_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '`' | '*' | '_' | '[' | ']' | '<' | '>') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Headings and code-block lines of a document, as the renderer sees it.
struct Outline {
    headings: Vec<TocEntry>,
    code_lines: Vec<bool>,
}

fn outline(markdown: &str) -> Outline {
    // Shielded text keeps the line count, so line numbers carry over.
    let shielded = protect_nested_fences(markdown).text;
    let line_starts: Vec<usize> = std::iter::once(0)
        .chain(shielded.match_indices('\n').map(|(i, _)| i + 1))
        .collect();
    let line_of = |offset: usize| line_starts.partition_point(|&s| s <= offset) - 1;

    let mut code_lines = vec![false; line_starts.len()];
    let mut slugger = Slugger::new();
    let mut headings = Vec::new();
    let mut current: Option<(u8, Option<String>, String)> = None;

    for (event, range) in Parser::new_ext(&shielded, markdown_options()).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(_)) => {
                let last = line_of(range.end.saturating_sub(1).max(range.start));
                for flag in &mut code_lines[line_of(range.start)..=last] {
                    *flag = true;
                }
            }
            Event::Start(Tag::Heading { level, id, .. }) => {
                current = Some((level_number(level), id.map(|i| i.to_string()), String::new()));
            }
            Event::Text(t) | Event::Code(t) => {
                if let Some((_, _, text)) = current.as_mut() {
                    text.push_str(&t);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, explicit, text)) = current.take() {
                    let id = slugger.heading_id(explicit.as_deref(), &text);
                    headings.push(TocEntry { level, text, id });
                }
            }
            _ => {}
        }
    }

    Outline {
        headings,
        code_lines,
    }
}

/// Expand every `[TOC]` line into a nested bullet list of headings.
///
/// Headings of level 2 through `max_level` are listed; level 1 is the
/// document title. Headings and markers inside code blocks are ignored.
/// When no marker is present the input is returned unchanged with no
/// entries.
pub fn expand_toc(markdown: &str, max_level: u8) -> (String, Vec<TocEntry>) {
    let lines: Vec<&str> = markdown.split('\n').collect();
    if !lines.iter().any(|l| l.trim() == TOC_MARKER) {
        return (markdown.to_string(), Vec::new());
    }

    let outline = outline(markdown);
    let is_marker = |i: usize, line: &str| {
        line.trim() == TOC_MARKER && !outline.code_lines.get(i).copied().unwrap_or(false)
    };
    if !lines.iter().enumerate().any(|(i, l)| is_marker(i, l)) {
        return (markdown.to_string(), Vec::new());
    }

    let entries: Vec<TocEntry> = outline
        .headings
        .iter()
        .filter(|h| (2..=max_level).contains(&h.level))
        .cloned()
        .collect();

    let block = entries
        .iter()
        .map(|e| {
            format!(
                "{}- [{}](#{})",
                "  ".repeat(usize::from(e.level - 2)),
                escape_link_text(&e.text),
                e.id
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let out = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if is_marker(i, line) {
                format!("{block}\n")
            } else {
                (*line).to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    debug!("Expanded [TOC] with {} entries", entries.len());
    (out, entries)
}
