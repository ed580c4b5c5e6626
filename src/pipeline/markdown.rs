//! Markdown → HTML fragment rendering with `pulldown-cmark`.
//!
//! The event stream is rewritten on the way through:
//!
//! * soft breaks become `<br />` so single newlines survive into the PDF;
//! * headings get ids from [`Slugger::heading_id`], the same assignment
//!   [`crate::pipeline::toc::expand_toc`] uses for its links;
//! * code blocks are buffered, un-shielded and handed to the
//!   [`CodeHighlighter`], then emitted as raw `<pre><code>` HTML.

use crate::pipeline::highlight::CodeHighlighter;
use crate::pipeline::placeholder::unshield;
use crate::pipeline::toc::Slugger;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// Extensions enabled for every document.
pub fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
    options
}

struct PendingHeading<'a> {
    level: HeadingLevel,
    id: Option<CowStr<'a>>,
    classes: Vec<CowStr<'a>>,
    attrs: Vec<(CowStr<'a>, Option<CowStr<'a>>)>,
    inner: Vec<Event<'a>>,
    text: String,
}

struct PendingCode {
    lang: Option<String>,
    text: String,
}

impl PendingCode {
    fn into_html(self, highlighter: &dyn CodeHighlighter) -> String {
        let code = unshield(&self.text);
        let body = highlighter.highlight(&code, self.lang.as_deref());
        let class = match &self.lang {
            Some(lang) => format!(
                "hljs language-{}",
                html_escape::encode_double_quoted_attribute(lang)
            ),
            None => "hljs".to_string(),
        };
        format!("<pre><code class=\"{class}\">{body}</code></pre>\n")
    }
}

/// First word of a fence info string (`rust,ignore` → `rust`).
fn info_lang(info: &str) -> Option<String> {
    info.split(|c: char| c.is_whitespace() || c == ',' || c == '{')
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Render a Markdown string to an HTML fragment (no `<html>` wrapper).
pub fn render_markdown(text: &str, highlighter: &dyn CodeHighlighter) -> String {
    let parser = Parser::new_ext(text, markdown_options());
    let mut slugger = Slugger::new();
    let mut events: Vec<Event> = Vec::new();
    let mut heading: Option<PendingHeading> = None;
    let mut code: Option<PendingCode> = None;

    for event in parser {
        if let Some(block) = code.as_mut() {
            match event {
                Event::Text(t) => block.text.push_str(&t),
                Event::End(TagEnd::CodeBlock) => {
                    if let Some(block) = code.take() {
                        events.push(Event::Html(block.into_html(highlighter).into()));
                    }
                }
                _ => {}
            }
            continue;
        }

        let event = match event {
            Event::SoftBreak => Event::HardBreak,
            other => other,
        };

        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info_lang(&info),
                    CodeBlockKind::Indented => None,
                };
                code = Some(PendingCode {
                    lang,
                    text: String::new(),
                });
            }
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                heading = Some(PendingHeading {
                    level,
                    id,
                    classes,
                    attrs,
                    inner: Vec::new(),
                    text: String::new(),
                });
            }
            Event::End(TagEnd::Heading(level)) => match heading.take() {
                Some(h) => {
                    let id = CowStr::from(slugger.heading_id(h.id.as_deref(), &h.text));
                    events.push(Event::Start(Tag::Heading {
                        level: h.level,
                        id: Some(id),
                        classes: h.classes,
                        attrs: h.attrs,
                    }));
                    events.extend(h.inner);
                    events.push(Event::End(TagEnd::Heading(level)));
                }
                None => events.push(Event::End(TagEnd::Heading(level))),
            },
            other => match heading.as_mut() {
                Some(h) => {
                    if let Event::Text(t) | Event::Code(t) = &other {
                        h.text.push_str(t);
                    }
                    h.inner.push(other);
                }
                None => events.push(other),
            },
        }
    }

    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    out
}
