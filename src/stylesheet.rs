//! Print stylesheet and HTML document shell.
//!
//! The stylesheet depends only on the font-size preset and page setup, so a
//! [`crate::MarkdownConverter`] builds it once and reuses it for every
//! document it prints.

use crate::config::{FontSize, PageSetup};

/// Build the embedded print stylesheet.
pub fn build_stylesheet(font_size: FontSize, page: PageSetup) -> String {
    let sizes = font_size.sizes();
    let margin = format_cm(page.margin_cm);
    format!(
        r#"
      @page {{ size: {paper}; margin: {margin}; }}

      body {{
        font-family: Arial, "Noto Sans", "Noto Sans CJK JP", sans-serif;
        font-size: {base};
        line-height: 1.6;
        color: #333;
        max-width: none;
      }}

      h1, h2, h3, h4, h5, h6 {{
        color: #2c3e50;
        margin-top: 1.5em;
        margin-bottom: 0.5em;
        page-break-after: avoid;
      }}

      h1 {{ font-size: {h1}; border-bottom: 2px solid #3498db; padding-bottom: 10px; }}
      h2 {{ font-size: {h2}; border-bottom: 1px solid #bdc3c7; padding-bottom: 5px; }}
      h3 {{ font-size: {h3}; }}
      h4 {{ font-size: {h4}; }}

      p {{ margin-bottom: 1em; text-align: justify; }}

      strong, b {{ font-weight: 900; color: #000; }}
      em, i {{ font-style: italic; color: #333; }}
      del, s {{ text-decoration: line-through; color: #666; }}

      code {{
        background-color: #f8f8f8;
        border: 1px solid #e1e1e8;
        border-radius: 3px;
        padding: 2px 4px;
        font-family: monospace;
        font-size: {code};
        word-wrap: break-word;
      }}

      pre {{
        background-color: #f8f8f8;
        border: 1px solid #e1e1e8;
        border-radius: 5px;
        padding: 10px;
        overflow-x: auto;
        page-break-inside: avoid;
        white-space: pre-wrap;
        word-wrap: break-word;
        line-height: 1.4;
      }}

      pre code {{
        background-color: transparent;
        border: none;
        padding: 0;
        white-space: pre-wrap;
        word-wrap: break-word;
        line-height: inherit;
      }}

      .hljs {{ display: block; overflow-x: auto; padding: 0.5em; background: #f8f8f8; }}

      table {{ border-collapse: collapse; width: 100%; margin: 1em 0; page-break-inside: avoid; }}
      th, td {{ border: 1px solid #ddd; padding: 8px; text-align: left; }}
      th {{ background-color: #f2f2f2; font-weight: bold; }}
      tr:nth-child(even) {{ background-color: #f9f9f9; }}

      ul, ol {{ margin: 1em 0; padding-left: 2em; }}
      li {{ margin-bottom: 0.5em; }}

      ul.task-list {{
        padding-left: 0 !important;
        list-style: none !important;
      }}

      ul.task-list > li {{
        list-style: none !important;
        position: relative;
        padding-left: 1.5em !important;
        margin-left: 0 !important;
      }}

      ul.task-list > li::before,
      ul.task-list > li::after,
      ul.task-list > li::marker {{
        display: none !important;
        content: none !important;
      }}

      .task-list-control {{ position: absolute; left: 0; top: 0; width: 1.2em; }}
      .task-list-control input[type="checkbox"] {{ display: none !important; }}

      .task-list-control input[type="checkbox"] + .task-list-indicator::before {{
        content: "☐";
        color: #666;
        font-weight: bold;
      }}

      .task-list-control input[type="checkbox"]:checked + .task-list-indicator::before,
      .task-list-control input[type="checkbox"][checked] + .task-list-indicator::before {{
        content: "☑";
        color: #3498db !important;
        font-weight: bold;
      }}

      blockquote {{ border-left: 4px solid #3498db; margin: 1em 0; padding-left: 1em; color: #666; font-style: italic; }}
      a {{ color: #3498db; text-decoration: none; }}

      img {{
        max-width: 100%;
        height: auto;
        display: block;
        margin: 1em auto;
        border: 1px solid #ddd;
        border-radius: 5px;
        padding: 5px;
        background-color: #fff;
      }}

      .footnote-definition {{ font-size: 0.9em; color: #555; }}
      .page-break {{ page-break-before: always; }}
    "#,
        paper = page.paper.css_name(),
        margin = margin,
        base = sizes.base,
        h1 = sizes.h1,
        h2 = sizes.h2,
        h3 = sizes.h3,
        h4 = sizes.h4,
        code = sizes.code,
    )
}

fn format_cm(cm: f64) -> String {
    // 2.0 → "2cm", 1.5 → "1.5cm"
    format!("{}cm", cm)
}

/// Wrap an HTML fragment into a complete document with the stylesheet inlined.
pub fn wrap_document(body: &str, css: &str, title: &str, lang: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{css}</style>
</head>
<body>
{body}
</body>
</html>"#,
        lang = html_escape::encode_double_quoted_attribute(lang),
        title = html_escape::encode_text(title),
    )
}
