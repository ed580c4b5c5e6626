//! Placeholder substitution and restoration for nested code fences.
//!
//! Interior fence markers are swapped for [`PLACEHOLDER`] before rendering so
//! the renderer sees a single code block, then swapped back in the HTML.
//!
//! ## Why several restore patterns?
//!
//! The token's underscores are Markdown emphasis syntax. When it leaks into
//! text that gets inline-formatted (a highlighter run on Markdown code, or a
//! paragraph when a fence sits inside a list), `_NESTED_` and `_DELIMITER_`
//! come back wrapped in `<em>`/`<strong>` or highlighter `<span>` tags. The
//! restore cascade recognises each of those shapes, most specific first.

use crate::pipeline::fences::{pair_fences, scan_fences, FencePair};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Opaque stand-in for an interior "```" run.
pub const PLACEHOLDER: &str = "___NESTED_CODEBLOCK_DELIMITER___";

const FENCE: &str = "```";

/// Markdown with interior fences shielded, plus what the pass found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedMarkdown {
    pub text: String,
    pub pairs: Vec<FencePair>,
    pub substituted_lines: usize,
}

/// Scan, pair and substitute in one pass over `markdown`.
///
/// The output has exactly the same line count as the input.
pub fn protect_nested_fences(markdown: &str) -> ProtectedMarkdown {
    let lines: Vec<&str> = markdown.split('\n').collect();
    let fences = scan_fences(&lines);
    let pairs = pair_fences(&fences);
    let (out, substituted_lines) = substitute_nested_fences(&lines, &pairs);
    debug!(
        "Fence scan: {} candidates, {} pairs, {} lines shielded",
        fences.len(),
        pairs.len(),
        substituted_lines
    );
    ProtectedMarkdown {
        text: out.join("\n"),
        pairs,
        substituted_lines,
    }
}

/// Replace every "```" on lines strictly inside any pair with [`PLACEHOLDER`].
///
/// Returns the new lines and how many lines changed.
pub fn substitute_nested_fences(lines: &[&str], pairs: &[FencePair]) -> (Vec<String>, usize) {
    // depth[i] > 0 iff line i is interior to at least one pair.
    let mut delta = vec![0i64; lines.len() + 1];
    for pair in pairs {
        if pair.end_line > pair.start_line + 1 && pair.end_line <= lines.len() {
            delta[pair.start_line + 1] += 1;
            delta[pair.end_line] -= 1;
        }
    }

    let mut depth = 0i64;
    let mut substituted = 0usize;
    let out = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            depth += delta[i];
            if depth > 0 && line.contains(FENCE) {
                substituted += 1;
                line.replace(FENCE, PLACEHOLDER)
            } else {
                (*line).to_string()
            }
        })
        .collect();

    (out, substituted)
}

/// Put literal "```" back wherever the placeholder was inserted inside plain
/// code text (before any highlighting markup is applied).
pub fn unshield(text: &str) -> String {
    text.replace(PLACEHOLDER, FENCE)
}

// ── Restore cascade ──────────────────────────────────────────────────────────

// `__<em>_NESTED_</em>CODEBLOCK<em>_DELIMITER_</em>__` inside an outer
// strong/span wrapper.
static RE_STRONG_WRAPPED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"<(?:strong|span)[^>]*>__<(?:em|span)[^>]*>_NESTED_</(?:em|span)>CODEBLOCK<(?:em|span)[^>]*>_DELIMITER_</(?:em|span)>__</(?:strong|span)>",
    )
    .unwrap()
});

// Same shape without the outer wrapper.
static RE_EM_WRAPPED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"__<(?:em|span)[^>]*>_NESTED_</(?:em|span)>CODEBLOCK<(?:em|span)[^>]*>_DELIMITER_</(?:em|span)>__",
    )
    .unwrap()
});

// CommonMark renders `___X___` as `<em><strong>X</strong></em>`.
static RE_WHOLE_TOKEN_EMPHASIS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"<(?:em|strong)><(?:em|strong)>_?NESTED_CODEBLOCK_DELIMITER_?</(?:em|strong)></(?:em|strong)>",
    )
    .unwrap()
});

// Any inline tag around text starting with the token prefix, plus any
// non-tag text after it up to the next tag.
static RE_TAG_FALLBACK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"<(?:span|em|strong)[^>]*>___NESTED_CODEBLOCK_DELIMITER_*</(?:span|em|strong)>[^<]*",
    )
    .unwrap()
});

/// Convert every placeholder shape in rendered HTML back to "```".
///
/// Idempotent: restored text contains no placeholder, so a second pass finds
/// nothing to replace.
pub fn restore_placeholders(html: &str) -> String {
    if !html.contains("NESTED") {
        return html.to_string();
    }
    let s = html.replace(PLACEHOLDER, FENCE);
    let s = RE_STRONG_WRAPPED.replace_all(&s, FENCE);
    let s = RE_EM_WRAPPED.replace_all(&s, FENCE);
    let s = RE_WHOLE_TOKEN_EMPHASIS.replace_all(&s, FENCE);
    RE_TAG_FALLBACK.replace_all(&s, FENCE).into_owned()
}
