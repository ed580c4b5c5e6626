//! Post-processing: deterministic rewrites of the rendered HTML fragment.
//!
//! ## Rule Order
//!
//! Placeholder restoration runs first so later rules see the real fence
//! text. Strikethrough runs before the task-list rules; the two task-list
//! rules must run in order because the second keys off the class the first
//! one adds.

use crate::pipeline::placeholder::restore_placeholders;
use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all post-processing rules to the rendered HTML fragment.
///
/// Rules (applied in order):
/// 1. Restore nested-fence placeholders to "```"
/// 2. Turn leftover `~~text~~` into `<del>` outside code blocks
/// 3. Wrap task-list checkboxes in a styled control
/// 4. Mark lists that start with a task item as `ul.task-list`
pub fn postprocess_html(html: &str) -> String {
    let s = restore_placeholders(html);
    let s = apply_strikethrough(&s);
    let s = wrap_task_checkboxes(&s);
    mark_task_lists(&s)
}

// ── Rule 2: Strikethrough ────────────────────────────────────────────────────

static RE_PRE_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<pre\b.*?</pre>").unwrap());
static RE_STRIKE: Lazy<Regex> = Lazy::new(|| Regex::new(r"~~([^~]+)~~").unwrap());

/// `~~text~~` → `<del>text</del>`, leaving `<pre>` blocks untouched.
pub fn apply_strikethrough(html: &str) -> String {
    if !html.contains("~~") {
        return html.to_string();
    }
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for pre in RE_PRE_BLOCK.find_iter(html) {
        out.push_str(&RE_STRIKE.replace_all(&html[last..pre.start()], "<del>$1</del>"));
        out.push_str(pre.as_str());
        last = pre.end();
    }
    out.push_str(&RE_STRIKE.replace_all(&html[last..], "<del>$1</del>"));
    out
}

// ── Rule 3: Task-list checkbox control ───────────────────────────────────────

static RE_TASK_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<li><input\s+([^>]*type="checkbox"[^>]*)>\s*"#).unwrap());

fn wrap_task_checkboxes(html: &str) -> String {
    RE_TASK_ITEM
        .replace_all(
            html,
            r#"<li class="task-list-item"><span class="task-list-control"><input $1><span class="task-list-indicator"></span></span>"#,
        )
        .into_owned()
}

// ── Rule 4: Task-list container ──────────────────────────────────────────────

static RE_TASK_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<ul>(\s*<li class="task-list-item">)"#).unwrap());

fn mark_task_lists(html: &str) -> String {
    RE_TASK_LIST
        .replace_all(html, r#"<ul class="task-list">$1"#)
        .into_owned()
}
