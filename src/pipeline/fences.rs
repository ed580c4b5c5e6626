//! Fence scanning and nested code-fence pairing.
//!
//! A Markdown renderer closes a fenced block at the first line that looks
//! like a closing fence, so a block that *shows* fences as content (a README
//! snippet inside a tutorial, say) is cut short. This module finds which
//! fence lines really delimit blocks so the inner ones can be shielded by
//! [`crate::pipeline::placeholder`] before rendering.
//!
//! ## Pairing rule
//!
//! Only a line that is *purely* N backticks closes a block, and only a block
//! that was opened with exactly N backticks at the same or a deeper
//! indentation. The pending fences live on an explicit stack; closing a fence
//! abandons everything opened after it.

use serde::Serialize;

/// A line whose trimmed text starts with a run of three or more backticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FencePosition {
    /// 0-based line number.
    pub line_index: usize,
    /// Length of the maximal leading backtick run (≥ 3).
    pub backtick_count: usize,
    /// Leading whitespace characters before the first backtick.
    pub indent: usize,
    /// True when the trimmed line is exactly the backtick run, i.e. it has
    /// the shape of a closing fence (no info string).
    pub bare: bool,
}

/// A matched opening/closing fence. `start_line < end_line` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FencePair {
    pub start_line: usize,
    pub end_line: usize,
}

impl FencePair {
    /// True when `line` lies strictly between the two delimiter lines.
    pub fn contains_interior(&self, line: usize) -> bool {
        self.start_line < line && line < self.end_line
    }
}

/// Scan `lines` for fence candidates, in line order.
pub fn scan_fences<S: AsRef<str>>(lines: &[S]) -> Vec<FencePosition> {
    lines
        .iter()
        .enumerate()
        .filter_map(|(line_index, line)| fence_at(line_index, line.as_ref()))
        .collect()
}

fn fence_at(line_index: usize, line: &str) -> Option<FencePosition> {
    let stripped = line.trim();
    let backtick_count = stripped.chars().take_while(|&c| c == '`').count();
    if backtick_count < 3 {
        return None;
    }
    let indent = line.chars().take_while(|c| c.is_whitespace()).count();
    Some(FencePosition {
        line_index,
        backtick_count,
        indent,
        // Backticks are one byte each, so byte length equals the run length.
        bare: stripped.len() == backtick_count,
    })
}

/// Pair scanned fences into code-block ranges.
///
/// Pairs are returned in the order their closing fence appears. Fences that
/// never close are dropped without error.
pub fn pair_fences(fences: &[FencePosition]) -> Vec<FencePair> {
    let mut stack: Vec<FencePosition> = Vec::new();
    let mut pairs = Vec::new();

    for fence in fences {
        let matched = if fence.bare {
            stack.iter().rposition(|open| {
                open.backtick_count == fence.backtick_count && fence.indent <= open.indent
            })
        } else {
            None
        };

        match matched {
            Some(j) => {
                pairs.push(FencePair {
                    start_line: stack[j].line_index,
                    end_line: fence.line_index,
                });
                stack.truncate(j);
            }
            None => stack.push(*fence),
        }
    }

    pairs
}
