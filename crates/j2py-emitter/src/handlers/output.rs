//! Output (text) handlers.

use super::HandlerError;
use crate::template::{NodeId, TemplateTree};

/// Longest run of consecutive blank lines kept.
const MAX_BLANK_RUN: usize = 2;

pub fn strip_trailing_whitespace(
    _tree: &TemplateTree,
    _id: NodeId,
    text: String,
) -> Result<String, HandlerError> {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        out.push_str(line.trim_end());
        out.push('\n');
    }
    if !text.ends_with('\n') {
        out.pop();
    }
    Ok(out)
}

/// Collapse blank-line runs to at most two lines and drop trailing blank
/// lines, leaving a single final newline.
pub fn collapse_blank_lines(
    _tree: &TemplateTree,
    _id: NodeId,
    text: String,
) -> Result<String, HandlerError> {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines() {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > MAX_BLANK_RUN {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    let kept = out.trim_end_matches('\n').len();
    out.truncate(kept);
    if !out.is_empty() {
        out.push('\n');
    }
    Ok(out)
}
