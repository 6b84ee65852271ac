//! Finishing handlers that apply to more than one node kind.

use super::HandlerError;
use crate::settings::EmitSettings;
use crate::template::{NodeData, NodeId, TemplateNode, TemplateTree};

/// Insert a generated docstring as the first body line.
pub fn simple_doc_string(
    tree: &mut TemplateTree,
    id: NodeId,
    _settings: &EmitSettings,
) -> Result<(), HandlerError> {
    let node = tree.node(id);
    let text = format!(
        "\"\"\" generated source for {} {} \"\"\"",
        node.kind().name(),
        node.name.as_deref().unwrap_or_default()
    );
    let line = tree.alloc(TemplateNode::line(text));
    tree.insert_child(id, 0, line);
    Ok(())
}

/// Insert a comment listing the node's keyword modifiers as the first body
/// line. Decorator modifiers are skipped; they are already in the output.
pub fn insert_modifiers(
    tree: &mut TemplateTree,
    id: NodeId,
    _settings: &EmitSettings,
) -> Result<(), HandlerError> {
    let modifiers: Vec<&str> = tree
        .node(id)
        .modifiers
        .iter()
        .map(String::as_str)
        .filter(|modifier| !modifier.starts_with('@'))
        .collect();
    if modifiers.is_empty() {
        return Ok(());
    }
    let comment = tree.alloc(TemplateNode::comment(format!("modifiers: {}", modifiers.join(", "))));
    tree.insert_child(id, 0, comment);
    Ok(())
}

/// Reduce a source comment to its text lines.
///
/// `// text` keeps the text after the marker. A `/* ... */` block loses its
/// delimiters and the `*` gutter on each line; blank lines at either end are
/// dropped. Emission adds the comment prefix to every line.
pub fn simple_comments(
    tree: &mut TemplateTree,
    id: NodeId,
    _settings: &EmitSettings,
) -> Result<(), HandlerError> {
    match &mut tree.node_mut(id).data {
        NodeData::Comment(text) => {
            *text = comment_lines(text).join("\n");
            Ok(())
        }
        other => Err(HandlerError::new(format!(
            "expected a comment node, found {}",
            other.kind().name()
        ))),
    }
}

fn comment_lines(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if let Some(text) = raw.strip_prefix("//") {
        return vec![text.trim().to_string()];
    }
    let Some(body) = raw.strip_prefix("/*") else {
        return raw.lines().map(|line| line.trim().to_string()).collect();
    };
    let body = body.strip_suffix("*/").unwrap_or(body);
    let lines: Vec<String> = body
        .lines()
        .map(|line| {
            let line = line.trim();
            let line = line.strip_prefix('*').unwrap_or(line);
            let line = line.strip_suffix('*').unwrap_or(line);
            line.trim().to_string()
        })
        .collect();
    let start = lines.iter().position(|line| !line.is_empty()).unwrap_or(lines.len());
    let end = lines.iter().rposition(|line| !line.is_empty()).map_or(start, |last| last + 1);
    lines[start..end].to_vec()
}
