//! Finishing handlers for method nodes.

use super::HandlerError;
use crate::settings::EmitSettings;
use crate::template::{NodeData, NodeId, NodeKind, TemplateTree};

/// Make the fall-through of a value-returning method explicit.
///
/// A method with a non-void return type whose last body statement is not a
/// `return` or `raise` gets `return None` appended. Empty bodies (abstract
/// and interface methods) keep their `pass`.
pub fn insert_return(tree: &mut TemplateTree, id: NodeId, settings: &EmitSettings) -> Result<(), HandlerError> {
    let node = tree.node(id);
    if node.kind() != NodeKind::Method {
        return Err(HandlerError::new(format!(
            "expected a method node, found {}",
            node.kind().name()
        )));
    }
    if node.declared_type.is_none() || node.is_void() {
        return Ok(());
    }
    let Some(&last) = node.children().last() else {
        return Ok(());
    };
    if let NodeData::Line(text) = &tree.node(last).data
        && ["return", "raise"]
            .iter()
            .any(|keyword| text == keyword || text.starts_with(&format!("{keyword} ")))
    {
        return Ok(());
    }
    tree.add_line(id, format!("return {}", settings.any_name("null")));
    Ok(())
}
