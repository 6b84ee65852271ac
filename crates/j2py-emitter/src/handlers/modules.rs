//! Finishing handlers for the module node.

use tracing::debug;

use super::HandlerError;
use crate::expression::Expression;
use crate::settings::EmitSettings;
use crate::template::{NodeId, NodeKind, TemplateNode, TemplateTree};

/// Append a script entry point when a top-level class declares
/// `public static void main`.
///
/// ```text
/// if __name__ == '__main__':
///     import sys
///     Name.main(sys.argv)
/// ```
pub fn if_main_script(
    tree: &mut TemplateTree,
    id: NodeId,
    _settings: &EmitSettings,
) -> Result<(), HandlerError> {
    let Some(class_name) = find_main_class(tree, id) else {
        return Ok(());
    };
    debug!(class = %class_name, "adding script entry point");

    tree.add_line(id, "");
    let guard = tree.append(id, TemplateNode::statement("if"));
    tree.set_header(guard, Expression::text("__name__ == '__main__'"));
    tree.add_line(guard, "import sys");
    tree.add_line(guard, format!("{class_name}.main(sys.argv)"));
    Ok(())
}

fn find_main_class(tree: &TemplateTree, module: NodeId) -> Option<String> {
    tree.children(module)
        .iter()
        .copied()
        .filter(|&child| tree.kind(child) == NodeKind::Class)
        .find(|&class| {
            tree.children(class).iter().any(|&member| {
                let node = tree.node(member);
                node.kind() == NodeKind::Method
                    && node.name.as_deref() == Some("main")
                    && node.is_public()
                    && node.is_static()
                    && (node.declared_type.is_none() || node.is_void())
            })
        })
        .and_then(|class| tree.node(class).name.clone())
}
