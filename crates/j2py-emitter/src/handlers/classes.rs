//! Finishing handlers for class nodes.

use rustc_hash::FxHashMap;

use super::HandlerError;
use crate::settings::EmitSettings;
use crate::template::{NodeData, NodeId, NodeKind, TemplateTree};

/// Decorator marking methods that share a name within one class.
pub const OVERLOAD_DECORATOR: &str = "@overloaded";

/// Give a class with no bases the root object base.
pub fn fix_base_classes(
    tree: &mut TemplateTree,
    id: NodeId,
    settings: &EmitSettings,
) -> Result<(), HandlerError> {
    let root = settings.type_name("Object");
    match &mut tree.node_mut(id).data {
        NodeData::Class { bases } => {
            if bases.is_empty() {
                bases.push(root);
            }
            Ok(())
        }
        other => Err(HandlerError::new(format!(
            "expected a class node, found {}",
            other.kind().name()
        ))),
    }
}

/// Decorate every method whose name is declared more than once in the class.
///
/// The target has no overloading; the decorator lets a runtime helper
/// dispatch on arguments.
pub fn fix_overload_methods(
    tree: &mut TemplateTree,
    id: NodeId,
    _settings: &EmitSettings,
) -> Result<(), HandlerError> {
    let methods: Vec<NodeId> = tree
        .children(id)
        .iter()
        .copied()
        .filter(|&child| tree.kind(child) == NodeKind::Method)
        .collect();

    let mut counts: FxHashMap<String, usize> = FxHashMap::default();
    for &method in &methods {
        let name = tree.node(method).name.clone().unwrap_or_default();
        *counts.entry(name).or_default() += 1;
    }

    for method in methods {
        let overloaded = tree
            .node(method)
            .name
            .as_ref()
            .and_then(|name| counts.get(name))
            .is_some_and(|&count| count > 1);
        if !overloaded {
            continue;
        }
        if let NodeData::Method { preamble, .. } = &mut tree.node_mut(method).data
            && !preamble.iter().any(|line| line == OVERLOAD_DECORATOR)
        {
            preamble.insert(0, OVERLOAD_DECORATOR.to_string());
        }
    }
    Ok(())
}

/// Move methods after the other members and order them by name.
///
/// Non-method children keep their relative order; methods with equal names
/// keep theirs.
pub fn sort_class_methods(
    tree: &mut TemplateTree,
    id: NodeId,
    _settings: &EmitSettings,
) -> Result<(), HandlerError> {
    let (mut methods, mut order): (Vec<NodeId>, Vec<NodeId>) = tree
        .children(id)
        .iter()
        .copied()
        .partition(|&child| tree.kind(child) == NodeKind::Method);
    methods.sort_by(|a, b| tree.node(*a).name.cmp(&tree.node(*b).name));
    order.extend(methods);
    tree.reorder_children(id, order);
    Ok(())
}

/// Name the target gives a constructor.
pub const CONSTRUCTOR_NAME: &str = "__init__";

/// Rename constructors (methods named after their class, with no return
/// type) to the target's initializer name.
pub fn fix_ctor(tree: &mut TemplateTree, id: NodeId, _settings: &EmitSettings) -> Result<(), HandlerError> {
    let class_name = class_name(tree, id)?;
    let constructors: Vec<NodeId> = tree
        .children(id)
        .iter()
        .copied()
        .filter(|&child| {
            let node = tree.node(child);
            node.kind() == NodeKind::Method
                && node.declared_type.is_none()
                && node.name.as_deref() == Some(class_name.as_str())
        })
        .collect();
    for ctor in constructors {
        tree.node_mut(ctor).name = Some(CONSTRUCTOR_NAME.to_string());
    }
    Ok(())
}

/// Turn `getX()` / `setX(v)` accessor pairs into a property named `x`.
///
/// A getter is an instance method with no declared parameters and a non-void
/// return type; a setter is an instance method with exactly one parameter.
/// Setters without a matching getter are left alone, as are accessors whose
/// property name is already declared in the class.
pub fn fix_prop_methods(
    tree: &mut TemplateTree,
    id: NodeId,
    _settings: &EmitSettings,
) -> Result<(), HandlerError> {
    class_name(tree, id)?;
    let mut getters: FxHashMap<String, NodeId> = FxHashMap::default();
    let mut setters: Vec<(String, NodeId)> = Vec::new();
    for &child in tree.children(id) {
        let node = tree.node(child);
        if node.kind() != NodeKind::Method || node.is_static() {
            continue;
        }
        let Some(name) = node.name.as_deref() else {
            continue;
        };
        let declared = node.parameters().len().saturating_sub(1);
        if let Some(property) = accessor_property(name, "get")
            && declared == 0
            && node.declared_type.is_some()
            && !node.is_void()
        {
            getters.insert(property, child);
        } else if let Some(property) = accessor_property(name, "set")
            && declared == 1
        {
            setters.push((property, child));
        }
    }

    let taken: Vec<String> = tree
        .children(id)
        .iter()
        .filter_map(|&child| tree.node(child).name.clone())
        .chain(tree.node(id).variables.iter().cloned())
        .collect();
    for (property, getter) in &getters {
        if taken.contains(property) {
            continue;
        }
        add_accessor_decorator(tree, *getter, property, "@property".to_string());
    }
    for (property, setter) in setters {
        if !getters.contains_key(&property) || taken.contains(&property) {
            continue;
        }
        let decorator = format!("@{property}.setter");
        add_accessor_decorator(tree, setter, &property, decorator);
    }
    Ok(())
}

fn add_accessor_decorator(tree: &mut TemplateTree, method: NodeId, property: &str, decorator: String) {
    let node = tree.node_mut(method);
    node.name = Some(property.to_string());
    if let NodeData::Method { preamble, .. } = &mut node.data {
        preamble.insert(0, decorator);
    }
}

/// `getValue` with prefix `get` -> `value`.
fn accessor_property(name: &str, prefix: &str) -> Option<String> {
    let rest = name.strip_prefix(prefix)?;
    let mut chars = rest.chars();
    let first = chars.next().filter(|ch| ch.is_uppercase())?;
    Some(first.to_lowercase().chain(chars).collect())
}

fn class_name(tree: &TemplateTree, id: NodeId) -> Result<String, HandlerError> {
    let node = tree.node(id);
    match node.data {
        NodeData::Class { .. } => Ok(node.name.clone().unwrap_or_default()),
        _ => Err(HandlerError::new(format!(
            "expected a class node, found {}",
            node.kind().name()
        ))),
    }
}
