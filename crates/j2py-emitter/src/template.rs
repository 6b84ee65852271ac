//! Template nodes and the arena that owns them.
//!
//! # Ownership
//!
//! Every [`TemplateNode`] lives in a [`TemplateTree`] and is addressed by a
//! [`NodeId`]. The arena alone owns node storage. A node records its parent's
//! id (a relation, not ownership) and an ordered list of child ids. Nodes are
//! never removed; they live as long as the tree.
//!
//! Invariant: every node except the root has exactly one parent and appears
//! exactly once in that parent's children. `add_child` does not search for
//! cycles; callers build top-down and never attach an ancestor below one of
//! its descendants.
//!
//! # Emission
//!
//! [`TemplateTree::emit`] is a three-phase walk:
//!
//! 1. the node's prologue lines (absent entries are skipped, not blank),
//! 2. every child, one indentation level deeper (module and block nodes keep
//!    their children at their own level),
//! 3. the node's epilogue lines.
//!
//! Method nodes replace the prologue with their declaration protocol (see
//! [`crate::method`]).

use indexmap::IndexSet;
use j2py_common::{Config, SettingValue};
use tracing::warn;

use crate::expression::{Expression, Format};
use crate::settings::EmitSettings;

/// Body written for a class, method or statement that has no children.
const EMPTY_BODY: &str = "pass";

/// Indentation used by the debug tree dump.
const REPR_INDENT: &str = "    ";

// =============================================================================
// Identifiers and Kinds
// =============================================================================

/// Handle to a node inside one [`TemplateTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Closed set of node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Module,
    Class,
    Method,
    /// Keyword-headed block: `while`, `for`, `if`, `try`, `except`, ...
    Statement,
    /// Transparent grouping node; also the generic fallback kind.
    Block,
    Line,
    Comment,
}

impl NodeKind {
    pub const ALL: [NodeKind; 7] = [
        NodeKind::Module,
        NodeKind::Class,
        NodeKind::Method,
        NodeKind::Statement,
        NodeKind::Block,
        NodeKind::Line,
        NodeKind::Comment,
    ];

    /// Lowercase kind name, used for registry lookup and setting keys.
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Module => "module",
            NodeKind::Class => "class",
            NodeKind::Method => "method",
            NodeKind::Statement => "statement",
            NodeKind::Block => "block",
            NodeKind::Line => "line",
            NodeKind::Comment => "comment",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        NodeKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    /// Setting key for a per-kind category: `class` + `Handlers` -> `classHandlers`.
    pub fn config_key(self, category: &str) -> String {
        format!("{}{}", self.name(), category)
    }

    /// Levels added to the children of this kind.
    pub fn body_offset(self) -> usize {
        match self {
            NodeKind::Module | NodeKind::Block => 0,
            _ => 1,
        }
    }

    /// Whether an empty body must still render a placeholder statement.
    pub fn requires_body(self) -> bool {
        matches!(self, NodeKind::Class | NodeKind::Method | NodeKind::Statement)
    }
}

// =============================================================================
// Node Data
// =============================================================================

/// A `(type, name)` method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub ty: String,
    pub name: String,
}

impl Parameter {
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Parameter {
            ty: ty.into(),
            name: name.into(),
        }
    }

    /// Implicit first parameter of an instance-bound method.
    pub fn instance() -> Self {
        Parameter::new("object", "self")
    }

    /// Implicit first parameter of a type-bound method.
    pub fn type_bound() -> Self {
        Parameter::new("type", "cls")
    }
}

/// Kind-specific node payload.
#[derive(Debug, Clone)]
pub enum NodeData {
    Module,
    Class {
        bases: Vec<String>,
    },
    Method {
        parameters: Vec<Parameter>,
        /// Lines written before the declaration (decorators).
        preamble: Vec<String>,
    },
    Statement {
        keyword: String,
        header: Option<Expression>,
    },
    Block,
    Line(String),
    Comment(String),
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Module => NodeKind::Module,
            NodeData::Class { .. } => NodeKind::Class,
            NodeData::Method { .. } => NodeKind::Method,
            NodeData::Statement { .. } => NodeKind::Statement,
            NodeData::Block => NodeKind::Block,
            NodeData::Line(_) => NodeKind::Line,
            NodeData::Comment(_) => NodeKind::Comment,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TemplateNode {
    pub name: Option<String>,
    /// Source-language type annotation (return type for methods).
    pub declared_type: Option<String>,
    pub modifiers: IndexSet<String>,
    /// Declared local names, in declaration order.
    pub variables: Vec<String>,
    pub data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    finished: bool,
}

impl TemplateNode {
    pub fn new(data: NodeData) -> Self {
        TemplateNode {
            name: None,
            declared_type: None,
            modifiers: IndexSet::new(),
            variables: Vec::new(),
            data,
            parent: None,
            children: Vec::new(),
            finished: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn module() -> Self {
        TemplateNode::new(NodeData::Module)
    }

    pub fn class(name: impl Into<String>) -> Self {
        TemplateNode::new(NodeData::Class { bases: Vec::new() }).with_name(name)
    }

    /// A method seeded with the instance-bound first parameter.
    pub fn method(name: impl Into<String>) -> Self {
        TemplateNode::new(NodeData::Method {
            parameters: vec![Parameter::instance()],
            preamble: Vec::new(),
        })
        .with_name(name)
    }

    pub fn statement(keyword: impl Into<String>) -> Self {
        let keyword = keyword.into();
        TemplateNode::new(NodeData::Statement {
            keyword: keyword.clone(),
            header: None,
        })
        .with_name(keyword)
    }

    pub fn block() -> Self {
        TemplateNode::new(NodeData::Block)
    }

    pub fn line(text: impl Into<String>) -> Self {
        TemplateNode::new(NodeData::Line(text.into()))
    }

    pub fn comment(text: impl Into<String>) -> Self {
        TemplateNode::new(NodeData::Comment(text.into()))
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether the finishing handlers have run for this node.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_public(&self) -> bool {
        self.modifiers.contains("public")
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains("static")
    }

    pub fn is_void(&self) -> bool {
        self.declared_type.as_deref() == Some("void")
    }

    /// Method parameters; empty for other kinds.
    pub fn parameters(&self) -> &[Parameter] {
        match &self.data {
            NodeData::Method { parameters, .. } => parameters,
            _ => &[],
        }
    }

    /// Method preamble lines; empty for other kinds.
    pub fn preamble(&self) -> &[String] {
        match &self.data {
            NodeData::Method { preamble, .. } => preamble,
            _ => &[],
        }
    }

    /// Debug representation: kind, name, type and modifiers.
    ///
    /// This describes the node; it is not program text.
    pub fn describe(&self) -> String {
        let mut parts = vec![self.kind().name().to_string()];
        if let Some(name) = &self.name {
            parts.push(format!("name:{name}"));
        }
        if let Some(ty) = &self.declared_type {
            parts.push(format!("type:{ty}"));
        }
        if !self.modifiers.is_empty() {
            let modifiers: Vec<&str> = self.modifiers.iter().map(String::as_str).collect();
            parts.push(format!("modifiers:{}", modifiers.join(",")));
        }
        match &self.data {
            NodeData::Line(text) | NodeData::Comment(text) => parts.push(format!("value:{text}")),
            NodeData::Statement {
                header: Some(header),
                ..
            } => parts.push(format!("value:{header}")),
            _ => {}
        }
        parts.join(" ")
    }
}

// =============================================================================
// Output Sink
// =============================================================================

/// In-memory sink for emitted lines. Writes are kept in call order.
#[derive(Debug, Default)]
pub struct SourceWriter {
    out: String,
}

impl SourceWriter {
    pub fn new() -> Self {
        SourceWriter::default()
    }

    /// Write `text` prefixed by `indent`. Empty lines carry no indentation.
    pub fn write_line(&mut self, indent: &str, text: &str) {
        if !text.is_empty() {
            self.out.push_str(indent);
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    /// Write already-indented text as one or more lines.
    pub fn write_raw_line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    pub fn blank_line(&mut self) {
        self.out.push('\n');
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn finish(self) -> String {
        self.out
    }
}

// =============================================================================
// Tree
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct TemplateTree {
    nodes: Vec<TemplateNode>,
}

impl TemplateTree {
    pub fn new() -> Self {
        TemplateTree::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Store a detached node and return its id.
    pub fn alloc(&mut self, mut node: TemplateNode) -> NodeId {
        node.parent = None;
        node.children.clear();
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&TemplateNode> {
        self.nodes.get(id.index())
    }

    /// Node by id. Ids are only produced by this tree, so a foreign id is a
    /// caller bug and panics.
    pub fn node(&self, id: NodeId) -> &TemplateNode {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut TemplateNode {
        &mut self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Last-wins lookup of `{kind}{category}` for `id`'s kind.
    pub fn configured_value<'c>(
        &self,
        id: NodeId,
        config: &'c Config,
        category: &str,
    ) -> Option<&'c SettingValue> {
        config.last(&self.kind(id).config_key(category))
    }

    /// Combined lookup of `{kind}{category}` for `id`'s kind, base layer first.
    pub fn configured_handlers(&self, id: NodeId, config: &Config, category: &str) -> Vec<SettingValue> {
        config.combined(&self.kind(id).config_key(category))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Ids from `id`'s parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |&current| self.parent(current))
    }

    /// Append a detached node to `parent`'s children.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        let len = self.children(parent).len();
        self.insert_child(parent, len, child);
    }

    /// Insert a detached node into `parent`'s children at `index`.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        debug_assert_ne!(parent, child, "a node cannot be its own child");
        debug_assert!(
            self.node(child).parent.is_none(),
            "node {child:?} already has a parent"
        );
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.insert(index, child);
    }

    /// Allocate `node` and append it to `parent`.
    pub fn append(&mut self, parent: NodeId, node: TemplateNode) -> NodeId {
        let id = self.alloc(node);
        self.add_child(parent, id);
        id
    }

    pub fn add_line(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        self.append(parent, TemplateNode::line(text))
    }

    pub fn add_comment(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        self.append(parent, TemplateNode::comment(text))
    }

    /// Reorder `parent`'s children. `order` must be a permutation of them.
    pub fn reorder_children(&mut self, parent: NodeId, order: Vec<NodeId>) {
        debug_assert_eq!(order.len(), self.children(parent).len());
        self.node_mut(parent).children = order;
    }

    /// Record a modifier. Method nodes may turn it into a decorator first.
    pub fn add_modifier(&mut self, id: NodeId, name: &str, settings: &EmitSettings) {
        if self.kind(id) == NodeKind::Method {
            self.add_method_modifier(id, name, settings);
        }
        self.node_mut(id).modifiers.insert(name.to_string());
    }

    pub fn add_variable(&mut self, id: NodeId, name: impl Into<String>) {
        self.node_mut(id).variables.push(name.into());
    }

    /// Whether `name` is declared in `id` or any enclosing node.
    pub fn is_declared(&self, id: NodeId, name: &str) -> bool {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .any(|scope| self.node(scope).variables.iter().any(|var| var == name))
    }

    pub fn add_base(&mut self, id: NodeId, base: impl Into<String>) {
        match &mut self.node_mut(id).data {
            NodeData::Class { bases } => bases.push(base.into()),
            other => warn!(kind = other.kind().name(), "base class on non-class node ignored"),
        }
    }

    /// Set the header expression of a statement node.
    pub fn set_header(&mut self, id: NodeId, expr: Expression) {
        match &mut self.node_mut(id).data {
            NodeData::Statement { header, .. } => *header = Some(expr),
            other => warn!(kind = other.kind().name(), "header on non-statement node ignored"),
        }
    }

    /// Mark `id` finished. Returns `false` if it already was.
    pub(crate) fn mark_finished(&mut self, id: NodeId) -> bool {
        let node = self.node_mut(id);
        !std::mem::replace(&mut node.finished, true)
    }

    // =========================================================================
    // Emission
    // =========================================================================

    /// Render `id` and its subtree into a string, starting at level zero.
    pub fn emit_to_string(&self, id: NodeId, settings: &EmitSettings) -> String {
        let mut writer = SourceWriter::new();
        self.emit(id, &mut writer, 0, settings);
        writer.finish()
    }

    /// Write `id` and its subtree to `out` at indentation `level`.
    pub fn emit(&self, id: NodeId, out: &mut SourceWriter, level: usize, settings: &EmitSettings) {
        let kind = self.kind(id);
        if kind == NodeKind::Method {
            self.emit_method(id, out, level, settings);
            return;
        }

        let indent = settings.indent(level);
        for line in self.prologue(id, settings).into_iter().flatten() {
            out.write_line(&indent, &line);
        }
        self.emit_body(id, out, level + kind.body_offset(), settings);
        for line in self.epilogue(id, settings).into_iter().flatten() {
            out.write_line(&indent, &line);
        }
    }

    /// Write the children of `id` at `level`, or the empty-body placeholder.
    pub(crate) fn emit_body(
        &self,
        id: NodeId,
        out: &mut SourceWriter,
        level: usize,
        settings: &EmitSettings,
    ) {
        let node = self.node(id);
        if node.children.is_empty() && node.kind().requires_body() {
            out.write_line(&settings.indent(level), EMPTY_BODY);
            return;
        }
        for &child in &node.children {
            self.emit(child, out, level, settings);
        }
    }

    /// Lines written before the body. `None` entries are skipped.
    fn prologue(&self, id: NodeId, settings: &EmitSettings) -> Vec<Option<String>> {
        let node = self.node(id);
        match &node.data {
            NodeData::Module => settings.module_preamble.iter().cloned().map(Some).collect(),
            NodeData::Class { bases } => {
                let mut lines: Vec<Option<String>> = node
                    .modifiers
                    .iter()
                    .map(|modifier| modifier.starts_with('@').then(|| modifier.clone()))
                    .collect();
                let name = node.name.as_deref().unwrap_or_default();
                lines.push(Some(if bases.is_empty() {
                    format!("class {name}:")
                } else {
                    format!("class {name}({}):", bases.join(", "))
                }));
                lines
            }
            NodeData::Statement { keyword, header } => {
                let line = match header {
                    Some(header) => {
                        Expression::new(keyword.as_str(), header.clone(), Format::LeftSpaceRightColon)
                    }
                    None => Expression::new(keyword.as_str(), "", Format::LeftColon),
                };
                vec![Some(line.render())]
            }
            NodeData::Line(text) => vec![Some(text.clone())],
            NodeData::Comment(text) => text
                .split('\n')
                .map(|line| Some(format!("{}{line}", settings.comment_prefix)))
                .collect(),
            NodeData::Method { .. } | NodeData::Block => vec![None],
        }
    }

    /// Lines written after the body. `None` entries are skipped.
    fn epilogue(&self, id: NodeId, settings: &EmitSettings) -> Vec<Option<String>> {
        match &self.node(id).data {
            NodeData::Module => settings.module_epilogue.iter().cloned().map(Some).collect(),
            _ => vec![None],
        }
    }

    // =========================================================================
    // Debug Representation
    // =========================================================================

    pub fn describe(&self, id: NodeId) -> String {
        self.node(id).describe()
    }

    /// Indented debug listing of `id` and its subtree.
    pub fn dump_repr(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.dump_repr_into(id, 0, &mut out);
        out
    }

    fn dump_repr_into(&self, id: NodeId, level: usize, out: &mut String) {
        out.push_str(&REPR_INDENT.repeat(level));
        out.push_str(&self.describe(id));
        out.push('\n');
        if let NodeData::Method { parameters, .. } = &self.node(id).data {
            for param in parameters {
                out.push_str(&REPR_INDENT.repeat(level + 1));
                out.push_str(&format!("parameter type:{} name:{}\n", param.ty, param.name));
            }
        }
        for &child in self.children(id) {
            self.dump_repr_into(child, level + 1, out);
        }
    }
}

#[cfg(test)]
#[path = "../tests/template_tests.rs"]
mod template_tests;
