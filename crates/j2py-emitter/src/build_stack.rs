//! Event-driven tree assembly.
//!
//! The front end walks the parsed source depth first and calls one `on_*`
//! method per construct. Each event does some of the following: creates a
//! node through the [`TypeRegistry`], mutates the current node, pushes the new
//! node, or pops the current one. The stack always holds the root module at
//! its bottom; new children attach to the top of the stack.
//!
//! Popping a node runs its kind's finishing handlers exactly once. Nodes that
//! are never pushed are finished alongside the construct that owns them: the
//! `if not ...: break` tail of a do-while when the loop's closing event
//! arrives, and the wrapper block of a `for` loop when its loop statement
//! pops.
//!
//! Constructs whose closing event carries a `pop` flag (`on_method`,
//! `on_while_finish`, ...) pop only when the flag is set; the front end clears
//! it when it still has to add members to the node.

use j2py_common::Config;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::error::BuildError;
use crate::expression::{Expression, Format};
use crate::handlers::{HandlerPipeline, HandlerRegistry};
use crate::payload::{ExceptClause, Initializer, Modifier, ParamDecl, VariableDecl};
use crate::registry::TypeRegistry;
use crate::rewriter::OutputRewriter;
use crate::settings::EmitSettings;
use crate::template::{NodeId, NodeKind, TemplateTree};
use crate::translation::Translation;

/// Nodes produced for a `for` loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopHandles {
    /// Transparent block holding the loop's initializers and the loop itself.
    pub block: NodeId,
    /// The loop statement; pushed and current after the event.
    pub statement: NodeId,
}

/// Operators that make a negated condition need parentheses.
const LOOSE_OPERATORS: &[&str] = &[" and ", " or ", " if ", "lambda "];

#[derive(Debug)]
pub struct BuildStack {
    tree: TemplateTree,
    stack: Vec<NodeId>,
    root: NodeId,
    settings: EmitSettings,
    types: TypeRegistry,
    pipeline: HandlerPipeline,
    rewriter: OutputRewriter,
    /// Open `for` loop statements and the wrapper blocks that close with them.
    loop_blocks: FxHashMap<NodeId, NodeId>,
}

impl BuildStack {
    /// A stack using the standard node constructors and built-in handlers.
    pub fn new(config: &Config) -> Result<Self, BuildError> {
        BuildStack::with_registries(config, TypeRegistry::standard().clone(), HandlerRegistry::builtin())
    }

    pub fn with_registries(
        config: &Config,
        types: TypeRegistry,
        handlers: &HandlerRegistry,
    ) -> Result<Self, BuildError> {
        let settings = EmitSettings::from_config(config);
        let pipeline = HandlerPipeline::resolve(config, handlers)?;
        let rewriter = OutputRewriter::from_config(config)?;

        let mut tree = TemplateTree::new();
        let root = tree.alloc(types.create(NodeKind::Module.name(), None));
        debug!(layers = config.layers().len(), "build stack ready");

        Ok(BuildStack {
            tree,
            stack: vec![root],
            root,
            settings,
            types,
            pipeline,
            rewriter,
            loop_blocks: FxHashMap::default(),
        })
    }

    // =========================================================================
    // Stack
    // =========================================================================

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The node new children attach to.
    pub fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(self.root)
    }

    /// Number of open scopes, root included.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn tree(&self) -> &TemplateTree {
        &self.tree
    }

    pub fn settings(&self) -> &EmitSettings {
        &self.settings
    }

    pub fn push(&mut self, id: NodeId) {
        trace!(depth = self.stack.len(), node = %self.tree.describe(id), "push");
        self.stack.push(id);
    }

    /// Close the current scope and run its finishing handlers.
    pub fn pop(&mut self) -> Result<NodeId, BuildError> {
        if self.stack.len() <= 1 {
            return Err(BuildError::StackUnderflow {
                construct: self.tree.describe(self.root),
            });
        }
        let id = self.current();
        self.stack.pop();
        trace!(depth = self.stack.len(), node = %self.tree.describe(id), "pop");
        self.pipeline.finish(&mut self.tree, id, &self.settings)?;
        if let Some(block) = self.loop_blocks.remove(&id) {
            self.pipeline.finish(&mut self.tree, block, &self.settings)?;
        }
        Ok(id)
    }

    fn pop_if(&mut self, pop: bool) -> Result<(), BuildError> {
        if pop {
            self.pop()?;
        }
        Ok(())
    }

    /// Close the root and hand the tree over for rendering.
    ///
    /// Every scope but the root must have been popped.
    pub fn finish(mut self) -> Result<Translation, BuildError> {
        if self.stack.len() > 1 {
            let open = self.stack[1..]
                .iter()
                .map(|&id| self.tree.describe(id))
                .collect();
            return Err(BuildError::UnclosedScopes { open });
        }
        self.pipeline.finish(&mut self.tree, self.root, &self.settings)?;
        debug!(nodes = self.tree.len(), "tree complete");
        Ok(Translation::new(
            self.tree,
            self.root,
            self.settings,
            self.pipeline,
            self.rewriter,
        ))
    }

    // =========================================================================
    // Node Helpers
    // =========================================================================

    /// Create a node of `kind` under the current node.
    fn open(&mut self, kind: &str, name: Option<String>) -> NodeId {
        let node = self.types.create(kind, name);
        let parent = self.current();
        self.tree.append(parent, node)
    }

    fn open_statement(&mut self, parent: NodeId, keyword: &str, header: Option<Expression>) -> NodeId {
        let node = self.types.create(NodeKind::Statement.name(), Some(keyword.to_string()));
        let id = self.tree.append(parent, node);
        if let Some(header) = header {
            self.tree.set_header(id, header);
        }
        id
    }

    fn line(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        let node = self.types.create(NodeKind::Line.name(), Some(text.into()));
        self.tree.append(parent, node)
    }

    fn comment(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        let node = self.types.create(NodeKind::Comment.name(), Some(text.into()));
        self.tree.append(parent, node)
    }

    /// Add a source line to the current node.
    pub fn add_source(&mut self, text: impl Into<String>) -> NodeId {
        let parent = self.current();
        self.line(parent, text)
    }

    fn add_modifiers(&mut self, id: NodeId, modifiers: &[Modifier]) {
        for modifier in modifiers {
            self.tree
                .add_modifier(id, &modifier.recorded_name(), &self.settings);
        }
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    pub fn on_package_decl(&mut self, name: &str) {
        debug!(name, "package");
        let parent = self.current();
        self.comment(parent, format!("namespace_packages('{name}')"));
    }

    /// Imports are recorded as comments in target syntax: a static import of
    /// a member reads `from Owner import member`.
    pub fn on_import_decl(&mut self, name: &str, is_static: bool, is_star: bool) {
        debug!(name, is_static, is_star, "import");
        let text = match (is_static, is_star, name.rsplit_once('.')) {
            (true, true, _) => format!("from {name} import *"),
            (true, false, Some((owner, member))) => format!("from {owner} import {member}"),
            (false, true, _) => format!("import {name}.*"),
            _ => format!("import {name}"),
        };
        let parent = self.current();
        self.comment(parent, text);
    }

    /// Open a class scope. Base types are mapped through the type mapping.
    pub fn on_class(
        &mut self,
        name: &str,
        modifiers: &[Modifier],
        extends: &[String],
        implements: &[String],
    ) -> NodeId {
        debug!(name, "class");
        let id = self.open(NodeKind::Class.name(), Some(name.to_string()));
        self.add_modifiers(id, modifiers);
        for base in extends.iter().chain(implements) {
            let base = self.settings.type_name(base);
            self.tree.add_base(id, base);
        }
        self.push(id);
        id
    }

    /// Open a class scope for an enum: one integer constant per member.
    pub fn on_enum(&mut self, name: &str, modifiers: &[Modifier], constants: &[String]) -> NodeId {
        let id = self.on_class(name, modifiers, &[], &[]);
        for (index, constant) in constants.iter().enumerate() {
            self.line(id, format!("{constant} = {index}"));
            self.tree.add_variable(id, constant.as_str());
        }
        id
    }

    /// Open a class scope for an annotation type declaration.
    pub fn on_annotation_type(&mut self, name: &str, modifiers: &[Modifier]) -> NodeId {
        let root_type = self.settings.type_name("Object");
        self.on_class(name, modifiers, &[root_type], &[])
    }

    /// Create a method under the current node and push it.
    ///
    /// With `pop` set the method closes immediately (abstract and interface
    /// methods have no body events).
    pub fn on_method(
        &mut self,
        name: &str,
        return_type: Option<&str>,
        modifiers: &[Modifier],
        params: &[ParamDecl],
        pop: bool,
    ) -> Result<NodeId, BuildError> {
        debug!(name, params = params.len(), pop, "method");
        let id = self.open(NodeKind::Method.name(), Some(name.to_string()));
        self.tree.node_mut(id).declared_type = return_type.map(str::to_string);
        self.add_modifiers(id, modifiers);
        for param in params {
            if param.variadic {
                self.tree
                    .add_variadic_parameter(id, &param.ty, &param.name, &self.settings);
            } else {
                self.tree.add_parameter(id, &param.ty, &param.name, &self.settings);
            }
        }
        self.push(id);
        self.pop_if(pop)?;
        Ok(id)
    }

    /// An annotation-type member: a method returning its default value.
    pub fn on_annotation_method(
        &mut self,
        name: &str,
        modifiers: &[Modifier],
        default: Option<&str>,
    ) -> Result<NodeId, BuildError> {
        let id = self.on_method(name, None, modifiers, &[], false)?;
        if let Some(default) = default {
            self.line(id, format!("return {default}"));
        }
        self.pop()?;
        Ok(id)
    }

    /// Declare variables in the current scope.
    ///
    /// `apply_type` overrides each declaration's own type. A declaration
    /// without an initializer is bound to its type's default value, or to the
    /// null literal when untyped.
    pub fn on_variables(&mut self, decls: &[VariableDecl], apply_type: Option<&str>) {
        let parent = self.current();
        for decl in decls {
            let name = self.settings.variable_name(&decl.name);
            let ty = apply_type.or(decl.ty.as_deref());
            let value = match (&decl.init, ty) {
                (Some(Initializer::Expr(expr)), _) => expr.clone(),
                (Some(Initializer::Call { callee, args }), _) => {
                    let args: Vec<&str> = args.iter().map(String::as_str).collect();
                    self.make_method_expr(Some(callee.as_str()), &args).render()
                }
                (None, Some(ty)) => self.settings.default_value(ty),
                (None, None) => self.settings.any_name("null"),
            };
            trace!(name = %name, value = %value, "variable");
            self.tree.add_variable(parent, name.clone());
            self.line(parent, format!("{name} = {value}"));
        }
    }

    /// A source comment under the current node, run through the comment
    /// handlers right away.
    pub fn on_comment(&mut self, raw: &str) -> Result<NodeId, BuildError> {
        let parent = self.current();
        let id = self.comment(parent, raw);
        self.pipeline.finish(&mut self.tree, id, &self.settings)?;
        Ok(id)
    }

    // =========================================================================
    // Simple Statements
    // =========================================================================

    pub fn on_assign(&mut self, op: &str, left: &str, right: &str) {
        self.add_source(format!("{left} {op} {right}"));
    }

    pub fn on_return(&mut self, expr: Option<&str>) {
        self.add_source(match expr {
            Some(expr) => format!("return {expr}"),
            None => "return".to_string(),
        });
    }

    pub fn on_break(&mut self, label: Option<&str>) {
        self.add_source(labeled("break", label));
    }

    pub fn on_continue(&mut self, label: Option<&str>) {
        self.add_source(labeled("continue", label));
    }

    /// `throw new T(args)` arrives as `T(args)`; `T` goes through the
    /// exception type mapping.
    pub fn on_throw(&mut self, expr: &str) {
        let raised = match expr.split_once('(') {
            Some((ty, args)) => format!("{}({args}", self.settings.exception_type(ty.trim())),
            None => self.settings.exception_type(expr),
        };
        self.add_source(Expression::new("raise", raised, Format::LeftSpaceRight).render());
    }

    pub fn on_assert(&mut self, condition: &str, message: Option<&str>) {
        self.add_source(match message {
            Some(message) => format!("assert {condition}, {message}"),
            None => format!("assert {condition}"),
        });
    }

    /// An expression evaluated for its effect.
    pub fn on_expression(&mut self, expr: &str) {
        self.add_source(expr);
    }

    // =========================================================================
    // Branches
    // =========================================================================

    pub fn on_if(&mut self, condition: &str) -> NodeId {
        self.open_branch("if", Some(condition))
    }

    pub fn on_else_if(&mut self, condition: &str) -> NodeId {
        self.open_branch("elif", Some(condition))
    }

    pub fn on_else(&mut self) -> NodeId {
        self.open_branch("else", None)
    }

    fn open_branch(&mut self, keyword: &str, condition: Option<&str>) -> NodeId {
        debug!(keyword, "branch");
        let parent = self.current();
        let id = self.open_statement(parent, keyword, condition.map(Expression::text));
        self.push(id);
        id
    }

    // =========================================================================
    // Loops
    // =========================================================================

    /// Open a `while` loop. The condition arrives with [`Self::on_while_finish`].
    pub fn on_while(&mut self) -> NodeId {
        debug!("while");
        let parent = self.current();
        let id = self.open_statement(parent, "while", None);
        self.push(id);
        id
    }

    pub fn on_while_finish(&mut self, statement: NodeId, condition: &str, pop: bool) -> Result<(), BuildError> {
        self.tree.set_header(statement, Expression::text(condition));
        self.pop_if(pop)
    }

    /// `for (T x : items)` becomes `for x in items:`.
    ///
    /// The loop closes with a plain [`Self::pop`]; its wrapper block is
    /// finished then.
    pub fn on_for_each(&mut self, ty: &str, ident: &str, iterable: &str) -> LoopHandles {
        debug!(ty, ident, "for each");
        let parent = self.current();
        let block = self.open(NodeKind::Block.name(), None);
        let ident = self.settings.variable_name(ident);
        self.tree.add_variable(parent, ident.clone());
        let header = Expression::new(
            ident,
            Expression::new("in", iterable, Format::LeftSpaceRight),
            Format::LeftSpaceRight,
        );
        let statement = self.open_statement(block, "for", Some(header));
        self.open_loop(block, statement)
    }

    /// A counted `for` loop: initializers, then `while condition:`.
    ///
    /// Update expressions are appended after the body by
    /// [`Self::on_for_finish`].
    pub fn on_for(&mut self, init: &[String], condition: Option<&str>) -> LoopHandles {
        debug!(init = init.len(), "for");
        let block = self.open(NodeKind::Block.name(), None);
        for line in init {
            self.line(block, line.as_str());
        }
        let condition = condition.unwrap_or("True");
        let statement = self.open_statement(block, "while", Some(Expression::text(condition)));
        self.open_loop(block, statement)
    }

    fn open_loop(&mut self, block: NodeId, statement: NodeId) -> LoopHandles {
        self.loop_blocks.insert(statement, block);
        self.push(statement);
        LoopHandles { block, statement }
    }

    pub fn on_for_finish(&mut self, loop_: LoopHandles, updates: &[String], pop: bool) -> Result<(), BuildError> {
        for update in updates {
            self.line(loop_.statement, update.as_str());
        }
        self.pop_if(pop)
    }

    /// Open `while True:`; the exit test is added by [`Self::on_do_finish`].
    pub fn on_do(&mut self) -> NodeId {
        debug!("do");
        let parent = self.current();
        let id = self.open_statement(parent, "while", Some(Expression::text("True")));
        self.push(id);
        id
    }

    /// Append `if not condition: break` as the loop's last statement.
    pub fn on_do_finish(&mut self, statement: NodeId, condition: &str, pop: bool) -> Result<(), BuildError> {
        let test = Expression::new("not", negated_operand(condition), Format::LeftSpaceRight);
        let exit = self.open_statement(statement, "if", Some(test));
        self.line(exit, "break");
        self.pipeline.finish(&mut self.tree, exit, &self.settings)?;
        self.pop_if(pop)
    }

    // =========================================================================
    // Exceptions
    // =========================================================================

    pub fn on_try(&mut self) -> NodeId {
        self.open_branch("try", None)
    }

    /// Open an `except` scope; the caught type arrives with
    /// [`Self::on_except_clause`].
    pub fn on_except(&mut self) -> NodeId {
        self.open_branch("except", None)
    }

    /// `catch (T e)` becomes `except (T,) as e:`.
    pub fn on_except_clause(&mut self, statement: NodeId, clause: &ExceptClause, pop: bool) -> Result<(), BuildError> {
        let ty = self.settings.exception_type(&clause.ty);
        let name = self.settings.variable_name(&clause.name);
        self.tree.add_variable(statement, name.clone());
        let header = Expression::new(
            format!("({ty},)"),
            Expression::new("as", name, Format::LeftSpaceRight),
            Format::LeftSpaceRight,
        );
        self.tree.set_header(statement, header);
        self.pop_if(pop)
    }

    pub fn on_finally(&mut self) -> NodeId {
        self.open_branch("finally", None)
    }

    // =========================================================================
    // Expression Helpers
    // =========================================================================

    pub fn make_param_decl(&self, ty: &str, name: &str, variadic: bool) -> ParamDecl {
        ParamDecl {
            ty: ty.to_string(),
            name: name.to_string(),
            variadic,
        }
    }

    /// A call expression; a missing callee renders as the null literal.
    pub fn make_method_expr(&self, callee: Option<&str>, args: &[&str]) -> Expression {
        let callee = callee
            .map(|callee| self.settings.any_name(callee))
            .unwrap_or_else(|| self.settings.any_name("null"));
        let mut call = Expression::call(callee);
        for arg in args {
            call.push_argument(&self.settings.any_name(arg));
        }
        call
    }

    pub fn make_array_access(&self, primary: &str, index: &str) -> String {
        Expression::new(primary, format!("[{index}]"), Format::LeftRight).render()
    }

    /// Rename an identifier through the general rename mapping.
    pub fn alt_name(&self, name: &str) -> String {
        self.settings.any_name(name)
    }
}

/// Rewrite a floating-point literal for the target: drop the `f`/`d` type
/// suffix and complete a bare leading or trailing dot with a zero.
pub fn fix_float_literal(value: &str) -> String {
    let trimmed = value.trim_end_matches(['f', 'F', 'd', 'D']);
    let mut fixed = if trimmed.starts_with('.') {
        format!("0{trimmed}")
    } else {
        trimmed.to_string()
    };
    if fixed.ends_with('.') {
        fixed.push('0');
    }
    fixed
}

fn labeled(keyword: &str, label: Option<&str>) -> String {
    match label {
        Some(label) => format!("{keyword} # label: {label}"),
        None => keyword.to_string(),
    }
}

fn negated_operand(condition: &str) -> String {
    if LOOSE_OPERATORS.iter().any(|op| condition.contains(op)) {
        format!("({condition})")
    } else {
        condition.to_string()
    }
}

#[cfg(test)]
#[path = "../tests/build_stack_tests.rs"]
mod build_stack_tests;
