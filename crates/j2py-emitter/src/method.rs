//! Method-node behavior: parameters, decorator modifiers and the declaration
//! protocol.
//!
//! A method renders as:
//!
//! ```text
//! ## modifiers: public, static        (when modifier comments are enabled)
//! @classmethod                        (preamble, in the configured order)
//! def name(cls, first,
//!               second):              (continuation form above the threshold)
//!     """ generated source ... """    (when method docstrings are enabled)
//!     body...
//!                                     (trailing blank line)
//! ```

use tracing::{trace, warn};

use crate::template::{NodeData, NodeId, Parameter, SourceWriter, TemplateTree};
use crate::settings::EmitSettings;

impl TemplateTree {
    /// Append a parameter to a method, renaming its name and mapping its type.
    ///
    /// The renamed name is also recorded in the method's declared variables.
    pub fn add_parameter(&mut self, id: NodeId, ty: &str, name: &str, settings: &EmitSettings) {
        self.push_parameter(id, ty, name, "", settings);
    }

    /// Append a `*name` parameter. The declared variable is the bare name.
    pub fn add_variadic_parameter(&mut self, id: NodeId, ty: &str, name: &str, settings: &EmitSettings) {
        self.push_parameter(id, ty, name, "*", settings);
    }

    fn push_parameter(&mut self, id: NodeId, ty: &str, name: &str, star: &str, settings: &EmitSettings) {
        let name = settings.variable_name(name);
        let ty = settings.type_name(ty);
        let node = self.node_mut(id);
        match &mut node.data {
            NodeData::Method { parameters, .. } => parameters.push(Parameter::new(ty, format!("{star}{name}"))),
            other => {
                warn!(kind = other.kind().name(), name = %name, "parameter on non-method node ignored");
                return;
            }
        }
        node.variables.push(name);
    }

    /// Decorator handling for a method modifier.
    ///
    /// A modifier with a decorator mapping inserts that decorator into the
    /// preamble once; an unmapped annotation (`@Name(...)`) is its own
    /// decorator. When the decorator is the type-bound decorator and the
    /// first parameter is still the implicit instance parameter, that parameter
    /// becomes the type-bound one. Recording the modifier itself is left to
    /// [`TemplateTree::add_modifier`].
    pub(crate) fn add_method_modifier(&mut self, id: NodeId, name: &str, settings: &EmitSettings) {
        let decorator = match settings.modifier_decorators.get(name) {
            Some(decorator) => decorator,
            None if name.starts_with('@') => name,
            None => return,
        };
        let type_bound = decorator == settings.type_bound_decorator;
        if let NodeData::Method {
            parameters,
            preamble,
        } = &mut self.node_mut(id).data
        {
            if preamble.iter().any(|line| line == decorator) {
                trace!(decorator, "decorator already present");
                return;
            }
            preamble.push(decorator.to_string());
            if type_bound && parameters.first() == Some(&Parameter::instance()) {
                parameters[0] = Parameter::type_bound();
            }
        }
    }

    /// The `def` line(s) for a method at `level`.
    ///
    /// When the parameter count (implicit first parameter included) exceeds
    /// `min_indent_params`, the first parameter stays on the `def` line and
    /// each further one goes on its own line, aligned after the open paren.
    /// A threshold of zero disables the continuation form.
    pub fn format_declaration(&self, id: NodeId, level: usize, settings: &EmitSettings) -> String {
        let node = self.node(id);
        let name = settings.method_name(node.name.as_deref().unwrap_or_default());
        let indent = settings.indent(level);
        let names: Vec<&str> = node.parameters().iter().map(|p| p.name.as_str()).collect();

        let threshold = settings.min_indent_params;
        if threshold == 0 || names.len() <= threshold {
            return format!("{indent}def {name}({}):", names.join(", "));
        }

        let head = format!("{indent}def {name}(");
        let align = " ".repeat(head.chars().count());
        let mut decl = format!("{head}{},", names[0]);
        let rest = &names[1..];
        for (index, param) in rest.iter().enumerate() {
            decl.push('\n');
            decl.push_str(&align);
            decl.push_str(param);
            decl.push_str(if index + 1 == rest.len() { "):" } else { "," });
        }
        decl
    }

    pub(crate) fn emit_method(
        &self,
        id: NodeId,
        out: &mut SourceWriter,
        level: usize,
        settings: &EmitSettings,
    ) {
        let node = self.node(id);
        let indent = settings.indent(level);

        let modifiers: Vec<&str> = node
            .modifiers
            .iter()
            .map(String::as_str)
            .filter(|modifier| !modifier.starts_with('@'))
            .collect();
        if settings.write_modifier_comments && !modifiers.is_empty() {
            out.write_line(
                &indent,
                &format!("{}modifiers: {}", settings.comment_prefix, modifiers.join(", ")),
            );
        }

        let mut preamble = node.preamble().to_vec();
        settings.preamble_order.apply(&mut preamble);
        for line in &preamble {
            out.write_line(&indent, line);
        }

        out.write_raw_line(&self.format_declaration(id, level, settings));

        if settings.write_method_docstring {
            let name = node.name.as_deref().unwrap_or_default();
            out.write_line(
                &settings.indent(level + 1),
                &format!("\"\"\" generated source for method {name} \"\"\""),
            );
        }

        self.emit_body(id, out, level + 1, settings);
        out.blank_line();
    }
}

#[cfg(test)]
#[path = "../tests/method_tests.rs"]
mod method_tests;
