//! JSON event streams and their replay onto a [`BuildStack`].
//!
//! A stream is a JSON array of objects tagged by `"event"`:
//!
//! ```json
//! [
//!   { "event": "class", "name": "Box", "modifiers": ["public"] },
//!   { "event": "method", "name": "getValue", "modifiers": ["public"] },
//!   { "event": "return", "expr": "self.value" },
//!   { "event": "pop" },
//!   { "event": "pop" }
//! ]
//! ```
//!
//! Closing events that complete an open construct (`whileFinish`,
//! `doFinish`, `exceptClause`) apply to the current node. `forFinish`
//! applies to the innermost counted `for` loop still awaiting its updates.

use anyhow::{Context, Result, bail};
use j2py_emitter::{
    BuildStack, ExceptClause, LoopHandles, Modifier, ParamDecl, VariableDecl,
};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Event {
    Package {
        name: String,
    },
    Comment {
        text: String,
    },
    Import {
        name: String,
        #[serde(default, rename = "static")]
        is_static: bool,
        #[serde(default)]
        star: bool,
    },
    Class {
        name: String,
        #[serde(default)]
        modifiers: Vec<Modifier>,
        #[serde(default)]
        extends: Vec<String>,
        #[serde(default)]
        implements: Vec<String>,
    },
    Enum {
        name: String,
        #[serde(default)]
        modifiers: Vec<Modifier>,
        #[serde(default)]
        constants: Vec<String>,
    },
    AnnotationType {
        name: String,
        #[serde(default)]
        modifiers: Vec<Modifier>,
    },
    AnnotationMethod {
        name: String,
        #[serde(default)]
        modifiers: Vec<Modifier>,
        #[serde(default)]
        default: Option<String>,
    },
    Method {
        name: String,
        #[serde(default)]
        return_type: Option<String>,
        #[serde(default)]
        modifiers: Vec<Modifier>,
        #[serde(default)]
        params: Vec<ParamDecl>,
        #[serde(default)]
        pop: bool,
    },
    Variables {
        decls: Vec<VariableDecl>,
        #[serde(default)]
        apply_type: Option<String>,
    },
    Assign {
        #[serde(default = "default_assign_op")]
        op: String,
        left: String,
        right: String,
    },
    Return {
        #[serde(default)]
        expr: Option<String>,
    },
    Break {
        #[serde(default)]
        label: Option<String>,
    },
    Continue {
        #[serde(default)]
        label: Option<String>,
    },
    Throw {
        expr: String,
    },
    Assert {
        condition: String,
        #[serde(default)]
        message: Option<String>,
    },
    Expression {
        expr: String,
    },
    If {
        condition: String,
    },
    ElseIf {
        condition: String,
    },
    Else,
    While,
    WhileFinish {
        condition: String,
        #[serde(default = "default_pop")]
        pop: bool,
    },
    ForEach {
        #[serde(rename = "type", default)]
        ty: String,
        ident: String,
        iterable: String,
    },
    For {
        #[serde(default)]
        init: Vec<String>,
        #[serde(default)]
        condition: Option<String>,
    },
    ForFinish {
        #[serde(default)]
        updates: Vec<String>,
        #[serde(default = "default_pop")]
        pop: bool,
    },
    Do,
    DoFinish {
        condition: String,
        #[serde(default = "default_pop")]
        pop: bool,
    },
    Try,
    Except,
    ExceptClause {
        #[serde(rename = "type")]
        ty: String,
        name: String,
        #[serde(default)]
        pop: bool,
    },
    Finally,
    Pop,
}

fn default_assign_op() -> String {
    "=".to_string()
}

fn default_pop() -> bool {
    true
}

impl Event {
    /// The `"event"` tag, for diagnostics.
    pub fn tag(&self) -> &'static str {
        match self {
            Event::Package { .. } => "package",
            Event::Comment { .. } => "comment",
            Event::Import { .. } => "import",
            Event::Class { .. } => "class",
            Event::Enum { .. } => "enum",
            Event::AnnotationType { .. } => "annotationType",
            Event::AnnotationMethod { .. } => "annotationMethod",
            Event::Method { .. } => "method",
            Event::Variables { .. } => "variables",
            Event::Assign { .. } => "assign",
            Event::Return { .. } => "return",
            Event::Break { .. } => "break",
            Event::Continue { .. } => "continue",
            Event::Throw { .. } => "throw",
            Event::Assert { .. } => "assert",
            Event::Expression { .. } => "expression",
            Event::If { .. } => "if",
            Event::ElseIf { .. } => "elseIf",
            Event::Else => "else",
            Event::While => "while",
            Event::WhileFinish { .. } => "whileFinish",
            Event::ForEach { .. } => "forEach",
            Event::For { .. } => "for",
            Event::ForFinish { .. } => "forFinish",
            Event::Do => "do",
            Event::DoFinish { .. } => "doFinish",
            Event::Try => "try",
            Event::Except => "except",
            Event::ExceptClause { .. } => "exceptClause",
            Event::Finally => "finally",
            Event::Pop => "pop",
        }
    }
}

pub fn parse_events(source: &str) -> Result<Vec<Event>> {
    serde_json::from_str(source).context("failed to parse event stream")
}

/// Applies events to a build stack in order.
pub struct Replayer<'a> {
    stack: &'a mut BuildStack,
    counted_loops: Vec<LoopHandles>,
}

impl<'a> Replayer<'a> {
    pub fn new(stack: &'a mut BuildStack) -> Self {
        Replayer {
            stack,
            counted_loops: Vec::new(),
        }
    }

    pub fn replay(&mut self, events: &[Event]) -> Result<()> {
        for (index, event) in events.iter().enumerate() {
            self.apply(event)
                .with_context(|| format!("event {index} (`{}`)", event.tag()))?;
        }
        debug!(events = events.len(), "replayed event stream");
        Ok(())
    }

    pub fn apply(&mut self, event: &Event) -> Result<()> {
        let stack = &mut *self.stack;
        match event {
            Event::Package { name } => stack.on_package_decl(name),
            Event::Comment { text } => {
                stack.on_comment(text)?;
            }
            Event::Import {
                name,
                is_static,
                star,
            } => stack.on_import_decl(name, *is_static, *star),
            Event::Class {
                name,
                modifiers,
                extends,
                implements,
            } => {
                stack.on_class(name, modifiers, extends, implements);
            }
            Event::Enum {
                name,
                modifiers,
                constants,
            } => {
                stack.on_enum(name, modifiers, constants);
            }
            Event::AnnotationType { name, modifiers } => {
                stack.on_annotation_type(name, modifiers);
            }
            Event::AnnotationMethod {
                name,
                modifiers,
                default,
            } => {
                stack.on_annotation_method(name, modifiers, default.as_deref())?;
            }
            Event::Method {
                name,
                return_type,
                modifiers,
                params,
                pop,
            } => {
                stack.on_method(name, return_type.as_deref(), modifiers, params, *pop)?;
            }
            Event::Variables { decls, apply_type } => {
                stack.on_variables(decls, apply_type.as_deref());
            }
            Event::Assign { op, left, right } => stack.on_assign(op, left, right),
            Event::Return { expr } => stack.on_return(expr.as_deref()),
            Event::Break { label } => stack.on_break(label.as_deref()),
            Event::Continue { label } => stack.on_continue(label.as_deref()),
            Event::Throw { expr } => stack.on_throw(expr),
            Event::Assert { condition, message } => {
                stack.on_assert(condition, message.as_deref());
            }
            Event::Expression { expr } => stack.on_expression(expr),
            Event::If { condition } => {
                stack.on_if(condition);
            }
            Event::ElseIf { condition } => {
                stack.on_else_if(condition);
            }
            Event::Else => {
                stack.on_else();
            }
            Event::While => {
                stack.on_while();
            }
            Event::WhileFinish { condition, pop } => {
                let current = stack.current();
                stack.on_while_finish(current, condition, *pop)?;
            }
            Event::ForEach {
                ty,
                ident,
                iterable,
            } => {
                stack.on_for_each(ty, ident, iterable);
            }
            Event::For { init, condition } => {
                let handles = stack.on_for(init, condition.as_deref());
                self.counted_loops.push(handles);
            }
            Event::ForFinish { updates, pop } => {
                let Some(handles) = self.counted_loops.pop() else {
                    bail!("no counted `for` loop is awaiting its updates");
                };
                stack.on_for_finish(handles, updates, *pop)?;
            }
            Event::Do => {
                stack.on_do();
            }
            Event::DoFinish { condition, pop } => {
                let current = stack.current();
                stack.on_do_finish(current, condition, *pop)?;
            }
            Event::Try => {
                stack.on_try();
            }
            Event::Except => {
                stack.on_except();
            }
            Event::ExceptClause { ty, name, pop } => {
                let current = stack.current();
                let clause = ExceptClause {
                    ty: ty.clone(),
                    name: name.clone(),
                };
                stack.on_except_clause(current, &clause, *pop)?;
            }
            Event::Finally => {
                stack.on_finally();
            }
            Event::Pop => {
                stack.pop()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/events_tests.rs"]
mod events_tests;
