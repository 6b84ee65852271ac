//! Named handlers and the per-kind handler pipeline.
//!
//! Two handler categories exist:
//!
//! - **finishing** handlers mutate a node once, when its scope closes
//!   (`{kind}Handlers` settings),
//! - **output** handlers rewrite the text rendered for a node
//!   (`{kind}OutputHandlers` settings).
//!
//! Chains are read from the combined configuration (every layer's entries, in
//! layer order) and resolved to function pointers once per run by
//! [`HandlerPipeline::resolve`]. An unknown name, a handler of the wrong
//! category or a non-string entry is a [`BuildError`] at that point, before
//! any node is built.

use std::fmt;

use j2py_common::{Config, keys};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::error::BuildError;
use crate::settings::EmitSettings;
use crate::template::{NodeId, NodeKind, TemplateTree};

pub mod classes;
pub mod common;
pub mod methods;
pub mod modules;
pub mod output;

/// Mutates a node when its scope closes.
pub type FinishHandler = fn(&mut TemplateTree, NodeId, &EmitSettings) -> Result<(), HandlerError>;

/// Rewrites the text rendered for a node.
pub type OutputHandler = fn(&TemplateTree, NodeId, String) -> Result<String, HandlerError>;

#[derive(Debug, Clone, Copy)]
pub enum Handler {
    Finish(FinishHandler),
    Output(OutputHandler),
}

impl Handler {
    pub fn category(&self) -> &'static str {
        match self {
            Handler::Finish(_) => "finishing",
            Handler::Output(_) => "output",
        }
    }
}

/// Failure reported by a handler body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        HandlerError {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HandlerError {}

// =============================================================================
// Registry
// =============================================================================

static BUILTIN: Lazy<HandlerRegistry> = Lazy::new(HandlerRegistry::with_builtins);

/// Handler name -> handler.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    handlers: FxHashMap<String, Handler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        HandlerRegistry::default()
    }

    /// Shared registry holding the built-in handlers.
    pub fn builtin() -> &'static HandlerRegistry {
        &BUILTIN
    }

    pub fn with_builtins() -> Self {
        let mut registry = HandlerRegistry::new();
        registry.register("classes.fixBaseClasses", Handler::Finish(classes::fix_base_classes));
        registry.register(
            "classes.fixOverloadMethods",
            Handler::Finish(classes::fix_overload_methods),
        );
        registry.register(
            "classes.sortClassMethods",
            Handler::Finish(classes::sort_class_methods),
        );
        registry.register("classes.fixCtor", Handler::Finish(classes::fix_ctor));
        registry.register("classes.fixPropMethods", Handler::Finish(classes::fix_prop_methods));
        registry.register("classes.insertModifiers", Handler::Finish(common::insert_modifiers));
        registry.register("methods.insertReturn", Handler::Finish(methods::insert_return));
        registry.register("methods.insertModifiers", Handler::Finish(common::insert_modifiers));
        registry.register("common.simpleDocString", Handler::Finish(common::simple_doc_string));
        registry.register("common.simpleComments", Handler::Finish(common::simple_comments));
        registry.register("modules.ifMainScript", Handler::Finish(modules::if_main_script));
        registry.register(
            "output.stripTrailingWhitespace",
            Handler::Output(output::strip_trailing_whitespace),
        );
        registry.register(
            "output.collapseBlankLines",
            Handler::Output(output::collapse_blank_lines),
        );
        registry
    }

    /// Register `handler` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, handler: Handler) {
        self.handlers.insert(name.into(), handler);
    }

    pub fn get(&self, name: &str) -> Option<Handler> {
        self.handlers.get(name).copied()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Resolved handler chains for every node kind.
#[derive(Debug, Clone, Default)]
pub struct HandlerPipeline {
    finishing: FxHashMap<NodeKind, Vec<(String, FinishHandler)>>,
    output: FxHashMap<NodeKind, Vec<(String, OutputHandler)>>,
}

impl HandlerPipeline {
    pub fn resolve(config: &Config, registry: &HandlerRegistry) -> Result<Self, BuildError> {
        let mut pipeline = HandlerPipeline::default();
        for kind in NodeKind::ALL {
            let finishing = resolve_chain(
                config,
                registry,
                &kind.config_key(keys::HANDLERS),
                "finishing",
                |handler| match handler {
                    Handler::Finish(f) => Some(f),
                    Handler::Output(_) => None,
                },
            )?;
            let output = resolve_chain(
                config,
                registry,
                &kind.config_key(keys::OUTPUT_HANDLERS),
                "output",
                |handler| match handler {
                    Handler::Output(f) => Some(f),
                    Handler::Finish(_) => None,
                },
            )?;
            if !finishing.is_empty() || !output.is_empty() {
                debug!(
                    kind = kind.name(),
                    finishing = finishing.len(),
                    output = output.len(),
                    "resolved handler chains"
                );
            }
            pipeline.finishing.insert(kind, finishing);
            pipeline.output.insert(kind, output);
        }
        Ok(pipeline)
    }

    pub fn finishing(&self, kind: NodeKind) -> &[(String, FinishHandler)] {
        self.finishing.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn output(&self, kind: NodeKind) -> &[(String, OutputHandler)] {
        self.output.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    /// Run the finishing chain for `id`, at most once per node.
    ///
    /// Returns `Ok(false)` without running anything if the node was already
    /// finished.
    pub fn finish(
        &self,
        tree: &mut TemplateTree,
        id: NodeId,
        settings: &EmitSettings,
    ) -> Result<bool, BuildError> {
        if !tree.mark_finished(id) {
            trace!(node = %tree.describe(id), "already finished");
            return Ok(false);
        }
        for (name, handler) in self.finishing(tree.kind(id)) {
            trace!(handler = %name, node = %tree.describe(id), "finishing handler");
            handler(tree, id, settings).map_err(|err| BuildError::HandlerFailed {
                handler: name.clone(),
                node: tree.describe(id),
                message: err.to_string(),
            })?;
        }
        Ok(true)
    }

    /// Emit `id` and pass the text through its kind's output chain.
    pub fn render(
        &self,
        tree: &TemplateTree,
        id: NodeId,
        settings: &EmitSettings,
    ) -> Result<String, BuildError> {
        let text = tree.emit_to_string(id, settings);
        self.output(tree.kind(id))
            .iter()
            .try_fold(text, |text, (name, handler)| {
                handler(tree, id, text).map_err(|err| BuildError::HandlerFailed {
                    handler: name.clone(),
                    node: tree.describe(id),
                    message: err.to_string(),
                })
            })
    }
}

fn resolve_chain<T>(
    config: &Config,
    registry: &HandlerRegistry,
    setting: &str,
    expected: &'static str,
    select: fn(Handler) -> Option<T>,
) -> Result<Vec<(String, T)>, BuildError> {
    config
        .combined(setting)
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let name = entry
                .as_str()
                .ok_or_else(|| BuildError::MalformedHandlerEntry {
                    setting: setting.to_string(),
                    index,
                    found: entry.type_name(),
                })?;
            let handler = registry
                .get(name)
                .ok_or_else(|| BuildError::UnknownHandler {
                    setting: setting.to_string(),
                    name: name.to_string(),
                })?;
            let selected = select(handler).ok_or_else(|| BuildError::MisplacedHandler {
                setting: setting.to_string(),
                name: name.to_string(),
                expected,
            })?;
            Ok((name.to_string(), selected))
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/handlers_tests.rs"]
mod handlers_tests;
