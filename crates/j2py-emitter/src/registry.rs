//! Kind name -> node constructor lookup.
//!
//! The build stack never names a concrete node type; it asks the registry for
//! a node of a given kind. A registry must provide the generic `block` kind,
//! which stands in for any kind that has no constructor of its own.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::BuildError;
use crate::template::{NodeKind, TemplateNode};

/// Builds a node from an optional name (class name, method name, keyword).
pub type NodeFactory = fn(Option<String>) -> TemplateNode;

/// Kind every registry must provide.
pub const FALLBACK_KIND: &str = "block";

static STANDARD: Lazy<TypeRegistry> = Lazy::new(TypeRegistry::from_standard);

#[derive(Debug, Clone)]
pub struct TypeRegistry {
    factories: FxHashMap<String, NodeFactory>,
    fallback: NodeFactory,
}

#[derive(Debug, Clone, Default)]
pub struct TypeRegistryBuilder {
    factories: FxHashMap<String, NodeFactory>,
}

impl TypeRegistryBuilder {
    /// Register `factory` for `kind`. Kind names are case-insensitive.
    pub fn register(mut self, kind: &str, factory: NodeFactory) -> Self {
        self.factories.insert(kind.to_ascii_lowercase(), factory);
        self
    }

    /// Register the constructors for every [`NodeKind`].
    pub fn register_standard(mut self) -> Self {
        for kind in NodeKind::ALL {
            self = self.register(kind.name(), standard_factory(kind));
        }
        self
    }

    pub fn build(self) -> Result<TypeRegistry, BuildError> {
        let fallback =
            self.factories
                .get(FALLBACK_KIND)
                .copied()
                .ok_or_else(|| BuildError::MissingFallback {
                    kind: FALLBACK_KIND.to_string(),
                })?;
        for kind in NodeKind::ALL {
            if !self.factories.contains_key(kind.name()) {
                debug!(kind = kind.name(), "kind has no constructor; will use fallback");
            }
        }
        Ok(TypeRegistry {
            factories: self.factories,
            fallback,
        })
    }
}

impl TypeRegistry {
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    /// Shared registry with the standard constructor for every kind.
    pub fn standard() -> &'static TypeRegistry {
        &STANDARD
    }

    fn from_standard() -> Self {
        let mut factories = FxHashMap::default();
        for kind in NodeKind::ALL {
            factories.insert(kind.name().to_string(), standard_factory(kind));
        }
        TypeRegistry {
            factories,
            fallback: make_block,
        }
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(&kind.to_ascii_lowercase())
    }

    /// Registered kind names, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Build a node of `kind`. Unregistered kinds get the generic block
    /// constructor, with `name` kept as the node's name.
    pub fn create(&self, kind: &str, name: Option<String>) -> TemplateNode {
        match self.factories.get(&kind.to_ascii_lowercase()) {
            Some(factory) => factory(name),
            None => {
                debug!(kind, "no constructor registered; using generic block");
                (self.fallback)(Some(name.unwrap_or_else(|| kind.to_string())))
            }
        }
    }
}

fn standard_factory(kind: NodeKind) -> NodeFactory {
    match kind {
        NodeKind::Module => make_module,
        NodeKind::Class => make_class,
        NodeKind::Method => make_method,
        NodeKind::Statement => make_statement,
        NodeKind::Block => make_block,
        NodeKind::Line => make_line,
        NodeKind::Comment => make_comment,
    }
}

fn make_module(_: Option<String>) -> TemplateNode {
    TemplateNode::module()
}

fn make_class(name: Option<String>) -> TemplateNode {
    TemplateNode::class(name.unwrap_or_default())
}

fn make_method(name: Option<String>) -> TemplateNode {
    TemplateNode::method(name.unwrap_or_default())
}

fn make_statement(keyword: Option<String>) -> TemplateNode {
    TemplateNode::statement(keyword.unwrap_or_default())
}

fn make_block(name: Option<String>) -> TemplateNode {
    let node = TemplateNode::block();
    match name {
        Some(name) => node.with_name(name),
        None => node,
    }
}

fn make_line(text: Option<String>) -> TemplateNode {
    TemplateNode::line(text.unwrap_or_default())
}

fn make_comment(text: Option<String>) -> TemplateNode {
    TemplateNode::comment(text.unwrap_or_default())
}

#[cfg(test)]
#[path = "../tests/registry_tests.rs"]
mod registry_tests;
