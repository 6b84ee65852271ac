//! Settings resolved once per translation run.
//!
//! Emitters and handlers never consult the layered [`Config`] directly while
//! rendering; [`EmitSettings::from_config`] reads every scalar and name map up
//! front so that a run is deterministic and handlers can be tested against a
//! plain settings value.

use j2py_common::limits::{
    DEFAULT_COMMENT_PREFIX, DEFAULT_INDENT_WIDTH, DEFAULT_MIN_INDENT_PARAMS,
    DEFAULT_TYPE_BOUND_DECORATOR,
};
use j2py_common::{Config, keys};
use rustc_hash::FxHashMap;
use tracing::trace;

/// A rename table built from a combined pair setting.
///
/// Entries from more specific layers replace entries for the same key from
/// the layers below them. Names without an entry pass through unchanged.
#[derive(Debug, Clone, Default)]
pub struct NameMap {
    entries: FxHashMap<String, String>,
}

impl NameMap {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut entries = FxHashMap::default();
        for (key, value) in pairs {
            entries.insert(key, value);
        }
        NameMap { entries }
    }

    pub fn from_config(config: &Config, setting: &str) -> Self {
        NameMap::from_pairs(config.combined_pairs(setting))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// The mapped name, or `name` itself when unmapped.
    pub fn map<'a>(&'a self, name: &'a str) -> &'a str {
        self.get(name).unwrap_or(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Order in which a method's preamble (decorator) lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreambleOrder {
    /// Insertion order.
    #[default]
    Declared,
    Alphabetical,
    Reverse,
}

impl PreambleOrder {
    fn parse(value: &str) -> Self {
        match value {
            "alpha" | "alphabetical" => PreambleOrder::Alphabetical,
            "reverse" => PreambleOrder::Reverse,
            _ => PreambleOrder::Declared,
        }
    }

    pub fn apply(self, lines: &mut [String]) {
        match self {
            PreambleOrder::Declared => {}
            PreambleOrder::Alphabetical => lines.sort(),
            PreambleOrder::Reverse => lines.reverse(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmitSettings {
    /// One level of indentation.
    pub indent_unit: String,
    pub comment_prefix: String,
    /// Parameter count above which declarations use continuation lines.
    pub min_indent_params: usize,
    pub write_modifier_comments: bool,
    pub write_method_docstring: bool,
    pub preamble_order: PreambleOrder,
    pub type_bound_decorator: String,
    pub module_preamble: Vec<String>,
    pub module_epilogue: Vec<String>,
    pub type_map: NameMap,
    /// Initial values for declarations without an initializer.
    pub type_values: NameMap,
    pub rename_method: NameMap,
    pub rename_any: NameMap,
    pub modifier_decorators: NameMap,
    pub variable_names: NameMap,
    pub exception_types: NameMap,
}

impl EmitSettings {
    pub fn from_config(config: &Config) -> Self {
        let indent_width = config.last_usize(keys::INDENT, DEFAULT_INDENT_WIDTH);
        EmitSettings {
            indent_unit: " ".repeat(indent_width),
            comment_prefix: config
                .last_str(keys::COMMENT_PREFIX, DEFAULT_COMMENT_PREFIX)
                .to_string(),
            min_indent_params: config.last_usize(keys::MIN_INDENT_PARAMS, DEFAULT_MIN_INDENT_PARAMS),
            write_modifier_comments: config.last_bool(keys::WRITE_MODIFIERS_COMMENTS, false),
            write_method_docstring: config.last_bool(keys::WRITE_METHOD_DOC_STRING, false),
            preamble_order: PreambleOrder::parse(config.last_str(keys::METHOD_PREAMBLE_SORTER, "")),
            type_bound_decorator: config
                .last_str(keys::TYPE_BOUND_DECORATOR, DEFAULT_TYPE_BOUND_DECORATOR)
                .to_string(),
            module_preamble: config.combined_texts(keys::MODULE_PREAMBLE),
            module_epilogue: config.combined_texts(keys::MODULE_EPILOGUE),
            type_map: NameMap::from_config(config, keys::TYPE_TYPE_MAP),
            type_values: NameMap::from_config(config, keys::TYPE_VALUE_MAP),
            rename_method: NameMap::from_config(config, keys::RENAME_METHOD_MAP),
            rename_any: NameMap::from_config(config, keys::RENAME_ANY_MAP),
            modifier_decorators: NameMap::from_config(config, keys::MODIFIER_DECORATOR_MAP),
            variable_names: NameMap::from_config(config, keys::VARIABLE_NAME_MAPPING),
            exception_types: NameMap::from_config(config, keys::EXCEPTION_TYPE_MAPPING),
        }
    }

    /// Settings resolved from the built-in default layer alone.
    pub fn defaults() -> Self {
        EmitSettings::from_config(&Config::with_defaults())
    }

    /// Indentation prefix for `level`.
    pub fn indent(&self, level: usize) -> String {
        self.indent_unit.repeat(level)
    }

    /// Method-name mapping first, then the general rename map.
    pub fn method_name(&self, name: &str) -> String {
        match self.rename_method.get(name) {
            Some(mapped) => mapped.to_string(),
            None => self.any_name(name),
        }
    }

    pub fn any_name(&self, name: &str) -> String {
        self.rename_any.map(name).to_string()
    }

    pub fn type_name(&self, ty: &str) -> String {
        let mapped = self.type_map.map(ty);
        if mapped == ty {
            trace!(ty, "type has no mapping; passing through");
        }
        mapped.to_string()
    }

    /// Value bound to an uninitialized declaration of type `ty`.
    ///
    /// The value map is consulted for the source type, then for the mapped
    /// type; otherwise the mapped type is instantiated.
    pub fn default_value(&self, ty: &str) -> String {
        if let Some(value) = self.type_values.get(ty) {
            return value.to_string();
        }
        let mapped = self.type_name(ty);
        match self.type_values.get(&mapped) {
            Some(value) => value.to_string(),
            None => format!("{mapped}()"),
        }
    }

    /// Rename a declared local that collides with a reserved word or builtin.
    pub fn variable_name(&self, name: &str) -> String {
        self.variable_names.map(name).to_string()
    }

    pub fn exception_type(&self, ty: &str) -> String {
        self.exception_types.map(ty).to_string()
    }
}
