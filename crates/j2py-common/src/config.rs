//! Layered configuration.
//!
//! A [`Config`] is an ordered stack of [`ConfigLayer`]s, base layer first.
//! Every setting is looked up in one of two modes:
//!
//! - **last wins** ([`Config::last`]): the value from the most specific
//!   (last) layer that defines the name. Used for scalar knobs such as the
//!   indent width.
//! - **combined** ([`Config::combined`]): the values of every layer,
//!   concatenated base first with duplicates preserved. Used for name maps,
//!   handler chains and rewrite rules, where each layer extends the ones
//!   below it.
//!
//! Layers are plain data. The built-in defaults live in [`crate::defaults`];
//! user layers are loaded from JSON files (comments and trailing commas
//! allowed) that may name a base file through an `extends` key.

use anyhow::{Context, Result, anyhow, bail};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::limits::MAX_EXTENDS_DEPTH;

/// Key inside a layer file that names the file it extends.
const EXTENDS_KEY: &str = "extends";

// =============================================================================
// Setting Values
// =============================================================================

/// A single configuration value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Text(String),
    List(Vec<SettingValue>),
    Map(IndexMap<String, SettingValue>),
}

impl SettingValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Non-negative integers only.
    pub fn as_usize(&self) -> Option<usize> {
        match self {
            SettingValue::Int(value) => usize::try_from(*value).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[SettingValue]> {
        match self {
            SettingValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// View a two-element text list as a `(key, value)` pair.
    pub fn as_pair(&self) -> Option<(&str, &str)> {
        match self.as_list()? {
            [key, value] => Some((key.as_str()?, value.as_str()?)),
            _ => None,
        }
    }

    /// Short name of the variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            SettingValue::Bool(_) => "bool",
            SettingValue::Int(_) => "integer",
            SettingValue::Text(_) => "text",
            SettingValue::List(_) => "list",
            SettingValue::Map(_) => "map",
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Int(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::Text(value)
    }
}

impl From<Vec<SettingValue>> for SettingValue {
    fn from(items: Vec<SettingValue>) -> Self {
        SettingValue::List(items)
    }
}

// =============================================================================
// Layers
// =============================================================================

/// One override layer: an ordered mapping from setting name to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigLayer {
    name: String,
    settings: IndexMap<String, SettingValue>,
}

impl ConfigLayer {
    pub fn new(name: impl Into<String>) -> Self {
        ConfigLayer {
            name: name.into(),
            settings: IndexMap::new(),
        }
    }

    /// Builder-style `set`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<SettingValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<SettingValue>) {
        self.settings.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.settings.get(key)
    }

    /// Name of the layer (the file path for loaded layers).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.settings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }
}

// =============================================================================
// Config
// =============================================================================

/// Ordered stack of layers; later layers are more specific.
#[derive(Debug, Clone, Default)]
pub struct Config {
    layers: Vec<ConfigLayer>,
}

impl Config {
    /// An empty configuration. Every lookup falls back to its default.
    pub fn new() -> Self {
        Config::default()
    }

    /// A configuration seeded with the built-in default layer.
    pub fn with_defaults() -> Self {
        Config {
            layers: vec![crate::defaults::default_layer()],
        }
    }

    /// Build a configuration from layer files, in order, optionally on top of
    /// the built-in defaults.
    pub fn from_files(paths: &[PathBuf], include_defaults: bool) -> Result<Self> {
        let mut config = if include_defaults {
            Config::with_defaults()
        } else {
            Config::new()
        };
        for path in paths {
            for layer in load_layers(path)? {
                config.push_layer(layer);
            }
        }
        Ok(config)
    }

    /// Add a layer above every existing one.
    pub fn push_layer(&mut self, layer: ConfigLayer) {
        debug!(layer = layer.name(), settings = layer.len(), "push config layer");
        self.layers.push(layer);
    }

    pub fn layers(&self) -> &[ConfigLayer] {
        &self.layers
    }

    /// Most specific value defined for `name`, if any layer defines it.
    pub fn last(&self, name: &str) -> Option<&SettingValue> {
        self.layers.iter().rev().find_map(|layer| layer.get(name))
    }

    /// Most specific value for `name`, or `default` when no layer defines it.
    pub fn last_or<'a>(&'a self, name: &str, default: &'a SettingValue) -> &'a SettingValue {
        self.last(name).unwrap_or(default)
    }

    pub fn last_bool(&self, name: &str, default: bool) -> bool {
        self.typed_last(name, SettingValue::as_bool).unwrap_or(default)
    }

    pub fn last_usize(&self, name: &str, default: usize) -> usize {
        self.typed_last(name, SettingValue::as_usize)
            .unwrap_or(default)
    }

    pub fn last_str<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.typed_last(name, SettingValue::as_str)
            .unwrap_or(default)
    }

    fn typed_last<'a, T>(
        &'a self,
        name: &str,
        cast: impl Fn(&'a SettingValue) -> Option<T>,
    ) -> Option<T> {
        let value = self.last(name)?;
        let typed = cast(value);
        if typed.is_none() {
            warn!(
                setting = name,
                found = value.type_name(),
                "setting has unexpected type; using default"
            );
        }
        typed
    }

    /// Concatenate the values of `name` across all layers, base first.
    ///
    /// Lists contribute their items, maps contribute one `[key, value]` list
    /// per entry, and any other value contributes itself. Duplicates are kept.
    pub fn combined(&self, name: &str) -> Vec<SettingValue> {
        let mut out = Vec::new();
        for value in self.layers.iter().filter_map(|layer| layer.get(name)) {
            match value {
                SettingValue::List(items) => out.extend(items.iter().cloned()),
                SettingValue::Map(entries) => out.extend(entries.iter().map(|(key, value)| {
                    SettingValue::List(vec![SettingValue::Text(key.clone()), value.clone()])
                })),
                other => out.push(other.clone()),
            }
        }
        out
    }

    /// [`Config::combined`] restricted to `(key, value)` text pairs.
    ///
    /// Entries of any other shape are skipped with a warning.
    pub fn combined_pairs(&self, name: &str) -> Vec<(String, String)> {
        self.combined(name)
            .iter()
            .filter_map(|value| match value.as_pair() {
                Some((key, value)) => Some((key.to_string(), value.to_string())),
                None => {
                    warn!(setting = name, found = value.type_name(), "skipping non-pair entry");
                    None
                }
            })
            .collect()
    }

    /// [`Config::combined`] restricted to text entries.
    pub fn combined_texts(&self, name: &str) -> Vec<String> {
        self.combined(name)
            .iter()
            .filter_map(|value| match value.as_str() {
                Some(text) => Some(text.to_string()),
                None => {
                    warn!(setting = name, found = value.type_name(), "skipping non-text entry");
                    None
                }
            })
            .collect()
    }
}

// =============================================================================
// Layer Files
// =============================================================================

/// Parse one layer from JSON source. Comments and trailing commas are allowed.
///
/// The `extends` key, if present, is kept in the returned layer; use
/// [`load_layers`] to follow it.
pub fn parse_layer(name: impl Into<String>, source: &str) -> Result<ConfigLayer> {
    let name = name.into();
    let json = normalize_layer_source(source)
        .with_context(|| format!("layer `{name}` is not valid JSONC"))?;
    let settings: IndexMap<String, SettingValue> =
        serde_json::from_str(&json).with_context(|| format!("layer `{name}` is not a settings object"))?;
    Ok(ConfigLayer { name, settings })
}

/// Load a layer file and every file it extends, base layer first.
pub fn load_layers(path: &Path) -> Result<Vec<ConfigLayer>> {
    let mut chain = Vec::new();
    let mut layers = Vec::new();
    load_layer_chain(path, &mut chain, &mut layers)?;
    Ok(layers)
}

/// `chain` holds the files between the one the user named and `path`, so a
/// cycle error can show the whole loop.
fn load_layer_chain(path: &Path, chain: &mut Vec<PathBuf>, layers: &mut Vec<ConfigLayer>) -> Result<()> {
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if chain.contains(&canonical) {
        let trail: Vec<String> = chain
            .iter()
            .chain(std::iter::once(&canonical))
            .map(|file| file.display().to_string())
            .collect();
        bail!("configuration layers extend each other in a cycle: {}", trail.join(" -> "));
    }
    if chain.len() >= MAX_EXTENDS_DEPTH {
        bail!(
            "configuration layer {} sits more than {MAX_EXTENDS_DEPTH} `{EXTENDS_KEY}` steps from the layer that was requested",
            path.display()
        );
    }
    chain.push(canonical);

    let source = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read configuration layer {}", path.display()))?;
    let mut layer = parse_layer(path.display().to_string(), &source)?;

    if let Some(base) = layer.settings.shift_remove(EXTENDS_KEY) {
        let Some(base) = base.as_str() else {
            bail!(
                "`{EXTENDS_KEY}` in {} must name a layer file, found {}",
                path.display(),
                base.type_name()
            );
        };
        let base_path = base_layer_path(path, base)?;
        debug!(layer = %path.display(), base = %base_path.display(), "layer extends base");
        load_layer_chain(&base_path, chain, layers)?;
    }

    layers.push(layer);
    Ok(())
}

/// `base` is relative to the extending layer's directory; a bare name gets
/// the `.json` extension.
fn base_layer_path(layer: &Path, base: &str) -> Result<PathBuf> {
    let mut base_path = PathBuf::from(base);
    if base_path.extension().is_none() {
        base_path.set_extension("json");
    }
    if base_path.is_absolute() {
        return Ok(base_path);
    }
    let dir = layer
        .parent()
        .ok_or_else(|| anyhow!("cannot resolve `{base}` relative to layer {}", layer.display()))?;
    Ok(dir.join(base_path))
}

/// Where the layer scanner is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Code,
    Text { escaped: bool },
    LineComment,
    BlockComment,
}

/// Reduce JSONC layer source to plain JSON in one pass.
///
/// Comments are dropped but their newlines kept, so serde_json error positions
/// still point into the source file. A comma whose next significant
/// character closes an object or list is blanked out.
fn normalize_layer_source(source: &str) -> Result<String> {
    let mut json = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut state = Scan::Code;
    let mut open_comma: Option<usize> = None;

    while let Some(ch) = chars.next() {
        state = match state {
            Scan::Text { escaped } => {
                json.push(ch);
                match ch {
                    _ if escaped => Scan::Text { escaped: false },
                    '\\' => Scan::Text { escaped: true },
                    '"' => Scan::Code,
                    _ => state,
                }
            }
            Scan::LineComment if ch == '\n' => {
                json.push(ch);
                Scan::Code
            }
            Scan::LineComment => state,
            Scan::BlockComment if ch == '*' && chars.next_if_eq(&'/').is_some() => Scan::Code,
            Scan::BlockComment => {
                if ch == '\n' {
                    json.push(ch);
                }
                state
            }
            Scan::Code if ch == '/' && chars.next_if_eq(&'/').is_some() => Scan::LineComment,
            Scan::Code if ch == '/' && chars.next_if_eq(&'*').is_some() => Scan::BlockComment,
            Scan::Code => {
                if !ch.is_whitespace()
                    && let Some(at) = open_comma.take()
                    && matches!(ch, '}' | ']')
                {
                    json.replace_range(at..at + 1, " ");
                }
                if ch == ',' {
                    open_comma = Some(json.len());
                }
                json.push(ch);
                if ch == '"' { Scan::Text { escaped: false } } else { Scan::Code }
            }
        };
    }

    match state {
        Scan::BlockComment => bail!("block comment is never closed"),
        Scan::Text { .. } => bail!("string is never closed"),
        Scan::Code | Scan::LineComment => Ok(json),
    }
}

#[cfg(test)]
#[path = "../tests/config_tests.rs"]
mod config_tests;
