//! Centralized defaults and thresholds for the translator.
//!
//! Settings that the configuration may leave undefined fall back to these
//! values. They are also the values seeded into the built-in default layer,
//! so a lookup against [`crate::Config::with_defaults`] and a lookup against an
//! empty configuration agree.

/// Number of spaces per indentation level in generated code.
pub const DEFAULT_INDENT_WIDTH: usize = 4;

/// Prefix written before every generated comment line.
pub const DEFAULT_COMMENT_PREFIX: &str = "## ";

/// Parameter count (including the implicit first parameter) above which a
/// method declaration is split over continuation lines. Zero disables
/// splitting.
pub const DEFAULT_MIN_INDENT_PARAMS: usize = 5;

/// Decorator that marks a method as bound to its type instead of an instance.
pub const DEFAULT_TYPE_BOUND_DECORATOR: &str = "@classmethod";

/// Maximum length of a configuration `extends` chain.
///
/// Cycles are detected separately; this only bounds pathological but acyclic
/// chains of generated config files.
pub const MAX_EXTENDS_DEPTH: usize = 32;
