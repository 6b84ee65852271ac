//! Builder-contract violations.
//!
//! Every variant is fatal: a tree that violated one of these contracts cannot
//! be rendered safely, so the caller gets an error instead of partial output.
//! Missing settings and unmapped names are not errors; they fall back to
//! defaults or pass through unchanged.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// `pop` was called with only the permanent root module on the stack.
    StackUnderflow { construct: String },
    /// The event stream ended while scopes were still open.
    UnclosedScopes { open: Vec<String> },
    /// The type registry has no constructor for the generic fallback kind.
    MissingFallback { kind: String },
    /// A handler chain names a handler that is not registered.
    UnknownHandler { setting: String, name: String },
    /// A handler chain names a handler of the wrong category, e.g. a node
    /// finishing handler in an output (text) chain.
    MisplacedHandler {
        setting: String,
        name: String,
        expected: &'static str,
    },
    /// A handler chain entry is not a handler name.
    MalformedHandlerEntry {
        setting: String,
        index: usize,
        found: &'static str,
    },
    /// A handler reported a failure while finishing or rendering a node.
    HandlerFailed {
        handler: String,
        node: String,
        message: String,
    },
    /// An output substitution rule failed to compile.
    InvalidRewriteRule {
        index: usize,
        pattern: String,
        message: String,
    },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::StackUnderflow { construct } => {
                write!(f, "build stack underflow while closing {construct}")
            }
            BuildError::UnclosedScopes { open } => {
                write!(f, "{} scope(s) left open: {}", open.len(), open.join(" > "))
            }
            BuildError::MissingFallback { kind } => {
                write!(f, "type registry has no constructor for fallback kind `{kind}`")
            }
            BuildError::UnknownHandler { setting, name } => {
                write!(f, "`{setting}` names unknown handler `{name}`")
            }
            BuildError::MisplacedHandler {
                setting,
                name,
                expected,
            } => write!(f, "`{setting}` expects {expected} handlers, but `{name}` is not one"),
            BuildError::MalformedHandlerEntry {
                setting,
                index,
                found,
            } => write!(
                f,
                "`{setting}` entry {index} must be a handler name, found {found}"
            ),
            BuildError::HandlerFailed {
                handler,
                node,
                message,
            } => write!(f, "handler `{handler}` failed on {node}: {message}"),
            BuildError::InvalidRewriteRule {
                index,
                pattern,
                message,
            } => write!(
                f,
                "output substitution {index} has invalid pattern `{pattern}`: {message}"
            ),
        }
    }
}

impl std::error::Error for BuildError {}
