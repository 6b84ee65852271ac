//! Output-tree construction and emission for the j2py translator.
//!
//! The front end walks a parsed source tree depth first and reports one event
//! per construct to a [`BuildStack`]. The stack assembles a [`TemplateTree`]:
//! an arena of template nodes (module, class, method, statement, ...) owned
//! top-down. When a scope closes, the node's finishing handlers run. The
//! finished tree is rendered by a three-phase (prologue / body / epilogue)
//! emission walk, passed through the module's output handlers and finally
//! through the [`OutputRewriter`]'s pattern substitutions.
//!
//! ```text
//! events -> BuildStack -> TemplateTree -> finishing handlers
//!        -> emit -> output handlers -> OutputRewriter -> program text
//! ```

pub mod build_stack;
pub mod error;
pub mod expression;
pub mod handlers;
pub mod method;
pub mod payload;
pub mod registry;
pub mod rewriter;
pub mod settings;
pub mod template;
pub mod translation;

pub use build_stack::{BuildStack, LoopHandles, fix_float_literal};
pub use error::BuildError;
pub use expression::{Expression, Format, Operand};
pub use handlers::{
    FinishHandler, Handler, HandlerError, HandlerPipeline, HandlerRegistry, OutputHandler,
};
pub use payload::{
    Annotation, AnnotationArg, ExceptClause, Initializer, Modifier, ParamDecl, VariableDecl,
};
pub use registry::{NodeFactory, TypeRegistry, TypeRegistryBuilder};
pub use rewriter::OutputRewriter;
pub use settings::{EmitSettings, NameMap, PreambleOrder};
pub use template::{
    NodeData, NodeId, NodeKind, Parameter, SourceWriter, TemplateNode, TemplateTree,
};
pub use translation::Translation;
