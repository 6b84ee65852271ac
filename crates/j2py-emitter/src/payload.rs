//! Declaration payloads carried by front-end events.

use serde::{Deserialize, Serialize};

/// A declaration modifier: a keyword such as `static`, or an annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Modifier {
    Keyword(String),
    Annotation(Annotation),
}

impl Modifier {
    /// The name recorded in a node's modifier set: the keyword itself, or the
    /// annotation rendered as a decorator line.
    pub fn recorded_name(&self) -> String {
        match self {
            Modifier::Keyword(keyword) => keyword.clone(),
            Modifier::Annotation(annotation) => annotation.decorator(),
        }
    }
}

impl From<&str> for Modifier {
    fn from(keyword: &str) -> Self {
        Modifier::Keyword(keyword.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub name: String,
    #[serde(default)]
    pub args: Vec<AnnotationArg>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationArg {
    Named { name: String, value: String },
    Value(String),
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        Annotation {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// `@Name`, or `@Name(a, key=value)` when arguments are present.
    pub fn decorator(&self) -> String {
        if self.args.is_empty() {
            return format!("@{}", self.name);
        }
        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| match arg {
                AnnotationArg::Named { name, value } => format!("{name}={value}"),
                AnnotationArg::Value(value) => value.clone(),
            })
            .collect();
        format!("@{}({})", self.name, args.join(", "))
    }
}

/// A formal parameter as declared in the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDecl {
    #[serde(rename = "type")]
    pub ty: String,
    pub name: String,
    /// `T... name` in the source.
    #[serde(default)]
    pub variadic: bool,
}

impl ParamDecl {
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        ParamDecl {
            ty: ty.into(),
            name: name.into(),
            variadic: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDecl {
    pub name: String,
    #[serde(rename = "type", default)]
    pub ty: Option<String>,
    #[serde(default)]
    pub init: Option<Initializer>,
}

impl VariableDecl {
    pub fn new(name: impl Into<String>) -> Self {
        VariableDecl {
            name: name.into(),
            ty: None,
            init: None,
        }
    }

    pub fn typed(mut self, ty: impl Into<String>) -> Self {
        self.ty = Some(ty.into());
        self
    }

    pub fn init(mut self, init: Initializer) -> Self {
        self.init = Some(init);
        self
    }
}

/// Right-hand side of a variable declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Initializer {
    /// Already-translated expression text.
    Expr(String),
    /// A call assembled argument by argument.
    Call { callee: String, args: Vec<String> },
}

/// `catch (Type name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptClause {
    #[serde(rename = "type")]
    pub ty: String,
    pub name: String,
}
