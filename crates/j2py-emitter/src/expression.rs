//! Expression nodes.
//!
//! An [`Expression`] is a left/right operand pair combined by a fixed
//! [`Format`] pattern. Operands are either literal text or nested
//! expressions, rendered before substitution. Rendering is a pure function of
//! the operands and the pattern.
//!
//! Statement headers are expressions too: `while i < 10:` is the keyword and
//! the condition combined with [`Format::LeftSpaceRightColon`].

use std::fmt;

/// How the two operands combine into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `{left}`
    Left,
    /// `{right}`
    Right,
    /// `{left}:`
    LeftColon,
    /// `{left}{right}`
    LeftRight,
    /// `{left} {right}`
    LeftSpaceRight,
    /// `{left} {right}:`
    LeftSpaceRightColon,
}

impl Format {
    pub fn pattern(self) -> &'static str {
        match self {
            Format::Left => "{left}",
            Format::Right => "{right}",
            Format::LeftColon => "{left}:",
            Format::LeftRight => "{left}{right}",
            Format::LeftSpaceRight => "{left} {right}",
            Format::LeftSpaceRightColon => "{left} {right}:",
        }
    }
}

/// One side of an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Text(String),
    Nested(Box<Expression>),
}

impl Operand {
    pub fn render(&self) -> String {
        match self {
            Operand::Text(text) => text.clone(),
            Operand::Nested(expr) => expr.render(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Operand::Text(text) if text.is_empty())
    }
}

impl From<&str> for Operand {
    fn from(text: &str) -> Self {
        Operand::Text(text.to_string())
    }
}

impl From<String> for Operand {
    fn from(text: String) -> Self {
        Operand::Text(text)
    }
}

impl From<Expression> for Operand {
    fn from(expr: Expression) -> Self {
        Operand::Nested(Box::new(expr))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    left: Operand,
    right: Operand,
    format: Format,
}

impl Expression {
    pub fn new(left: impl Into<Operand>, right: impl Into<Operand>, format: Format) -> Self {
        Expression {
            left: left.into(),
            right: right.into(),
            format,
        }
    }

    /// An expression that renders `text` as-is.
    pub fn text(text: impl Into<Operand>) -> Self {
        Expression::new(text, "", Format::Left)
    }

    /// A call with no arguments yet: `callee()`.
    pub fn call(callee: impl Into<Operand>) -> Self {
        Expression::new(callee, "()", Format::LeftRight)
    }

    pub fn left(&self) -> &Operand {
        &self.left
    }

    pub fn right(&self) -> &Operand {
        &self.right
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn set_left(&mut self, left: impl Into<Operand>) {
        self.left = left.into();
    }

    pub fn set_right(&mut self, right: impl Into<Operand>) {
        self.right = right.into();
    }

    /// Append one argument to a call built with [`Expression::call`].
    ///
    /// The right operand is re-assigned with the extended argument list.
    pub fn push_argument(&mut self, argument: &str) {
        let current = self.right.render();
        let inner = current
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(&current);
        let next = if inner.is_empty() {
            format!("({argument})")
        } else {
            format!("({inner}, {argument})")
        };
        self.right = Operand::Text(next);
    }

    /// Substitute the rendered operands into the format pattern.
    pub fn render(&self) -> String {
        let pattern = self.format.pattern();
        let mut out = String::with_capacity(pattern.len() + 16);
        let mut rest = pattern;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];
            if let Some(after) = tail.strip_prefix("{left}") {
                out.push_str(&self.left.render());
                rest = after;
            } else if let Some(after) = tail.strip_prefix("{right}") {
                out.push_str(&self.right.render());
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }

    /// Debug description: `expression`, plus the literal operand values.
    ///
    /// Nested operands are listed on their own lines as `left` / `right`.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        self.describe_into(&mut out, "expression", 0, "    ");
        out
    }

    fn describe_into(&self, out: &mut String, label: &str, level: usize, indent: &str) {
        out.push_str(&indent.repeat(level));
        out.push_str(label);
        for operand in [&self.left, &self.right] {
            if let Operand::Text(text) = operand
                && !text.is_empty()
            {
                out.push_str(" value:");
                out.push_str(text);
            }
        }
        out.push('\n');
        for (label, operand) in [("left", &self.left), ("right", &self.right)] {
            if let Operand::Nested(expr) = operand {
                expr.describe_into(out, label, level + 1, indent);
            }
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
#[path = "../tests/expression_tests.rs"]
mod expression_tests;
