//! JSON-path selector expressions over document trees.
//!
//! Rules select the nodes they check with expressions such as
//! `$.paths.*[get,put]` or `$..properties[?(@.type === 'boolean')]`.
//!
//! # Syntax
//!
//! ```text
//! $                     root
//! .name  ['name']  [0]  child by key or index
//! .*  [*]               every child
//! ..name  ..*  ..[..]   recursive descent (node and all descendants)
//! [a,'b',0]             union
//! [?(expr)]             children for which `expr` holds
//! ```
//!
//! Filter expressions compare `@` (the child), `@.a.b` / `@['a']` (its
//! properties) and `@property` (its key, or index in an array) against
//! string, number, boolean and null literals with `==`, `===`, `!=`, `!==`.
//! Bare operands test truthiness; `&&`, `||`, `!` and parentheses combine
//! tests.
//!
//! Matches come back in document order: object keys in insertion order,
//! arrays in index order.

mod eval;
mod parser;

use crate::pointer::JsonPath;
use serde_json::Value;

pub(crate) use parser::{CompareOp, Expr, Operand, Selector, Step};

/// A syntax error in a selector expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid path expression '{expression}' at offset {offset}: {reason}")]
pub struct QueryError {
    /// The full expression.
    pub expression: String,
    /// Character offset of the error.
    pub offset: usize,
    /// What went wrong.
    pub reason: String,
}

/// A node selected by a [`PathQuery`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueryMatch<'a> {
    /// Location of the node.
    pub path: JsonPath,
    /// The node itself.
    pub value: &'a Value,
    /// The node's parent, `None` for the root.
    pub parent: Option<&'a Value>,
}

/// A parsed selector expression.
#[derive(Debug, Clone, PartialEq)]
pub struct PathQuery {
    source: String,
    steps: Vec<Step>,
}

impl PathQuery {
    /// Parses an expression.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] on a syntax error.
    pub fn parse(expression: &str) -> Result<Self, QueryError> {
        let steps = parser::parse(expression)?;
        Ok(Self {
            source: expression.to_string(),
            steps,
        })
    }

    /// The root-only query (`$`).
    #[must_use]
    pub fn root() -> Self {
        Self {
            source: "$".to_string(),
            steps: Vec::new(),
        }
    }

    /// The expression text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Evaluates the query against `root`.
    #[must_use]
    pub fn select<'a>(&self, root: &'a Value) -> Vec<QueryMatch<'a>> {
        eval::evaluate(&self.steps, root)
    }
}

impl std::str::FromStr for PathQuery {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for PathQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// Parses and evaluates `expression` in one go.
///
/// An invalid expression selects nothing.
#[must_use]
pub fn select<'a>(root: &'a Value, expression: &str) -> Vec<QueryMatch<'a>> {
    match PathQuery::parse(expression) {
        Ok(query) => query.select(root),
        Err(err) => {
            tracing::debug!("{err}");
            Vec::new()
        }
    }
}
