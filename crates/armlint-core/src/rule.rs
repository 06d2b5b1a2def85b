//! Rule trait and rule metadata.

use crate::context::RuleContext;
use crate::query::{QueryError, QueryMatch};
use crate::resolver::ResolveError;
use crate::types::{Diagnostic, Severity};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which files a rule sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeState {
    /// Runs once per physical file, selecting only inside that file.
    Individual,
    /// Runs once per entry file with the whole specification in view.
    Composed,
}

impl fmt::Display for MergeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Individual => write!(f, "individual"),
            Self::Composed => write!(f, "composed"),
        }
    }
}

/// Kind of API description being linted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenApiType {
    /// Generic OpenAPI.
    #[default]
    Default,
    /// Azure Resource Manager (control plane).
    Arm,
    /// Data-plane APIs.
    #[serde(alias = "data-plane")]
    Dataplane,
    /// Resource provider as a service.
    Rpaas,
}

impl fmt::Display for OpenApiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Arm => write!(f, "arm"),
            Self::Dataplane => write!(f, "dataplane"),
            Self::Rpaas => write!(f, "rpaas"),
        }
    }
}

impl std::str::FromStr for OpenApiType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "arm" => Ok(Self::Arm),
            "dataplane" | "data-plane" => Ok(Self::Dataplane),
            "rpaas" => Ok(Self::Rpaas),
            other => Err(format!("unknown openapi type '{other}'")),
        }
    }
}

/// Set of [`OpenApiType`]s a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Applicability(u8);

impl Applicability {
    /// Generic OpenAPI.
    pub const DEFAULT: Self = Self(0b0001);
    /// ARM control plane.
    pub const ARM: Self = Self(0b0010);
    /// Data plane.
    pub const DATAPLANE: Self = Self(0b0100);
    /// RPaaS.
    pub const RPAAS: Self = Self(0b1000);
    /// ARM and RPaaS.
    pub const ARM_RPAAS: Self = Self(0b1010);
    /// Every type.
    pub const ALL: Self = Self(0b1111);

    /// Union of two sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether the set contains `ty`.
    #[must_use]
    pub fn applies_to(self, ty: OpenApiType) -> bool {
        let bit = match ty {
            OpenApiType::Default => Self::DEFAULT,
            OpenApiType::Arm => Self::ARM,
            OpenApiType::Dataplane => Self::DATAPLANE,
            OpenApiType::Rpaas => Self::RPAAS,
        };
        self.0 & bit.0 != 0
    }

    /// Member types, in declaration order.
    #[must_use]
    pub fn types(self) -> Vec<OpenApiType> {
        [
            OpenApiType::Default,
            OpenApiType::Arm,
            OpenApiType::Dataplane,
            OpenApiType::Rpaas,
        ]
        .into_iter()
        .filter(|ty| self.applies_to(*ty))
        .collect()
    }
}

impl std::ops::BitOr for Applicability {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Grouping used in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// ARM contract violations.
    ArmViolation,
    /// Generic OpenAPI style and correctness.
    OpenApiViolation,
    /// Problems that break SDK generation.
    SdkViolation,
    /// Problems raised by the linter itself.
    Internal,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArmViolation => write!(f, "ARMViolation"),
            Self::OpenApiViolation => write!(f, "OpenAPIViolation"),
            Self::SdkViolation => write!(f, "SDKViolation"),
            Self::Internal => write!(f, "Internal"),
        }
    }
}

/// Error a check yields instead of panicking. The engine turns it into a
/// `rule-internal-error` diagnostic.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// Free-form failure.
    #[error("{0}")]
    Message(String),

    /// A schema could not be resolved.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A selector built at check time was invalid.
    #[error(transparent)]
    Query(#[from] QueryError),
}

impl RuleError {
    /// Creates a free-form error.
    #[must_use]
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

/// Lazily produced results of one check invocation.
///
/// The engine pulls items until the sequence ends or yields an error, so a
/// check can defer expensive work until the engine asks for it.
pub type CheckOutput<'a> = Box<dyn Iterator<Item = Result<Diagnostic, RuleError>> + 'a>;

/// Wraps an eagerly built list of diagnostics.
#[must_use]
pub fn from_diagnostics<'a>(diagnostics: Vec<Diagnostic>) -> CheckOutput<'a> {
    Box::new(diagnostics.into_iter().map(Ok))
}

/// A check result with nothing to report.
#[must_use]
pub fn no_diagnostics<'a>() -> CheckOutput<'a> {
    Box::new(std::iter::empty())
}

/// A lint rule.
///
/// Rules are pure readers: they never mutate the document or the graph.
/// The engine evaluates every [`selectors`](Rule::selectors) expression
/// against the document in view and calls [`check`](Rule::check) once per
/// selected node, in document order.
///
/// # Example
///
/// ```ignore
/// use armlint_core::{from_diagnostics, CheckOutput, QueryMatch, Rule, RuleContext};
///
/// pub struct NoEmptyPaths;
///
/// impl Rule for NoEmptyPaths {
///     fn name(&self) -> &'static str { "no-empty-paths" }
///     fn code(&self) -> &'static str { "X0001" }
///     fn selectors(&self) -> &'static [&'static str] { &["$.paths"] }
///
///     fn check<'a>(&'a self, ctx: &'a RuleContext<'a>, node: QueryMatch<'a>) -> CheckOutput<'a> {
///         let empty = node.value.as_object().is_some_and(|m| m.is_empty());
///         let found = empty.then(|| ctx.report(self, node.path, "paths is empty"));
///         from_diagnostics(found.into_iter().collect())
///     }
/// }
/// ```
pub trait Rule: Send + Sync {
    /// Returns the kebab-case name of this rule (e.g., "operation-id-noun-verb").
    fn name(&self) -> &'static str;

    /// Returns the rule id (e.g., "R1001").
    fn code(&self) -> &'static str;

    /// Returns a brief description of what this rule checks.
    fn description(&self) -> &'static str {
        ""
    }

    /// Returns the default severity for diagnostics from this rule.
    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    /// Report grouping.
    fn category(&self) -> Category {
        Category::ArmViolation
    }

    /// API kinds this rule applies to.
    fn applicability(&self) -> Applicability {
        Applicability::ALL
    }

    /// Whether the rule sees one file or the whole specification.
    fn merge_state(&self) -> MergeState {
        MergeState::Individual
    }

    /// Selector expressions choosing the nodes to check. The default selects
    /// the whole document.
    fn selectors(&self) -> &'static [&'static str] {
        &["$"]
    }

    /// Checks one selected node.
    fn check<'a>(&'a self, ctx: &'a RuleContext<'a>, node: QueryMatch<'a>) -> CheckOutput<'a>;
}

/// Type alias for boxed Rule trait objects.
pub type RuleBox = Box<dyn Rule>;
