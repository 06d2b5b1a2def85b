//! # armlint-core
//!
//! Core framework for linting multi-file OpenAPI (Swagger) specifications
//! against ARM conventions.
//!
//! This crate provides:
//!
//! - [`PathQuery`] for selecting document nodes with JSON-path expressions
//! - [`Document`] and [`ReferenceGraph`] for loading specifications spread
//!   across files that `$ref` each other
//! - [`SchemaResolver`] for following `$ref` chains and `allOf` hierarchies
//! - [`ResourceModel`] for inferring ARM resources from paths and schemas
//! - [`Rule`] and [`RuleEngine`] for running a rule catalog
//! - [`Diagnostic`] for representing lint findings
//!
//! ## Example
//!
//! ```ignore
//! use armlint_core::{RuleEngine, Severity};
//!
//! let engine = RuleEngine::builder()
//!     .rules(my_rules())
//!     .build()?;
//!
//! let result = engine.lint(Path::new("specs/compute.json"))?;
//! for diagnostic in &result.diagnostics {
//!     println!("{diagnostic}");
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod context;
mod document;
mod engine;
mod graph;
mod pointer;
mod resolver;
mod rule;
mod schema;
mod types;

/// JSON-path selector expressions.
pub mod query;
/// ARM resource model.
pub mod resource;
/// Utility modules for rule implementations.
pub mod utils;

pub use config::{Config, ConfigError, LinterConfig, RuleConfig};
pub use context::RuleContext;
pub use document::{Document, LoadError, Reference};
pub use engine::{
    quiet_rule_panics, EngineError, RuleEngine, RuleEngineBuilder, FILE_LOAD_ERROR,
    FILE_LOAD_ERROR_CODE, RULE_INTERNAL_ERROR,
};
pub use graph::ReferenceGraph;
pub use pointer::{JsonPath, Segment};
pub use query::{PathQuery, QueryError, QueryMatch};
pub use resolver::{EnhancedSchema, ModelRef, ResolveError, SchemaResolver};
pub use resource::{CollectionApiInfo, HttpMethod, Operation, ResourceInfo, ResourceModel};
pub use rule::{
    from_diagnostics, no_diagnostics, Applicability, Category, CheckOutput, MergeState,
    OpenApiType, Rule, RuleBox, RuleError,
};
pub use schema::{SchemaShape, LEAF_TYPES};
pub use types::{Diagnostic, LintResult, Location, Severity};
