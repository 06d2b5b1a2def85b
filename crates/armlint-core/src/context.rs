//! Context types for rule execution.

use crate::config::RuleConfig;
use crate::document::Document;
use crate::graph::ReferenceGraph;
use crate::pointer::JsonPath;
use crate::resolver::{EnhancedSchema, SchemaResolver};
use crate::resource::ResourceModel;
use crate::rule::{MergeState, OpenApiType, Rule};
use crate::types::{Diagnostic, Location};

use std::path::Path;
use std::sync::Arc;

/// Context provided to a rule's check.
///
/// Gives access to the document in view, the shared reference graph, the
/// resource model of the specification the document belongs to, and the
/// rule's own configuration.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// The document the rule's selectors run against.
    pub document: &'a Arc<Document>,
    /// The entry file of the specification.
    pub entry: &'a Path,
    /// Every loaded file, shared by all rules.
    pub graph: &'a ReferenceGraph,
    /// Resource views of the specification.
    pub model: &'a ResourceModel<'a>,
    /// Whether the rule runs per file or on the whole specification.
    pub merge_state: MergeState,
    /// The configured API kind.
    pub openapi_type: OpenApiType,
    /// Options for the running rule, if configured.
    pub rule_config: Option<&'a RuleConfig>,
}

impl<'a> RuleContext<'a> {
    /// Path of the document in view.
    #[must_use]
    pub fn file(&self) -> &'a Path {
        self.document.path()
    }

    /// A resolver over the shared graph.
    #[must_use]
    pub fn resolver(&self) -> SchemaResolver<'a> {
        SchemaResolver::new(self.graph)
    }

    /// Schema handle for a node of the document in view.
    #[must_use]
    pub fn schema(&self, path: &JsonPath) -> EnhancedSchema {
        EnhancedSchema::new(Arc::clone(self.document), path.clone())
    }

    /// Builds a diagnostic for `rule` located in the document in view.
    #[must_use]
    pub fn report(&self, rule: &dyn Rule, path: JsonPath, message: impl Into<String>) -> Diagnostic {
        self.report_at(rule, self.file(), path, message)
    }

    /// Builds a diagnostic for `rule` located in `file`.
    #[must_use]
    pub fn report_at(
        &self,
        rule: &dyn Rule,
        file: &Path,
        path: JsonPath,
        message: impl Into<String>,
    ) -> Diagnostic {
        Diagnostic::new(
            rule.code(),
            rule.name(),
            rule.default_severity(),
            Location::new(file, path),
            message,
        )
        .with_category(rule.category())
    }

    /// Boolean rule option with a default.
    #[must_use]
    pub fn option_bool(&self, key: &str, default: bool) -> bool {
        self.rule_config.map_or(default, |c| c.get_bool(key, default))
    }

    /// Integer rule option with a default.
    #[must_use]
    pub fn option_int(&self, key: &str, default: i64) -> i64 {
        self.rule_config.map_or(default, |c| c.get_int(key, default))
    }

    /// String rule option with a default.
    #[must_use]
    pub fn option_str(&self, key: &str, default: &'a str) -> &'a str {
        self.rule_config.map_or(default, |c| c.get_str(key, default))
    }

    /// String-array rule option; empty when unset.
    #[must_use]
    pub fn option_str_array(&self, key: &str) -> Vec<String> {
        self.rule_config
            .map(|c| c.get_str_array(key))
            .unwrap_or_default()
    }
}
