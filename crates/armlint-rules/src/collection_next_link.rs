//! Rule requiring collection responses to be pageable.
//!
//! # Rationale
//!
//! Lists grow without bound. A collection GET that cannot return a
//! continuation link forces the service to return everything at once or to
//! silently truncate.
//!
//! The link property defaults to `nextLink`. `x-ms-pageable.nextLinkName`
//! renames it, and `nextLinkName: null` declares the list as not paged.
//!
//! # Configuration
//!
//! - `next_link_name`: link property expected when an operation does not
//!   name one (default: `nextLink`)

use armlint_core::{
    Applicability, Category, CheckOutput, CollectionApiInfo, Diagnostic, HttpMethod, JsonPath,
    MergeState, Operation, QueryMatch, Rule, RuleContext, SchemaResolver, Severity,
};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

/// Rule code for collection-next-link.
pub const CODE: &str = "R4004";

/// Rule name for collection-next-link.
pub const NAME: &str = "collection-next-link";

/// Default name of the continuation link property.
pub const DEFAULT_NEXT_LINK: &str = "nextLink";

/// Requires a continuation link on collection GET responses.
#[derive(Debug, Clone)]
pub struct CollectionNextLink {
    /// Link property expected when an operation does not name one.
    pub next_link_name: String,
    /// Custom severity.
    pub severity: Severity,
}

impl Default for CollectionNextLink {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectionNextLink {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_link_name: DEFAULT_NEXT_LINK.to_string(),
            severity: Severity::Error,
        }
    }

    /// Sets the link property expected by default.
    #[must_use]
    pub fn next_link_name(mut self, name: impl Into<String>) -> Self {
        self.next_link_name = name.into();
        self
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

/// The link property an operation node expects, `None` when paging is
/// explicitly off.
fn expected_link<'v>(operation: &'v Value, default: &'v str) -> Option<&'v str> {
    match operation.get("x-ms-pageable").map(|p| p.get("nextLinkName")) {
        Some(Some(Value::Null)) => None,
        Some(Some(Value::String(name))) => Some(name),
        _ => Some(default),
    }
}

impl CollectionNextLink {
    /// The diagnostic for one collection GET, if its response lacks the link.
    fn missing_link(
        &self,
        ctx: &RuleContext<'_>,
        resolver: &SchemaResolver<'_>,
        default_link: &str,
        info: &CollectionApiInfo,
        op: &Operation,
    ) -> Option<Diagnostic> {
        let response = op.response_schema.as_ref()?;
        let status = op.response_status.as_deref()?;
        let node = resolver.schema_at(&op.file, op.location.clone())?;
        let link = expected_link(node.node(), default_link)?;
        if resolver.get_property(response, link).is_some() {
            return None;
        }

        let message = format!(
            "Collection GET on '{}' lists '{}' but its {status} response has no '{link}' property.",
            op.api_path, info.child_model.name
        );
        let location = op.location.child("responses").child(status);
        Some(ctx.report_at(self, &op.file, location, message))
    }
}

impl Rule for CollectionNextLink {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires collection GET responses to declare a next link"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn category(&self) -> Category {
        Category::ArmViolation
    }

    fn applicability(&self) -> Applicability {
        Applicability::ARM_RPAAS
    }

    fn merge_state(&self) -> MergeState {
        MergeState::Composed
    }

    fn check<'a>(&'a self, ctx: &'a RuleContext<'a>, _node: QueryMatch<'a>) -> CheckOutput<'a> {
        let default_link = ctx.option_str("next_link_name", &self.next_link_name);
        let resolver = ctx.resolver();
        // An operation can list several item paths; check it once.
        let mut checked: HashSet<(&'a Path, &'a JsonPath)> = HashSet::new();

        let diagnostics = ctx
            .model
            .collection_apis()
            .iter()
            .flat_map(move |info| {
                ctx.model
                    .operations_for_path(&info.collection_path)
                    .into_iter()
                    .map(move |op| (info, op))
            })
            .filter(move |&(_, op)| {
                op.method == HttpMethod::Get && checked.insert((op.file.as_path(), &op.location))
            })
            .filter_map(move |(info, op)| self.missing_link(ctx, &resolver, default_link, info, op))
            .map(Ok);
        Box::new(diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{arm_fixture, lint_value, COLLECTION_PATH};
    use armlint_core::{Document, OpenApiType, ReferenceGraph, ResourceModel};
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn expected_link_follows_pageable_extension() {
        assert_eq!(expected_link(&json!({}), "nextLink"), Some("nextLink"));
        let renamed = json!({"x-ms-pageable": {"nextLinkName": "@odata.nextLink"}});
        assert_eq!(expected_link(&renamed, "nextLink"), Some("@odata.nextLink"));
        let off = json!({"x-ms-pageable": {"nextLinkName": null}});
        assert_eq!(expected_link(&off, "nextLink"), None);
    }

    #[test]
    fn next_link_present_passes() {
        assert!(lint_value(CollectionNextLink::new(), arm_fixture()).is_empty());
    }

    #[test]
    fn missing_next_link_is_reported_at_the_response() {
        let mut spec = arm_fixture();
        spec["definitions"]["WidgetList"]["properties"]
            .as_object_mut()
            .unwrap()
            .remove("nextLink");
        let diagnostics = lint_value(CollectionNextLink::new(), spec);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0]
            .location
            .pointer()
            .ends_with("/get/responses/200"));
        assert!(diagnostics[0].message.contains(COLLECTION_PATH));
    }

    #[test]
    fn renamed_and_disabled_links() {
        let mut spec = arm_fixture();
        spec["paths"][COLLECTION_PATH]["get"]["x-ms-pageable"] =
            json!({"nextLinkName": "continuation"});
        assert_eq!(lint_value(CollectionNextLink::new(), spec.clone()).len(), 1);

        spec["paths"][COLLECTION_PATH]["get"]["x-ms-pageable"] = json!({"nextLinkName": null});
        assert!(lint_value(CollectionNextLink::new(), spec).is_empty());
    }

    #[test]
    fn default_link_name_is_configurable() {
        let mut spec = arm_fixture();
        let properties = spec["definitions"]["WidgetList"]["properties"]
            .as_object_mut()
            .unwrap();
        let link = properties.remove("nextLink").unwrap();
        properties.insert("continuationToken".to_string(), link);
        spec["paths"][COLLECTION_PATH]["get"]["x-ms-pageable"] = json!({});

        assert_eq!(lint_value(CollectionNextLink::new(), spec.clone()).len(), 1);
        assert!(lint_value(
            CollectionNextLink::new().next_link_name("continuationToken"),
            spec
        )
        .is_empty());
    }

    #[test]
    fn results_are_produced_on_demand() {
        let mut spec = arm_fixture();
        spec["definitions"]["WidgetList"]["properties"]
            .as_object_mut()
            .unwrap()
            .remove("nextLink");
        let graph = ReferenceGraph::new();
        let path = PathBuf::from("/specs/spec.json");
        let doc = graph.insert(Document::from_value(path.clone(), spec));
        let model = ResourceModel::new(&graph, &path);
        let ctx = RuleContext {
            document: &doc,
            entry: &path,
            graph: &graph,
            model: &model,
            merge_state: MergeState::Composed,
            openapi_type: OpenApiType::Arm,
            rule_config: None,
        };
        let rule = CollectionNextLink::new();
        let node = QueryMatch {
            path: JsonPath::root(),
            value: doc.root(),
            parent: None,
        };

        let mut output = rule.check(&ctx, node);
        assert!(matches!(output.next(), Some(Ok(d)) if d.code == CODE));
        assert!(output.next().is_none());
    }
}
