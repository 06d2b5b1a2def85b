//! Rule requiring a PATCH for every tracked resource.
//!
//! # Rationale
//!
//! Tags and other mutable top-level properties of tracked resources are
//! updated in place. Without a PATCH, clients must re-send the full resource
//! through PUT, racing concurrent writers.

use crate::lifecycle::missing_on_item_paths;
use armlint_core::{
    from_diagnostics, Applicability, Category, CheckOutput, HttpMethod, MergeState, QueryMatch,
    Rule, RuleContext, Severity,
};

/// Rule code for tracked-resource-patch-operation.
pub const CODE: &str = "R4002";

/// Rule name for tracked-resource-patch-operation.
pub const NAME: &str = "tracked-resource-patch-operation";

/// Requires tracked resources to be patchable.
#[derive(Debug, Clone)]
pub struct TrackedResourcePatchOperation {
    /// Custom severity.
    pub severity: Severity,
}

impl Default for TrackedResourcePatchOperation {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackedResourcePatchOperation {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Error,
        }
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl Rule for TrackedResourcePatchOperation {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires a PATCH operation on every tracked resource item path"
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
        let diagnostics = missing_on_item_paths(ctx.model, HttpMethod::Patch)
            .into_iter()
            .map(|missing| {
                let message = format!(
                    "Tracked resource '{}' has no PATCH operation at '{}'.",
                    missing.resource.name(),
                    missing.item_path
                );
                ctx.report_at(self, &missing.anchor.file, missing.path_item(), message)
                    .with_suggestion("Declare a PATCH operation on the resource's item path.")
            })
            .collect();
        from_diagnostics(diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{arm_fixture, lint_value, ITEM_PATH};
    use serde_json::json;

    #[test]
    fn complete_resource_passes() {
        assert!(lint_value(TrackedResourcePatchOperation::new(), arm_fixture()).is_empty());
    }

    #[test]
    fn missing_patch_is_reported_at_the_item_path() {
        let mut spec = arm_fixture();
        spec["paths"][ITEM_PATH]
            .as_object_mut()
            .unwrap()
            .remove("patch");
        let diagnostics = lint_value(TrackedResourcePatchOperation::new(), spec);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, CODE);
        assert_eq!(
            diagnostics[0].message,
            format!("Tracked resource 'Widget' has no PATCH operation at '{ITEM_PATH}'.")
        );
        assert_eq!(
            diagnostics[0].provider_namespace.as_deref(),
            Some("Microsoft.Widgets")
        );
    }

    #[test]
    fn every_item_path_is_checked() {
        let mut spec = arm_fixture();
        let item = spec["paths"][ITEM_PATH].clone();
        let by_subscription = ITEM_PATH.replace("/resourceGroups/{resourceGroupName}", "");
        spec["paths"][by_subscription.as_str()] = json!({"get": item["get"].clone()});

        let diagnostics = lint_value(TrackedResourcePatchOperation::new(), spec);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.ends_with(&format!("'{by_subscription}'.")));
    }
}
