//! Rule requiring a DELETE for every tracked resource.
//!
//! # Rationale
//!
//! Tracked resources are billed and live in a region. Customers must be able
//! to remove them through the API, so each item path returning a tracked
//! resource needs a DELETE next to its GET and PUT.
//!
//! The check sees the whole specification: the DELETE may be declared in a
//! different file than the GET.

use crate::lifecycle::missing_on_item_paths;
use armlint_core::{
    from_diagnostics, Applicability, Category, CheckOutput, HttpMethod, MergeState, QueryMatch,
    Rule, RuleContext, Severity,
};

/// Rule code for tracked-resource-delete-operation.
pub const CODE: &str = "R4001";

/// Rule name for tracked-resource-delete-operation.
pub const NAME: &str = "tracked-resource-delete-operation";

/// Requires tracked resources to be deletable.
#[derive(Debug, Clone)]
pub struct TrackedResourceDeleteOperation {
    /// Custom severity.
    pub severity: Severity,
}

impl Default for TrackedResourceDeleteOperation {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackedResourceDeleteOperation {
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

impl Rule for TrackedResourceDeleteOperation {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires a DELETE operation on every tracked resource item path"
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
        let diagnostics = missing_on_item_paths(ctx.model, HttpMethod::Delete)
            .into_iter()
            .map(|missing| {
                let message = format!(
                    "Tracked resource '{}' has no DELETE operation at '{}'.",
                    missing.resource.name(),
                    missing.item_path
                );
                ctx.report_at(self, &missing.anchor.file, missing.path_item(), message)
                    .with_suggestion("Declare a DELETE operation on the resource's item path.")
            })
            .collect();
        from_diagnostics(diagnostics)
    }
}
