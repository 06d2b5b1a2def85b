//! Rule requiring a collection GET for every resource item path.
//!
//! # Rationale
//!
//! Every addressable resource must be enumerable: `.../widgets/{name}` needs
//! a GET on `.../widgets` whose response lists `Widget` items. Collection
//! and item paths are matched after normalization, so parameter names may
//! differ between the two.
//!
//! # Configuration
//!
//! - `skip_extension_resources`: do not check resources addressed through an
//!   extension scope (default: false)
//! - `max_depth`: only check resources nested at most this deep; 0 checks
//!   every depth (default: 0)

use armlint_core::{
    from_diagnostics, utils::collection_path_of, Applicability, Category, CheckOutput, JsonPath,
    MergeState, QueryMatch, Rule, RuleContext, Severity,
};

/// Rule code for resource-collection-get-missing.
pub const CODE: &str = "R4003";

/// Rule name for resource-collection-get-missing.
pub const NAME: &str = "resource-collection-get-missing";

/// Requires resources to be listable.
#[derive(Debug, Clone)]
pub struct ResourceCollectionGetMissing {
    /// Whether extension resources are exempt.
    pub skip_extension_resources: bool,
    /// Deepest nesting checked, 0 for no limit.
    pub max_depth: usize,
    /// Custom severity.
    pub severity: Severity,
}

impl Default for ResourceCollectionGetMissing {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceCollectionGetMissing {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            skip_extension_resources: false,
            max_depth: 0,
            severity: Severity::Error,
        }
    }

    /// Exempts extension resources.
    #[must_use]
    pub fn skip_extension_resources(mut self, skip: bool) -> Self {
        self.skip_extension_resources = skip;
        self
    }

    /// Limits the check to resources nested at most `depth` deep.
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl Rule for ResourceCollectionGetMissing {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires a collection GET listing every resource item path"
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
        let skip_extensions =
            ctx.option_bool("skip_extension_resources", self.skip_extension_resources);
        let default_depth = i64::try_from(self.max_depth).unwrap_or(i64::MAX);
        let max_depth = usize::try_from(ctx.option_int("max_depth", default_depth)).unwrap_or(0);

        let mut diagnostics = Vec::new();
        for (resource, item_path) in ctx.model.resources_without_collection() {
            if skip_extensions && resource.is_extension() {
                continue;
            }
            if max_depth > 0 && resource.hierarchy_depth().is_some_and(|d| d > max_depth) {
                continue;
            }
            let Some(anchor) = resource.operations.iter().find(|op| op.api_path == item_path)
            else {
                continue;
            };
            let collection = collection_path_of(&item_path).unwrap_or("<none>");
            let message = format!(
                "Resource '{}' at '{item_path}' has no GET on '{collection}' listing it.",
                resource.name()
            );
            let location = anchor.location.parent().unwrap_or_else(JsonPath::root);
            diagnostics.push(
                ctx.report_at(self, &anchor.file, location, message).with_suggestion(format!(
                    "Add a GET on '{collection}' returning a list whose 'value' items are '{}'.",
                    resource.name()
                )),
            );
        }
        from_diagnostics(diagnostics)
    }
}
