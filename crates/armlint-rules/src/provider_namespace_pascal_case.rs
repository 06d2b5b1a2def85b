//! Rule requiring PascalCase provider namespaces in api paths.
//!
//! # Rationale
//!
//! Resource providers register namespaces like `Microsoft.Compute`. A path
//! spelling `microsoft.compute` still routes (ARM is case-insensitive) but
//! leaks into generated clients and resource ids.
//!
//! # Detected Patterns
//!
//! - `/providers/microsoft.compute/...`
//! - `/providers/Microsoft.compute_v2/...`

use armlint_core::utils::provider_namespace;
use armlint_core::{
    from_diagnostics, Applicability, Category, CheckOutput, QueryMatch, Rule, RuleContext, Segment,
    Severity,
};
use regex::Regex;
use std::sync::OnceLock;

/// Rule code for provider-namespace-pascal-case.
pub const CODE: &str = "R2002";

/// Rule name for provider-namespace-pascal-case.
pub const NAME: &str = "provider-namespace-pascal-case";

/// Requires each dotted part of a provider namespace to be PascalCase.
#[derive(Debug, Clone)]
pub struct ProviderNamespacePascalCase {
    /// Custom severity.
    pub severity: Severity,
}

impl Default for ProviderNamespacePascalCase {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderNamespacePascalCase {
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

fn is_pascal_case(part: &str) -> bool {
    static PASCAL: OnceLock<Option<Regex>> = OnceLock::new();
    PASCAL
        .get_or_init(|| Regex::new(r"^[A-Z][A-Za-z0-9]*$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(part))
}

impl Rule for ProviderNamespacePascalCase {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires PascalCase provider namespaces"
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

    fn selectors(&self) -> &'static [&'static str] {
        &["$.paths.*", "$['x-ms-paths'].*"]
    }

    fn check<'a>(&'a self, ctx: &'a RuleContext<'a>, node: QueryMatch<'a>) -> CheckOutput<'a> {
        let Some(Segment::Key(api_path)) = node.path.last() else {
            return from_diagnostics(Vec::new());
        };
        let Some(namespace) = provider_namespace(api_path) else {
            return from_diagnostics(Vec::new());
        };
        if namespace.split('.').all(is_pascal_case) {
            return from_diagnostics(Vec::new());
        }

        let message = format!(
            "Provider namespace '{namespace}' in '{api_path}' should be PascalCase, e.g. 'Microsoft.Compute'."
        );
        from_diagnostics(vec![ctx.report(self, node.path.clone(), message)])
    }
}
