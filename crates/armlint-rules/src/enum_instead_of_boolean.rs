//! Rule flagging boolean properties and parameters.
//!
//! # Rationale
//!
//! A boolean cannot grow a third state. Once shipped, `isEnabled: true`
//! cannot become "enabled, disabled or pending" without a breaking change,
//! while an enum can.
//!
//! # Configuration
//!
//! - `allow_names`: property or parameter names that may stay boolean

use armlint_core::{
    from_diagnostics, Applicability, Category, CheckOutput, QueryMatch, Rule, RuleContext, Segment,
    Severity,
};
use serde_json::Value;

/// Rule code for enum-instead-of-boolean.
pub const CODE: &str = "R2001";

/// Rule name for enum-instead-of-boolean.
pub const NAME: &str = "enum-instead-of-boolean";

/// Suggests enums where booleans are declared.
#[derive(Debug, Clone)]
pub struct EnumInsteadOfBoolean {
    /// Names exempt from the rule.
    pub allow_names: Vec<String>,
    /// Custom severity.
    pub severity: Severity,
}

impl Default for EnumInsteadOfBoolean {
    fn default() -> Self {
        Self::new()
    }
}

impl EnumInsteadOfBoolean {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            allow_names: Vec::new(),
            severity: Severity::Warning,
        }
    }

    /// Exempts a property or parameter name.
    #[must_use]
    pub fn allow_name(mut self, name: impl Into<String>) -> Self {
        self.allow_names.push(name.into());
        self
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

/// Parameter `name`, or the property key.
fn declared_name(node: &QueryMatch<'_>) -> String {
    let in_parameters = node
        .path
        .parent()
        .and_then(|parent| parent.last().and_then(Segment::as_key).map(str::to_owned))
        .is_some_and(|key| key == "parameters");
    if in_parameters {
        if let Some(name) = node.value.get("name").and_then(Value::as_str) {
            return name.to_string();
        }
    }
    match node.path.last() {
        Some(Segment::Key(key)) => key.clone(),
        Some(Segment::Index(index)) => index.to_string(),
        None => String::new(),
    }
}

impl Rule for EnumInsteadOfBoolean {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Suggests an enum instead of a boolean property or parameter"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn category(&self) -> Category {
        Category::ArmViolation
    }

    fn applicability(&self) -> Applicability {
        Applicability::ALL
    }

    fn selectors(&self) -> &'static [&'static str] {
        &[
            "$..properties[?(@.type === 'boolean')]",
            "$..parameters[?(@.type === 'boolean')]",
        ]
    }

    fn check<'a>(&'a self, ctx: &'a RuleContext<'a>, node: QueryMatch<'a>) -> CheckOutput<'a> {
        let name = declared_name(&node);
        let configured = ctx.option_str_array("allow_names");
        if self
            .allow_names
            .iter()
            .chain(&configured)
            .any(|allowed| allowed.eq_ignore_ascii_case(&name))
        {
            return from_diagnostics(Vec::new());
        }

        let message = format!(
            "'{name}' is a boolean. Booleans are not descriptive in all cases and cannot be extended; \
             consider an enum instead."
        );
        from_diagnostics(vec![ctx.report(self, node.path, message)])
    }
}
