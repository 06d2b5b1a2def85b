//! Rule requiring `Noun_Verb` operation ids.
//!
//! # Rationale
//!
//! SDK generators split operation ids at the underscore: the noun becomes the
//! operation group, the verb the method name. Ids without exactly one
//! underscore, or repeating the noun in the verb, produce awkward clients.
//!
//! # Detected Patterns
//!
//! - `operationId: "ListWidgets"` (no underscore)
//! - `operationId: "Widgets_Get_Old"` (more than one underscore)
//! - `operationId: "Widgets_ListWidgets"` (noun repeated after the underscore)

use armlint_core::{
    from_diagnostics, Applicability, Category, CheckOutput, QueryMatch, Rule, RuleContext, Severity,
};
use serde_json::Value;

/// Rule code for operation-id-noun-verb.
pub const CODE: &str = "R1001";

/// Rule name for operation-id-noun-verb.
pub const NAME: &str = "operation-id-noun-verb";

/// Requires operation ids of the form `Noun_Verb`.
#[derive(Debug, Clone)]
pub struct OperationIdNounVerb {
    /// Whether the noun may reappear in the verb.
    pub allow_noun_in_verb: bool,
    /// Custom severity.
    pub severity: Severity,
}

impl Default for OperationIdNounVerb {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationIdNounVerb {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            allow_noun_in_verb: false,
            severity: Severity::Warning,
        }
    }

    /// Allows the noun to reappear in the verb.
    #[must_use]
    pub fn allow_noun_in_verb(mut self, allow: bool) -> Self {
        self.allow_noun_in_verb = allow;
        self
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    fn problem(operation_id: &str, allow_noun_in_verb: bool) -> Option<String> {
        let parts: Vec<&str> = operation_id.split('_').collect();
        let [noun, verb] = parts.as_slice() else {
            return Some(format!(
                "OperationId '{operation_id}' should be of the form 'Noun_Verb' with exactly one underscore."
            ));
        };
        if noun.is_empty() || verb.is_empty() {
            return Some(format!(
                "OperationId '{operation_id}' should be of the form 'Noun_Verb'."
            ));
        }
        if !allow_noun_in_verb && verb.to_ascii_lowercase().contains(&noun.to_ascii_lowercase()) {
            return Some(format!(
                "Per the Noun_Verb convention for operation ids, the noun '{noun}' should not appear after the underscore."
            ));
        }
        None
    }
}

impl Rule for OperationIdNounVerb {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires operation ids of the form Noun_Verb"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn category(&self) -> Category {
        Category::SdkViolation
    }

    fn applicability(&self) -> Applicability {
        Applicability::ALL
    }

    fn selectors(&self) -> &'static [&'static str] {
        &[
            "$.paths.*[get,put,post,patch,delete,head,options]",
            "$['x-ms-paths'].*[get,put,post,patch,delete,head,options]",
        ]
    }

    fn check<'a>(&'a self, ctx: &'a RuleContext<'a>, node: QueryMatch<'a>) -> CheckOutput<'a> {
        let Some(operation_id) = node.value.get("operationId").and_then(Value::as_str) else {
            return from_diagnostics(Vec::new());
        };
        let allow = ctx.option_bool("allow_noun_in_verb", self.allow_noun_in_verb);
        let found = Self::problem(operation_id, allow).map(|message| {
            ctx.report(self, node.path.child("operationId"), message)
                .with_suggestion("Rename the operation to '<Noun>_<Verb>', e.g. 'Widgets_Get'.")
        });
        from_diagnostics(found.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::lint_value;
    use serde_json::json;

    fn ids_with_problems(ids: &[&str]) -> Vec<String> {
        let mut paths = serde_json::Map::new();
        for (i, id) in ids.iter().enumerate() {
            paths.insert(format!("/p{i}"), json!({"get": {"operationId": id}}));
        }
        lint_value(OperationIdNounVerb::new(), json!({"paths": paths}))
            .into_iter()
            .map(|d| d.location.pointer())
            .collect()
    }

    #[test]
    fn accepts_noun_verb() {
        assert!(ids_with_problems(&["Widgets_Get", "Widgets_ListByResourceGroup"]).is_empty());
    }

    #[test]
    fn rejects_missing_or_extra_underscores() {
        assert_eq!(
            ids_with_problems(&["ListWidgets", "Widgets_Get", "A_B_C", "_Get"]),
            vec![
                "/paths/~1p0/get/operationId",
                "/paths/~1p2/get/operationId",
                "/paths/~1p3/get/operationId"
            ]
        );
    }

    #[test]
    fn rejects_noun_in_verb_unless_allowed() {
        assert_eq!(ids_with_problems(&["Widgets_ListWidgets"]).len(), 1);
        let allowed = lint_value(
            OperationIdNounVerb::new().allow_noun_in_verb(true),
            json!({"paths": {"/w": {"get": {"operationId": "Widgets_ListWidgets"}}}}),
        );
        assert!(allowed.is_empty());
    }

    #[test]
    fn checks_x_ms_paths_and_skips_parameters() {
        let diagnostics = lint_value(
            OperationIdNounVerb::new(),
            json!({
                "x-ms-paths": {"/a?op=x": {"post": {"operationId": "DoThing"}}},
                "paths": {"/b": {"parameters": [{"operationId": "Not_AnOperation_Really"}]}}
            }),
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, CODE);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn message_snapshot() {
        let message = OperationIdNounVerb::problem("Widgets_GetWidget", false).unwrap();
        insta::assert_snapshot!(message, @"Per the Noun_Verb convention for operation ids, the noun 'Widgets' should not appear after the underscore.");
    }
}
