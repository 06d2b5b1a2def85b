//! Rule requiring a PUT to accept and return the same model.
//!
//! # Rationale
//!
//! ARM PUTs are idempotent upserts: the body sent is the resource, and the
//! `200`/`201` response is that same resource as stored. Distinct request
//! and response models break client round-tripping.
//!
//! Both schemas are compared by the definition they name, after following
//! `$ref`s across files. Inline schemas are not compared.

use armlint_core::{
    from_diagnostics, Applicability, Category, CheckOutput, HttpMethod, QueryMatch, Rule,
    RuleContext, Severity,
};

/// Rule code for put-request-response-schema.
pub const CODE: &str = "R2003";

/// Rule name for put-request-response-schema.
pub const NAME: &str = "put-request-response-schema";

/// Requires PUT request body and success response to name the same model.
#[derive(Debug, Clone)]
pub struct PutRequestResponseSchema {
    /// Custom severity.
    pub severity: Severity,
}

impl Default for PutRequestResponseSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl PutRequestResponseSchema {
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

impl Rule for PutRequestResponseSchema {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires a PUT request body and its 200/201 response to use the same model"
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
        &["$.paths.*.put", "$['x-ms-paths'].*.put"]
    }

    fn check<'a>(&'a self, ctx: &'a RuleContext<'a>, node: QueryMatch<'a>) -> CheckOutput<'a> {
        let file = ctx.file();
        let Some(operation) = ctx.model.operations().iter().find(|op| {
            op.method == HttpMethod::Put && op.file == file && op.location == node.path
        }) else {
            return from_diagnostics(Vec::new());
        };

        let resolver = ctx.resolver();
        let request = operation
            .request_body_schema
            .as_ref()
            .and_then(|s| resolver.model_of(s));
        let response = operation
            .response_schema
            .as_ref()
            .and_then(|s| resolver.model_of(s));
        let (Some(request), Some(response), Some(status)) =
            (request, response, operation.response_status.as_deref())
        else {
            return from_diagnostics(Vec::new());
        };
        if request == response {
            return from_diagnostics(Vec::new());
        }

        let message = format!(
            "PUT {} accepts '{}' but its {status} response returns '{}'; both should be the same model.",
            operation.api_path, request.name, response.name
        );
        let path = node.path.child("responses").child(status);
        from_diagnostics(vec![ctx.report(self, path, message)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{lint_files, lint_value};
    use serde_json::{json, Value};

    fn put(request: &str, response: &str) -> Value {
        json!({
            "paths": {
                "/subscriptions/{s}/providers/Microsoft.Widgets/widgets/{name}": {
                    "put": {
                        "operationId": "Widgets_CreateOrUpdate",
                        "parameters": [
                            {"name": "body", "in": "body", "schema": {"$ref": request}}
                        ],
                        "responses": {
                            "200": {"schema": {"$ref": response}},
                            "default": {"description": "error"}
                        }
                    }
                }
            },
            "definitions": {
                "Widget": {"type": "object"},
                "WidgetUpdate": {"type": "object"}
            }
        })
    }

    #[test]
    fn same_model_passes() {
        let diagnostics = lint_value(
            PutRequestResponseSchema::new(),
            put("#/definitions/Widget", "#/definitions/Widget"),
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn different_models_are_reported_at_the_response() {
        let diagnostics = lint_value(
            PutRequestResponseSchema::new(),
            put("#/definitions/WidgetUpdate", "#/definitions/Widget"),
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0]
            .location
            .pointer()
            .ends_with("/put/responses/200"));
        assert!(diagnostics[0].message.contains("'WidgetUpdate'"));
        assert_eq!(diagnostics[0].resource_type.as_deref(), Some("widgets"));
    }

    #[test]
    fn models_are_compared_across_files() {
        let models = json!({"definitions": {"Widget": {"type": "object"}, "Gadget": {"type": "object"}}});
        let same = lint_files(
            PutRequestResponseSchema::new(),
            vec![
                ("widgets.json", put("./models.json#/definitions/Widget", "./models.json#/definitions/Widget")),
                ("models.json", models.clone()),
            ],
        );
        assert!(same.is_empty());

        let different = lint_files(
            PutRequestResponseSchema::new(),
            vec![
                ("widgets.json", put("./models.json#/definitions/Widget", "./models.json#/definitions/Gadget")),
                ("models.json", models),
            ],
        );
        assert_eq!(different.len(), 1);
        assert!(different[0].location.file.ends_with("widgets.json"));
        assert!(different[0].message.contains("returns 'Gadget'"));
    }
}
