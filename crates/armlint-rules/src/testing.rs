//! Helpers for rule tests.

use armlint_core::{Diagnostic, Document, OpenApiType, ReferenceGraph, Rule, RuleEngine};
use serde_json::{json, Value};
use std::path::PathBuf;

pub(crate) const ITEM_PATH: &str = "/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.Widgets/widgets/{widgetName}";
pub(crate) const COLLECTION_PATH: &str =
    "/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.Widgets/widgets";

const SPEC_DIR: &str = "/specs";

/// Lints in-memory files with a single rule. The first file is the entry.
pub(crate) fn lint_files(rule: impl Rule + 'static, files: Vec<(&str, Value)>) -> Vec<Diagnostic> {
    let graph = ReferenceGraph::new();
    let mut entries = Vec::new();
    for (name, value) in files {
        let path = PathBuf::from(SPEC_DIR).join(name);
        if entries.is_empty() {
            entries.push(path.clone());
        }
        graph.insert(Document::from_value(path, value));
    }
    RuleEngine::builder()
        .rule(rule)
        .openapi_type(OpenApiType::Arm)
        .parallel(false)
        .build()
        .unwrap()
        .lint_graph(&graph, &entries)
        .unwrap()
        .diagnostics
}

/// Lints a single in-memory file with a single rule.
pub(crate) fn lint_value(rule: impl Rule + 'static, value: Value) -> Vec<Diagnostic> {
    lint_files(rule, vec![("spec.json", value)])
}

/// A tracked `Widget` with GET/PUT/PATCH/DELETE on its item path and a
/// pageable collection GET.
pub(crate) fn arm_fixture() -> Value {
    let widget = json!({"$ref": "#/definitions/Widget"});
    let mut paths = serde_json::Map::new();
    paths.insert(
        ITEM_PATH.to_string(),
        json!({
            "get": {
                "operationId": "Widgets_Get",
                "responses": {"200": {"description": "OK", "schema": widget}}
            },
            "put": {
                "operationId": "Widgets_CreateOrUpdate",
                "parameters": [{"name": "widget", "in": "body", "required": true, "schema": widget}],
                "responses": {
                    "200": {"description": "Updated", "schema": widget},
                    "201": {"description": "Created", "schema": widget}
                }
            },
            "patch": {
                "operationId": "Widgets_Update",
                "parameters": [{"name": "widget", "in": "body", "required": true, "schema": widget}],
                "responses": {"200": {"description": "OK", "schema": widget}}
            },
            "delete": {
                "operationId": "Widgets_Delete",
                "responses": {"200": {"description": "OK"}, "204": {"description": "No content"}}
            }
        }),
    );
    paths.insert(
        COLLECTION_PATH.to_string(),
        json!({
            "get": {
                "operationId": "Widgets_ListByResourceGroup",
                "responses": {"200": {"description": "OK", "schema": {"$ref": "#/definitions/WidgetList"}}},
                "x-ms-pageable": {"nextLinkName": "nextLink"}
            }
        }),
    );

    json!({
        "swagger": "2.0",
        "info": {"title": "Widgets", "version": "2024-01-01"},
        "paths": paths,
        "definitions": {
            "Resource": {
                "type": "object",
                "properties": {
                    "id": {"type": "string", "readOnly": true},
                    "name": {"type": "string", "readOnly": true},
                    "type": {"type": "string", "readOnly": true}
                },
                "x-ms-azure-resource": true
            },
            "TrackedResource": {
                "type": "object",
                "allOf": [{"$ref": "#/definitions/Resource"}],
                "properties": {
                    "location": {"type": "string"},
                    "tags": {"type": "object", "additionalProperties": {"type": "string"}}
                },
                "required": ["location"]
            },
            "ProxyResource": {
                "type": "object",
                "allOf": [{"$ref": "#/definitions/Resource"}]
            },
            "Widget": {
                "type": "object",
                "allOf": [{"$ref": "#/definitions/TrackedResource"}],
                "properties": {
                    "color": {"type": "string", "enum": ["red", "blue"]}
                }
            },
            "WidgetList": {
                "type": "object",
                "properties": {
                    "value": {"type": "array", "items": {"$ref": "#/definitions/Widget"}},
                    "nextLink": {"type": "string"}
                }
            }
        }
    })
}
