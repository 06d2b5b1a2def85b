//! Operation discovery over `paths` and `x-ms-paths`.

use crate::document::Document;
use crate::pointer::JsonPath;
use crate::resolver::{EnhancedSchema, SchemaResolver};

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Path sections holding operations.
pub const PATH_SECTIONS: &[&str] = &["paths", "x-ms-paths"];

/// Response codes whose schema is the operation's resource schema.
const SUCCESS_CODES: &[&str] = &["200", "201"];

/// An HTTP method that can carry an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    /// GET
    Get,
    /// PUT
    Put,
    /// POST
    Post,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
    /// HEAD
    Head,
    /// OPTIONS
    Options,
}

impl HttpMethod {
    /// Parses a path-item key, ignoring case. Non-method keys such as
    /// `parameters` yield `None`.
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "get" => Some(Self::Get),
            "put" => Some(Self::Put),
            "post" => Some(Self::Post),
            "patch" => Some(Self::Patch),
            "delete" => Some(Self::Delete),
            "head" => Some(Self::Head),
            "options" => Some(Self::Options),
            _ => None,
        }
    }

    /// Lowercase name as written in documents.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Put => "put",
            Self::Post => "post",
            Self::Patch => "patch",
            Self::Delete => "delete",
            Self::Head => "head",
            Self::Options => "options",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str().to_ascii_uppercase())
    }
}

/// One operation found in a document.
#[derive(Debug, Clone)]
pub struct Operation {
    /// File declaring the operation.
    pub file: PathBuf,
    /// The api path (`/subscriptions/{s}/...`).
    pub api_path: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// `operationId`, if declared.
    pub operation_id: Option<String>,
    /// Location of the operation object inside its file.
    pub location: JsonPath,
    /// `200` or `201`, whichever is declared first in that order.
    pub response_status: Option<String>,
    /// Schema of the success response, unresolved.
    pub response_schema: Option<EnhancedSchema>,
    /// Schema of the `in: body` parameter, unresolved.
    pub request_body_schema: Option<EnhancedSchema>,
}

impl Operation {
    /// Whether the operation has a `200`/`201` response.
    #[must_use]
    pub fn has_success_response(&self) -> bool {
        self.response_status.is_some()
    }
}

/// Every operation declared in `document`, in document order.
pub(crate) fn discover(resolver: SchemaResolver<'_>, document: &Arc<Document>) -> Vec<Operation> {
    let mut out = Vec::new();
    for section in PATH_SECTIONS {
        let Some(paths) = document.root().get(*section).and_then(Value::as_object) else {
            continue;
        };
        for (api_path, item) in paths {
            let Some(item_map) = item.as_object() else {
                continue;
            };
            let item_path = JsonPath::root().child(*section).child(api_path.as_str());
            let path_item = EnhancedSchema::new(Arc::clone(document), item_path);

            for (key, op) in item_map {
                let Some(method) = HttpMethod::parse(key) else {
                    continue;
                };
                if !op.is_object() {
                    continue;
                }
                let operation = path_item.child(key.as_str());
                let (response_status, response_schema) = success_response(resolver, &operation);
                out.push(Operation {
                    file: document.path().to_path_buf(),
                    api_path: api_path.clone(),
                    method,
                    operation_id: op
                        .get("operationId")
                        .and_then(Value::as_str)
                        .map(String::from),
                    location: operation.pointer().clone(),
                    response_status,
                    response_schema,
                    request_body_schema: body_parameter(resolver, &operation)
                        .or_else(|| body_parameter(resolver, &path_item)),
                });
            }
        }
    }
    out
}

fn success_response(
    resolver: SchemaResolver<'_>,
    operation: &EnhancedSchema,
) -> (Option<String>, Option<EnhancedSchema>) {
    let responses = operation.child("responses");
    for code in SUCCESS_CODES {
        let response = responses.child(*code);
        if !response.exists() {
            continue;
        }
        let schema = resolver.resolve(&response).child("schema");
        return (Some((*code).to_string()), schema.exists().then_some(schema));
    }
    (None, None)
}

fn body_parameter(resolver: SchemaResolver<'_>, owner: &EnhancedSchema) -> Option<EnhancedSchema> {
    let parameters = owner.child("parameters");
    let count = parameters.node().as_array().map_or(0, Vec::len);
    (0..count)
        .map(|index| resolver.resolve(&parameters.child(index)))
        .find(|param| param.node().get("in").and_then(Value::as_str) == Some("body"))
        .map(|param| param.child("schema"))
        .filter(EnhancedSchema::exists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ReferenceGraph;
    use serde_json::json;
    use std::path::Path;

    #[test]
    fn discovers_methods_in_both_sections() {
        let graph = ReferenceGraph::new();
        let doc = graph.insert(Document::from_value(
            PathBuf::from("/spec/a.json"),
            json!({
                "paths": {
                    "/a": {
                        "parameters": [],
                        "GET": {"operationId": "A_Get", "responses": {"200": {"schema": {"type": "string"}}}},
                        "post": {"responses": {"202": {}}}
                    }
                },
                "x-ms-paths": {
                    "/a?op=x": {"put": {"responses": {"201": {}}}}
                }
            }),
        ));

        let ops = discover(SchemaResolver::new(&graph), &doc);
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0].method, HttpMethod::Get);
        assert_eq!(ops[0].operation_id.as_deref(), Some("A_Get"));
        assert_eq!(ops[0].response_status.as_deref(), Some("200"));
        assert!(ops[0].response_schema.is_some());
        assert!(!ops[1].has_success_response());
        assert_eq!(ops[2].api_path, "/a?op=x");
        assert_eq!(ops[2].response_status.as_deref(), Some("201"));
        assert!(ops[2].response_schema.is_none());
    }

    #[test]
    fn body_parameter_through_refs_and_path_level() {
        let graph = ReferenceGraph::new();
        let doc = graph.insert(Document::from_value(
            PathBuf::from("/spec/b.json"),
            json!({
                "parameters": {
                    "Body": {"name": "body", "in": "body", "schema": {"$ref": "#/definitions/W"}}
                },
                "paths": {
                    "/w": {
                        "put": {"parameters": [{"name": "x", "in": "query"}, {"$ref": "#/parameters/Body"}]},
                        "patch": {}
                    },
                    "/v": {
                        "parameters": [{"name": "b", "in": "body", "schema": {}}],
                        "put": {}
                    }
                },
                "definitions": {"W": {}}
            }),
        ));

        let ops = discover(SchemaResolver::new(&graph), &doc);
        let put = ops[0].request_body_schema.as_ref().unwrap();
        assert_eq!(put.pointer().to_pointer(), "/parameters/Body/schema");
        assert!(ops[1].request_body_schema.is_none());
        let path_level = ops[2].request_body_schema.as_ref().unwrap();
        assert_eq!(path_level.pointer().to_pointer(), "/paths/~1v/parameters/0/schema");
        assert_eq!(path_level.file(), Path::new("/spec/b.json"));
    }
}
