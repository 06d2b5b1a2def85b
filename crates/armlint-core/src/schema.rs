//! Typed view over the schema shapes the linter inspects.
//!
//! Schemas are arbitrary JSON; only a handful of shapes matter for resource
//! analysis. [`SchemaShape::of`] classifies a node once so callers can match
//! instead of probing keys ad hoc.

use serde_json::{Map, Value};

/// Scalar `type` values that are never expanded further.
pub const LEAF_TYPES: &[&str] = &["integer", "number", "string", "boolean", "null"];

/// The shape of a schema node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchemaShape<'a> {
    /// A `$ref` to another schema.
    Ref(&'a str),
    /// A leaf scalar (`type` in [`LEAF_TYPES`]).
    Scalar {
        /// The declared type.
        ty: &'a str,
        /// The declared `format`, if any.
        format: Option<&'a str>,
    },
    /// An array with its `items` schema.
    Array {
        /// The `items` schema, if declared.
        items: Option<&'a Value>,
    },
    /// A composite built with `allOf`, possibly with own properties.
    Composite {
        /// The `allOf` members in declaration order.
        all_of: &'a [Value],
        /// Own `properties`, if any.
        properties: Option<&'a Map<String, Value>>,
    },
    /// An object with (possibly empty) `properties`.
    Object {
        /// Own `properties`, if any.
        properties: Option<&'a Map<String, Value>>,
    },
    /// Anything else (booleans, scalars, untyped nodes).
    Unknown,
}

impl<'a> SchemaShape<'a> {
    /// Classifies a schema node.
    ///
    /// Precedence: `$ref`, leaf `type`, `array`, `allOf`, object.
    #[must_use]
    pub fn of(node: &'a Value) -> Self {
        let Some(map) = node.as_object() else {
            return Self::Unknown;
        };

        if let Some(target) = map.get("$ref").and_then(Value::as_str) {
            return Self::Ref(target);
        }

        let ty = map.get("type").and_then(Value::as_str);
        if let Some(ty) = ty.filter(|t| LEAF_TYPES.contains(t)) {
            return Self::Scalar {
                ty,
                format: map.get("format").and_then(Value::as_str),
            };
        }

        if ty == Some("array") || (ty.is_none() && map.contains_key("items")) {
            return Self::Array {
                items: map.get("items"),
            };
        }

        let properties = map.get("properties").and_then(Value::as_object);
        if let Some(all_of) = map.get("allOf").and_then(Value::as_array) {
            return Self::Composite {
                all_of: all_of.as_slice(),
                properties,
            };
        }

        if ty == Some("object") || properties.is_some() || map.contains_key("additionalProperties")
        {
            return Self::Object { properties };
        }

        Self::Unknown
    }

    /// Whether the shape is a leaf scalar.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Scalar { .. })
    }

    /// Own `properties` of object and composite shapes.
    #[must_use]
    pub fn properties(&self) -> Option<&'a Map<String, Value>> {
        match self {
            Self::Object { properties } | Self::Composite { properties, .. } => *properties,
            _ => None,
        }
    }
}

/// Whether a node is a leaf scalar schema.
#[must_use]
pub fn is_leaf(node: &Value) -> bool {
    SchemaShape::of(node).is_leaf()
}
