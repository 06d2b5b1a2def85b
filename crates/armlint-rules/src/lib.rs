//! # armlint-rules
//!
//! Built-in lint rules for ARM OpenAPI specifications.
//!
//! Individual rules run once per file and see only that file's nodes.
//! Composed rules run once per entry file with the whole specification and
//! its inferred resource model in view.
//!
//! ## Available Rules
//!
//! | Code | Name | Scope | Description |
//! |------|------|-------|-------------|
//! | R1001 | `operation-id-noun-verb` | Individual | Requires `Noun_Verb` operation ids |
//! | R2001 | `enum-instead-of-boolean` | Individual | Suggests enums over boolean properties |
//! | R2002 | `provider-namespace-pascal-case` | Individual | Requires PascalCase provider namespaces |
//! | R2003 | `put-request-response-schema` | Individual | Requires PUT request and response to share a model |
//! | R4001 | `tracked-resource-delete-operation` | Composed | Requires DELETE on tracked resources |
//! | R4002 | `tracked-resource-patch-operation` | Composed | Requires PATCH on tracked resources |
//! | R4003 | `resource-collection-get-missing` | Composed | Requires a collection GET per resource |
//! | R4004 | `collection-next-link` | Composed | Requires `nextLink` on collection responses |
//!
//! ## Usage
//!
//! ```ignore
//! use armlint_core::RuleEngine;
//! use armlint_rules::arm_rules;
//!
//! let engine = RuleEngine::builder()
//!     .rules(arm_rules())
//!     .build()?;
//! let result = engine.lint(Path::new("specs/widgets.json"))?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod collection_next_link;
mod enum_instead_of_boolean;
mod lifecycle;
mod operation_id_noun_verb;
mod presets;
mod provider_namespace_pascal_case;
mod put_request_response_schema;
mod resource_collection_get_missing;
mod tracked_resource_delete_operation;
mod tracked_resource_patch_operation;

#[cfg(test)]
mod testing;

pub use collection_next_link::CollectionNextLink;
pub use enum_instead_of_boolean::EnumInsteadOfBoolean;
pub use operation_id_noun_verb::OperationIdNounVerb;
pub use presets::{all_rules, arm_rules, dataplane_rules, Preset, UnknownPreset};
pub use provider_namespace_pascal_case::ProviderNamespacePascalCase;
pub use put_request_response_schema::PutRequestResponseSchema;
pub use resource_collection_get_missing::ResourceCollectionGetMissing;
pub use tracked_resource_delete_operation::TrackedResourceDeleteOperation;
pub use tracked_resource_patch_operation::TrackedResourcePatchOperation;

/// Re-export core types for convenience.
pub use armlint_core::{Diagnostic, Rule, Severity};
