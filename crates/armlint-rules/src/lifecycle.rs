//! Lifecycle-operation lookups shared by the tracked resource rules.

use armlint_core::{HttpMethod, JsonPath, Operation, ResourceInfo, ResourceModel};
use tracing::debug;

/// A tracked resource item path lacking an operation.
pub(crate) struct MissingOperation<'m> {
    pub resource: &'m ResourceInfo,
    pub item_path: &'m str,
    /// An operation of the resource on `item_path`, used to place the report.
    pub anchor: &'m Operation,
}

impl MissingOperation<'_> {
    /// Location of the path item declaring the anchor operation.
    pub fn path_item(&self) -> JsonPath {
        self.anchor
            .location
            .parent()
            .unwrap_or_else(JsonPath::root)
    }
}

/// Item paths of tracked resources with no `method` operation declared on
/// them anywhere in the specification.
pub(crate) fn missing_on_item_paths<'m>(
    model: &'m ResourceModel<'_>,
    method: HttpMethod,
) -> Vec<MissingOperation<'m>> {
    let mut out = Vec::new();
    for resource in model.tracked_resources() {
        for item_path in resource.item_paths() {
            if model
                .operations_for_path(item_path)
                .iter()
                .any(|op| op.method == method)
            {
                continue;
            }
            let Some(anchor) = resource.operations.iter().find(|op| op.api_path == item_path)
            else {
                continue;
            };
            debug!("{} has no {method} on {item_path}", resource.name());
            out.push(MissingOperation {
                resource,
                item_path,
                anchor,
            });
        }
    }
    out
}
