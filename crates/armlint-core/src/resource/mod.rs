//! ARM resource model inferred from paths and schema shapes.
//!
//! Nothing in a specification says which schema is a resource. The model
//! reads it off the documents:
//!
//! - operations are discovered in every file of the specification,
//! - the x-ms-resource set is the fixed point of "inherits from a base
//!   resource" over all definitions,
//! - resources are members of that set (or PUT/PATCH responses), classified
//!   by their `location` property and the nesting depth of their paths,
//! - item paths are paired with the collection GET that lists them.
//!
//! Every view is computed once, on first use, behind a [`OnceLock`].

mod operation;

pub use operation::{HttpMethod, Operation, PATH_SECTIONS};

use crate::graph::ReferenceGraph;
use crate::resolver::{EnhancedSchema, ModelRef, SchemaResolver};
use crate::schema::SchemaShape;
use crate::utils::arm::{
    collection_path_of, hierarchy_depth, is_extension_path, is_item_path, normalize_api_path,
};
use crate::utils::paths::normalize_path;

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

/// Definition names that are ARM base resources by convention.
pub const BASE_RESOURCE_NAMES: &[&str] =
    &["Resource", "ProxyResource", "TrackedResource", "AzureEntityResource"];

/// Whether `name` is one of [`BASE_RESOURCE_NAMES`], ignoring case.
#[must_use]
pub fn is_base_resource_name(name: &str) -> bool {
    BASE_RESOURCE_NAMES
        .iter()
        .any(|base| base.eq_ignore_ascii_case(name))
}

/// The fixed point of "is, or inherits from, an ARM base resource".
#[derive(Debug, Clone, Default, Serialize)]
pub struct XmsResourceSet {
    /// Member definitions.
    pub models: BTreeSet<ModelRef>,
    /// Scan rounds run after seeding, including the final round that added
    /// nothing.
    pub rounds: usize,
}

impl XmsResourceSet {
    /// Whether `model` is a member.
    #[must_use]
    pub fn contains(&self, model: &ModelRef) -> bool {
        self.models.contains(model)
    }
}

/// A definition classified as an ARM resource.
#[derive(Debug, Clone)]
pub struct ResourceInfo {
    /// The resource definition.
    pub model: ModelRef,
    /// Operations using the model as request body or success response.
    pub operations: Vec<Operation>,
    /// Whether the resolved schema exposes `location`.
    pub tracked: bool,
}

impl ResourceInfo {
    /// Definition name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.model.name
    }

    /// File declaring the definition.
    #[must_use]
    pub fn defining_file(&self) -> &Path {
        &self.model.file
    }

    /// Whether the resource is tracked (has `location`).
    #[must_use]
    pub fn is_tracked(&self) -> bool {
        self.tracked
    }

    /// Smallest nesting depth among the resource's subscription-scoped
    /// operation paths.
    #[must_use]
    pub fn hierarchy_depth(&self) -> Option<usize> {
        self.depths().min()
    }

    /// Whether an operation path places the resource directly under its
    /// provider namespace.
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.depths().any(|d| d == 1)
    }

    /// Whether an operation path places the resource under another resource.
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.depths().any(|d| d > 1)
    }

    /// Whether an operation path is an extension-resource path.
    #[must_use]
    pub fn is_extension(&self) -> bool {
        self.operations
            .iter()
            .any(|op| is_extension_path(&op.api_path))
    }

    /// Distinct item paths (`.../<type>/{name}`) among the operations
    /// returning this resource, in discovery order.
    #[must_use]
    pub fn item_paths(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for op in &self.operations {
            if is_item_path(&op.api_path) && !out.contains(&op.api_path.as_str()) {
                out.push(&op.api_path);
            }
        }
        out
    }

    /// Operations with the given method.
    pub fn operations_with(&self, method: HttpMethod) -> impl Iterator<Item = &Operation> {
        self.operations.iter().filter(move |op| op.method == method)
    }

    fn depths(&self) -> impl Iterator<Item = usize> + '_ {
        self.operations
            .iter()
            .filter_map(|op| hierarchy_depth(&op.api_path))
    }
}

/// A collection GET paired with the item path it lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionApiInfo {
    /// The collection wrapper definition, `None` for an inline wrapper.
    pub parent_model: Option<ModelRef>,
    /// The item definition.
    pub child_model: ModelRef,
    /// The collection GET path.
    pub collection_path: String,
    /// The item path.
    pub item_path: String,
}

/// Lazily computed resource views over one entry file and everything it
/// references.
#[derive(Debug)]
pub struct ResourceModel<'g> {
    resolver: SchemaResolver<'g>,
    entry: PathBuf,
    operations: OnceLock<Vec<Operation>>,
    definitions: OnceLock<Vec<ModelRef>>,
    x_ms_resources: OnceLock<XmsResourceSet>,
    resources: OnceLock<Vec<ResourceInfo>>,
    collection_resources: OnceLock<Vec<(ModelRef, ModelRef)>>,
    collection_apis: OnceLock<Vec<CollectionApiInfo>>,
}

impl<'g> ResourceModel<'g> {
    /// Creates the model for `entry`. Nothing is computed until a view is
    /// first requested.
    #[must_use]
    pub fn new(graph: &'g ReferenceGraph, entry: &Path) -> Self {
        Self {
            resolver: SchemaResolver::new(graph),
            entry: normalize_path(entry),
            operations: OnceLock::new(),
            definitions: OnceLock::new(),
            x_ms_resources: OnceLock::new(),
            resources: OnceLock::new(),
            collection_resources: OnceLock::new(),
            collection_apis: OnceLock::new(),
        }
    }

    /// The entry file.
    #[must_use]
    pub fn entry(&self) -> &Path {
        &self.entry
    }

    /// The resolver the model is built on.
    #[must_use]
    pub fn resolver(&self) -> SchemaResolver<'g> {
        self.resolver
    }

    /// Files making up the specification: the entry, then every loaded file
    /// it reaches.
    #[must_use]
    pub fn files(&self) -> Vec<PathBuf> {
        let graph = self.resolver.graph();
        let mut files = Vec::new();
        if graph.cached(&self.entry).is_some() {
            files.push(self.entry.clone());
        }
        files.extend(
            graph
                .references_of(&self.entry)
                .iter()
                .map(|doc| doc.path().to_path_buf()),
        );
        files
    }

    /// Every operation in the specification, file by file in document order.
    pub fn operations(&self) -> &[Operation] {
        self.operations.get_or_init(|| {
            let graph = self.resolver.graph();
            let ops: Vec<Operation> = self
                .files()
                .iter()
                .filter_map(|file| graph.cached(file))
                .flat_map(|doc| operation::discover(self.resolver, &doc))
                .collect();
            debug!("Discovered {} operation(s) from {}", ops.len(), self.entry.display());
            ops
        })
    }

    /// Operations whose api path matches `api_path` after normalization.
    #[must_use]
    pub fn operations_for_path(&self, api_path: &str) -> Vec<&Operation> {
        let wanted = normalize_api_path(api_path);
        self.operations()
            .iter()
            .filter(|op| normalize_api_path(&op.api_path) == wanted)
            .collect()
    }

    /// Every named definition in the specification.
    pub fn definitions(&self) -> &[ModelRef] {
        self.definitions.get_or_init(|| {
            let graph = self.resolver.graph();
            self.files()
                .iter()
                .filter_map(|file| graph.cached(file))
                .flat_map(|doc| {
                    doc.definitions()
                        .map(|defs| {
                            defs.keys()
                                .map(|name| ModelRef::new(doc.path(), name.as_str()))
                                .collect::<Vec<_>>()
                        })
                        .unwrap_or_default()
                })
                .collect()
        })
    }

    /// The x-ms-resource set.
    ///
    /// Seeds are the base resource names and definitions carrying
    /// `x-ms-azure-resource: true` through their `allOf` hierarchy. Each
    /// round then adds every remaining definition with a member among its
    /// `allOf` ancestors, until a round adds nothing.
    pub fn x_ms_resource_set(&self) -> &XmsResourceSet {
        self.x_ms_resources.get_or_init(|| {
            let mut set = XmsResourceSet::default();
            for model in self.definitions() {
                if is_base_resource_name(&model.name) || self.has_azure_resource_flag(model) {
                    set.models.insert(model.clone());
                }
            }

            loop {
                set.rounds += 1;
                let added: Vec<ModelRef> = self
                    .definitions()
                    .iter()
                    .filter(|model| !set.contains(model))
                    .filter(|model| {
                        self.resolver
                            .definition(model)
                            .map(|schema| self.resolver.ancestor_models(&schema))
                            .is_some_and(|ancestors| ancestors.iter().any(|a| set.contains(a)))
                    })
                    .cloned()
                    .collect();
                if added.is_empty() {
                    break;
                }
                set.models.extend(added);
            }

            debug!(
                "x-ms-resource set: {} model(s) after {} round(s)",
                set.models.len(),
                set.rounds
            );
            set
        })
    }

    /// Every definition classified as an ARM resource, in definition order.
    ///
    /// A definition qualifies when it is in the x-ms-resource set (base names
    /// excluded) and is not returned exclusively by POST operations, or when
    /// it is the success response of a PUT or PATCH.
    pub fn all_resources(&self) -> &[ResourceInfo] {
        self.resources.get_or_init(|| {
            let x_ms = self.x_ms_resource_set();
            let usage = self.model_usage();

            let resources: Vec<ResourceInfo> = self
                .definitions()
                .iter()
                .filter_map(|model| {
                    let returned_by: Vec<HttpMethod> = usage
                        .iter()
                        .filter(|(m, _, is_response)| m == model && *is_response)
                        .map(|(_, op, _)| op.method)
                        .collect();
                    let put_or_patch = returned_by
                        .iter()
                        .any(|m| matches!(m, HttpMethod::Put | HttpMethod::Patch));
                    let post_only = !returned_by.is_empty()
                        && returned_by.iter().all(|m| *m == HttpMethod::Post);
                    let in_set = x_ms.contains(model) && !is_base_resource_name(&model.name);

                    if !(put_or_patch || (in_set && !post_only)) {
                        return None;
                    }

                    let operations = usage
                        .iter()
                        .filter(|(m, _, _)| m == model)
                        .map(|(_, op, _)| (*op).clone())
                        .fold(Vec::<Operation>::new(), |mut acc, op| {
                            if !acc.iter().any(|o| o.file == op.file && o.location == op.location) {
                                acc.push(op);
                            }
                            acc
                        });
                    Some(ResourceInfo {
                        model: model.clone(),
                        tracked: self.is_tracked(model),
                        operations,
                    })
                })
                .collect();

            info!(
                "Resource model for {}: {} resource(s), {} operation(s)",
                self.entry.display(),
                resources.len(),
                self.operations().len()
            );
            resources
        })
    }

    /// The resource for `model`, if it is one.
    #[must_use]
    pub fn resource(&self, model: &ModelRef) -> Option<&ResourceInfo> {
        self.all_resources().iter().find(|r| &r.model == model)
    }

    /// Whether `model` is classified as an ARM resource.
    #[must_use]
    pub fn is_arm_resource(&self, model: &ModelRef) -> bool {
        self.resource(model).is_some()
    }

    /// Whether the resolved definition exposes a `location` property,
    /// directly or through `allOf`.
    #[must_use]
    pub fn is_tracked(&self, model: &ModelRef) -> bool {
        self.resolver
            .definition(model)
            .and_then(|schema| self.resolver.get_property(&schema, "location"))
            .is_some()
    }

    /// Resources with a `location` property.
    #[must_use]
    pub fn tracked_resources(&self) -> Vec<&ResourceInfo> {
        self.all_resources().iter().filter(|r| r.tracked).collect()
    }

    /// Resources without a `location` property.
    #[must_use]
    pub fn proxy_resources(&self) -> Vec<&ResourceInfo> {
        self.all_resources().iter().filter(|r| !r.tracked).collect()
    }

    /// Resources with a depth-1 path.
    #[must_use]
    pub fn top_level_resources(&self) -> Vec<&ResourceInfo> {
        self.all_resources()
            .iter()
            .filter(|r| r.is_top_level())
            .collect()
    }

    /// Resources with a path deeper than 1.
    #[must_use]
    pub fn nested_resources(&self) -> Vec<&ResourceInfo> {
        self.all_resources().iter().filter(|r| r.is_nested()).collect()
    }

    /// Resources addressed through an extension scope.
    #[must_use]
    pub fn extension_resources(&self) -> Vec<&ResourceInfo> {
        self.all_resources()
            .iter()
            .filter(|r| r.is_extension())
            .collect()
    }

    /// `(wrapper, item)` pairs for every definition whose `value` property is
    /// an array of a named definition.
    pub fn collection_resources(&self) -> &[(ModelRef, ModelRef)] {
        self.collection_resources.get_or_init(|| {
            self.definitions()
                .iter()
                .filter_map(|wrapper| {
                    let schema = self.resolver.definition(wrapper)?;
                    let item = self.array_item_of_value(&schema)?;
                    Some((wrapper.clone(), item))
                })
                .collect()
        })
    }

    /// Collection GETs paired with the item paths they list.
    ///
    /// For each resource item path the trailing `/{param}` is stripped and
    /// GET operations are searched whose path equals the candidate after
    /// normalization (parameter names ignored, case folded, equal segment
    /// count). A match counts when its response lists the item model.
    pub fn collection_apis(&self) -> &[CollectionApiInfo] {
        self.collection_apis.get_or_init(|| {
            let mut out: Vec<CollectionApiInfo> = Vec::new();
            for resource in self.all_resources() {
                for item_path in resource.item_paths() {
                    let Some(candidate) = collection_path_of(item_path) else {
                        continue;
                    };
                    for get in self
                        .operations_for_path(candidate)
                        .into_iter()
                        .filter(|op| op.method == HttpMethod::Get)
                    {
                        let Some(response) = &get.response_schema else {
                            continue;
                        };
                        if !self.lists_model(response, &resource.model) {
                            continue;
                        }
                        let info = CollectionApiInfo {
                            parent_model: self.resolver.model_of(response),
                            child_model: resource.model.clone(),
                            collection_path: get.api_path.clone(),
                            item_path: item_path.to_string(),
                        };
                        if !out.contains(&info) {
                            out.push(info);
                        }
                    }
                }
            }
            debug!("Paired {} collection api(s)", out.len());
            out
        })
    }

    /// The collection pairing for an item path, matched after normalization.
    #[must_use]
    pub fn collection_for_item(&self, item_path: &str) -> Option<&CollectionApiInfo> {
        let wanted = normalize_api_path(item_path);
        self.collection_apis()
            .iter()
            .find(|info| normalize_api_path(&info.item_path) == wanted)
    }

    /// `(resource, item path)` pairs with no collection GET.
    #[must_use]
    pub fn resources_without_collection(&self) -> Vec<(&ResourceInfo, String)> {
        let mut out = Vec::new();
        for resource in self.all_resources() {
            for item_path in resource.item_paths() {
                if self.collection_for_item(item_path).is_none() {
                    out.push((resource, item_path.to_string()));
                }
            }
        }
        out
    }

    /// `(model, operation, is_response)` for every request body and success
    /// response naming a definition.
    fn model_usage(&self) -> Vec<(ModelRef, &Operation, bool)> {
        let mut usage = Vec::new();
        for op in self.operations() {
            if let Some(model) = op
                .response_schema
                .as_ref()
                .and_then(|s| self.resolver.model_of(s))
            {
                usage.push((model, op, true));
            }
            if let Some(model) = op
                .request_body_schema
                .as_ref()
                .and_then(|s| self.resolver.model_of(s))
            {
                usage.push((model, op, false));
            }
        }
        usage
    }

    fn has_azure_resource_flag(&self, model: &ModelRef) -> bool {
        self.resolver
            .definition(model)
            .and_then(|schema| self.resolver.get_attribute(&schema, "x-ms-azure-resource"))
            .is_some_and(|flag| flag.node() == &Value::Bool(true))
    }

    /// The named item model of `schema.properties.value` when it is an array.
    fn array_item_of_value(&self, schema: &EnhancedSchema) -> Option<ModelRef> {
        let value = self.resolver.get_property(schema, "value")?;
        let value = self.resolver.resolve(&value);
        match value.shape() {
            SchemaShape::Array { items: Some(_) } => self.resolver.model_of(&value.child("items")),
            _ => None,
        }
    }

    fn lists_model(&self, response: &EnhancedSchema, item: &ModelRef) -> bool {
        if self.array_item_of_value(response).as_ref() == Some(item) {
            return true;
        }
        self.resolver.model_of(response).is_some_and(|wrapper| {
            self.collection_resources()
                .iter()
                .any(|(w, i)| w == &wrapper && i == item)
        })
    }
}
