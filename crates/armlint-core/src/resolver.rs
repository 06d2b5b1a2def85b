//! `$ref` resolution and `allOf`-aware schema lookups.
//!
//! Every traversal here carries its own visited set: `$ref` chains and `allOf`
//! hierarchies may be cyclic across files, and resolution must always
//! terminate.

use crate::document::{Document, Reference};
use crate::graph::ReferenceGraph;
use crate::pointer::{JsonPath, Segment};
use crate::schema::SchemaShape;

use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

static NULL: Value = Value::Null;

/// A schema node paired with the file whose relative-reference context
/// applies to any `$ref` inside it.
#[derive(Debug, Clone)]
pub struct EnhancedSchema {
    document: Arc<Document>,
    pointer: JsonPath,
}

impl EnhancedSchema {
    /// Creates a schema handle for the node at `pointer` in `document`.
    #[must_use]
    pub fn new(document: Arc<Document>, pointer: JsonPath) -> Self {
        Self { document, pointer }
    }

    /// The file owning this node.
    #[must_use]
    pub fn file(&self) -> &Path {
        self.document.path()
    }

    /// The owning document.
    #[must_use]
    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    /// Location of the node inside its document.
    #[must_use]
    pub fn pointer(&self) -> &JsonPath {
        &self.pointer
    }

    /// The schema node, or `null` if the pointer addresses nothing.
    #[must_use]
    pub fn node(&self) -> &Value {
        self.document.get(&self.pointer).unwrap_or(&NULL)
    }

    /// Whether the pointer addresses an existing node.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.document.get(&self.pointer).is_some()
    }

    /// A handle to a child node in the same file.
    #[must_use]
    pub fn child(&self, segment: impl Into<Segment>) -> Self {
        Self {
            document: Arc::clone(&self.document),
            pointer: self.pointer.child(segment),
        }
    }

    /// The shape of the node.
    #[must_use]
    pub fn shape(&self) -> SchemaShape<'_> {
        SchemaShape::of(self.node())
    }

    /// The raw `$ref` string, if the node is a reference.
    #[must_use]
    pub fn ref_target(&self) -> Option<&str> {
        self.node().get("$ref").and_then(Value::as_str)
    }

    /// The definition this node is, when it lives at `definitions/<name>`.
    #[must_use]
    pub fn as_model(&self) -> Option<ModelRef> {
        match self.pointer.segments() {
            [Segment::Key(section), Segment::Key(name)] if section == "definitions" => {
                Some(ModelRef::new(self.file(), name))
            }
            _ => None,
        }
    }

    fn key(&self) -> (PathBuf, String) {
        (self.file().to_path_buf(), self.pointer.to_pointer())
    }
}

impl PartialEq for EnhancedSchema {
    fn eq(&self, other: &Self) -> bool {
        self.file() == other.file() && self.pointer == other.pointer
    }
}

impl Eq for EnhancedSchema {}

/// Identity of a named definition: its file and its name under `definitions`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ModelRef {
    /// File declaring the definition.
    pub file: PathBuf,
    /// Definition name.
    pub name: String,
}

impl ModelRef {
    /// Creates a model reference.
    #[must_use]
    pub fn new(file: &Path, name: impl Into<String>) -> Self {
        Self {
            file: file.to_path_buf(),
            name: name.into(),
        }
    }

    /// Pointer to the definition inside its file.
    #[must_use]
    pub fn pointer(&self) -> JsonPath {
        JsonPath::root().child("definitions").child(self.name.as_str())
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Why resolution stopped early. Both cases are recoverable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// A `(file, pointer)` pair was reached twice.
    #[error("reference cycle through {pointer} in {file}")]
    Cycle {
        /// File of the repeated target.
        file: PathBuf,
        /// Pointer of the repeated target.
        pointer: String,
    },

    /// The target file or pointer does not exist.
    #[error("unresolvable reference '{reference}' in {file}")]
    Unresolvable {
        /// File containing the `$ref`.
        file: PathBuf,
        /// The raw `$ref` string.
        reference: String,
    },
}

/// Follows `$ref` chains and walks `allOf` hierarchies over a
/// [`ReferenceGraph`], loading referenced files on demand.
#[derive(Debug, Clone, Copy)]
pub struct SchemaResolver<'g> {
    graph: &'g ReferenceGraph,
}

impl<'g> SchemaResolver<'g> {
    /// Creates a resolver over `graph`.
    #[must_use]
    pub fn new(graph: &'g ReferenceGraph) -> Self {
        Self { graph }
    }

    /// The underlying graph.
    #[must_use]
    pub fn graph(&self) -> &'g ReferenceGraph {
        self.graph
    }

    /// Handle for the node at `pointer` in `file`, loading the file if needed.
    #[must_use]
    pub fn schema_at(&self, file: &Path, pointer: JsonPath) -> Option<EnhancedSchema> {
        let document = self.graph.get(file).ok()?;
        let schema = EnhancedSchema::new(document, pointer);
        schema.exists().then_some(schema)
    }

    /// Handle for a named definition.
    #[must_use]
    pub fn definition(&self, model: &ModelRef) -> Option<EnhancedSchema> {
        self.schema_at(&model.file, model.pointer())
    }

    /// Follows the `$ref` chain of `schema` to a concrete schema.
    ///
    /// A non-reference schema is returned unchanged. On a cycle or an
    /// unresolvable target, the last schema reached is returned.
    #[must_use]
    pub fn resolve(&self, schema: &EnhancedSchema) -> EnhancedSchema {
        let (last, err) = self.walk(schema);
        if let Some(err) = err {
            debug!("{err}");
        }
        last
    }

    /// Like [`resolve`](Self::resolve) but reports why resolution stopped.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] on a reference cycle or an unresolvable target.
    pub fn try_resolve(&self, schema: &EnhancedSchema) -> Result<EnhancedSchema, ResolveError> {
        match self.walk(schema) {
            (last, None) => Ok(last),
            (_, Some(err)) => Err(err),
        }
    }

    fn walk(&self, schema: &EnhancedSchema) -> (EnhancedSchema, Option<ResolveError>) {
        let mut current = schema.clone();
        let mut visited: HashSet<(PathBuf, String)> = HashSet::new();
        visited.insert(current.key());

        while let Some(raw) = current.ref_target() {
            let reference = Reference::parse(raw, current.file());
            let (file, pointer) = reference.target_in(current.file());

            let key = (file.clone(), pointer.to_pointer());
            if !visited.insert(key) {
                let err = ResolveError::Cycle {
                    file,
                    pointer: pointer.to_pointer(),
                };
                return (current, Some(err));
            }

            let unresolvable = || ResolveError::Unresolvable {
                file: current.file().to_path_buf(),
                reference: raw.to_string(),
            };
            let Ok(document) = self.graph.get(&file) else {
                let err = unresolvable();
                return (current, Some(err));
            };
            let next = EnhancedSchema::new(document, pointer.clone());
            if !next.exists() {
                let err = unresolvable();
                return (current, Some(err));
            }
            current = next;
        }

        (current, None)
    }

    /// The definition `schema` names, following `$ref`s until a node under
    /// `definitions/<name>` is reached. Inline schemas yield `None`.
    #[must_use]
    pub fn model_of(&self, schema: &EnhancedSchema) -> Option<ModelRef> {
        let mut current = schema.clone();
        let mut visited: HashSet<(PathBuf, String)> = HashSet::new();
        loop {
            if let Some(model) = current.as_model() {
                return Some(model);
            }
            if !visited.insert(current.key()) {
                return None;
            }
            let raw = current.ref_target()?;
            let reference = Reference::parse(raw, current.file());
            let (file, pointer) = reference.target_in(current.file());
            current = self.schema_at(&file, pointer.clone())?;
        }
    }

    /// Looks up `properties[name]` on the resolved schema, then depth-first
    /// through its `allOf` members in declaration order. First match wins.
    ///
    /// The returned property schema is not itself resolved.
    #[must_use]
    pub fn get_property(&self, schema: &EnhancedSchema, name: &str) -> Option<EnhancedSchema> {
        let mut visited = HashSet::new();
        self.find_in_hierarchy(schema, &mut visited, &|resolved| {
            resolved
                .node()
                .get("properties")
                .and_then(|p| p.get(name))
                .map(|_| resolved.child("properties").child(name))
        })
    }

    /// Like [`get_property`](Self::get_property) for an arbitrary key such as
    /// `items` or `x-ms-azure-resource`.
    #[must_use]
    pub fn get_attribute(&self, schema: &EnhancedSchema, name: &str) -> Option<EnhancedSchema> {
        let mut visited = HashSet::new();
        self.find_in_hierarchy(schema, &mut visited, &|resolved| {
            resolved.node().get(name).map(|_| resolved.child(name))
        })
    }

    fn find_in_hierarchy(
        &self,
        schema: &EnhancedSchema,
        visited: &mut HashSet<(PathBuf, String)>,
        probe: &dyn Fn(&EnhancedSchema) -> Option<EnhancedSchema>,
    ) -> Option<EnhancedSchema> {
        let resolved = self.resolve(schema);
        if !visited.insert(resolved.key()) {
            return None;
        }
        let shape = resolved.shape();
        if shape.is_leaf() {
            return None;
        }
        if let Some(found) = probe(&resolved) {
            return Some(found);
        }
        if let SchemaShape::Composite { all_of, .. } = shape {
            for index in 0..all_of.len() {
                let member = resolved.child("allOf").child(index);
                if let Some(found) = self.find_in_hierarchy(&member, visited, probe) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// All properties visible on `schema`: own properties first, then those
    /// inherited through `allOf` in declaration order. The first declaration
    /// of a name wins.
    #[must_use]
    pub fn properties(&self, schema: &EnhancedSchema) -> Vec<(String, EnhancedSchema)> {
        let mut out: Vec<(String, EnhancedSchema)> = Vec::new();
        let mut seen_names: HashSet<String> = HashSet::new();
        let mut visited = HashSet::new();
        self.collect_properties(schema, &mut visited, &mut seen_names, &mut out);
        out
    }

    fn collect_properties(
        &self,
        schema: &EnhancedSchema,
        visited: &mut HashSet<(PathBuf, String)>,
        seen_names: &mut HashSet<String>,
        out: &mut Vec<(String, EnhancedSchema)>,
    ) {
        let resolved = self.resolve(schema);
        if !visited.insert(resolved.key()) || resolved.shape().is_leaf() {
            return;
        }
        if let Some(props) = resolved.shape().properties() {
            for name in props.keys() {
                if seen_names.insert(name.clone()) {
                    out.push((name.clone(), resolved.child("properties").child(name.as_str())));
                }
            }
        }
        if let SchemaShape::Composite { all_of, .. } = resolved.shape() {
            for index in 0..all_of.len() {
                let member = resolved.child("allOf").child(index);
                self.collect_properties(&member, visited, seen_names, out);
            }
        }
    }

    /// Every schema in the `allOf` hierarchy of `schema` (resolved, pre-order,
    /// excluding `schema` itself). Cycles are cut.
    #[must_use]
    pub fn all_of_ancestors(&self, schema: &EnhancedSchema) -> Vec<EnhancedSchema> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        let resolved = self.resolve(schema);
        visited.insert(resolved.key());
        self.collect_ancestors(&resolved, &mut visited, &mut out);
        out
    }

    fn collect_ancestors(
        &self,
        resolved: &EnhancedSchema,
        visited: &mut HashSet<(PathBuf, String)>,
        out: &mut Vec<EnhancedSchema>,
    ) {
        let SchemaShape::Composite { all_of, .. } = resolved.shape() else {
            return;
        };
        for index in 0..all_of.len() {
            let member = self.resolve(&resolved.child("allOf").child(index));
            if visited.insert(member.key()) {
                out.push(member.clone());
                self.collect_ancestors(&member, visited, out);
            }
        }
    }

    /// Named definitions among the `allOf` ancestors of `schema`.
    #[must_use]
    pub fn ancestor_models(&self, schema: &EnhancedSchema) -> Vec<ModelRef> {
        let mut out: Vec<ModelRef> = Vec::new();
        for model in self
            .all_of_ancestors(schema)
            .iter()
            .filter_map(EnhancedSchema::as_model)
        {
            if !out.contains(&model) {
                out.push(model);
            }
        }
        out
    }
}
