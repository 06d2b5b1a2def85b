//! Loading and parsing of single specification files.

use crate::pointer::JsonPath;
use crate::utils::paths::{is_remote, normalize_path, resolve_relative};

use serde_json::Value;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Errors raised while loading a document.
#[derive(Debug, Clone, thiserror::Error, miette::Diagnostic)]
pub enum LoadError {
    /// The file could not be read.
    #[error("Failed to read {path}: {message}")]
    #[diagnostic(code(armlint::load::io), help("check that the file exists and is readable"))]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error message.
        message: String,
    },

    /// The file is not valid JSON or YAML.
    #[error("Failed to parse {path}: {message}")]
    #[diagnostic(code(armlint::load::parse))]
    Parse {
        /// Path that failed to parse.
        path: PathBuf,
        /// Parser error message.
        message: String,
    },
}

impl LoadError {
    /// Returns the path the error is about.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } | Self::Parse { path, .. } => path,
        }
    }
}

/// A `$ref` found inside a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reference {
    /// Normalized target file, or `None` for a local (`#/...`) reference.
    pub target_file: Option<PathBuf>,
    /// Pointer into the target document.
    pub pointer: JsonPath,
    /// The raw `$ref` string.
    pub raw: String,
    /// Whether the file part is a remote URL (never loaded).
    pub remote: bool,
}

impl Reference {
    /// Parses a raw `$ref` value relative to the file it appears in.
    ///
    /// The part before `#` names the target file; an empty file part makes the
    /// reference local.
    #[must_use]
    pub fn parse(raw: &str, base_file: &Path) -> Self {
        let (file_part, pointer_part) = match raw.split_once('#') {
            Some((file, pointer)) => (file, pointer),
            None => (raw, ""),
        };

        let remote = is_remote(file_part);
        let target_file = if file_part.is_empty() {
            None
        } else if remote {
            Some(PathBuf::from(file_part))
        } else {
            Some(resolve_relative(base_file, file_part))
        };

        Self {
            target_file,
            pointer: JsonPath::from_pointer(pointer_part),
            raw: raw.to_string(),
            remote,
        }
    }

    /// Whether the reference stays inside `file`.
    #[must_use]
    pub fn is_local_to(&self, file: &Path) -> bool {
        self.target_file.as_deref().map_or(true, |t| t == file)
    }

    /// Returns `(file, pointer)` with local references pinned to `current`.
    #[must_use]
    pub fn target_in(&self, current: &Path) -> (PathBuf, &JsonPath) {
        let file = self
            .target_file
            .clone()
            .unwrap_or_else(|| current.to_path_buf());
        (file, &self.pointer)
    }
}

/// A parsed specification file.
///
/// Identity is the normalized absolute path. Immutable after parsing.
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    root: Value,
    references: BTreeSet<Reference>,
}

impl Document {
    /// Loads and parses a file from disk.
    ///
    /// YAML is selected by a `.yaml`/`.yml` extension, everything else is JSON.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let path = normalize_path(path);
        debug!("Loading document: {}", path.display());
        let content = std::fs::read_to_string(&path).map_err(|e| LoadError::Io {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Self::parse(&path, &content)
    }

    /// Parses document content that belongs to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Parse`] on a syntax error.
    pub fn parse(path: &Path, content: &str) -> Result<Self, LoadError> {
        let path = normalize_path(path);
        let root: Value = if is_yaml(&path) {
            let yaml: serde_yaml::Value =
                serde_yaml::from_str(content).map_err(|e| LoadError::Parse {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
            yaml_to_json(yaml)
        } else {
            serde_json::from_str(content).map_err(|e| LoadError::Parse {
                path: path.clone(),
                message: e.to_string(),
            })?
        };
        Ok(Self::from_value(path, root))
    }

    /// Wraps an already-parsed tree.
    #[must_use]
    pub fn from_value(path: PathBuf, root: Value) -> Self {
        let mut references = BTreeSet::new();
        collect_references(&root, &path, &mut references);
        Self {
            path,
            root,
            references,
        }
    }

    /// Normalized absolute path of this document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The parsed tree.
    #[must_use]
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// All `$ref`s found anywhere in the document.
    #[must_use]
    pub fn references(&self) -> &BTreeSet<Reference> {
        &self.references
    }

    /// Distinct files this document references, excluding itself and remote
    /// URLs.
    #[must_use]
    pub fn referenced_files(&self) -> BTreeSet<PathBuf> {
        self.references
            .iter()
            .filter(|r| !r.remote)
            .filter_map(|r| r.target_file.clone())
            .filter(|f| f != &self.path)
            .collect()
    }

    /// Looks up the node at `path`.
    #[must_use]
    pub fn get(&self, path: &JsonPath) -> Option<&Value> {
        path.lookup(&self.root)
    }

    /// The `definitions` section, if any.
    #[must_use]
    pub fn definitions(&self) -> Option<&serde_json::Map<String, Value>> {
        self.root.get("definitions").and_then(Value::as_object)
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

/// Converts a YAML tree into the JSON model. Non-string mapping keys
/// (`200:` under `responses`) are stringified.
fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = serde_json::Map::new();
            for (key, value) in mapping {
                map.insert(yaml_key(key), yaml_to_json(value));
            }
            Value::Object(map)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

fn collect_references(value: &Value, base: &Path, out: &mut BTreeSet<Reference>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(raw)) = map.get("$ref") {
                out.insert(Reference::parse(raw, base));
            }
            for child in map.values() {
                collect_references(child, base, out);
            }
        }
        Value::Array(items) => {
            for child in items {
                collect_references(child, base, out);
            }
        }
        _ => {}
    }
}
