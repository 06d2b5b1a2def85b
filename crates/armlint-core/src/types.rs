//! Core types for lint diagnostics and results.

use crate::pointer::JsonPath;
use crate::rule::Category;
use crate::utils::arm::{provider_namespace, resource_type};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Severity level for lint diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, does not fail lint.
    Info,
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

/// Where a diagnostic points: a file and a location inside its tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File the path applies to.
    pub file: PathBuf,
    /// Structural path inside the file.
    pub path: JsonPath,
}

impl Location {
    /// Creates a new location.
    #[must_use]
    pub fn new(file: impl Into<PathBuf>, path: JsonPath) -> Self {
        Self {
            file: file.into(),
            path,
        }
    }

    /// The path as an RFC 6901 pointer.
    #[must_use]
    pub fn pointer(&self) -> String {
        self.path.to_pointer()
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.file.display(), self.path.to_pointer())
    }
}

/// A finding produced by a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Rule id (e.g., "R4001").
    pub code: String,
    /// Rule name (e.g., "tracked-resource-delete-operation").
    pub rule: String,
    /// Report grouping.
    pub category: Category,
    /// Severity of this diagnostic.
    pub severity: Severity,
    /// Where the problem is.
    pub location: Location,
    /// Human-readable message.
    pub message: String,
    /// Optional hint for fixing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Provider namespace, when the location is under `paths/<apiPath>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_namespace: Option<String>,
    /// Resource type, when the location is under `paths/<apiPath>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
}

impl Diagnostic {
    /// Creates a new diagnostic.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        rule: impl Into<String>,
        severity: Severity,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            rule: rule.into(),
            category: Category::ArmViolation,
            severity,
            location,
            message: message.into(),
            suggestion: None,
            provider_namespace: None,
            resource_type: None,
        }
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Adds a suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Fills provider namespace and resource type from the location's api
    /// path. Locations outside `paths`/`x-ms-paths` are left untouched.
    #[must_use]
    pub fn annotated(mut self) -> Self {
        if let Some(api_path) = self.location.path.api_path() {
            self.provider_namespace = provider_namespace(api_path);
            self.resource_type = resource_type(api_path);
        }
        self
    }

    /// Formats the diagnostic for terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let mut output = format!(
            "{} {} at {}\n",
            self.code,
            self.rule,
            self.location
        );
        let _ = writeln!(output, "  {}: {}", self.severity, self.message);
        if let Some(suggestion) = &self.suggestion {
            let _ = writeln!(output, "  = help: {suggestion}");
        }
        output
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} [{}] {}",
            self.location, self.severity, self.code, self.message
        )
    }
}

/// Result of a lint run.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LintResult {
    /// All diagnostics, in emission order.
    pub diagnostics: Vec<Diagnostic>,
    /// Number of files checked.
    pub files_checked: usize,
}

impl LintResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.has_diagnostics_at(Severity::Error)
    }

    /// Checks if any diagnostic meets or exceeds the given severity.
    #[must_use]
    pub fn has_diagnostics_at(&self, severity: Severity) -> bool {
        self.diagnostics.iter().any(|d| d.severity >= severity)
    }

    /// Returns diagnostics filtered by severity.
    #[must_use]
    pub fn by_severity(&self, severity: Severity) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .collect()
    }

    /// Diagnostics grouped by provider namespace. Diagnostics without one
    /// are grouped under the empty string.
    #[must_use]
    pub fn by_provider(&self) -> BTreeMap<String, Vec<&Diagnostic>> {
        let mut groups: BTreeMap<String, Vec<&Diagnostic>> = BTreeMap::new();
        for d in &self.diagnostics {
            groups
                .entry(d.provider_namespace.clone().unwrap_or_default())
                .or_default()
                .push(d);
        }
        groups
    }

    /// Counts diagnostics by severity as `(errors, warnings, infos)`.
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        let count = |s: Severity| self.diagnostics.iter().filter(|d| d.severity == s).count();
        (
            count(Severity::Error),
            count(Severity::Warning),
            count(Severity::Info),
        )
    }

    /// Adds diagnostics from another result.
    pub fn extend(&mut self, other: Self) {
        self.diagnostics.extend(other.diagnostics);
        self.files_checked += other.files_checked;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_diagnostic(severity: Severity, path: &[&str]) -> Diagnostic {
        Diagnostic::new(
            "R4001",
            "tracked-resource-delete-operation",
            severity,
            Location::new("/specs/compute.json", path.iter().copied().collect()),
            "missing delete",
        )
    }

    const VM_PATH: &str = "/subscriptions/{s}/resourceGroups/{g}/providers/Microsoft.Compute/virtualMachines/{vm}";

    #[test]
    fn annotation_reads_api_path() {
        let d = make_diagnostic(Severity::Error, &["paths", VM_PATH, "put"]).annotated();
        assert_eq!(d.provider_namespace.as_deref(), Some("Microsoft.Compute"));
        assert_eq!(d.resource_type.as_deref(), Some("virtualMachines"));
    }

    #[test]
    fn annotation_skips_definitions() {
        let d = make_diagnostic(Severity::Error, &["definitions", "Foo"]).annotated();
        assert!(d.provider_namespace.is_none());
        assert!(d.resource_type.is_none());
    }

    #[test]
    fn location_renders_pointer() {
        let d = make_diagnostic(Severity::Error, &["paths", "/a/{b}", "get"]);
        assert_eq!(d.location.pointer(), "/paths/~1a~1{b}/get");
        assert_eq!(d.location.path.to_string(), "paths./a/{b}.get");
        assert!(d.format().contains("/specs/compute.json#/paths/~1a~1{b}/get"));
    }

    #[test]
    fn severity_thresholds() {
        let mut result = LintResult::new();
        result.diagnostics.push(make_diagnostic(Severity::Warning, &[]));
        assert!(!result.has_errors());
        assert!(result.has_diagnostics_at(Severity::Warning));
        assert!(result.has_diagnostics_at(Severity::Info));
        assert_eq!(result.count_by_severity(), (0, 1, 0));
    }

    #[test]
    fn grouping_by_provider() {
        let mut result = LintResult::new();
        result
            .diagnostics
            .push(make_diagnostic(Severity::Error, &["paths", VM_PATH]).annotated());
        result
            .diagnostics
            .push(make_diagnostic(Severity::Error, &["definitions", "Foo"]).annotated());
        let groups = result.by_provider();
        assert_eq!(groups["Microsoft.Compute"].len(), 1);
        assert_eq!(groups[""].len(), 1);
    }

    #[test]
    fn extend_accumulates_files() {
        let mut a = LintResult::new();
        a.files_checked = 2;
        let mut b = LintResult::new();
        b.files_checked = 3;
        b.diagnostics.push(make_diagnostic(Severity::Info, &[]));
        a.extend(b);
        assert_eq!(a.files_checked, 5);
        assert_eq!(a.by_severity(Severity::Info).len(), 1);
    }
}
