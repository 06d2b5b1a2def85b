//! Check command implementation.

use anyhow::{anyhow, bail, Context, Result};
use armlint_core::utils::normalize_path;
use armlint_core::{Config, LintResult, OpenApiType, ReferenceGraph, RuleEngine, Severity};
use armlint_rules::Preset;
use glob::Pattern;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config_resolver::{self, ConfigSource};
use crate::OutputFormat;

/// Extensions of specification files picked up from directories.
const SPEC_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

/// Options of the check command.
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Files or directories to lint.
    pub paths: Vec<PathBuf>,
    /// Output format.
    pub format: OutputFormat,
    /// Comma-separated rule names or ids.
    pub rules: Option<String>,
    /// Extra exclude patterns.
    pub exclude: Vec<String>,
    /// Rule preset name.
    pub preset: Option<String>,
    /// API kind override.
    pub openapi_type: Option<OpenApiType>,
    /// Failure threshold override.
    pub fail_on: Option<Severity>,
}

/// Runs the check command. Returns `true` when the run should fail.
pub fn run(options: &CheckOptions, explicit_config: Option<&Path>) -> Result<bool> {
    let project_dir = project_dir(&options.paths);
    let source = config_resolver::resolve(&project_dir, explicit_config);
    let config = load_config(&source)?;

    let preset_name = options
        .preset
        .clone()
        .or_else(|| config.preset.clone());
    let preset = match preset_name {
        Some(name) => name.parse::<Preset>()?,
        None => Preset::default(),
    };
    let fail_on = options.fail_on.unwrap_or(config.linter.fail_on);

    let mut exclude = config.linter.exclude.clone();
    exclude.extend(options.exclude.iter().cloned());
    let exclude = compile_patterns(&exclude)?;

    let mut builder = RuleEngine::builder()
        .rules(preset.rules())
        .config(config);
    if let Some(ty) = options.openapi_type {
        builder = builder.openapi_type(ty);
    }
    if let Some(filter) = &options.rules {
        builder = builder.only(
            filter
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty()),
        );
    }
    let engine = builder
        .build()
        .map_err(|e| anyhow!("{:?}", miette::Report::new(e)))
        .context("Failed to build rule engine")?;

    let graph = ReferenceGraph::new();
    let entries = entry_files(&graph, &options.paths, &exclude)?;
    if entries.is_empty() {
        bail!("No specification files found");
    }

    tracing::debug!(
        "{preset} preset, {} api, {} rule(s) enabled",
        engine.openapi_type(),
        engine.rule_count()
    );

    let result = engine
        .lint_graph(&graph, &entries)
        .map_err(|e| anyhow!("{:?}", miette::Report::new(e)))
        .context("Lint run failed")?;

    super::output::print(&result, options.format)?;

    Ok(should_fail(&result, fail_on))
}

/// Whether any diagnostic meets the failure threshold.
pub fn should_fail(result: &LintResult, fail_on: Severity) -> bool {
    result.has_diagnostics_at(fail_on)
}

fn load_config(source: &ConfigSource) -> Result<Config> {
    match source {
        ConfigSource::Default => Ok(Config::default()),
        other => {
            // Invariant: non-Default variants always have a path
            let p = other.path().context("resolved config has no path")?;
            if source.is_global() {
                tracing::info!("Using global config: {}", p.display());
            }
            Config::from_file(p).with_context(|| format!("Failed to load config: {}", p.display()))
        }
    }
}

/// The directory configuration is looked up in: the first path, or its
/// parent when it is a file.
fn project_dir(paths: &[PathBuf]) -> PathBuf {
    let Some(first) = paths.first() else {
        return PathBuf::from(".");
    };
    if first.is_file() {
        first
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    } else {
        first.clone()
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).with_context(|| format!("Invalid exclude pattern: {p}")))
        .collect()
}

fn is_excluded(path: &Path, exclude: &[Pattern]) -> bool {
    exclude.iter().any(|p| p.matches_path(path))
}

/// Specification files under `dir`, sorted, minus excluded ones.
pub fn discover(dir: &Path, exclude: &[Pattern]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for ext in SPEC_EXTENSIONS {
        let pattern = dir.join("**").join(format!("*.{ext}"));
        let pattern = pattern.to_string_lossy();
        for entry in glob::glob(&pattern).with_context(|| format!("Invalid glob: {pattern}"))? {
            match entry {
                Ok(path) if path.is_file() && !is_excluded(&path, exclude) => files.push(path),
                Ok(_) => {}
                Err(e) => tracing::warn!("Skipping unreadable path: {e}"),
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Entry files for the run.
///
/// Explicit files are always entries and must load. Files discovered in a
/// directory are taken in sorted order; one is skipped when an entry chosen
/// before it already reaches it, so shared definitions are linted through
/// the specifications using them and every reference cycle still yields an
/// entry. A discovered file that cannot be loaded is not an entry; its
/// recorded failure is reported as a `file-load-error` diagnostic.
fn entry_files(
    graph: &ReferenceGraph,
    paths: &[PathBuf],
    exclude: &[Pattern],
) -> Result<Vec<PathBuf>> {
    let mut explicit = Vec::new();
    let mut discovered = Vec::new();
    for path in paths {
        if path.is_dir() {
            discovered.extend(discover(path, exclude)?);
        } else {
            explicit.push(normalize_path(path));
        }
    }

    for file in &explicit {
        graph
            .scan(file)
            .map_err(|e| anyhow!("{:?}", miette::Report::new(e)))?;
    }

    let mut loaded = Vec::new();
    for file in discovered {
        let file = normalize_path(&file);
        match graph.scan(&file) {
            Ok(_) => loaded.push(file),
            Err(e) => tracing::warn!("Skipping {}: {e}", file.display()),
        }
    }

    // Roots first: a file nothing references is an entry regardless of order.
    let (roots, referenced): (Vec<PathBuf>, Vec<PathBuf>) = loaded
        .into_iter()
        .partition(|file| graph.referrers(file).is_empty());

    let mut entries = explicit;
    let mut covered: HashSet<PathBuf> = entries
        .iter()
        .flat_map(|entry| graph.reachable_files(entry))
        .collect();
    for file in roots.into_iter().chain(referenced) {
        if entries.contains(&file) || covered.contains(&file) {
            tracing::debug!("Not an entry (referenced): {}", file.display());
            continue;
        }
        covered.extend(graph.reachable_files(&file));
        entries.push(file);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn spec_tree() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("common")).unwrap();
        fs::create_dir_all(root.join("examples")).unwrap();
        fs::write(
            root.join("widgets.json"),
            r##"{"paths": {}, "definitions": {"W": {"$ref": "./common/types.json#/definitions/T"}}}"##,
        )
        .unwrap();
        fs::write(
            root.join("common/types.json"),
            r#"{"definitions": {"T": {"type": "object"}}}"#,
        )
        .unwrap();
        fs::write(root.join("gadgets.yaml"), "paths: {}\n").unwrap();
        fs::write(root.join("examples/Widgets_Get.json"), "{}").unwrap();
        fs::write(root.join("README.md"), "# specs").unwrap();
        tmp
    }

    #[test]
    fn discover_finds_json_and_yaml_and_honors_excludes() {
        let tmp = spec_tree();
        let exclude = compile_patterns(&["**/examples/**".to_string()]).unwrap();
        let names: Vec<String> = discover(tmp.path(), &exclude)
            .unwrap()
            .iter()
            .map(|p| p.strip_prefix(tmp.path()).unwrap().display().to_string())
            .collect();
        assert_eq!(names, vec!["common/types.json", "gadgets.yaml", "widgets.json"]);
    }

    #[test]
    fn referenced_files_are_not_entries() {
        let tmp = spec_tree();
        let exclude = compile_patterns(&["**/examples/**".to_string()]).unwrap();
        let graph = ReferenceGraph::new();
        let entries = entry_files(&graph, &[tmp.path().to_path_buf()], &exclude).unwrap();
        let mut names: Vec<String> = entries
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["gadgets.yaml", "widgets.json"]);
    }

    #[test]
    fn explicit_files_are_always_entries() {
        let tmp = spec_tree();
        let graph = ReferenceGraph::new();
        let types = tmp.path().join("common/types.json");
        let entries = entry_files(&graph, &[types.clone()], &[]).unwrap();
        assert_eq!(entries, vec![normalize_path(&types)]);
    }

    #[test]
    fn mutually_referencing_files_yield_one_entry() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("a.json"),
            r##"{"definitions": {"A": {"$ref": "./b.json#/definitions/B"}}}"##,
        )
        .unwrap();
        fs::write(
            tmp.path().join("b.json"),
            r##"{"definitions": {"B": {"$ref": "./a.json#/definitions/A"}}}"##,
        )
        .unwrap();

        let graph = ReferenceGraph::new();
        let entries = entry_files(&graph, &[tmp.path().to_path_buf()], &[]).unwrap();
        assert_eq!(entries, vec![normalize_path(&tmp.path().join("a.json"))]);
    }

    #[test]
    fn cycle_below_a_root_adds_no_entry() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("a.json"),
            r##"{"definitions": {"A": {"$ref": "./b.json#/definitions/B"}}}"##,
        )
        .unwrap();
        fs::write(
            tmp.path().join("b.json"),
            r##"{"definitions": {"B": {"$ref": "./a.json#/definitions/A"}}}"##,
        )
        .unwrap();
        fs::write(
            tmp.path().join("z.json"),
            r##"{"paths": {}, "definitions": {"Z": {"$ref": "./a.json#/definitions/A"}}}"##,
        )
        .unwrap();

        let graph = ReferenceGraph::new();
        let entries = entry_files(&graph, &[tmp.path().to_path_buf()], &[]).unwrap();
        assert_eq!(entries, vec![normalize_path(&tmp.path().join("z.json"))]);
    }

    #[test]
    fn unparsable_discovered_file_is_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("good.json"), r#"{"paths": {}}"#).unwrap();
        fs::write(tmp.path().join("notes.json"), "{ not json").unwrap();

        let graph = ReferenceGraph::new();
        let entries = entry_files(&graph, &[tmp.path().to_path_buf()], &[]).unwrap();
        assert_eq!(entries, vec![normalize_path(&tmp.path().join("good.json"))]);
    }

    #[test]
    fn unparsable_explicit_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let notes = tmp.path().join("notes.json");
        fs::write(&notes, "{ not json").unwrap();

        let graph = ReferenceGraph::new();
        assert!(entry_files(&graph, &[notes], &[]).is_err());
    }

    #[test]
    fn project_dir_of_a_file_is_its_parent() {
        let tmp = spec_tree();
        let file = tmp.path().join("widgets.json");
        assert_eq!(project_dir(&[file]), tmp.path().to_path_buf());
        assert_eq!(project_dir(&[]), PathBuf::from("."));
    }

    #[test]
    fn invalid_exclude_pattern_is_an_error() {
        assert!(compile_patterns(&["[".to_string()]).is_err());
    }
}
