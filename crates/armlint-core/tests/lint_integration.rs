//! Integration test: multi-file specifications end-to-end via RuleEngine.
//!
//! Uses the fixture specification under `tests/fixtures/widgets/` (a JSON
//! entry file, YAML models and shared common types) and specifications
//! written to temporary directories.

use armlint_core::{
    from_diagnostics, CheckOutput, Config, EngineError, MergeState, QueryMatch, ReferenceGraph,
    ResourceModel, Rule, RuleContext, RuleEngine, Severity, FILE_LOAD_ERROR, FILE_LOAD_ERROR_CODE,
};
use std::fs;
use std::path::{Path, PathBuf};

fn fixture_entry() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/widgets/widgets.json")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Reports every file it is run on.
struct PerFile;

impl Rule for PerFile {
    fn name(&self) -> &'static str {
        "per-file"
    }
    fn code(&self) -> &'static str {
        "T0001"
    }
    fn default_severity(&self) -> Severity {
        Severity::Info
    }
    fn check<'a>(&'a self, ctx: &'a RuleContext<'a>, node: QueryMatch<'a>) -> CheckOutput<'a> {
        let message = format!("saw {}", file_name(ctx.file()));
        from_diagnostics(vec![ctx.report(self, node.path, message)])
    }
}

/// Reports every inferred resource once per entry.
struct ResourceSummary;

impl Rule for ResourceSummary {
    fn name(&self) -> &'static str {
        "resource-summary"
    }
    fn code(&self) -> &'static str {
        "T0002"
    }
    fn merge_state(&self) -> MergeState {
        MergeState::Composed
    }
    fn check<'a>(&'a self, ctx: &'a RuleContext<'a>, _node: QueryMatch<'a>) -> CheckOutput<'a> {
        let diagnostics = ctx
            .model
            .all_resources()
            .iter()
            .map(|resource| {
                let listed = resource
                    .item_paths()
                    .iter()
                    .any(|path| ctx.model.collection_for_item(path).is_some());
                let message = format!(
                    "tracked={} depth={} listed={listed}",
                    resource.is_tracked(),
                    resource.hierarchy_depth().unwrap_or_default()
                );
                ctx.report_at(self, resource.defining_file(), resource.model.pointer(), message)
            })
            .collect();
        from_diagnostics(diagnostics)
    }
}

fn engine() -> RuleEngine {
    RuleEngine::builder()
        .rule(PerFile)
        .rule(ResourceSummary)
        .build()
        .expect("engine should build")
}

// ── Resource model over the fixture ──

#[test]
fn resource_model_spans_entry_models_and_common_types() {
    let graph = ReferenceGraph::new();
    let entry = fixture_entry();
    graph.scan(&entry).expect("entry should load");
    assert_eq!(graph.len(), 3);
    assert!(graph.failures().is_empty());

    let model = ResourceModel::new(&graph, &entry);
    let names: Vec<&str> = model.all_resources().iter().map(|r| r.name()).collect();
    assert_eq!(names, vec!["Widget", "WidgetSetting"]);

    let tracked: Vec<&str> = model.tracked_resources().iter().map(|r| r.name()).collect();
    assert_eq!(tracked, vec!["Widget"]);
    let nested: Vec<&str> = model.nested_resources().iter().map(|r| r.name()).collect();
    assert_eq!(nested, vec!["WidgetSetting"]);

    let set = model.x_ms_resource_set();
    for name in ["Resource", "TrackedResource", "ProxyResource", "Widget", "WidgetSetting"] {
        assert!(
            set.models.iter().any(|m| m.name == name),
            "{name} should be in the x-ms-resource set"
        );
    }
    assert!(!set.models.iter().any(|m| m.name == "WidgetList"));

    let apis = model.collection_apis();
    assert_eq!(apis.len(), 1);
    assert_eq!(apis[0].child_model.name, "Widget");
    assert_eq!(
        apis[0].parent_model.as_ref().map(|m| m.name.as_str()),
        Some("WidgetList")
    );

    let missing = model.resources_without_collection();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].0.name(), "WidgetSetting");
    assert!(missing[0].1.ends_with("/settings/{settingName}"));
}

// ── Engine phases ──

#[test]
fn individual_rules_run_per_file_and_composed_once() {
    let result = engine().lint(&fixture_entry()).expect("lint should succeed");
    assert_eq!(result.files_checked, 3);

    let mut seen: Vec<String> = result
        .diagnostics
        .iter()
        .filter(|d| d.code == "T0001")
        .map(|d| d.message.clone())
        .collect();
    seen.sort();
    assert_eq!(seen, vec!["saw models.yaml", "saw types.json", "saw widgets.json"]);

    let composed = result.diagnostics.iter().filter(|d| d.code == "T0002").count();
    assert_eq!(composed, 2);
    assert!(!result.has_errors());
}

#[test]
fn composed_diagnostics_snapshot() {
    let result = engine().lint(&fixture_entry()).expect("lint should succeed");
    let rendered: Vec<String> = result
        .diagnostics
        .iter()
        .filter(|d| d.rule == "resource-summary")
        .map(|d| {
            format!(
                "{} {}#{} {}",
                d.code,
                file_name(&d.location.file),
                d.location.pointer(),
                d.message
            )
        })
        .collect();
    insta::assert_snapshot!(rendered.join("\n"), @r"
    T0002 models.yaml#/definitions/Widget tracked=true depth=1 listed=true
    T0002 models.yaml#/definitions/WidgetSetting tracked=false depth=2 listed=false
    ");
}

#[test]
fn lint_many_lints_shared_files_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("shared.json"),
        r#"{"definitions": {"Thing": {"type": "object"}}}"#,
    )
    .expect("write shared");
    for name in ["a.json", "b.json"] {
        fs::write(
            dir.path().join(name),
            r##"{"paths": {}, "definitions": {"Local": {"$ref": "./shared.json#/definitions/Thing"}}}"##,
        )
        .expect("write entry");
    }

    let entries = vec![dir.path().join("a.json"), dir.path().join("b.json")];
    let result = engine().lint_many(&entries).expect("lint should succeed");
    assert_eq!(result.files_checked, 3);

    let shared_hits = result
        .diagnostics
        .iter()
        .filter(|d| d.message == "saw shared.json")
        .count();
    assert_eq!(shared_hits, 1);
}

// ── Load failures ──

#[test]
fn missing_referenced_file_becomes_a_diagnostic() {
    let dir = tempfile::tempdir().expect("tempdir");
    let entry = dir.path().join("spec.json");
    fs::write(
        &entry,
        r##"{"definitions": {"Gone": {"$ref": "./missing.json#/definitions/Gone"}}}"##,
    )
    .expect("write entry");

    let result = engine().lint(&entry).expect("lint should succeed");
    let failures: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.rule == FILE_LOAD_ERROR)
        .collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].code, FILE_LOAD_ERROR_CODE);
    assert_eq!(failures[0].severity, Severity::Error);
    assert_eq!(file_name(&failures[0].location.file), "spec.json");
    assert_eq!(failures[0].location.pointer(), "");
    assert!(failures[0].message.contains("missing.json"));
    assert!(result.has_errors());
}

#[test]
fn unparsable_referenced_file_becomes_a_diagnostic() {
    let dir = tempfile::tempdir().expect("tempdir");
    let entry = dir.path().join("spec.json");
    fs::write(&entry, r##"{"definitions": {"X": {"$ref": "./broken.json#/definitions/X"}}}"##)
        .expect("write entry");
    fs::write(dir.path().join("broken.json"), "{ not json").expect("write broken");

    let result = engine().lint(&entry).expect("lint should succeed");
    assert_eq!(result.files_checked, 1);
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.rule == FILE_LOAD_ERROR && d.message.contains("broken.json")));
}

#[test]
fn missing_entry_file_aborts_the_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = engine()
        .lint(&dir.path().join("nope.json"))
        .expect_err("missing entry should fail");
    assert!(matches!(err, EngineError::Load(_)));
}

#[test]
fn cyclic_file_references_terminate() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("a.json"),
        r##"{"definitions": {"A": {"properties": {"b": {"$ref": "./b.json#/definitions/B"}}}}}"##,
    )
    .expect("write a");
    fs::write(
        dir.path().join("b.json"),
        r##"{"definitions": {"B": {"properties": {"a": {"$ref": "./a.json#/definitions/A"}}}}}"##,
    )
    .expect("write b");

    let result = engine()
        .lint(&dir.path().join("a.json"))
        .expect("lint should succeed");
    assert_eq!(result.files_checked, 2);
}

// ── Configuration ──

#[test]
fn config_disables_rules_and_overrides_severity() {
    let config = Config::parse(
        r#"
[rules.per-file]
enabled = false

[rules.T0002]
severity = "error"
"#,
    )
    .expect("config should parse");

    let engine = RuleEngine::builder()
        .rule(PerFile)
        .rule(ResourceSummary)
        .config(config)
        .parallel(false)
        .build()
        .expect("engine should build");
    assert_eq!(engine.rule_count(), 1);

    let result = engine.lint(&fixture_entry()).expect("lint should succeed");
    assert_eq!(result.diagnostics.len(), 2);
    assert!(result.diagnostics.iter().all(|d| d.severity == Severity::Error));
    assert_eq!(result.count_by_severity(), (2, 0, 0));
}
