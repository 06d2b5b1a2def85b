//! Rule engine orchestrating lint runs.
//!
//! One run: load and scan every entry file, then for each merge state
//! (individual first, composed second) run every applicable rule: select
//! nodes, invoke the check, collect diagnostics.

use crate::config::{Config, ConfigError};
use crate::context::RuleContext;
use crate::document::{Document, LoadError};
use crate::graph::ReferenceGraph;
use crate::pointer::JsonPath;
use crate::query::{PathQuery, QueryError};
use crate::resource::ResourceModel;
use crate::rule::{Category, MergeState, OpenApiType, Rule, RuleBox};
use crate::types::{Diagnostic, LintResult, Location, Severity};
use crate::utils::paths::normalize_path;

use rayon::prelude::*;
use std::cell::Cell;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Rule name of diagnostics raised when a check fails.
pub const RULE_INTERNAL_ERROR: &str = "rule-internal-error";

/// Rule name of diagnostics raised when a referenced file cannot be loaded.
pub const FILE_LOAD_ERROR: &str = "file-load-error";

/// Rule id of [`FILE_LOAD_ERROR`] diagnostics.
pub const FILE_LOAD_ERROR_CODE: &str = "R0001";

thread_local! {
    /// Set while a rule check runs under `catch_unwind` on this thread.
    static IN_CHECK: Cell<bool> = const { Cell::new(false) };
}

/// Installs a panic hook that logs panics raised inside rule checks at
/// debug level instead of printing them. The engine already reports them as
/// `rule-internal-error` diagnostics. Panics elsewhere go to the previous
/// hook. Only the first call installs anything.
pub fn quiet_rule_panics() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if IN_CHECK.with(Cell::get) {
                debug!("Rule check panicked: {info}");
            } else {
                previous(info);
            }
        }));
    });
}

/// Errors that abort a lint run or engine construction.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum EngineError {
    /// An entry file could not be loaded.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Load(#[from] LoadError),

    /// A rule declares a selector that does not parse.
    #[error("rule '{rule}' has an invalid selector")]
    #[diagnostic(
        code(armlint::engine::invalid_selector),
        help("fix the selector expression in the rule definition")
    )]
    InvalidSelector {
        /// Name of the offending rule.
        rule: String,
        /// The parse error.
        #[source]
        source: QueryError,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    #[diagnostic(code(armlint::engine::config))]
    Config(#[from] ConfigError),
}

/// Builder for configuring a [`RuleEngine`].
#[derive(Default)]
pub struct RuleEngineBuilder {
    rules: Vec<RuleBox>,
    config: Option<Config>,
    openapi_type: Option<OpenApiType>,
    parallel: Option<bool>,
    only: Vec<String>,
}

impl RuleEngineBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule to the catalog.
    #[must_use]
    pub fn rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Adds a boxed rule to the catalog.
    #[must_use]
    pub fn rule_box(mut self, rule: RuleBox) -> Self {
        self.rules.push(rule);
        self
    }

    /// Adds several boxed rules to the catalog, keeping their order.
    #[must_use]
    pub fn rules<I>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = RuleBox>,
    {
        self.rules.extend(rules);
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Overrides the configured API kind.
    #[must_use]
    pub fn openapi_type(mut self, ty: OpenApiType) -> Self {
        self.openapi_type = Some(ty);
        self
    }

    /// Overrides the configured parallelism.
    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = Some(parallel);
        self
    }

    /// Restricts the run to rules whose name or id is listed.
    #[must_use]
    pub fn only<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only.extend(names.into_iter().map(Into::into));
        self
    }

    /// Builds the engine.
    ///
    /// Rules that are disabled, filtered out, or not applicable to the API
    /// kind are dropped. Every remaining selector is parsed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidSelector`] for a selector that does not
    /// parse.
    pub fn build(self) -> Result<RuleEngine, EngineError> {
        let config = self.config.unwrap_or_default();
        let openapi_type = self.openapi_type.unwrap_or(config.linter.openapi_type);
        let parallel = self.parallel.unwrap_or(config.linter.parallel);

        let mut rules = Vec::new();
        for rule in self.rules {
            if !config.is_rule_enabled(rule.name(), rule.code()) {
                debug!("Skipping disabled rule: {}", rule.name());
                continue;
            }
            if !self.only.is_empty()
                && !self
                    .only
                    .iter()
                    .any(|n| n == rule.name() || n.eq_ignore_ascii_case(rule.code()))
            {
                debug!("Skipping unselected rule: {}", rule.name());
                continue;
            }
            if !rule.applicability().applies_to(openapi_type) {
                debug!("Skipping rule {} for {openapi_type}", rule.name());
                continue;
            }

            let queries = rule
                .selectors()
                .iter()
                .map(|s| PathQuery::parse(s))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| EngineError::InvalidSelector {
                    rule: rule.name().to_string(),
                    source,
                })?;
            rules.push(CompiledRule { rule, queries });
        }

        Ok(RuleEngine {
            rules,
            config,
            openapi_type,
            parallel,
        })
    }
}

struct CompiledRule {
    rule: RuleBox,
    queries: Vec<PathQuery>,
}

/// The engine that runs a rule catalog over specifications.
///
/// Use [`RuleEngine::builder()`] to construct an instance.
pub struct RuleEngine {
    rules: Vec<CompiledRule>,
    config: Config,
    openapi_type: OpenApiType,
    parallel: bool,
}

impl RuleEngine {
    /// Creates a new builder for configuring an engine.
    #[must_use]
    pub fn builder() -> RuleEngineBuilder {
        RuleEngineBuilder::new()
    }

    /// Returns the number of active rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Active rules in catalog order.
    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|c| c.rule.as_ref())
    }

    /// The API kind rules were selected for.
    #[must_use]
    pub fn openapi_type(&self) -> OpenApiType {
        self.openapi_type
    }

    /// Lints one specification.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Load`] if the entry file cannot be loaded.
    pub fn lint(&self, entry: &Path) -> Result<LintResult, EngineError> {
        self.lint_many(&[entry.to_path_buf()])
    }

    /// Lints several specifications sharing one reference graph.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Load`] if an entry file cannot be loaded.
    pub fn lint_many(&self, entries: &[PathBuf]) -> Result<LintResult, EngineError> {
        let graph = ReferenceGraph::new();
        self.lint_graph(&graph, entries)
    }

    /// Lints specifications whose documents are (partly) already in `graph`,
    /// e.g. content supplied in memory through [`ReferenceGraph::insert`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Load`] if an entry file cannot be loaded.
    pub fn lint_graph(
        &self,
        graph: &ReferenceGraph,
        entries: &[PathBuf],
    ) -> Result<LintResult, EngineError> {
        info!(
            "Linting {} entry file(s) with {} rule(s)",
            entries.len(),
            self.rules.len()
        );

        let mut roots: Vec<Arc<Document>> = Vec::new();
        for entry in entries {
            let root = graph.scan(entry)?;
            if !roots.iter().any(|r| r.path() == root.path()) {
                roots.push(root);
            }
        }
        let models: Vec<ResourceModel<'_>> = roots
            .iter()
            .map(|root| ResourceModel::new(graph, root.path()))
            .collect();

        let mut result = LintResult::new();

        // Individual: every physical file once, attributed to the first entry
        // that reaches it.
        let mut seen: HashSet<PathBuf> = HashSet::new();
        for (root, model) in roots.iter().zip(&models) {
            let mut files = vec![root.path().to_path_buf()];
            files.extend(graph.reachable_files(root.path()));
            for file in files {
                if !seen.insert(file.clone()) {
                    continue;
                }
                let Some(document) = graph.cached(&file) else {
                    continue;
                };
                debug!("Individual rules on {}", file.display());
                let diagnostics =
                    self.run_phase(graph, model, &document, MergeState::Individual);
                result.diagnostics.extend(diagnostics);
                result.files_checked += 1;
            }
        }

        // Composed: once per entry with the whole specification in view.
        for (root, model) in roots.iter().zip(&models) {
            debug!("Composed rules on {}", root.path().display());
            let diagnostics = self.run_phase(graph, model, root, MergeState::Composed);
            result.diagnostics.extend(diagnostics);
        }

        result.diagnostics.extend(load_failures(graph));

        info!(
            "Lint complete: {} diagnostic(s) in {} file(s)",
            result.diagnostics.len(),
            result.files_checked
        );
        Ok(result)
    }

    fn run_phase(
        &self,
        graph: &ReferenceGraph,
        model: &ResourceModel<'_>,
        document: &Arc<Document>,
        merge_state: MergeState,
    ) -> Vec<Diagnostic> {
        let rules: Vec<&CompiledRule> = self
            .rules
            .iter()
            .filter(|c| c.rule.merge_state() == merge_state)
            .collect();

        let run = |compiled: &&CompiledRule| {
            let ctx = RuleContext {
                document,
                entry: model.entry(),
                graph,
                model,
                merge_state,
                openapi_type: self.openapi_type,
                rule_config: self.config.rule(compiled.rule.name(), compiled.rule.code()),
            };
            self.run_rule(&ctx, compiled)
        };

        let per_rule: Vec<Vec<Diagnostic>> = if self.parallel {
            rules.par_iter().map(run).collect()
        } else {
            rules.iter().map(run).collect()
        };
        per_rule.into_iter().flatten().collect()
    }

    fn run_rule(&self, ctx: &RuleContext<'_>, compiled: &CompiledRule) -> Vec<Diagnostic> {
        let rule = compiled.rule.as_ref();
        let severity = self.config.rule_severity(rule.name(), rule.code());
        let mut out = Vec::new();

        for query in &compiled.queries {
            for node in query.select(ctx.document.root()) {
                let path = node.path.clone();
                let mut produced = Vec::new();
                IN_CHECK.with(|flag| flag.set(true));
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    for item in rule.check(ctx, node) {
                        match item {
                            Ok(diagnostic) => produced.push(diagnostic),
                            Err(err) => return Err(err),
                        }
                    }
                    Ok(())
                }));
                IN_CHECK.with(|flag| flag.set(false));

                out.extend(produced.into_iter().map(|mut d| {
                    if let Some(severity) = severity {
                        d.severity = severity;
                    }
                    d.annotated()
                }));

                let failure = match outcome {
                    Ok(Ok(())) => continue,
                    Ok(Err(err)) => err.to_string(),
                    Err(payload) => panic_message(payload.as_ref()),
                };
                warn!("Rule {} failed at {}: {failure}", rule.name(), path);
                out.push(internal_error(rule, ctx.file(), path, &failure));
            }
        }
        out
    }
}

fn internal_error(rule: &dyn Rule, file: &Path, path: JsonPath, failure: &str) -> Diagnostic {
    Diagnostic::new(
        rule.code(),
        RULE_INTERNAL_ERROR,
        Severity::Error,
        Location::new(file, path),
        format!("rule '{}' failed: {failure}", rule.name()),
    )
    .with_category(Category::Internal)
    .annotated()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

/// One diagnostic per file that failed to load, located at the first file
/// referencing it.
fn load_failures(graph: &ReferenceGraph) -> Vec<Diagnostic> {
    graph
        .failures()
        .into_iter()
        .map(|err| {
            let failed = normalize_path(err.path());
            let referrer = graph
                .referrers(&failed)
                .into_iter()
                .next()
                .unwrap_or_else(|| failed.clone());
            Diagnostic::new(
                FILE_LOAD_ERROR_CODE,
                FILE_LOAD_ERROR,
                Severity::Error,
                Location::new(referrer, JsonPath::root()),
                err.to_string(),
            )
            .with_category(Category::Internal)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryMatch;
    use crate::rule::{from_diagnostics, CheckOutput, RuleError};
    use serde_json::json;

    struct BadSelector;

    impl Rule for BadSelector {
        fn name(&self) -> &'static str {
            "bad-selector"
        }
        fn code(&self) -> &'static str {
            "T0001"
        }
        fn selectors(&self) -> &'static [&'static str] {
            &["$.paths["]
        }
        fn check<'a>(&'a self, _ctx: &'a RuleContext<'a>, _node: QueryMatch<'a>) -> CheckOutput<'a> {
            from_diagnostics(Vec::new())
        }
    }

    struct Flaky;

    impl Rule for Flaky {
        fn name(&self) -> &'static str {
            "flaky"
        }
        fn code(&self) -> &'static str {
            "T0002"
        }
        fn selectors(&self) -> &'static [&'static str] {
            &["$.items.*"]
        }
        fn check<'a>(&'a self, ctx: &'a RuleContext<'a>, node: QueryMatch<'a>) -> CheckOutput<'a> {
            let first = ctx.report(self, node.path.clone(), "before failure");
            let items = match node.value.as_str() {
                Some("panic") => panic!("boom"),
                Some("error") => vec![Ok(first), Err(RuleError::msg("bad node"))],
                _ => vec![Ok(first)],
            };
            Box::new(items.into_iter())
        }
    }

    fn graph_with(value: serde_json::Value) -> (ReferenceGraph, PathBuf) {
        let graph = ReferenceGraph::new();
        let path = PathBuf::from("/spec/engine.json");
        graph.insert(Document::from_value(path.clone(), value));
        (graph, path)
    }

    #[test]
    fn invalid_selector_fails_at_build() {
        let err = RuleEngine::builder().rule(BadSelector).build().err().unwrap();
        assert!(matches!(err, EngineError::InvalidSelector { ref rule, .. } if rule == "bad-selector"));
    }

    #[test]
    fn disabled_and_unselected_rules_are_dropped() {
        let config = Config::parse("[rules.flaky]\nenabled = false\n").unwrap();
        let engine = RuleEngine::builder().rule(Flaky).config(config).build().unwrap();
        assert_eq!(engine.rule_count(), 0);

        let engine = RuleEngine::builder()
            .rule(Flaky)
            .rule(BadSelector)
            .only(["T0002"])
            .build()
            .unwrap();
        assert_eq!(engine.rules().map(|r| r.name()).collect::<Vec<_>>(), vec!["flaky"]);
    }

    #[test]
    fn failing_checks_are_isolated() {
        let (graph, entry) = graph_with(json!({"items": ["ok", "error", "panic", "ok"]}));
        let engine = RuleEngine::builder()
            .rule(Flaky)
            .parallel(false)
            .build()
            .unwrap();

        let result = engine.lint_graph(&graph, &[entry]).unwrap();
        let summary: Vec<(String, String)> = result
            .diagnostics
            .iter()
            .map(|d| (d.rule.clone(), d.location.pointer()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("flaky".to_string(), "/items/0".to_string()),
                ("flaky".to_string(), "/items/1".to_string()),
                (RULE_INTERNAL_ERROR.to_string(), "/items/1".to_string()),
                (RULE_INTERNAL_ERROR.to_string(), "/items/2".to_string()),
                ("flaky".to_string(), "/items/3".to_string()),
            ]
        );
        assert_eq!(result.diagnostics[2].code, "T0002");
        assert!(result.diagnostics[3].message.contains("boom"));
        assert_eq!(result.files_checked, 1);
    }

    struct ReportsIsolation;

    impl Rule for ReportsIsolation {
        fn name(&self) -> &'static str {
            "reports-isolation"
        }
        fn code(&self) -> &'static str {
            "T0003"
        }
        fn check<'a>(&'a self, ctx: &'a RuleContext<'a>, node: QueryMatch<'a>) -> CheckOutput<'a> {
            let message = format!("in check: {}", IN_CHECK.with(Cell::get));
            from_diagnostics(vec![ctx.report(self, node.path, message)])
        }
    }

    #[test]
    fn checks_run_flagged_for_the_quiet_panic_hook() {
        quiet_rule_panics();
        let (graph, entry) = graph_with(json!({"items": ["panic"]}));
        let engine = RuleEngine::builder()
            .rule(ReportsIsolation)
            .rule(Flaky)
            .parallel(false)
            .build()
            .unwrap();

        let result = engine.lint_graph(&graph, &[entry]).unwrap();
        assert_eq!(result.diagnostics[0].message, "in check: true");
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.rule == RULE_INTERNAL_ERROR && d.message.contains("boom")));
        assert!(!IN_CHECK.with(Cell::get));
    }

    #[test]
    fn severity_override_applies() {
        let (graph, entry) = graph_with(json!({"items": ["ok"]}));
        let config = Config::parse("[rules.T0002]\nseverity = \"info\"\n").unwrap();
        let engine = RuleEngine::builder().rule(Flaky).config(config).build().unwrap();
        let result = engine.lint_graph(&graph, &[entry]).unwrap();
        assert_eq!(result.diagnostics[0].severity, Severity::Info);
    }

    #[test]
    fn missing_entry_is_fatal() {
        let engine = RuleEngine::builder().rule(Flaky).build().unwrap();
        let err = engine.lint(Path::new("/no/such/spec.json")).unwrap_err();
        assert!(matches!(err, EngineError::Load(_)));
    }
}
