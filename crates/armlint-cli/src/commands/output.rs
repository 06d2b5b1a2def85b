//! Shared output formatting for lint results.

use anyhow::Result;
use armlint_core::{Diagnostic, LintResult, Severity};
use std::fmt::Write;

use crate::OutputFormat;

/// Print lint results in the specified format.
pub fn print(result: &LintResult, format: OutputFormat) -> Result<()> {
    print!("{}", render(result, format)?);
    Ok(())
}

/// Render lint results in the specified format.
pub fn render(result: &LintResult, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => render_text(result),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(result)?;
            json.push('\n');
            json
        }
        OutputFormat::Compact => render_compact(result),
    })
}

fn severity_indicator(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "\x1b[31merror\x1b[0m",
        Severity::Warning => "\x1b[33mwarning\x1b[0m",
        Severity::Info => "\x1b[34minfo\x1b[0m",
    }
}

fn render_text(result: &LintResult) -> String {
    let (errors, warnings, infos) = result.count_by_severity();
    let mut out = String::new();

    for diagnostic in &result.diagnostics {
        let _ = writeln!(
            out,
            "{} {} at {}",
            diagnostic.code, diagnostic.rule, diagnostic.location
        );
        let _ = writeln!(
            out,
            "  {}: {}",
            severity_indicator(diagnostic.severity),
            diagnostic.message
        );
        if let Some(scope) = resource_scope(diagnostic) {
            let _ = writeln!(out, "  = resource: {scope}");
        }
        if let Some(suggestion) = &diagnostic.suggestion {
            let _ = writeln!(out, "  = help: {suggestion}");
        }
        out.push('\n');
    }

    let summary_color = if errors > 0 {
        "\x1b[31m"
    } else if warnings > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };

    let _ = writeln!(
        out,
        "{summary_color}Found {errors} error(s), {warnings} warning(s), {infos} info(s) in {} file(s)\x1b[0m",
        result.files_checked
    );
    out
}

fn resource_scope(diagnostic: &Diagnostic) -> Option<String> {
    match (&diagnostic.provider_namespace, &diagnostic.resource_type) {
        (Some(ns), Some(ty)) => Some(format!("{ns}/{ty}")),
        (Some(ns), None) => Some(ns.clone()),
        _ => None,
    }
}

fn render_compact(result: &LintResult) -> String {
    let mut out = String::new();
    for diagnostic in &result.diagnostics {
        let _ = writeln!(out, "{diagnostic}");
    }
    out
}
