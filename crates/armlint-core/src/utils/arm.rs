//! ARM api-path helpers.
//!
//! ARM concepts (provider namespace, resource type, nesting depth) are never
//! declared explicitly; they are read off the shape of the api path, e.g.
//! `/subscriptions/{s}/resourceGroups/{g}/providers/Microsoft.Compute/virtualMachines/{vm}`.

use regex::Regex;
use std::sync::OnceLock;

const PROVIDERS: &str = "/providers/";

/// Splits an api path at its last `/providers/` segment.
///
/// Returns `(scope, remainder)` where `remainder` starts with the namespace.
#[must_use]
pub fn split_providers(api_path: &str) -> Option<(&str, &str)> {
    let lower = api_path.to_ascii_lowercase();
    let index = lower.rfind(PROVIDERS)?;
    Some((&api_path[..index], &api_path[index + PROVIDERS.len()..]))
}

/// Whether a path segment is a template parameter (`{name}`).
#[must_use]
pub fn is_param_segment(segment: &str) -> bool {
    segment.starts_with('{') && segment.ends_with('}')
}

/// Provider namespace of an api path (`Microsoft.Compute`).
#[must_use]
pub fn provider_namespace(api_path: &str) -> Option<String> {
    let (_, rest) = split_providers(api_path)?;
    rest.split('/')
        .find(|s| !s.is_empty())
        .filter(|s| !is_param_segment(s))
        .map(String::from)
}

/// Resource type of an api path: the literal segments after the namespace,
/// joined with `/` (`virtualMachines/extensions`).
#[must_use]
pub fn resource_type(api_path: &str) -> Option<String> {
    let types = type_segments(api_path)?;
    if types.is_empty() {
        None
    } else {
        Some(types.join("/"))
    }
}

/// Nesting depth of an api path under `/subscriptions/.../providers/<ns>/`.
///
/// Template parameters and the literal `default` are not counted. Returns
/// `None` for paths that are not subscription-scoped provider paths.
#[must_use]
pub fn hierarchy_depth(api_path: &str) -> Option<usize> {
    if !api_path.to_ascii_lowercase().starts_with("/subscriptions/") {
        return None;
    }
    let types = type_segments(api_path)?;
    Some(
        types
            .iter()
            .filter(|s| !s.eq_ignore_ascii_case("default"))
            .count(),
    )
}

/// Whether the path addresses an extension resource: one whose scope is
/// itself a provider resource or a free `{scope}` parameter.
#[must_use]
pub fn is_extension_path(api_path: &str) -> bool {
    let Some((scope, _)) = split_providers(api_path) else {
        return false;
    };
    let scope_lower = scope.to_ascii_lowercase();
    scope_lower.contains(PROVIDERS)
        || scope
            .split('/')
            .find(|s| !s.is_empty())
            .is_some_and(is_param_segment)
}

/// Normalizes an api path for loose comparison: parameter names become `{}`,
/// case is folded and trailing slashes are dropped.
///
/// `/Servers/{serverName}` and `/servers/{server1}` normalize identically.
#[must_use]
pub fn normalize_api_path(api_path: &str) -> String {
    let segments: Vec<String> = api_path
        .trim_end_matches('/')
        .split('/')
        .map(|s| {
            if is_param_segment(s) {
                "{}".to_string()
            } else {
                s.to_ascii_lowercase()
            }
        })
        .collect();
    segments.join("/")
}

/// Whether the path ends in one or more `/<type>/{name}` pairs after a
/// provider namespace, i.e. addresses a single resource instance.
#[must_use]
pub fn is_item_path(api_path: &str) -> bool {
    static ITEM_PATH: OnceLock<Option<Regex>> = OnceLock::new();
    ITEM_PATH
        .get_or_init(|| Regex::new(r"(?i)/providers/[^/]+(?:/[^/{}]+/\{[^/{}]+\})+$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(api_path.trim_end_matches('/')))
}

/// Strips the trailing `/{param}` of an item path, yielding the path of the
/// collection it belongs to.
#[must_use]
pub fn collection_path_of(item_path: &str) -> Option<&str> {
    let trimmed = item_path.trim_end_matches('/');
    let (head, last) = trimmed.rsplit_once('/')?;
    if is_param_segment(last) && !head.is_empty() {
        Some(head)
    } else {
        None
    }
}

fn type_segments(api_path: &str) -> Option<Vec<&str>> {
    let (_, rest) = split_providers(api_path)?;
    let mut segments = rest.split('/').filter(|s| !s.is_empty());
    segments.next()?;
    Some(segments.filter(|s| !is_param_segment(s)).collect())
}
