//! Evaluation of parsed selector steps.

use super::parser::Key;
use super::{CompareOp, Expr, Operand, QueryMatch, Selector, Step};
use crate::pointer::{JsonPath, Segment};
use serde_json::Value;
use std::collections::HashSet;

pub(super) fn evaluate<'a>(steps: &[Step], root: &'a Value) -> Vec<QueryMatch<'a>> {
    let mut current = vec![QueryMatch {
        path: JsonPath::root(),
        value: root,
        parent: None,
    }];

    for step in steps {
        let mut next = Vec::new();
        let mut seen = HashSet::new();
        for node in &current {
            match step {
                Step::Child(selector) => {
                    select_children(node, selector, &mut next, &mut seen);
                }
                Step::Descendant(selector) => {
                    for inner in self_and_descendants(node) {
                        select_children(&inner, selector, &mut next, &mut seen);
                    }
                }
            }
        }
        current = next;
        if current.is_empty() {
            break;
        }
    }

    current
}

fn children<'a>(node: &QueryMatch<'a>) -> Vec<QueryMatch<'a>> {
    match node.value {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| QueryMatch {
                path: node.path.child(key.as_str()),
                value,
                parent: Some(node.value),
            })
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, value)| QueryMatch {
                path: node.path.child(index),
                value,
                parent: Some(node.value),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Pre-order listing of `node` and everything below it.
fn self_and_descendants<'a>(node: &QueryMatch<'a>) -> Vec<QueryMatch<'a>> {
    let mut out = Vec::new();
    let mut stack = vec![node.clone()];
    while let Some(current) = stack.pop() {
        let mut kids = children(&current);
        out.push(current);
        kids.reverse();
        stack.extend(kids);
    }
    out
}

fn select_children<'a>(
    node: &QueryMatch<'a>,
    selector: &Selector,
    out: &mut Vec<QueryMatch<'a>>,
    seen: &mut HashSet<String>,
) {
    for child in children(node) {
        let keep = match selector {
            Selector::Wildcard => true,
            Selector::Union(keys) => keys.iter().any(|key| key_matches(key, &child)),
            Selector::Filter(expr) => test(expr, &child),
        };
        if keep && seen.insert(child.path.to_pointer()) {
            out.push(child);
        }
    }
}

fn key_matches(key: &Key, child: &QueryMatch<'_>) -> bool {
    match (key, child.path.last()) {
        (Key::Name(name), Some(Segment::Key(k))) => name == k,
        (Key::Name(name), Some(Segment::Index(i))) => name.parse::<usize>().ok() == Some(*i),
        (Key::Index(index), Some(Segment::Index(i))) => index == i,
        (Key::Index(index), Some(Segment::Key(k))) => k.parse::<usize>().ok() == Some(*index),
        (_, None) => false,
    }
}

fn test(expr: &Expr, candidate: &QueryMatch<'_>) -> bool {
    match expr {
        Expr::Or(left, right) => test(left, candidate) || test(right, candidate),
        Expr::And(left, right) => test(left, candidate) && test(right, candidate),
        Expr::Not(inner) => !test(inner, candidate),
        Expr::Truthy(operand) => operand_value(operand, candidate).is_some_and(|v| truthy(&v)),
        Expr::Compare(left, op, right) => {
            let equal = operand_value(left, candidate) == operand_value(right, candidate);
            match op {
                CompareOp::Eq => equal,
                CompareOp::Ne => !equal,
            }
        }
    }
}

fn operand_value(operand: &Operand, candidate: &QueryMatch<'_>) -> Option<Value> {
    match operand {
        Operand::Literal(value) => Some(value.clone()),
        Operand::Property => candidate.path.last().map(|segment| match segment {
            Segment::Key(key) => Value::String(key.clone()),
            Segment::Index(index) => Value::from(*index),
        }),
        Operand::Current(keys) => {
            let mut value = candidate.value;
            for key in keys {
                value = match (key, value) {
                    (Key::Name(name), Value::Object(map)) => map.get(name)?,
                    (Key::Name(name), Value::Array(items)) => items.get(name.parse::<usize>().ok()?)?,
                    (Key::Index(index), Value::Array(items)) => items.get(*index)?,
                    (Key::Index(index), Value::Object(map)) => map.get(&index.to_string())?,
                    _ => return None,
                };
            }
            Some(value.clone())
        }
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::super::select;
    use serde_json::json;

    #[test]
    fn truthiness_follows_json_values() {
        let doc = json!({"a": {"x": true}, "b": {"x": 0}, "c": {"x": "s"}, "d": {}});
        let keys: Vec<String> = select(&doc, "$[?(@.x)]")
            .iter()
            .map(|m| m.path.to_string())
            .collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn missing_operands_compare_unequal_to_literals() {
        let doc = json!({"a": {"type": "string"}, "b": {}});
        let matches = select(&doc, "$[?(@.type !== 'string')]");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].path.to_pointer(), "/b");
    }

    #[test]
    fn array_property_is_index() {
        let doc = json!({"items": ["x", "y", "z"]});
        let matches = select(&doc, "$.items[?(@property == 1)]");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].value, &json!("y"));
    }

    #[test]
    fn overlapping_descents_are_deduplicated() {
        let doc = json!({"a": {"a": {"b": 1}}});
        let matches = select(&doc, "$..a..b");
        assert_eq!(matches.len(), 1);
    }
}
