//! Bounded depth-first search over JSON string leaves.

use serde_json::Value;

/// Return the first string leaf, in document order, for which `pred` holds.
///
/// Containers nested deeper than `max_depth` are not entered, so
/// pathological inputs cannot drive unbounded recursion.
pub(crate) fn find_string<'a, F>(value: &'a Value, max_depth: usize, mut pred: F) -> Option<&'a str>
where
    F: FnMut(&'a str) -> bool,
{
    visit(value, 0, max_depth, &mut pred)
}

fn visit<'a, F>(value: &'a Value, depth: usize, max_depth: usize, pred: &mut F) -> Option<&'a str>
where
    F: FnMut(&'a str) -> bool,
{
    if depth > max_depth {
        return None;
    }
    match value {
        Value::String(s) => pred(s).then_some(s.as_str()),
        Value::Array(items) => items
            .iter()
            .find_map(|item| visit(item, depth + 1, max_depth, pred)),
        Value::Object(map) => map
            .values()
            .find_map(|item| visit(item, depth + 1, max_depth, pred)),
        Value::Null | Value::Bool(_) | Value::Number(_) => None,
    }
}
