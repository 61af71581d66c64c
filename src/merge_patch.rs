//! JSON Merge Patch, RFC 7396.

use serde_json::{Map, Value as JsonValue};

/// Apply `patch` to a copy of `target`.
///
/// An object patch merges member by member: `null` removes a member, any
/// other value is merged recursively into it. A patch that is not an object
/// replaces the target outright.
///
/// ```
/// use jsonsift::apply_merge_patch;
/// use serde_json::json;
///
/// let target = json!({"title": "Goodbye!", "author": {"givenName": "John", "familyName": "Doe"}});
/// let patch = json!({"title": "Hello!", "author": {"familyName": null}});
/// assert_eq!(
///     apply_merge_patch(&target, &patch),
///     json!({"title": "Hello!", "author": {"givenName": "John"}})
/// );
/// ```
pub fn apply_merge_patch(target: &JsonValue, patch: &JsonValue) -> JsonValue {
    let mut result = target.clone();
    merge_into(&mut result, patch);
    result
}

fn merge_into(target: &mut JsonValue, patch: &JsonValue) {
    let JsonValue::Object(members) = patch else {
        *target = patch.clone();
        return;
    };

    if !target.is_object() {
        *target = JsonValue::Object(Map::new());
    }
    let JsonValue::Object(existing) = target else {
        return;
    };

    for (name, value) in members {
        if value.is_null() {
            existing.remove(name);
        } else {
            merge_into(existing.entry(name.clone()).or_insert(JsonValue::Null), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_object_patch_replaces() {
        assert_eq!(apply_merge_patch(&json!({"a": 1}), &json!([1, 2])), json!([1, 2]));
        assert_eq!(apply_merge_patch(&json!({"a": 1}), &json!(null)), json!(null));
    }

    #[test]
    fn object_patch_over_scalar_starts_empty() {
        assert_eq!(apply_merge_patch(&json!("x"), &json!({"a": {"b": null}})), json!({"a": {}}));
    }
}
