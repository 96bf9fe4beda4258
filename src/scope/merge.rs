use serde_json::{Map, Value};

/// Merge `source` into `target`.
///
/// Objects combine key by key, recursively. Anything else in `source`
/// (arrays, scalars, null) replaces what `target` held.
pub fn deep_merge(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => merge_maps(target, source),
        (target, source) => *target = source,
    }
}

pub fn merge_maps(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        match target.get_mut(&key) {
            Some(existing) => deep_merge(existing, value),
            None => {
                target.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_objects_combine() {
        let mut scope = json!({"a": {"x": 1}});
        deep_merge(&mut scope, json!({"a": {"y": 2}}));
        assert_eq!(scope, json!({"a": {"x": 1, "y": 2}}));
    }

    #[test]
    fn test_scalars_and_arrays_overwrite() {
        let mut scope = json!({"title": "Old", "tags": [1, 2, 3], "meta": {"n": 1}});
        deep_merge(
            &mut scope,
            json!({"title": "New", "tags": [4], "meta": "flat"}),
        );
        assert_eq!(scope, json!({"title": "New", "tags": [4], "meta": "flat"}));
    }

    #[test]
    fn test_object_replaces_scalar() {
        let mut scope = json!({"user": null});
        deep_merge(&mut scope, json!({"user": {"name": "ada"}}));
        assert_eq!(scope, json!({"user": {"name": "ada"}}));
    }

    #[test]
    fn test_deep_levels_merge() {
        let mut scope = json!({"a": {"b": {"c": 1, "d": 2}}});
        deep_merge(&mut scope, json!({"a": {"b": {"d": 3, "e": 4}}}));
        assert_eq!(scope, json!({"a": {"b": {"c": 1, "d": 3, "e": 4}}}));
    }
}
