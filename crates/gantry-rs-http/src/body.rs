//! JSON body composition.
//!
//! Bodies are [`serde_json::Value`] trees and composition is an explicit,
//! typed merge — no struct-to-map round-tripping, no reflection. `Null`
//! counts as "unset" on both sides, nested objects merge recursively, and
//! everything else (including arrays) is a leaf resolved by policy.

use serde_json::Value;

/// Merges `source` into `target` under a replace/keep-existing policy.
///
/// - Object vs object: recursive per-key merge.
/// - A key absent or `Null` in `target` always takes the source value.
/// - A key present and non-null in `target` is replaced only when
///   `replace_exist` is true.
/// - `Null` source values never erase existing data.
///
/// # Examples
///
/// ```
/// use gantry_rs_http::body::merge;
/// use serde_json::json;
///
/// let mut target = json!({ "a": 1, "nested": { "x": 1 } });
/// merge(&mut target, &json!({ "a": 2, "b": 3, "nested": { "y": 2 } }), false);
/// assert_eq!(target, json!({ "a": 1, "b": 3, "nested": { "x": 1, "y": 2 } }));
/// ```
pub fn merge(target: &mut Value, source: &Value, replace_exist: bool) {
    if source.is_null() {
        return;
    }

    match (target, source) {
        (Value::Object(target_map), Value::Object(source_map)) => {
            for (key, value) in source_map {
                match target_map.get_mut(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        merge(existing, value, replace_exist);
                    }
                    Some(existing) => {
                        if (existing.is_null() || replace_exist) && !value.is_null() {
                            *existing = value.clone();
                        }
                    }
                    None => {
                        target_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, source) => {
            if target.is_null() || replace_exist {
                *target = source.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keep_existing_policy() {
        let mut target = json!({ "a": 2, "b": 3 });
        merge(&mut target, &json!({ "a": 1 }), false);
        assert_eq!(target, json!({ "a": 2, "b": 3 }));
    }

    #[test]
    fn test_replace_policy() {
        let mut target = json!({ "a": 2, "b": 3 });
        merge(&mut target, &json!({ "a": 1 }), true);
        assert_eq!(target, json!({ "a": 1, "b": 3 }));
    }

    #[test]
    fn test_null_target_field_is_unset() {
        let mut target = json!({ "a": null });
        merge(&mut target, &json!({ "a": 1 }), false);
        assert_eq!(target, json!({ "a": 1 }));
    }

    #[test]
    fn test_null_source_never_erases() {
        let mut target = json!({ "a": 1 });
        merge(&mut target, &json!({ "a": null }), true);
        assert_eq!(target, json!({ "a": 1 }));
    }

    #[test]
    fn test_nested_objects_merge_recursively() {
        let mut target = json!({ "status": { "code": 200 } });
        merge(
            &mut target,
            &json!({ "status": { "message": "ok" }, "data": [1] }),
            false,
        );
        assert_eq!(
            target,
            json!({ "status": { "code": 200, "message": "ok" }, "data": [1] })
        );
    }

    #[test]
    fn test_arrays_are_leaves() {
        let mut target = json!({ "items": [1, 2] });
        merge(&mut target, &json!({ "items": [3] }), false);
        assert_eq!(target, json!({ "items": [1, 2] }));
        merge(&mut target, &json!({ "items": [3] }), true);
        assert_eq!(target, json!({ "items": [3] }));
    }

    #[test]
    fn test_whole_null_target_takes_source() {
        let mut target = Value::Null;
        merge(&mut target, &json!({ "a": 1 }), false);
        assert_eq!(target, json!({ "a": 1 }));
    }

    #[test]
    fn test_scalar_conflict_by_policy_not_type() {
        let mut target = json!({ "v": "text" });
        merge(&mut target, &json!({ "v": 42 }), true);
        assert_eq!(target, json!({ "v": 42 }));
    }
}
