//! Structural merge preserving unchanged subtrees
//!
//! [`smart_merge`] is the immutability-preserving update primitive: it
//! merges a source value into a target by traversing every like path, and
//! re-allocates a container only when at least one of its children actually
//! changed.  An unchanged subtree comes back as `Cow::Borrowed`, so a
//! caller's state layer can tell exactly which parts of a model moved.

use std::borrow::Cow;

use serde_json::Value;

/// Merge `source` into `target`.
///
/// Objects merge key by key; keys present only in the target are kept.
/// Arrays merge index by index; target elements beyond the source length
/// are kept.  Scalars and mismatched shapes resolve to the source value.
/// Returns `Cow::Borrowed(target)` when nothing changed at or below this
/// node.
pub fn smart_merge<'a>(target: &'a Value, source: &Value) -> Cow<'a, Value> {
    match (target, source) {
        (Value::Object(tmap), Value::Object(smap)) => {
            let mut changes: Vec<(&str, Value)> = Vec::new();
            for (key, sval) in smap {
                match tmap.get(key) {
                    Some(tval) => {
                        if let Cow::Owned(merged) = smart_merge(tval, sval) {
                            changes.push((key, merged));
                        }
                    }
                    None => changes.push((key, sval.clone())),
                }
            }
            if changes.is_empty() {
                Cow::Borrowed(target)
            } else {
                let mut merged = tmap.clone();
                for (key, val) in changes {
                    merged.insert(key.to_string(), val);
                }
                Cow::Owned(Value::Object(merged))
            }
        }
        (Value::Array(tary), Value::Array(sary)) => {
            let mut changes: Vec<(usize, Value)> = Vec::new();
            for (idx, sval) in sary.iter().enumerate() {
                match tary.get(idx) {
                    Some(tval) => {
                        if let Cow::Owned(merged) = smart_merge(tval, sval) {
                            changes.push((idx, merged));
                        }
                    }
                    None => changes.push((idx, sval.clone())),
                }
            }
            if changes.is_empty() {
                Cow::Borrowed(target)
            } else {
                let mut merged = tary.clone();
                for (idx, val) in changes {
                    if idx < merged.len() {
                        merged[idx] = val;
                    } else {
                        merged.push(val);
                    }
                }
                Cow::Owned(Value::Array(merged))
            }
        }
        _ => {
            if target == source {
                Cow::Borrowed(target)
            } else {
                Cow::Owned(source.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unchanged_subtree_keeps_identity() {
        let target = json!({"a": {"x": 1}, "b": {"y": 2}});
        let source = json!({"a": {"x": 1}, "b": {"y": 3}});

        // the unchanged subtree merges as borrowed...
        assert!(matches!(
            smart_merge(&target["a"], &source["a"]),
            Cow::Borrowed(_)
        ));
        // ...while the changed one is a new value
        let merged_b = smart_merge(&target["b"], &source["b"]);
        assert!(matches!(merged_b, Cow::Owned(_)));
        assert_eq!(*merged_b, json!({"y": 3}));

        let merged = smart_merge(&target, &source);
        assert_eq!(*merged, json!({"a": {"x": 1}, "b": {"y": 3}}));
    }

    #[test]
    fn test_identical_input_is_borrowed() {
        let target = json!({"rows": [1, 2, 3], "meta": {"k": "v"}});
        assert!(matches!(
            smart_merge(&target, &target.clone()),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn test_target_only_keys_are_kept() {
        let target = json!({"keep": 1, "change": 2});
        let source = json!({"change": 9});
        assert_eq!(*smart_merge(&target, &source), json!({"keep": 1, "change": 9}));
    }

    #[test]
    fn test_array_merge_by_index() {
        let target = json!([{"v": 1}, {"v": 2}, {"v": 3}]);
        let source = json!([{"v": 1}, {"v": 9}]);
        let merged = smart_merge(&target, &source);
        // index 1 changed, index 2 kept from the target
        assert_eq!(*merged, json!([{"v": 1}, {"v": 9}, {"v": 3}]));
    }

    #[test]
    fn test_source_extends_array() {
        let target = json!([1]);
        let source = json!([1, 2]);
        assert_eq!(*smart_merge(&target, &source), json!([1, 2]));
    }

    #[test]
    fn test_shape_mismatch_takes_source() {
        let target = json!({"a": 1});
        let source = json!([1, 2]);
        assert_eq!(*smart_merge(&target, &source), json!([1, 2]));
    }
}
