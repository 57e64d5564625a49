//! RFC-7396-style JSON merge patch.
//!
//! The algorithm exists in two forms that must agree: [`merge_patch`], a
//! pure function over [`serde_json::Value`] used for unit testing and
//! application-side previews, and [`JSONB_MERGE_PATCH_SQL`], the equivalent
//! recursive function installed into Postgres so that
//! `update_json_document` can compute and apply the merge inside a single
//! atomic statement.

use serde_json::{Map, Value};

/// Source for the server-side `jsonb_merge_patch(jsonb, jsonb)` function.
///
/// `CREATE OR REPLACE` makes installation idempotent; `DocumentStore::setup`
/// runs this on every environment preparation. The `WHERE` clause drops
/// patch entries whose value is JSON `null` (key removal), and patching a
/// non-object target restarts from an empty object, which also strips
/// nested nulls from object-valued patch entries.
pub const JSONB_MERGE_PATCH_SQL: &str = r#"
CREATE OR REPLACE FUNCTION jsonb_merge_patch(target jsonb, patch jsonb)
RETURNS jsonb
LANGUAGE plpgsql
IMMUTABLE
AS $func$
BEGIN
    IF jsonb_typeof(patch) IS DISTINCT FROM 'object' THEN
        RETURN patch;
    END IF;
    RETURN COALESCE(
        (
            SELECT jsonb_object_agg(merged.key, merged.value)
            FROM (
                SELECT
                    COALESCE(t.key, p.key) AS key,
                    CASE
                        WHEN p.key IS NULL THEN t.value
                        ELSE jsonb_merge_patch(t.value, p.value)
                    END AS value
                FROM jsonb_each(
                    CASE
                        WHEN jsonb_typeof(target) = 'object' THEN target
                        ELSE '{}'::jsonb
                    END
                ) AS t
                FULL OUTER JOIN jsonb_each(patch) AS p ON t.key = p.key
                WHERE p.key IS NULL OR jsonb_typeof(p.value) <> 'null'
            ) AS merged
        ),
        '{}'::jsonb
    );
END;
$func$;
"#;

/// Applies an RFC-7396-style JSON merge patch to a target value.
///
/// Semantics:
/// - If `patch` is not an object, the result is `patch` itself: arrays and
///   scalars always replace wholesale, never merge.
/// - If `patch` is an object, the result starts from the target's entries
///   (or from an empty object when the target is not an object). For each
///   patch entry, a `null` value removes the key; any other value is merged
///   recursively against the existing entry.
///
/// The function is deterministic and pure: no side effects, no clock
/// access. Repeated application of a patch that performs no removals is a
/// fixed point.
pub fn merge_patch(target: &Value, patch: &Value) -> Value {
    match patch {
        Value::Object(entries) => {
            let mut merged = match target {
                Value::Object(existing) => existing.clone(),
                _ => Map::new(),
            };
            for (key, patch_value) in entries {
                if patch_value.is_null() {
                    merged.remove(key);
                }
                else {
                    let base = merged.get(key).cloned().unwrap_or(Value::Null);
                    merged.insert(key.clone(), merge_patch(&base, patch_value));
                }
            }
            Value::Object(merged)
        },
        replacement => replacement.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_merge_reference_vector() {
        let target = json!({
            "title": "Goodbye!",
            "author": {"givenName": "John", "familyName": "Doe"},
            "tags": ["example", "sample"],
            "content": "This will be unchanged"
        });
        let patch = json!({
            "title": "Hello!",
            "phoneNumber": "+01-123-456-7890",
            "author": {"familyName": null},
            "tags": ["example"]
        });
        let expected = json!({
            "title": "Hello!",
            "author": {"givenName": "John"},
            "tags": ["example"],
            "content": "This will be unchanged",
            "phoneNumber": "+01-123-456-7890"
        });

        assert_eq!(merge_patch(&target, &patch), expected);
    }

    #[test]
    fn test_null_removes_top_level_key() {
        let target = json!({"a": 1, "b": 2});
        let patch = json!({"b": null});
        assert_eq!(merge_patch(&target, &patch), json!({"a": 1}));
    }

    #[test]
    fn test_null_for_missing_key_is_noop() {
        let target = json!({"a": 1});
        let patch = json!({"missing": null});
        assert_eq!(merge_patch(&target, &patch), json!({"a": 1}));
    }

    #[test]
    fn test_arrays_replace_wholesale() {
        let target = json!({"tags": ["a", "b", "c"]});
        let patch = json!({"tags": ["d"]});
        assert_eq!(merge_patch(&target, &patch), json!({"tags": ["d"]}));
    }

    #[test]
    fn test_nested_objects_recurse() {
        let target = json!({"author": {"givenName": "John", "familyName": "Doe"}});
        let patch = json!({"author": {"givenName": "Jane"}});
        assert_eq!(
            merge_patch(&target, &patch),
            json!({"author": {"givenName": "Jane", "familyName": "Doe"}})
        );
    }

    #[test]
    fn test_non_object_patch_replaces_target() {
        let target = json!({"a": 1});
        assert_eq!(merge_patch(&target, &json!([1, 2])), json!([1, 2]));
        assert_eq!(merge_patch(&target, &json!("text")), json!("text"));
        assert_eq!(merge_patch(&target, &json!(42)), json!(42));
        assert_eq!(merge_patch(&target, &Value::Null), Value::Null);
    }

    #[test]
    fn test_object_patch_over_scalar_starts_empty() {
        let target = json!("scalar");
        let patch = json!({"a": 1, "b": null});
        assert_eq!(merge_patch(&target, &patch), json!({"a": 1}));
    }

    #[test]
    fn test_nested_nulls_stripped_when_target_missing() {
        // Patching a key that does not exist with an object containing nulls
        // must not carry the nulls into the result.
        let target = json!({});
        let patch = json!({"author": {"givenName": "John", "familyName": null}});
        assert_eq!(
            merge_patch(&target, &patch),
            json!({"author": {"givenName": "John"}})
        );
    }

    #[test]
    fn test_idempotent_patch_is_fixed_point() {
        let target = json!({"title": "Goodbye!", "count": 3});
        let patch = json!({"title": "X"});

        let once = merge_patch(&target, &patch);
        let twice = merge_patch(&once, &patch);
        assert_eq!(once, twice);
        assert_eq!(once, json!({"title": "X", "count": 3}));
    }

    #[test]
    fn test_empty_patch_preserves_object_target() {
        let target = json!({"a": 1});
        assert_eq!(merge_patch(&target, &json!({})), target);
    }

    #[test]
    fn test_empty_patch_over_scalar_yields_empty_object() {
        assert_eq!(merge_patch(&json!(7), &json!({})), json!({}));
    }

    #[test]
    fn test_deep_recursion() {
        let target = json!({"a": {"b": {"c": 1, "d": 2}}});
        let patch = json!({"a": {"b": {"c": null, "e": 3}}});
        assert_eq!(
            merge_patch(&target, &patch),
            json!({"a": {"b": {"d": 2, "e": 3}}})
        );
    }

    #[test]
    fn test_merge_is_pure() {
        let target = json!({"a": 1});
        let patch = json!({"a": 2});
        let _ = merge_patch(&target, &patch);
        // Inputs are untouched.
        assert_eq!(target, json!({"a": 1}));
        assert_eq!(patch, json!({"a": 2}));
    }

    #[test]
    fn test_sql_function_is_idempotently_installable() {
        assert!(JSONB_MERGE_PATCH_SQL.contains("CREATE OR REPLACE FUNCTION jsonb_merge_patch"));
    }
}
