//! Tests for the shared parameter bag

use serde_json::json;

use jobpool::core::{JobParams, PoolError, RESERVED_KEYS};

#[test]
fn test_missing_key_is_absent_not_an_error() {
    let params = JobParams::new();
    assert_eq!(params.get("anything"), None);
    assert!(!params.contains("anything"));
}

#[test]
fn test_explicit_null_differs_from_absent() {
    let params = JobParams::new();
    params.set("maybe", json!(null)).unwrap();
    // A key set to null is present; an unset key is not.
    assert_eq!(params.get("maybe"), Some(json!(null)));
    assert_eq!(params.get("never"), None);
    assert!(params.require("maybe").is_ok());
    assert!(params.require("never").is_err());
}

#[test]
fn test_set_overwrites_and_remove_returns_previous() {
    let params = JobParams::new();
    params.set("attempt", 1).unwrap();
    params.set("attempt", 2).unwrap();
    assert_eq!(params.get("attempt"), Some(json!(2)));
    assert_eq!(params.remove("attempt"), Some(json!(2)));
    assert_eq!(params.remove("attempt"), None);
}

#[test]
fn test_merge_adds_disjoint_overwrites_overlapping() {
    let params = JobParams::new();
    params.set("kept", "original").unwrap();
    params.set("replaced", "original").unwrap();

    params
        .merge(json!({"replaced": "new", "added": "new"}))
        .unwrap();

    assert_eq!(params.get("kept"), Some(json!("original")));
    assert_eq!(params.get("replaced"), Some(json!("new")));
    assert_eq!(params.get("added"), Some(json!("new")));
    assert_eq!(params.len(), 3);
}

#[test]
fn test_merge_reports_the_offending_json_kind() {
    let params = JobParams::new();
    for (value, kind) in [
        (json!(null), "null"),
        (json!(true), "a boolean"),
        (json!(7), "a number"),
        (json!("s"), "a string"),
        (json!([1]), "an array"),
    ] {
        let err = params.merge(value).unwrap_err();
        match err {
            PoolError::MergeNotAnObject(got) => assert_eq!(got, kind),
            other => panic!("unexpected error: {other}"),
        }
    }
}

#[test]
fn test_reserved_keys_never_enter_the_bag() {
    let params = JobParams::new();
    for key in RESERVED_KEYS {
        assert!(params.set(key, "x").is_err());

        let mut object = serde_json::Map::new();
        object.insert(key.to_string(), json!("x"));
        assert!(params.merge(serde_json::Value::Object(object)).is_err());

        assert!(!params.contains(key));
    }
}

#[test]
fn test_clones_share_storage() {
    let params = JobParams::new();
    let seen_by_action = params.clone();
    let seen_by_callback = params.clone();

    seen_by_action.set("step", "fetched").unwrap();
    assert_eq!(seen_by_callback.get("step"), Some(json!("fetched")));
    seen_by_callback.remove("step");
    assert!(params.get("step").is_none());
}

#[test]
fn test_json_rendering_is_stable_for_diagnostics() {
    let params = JobParams::new();
    params.set("b", 2).unwrap();
    params.set("a", 1).unwrap();
    let rendered = params.to_json();
    let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(parsed, json!({"a": 1, "b": 2}));
    assert_eq!(format!("{params}"), rendered);
}
