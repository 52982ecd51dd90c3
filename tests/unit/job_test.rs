//! Tests for the Job descriptor

use serde_json::json;

use jobpool::core::{Job, PoolError};

#[test]
fn test_new_job_is_a_placeholder() {
    let job = Job::new();
    assert!(!job.has_action());
    assert!(!job.has_callback());
    assert!(job.params().is_empty());
}

#[test]
fn test_builder_attaches_everything() {
    let job = Job::new()
        .with_action(|_| async {})
        .with_sync_callback(|_| {})
        .with_param("retries", 3)
        .unwrap()
        .with_params(json!({"timeout_ms": 250}))
        .unwrap();

    assert!(job.has_action());
    assert!(job.has_callback());
    assert_eq!(job.get("retries"), Some(json!(3)));
    assert_eq!(job.get("timeout_ms"), Some(json!(250)));
}

#[test]
fn test_with_param_rejects_reserved_keys() {
    let err = Job::new().with_param("_callback", 1).unwrap_err();
    assert!(matches!(err, PoolError::ReservedParameter(k) if k == "_callback"));
}

#[test]
fn test_jobs_order_by_creation_time() {
    let mut jobs = Vec::new();
    for _ in 0..5 {
        jobs.push(Job::new());
        // Separate timestamps; creation resolution is one millisecond.
        std::thread::sleep(std::time::Duration::from_millis(3));
    }
    let mut shuffled: Vec<&Job> = jobs.iter().rev().collect();
    shuffled.sort();
    for (sorted, original) in shuffled.iter().zip(jobs.iter()) {
        assert_eq!(sorted.id(), original.id());
    }
}

#[test]
fn test_job_equality_is_by_id() {
    let a = Job::new();
    let b = Job::new();
    assert_eq!(&a, &a);
    assert_ne!(a, b);
}

#[test]
fn test_merge_chains_and_overwrites() {
    let mut job = Job::new();
    job.merge(json!({"a": 1, "b": 2}))
        .unwrap()
        .merge(json!({"b": 99}))
        .unwrap();
    assert_eq!(job.get("a"), Some(json!(1)));
    assert_eq!(job.get("b"), Some(json!(99)));
}

#[test]
fn test_merge_rejects_non_object() {
    let mut job = Job::new();
    let err = job.merge(json!(42)).unwrap_err();
    assert!(matches!(err, PoolError::MergeNotAnObject("a number")));
}

#[test]
fn test_display_is_the_param_bag_json() {
    let job = Job::new().with_param("stage", "encode").unwrap();
    assert_eq!(job.to_string(), r#"{"stage":"encode"}"#);
    // Debug carries the id and shape instead.
    let debug = format!("{job:?}");
    assert!(debug.contains("has_action: false"));
}

#[tokio::test]
async fn test_invoke_spawns_the_action_once() {
    let mut job = Job::new().with_action(|params| async move {
        params.set("ran", true).unwrap();
    });

    let handle = job.invoke().expect("first invoke spawns");
    let bag = handle.await.unwrap();
    assert_eq!(bag.get("ran"), Some(json!(true)));
    assert!(!job.has_action(), "invoke consumes the action");
    assert!(job.invoke().is_none());
}

#[tokio::test]
async fn test_invoke_without_action_spawns_nothing() {
    let mut job = Job::new().with_param("inert", true).unwrap();
    assert!(job.invoke().is_none());
}
