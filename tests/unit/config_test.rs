//! Tests for configuration validation

use jobpool::config::{
    JobPoolConfig, ENV_ADMISSION_CAPACITY, ENV_MAX_IN_FLIGHT, ENV_RUN_EMPTY_JOB_CALLBACK,
};

#[test]
fn test_default_config_is_valid() {
    let cfg = JobPoolConfig::default();
    assert!(cfg.validate().is_ok());
    assert!(cfg.admission_capacity > 0);
    assert!(cfg.max_in_flight > 0);
    assert!(!cfg.run_empty_job_callback);
}

#[test]
fn test_builder_overrides() {
    let cfg = JobPoolConfig::new()
        .with_admission_capacity(1000)
        .with_max_in_flight(100)
        .with_run_empty_job_callback(true);
    assert_eq!(cfg.admission_capacity, 1000);
    assert_eq!(cfg.max_in_flight, 100);
    assert!(cfg.run_empty_job_callback);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_zero_admission_capacity_rejected() {
    let cfg = JobPoolConfig::new().with_admission_capacity(0);
    let err = cfg.validate().unwrap_err();
    assert!(err.contains("admission_capacity"));
}

#[test]
fn test_zero_max_in_flight_rejected() {
    let cfg = JobPoolConfig::new().with_max_in_flight(0);
    let err = cfg.validate().unwrap_err();
    assert!(err.contains("max_in_flight"));
}

#[test]
fn test_from_json_str() {
    let cfg =
        JobPoolConfig::from_json_str(r#"{"admission_capacity": 64, "max_in_flight": 8}"#).unwrap();
    assert_eq!(cfg.admission_capacity, 64);
    assert_eq!(cfg.max_in_flight, 8);
    // Missing field falls back to the serde default.
    assert!(!cfg.run_empty_job_callback);
}

#[test]
fn test_from_json_str_rejects_invalid_values() {
    let err = JobPoolConfig::from_json_str(r#"{"admission_capacity": 0, "max_in_flight": 8}"#)
        .unwrap_err();
    assert!(err.contains("admission_capacity"));

    let err = JobPoolConfig::from_json_str("not json").unwrap_err();
    assert!(err.contains("parse error"));
}

#[test]
fn test_from_env_reads_overrides() {
    std::env::set_var(ENV_ADMISSION_CAPACITY, "512");
    std::env::set_var(ENV_MAX_IN_FLIGHT, "32");
    std::env::set_var(ENV_RUN_EMPTY_JOB_CALLBACK, "true");

    let cfg = JobPoolConfig::from_env().unwrap();
    assert_eq!(cfg.admission_capacity, 512);
    assert_eq!(cfg.max_in_flight, 32);
    assert!(cfg.run_empty_job_callback);

    std::env::set_var(ENV_MAX_IN_FLIGHT, "not-a-number");
    let err = JobPoolConfig::from_env().unwrap_err();
    assert!(err.contains(ENV_MAX_IN_FLIGHT));

    std::env::remove_var(ENV_ADMISSION_CAPACITY);
    std::env::remove_var(ENV_MAX_IN_FLIGHT);
    std::env::remove_var(ENV_RUN_EMPTY_JOB_CALLBACK);
}

#[test]
fn test_config_serde_roundtrip() {
    let cfg = JobPoolConfig::new()
        .with_admission_capacity(10)
        .with_max_in_flight(2);
    let json = serde_json::to_string(&cfg).unwrap();
    let back = JobPoolConfig::from_json_str(&json).unwrap();
    assert_eq!(back.admission_capacity, cfg.admission_capacity);
    assert_eq!(back.max_in_flight, cfg.max_in_flight);
    assert_eq!(back.run_empty_job_callback, cfg.run_empty_job_callback);
}
