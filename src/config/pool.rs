//! Pool configuration structures.

use serde::{Deserialize, Serialize};

/// Environment variable naming the admission-queue capacity.
pub const ENV_ADMISSION_CAPACITY: &str = "JOBPOOL_ADMISSION_CAPACITY";
/// Environment variable naming the concurrency ceiling.
pub const ENV_MAX_IN_FLIGHT: &str = "JOBPOOL_MAX_IN_FLIGHT";
/// Environment variable toggling callbacks for jobs without an action.
pub const ENV_RUN_EMPTY_JOB_CALLBACK: &str = "JOBPOOL_RUN_EMPTY_JOB_CALLBACK";

/// Pool configuration.
///
/// The two capacities bound different things and are deliberately
/// independent: `admission_capacity` caps how many jobs may *wait*,
/// `max_in_flight` caps how many actions may *run*.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPoolConfig {
    /// Maximum jobs buffered in the admission queue before `submit`
    /// suspends.
    pub admission_capacity: usize,
    /// Maximum job actions running concurrently.
    pub max_in_flight: usize,
    /// Run the callback of a job that has no action. By default such a job
    /// completes silently and its callback is never invoked; enabling this
    /// runs the callback as a tracked task, still without consuming an
    /// in-flight slot.
    #[serde(default)]
    pub run_empty_job_callback: bool,
}

impl Default for JobPoolConfig {
    fn default() -> Self {
        let cores = num_cpus::get();
        Self {
            admission_capacity: cores * 32,
            max_in_flight: cores * 2,
            run_empty_job_callback: false,
        }
    }
}

impl JobPoolConfig {
    /// Create a configuration with CPU-scaled defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the admission-queue capacity.
    #[must_use]
    pub fn with_admission_capacity(mut self, capacity: usize) -> Self {
        self.admission_capacity = capacity;
        self
    }

    /// Set the concurrency ceiling.
    #[must_use]
    pub fn with_max_in_flight(mut self, limit: usize) -> Self {
        self.max_in_flight = limit;
        self
    }

    /// Toggle callbacks for jobs without an action.
    #[must_use]
    pub fn with_run_empty_job_callback(mut self, enabled: bool) -> Self {
        self.run_empty_job_callback = enabled;
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.admission_capacity == 0 {
            return Err("admission_capacity must be greater than 0".into());
        }
        if self.max_in_flight == 0 {
            return Err("max_in_flight must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse a pool configuration from a JSON string and validate it.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation error description.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build a configuration from `JOBPOOL_*` environment variables,
    /// falling back to defaults for unset variables. A `.env` file in the
    /// working directory is loaded first when present.
    ///
    /// # Errors
    ///
    /// Returns a description of the first unparsable variable, or a
    /// validation error.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        let mut cfg = Self::default();
        if let Ok(raw) = std::env::var(ENV_ADMISSION_CAPACITY) {
            cfg.admission_capacity = raw
                .parse()
                .map_err(|e| format!("{ENV_ADMISSION_CAPACITY}: {e}"))?;
        }
        if let Ok(raw) = std::env::var(ENV_MAX_IN_FLIGHT) {
            cfg.max_in_flight = raw.parse().map_err(|e| format!("{ENV_MAX_IN_FLIGHT}: {e}"))?;
        }
        if let Ok(raw) = std::env::var(ENV_RUN_EMPTY_JOB_CALLBACK) {
            cfg.run_empty_job_callback = raw
                .parse()
                .map_err(|e| format!("{ENV_RUN_EMPTY_JOB_CALLBACK}: {e}"))?;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}
