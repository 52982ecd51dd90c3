//! Configuration models for the job pool.

pub mod pool;

pub use pool::{
    JobPoolConfig, ENV_ADMISSION_CAPACITY, ENV_MAX_IN_FLIGHT, ENV_RUN_EMPTY_JOB_CALLBACK,
};
