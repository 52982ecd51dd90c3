//! Core job and pool abstractions.

pub mod error;
pub mod job;
pub mod pool;

pub use error::{AppResult, PoolError};
pub use job::{Action, Callback, Job, JobId, JobParams, UnitFuture, RESERVED_KEYS};
pub use pool::{JobPool, PoolStats};
