//! Error types for pool and job operations.

use thiserror::Error;

/// Errors produced by job and pool components.
///
/// `submit` and `stop` intentionally have no error path: a pool that is
/// draining drops late submissions silently rather than failing them.
#[derive(Debug, Error)]
pub enum PoolError {
    /// `merge` was handed a JSON value that is not an object.
    #[error("merge source must be a JSON object, got {0}")]
    MergeNotAnObject(&'static str),
    /// Attempt to write a parameter under a reserved control key.
    #[error("parameter key `{0}` is reserved")]
    ReservedParameter(String),
    /// Strict lookup of a parameter that was never set.
    #[error("missing parameter: {0}")]
    MissingParameter(String),
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
