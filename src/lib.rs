//! # Jobpool
//!
//! A bounded asynchronous job-execution pool for Tokio.
//!
//! This library couples an unbounded producer side to two independent
//! bounds: a backpressured admission queue for jobs that are *waiting*, and
//! an in-flight limiter for actions that are *running*. Jobs carry their own
//! action, an optional completion callback, and an open bag of named
//! parameters; the pool dispatches them in submission order, runs each
//! action as its own task, and invokes the callback from a per-job
//! completion hook once the action finishes.
//!
//! ## Core Problem Solved
//!
//! Fire-and-forget task spawning has no ceiling: a burst of producers can
//! start an unbounded number of concurrent tasks. This pool admits any
//! number of jobs (suspending producers once the admission queue fills) but
//! never runs more than a configured number of actions at once, and it can
//! drain to a clean stop without losing or leaking in-flight work.
//!
//! ## Key Features
//!
//! - **Bounded admission**: `submit` suspends instead of erroring once the
//!   queue holds `admission_capacity` jobs
//! - **Concurrency ceiling**: at most `max_in_flight` actions run at once,
//!   enforced by a counting semaphore with panic-safe slot release
//! - **Per-job callbacks**: sync or async, invoked exactly once per executed
//!   action from an independent completion hook
//! - **Drain-and-stop shutdown**: `stop()` finishes everything admitted,
//!   cancels nothing, and returns only when the pool is idle
//!
//! ## Example
//!
//! ```rust,ignore
//! use jobpool::config::JobPoolConfig;
//! use jobpool::core::{Job, JobPool};
//!
//! let pool = JobPool::new(
//!     JobPoolConfig::new()
//!         .with_admission_capacity(1000)
//!         .with_max_in_flight(100),
//! )?;
//!
//! let job = Job::new()
//!     .with_param("path", "/var/data/input")?
//!     .with_action(|params| async move {
//!         let path = params.require("path").unwrap();
//!         // ... do the work ...
//!         params.set("bytes", 42).unwrap();
//!     })
//!     .with_sync_callback(|params| {
//!         println!("done: {params}");
//!     });
//!
//! pool.submit(job).await;
//! pool.stop().await;
//! ```
//!
//! For complete examples, see the integration tests in `tests/`.

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core job and pool abstractions.
pub mod core;
/// Configuration models for the job pool.
pub mod config;
/// Shared utilities.
pub mod util;
