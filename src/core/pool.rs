//! Bounded asynchronous job-execution pool.
//!
//! Producers hand [`Job`]s to [`JobPool::submit`]; a background dispatch
//! loop moves them from the bounded admission queue into execution, capped
//! by an in-flight limiter; a per-job completion hook invokes the job's
//! callback and frees the slot.
//!
//! # Design
//!
//! - **Backpressure, not rejection**: `submit` suspends while the admission
//!   queue is full instead of returning a queue-full error. The bounded
//!   queue plus the in-flight limiter are the entire backpressure chain: a
//!   slow consumer stalls dispatch, which fills the queue, which suspends
//!   producers.
//! - **Two independent bounds**: `admission_capacity` caps how many jobs may
//!   *wait*; `max_in_flight` caps how many actions may *run*. They are never
//!   conflated.
//! - **Clean shutdown**: [`JobPool::stop`] closes the admission channel; the
//!   dispatch loop drains what is buffered, then exits when `recv` yields
//!   `None`, and `stop` joins every outstanding completion hook. Nothing is
//!   cancelled, nothing is leaked.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::{oneshot, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::JobPoolConfig;
use crate::core::error::PoolError;
use crate::core::job::{Callback, Job, JobId, JobParams};

/// Statistics about pool utilization.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Configured admission-queue capacity.
    pub admission_capacity: usize,

    /// Configured concurrency ceiling.
    pub max_in_flight: usize,

    /// Jobs accepted into the admission queue.
    pub submitted: u64,

    /// Jobs currently waiting in the admission queue.
    pub queued: u64,

    /// Actions currently holding an in-flight slot.
    pub in_flight: u64,

    /// Jobs whose action and callback both finished.
    pub completed: u64,

    /// Jobs whose action panicked or was aborted.
    pub failed: u64,

    /// Jobs dropped because the pool was draining.
    pub dropped: u64,

    /// Placeholder jobs dequeued without an action.
    pub no_action: u64,
}

/// Internal counters backing [`PoolStats`] (lock-free atomics).
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub submitted: AtomicU64,
    pub queued: AtomicU64,
    pub in_flight: AtomicU64,
    pub completed: AtomicU64,
    pub failed: AtomicU64,
    pub dropped: AtomicU64,
    pub no_action: AtomicU64,
}

impl PoolCounters {
    fn snapshot(&self, admission_capacity: usize, max_in_flight: usize) -> PoolStats {
        PoolStats {
            admission_capacity,
            max_in_flight,
            submitted: self.submitted.load(Ordering::Relaxed),
            queued: self.queued.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            no_action: self.no_action.load(Ordering::Relaxed),
        }
    }
}

/// Queue-fed pool running job actions under a concurrency ceiling.
///
/// Constructed from a validated [`JobPoolConfig`]; the dispatch loop starts
/// immediately as a background task, so construction must happen inside a
/// Tokio runtime. The pool accepts submissions until [`JobPool::stop`] is
/// called, which is terminal: a stopped pool cannot be restarted.
///
/// Share the pool across producers behind an `Arc`.
pub struct JobPool {
    /// Pool configuration.
    config: JobPoolConfig,

    /// Admission-queue sender. `Option` allows clean shutdown by dropping:
    /// a closed channel is the dispatch loop's exit signal.
    submit_tx: Mutex<Option<Sender<Job>>>,

    /// Cleared by `stop()`; once false, `submit` drops jobs silently.
    accepting: AtomicBool,

    /// In-flight limiter: one permit per running action.
    in_flight: Arc<Semaphore>,

    /// Completion hooks still running, keyed by job id. `stop()` drains this
    /// so shutdown waits for callbacks, not just actions.
    running: Arc<Mutex<HashMap<JobId, JoinHandle<()>>>>,

    /// Dispatch-loop handle, joined by `stop()`.
    dispatch: Mutex<Option<JoinHandle<()>>>,

    /// Pool statistics counters.
    counters: Arc<PoolCounters>,
}

impl JobPool {
    /// Create a pool and start its dispatch loop.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::InvalidConfig` if the configuration is invalid.
    pub fn new(config: JobPoolConfig) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;

        let (submit_tx, submit_rx) = mpsc::channel(config.admission_capacity);
        let in_flight = Arc::new(Semaphore::new(config.max_in_flight));
        let running = Arc::new(Mutex::new(HashMap::new()));
        let counters = Arc::new(PoolCounters::default());

        let dispatch = tokio::spawn(dispatch_loop(
            submit_rx,
            Arc::clone(&in_flight),
            Arc::clone(&running),
            Arc::clone(&counters),
            config.run_empty_job_callback,
        ));

        info!(
            admission_capacity = config.admission_capacity,
            max_in_flight = config.max_in_flight,
            "job pool started"
        );

        Ok(Self {
            config,
            submit_tx: Mutex::new(Some(submit_tx)),
            accepting: AtomicBool::new(true),
            in_flight,
            running,
            dispatch: Mutex::new(Some(dispatch)),
            counters,
        })
    }

    /// Submit a job for execution.
    ///
    /// Suspends while the admission queue already holds `admission_capacity`
    /// jobs. Submissions after [`JobPool::stop`] has been initiated are
    /// dropped: not queued, not an error — the job is logged at debug level,
    /// counted in [`PoolStats::dropped`], and discarded.
    pub async fn submit(&self, job: Job) {
        if !self.accepting.load(Ordering::Acquire) {
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            debug!(job = %job.id(), "pool is draining; job dropped");
            return;
        }

        // Clone the sender out so no lock is held across the await below.
        let submit_tx = self.submit_tx.lock().clone();
        let Some(submit_tx) = submit_tx else {
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            debug!(job = %job.id(), "admission queue closed; job dropped");
            return;
        };

        self.counters.submitted.fetch_add(1, Ordering::Relaxed);
        self.counters.queued.fetch_add(1, Ordering::Relaxed);

        // Suspends while the queue is at capacity.
        if let Err(rejected) = submit_tx.send(job).await {
            // stop() closed the channel while we were waiting for space.
            self.counters.submitted.fetch_sub(1, Ordering::Relaxed);
            self.counters.queued.fetch_sub(1, Ordering::Relaxed);
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            debug!(job = %rejected.0.id(), "admission queue closed; job dropped");
        }
    }

    /// Drain the pool and stop it.
    ///
    /// Stops accepting submissions, lets the dispatch loop finish every job
    /// already admitted, then waits for all in-flight actions and their
    /// callbacks to complete. Nothing already running or queued is
    /// cancelled.
    ///
    /// `stop` is terminal; call it exactly once. A second call returns
    /// immediately without effect.
    pub async fn stop(&self) {
        self.accepting.store(false, Ordering::Release);
        info!("job pool draining");

        // Closing the admission channel is the shutdown signal: the dispatch
        // loop drains whatever is buffered in FIFO order, then observes the
        // closed channel and exits.
        drop(self.submit_tx.lock().take());

        let dispatch = self.dispatch.lock().take();
        if let Some(handle) = dispatch {
            if let Err(err) = handle.await {
                error!(error = %err, "dispatch loop terminated abnormally");
            }
        }

        // Every completion hook was registered before the dispatch loop
        // exited; joining them guarantees no action or callback survives
        // stop().
        let hooks: Vec<(JobId, JoinHandle<()>)> = self.running.lock().drain().collect();
        for (job_id, handle) in hooks {
            if let Err(err) = handle.await {
                warn!(job = %job_id, error = %err, "completion hook terminated abnormally");
            }
        }

        info!("job pool stopped");
    }

    /// Whether the pool is still accepting submissions.
    #[must_use]
    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }

    /// Number of in-flight slots currently free.
    #[must_use]
    pub fn available_slots(&self) -> usize {
        self.in_flight.available_permits()
    }

    /// Snapshot of the pool's statistics counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters
            .snapshot(self.config.admission_capacity, self.config.max_in_flight)
    }

    /// The configuration this pool was built from.
    #[must_use]
    pub fn config(&self) -> &JobPoolConfig {
        &self.config
    }
}

impl Drop for JobPool {
    fn drop(&mut self) {
        // Dropping the sender lets the dispatch loop drain and exit on its
        // own; hooks already spawned run to completion detached.
        if self.submit_tx.lock().take().is_some() {
            debug!("job pool dropped without stop(); remaining work detached");
        }
    }
}

/// Background loop moving jobs from the admission queue into execution.
///
/// Exits when the admission channel is closed and fully drained.
async fn dispatch_loop(
    mut submit_rx: Receiver<Job>,
    in_flight: Arc<Semaphore>,
    running: Arc<Mutex<HashMap<JobId, JoinHandle<()>>>>,
    counters: Arc<PoolCounters>,
    run_empty_job_callback: bool,
) {
    while let Some(mut job) = submit_rx.recv().await {
        counters.queued.fetch_sub(1, Ordering::Relaxed);
        let job_id = job.id();

        if !job.has_action() {
            // Placeholder job: completes immediately, never takes a slot.
            counters.no_action.fetch_add(1, Ordering::Relaxed);
            match job.take_callback() {
                Some(callback) if run_empty_job_callback => {
                    debug!(job = %job_id, "no action; running callback without a slot");
                    let params = job.params();
                    let (registered_tx, registered_rx) = oneshot::channel();
                    let hook = tokio::spawn({
                        let running = Arc::clone(&running);
                        async move {
                            // Self-removal must not race the insertion below.
                            let _ = registered_rx.await;
                            complete_empty_job(job_id, callback, params, running).await;
                        }
                    });
                    running.lock().insert(job_id, hook);
                    let _ = registered_tx.send(());
                }
                _ => debug!(job = %job_id, "no action; job completes immediately"),
            }
            continue;
        }

        // The actual admission-control point: suspends while max_in_flight
        // actions are already running.
        let permit = match Arc::clone(&in_flight).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                // The limiter is never closed while the loop runs; if it
                // ever is, account for the job instead of wedging the loop.
                counters.dropped.fetch_add(1, Ordering::Relaxed);
                error!(job = %job_id, "in-flight limiter closed; job dropped");
                continue;
            }
        };
        counters.in_flight.fetch_add(1, Ordering::Relaxed);

        let callback = job.take_callback();
        if let Some(action) = job.invoke() {
            debug!(job = %job_id, "job dispatched");
            let (registered_tx, registered_rx) = oneshot::channel();
            let hook = tokio::spawn({
                let running = Arc::clone(&running);
                let counters = Arc::clone(&counters);
                async move {
                    // Self-removal must not race the insertion below.
                    let _ = registered_rx.await;
                    complete_job(job_id, callback, action, permit, running, counters).await;
                }
            });
            running.lock().insert(job_id, hook);
            let _ = registered_tx.send(());
        } else {
            // has_action() was checked above; if the action is somehow gone
            // the permit simply drops and the slot frees.
            counters.in_flight.fetch_sub(1, Ordering::Relaxed);
        }
    }
    debug!("admission queue closed and drained; dispatch loop exiting");
}

/// Completion hook for one dispatched job: awaits the action, invokes the
/// callback, releases the in-flight slot.
///
/// Runs as its own task so that neither the dispatch loop nor the action's
/// task ever blocks on a callback. The permit is released by drop on every
/// exit path — including a panicking action or callback — so a failing job
/// cannot leak concurrency capacity.
async fn complete_job(
    job_id: JobId,
    callback: Option<Callback>,
    action: JoinHandle<JobParams>,
    permit: OwnedSemaphorePermit,
    running: Arc<Mutex<HashMap<JobId, JoinHandle<()>>>>,
    counters: Arc<PoolCounters>,
) {
    match action.await {
        Ok(params) => {
            if let Some(callback) = callback {
                run_callback(callback, params).await;
            }
            counters.completed.fetch_add(1, Ordering::Relaxed);
            debug!(job = %job_id, "job completed");
        }
        Err(err) => {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            error!(job = %job_id, error = %err, "job action panicked; callback skipped");
        }
    }
    counters.in_flight.fetch_sub(1, Ordering::Relaxed);
    running.lock().remove(&job_id);
    // Freeing the slot comes last: the next queued job cannot start until
    // this job's callback has finished.
    drop(permit);
}

/// Completion hook for a placeholder job whose callback runs by policy.
/// No in-flight slot is involved — there is no action running.
async fn complete_empty_job(
    job_id: JobId,
    callback: Callback,
    params: JobParams,
    running: Arc<Mutex<HashMap<JobId, JoinHandle<()>>>>,
) {
    run_callback(callback, params).await;
    running.lock().remove(&job_id);
}

async fn run_callback(callback: Callback, params: JobParams) {
    match callback {
        Callback::Sync(callback) => callback(params),
        Callback::Async(callback) => callback(params).await,
    }
}
