//! Job descriptor: an action, an optional completion callback, and an open
//! bag of named parameters, submittable to a [`crate::core::JobPool`] as a
//! single unit.
//!
//! The parameter bag is a shared handle: cloning a [`JobParams`] clones the
//! handle, not the contents, so an action and a callback running on
//! different runtime threads observe the same entries. Lookups of keys that
//! were never set yield `None`; callers that want absent keys to fail loudly
//! use [`JobParams::require`].

use std::cmp::Ordering;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::core::error::PoolError;
use crate::util::clock::now_ms;

/// Parameter keys that carried the action and callback in the legacy wire
/// shape. Both live in typed fields here; the bag refuses writes under these
/// names so they can never shadow the control slots.
pub const RESERVED_KEYS: [&str; 2] = ["_run", "_callback"];

/// Boxed unit of asynchronous work produced by actions and async callbacks.
pub type UnitFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// A job's unit of work. Receives the job's own parameter bag and runs as an
/// independent task once the pool grants an in-flight slot.
pub type Action = Box<dyn FnOnce(JobParams) -> UnitFuture + Send + 'static>;

/// Completion callback attached to a job.
///
/// The completion hook calls a `Sync` callback inline and awaits an `Async`
/// one; either way the callback receives the job's parameter bag.
pub enum Callback {
    /// Synchronous callback, called inline from the completion hook.
    Sync(Box<dyn FnOnce(JobParams) + Send + 'static>),
    /// Asynchronous callback, awaited by the completion hook.
    Async(Box<dyn FnOnce(JobParams) -> UnitFuture + Send + 'static>),
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Callback::Sync"),
            Self::Async(_) => f.write_str("Callback::Async"),
        }
    }
}

/// Unique job identifier, assigned at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(Uuid);

impl JobId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Open, shared, mutable mapping of named values attached to a job.
///
/// Actions and callbacks may read and write entries concurrently with
/// producers; the map sits behind a `parking_lot::Mutex` and no guard is
/// ever held across an await point.
#[derive(Clone, Default)]
pub struct JobParams {
    inner: Arc<Mutex<Map<String, Value>>>,
}

impl JobParams {
    /// Create an empty parameter bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a parameter, yielding `None` when the key was never set.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.lock().get(key).cloned()
    }

    /// Strict lookup: absent keys fail with [`PoolError::MissingParameter`].
    ///
    /// # Errors
    ///
    /// Returns `PoolError::MissingParameter` when the key was never set.
    pub fn require(&self, key: &str) -> Result<Value, PoolError> {
        self.get(key)
            .ok_or_else(|| PoolError::MissingParameter(key.to_owned()))
    }

    /// Set a parameter, overwriting any previous value under the key.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::ReservedParameter` for control keys
    /// (see [`RESERVED_KEYS`]).
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Result<(), PoolError> {
        let key = key.into();
        if Self::is_reserved(&key) {
            return Err(PoolError::ReservedParameter(key));
        }
        self.inner.lock().insert(key, value.into());
        Ok(())
    }

    /// Remove a parameter, returning its previous value if it was set.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.lock().remove(key)
    }

    /// Merge every entry of a JSON object into the bag. Later values win:
    /// keys already present are overwritten, keys not present are added.
    ///
    /// The merge is atomic — a rejected input leaves the bag untouched.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::MergeNotAnObject` when `other` is not a JSON
    /// object, and `PoolError::ReservedParameter` when it contains a control
    /// key.
    pub fn merge(&self, other: Value) -> Result<(), PoolError> {
        let entries = match other {
            Value::Object(entries) => entries,
            other => return Err(PoolError::MergeNotAnObject(json_kind(&other))),
        };
        for key in entries.keys() {
            if Self::is_reserved(key) {
                return Err(PoolError::ReservedParameter(key.clone()));
            }
        }
        let mut guard = self.inner.lock();
        for (key, value) in entries {
            guard.insert(key, value);
        }
        Ok(())
    }

    /// Whether the bag holds a value under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().contains_key(key)
    }

    /// Number of entries in the bag.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the bag is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Diagnostic JSON rendering of the current contents.
    #[must_use]
    pub fn to_json(&self) -> String {
        Value::Object(self.inner.lock().clone()).to_string()
    }

    fn is_reserved(key: &str) -> bool {
        RESERVED_KEYS.contains(&key)
    }
}

impl fmt::Debug for JobParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("JobParams").field(&self.to_json()).finish()
    }
}

impl fmt::Display for JobParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A submittable unit of work: an optional action, an optional completion
/// callback, and a parameter bag both may read and write.
///
/// A job without an action is a no-op placeholder: the pool dequeues it and
/// it completes immediately without consuming an in-flight slot (see
/// [`crate::config::JobPoolConfig::run_empty_job_callback`] for what happens
/// to its callback).
///
/// Jobs order by creation time, earliest first.
pub struct Job {
    id: JobId,
    action: Option<Action>,
    callback: Option<Callback>,
    params: JobParams,
    created_at_ms: u128,
}

impl Job {
    /// Create an empty placeholder job with a fresh id and timestamp.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: JobId::generate(),
            action: None,
            callback: None,
            params: JobParams::new(),
            created_at_ms: now_ms(),
        }
    }

    /// Attach the job's action.
    #[must_use]
    pub fn with_action<F, Fut>(mut self, action: F) -> Self
    where
        F: FnOnce(JobParams) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.action = Some(Box::new(move |params| -> UnitFuture {
            Box::pin(action(params))
        }));
        self
    }

    /// Attach an asynchronous completion callback.
    #[must_use]
    pub fn with_callback<F, Fut>(mut self, callback: F) -> Self
    where
        F: FnOnce(JobParams) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.callback = Some(Callback::Async(Box::new(move |params| -> UnitFuture {
            Box::pin(callback(params))
        })));
        self
    }

    /// Attach a synchronous completion callback.
    #[must_use]
    pub fn with_sync_callback<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(JobParams) + Send + 'static,
    {
        self.callback = Some(Callback::Sync(Box::new(callback)));
        self
    }

    /// Set a single named parameter during construction.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::ReservedParameter` for control keys.
    pub fn with_param(
        self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, PoolError> {
        self.params.set(key, value)?;
        Ok(self)
    }

    /// Merge a JSON object of named parameters during construction.
    ///
    /// # Errors
    ///
    /// Same contract as [`JobParams::merge`].
    pub fn with_params(self, params: Value) -> Result<Self, PoolError> {
        self.params.merge(params)?;
        Ok(self)
    }

    /// Unique identifier of this job.
    #[must_use]
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Creation timestamp in milliseconds since the Unix epoch.
    #[must_use]
    pub fn created_at_ms(&self) -> u128 {
        self.created_at_ms
    }

    /// Whether an action is (still) attached.
    #[must_use]
    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    /// Whether a completion callback is (still) attached.
    #[must_use]
    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Shared handle to the job's parameter bag.
    #[must_use]
    pub fn params(&self) -> JobParams {
        self.params.clone()
    }

    /// Look up a parameter; `None` when the key was never set.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.params.get(key)
    }

    /// Set a parameter on the bag.
    ///
    /// # Errors
    ///
    /// Same contract as [`JobParams::set`].
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Result<(), PoolError> {
        self.params.set(key, value)
    }

    /// Remove a parameter from the bag.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.params.remove(key)
    }

    /// Merge a JSON object into the bag, returning `&mut self` for chaining.
    ///
    /// # Errors
    ///
    /// Same contract as [`JobParams::merge`].
    pub fn merge(&mut self, other: Value) -> Result<&mut Self, PoolError> {
        self.params.merge(other)?;
        Ok(self)
    }

    /// Start the job's action as an independent task bound to the job's own
    /// parameter bag, returning a handle to it. The task's result carries
    /// the bag so a completion hook can hand it to the callback.
    ///
    /// Returns `None` — and spawns nothing — when the job has no action.
    /// The action is consumed: a second call always returns `None`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn invoke(&mut self) -> Option<JoinHandle<JobParams>> {
        let action = self.action.take()?;
        let params = self.params.clone();
        let bag = self.params.clone();
        Some(tokio::spawn(async move {
            action(params).await;
            bag
        }))
    }

    /// Detach the completion callback, if any, for the completion hook.
    pub(crate) fn take_callback(&mut self) -> Option<Callback> {
        self.callback.take()
    }
}

impl Default for Job {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Job {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Job {}

impl PartialOrd for Job {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Job {
    fn cmp(&self, other: &Self) -> Ordering {
        // Earlier creation sorts first; the id disambiguates jobs created
        // within the same millisecond.
        (self.created_at_ms, self.id).cmp(&(other.created_at_ms, other.id))
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("created_at_ms", &self.created_at_ms)
            .field("has_action", &self.has_action())
            .field("has_callback", &self.has_callback())
            .field("params", &self.params)
            .finish()
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.params.to_json())
    }
}
