//! Safe invocation of loosely-typed collaborator hooks
//!
//! A hook is any function the host application exposes for a dispatch branch
//! to call. Hooks may be missing (optional modules not loaded yet), may fail
//! synchronously, may panic, or may hand back a future that fails later. The
//! [`Invoker`] absorbs all of these: nothing a hook does can escape into the
//! dispatch loop.
//!
//! Async hooks are fire-and-forget. Their futures are spawned on tokio and a
//! watcher task logs a rejection exactly once; the dispatch turn never waits.
//!
//! # Example
//!
//! ```ignore
//! use ui_dispatch::invoke::{hook, Arg, HookOutcome, Invoker};
//!
//! let show = hook(|args| {
//!     println!("show module {:?}", args.first());
//!     HookOutcome::Done
//! });
//!
//! let invoker = Invoker::new();
//! invoker.invoke("show-module-modal", Some(&show), &[Arg::text("m3")]);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::error::HookError;
use crate::marker::Marker;

/// A loosely-typed argument passed to a hook
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Arg {
    Text(String),
    Index(usize),
    Int(i64),
    Flag(bool),
}

impl Arg {
    pub fn text(value: impl Into<String>) -> Self {
        Arg::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Arg::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Arg::Index(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Arg::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Arg::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Text(s) => write!(f, "{s:?}"),
            Arg::Index(i) => write!(f, "{i}"),
            Arg::Int(n) => write!(f, "{n}"),
            Arg::Flag(b) => write!(f, "{b}"),
        }
    }
}

/// Future returned by an async hook
pub type HookFuture = Pin<Box<dyn Future<Output = Result<(), HookError>> + Send + 'static>>;

/// What a hook call produced
pub enum HookOutcome {
    /// Finished synchronously
    Done,
    /// Failed synchronously
    Failed(HookError),
    /// Continues asynchronously
    Pending(HookFuture),
}

impl HookOutcome {
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        HookOutcome::Pending(Box::pin(future))
    }

    pub fn failed(message: impl Into<String>) -> Self {
        HookOutcome::Failed(HookError::new(message))
    }
}

impl fmt::Debug for HookOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookOutcome::Done => f.write_str("Done"),
            HookOutcome::Failed(e) => f.debug_tuple("Failed").field(e).finish(),
            HookOutcome::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

impl From<Result<(), HookError>> for HookOutcome {
    fn from(result: Result<(), HookError>) -> Self {
        match result {
            Ok(()) => HookOutcome::Done,
            Err(e) => HookOutcome::Failed(e),
        }
    }
}

/// A collaborator function
pub type Hook = Arc<dyn Fn(&[Arg]) -> HookOutcome + Send + Sync>;

/// Wrap a closure as a [`Hook`]
pub fn hook<F>(f: F) -> Hook
where
    F: Fn(&[Arg]) -> HookOutcome + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a closure returning a future as an async [`Hook`]
pub fn async_hook<F, Fut>(f: F) -> Hook
where
    F: Fn(Vec<Arg>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HookError>> + Send + 'static,
{
    Arc::new(move |args: &[Arg]| HookOutcome::pending(f(args.to_vec())))
}

/// Where a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailurePhase {
    /// Returned an error synchronously
    Sync,
    /// Panicked while being called
    Panic,
    /// The returned future failed
    Async,
    /// The returned future panicked
    AsyncPanic,
    /// No runtime was available to drive the returned future
    NoRuntime,
}

/// A logged hook failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationFailure {
    pub hook: String,
    pub phase: FailurePhase,
    pub error: String,
}

/// Result of a single invocation, as seen by the dispatch turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Invocation {
    /// No hook registered
    Missing,
    /// Returned synchronously without error
    Completed,
    /// Failed or panicked synchronously; already logged
    Failed,
    /// Future spawned; any failure will be logged later
    Spawned,
}

#[derive(Debug, Clone, Default)]
struct FailureReporter {
    count: Arc<AtomicU64>,
    tx: Option<mpsc::UnboundedSender<InvocationFailure>>,
}

impl FailureReporter {
    fn report(&self, hook: &str, phase: FailurePhase, error: String) {
        tracing::error!(hook, ?phase, error = %error, "collaborator failed");
        self.count.fetch_add(1, Ordering::Relaxed);
        if let Some(tx) = &self.tx {
            let _ = tx.send(InvocationFailure {
                hook: hook.to_string(),
                phase,
                error,
            });
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Calls hooks and contains their failures
#[derive(Debug, Clone, Default)]
pub struct Invoker {
    runtime: Option<Handle>,
    reporter: FailureReporter,
}

impl Invoker {
    /// Create an invoker bound to the current tokio runtime, if any
    pub fn new() -> Self {
        Self {
            runtime: Handle::try_current().ok(),
            reporter: FailureReporter::default(),
        }
    }

    /// Use an explicit runtime for async hooks
    pub fn with_handle(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Forward every failure to `tx` in addition to logging it
    pub fn with_failure_channel(mut self, tx: mpsc::UnboundedSender<InvocationFailure>) -> Self {
        self.reporter.tx = Some(tx);
        self
    }

    /// Total failures observed so far
    pub fn failure_count(&self) -> u64 {
        self.reporter.count.load(Ordering::Relaxed)
    }

    fn handle(&self) -> Option<Handle> {
        Handle::try_current().ok().or_else(|| self.runtime.clone())
    }

    /// Call `hook` with `args`, containing every kind of failure
    pub fn invoke(&self, name: &str, hook: Option<&Hook>, args: &[Arg]) -> Invocation {
        let Some(hook) = hook else {
            tracing::warn!(hook = name, "collaborator not available; skipping");
            return Invocation::Missing;
        };

        tracing::debug!(hook = name, args = args.len(), "invoking collaborator");
        let outcome = match catch_unwind(AssertUnwindSafe(|| hook(args))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                self.reporter
                    .report(name, FailurePhase::Panic, panic_message(payload.as_ref()));
                return Invocation::Failed;
            }
        };

        match outcome {
            HookOutcome::Done => Invocation::Completed,
            HookOutcome::Failed(error) => {
                self.reporter
                    .report(name, FailurePhase::Sync, error.to_string());
                Invocation::Failed
            }
            HookOutcome::Pending(future) => self.spawn(name, future),
        }
    }

    /// Drive `future` in the background, logging its failure exactly once
    pub fn spawn<F>(&self, name: &str, future: F) -> Invocation
    where
        F: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        let Some(runtime) = self.handle() else {
            self.reporter.report(
                name,
                FailurePhase::NoRuntime,
                "no async runtime available".to_string(),
            );
            return Invocation::Failed;
        };

        let task = runtime.spawn(future);
        let reporter = self.reporter.clone();
        let name = name.to_string();
        runtime.spawn(async move {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(error)) => reporter.report(&name, FailurePhase::Async, error.to_string()),
                Err(join_error) if join_error.is_panic() => {
                    let message = panic_message(join_error.into_panic().as_ref());
                    reporter.report(&name, FailurePhase::AsyncPanic, message);
                }
                // Cancelled at runtime shutdown
                Err(_) => {}
            }
        });
        Invocation::Spawned
    }
}

/// Registry of collaborator hooks keyed by a closed name set
///
/// Cloneable and shared: hooks can be registered after the dispatcher is
/// built, since optional modules often load after the core.
pub struct Collaborators<H: Marker> {
    hooks: Arc<RwLock<HashMap<H, Hook>>>,
}

impl<H: Marker> Clone for Collaborators<H> {
    fn clone(&self) -> Self {
        Self {
            hooks: Arc::clone(&self.hooks),
        }
    }
}

impl<H: Marker> Default for Collaborators<H> {
    fn default() -> Self {
        Self {
            hooks: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<H: Marker> fmt::Debug for Collaborators<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("registered", &self.registered())
            .finish()
    }
}

impl<H: Marker> Collaborators<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the hook for `name`
    pub fn register(&self, name: H, hook: Hook) -> &Self {
        self.hooks
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name, hook);
        self
    }

    pub fn unregister(&self, name: H) -> Option<Hook> {
        self.hooks
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&name)
    }

    pub fn get(&self, name: H) -> Option<Hook> {
        self.hooks
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&name)
            .cloned()
    }

    pub fn contains(&self, name: H) -> bool {
        self.get(name).is_some()
    }

    /// Names with a registered hook, in declaration order
    pub fn registered(&self) -> Vec<&'static str> {
        let hooks = self
            .hooks
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        H::all()
            .iter()
            .filter(|name| hooks.contains_key(name))
            .map(Marker::name)
            .collect()
    }

    /// Look up and safely invoke `name`
    ///
    /// The registry lock is released before the hook runs, so hooks may
    /// register or call other collaborators.
    pub fn call(&self, invoker: &Invoker, name: H, args: &[Arg]) -> Invocation {
        let hook = self.get(name);
        invoker.invoke(name.name(), hook.as_ref(), args)
    }

    /// Call `name` and wait for it, for use inside async flows
    ///
    /// A missing hook is an error here: the flow cannot continue without it.
    pub async fn call_async(&self, name: H, args: Vec<Arg>) -> Result<(), HookError> {
        let hook = self.get(name).ok_or_else(|| {
            HookError::new(format!("collaborator {} is not available", name.name()))
        })?;
        match catch_unwind(AssertUnwindSafe(|| hook(args.as_slice()))) {
            Ok(HookOutcome::Done) => Ok(()),
            Ok(HookOutcome::Failed(error)) => Err(error),
            Ok(HookOutcome::Pending(future)) => future.await,
            Err(payload) => Err(HookError::new(format!(
                "collaborator {} panicked: {}",
                name.name(),
                panic_message(payload.as_ref())
            ))),
        }
    }
}
