//! Test utilities for dispatch tables
//!
//! - [`key`]: Create `KeyEvent` from string (e.g., `key("enter")`)
//! - [`CallLog`]: Recording hooks that remember every call and its arguments
//! - [`failing_hook`], [`rejecting_hook`], [`panicking_hook`]: misbehaving collaborators
//! - [`ImmediateFrames`]: A frame scheduler that never waits
//! - Assertion macros for verifying collaborator calls
//!
//! # Example
//!
//! ```ignore
//! use ui_dispatch::testing::{CallLog, ImmediateFrames};
//!
//! let log = CallLog::new();
//! collaborators.register(Collaborator::ReloadPage, log.hook("reload-page"));
//!
//! dispatcher.handle(&doc, Interaction::Click { origin });
//! assert_called!(log, "reload-page");
//! ```

use std::future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::error::HookError;
use crate::frames::{FrameFuture, FrameScheduler};
use crate::invoke::{hook, Arg, Hook, HookOutcome};
use crate::keys::parse_key_string;

/// Create a `KeyEvent` from a key string.
///
/// This is a convenience wrapper around [`parse_key_string`] that panics
/// if the key string is invalid, making it suitable for use in tests.
///
/// # Examples
///
/// ```
/// use ui_dispatch_core::testing::key;
/// use crossterm::event::{KeyCode, KeyModifiers};
///
/// let k = key("enter");
/// assert_eq!(k.code, KeyCode::Enter);
///
/// let k = key("ctrl+p");
/// assert_eq!(k.code, KeyCode::Char('p'));
/// assert!(k.modifiers.contains(KeyModifiers::CONTROL));
/// ```
///
/// # Panics
///
/// Panics if the key string cannot be parsed.
pub fn key(s: &str) -> KeyEvent {
    parse_key_string(s).unwrap_or_else(|| panic!("Invalid key string: {:?}", s))
}

/// Create a `KeyEvent` for a character with no modifiers.
pub fn char_key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
}

/// One recorded collaborator call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub hook: String,
    pub args: Vec<Arg>,
}

/// Shared record of collaborator calls
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A hook that records its calls under `name` and succeeds
    pub fn hook(&self, name: &str) -> Hook {
        let log = self.clone();
        let name = name.to_string();
        hook(move |args| {
            log.push(&name, args);
            HookOutcome::Done
        })
    }

    /// A hook that records its calls and then returns `outcome()`
    pub fn hook_with<F>(&self, name: &str, outcome: F) -> Hook
    where
        F: Fn(&[Arg]) -> HookOutcome + Send + Sync + 'static,
    {
        let log = self.clone();
        let name = name.to_string();
        hook(move |args| {
            log.push(&name, args);
            outcome(args)
        })
    }

    fn push(&self, name: &str, args: &[Arg]) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Call {
                hook: name.to_string(),
                args: args.to_vec(),
            });
    }

    /// All calls so far, in call order
    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Argument lists of every call to `name`
    pub fn calls_to(&self, name: &str) -> Vec<Vec<Arg>> {
        self.calls()
            .into_iter()
            .filter(|call| call.hook == name)
            .map(|call| call.args)
            .collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls_to(name).len()
    }

    /// Hook names in call order
    pub fn names(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.hook).collect()
    }

    pub fn len(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

/// A hook that fails synchronously with `message`
pub fn failing_hook(message: &str) -> Hook {
    let message = message.to_string();
    hook(move |_| HookOutcome::failed(message.clone()))
}

/// A hook whose future fails with `message`
pub fn rejecting_hook(message: &str) -> Hook {
    let message = message.to_string();
    hook(move |_| {
        let error = HookError::new(message.clone());
        HookOutcome::pending(async move {
            tokio::task::yield_now().await;
            Err(error)
        })
    })
}

/// A hook that panics with `message`
pub fn panicking_hook(message: &str) -> Hook {
    let message = message.to_string();
    hook(move |_| panic!("{}", message))
}

/// Frame scheduler that resolves every frame immediately and counts them
#[derive(Debug, Clone, Default)]
pub struct ImmediateFrames {
    frames: Arc<AtomicUsize>,
}

impl ImmediateFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames requested so far
    pub fn count(&self) -> usize {
        self.frames.load(Ordering::SeqCst)
    }
}

impl FrameScheduler for ImmediateFrames {
    fn next_frame(&self) -> FrameFuture {
        self.frames.fetch_add(1, Ordering::SeqCst);
        Box::pin(future::ready(()))
    }
}

/// Advance paused tokio time by `ms` milliseconds
///
/// Only meaningful inside `#[tokio::test(start_paused = true)]`.
#[cfg(feature = "testing-time")]
pub async fn advance_ms(ms: u64) {
    tokio::time::advance(std::time::Duration::from_millis(ms)).await;
}

/// Let spawned tasks run until they park
pub async fn drain_tasks() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

/// Assert that a hook was called, optionally with specific arguments.
///
/// # Example
///
/// ```ignore
/// assert_called!(log, "show-module-modal");
/// assert_called!(log, "show-module-modal", [Arg::text("m3")]);
/// ```
#[macro_export]
macro_rules! assert_called {
    ($log:expr, $name:expr) => {
        assert!(
            $log.count($name) > 0,
            "Expected `{}` to be called, but got: {:?}",
            $name,
            $log.names()
        );
    };
    ($log:expr, $name:expr, [$($arg:expr),* $(,)?]) => {{
        let expected: ::std::vec::Vec<$crate::invoke::Arg> = vec![$($arg),*];
        assert!(
            $log.calls_to($name).contains(&expected),
            "Expected `{}` to be called with {:?}, but got: {:?}",
            $name,
            expected,
            $log.calls_to($name)
        );
    }};
}

/// Assert that a hook was NOT called.
///
/// # Example
///
/// ```ignore
/// assert_not_called!(log, "call-function");
/// ```
#[macro_export]
macro_rules! assert_not_called {
    ($log:expr, $name:expr) => {
        assert!(
            $log.count($name) == 0,
            "Expected `{}` NOT to be called, but it was: {:?}",
            $name,
            $log.calls_to($name)
        );
    };
}
