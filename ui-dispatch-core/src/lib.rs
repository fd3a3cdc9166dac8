//! Core types for ui-dispatch
//!
//! This crate provides the machinery behind a single, centralized handler for
//! every user interaction in a UI tree: it works out which action was
//! requested, whether the application may run it yet, and hands it to a
//! dispatch table that calls out to loosely-coupled collaborators.
//!
//! # Core Concepts
//!
//! - **Document**: Arena-backed UI tree the interactions land on
//! - **Resolver**: Walks up from the origin to the nearest action marker
//! - **ReadinessGate**: Blocks actions until startup has finished
//! - **Notifier**: Throttled user notices for blocked actions
//! - **DiagnosticTracer**: Runtime-toggled trace of resolution decisions
//! - **Invoker**: Calls collaborator hooks and contains their failures
//! - **Dispatcher**: Ties the pieces together behind one entry point
//!
//! # Basic Example
//!
//! ```ignore
//! use ui_dispatch_core::prelude::*;
//!
//! let doc = share(Document::from_specs([
//!     ElementSpec::new("button").attr("data-action", "page-reload"),
//! ])?);
//!
//! let dispatcher = Arc::new(Dispatcher::new(MyTable, &DispatchConfig::default())?);
//! dispatcher.collaborators().register(Collaborator::ReloadPage, hook(|_| HookOutcome::Done));
//! dispatcher.gate().mark_ready();
//!
//! let listener = dispatcher.clone().attach(doc, CancellationToken::new())?;
//! listener.sender.send(Interaction::Click { origin })?;
//! ```

pub mod config;
pub mod dispatch;
pub mod document;
pub mod error;
pub mod frames;
pub mod invoke;
pub mod keys;
pub mod listener;
pub mod marker;
pub mod notice;
pub mod readiness;
pub mod request;
pub mod resolver;
pub mod testing;
pub mod tracer;

// Core trait exports
pub use dispatch::{
    DispatchContext, DispatchStatus, DispatchTable, Dispatcher, EventOutcome, Interaction,
};
pub use marker::Marker;

// Tree and resolution exports
pub use document::{lock, share, Document, ElementSpec, Node, NodeFlags, NodeId, SharedDocument};
pub use request::{ActionRequest, Params};
pub use resolver::{default_patterns, Resolution, Resolver, StructuralPattern};

// Gate and notice exports
pub use notice::{
    Notice, NoticeMessages, NoticeOutcome, NoticeSurface, NoticeThrottle, Notifier, Severity, Toast,
};
pub use readiness::{GateDecision, Readiness, ReadinessGate};

// Invocation exports
pub use invoke::{
    async_hook, hook, Arg, Collaborators, Hook, HookOutcome, Invocation, InvocationFailure, Invoker,
};

pub use config::DispatchConfig;
pub use error::{AttachError, ConfigError, DocumentError, HookError};
pub use frames::{settle, FrameScheduler, IntervalFrames};
pub use keys::{parse_key_string, ActivationKeys};
pub use listener::{InteractionSender, Listener};
pub use tracer::{DiagnosticTracer, TraceEntry};

// Testing exports
pub use testing::{char_key, key, CallLog, ImmediateFrames};

#[cfg(feature = "testing-time")]
pub use testing::advance_ms;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::DispatchConfig;
    pub use crate::dispatch::{
        DispatchContext, DispatchStatus, DispatchTable, Dispatcher, EventOutcome, Interaction,
    };
    pub use crate::document::{lock, share, Document, ElementSpec, NodeId, SharedDocument};
    pub use crate::error::{AttachError, ConfigError, DocumentError, HookError};
    pub use crate::frames::{settle, FrameScheduler};
    pub use crate::invoke::{async_hook, hook, Arg, Collaborators, Hook, HookOutcome, Invocation};
    pub use crate::marker::Marker;
    pub use crate::notice::{Notice, Notifier, Severity};
    pub use crate::readiness::{GateDecision, Readiness, ReadinessGate};
    pub use crate::request::{ActionRequest, Params};
    pub use crate::resolver::Resolver;
}
