//! Application readiness gate
//!
//! Every dispatch consults the gate's current value; nothing caches it.
//! `InitFailed` is terminal: once set, the gate never reports `Ready` again.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::notice::{Notice, NoticeMessages};

/// Startup state of the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Readiness {
    NotReady,
    Ready,
    InitFailed,
}

impl Readiness {
    const fn to_u8(self) -> u8 {
        match self {
            Readiness::NotReady => 0,
            Readiness::Ready => 1,
            Readiness::InitFailed => 2,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Readiness::Ready,
            2 => Readiness::InitFailed,
            _ => Readiness::NotReady,
        }
    }
}

/// Whether an action may run now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GateDecision {
    Allowed,
    BlockedNotReady,
    BlockedFailed,
}

impl GateDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, GateDecision::Allowed)
    }

    /// The notice explaining a block, `None` when allowed
    pub fn notice(self, messages: &NoticeMessages) -> Option<Notice> {
        match self {
            GateDecision::Allowed => None,
            GateDecision::BlockedNotReady => Some(Notice::warning(messages.not_ready.clone())),
            GateDecision::BlockedFailed => Some(Notice::error(messages.init_failed.clone())),
        }
    }
}

/// Process-wide readiness flag
///
/// Cheap to clone; all clones share one state. Construct a fresh gate to get
/// an independent one (e.g. per test).
#[derive(Debug, Clone, Default)]
pub struct ReadinessGate {
    state: Arc<AtomicU8>,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gate already in the given state
    pub fn with_state(state: Readiness) -> Self {
        Self {
            state: Arc::new(AtomicU8::new(state.to_u8())),
        }
    }

    pub fn state(&self) -> Readiness {
        Readiness::from_u8(self.state.load(Ordering::Acquire))
    }

    /// `NotReady → Ready`. Returns `false` if startup already failed.
    pub fn mark_ready(&self) -> bool {
        match self.state.compare_exchange(
            Readiness::NotReady.to_u8(),
            Readiness::Ready.to_u8(),
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                tracing::info!("application ready");
                true
            }
            Err(current) => Readiness::from_u8(current) == Readiness::Ready,
        }
    }

    /// Record a failed startup. Sticky.
    pub fn mark_failed(&self) {
        let previous = self
            .state
            .swap(Readiness::InitFailed.to_u8(), Ordering::AcqRel);
        if Readiness::from_u8(previous) != Readiness::InitFailed {
            tracing::error!(
                previous = ?Readiness::from_u8(previous),
                "application failed to start"
            );
        }
    }

    /// Check whether `action` may run now
    pub fn check(&self, action: &str) -> GateDecision {
        match self.state() {
            Readiness::Ready => GateDecision::Allowed,
            Readiness::NotReady => {
                tracing::warn!(action, "action blocked: application still loading");
                GateDecision::BlockedNotReady
            }
            Readiness::InitFailed => {
                tracing::warn!(action, "action blocked: application failed to start");
                GateDecision::BlockedFailed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_not_ready() {
        let gate = ReadinessGate::new();
        assert_eq!(gate.state(), Readiness::NotReady);
        assert_eq!(gate.check("page-reload"), GateDecision::BlockedNotReady);
    }

    #[test]
    fn test_ready_allows() {
        let gate = ReadinessGate::new();
        assert!(gate.mark_ready());
        assert!(gate.mark_ready());
        assert_eq!(gate.check("page-reload"), GateDecision::Allowed);
    }

    #[test]
    fn test_failed_is_sticky() {
        let gate = ReadinessGate::new();
        gate.mark_ready();
        gate.mark_failed();
        assert!(!gate.mark_ready());
        assert_eq!(gate.state(), Readiness::InitFailed);
        for _ in 0..3 {
            assert_eq!(gate.check("quiz-start"), GateDecision::BlockedFailed);
        }
    }

    #[test]
    fn test_clones_share_state() {
        let gate = ReadinessGate::new();
        let view = gate.clone();
        gate.mark_ready();
        assert_eq!(view.state(), Readiness::Ready);
        assert_eq!(ReadinessGate::new().state(), Readiness::NotReady);
    }

    #[test]
    fn test_block_notices_differ() {
        let messages = NoticeMessages::default();
        let loading = GateDecision::BlockedNotReady.notice(&messages).unwrap();
        let failed = GateDecision::BlockedFailed.notice(&messages).unwrap();
        assert_ne!(loading.message, failed.message);
        assert!(GateDecision::Allowed.notice(&messages).is_none());
    }
}
