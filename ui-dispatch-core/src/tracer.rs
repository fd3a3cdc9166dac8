//! Runtime-toggled tracing of resolution decisions
//!
//! Useful when an overlay or occluding element swallows clicks: each traced
//! entry records what was actually hit, the path that was walked and what the
//! resolver and gate decided. Tracing is purely observational and never
//! changes a dispatch outcome.
//!
//! # Example
//!
//! ```ignore
//! dispatcher.tracer().set_enabled(true);
//! // ... interactions ...
//! for entry in dispatcher.tracer().recent(5) {
//!     println!("{} -> {:?}", entry.origin, entry.action);
//! }
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use serde::Serialize;

use crate::document::{Document, NodeId};
use crate::readiness::GateDecision;
use crate::resolver::Resolution;

/// Default ring buffer size
pub const DEFAULT_TRACE_CAPACITY: usize = 200;

/// One traced interaction
#[derive(Debug, Clone, Serialize)]
pub struct TraceEntry {
    /// Sequence number for ordering
    pub sequence: u64,
    #[serde(skip)]
    pub timestamp: Instant,
    pub origin_node: NodeId,
    /// Selector-like description of the origin, e.g. `span.title`
    pub origin: String,
    /// Descriptions of the nodes walked, origin first
    pub path: Vec<String>,
    pub resolved: Option<NodeId>,
    pub action: Option<String>,
    pub repaired: bool,
    pub disabled: bool,
    /// Filled in once the gate has been consulted
    pub decision: Option<GateDecision>,
}

impl TraceEntry {
    /// Format the age of this entry for display (e.g. "2.3s", "150ms")
    pub fn elapsed_display(&self) -> String {
        let elapsed = self.timestamp.elapsed();
        if elapsed.as_secs() >= 1 {
            format!("{:.1}s", elapsed.as_secs_f64())
        } else {
            format!("{}ms", elapsed.as_millis())
        }
    }
}

/// Bounded, toggleable trace log
#[derive(Debug)]
pub struct DiagnosticTracer {
    enabled: AtomicBool,
    capacity: usize,
    next_sequence: AtomicU64,
    entries: Mutex<VecDeque<TraceEntry>>,
}

impl Default for DiagnosticTracer {
    fn default() -> Self {
        Self::new(DEFAULT_TRACE_CAPACITY)
    }
}

impl DiagnosticTracer {
    pub fn new(capacity: usize) -> Self {
        Self {
            enabled: AtomicBool::new(false),
            capacity: capacity.max(1),
            next_sequence: AtomicU64::new(0),
            entries: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Flip the toggle, returning the new state
    pub fn toggle(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::Relaxed)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record a resolution. Returns the entry's sequence number when tracing is on.
    pub fn record(&self, doc: &Document, origin: NodeId, resolution: &Resolution) -> Option<u64> {
        if !self.is_enabled() {
            return None;
        }

        let describe = |id: NodeId| {
            doc.node(id)
                .map(|n| n.describe())
                .unwrap_or_else(|| format!("<missing {}>", id.0))
        };
        let resolved = resolution.node();
        let path = match resolved {
            Some(target) => {
                let mut path = Vec::new();
                for id in doc.ancestors(origin) {
                    path.push(describe(id));
                    if id == target {
                        break;
                    }
                }
                path
            }
            None => doc.ancestors(origin).map(describe).collect(),
        };

        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let entry = TraceEntry {
            sequence,
            timestamp: Instant::now(),
            origin_node: origin,
            origin: describe(origin),
            path,
            resolved,
            action: resolution.action().map(str::to_string),
            repaired: resolution.is_repaired(),
            disabled: matches!(resolution, Resolution::Disabled { .. }),
            decision: None,
        };

        tracing::debug!(
            target: "ui_dispatch::trace",
            sequence,
            origin = %entry.origin,
            path = %entry.path.join(" > "),
            action = entry.action.as_deref().unwrap_or("-"),
            repaired = entry.repaired,
            disabled = entry.disabled,
            "resolved interaction"
        );

        // Never wait on the buffer; a contended push is dropped
        if let Ok(mut entries) = self.entries.try_lock() {
            if entries.len() == self.capacity {
                entries.pop_front();
            }
            entries.push_back(entry);
        }
        Some(sequence)
    }

    /// Attach the gate decision to a recorded entry
    pub fn record_decision(&self, sequence: u64, decision: GateDecision) {
        tracing::debug!(target: "ui_dispatch::trace", sequence, ?decision, "gate decision");
        if let Ok(mut entries) = self.entries.try_lock() {
            if let Some(entry) = entries.iter_mut().rev().find(|e| e.sequence == sequence) {
                entry.decision = Some(decision);
            }
        }
    }

    /// The most recent `count` entries, oldest first
    pub fn recent(&self, count: usize) -> Vec<TraceEntry> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let skip = entries.len().saturating_sub(count);
        entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .map(|entries| entries.len())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    /// Export the buffered entries as pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.recent(self.capacity))
    }
}
