//! The dispatcher: resolve, trace, gate, dispatch
//!
//! Every interaction takes one synchronous turn through
//! [`Dispatcher::handle`]:
//!
//! 1. the [`Resolver`] finds the actionable node (repairing it if needed)
//! 2. the [`DiagnosticTracer`] records the decision when enabled
//! 3. the [`ReadinessGate`] allows or blocks the action
//! 4. a blocked action is explained through the throttled [`Notifier`]
//! 5. an allowed action is looked up and handed to the [`DispatchTable`]
//!
//! Nothing in the turn awaits. Collaborators that return futures are spawned
//! by the [`Invoker`] and finish after the turn has ended.
//!
//! # Example
//!
//! ```ignore
//! use ui_dispatch::prelude::*;
//!
//! struct Table;
//!
//! impl DispatchTable for Table {
//!     type Kind = Action;
//!     type Hook = Collaborator;
//!
//!     fn dispatch(&self, kind: Action, cx: DispatchContext<'_, Collaborator>) {
//!         match kind {
//!             Action::PageReload => {
//!                 cx.call(Collaborator::ReloadPage, &[]);
//!             }
//!         }
//!     }
//! }
//!
//! let dispatcher = Dispatcher::new(Table, &DispatchConfig::default())?;
//! dispatcher.gate().mark_ready();
//! let outcome = dispatcher.handle(&doc, Interaction::Click { origin });
//! ```

use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crossterm::event::KeyEvent;
use serde::Serialize;

use crate::config::DispatchConfig;
use crate::document::{lock, Document, NodeId, SharedDocument};
use crate::error::{ConfigError, HookError};
use crate::frames::{FrameScheduler, IntervalFrames};
use crate::invoke::{panic_message, Arg, Collaborators, Invocation, Invoker};
use crate::keys::ActivationKeys;
use crate::marker::Marker;
use crate::notice::{NoticeMessages, Notifier};
use crate::readiness::{GateDecision, ReadinessGate};
use crate::request::ActionRequest;
use crate::resolver::Resolver;
use crate::tracer::DiagnosticTracer;

/// The exhaustive mapping from action kinds to collaborator calls
///
/// `Kind` is the closed set of action names, `Hook` the closed set of
/// collaborator names. A branch extracts its own parameters from the
/// request; the resolver never interprets them.
pub trait DispatchTable: Send + Sync + 'static {
    type Kind: Marker;
    type Hook: Marker;

    fn dispatch(&self, kind: Self::Kind, cx: DispatchContext<'_, Self::Hook>);
}

/// Everything a dispatch branch may touch during its turn
pub struct DispatchContext<'a, H: Marker> {
    request: &'a ActionRequest,
    document: &'a SharedDocument,
    collaborators: &'a Collaborators<H>,
    invoker: &'a Invoker,
    frames: &'a Arc<dyn FrameScheduler>,
    notifier: &'a Notifier,
}

impl<'a, H: Marker> DispatchContext<'a, H> {
    pub fn request(&self) -> &ActionRequest {
        self.request
    }

    /// Raw string value of a parameter attribute
    pub fn param(&self, name: &str) -> Option<&str> {
        self.request.param(name)
    }

    pub fn node(&self) -> NodeId {
        self.request.node
    }

    pub fn document(&self) -> &SharedDocument {
        self.document
    }

    /// Run `f` with the document locked. Never call a collaborator from `f`.
    pub fn with_document<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        f(&mut lock(self.document))
    }

    /// Invoke a collaborator through the safe wrapper
    pub fn call(&self, hook: H, args: &[Arg]) -> Invocation {
        self.collaborators.call(self.invoker, hook, args)
    }

    /// Run an async flow in the background; its failure is logged once
    pub fn spawn<F>(&self, label: &str, future: F) -> Invocation
    where
        F: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        self.invoker.spawn(label, future)
    }

    /// Owned handle to the registry, for async flows
    pub fn collaborators(&self) -> Collaborators<H> {
        self.collaborators.clone()
    }

    pub fn frames(&self) -> Arc<dyn FrameScheduler> {
        Arc::clone(self.frames)
    }

    pub fn notifier(&self) -> &Notifier {
        self.notifier
    }
}

/// A raw user interaction on the UI tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// Primary-button activation on `origin`
    Click { origin: NodeId },
    /// Key press while `target` has focus
    Key { target: NodeId, key: KeyEvent },
}

/// What happened to an interaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DispatchStatus {
    /// Nothing actionable under the origin
    NoAction,
    /// Key was not an activation key
    IgnoredKey,
    Blocked(GateDecision),
    /// Marker names no known action
    UnknownAction(String),
    Dispatched(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventOutcome {
    pub status: DispatchStatus,
    /// Whether the interaction's default behaviour was suppressed
    pub default_prevented: bool,
}

impl EventOutcome {
    fn new(status: DispatchStatus) -> Self {
        let default_prevented = matches!(
            status,
            DispatchStatus::Blocked(_) | DispatchStatus::Dispatched(_)
        );
        Self {
            status,
            default_prevented,
        }
    }

    pub fn is_dispatched(&self) -> bool {
        matches!(self.status, DispatchStatus::Dispatched(_))
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self.status, DispatchStatus::Blocked(_))
    }
}

/// The single entry point for interactions
pub struct Dispatcher<T: DispatchTable> {
    table: T,
    resolver: Resolver,
    gate: ReadinessGate,
    notifier: Notifier,
    tracer: Arc<DiagnosticTracer>,
    invoker: Invoker,
    collaborators: Collaborators<T::Hook>,
    frames: Arc<dyn FrameScheduler>,
    activation: ActivationKeys,
    messages: NoticeMessages,
    pub(crate) attached: AtomicBool,
}

impl<T: DispatchTable> Dispatcher<T> {
    pub fn new(table: T, config: &DispatchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let tracer = DiagnosticTracer::new(config.trace_capacity);
        tracer.set_enabled(config.trace_enabled);
        Ok(Self {
            table,
            resolver: Resolver::new().with_marker(config.marker_attribute.trim()),
            gate: ReadinessGate::new(),
            notifier: Notifier::new(config.throttle()),
            tracer: Arc::new(tracer),
            invoker: Invoker::new(),
            collaborators: Collaborators::new(),
            frames: Arc::new(IntervalFrames::new(config.frame_interval())),
            activation: config.activation_keys.clone(),
            messages: config.messages.clone(),
            attached: AtomicBool::new(false),
        })
    }

    /// Share a gate owned by the startup code
    pub fn with_gate(mut self, gate: ReadinessGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_invoker(mut self, invoker: Invoker) -> Self {
        self.invoker = invoker;
        self
    }

    pub fn with_frames(mut self, frames: Arc<dyn FrameScheduler>) -> Self {
        self.frames = frames;
        self
    }

    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_collaborators(mut self, collaborators: Collaborators<T::Hook>) -> Self {
        self.collaborators = collaborators;
        self
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn gate(&self) -> &ReadinessGate {
        &self.gate
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn tracer(&self) -> &Arc<DiagnosticTracer> {
        &self.tracer
    }

    pub fn invoker(&self) -> &Invoker {
        &self.invoker
    }

    pub fn collaborators(&self) -> &Collaborators<T::Hook> {
        &self.collaborators
    }

    pub fn activation_keys(&self) -> &ActivationKeys {
        &self.activation
    }

    /// Process one interaction. Never panics, never awaits.
    pub fn handle(&self, doc: &SharedDocument, interaction: Interaction) -> EventOutcome {
        match interaction {
            Interaction::Click { origin } => self.handle_click(doc, origin),
            Interaction::Key { target, key } => self.handle_key(doc, target, &key),
        }
    }

    pub fn handle_click(&self, doc: &SharedDocument, origin: NodeId) -> EventOutcome {
        let (request, sequence) = {
            let mut guard = lock(doc);
            let resolution = self.resolver.resolve(&guard, origin);
            let sequence = self.tracer.record(&guard, origin, &resolution);
            if let Err(error) = self.resolver.normalize(&mut guard, &resolution) {
                tracing::warn!(%error, "could not repair action marker");
            }
            (self.resolver.request(&guard, &resolution), sequence)
        };

        match request {
            Some(request) => self.run(doc, request, sequence),
            None => {
                tracing::debug!(origin = ?origin, "no action under interaction");
                EventOutcome::new(DispatchStatus::NoAction)
            }
        }
    }

    /// Activation keys behave exactly like a click on `target`
    pub fn handle_key(
        &self,
        doc: &SharedDocument,
        target: NodeId,
        key: &KeyEvent,
    ) -> EventOutcome {
        if !self.activation.is_activation(key) {
            return EventOutcome::new(DispatchStatus::IgnoredKey);
        }
        tracing::debug!(target_node = ?target, code = ?key.code, "activation key");
        self.handle_click(doc, target)
    }

    /// Dispatch a known action name on `node`, still subject to the gate
    pub fn dispatch_action(
        &self,
        doc: &SharedDocument,
        action: &str,
        node: NodeId,
    ) -> EventOutcome {
        let action = action.trim();
        if action.is_empty() {
            return EventOutcome::new(DispatchStatus::NoAction);
        }
        let params = self.resolver.params(&lock(doc), node);
        let request = ActionRequest::new(node, action).with_params(params);
        self.run(doc, request, None)
    }

    fn run(
        &self,
        doc: &SharedDocument,
        request: ActionRequest,
        sequence: Option<u64>,
    ) -> EventOutcome {
        let Some(action) = request.action().map(str::to_string) else {
            return EventOutcome::new(DispatchStatus::NoAction);
        };

        let decision = self.gate.check(&action);
        if let Some(sequence) = sequence {
            self.tracer.record_decision(sequence, decision);
        }
        if let Some(notice) = decision.notice(&self.messages) {
            self.notifier.notify(notice);
            return EventOutcome::new(DispatchStatus::Blocked(decision));
        }

        let Some(kind) = T::Kind::from_name(&action) else {
            tracing::warn!(action = %action, "unknown action; ignoring");
            return EventOutcome::new(DispatchStatus::UnknownAction(action));
        };

        tracing::debug!(
            action = %action,
            node = ?request.node,
            params = request.params.len(),
            repaired = request.repaired,
            "dispatching"
        );
        let cx = DispatchContext {
            request: &request,
            document: doc,
            collaborators: &self.collaborators,
            invoker: &self.invoker,
            frames: &self.frames,
            notifier: &self.notifier,
        };
        let turn = catch_unwind(AssertUnwindSafe(|| self.table.dispatch(kind, cx)));
        if let Err(payload) = turn {
            tracing::error!(
                action = %action,
                panic = %panic_message(payload.as_ref()),
                "dispatch branch panicked"
            );
        }
        EventOutcome::new(DispatchStatus::Dispatched(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{share, ElementSpec};
    use crate::notice::{Notice, NoticeSurface, Severity};
    use crate::readiness::Readiness;
    use crate::testing::{failing_hook, key, CallLog, ImmediateFrames};

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    enum Kind {
        Open,
        ShowDetails,
        Explode,
    }

    impl Marker for Kind {
        fn name(&self) -> &'static str {
            match self {
                Kind::Open => "open",
                Kind::ShowDetails => "show-details",
                Kind::Explode => "explode",
            }
        }

        fn from_name(name: &str) -> Option<Self> {
            Self::all().iter().copied().find(|k| k.name() == name)
        }

        fn all() -> &'static [Self] {
            &[Kind::Open, Kind::ShowDetails, Kind::Explode]
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    enum Hook {
        Open,
        Details,
    }

    impl Marker for Hook {
        fn name(&self) -> &'static str {
            match self {
                Hook::Open => "open",
                Hook::Details => "details",
            }
        }

        fn from_name(name: &str) -> Option<Self> {
            Self::all().iter().copied().find(|h| h.name() == name)
        }

        fn all() -> &'static [Self] {
            &[Hook::Open, Hook::Details]
        }
    }

    struct Table;

    impl DispatchTable for Table {
        type Kind = Kind;
        type Hook = Hook;

        fn dispatch(&self, kind: Kind, cx: DispatchContext<'_, Hook>) {
            match kind {
                Kind::Open => {
                    let id = cx.param("id").unwrap_or_default().to_string();
                    cx.call(Hook::Open, &[Arg::text(id)]);
                }
                Kind::ShowDetails => {
                    cx.call(Hook::Details, &[]);
                }
                Kind::Explode => panic!("branch bug"),
            }
        }
    }

    struct Page {
        doc: SharedDocument,
        open_label: NodeId,
        card_title: NodeId,
        plain: NodeId,
        bogus: NodeId,
        explode: NodeId,
    }

    fn page() -> Page {
        let mut doc = Document::new();
        let root = doc.root();
        let open = doc
            .insert(
                root,
                ElementSpec::new("button")
                    .attr("data-action", "open")
                    .attr("data-id", "m3")
                    .child(ElementSpec::new("span").text("Open")),
            )
            .unwrap();
        let open_label = doc.node(open).unwrap().children()[0];
        let card = doc
            .insert(
                root,
                ElementSpec::new("div")
                    .role("button")
                    .class("module-card")
                    .child(ElementSpec::new("h3").text("Algebra")),
            )
            .unwrap();
        let card_title = doc.node(card).unwrap().children()[0];
        let plain = doc.insert(root, ElementSpec::new("p").text("hello")).unwrap();
        let bogus = doc
            .insert(root, ElementSpec::new("button").attr("data-action", "warp-drive"))
            .unwrap();
        let explode = doc
            .insert(root, ElementSpec::new("button").attr("data-action", "explode"))
            .unwrap();
        Page {
            doc: share(doc),
            open_label,
            card_title,
            plain,
            bogus,
            explode,
        }
    }

    fn click(dispatcher: &Dispatcher<Table>, doc: &SharedDocument, origin: NodeId) -> EventOutcome {
        dispatcher.handle(doc, Interaction::Click { origin })
    }

    fn dispatcher(state: Readiness) -> (Dispatcher<Table>, CallLog) {
        let log = CallLog::new();
        let dispatcher = Dispatcher::new(Table, &DispatchConfig::default())
            .unwrap()
            .with_gate(ReadinessGate::with_state(state))
            .with_frames(Arc::new(ImmediateFrames::new()));
        dispatcher.collaborators().register(Hook::Open, log.hook("open"));
        dispatcher
            .collaborators()
            .register(Hook::Details, log.hook("details"));
        (dispatcher, log)
    }

    #[test]
    fn test_click_dispatches_with_params() {
        let page = page();
        let (dispatcher, log) = dispatcher(Readiness::Ready);

        let outcome = click(&dispatcher, &page.doc, page.open_label);
        assert_eq!(outcome.status, DispatchStatus::Dispatched("open".into()));
        assert!(outcome.default_prevented);
        assert_eq!(log.calls_to("open"), vec![vec![Arg::text("m3")]]);
    }

    #[test]
    fn test_no_action_has_no_side_effects() {
        let page = page();
        let (dispatcher, log) = dispatcher(Readiness::NotReady);

        let outcome = click(&dispatcher, &page.doc, page.plain);
        assert_eq!(outcome.status, DispatchStatus::NoAction);
        assert!(!outcome.default_prevented);
        assert!(log.is_empty());
        assert_eq!(dispatcher.notifier().shown_count(), 0);
    }

    #[test]
    fn test_blocked_while_loading_notifies_once() {
        let page = page();
        let (dispatcher, log) = dispatcher(Readiness::NotReady);

        for _ in 0..3 {
            let outcome = click(&dispatcher, &page.doc, page.open_label);
            assert_eq!(
                outcome.status,
                DispatchStatus::Blocked(GateDecision::BlockedNotReady)
            );
            assert!(outcome.default_prevented);
        }
        assert!(log.is_empty());
        assert_eq!(dispatcher.notifier().shown_count(), 1);
        assert_eq!(dispatcher.notifier().suppressed_count(), 2);

        let toast = dispatcher.notifier().current_toast().unwrap();
        assert_eq!(toast.notice.severity, Severity::Warning);
    }

    #[test]
    fn test_failed_startup_shows_failure_message() {
        let page = page();
        let (dispatcher, _) = dispatcher(Readiness::NotReady);
        dispatcher.gate().mark_failed();
        assert!(!dispatcher.gate().mark_ready());

        let outcome = click(&dispatcher, &page.doc, page.open_label);
        assert_eq!(outcome.status, DispatchStatus::Blocked(GateDecision::BlockedFailed));
        let toast = dispatcher.notifier().current_toast().unwrap();
        assert_eq!(toast.notice.message, NoticeMessages::default().init_failed);
    }

    #[test]
    fn test_unknown_action_is_ignored() {
        let page = page();
        let (dispatcher, log) = dispatcher(Readiness::Ready);
        let outcome = click(&dispatcher, &page.doc, page.bogus);
        assert_eq!(
            outcome.status,
            DispatchStatus::UnknownAction("warp-drive".into())
        );
        assert!(!outcome.default_prevented);
        assert!(log.is_empty());
    }

    #[test]
    fn test_repair_then_dispatch_show_details() {
        let page = page();
        let (dispatcher, log) = dispatcher(Readiness::Ready);

        let outcome = click(&dispatcher, &page.doc, page.card_title);
        assert_eq!(outcome.status, DispatchStatus::Dispatched("show-details".into()));
        assert_eq!(log.count("details"), 1);

        // The card now carries the marker itself
        let doc = lock(&page.doc);
        let card = doc.parent(page.card_title).unwrap();
        assert_eq!(doc.node(card).unwrap().attr("data-action"), Some("show-details"));
    }

    #[test]
    fn test_keyboard_parity() {
        let page = page();
        let (dispatcher, log) = dispatcher(Readiness::Ready);

        let by_key = dispatcher.handle(
            &page.doc,
            Interaction::Key { target: page.open_label, key: key("enter") },
        );
        let by_click = click(&dispatcher, &page.doc, page.open_label);
        assert_eq!(by_key, by_click);
        assert_eq!(log.count("open"), 2);

        let ignored = dispatcher.handle(
            &page.doc,
            Interaction::Key { target: page.open_label, key: key("x") },
        );
        assert_eq!(ignored.status, DispatchStatus::IgnoredKey);
        assert!(!ignored.default_prevented);
        assert_eq!(log.count("open"), 2);
    }

    #[test]
    fn test_failures_do_not_block_later_dispatch() {
        let page = page();
        let (dispatcher, log) = dispatcher(Readiness::Ready);
        dispatcher
            .collaborators()
            .register(Hook::Details, failing_hook("details broke"));

        let outcome = click(&dispatcher, &page.doc, page.explode);
        assert!(outcome.is_dispatched());
        let outcome = click(&dispatcher, &page.doc, page.card_title);
        assert!(outcome.is_dispatched());
        assert_eq!(dispatcher.invoker().failure_count(), 1);

        let outcome = click(&dispatcher, &page.doc, page.open_label);
        assert!(outcome.is_dispatched());
        assert_eq!(log.count("open"), 1);
    }

    #[test]
    fn test_dispatch_action_goes_through_gate() {
        let page = page();
        let (dispatcher, log) = dispatcher(Readiness::NotReady);
        let node = lock(&page.doc).parent(page.open_label).unwrap();

        let outcome = dispatcher.dispatch_action(&page.doc, "open", node);
        assert!(outcome.is_blocked());
        assert!(log.is_empty());

        dispatcher.gate().mark_ready();
        let outcome = dispatcher.dispatch_action(&page.doc, "open", node);
        assert!(outcome.is_dispatched());
        crate::assert_called!(log, "open", [Arg::text("m3")]);
        assert_eq!(
            dispatcher.dispatch_action(&page.doc, "  ", node).status,
            DispatchStatus::NoAction
        );
    }

    struct BrokenSurface;

    impl NoticeSurface for BrokenSurface {
        fn show(&self, _notice: &Notice) {
            panic!("surface bug");
        }
    }

    #[test]
    fn test_panicking_surface_does_not_escape_handle() {
        let page = page();
        let (dispatcher, log) = dispatcher(Readiness::NotReady);
        dispatcher.notifier().set_surface(Some(Arc::new(BrokenSurface)));

        let outcome = click(&dispatcher, &page.doc, page.open_label);
        assert_eq!(
            outcome.status,
            DispatchStatus::Blocked(GateDecision::BlockedNotReady)
        );
        assert!(outcome.default_prevented);
        assert!(dispatcher.notifier().current_toast().is_some());

        dispatcher.gate().mark_ready();
        let outcome = click(&dispatcher, &page.doc, page.open_label);
        assert!(outcome.is_dispatched());
        assert_eq!(log.count("open"), 1);
    }

    #[test]
    fn test_tracer_records_decision() {
        let page = page();
        let (dispatcher, _) = dispatcher(Readiness::NotReady);
        dispatcher.tracer().set_enabled(true);

        click(&dispatcher, &page.doc, page.open_label);
        let entries = dispatcher.tracer().recent(1);
        assert_eq!(entries[0].action.as_deref(), Some("open"));
        assert_eq!(entries[0].decision, Some(GateDecision::BlockedNotReady));
    }
}
