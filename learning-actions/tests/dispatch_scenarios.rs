//! End-to-end dispatch scenarios for the learning table

use std::sync::{Arc, Mutex};
use std::time::Duration;

use learning_actions::{Collaborator, LearningTable, PLACEMENT_ELEMENTS};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use ui_dispatch::invoke::FailurePhase;
use ui_dispatch::testing::{drain_tasks, key, rejecting_hook, CallLog, ImmediateFrames};
use ui_dispatch::{
    assert_called, assert_not_called, hook, lock, share, Arg, DispatchConfig, DispatchStatus,
    Dispatcher, Document, ElementSpec, GateDecision, HookOutcome, Interaction, Invoker, Marker,
    NodeId, NoticeMessages, Readiness, ReadinessGate, Severity, SharedDocument,
};

struct Harness {
    dispatcher: Dispatcher<LearningTable>,
    log: CallLog,
    frames: ImmediateFrames,
}

fn harness(state: Readiness) -> Harness {
    let log = CallLog::new();
    let frames = ImmediateFrames::new();
    let dispatcher = LearningTable::dispatcher(&DispatchConfig::default())
        .unwrap()
        .with_gate(ReadinessGate::with_state(state))
        .with_frames(Arc::new(frames.clone()));
    for collaborator in Collaborator::all() {
        dispatcher
            .collaborators()
            .register(*collaborator, log.hook(collaborator.name()));
    }
    Harness {
        dispatcher,
        log,
        frames,
    }
}

fn button(doc: &mut Document, action: &str, params: &[(&str, &str)]) -> NodeId {
    let mut spec = ElementSpec::new("button").attr("data-action", action);
    for (name, value) in params {
        spec = spec.attr(format!("data-{name}"), *value);
    }
    let root = doc.root();
    doc.insert(root, spec).unwrap()
}

fn click(h: &Harness, doc: &SharedDocument, origin: NodeId) -> DispatchStatus {
    h.dispatcher
        .handle(doc, Interaction::Click { origin })
        .status
}

#[test]
fn page_reload_needs_no_params() {
    let h = harness(Readiness::Ready);
    let mut doc = Document::new();
    let reload = button(&mut doc, "page-reload", &[]);
    let doc = share(doc);

    assert_eq!(click(&h, &doc, reload), DispatchStatus::Dispatched("page-reload".into()));
    assert_eq!(h.log.calls_to("reload-page"), vec![Vec::<Arg>::new()]);
}

#[test]
fn dismiss_by_id_hides_existing_element_only() {
    let h = harness(Readiness::Ready);
    let mut doc = Document::new();
    let root = doc.root();
    let banner = doc.insert(root, ElementSpec::new("aside").id("banner-1")).unwrap();
    let dismiss = button(&mut doc, "dismiss-by-id", &[("target-id", "banner-1")]);
    let dismiss_missing = button(&mut doc, "dismiss-by-id", &[("target-id", "banner-2")]);
    let doc = share(doc);

    click(&h, &doc, dismiss);
    assert!(lock(&doc).node(banner).unwrap().is_hidden());

    let status = click(&h, &doc, dismiss_missing);
    assert_eq!(status, DispatchStatus::Dispatched("dismiss-by-id".into()));
    assert!(h.log.is_empty());
}

#[test]
fn module_modal_show_passes_module_id() {
    let h = harness(Readiness::Ready);
    let mut doc = Document::new();
    let show = button(&mut doc, "module-modal-show", &[("module-id", "m3")]);
    let doc = share(doc);

    click(&h, &doc, show);
    assert_called!(h.log, "show-module-modal", [Arg::text("m3")]);
}

#[test]
fn quiz_and_activity_params_are_typed() {
    let h = harness(Readiness::Ready);
    let mut doc = Document::new();
    let answer = button(&mut doc, "quiz-answer", &[("question", "3"), ("option", "1")]);
    let log_minutes = button(
        &mut doc,
        "activity-log",
        &[("activity-id", "walk"), ("minutes", "25")],
    );
    let bad_minutes = button(
        &mut doc,
        "activity-log",
        &[("activity-id", "walk"), ("minutes", "lots")],
    );
    let doc = share(doc);

    click(&h, &doc, answer);
    click(&h, &doc, log_minutes);
    click(&h, &doc, bad_minutes);

    assert_called!(h.log, "answer-quiz", [Arg::Index(3), Arg::Index(1)]);
    assert_eq!(
        h.log.calls_to("log-activity"),
        vec![vec![Arg::text("walk"), Arg::Int(25)]]
    );
}

#[test]
fn no_action_has_no_side_effects() {
    let h = harness(Readiness::NotReady);
    let mut doc = Document::new();
    let root = doc.root();
    let para = doc.insert(root, ElementSpec::new("p").text("Just text")).unwrap();
    let text = first_child(&doc, para);
    let doc = share(doc);

    for origin in [para, text, root] {
        let outcome = h.dispatcher.handle(&doc, Interaction::Click { origin });
        assert_eq!(outcome.status, DispatchStatus::NoAction);
        assert!(!outcome.default_prevented);
    }
    assert!(h.log.is_empty());
    assert_eq!(h.dispatcher.notifier().shown_count(), 0);
    assert!(lock(&doc).node(para).unwrap().attr("data-action").is_none());
}

fn first_child(doc: &Document, id: NodeId) -> NodeId {
    doc.node(id).unwrap().children()[0]
}

#[tokio::test(start_paused = true)]
async fn not_ready_shows_one_notice_per_window() {
    let h = harness(Readiness::NotReady);
    let mut doc = Document::new();
    let next = button(&mut doc, "joke-next", &[]);
    let doc = share(doc);

    // Ten clicks spread over 450ms land in one window
    for _ in 0..10 {
        assert_eq!(
            click(&h, &doc, next),
            DispatchStatus::Blocked(GateDecision::BlockedNotReady)
        );
        tokio::time::advance(Duration::from_millis(50)).await;
    }
    assert_eq!(h.dispatcher.notifier().shown_count(), 1);

    tokio::time::advance(Duration::from_millis(500)).await;
    click(&h, &doc, next);
    assert_eq!(h.dispatcher.notifier().shown_count(), 2);
    assert_not_called!(h.log, "next-joke");

    let toast = h.dispatcher.notifier().current_toast().unwrap();
    assert_eq!(toast.notice.message, NoticeMessages::default().not_ready);
}

#[tokio::test(start_paused = true)]
async fn double_activation_within_200ms_renders_one_notice() {
    let h = harness(Readiness::NotReady);
    let mut doc = Document::new();
    let start = button(&mut doc, "quiz-start", &[("quiz-id", "q1")]);
    let doc = share(doc);

    click(&h, &doc, start);
    tokio::time::advance(Duration::from_millis(150)).await;
    h.dispatcher.handle(&doc, Interaction::Key { target: start, key: key("enter") });

    assert_eq!(h.dispatcher.notifier().shown_count(), 1);
    assert_eq!(h.dispatcher.notifier().suppressed_count(), 1);
}

#[test]
fn init_failed_is_sticky_and_says_so() {
    let h = harness(Readiness::NotReady);
    let mut doc = Document::new();
    let next = button(&mut doc, "joke-next", &[]);
    let doc = share(doc);

    h.dispatcher.gate().mark_failed();
    assert!(!h.dispatcher.gate().mark_ready());
    assert_eq!(h.dispatcher.gate().state(), Readiness::InitFailed);

    assert_eq!(
        click(&h, &doc, next),
        DispatchStatus::Blocked(GateDecision::BlockedFailed)
    );
    let toast = h.dispatcher.notifier().current_toast().unwrap();
    assert_eq!(toast.notice.severity, Severity::Error);
    assert_eq!(toast.notice.message, NoticeMessages::default().init_failed);
    assert!(h.log.is_empty());
}

#[test]
fn sync_failure_does_not_block_later_dispatch() {
    let h = harness(Readiness::Ready);
    h.dispatcher.collaborators().register(
        Collaborator::NextJoke,
        hook(|_| HookOutcome::failed("joke service down")),
    );
    let mut doc = Document::new();
    let next = button(&mut doc, "joke-next", &[]);
    let reveal = button(&mut doc, "joke-reveal", &[]);
    let doc = share(doc);

    click(&h, &doc, next);
    assert_eq!(h.dispatcher.invoker().failure_count(), 1);

    assert_eq!(click(&h, &doc, reveal), DispatchStatus::Dispatched("joke-reveal".into()));
    assert_called!(h.log, "reveal-punchline");
}

#[test]
fn collaborator_may_dispatch_again() {
    let h = harness(Readiness::Ready);
    let log = h.log.clone();
    let dispatcher = Arc::new(h.dispatcher);

    let mut doc = Document::new();
    let root = doc.root();
    let banner = doc.insert(root, ElementSpec::new("aside").id("banner-1")).unwrap();
    let next = button(&mut doc, "joke-next", &[]);
    let dismiss = button(&mut doc, "dismiss-by-id", &[("target-id", "banner-1")]);
    let doc = share(doc);

    let nested = Arc::new(Mutex::new(Vec::new()));
    let weak = Arc::downgrade(&dispatcher);
    let (inner_doc, inner_nested) = (doc.clone(), nested.clone());
    dispatcher.collaborators().register(
        Collaborator::NextJoke,
        log.hook_with("next-joke", move |_| {
            if let Some(dispatcher) = weak.upgrade() {
                let outcome =
                    dispatcher.handle(&inner_doc, Interaction::Click { origin: dismiss });
                inner_nested.lock().unwrap().push(outcome.status);
            }
            HookOutcome::Done
        }),
    );

    let outcome = dispatcher.handle(&doc, Interaction::Click { origin: next });
    assert_eq!(outcome.status, DispatchStatus::Dispatched("joke-next".into()));
    assert_eq!(
        *nested.lock().unwrap(),
        vec![DispatchStatus::Dispatched("dismiss-by-id".into())]
    );
    assert!(lock(&doc).node(banner).unwrap().is_hidden());
    assert_eq!(dispatcher.invoker().failure_count(), 0);
}

#[tokio::test]
async fn async_rejection_is_logged_exactly_once() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let h = harness(Readiness::Ready);
    let dispatcher = h.dispatcher.with_invoker(Invoker::new().with_failure_channel(tx));
    dispatcher
        .collaborators()
        .register(Collaborator::SubmitFeedback, rejecting_hook("endpoint unreachable"));

    let mut doc = Document::new();
    let submit = button(&mut doc, "feedback-submit", &[]);
    let open = button(&mut doc, "feedback-open", &[]);
    let doc = share(doc);

    let outcome = dispatcher.handle(&doc, Interaction::Click { origin: submit });
    assert!(outcome.is_dispatched());

    let failure = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(failure.hook, "submit-feedback");
    assert_eq!(failure.phase, FailurePhase::Async);

    drain_tasks().await;
    assert!(rx.try_recv().is_err());
    assert_eq!(dispatcher.invoker().failure_count(), 1);

    dispatcher.handle(&doc, Interaction::Click { origin: open });
    assert_called!(h.log, "open-feedback");
}

#[test]
fn disallowed_function_is_blocked() {
    let h = harness(Readiness::Ready);
    let mut doc = Document::new();
    let evil = button(&mut doc, "call-function", &[("fn", "wipeStorage")]);
    let help = button(&mut doc, "call-function", &[("fn", "show-help")]);
    let doc = share(doc);

    click(&h, &doc, evil);
    assert!(h.log.is_empty());

    click(&h, &doc, help);
    assert_eq!(h.log.names(), vec!["show-help"]);
}

#[test]
fn keyboard_activation_matches_click() {
    let h = harness(Readiness::Ready);
    let mut doc = Document::new();
    let toggle = button(&mut doc, "activity-toggle", &[("activity-id", "yoga")]);
    let doc = share(doc);

    let by_space = h
        .dispatcher
        .handle(&doc, Interaction::Key { target: toggle, key: key("space") });
    let by_click = h.dispatcher.handle(&doc, Interaction::Click { origin: toggle });
    assert_eq!(by_space, by_click);
    assert_eq!(
        h.log.calls_to("toggle-activity"),
        vec![vec![Arg::text("yoga")], vec![Arg::text("yoga")]]
    );

    let tab = h
        .dispatcher
        .handle(&doc, Interaction::Key { target: toggle, key: key("tab") });
    assert_eq!(tab.status, DispatchStatus::IgnoredKey);
}

#[test]
fn unmarked_module_card_is_repaired() {
    let h = harness(Readiness::Ready);
    let mut doc = Document::new();
    let root = doc.root();
    let card = doc
        .insert(
            root,
            ElementSpec::new("div")
                .role("button")
                .class("module-card")
                .attr("data-module-id", "m5")
                .child(ElementSpec::new("h3").text("Fractions")),
        )
        .unwrap();
    let title = doc.node(card).unwrap().children()[0];
    let plain = doc
        .insert(root, ElementSpec::new("div").class("module-card"))
        .unwrap();
    let doc = share(doc);

    assert_eq!(click(&h, &doc, title), DispatchStatus::Dispatched("show-details".into()));
    assert_called!(h.log, "show-details", [Arg::text("m5")]);
    assert_eq!(
        lock(&doc).node(card).unwrap().attr("data-action"),
        Some("show-details")
    );

    // Class alone is not a card
    assert_eq!(click(&h, &doc, plain), DispatchStatus::NoAction);
}

fn render_placement(doc: &SharedDocument) {
    let mut doc = lock(doc);
    let root = doc.root();
    for id in PLACEMENT_ELEMENTS {
        doc.insert(root, ElementSpec::new("div").id(id)).unwrap();
    }
}

#[tokio::test]
async fn placement_open_waits_for_render_then_starts() {
    let h = harness(Readiness::Ready);
    let mut doc = Document::new();
    let open = button(&mut doc, "placement-open", &[]);
    let doc = share(doc);

    let rendered = doc.clone();
    let log = h.log.clone();
    h.dispatcher.collaborators().register(
        Collaborator::Navigate,
        log.hook_with("navigate", move |_| {
            render_placement(&rendered);
            HookOutcome::Done
        }),
    );

    click(&h, &doc, open);
    drain_tasks().await;

    assert_eq!(h.log.names(), vec!["navigate", "start-placement"]);
    assert_called!(h.log, "navigate", [Arg::text("placement")]);
    assert_eq!(h.frames.count(), 2);
    assert_eq!(h.dispatcher.invoker().failure_count(), 0);
}

#[tokio::test]
async fn placement_open_aborts_on_half_rendered_ui() {
    let h = harness(Readiness::Ready);
    let mut doc = Document::new();
    let open = button(&mut doc, "placement-open", &[]);
    let root = doc.root();
    doc.insert(root, ElementSpec::new("div").id("placement-test")).unwrap();
    let doc = share(doc);

    click(&h, &doc, open);
    drain_tasks().await;

    assert_called!(h.log, "navigate");
    assert_not_called!(h.log, "start-placement");
    assert_eq!(h.dispatcher.invoker().failure_count(), 1);
    let toast = h.dispatcher.notifier().current_toast().unwrap();
    assert_eq!(toast.notice.severity, Severity::Error);
}

#[tokio::test]
async fn attached_listener_dispatches_in_order() {
    let h = harness(Readiness::NotReady);
    let gate = h.dispatcher.gate().clone();
    let log = h.log.clone();
    let dispatcher = Arc::new(h.dispatcher);

    let mut doc = Document::new();
    let next = button(&mut doc, "joke-next", &[]);
    let rate = button(&mut doc, "joke-rate", &[("rating", "4")]);
    let doc = share(doc);

    let cancel = CancellationToken::new();
    let mut listener = dispatcher.clone().attach(doc, cancel.clone()).unwrap();

    listener.sender.send(Interaction::Click { origin: next }).unwrap();
    let (_, first) = listener.outcomes.recv().await.unwrap();
    assert!(first.is_blocked());

    gate.mark_ready();
    listener.sender.send(Interaction::Click { origin: next }).unwrap();
    listener.sender.send(Interaction::Click { origin: rate }).unwrap();
    for _ in 0..2 {
        let (_, outcome) = listener.outcomes.recv().await.unwrap();
        assert!(outcome.is_dispatched());
    }
    assert_eq!(log.names(), vec!["next-joke", "rate-joke"]);
    assert_called!(log, "rate-joke", [Arg::Int(4)]);

    cancel.cancel();
    listener.task.await.unwrap();
}
